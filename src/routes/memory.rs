//! `/api/memory/*` routes: the memory challenge overlay.

use crate::error::RequestError;
use crate::game::render::render_memory;
use crate::game::state::{Session, with_session};
use crate::routes::act_and_render;
use crate::routes::util::{get_param, parse_form_body, parse_param, require_param};

/// Grid sizes arrive from a number input; any integer, however wide, is
/// clamped rather than rejected. Only non-numeric text is an error.
fn grid_param(params: &[(String, String)]) -> Result<Option<u8>, RequestError> {
    match parse_param::<i64>(params, "size") {
        Ok(size) => Ok(size.map(|n| n.clamp(0, u8::MAX as i64) as u8)),
        Err(e) => {
            let raw = get_param(params, "size").unwrap_or_default().trim();
            let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(e);
            }
            // Overflowed i64: saturate toward the nearest bound.
            Ok(Some(if raw.starts_with('-') { 0 } else { u8::MAX }))
        }
    }
}

fn game_mut(s: &mut Session) -> Result<&mut crate::game::memory::MemoryGame, RequestError> {
    s.memory.as_mut().ok_or(RequestError::NoGame)
}

/// Handle GET /api/memory/view: the overlay alone, empty when closed.
pub fn handle_view_get(_query: &str) -> String {
    with_session(|s| match &s.memory {
        Some(game) => render_memory(game, s.flow.state().user_name()),
        None => String::new(),
    })
}

/// Handle POST /api/memory/open
/// Body params: `seed={u64}` (shuffle seed from the page), `size={n}`.
pub fn handle_open_post(body: &str) -> String {
    let params = parse_form_body(body);
    act_and_render(&params, |s| {
        let seed = parse_param::<u64>(&params, "seed")?.unwrap_or(s.clock);
        let size = grid_param(&params)?;
        s.open_memory(seed, size);
        Ok(())
    })
}

/// Handle POST /api/memory/select
/// Body params: `card={id}`.
pub fn handle_select_post(body: &str) -> String {
    let params = parse_form_body(body);
    act_and_render(&params, |s| {
        let card: usize = require_param(&params, "card")?;
        game_mut(s)?.select_card(card);
        Ok(())
    })
}

/// Handle POST /api/memory/reset: reshuffle at the current size.
pub fn handle_reset_post(body: &str) -> String {
    let params = parse_form_body(body);
    act_and_render(&params, |s| {
        game_mut(s)?.reset();
        Ok(())
    })
}

/// Handle POST /api/memory/size
/// Body params: `size={n}`, clamped to 2..=10. Unparsable input keeps the
/// current board.
pub fn handle_size_post(body: &str) -> String {
    let params = parse_form_body(body);
    act_and_render(&params, |s| {
        let game = game_mut(s)?;
        let size = grid_param(&params)?.ok_or(RequestError::MissingParam("size"))?;
        game.set_grid_size(size);
        Ok(())
    })
}

/// Handle POST /api/memory/close: dismiss without completing.
pub fn handle_close_post(body: &str) -> String {
    let params = parse_form_body(body);
    act_and_render(&params, |s| {
        s.close_memory();
        Ok(())
    })
}
