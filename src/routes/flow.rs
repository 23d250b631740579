//! `/api/flow/*` routes: greeting card stage actions.
//!
//! Actions that do not fit the current stage are not errors: the page is
//! simply re-rendered unchanged. Only malformed parameters produce an error
//! span.

use crate::error::RequestError;
use crate::game::flow::{FlowAction, GiftChoice, HEART_COUNT};
use crate::game::render::render_page;
use crate::game::state::with_session;
use crate::routes::act_and_render;
use crate::routes::util::{get_param, parse_form_body, require_param};

// ── GET /api/flow/view ─────────────────────────────────────────────

/// Handle GET /api/flow/view
/// Returns the current stage (and overlay) without changing anything.
pub fn handle_view_get(_query: &str) -> String {
    with_session(render_page)
}

// ── POST /api/flow/open ────────────────────────────────────────────

/// Handle POST /api/flow/open: the gift box on the landing screen.
pub fn handle_open_post(body: &str) -> String {
    let params = parse_form_body(body);
    act_and_render(&params, |s| {
        s.flow.dispatch(FlowAction::OpenGift);
        Ok(())
    })
}

// ── POST /api/flow/name ────────────────────────────────────────────

/// Handle POST /api/flow/name
/// Body params: `name={text}`. Blank names leave the name screen up.
pub fn handle_name_post(body: &str) -> String {
    let params = parse_form_body(body);
    let name = get_param(&params, "name").unwrap_or("").to_string();
    act_and_render(&params, |s| {
        s.flow.dispatch(FlowAction::SubmitName(name));
        Ok(())
    })
}

// ── POST /api/flow/continue ────────────────────────────────────────

/// Handle POST /api/flow/continue
/// Body params: `from=greeting|surprise|birthday|final`.
pub fn handle_continue_post(body: &str) -> String {
    let params = parse_form_body(body);
    let action = match get_param(&params, "from") {
        Some("greeting") => FlowAction::ContinueFromGreeting,
        Some("surprise") => FlowAction::ContinueFromSurprise,
        Some("birthday") => FlowAction::ContinueFromBirthday,
        Some("final") => FlowAction::ContinueFromFinalModal,
        Some(other) => return RequestError::invalid("from", other).to_html(),
        None => return RequestError::MissingParam("from").to_html(),
    };
    act_and_render(&params, |s| {
        s.flow.dispatch(action);
        Ok(())
    })
}

// ── POST /api/flow/heart ───────────────────────────────────────────

/// Handle POST /api/flow/heart
/// Body params: `index={0..4}`.
pub fn handle_heart_post(body: &str) -> String {
    let params = parse_form_body(body);
    act_and_render(&params, |s| {
        let index: u8 = require_param(&params, "index")?;
        if index >= HEART_COUNT {
            return Err(RequestError::invalid("index", &index.to_string()));
        }
        s.flow.dispatch(FlowAction::ClickHeart(index));
        Ok(())
    })
}

// ── POST /api/flow/gift ────────────────────────────────────────────

/// Handle POST /api/flow/gift
/// Body params: `choice=yes|no`.
pub fn handle_gift_post(body: &str) -> String {
    let params = parse_form_body(body);
    let choice = match get_param(&params, "choice") {
        Some(raw) => match GiftChoice::parse(raw) {
            Some(c) => c,
            None => return RequestError::invalid("choice", raw).to_html(),
        },
        None => return RequestError::MissingParam("choice").to_html(),
    };
    act_and_render(&params, |s| {
        s.flow.dispatch(FlowAction::ChooseGift(choice));
        Ok(())
    })
}
