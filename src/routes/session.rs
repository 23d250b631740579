//! Session-wide routes: clock ticks, state snapshot, reset and timing config.

use crate::config::Timings;
use crate::error::RequestError;
use crate::game::render::render_page;
use crate::game::state::{
    Session, export_state_json, replace_session, with_session, with_session_mut,
};
use crate::routes::util::{parse_form_body, require_param};

// ── POST /api/tick ─────────────────────────────────────────────────

/// Handle POST /api/tick
/// Body params: `now={ms}` from `performance.now()`. Fires every timer due
/// by then and re-renders.
pub fn handle_tick_post(body: &str) -> String {
    let params = parse_form_body(body);
    match require_param::<u64>(&params, "now") {
        Ok(now) => with_session_mut(|s| {
            s.tick(now);
            render_page(s)
        }),
        Err(e) => e.to_html(),
    }
}

// ── GET /api/state ─────────────────────────────────────────────────

/// Handle GET /api/state: JSON snapshot for page scripts.
pub fn handle_state_get(_query: &str) -> String {
    export_state_json()
}

// ── POST /api/reset ────────────────────────────────────────────────

/// Handle POST /api/reset: back to the landing screen. Pending timers of
/// the old session are dropped with it; the configured timings are kept.
pub fn handle_reset_post(_body: &str) -> String {
    let timings = with_session(|s| s.timings);
    replace_session(Session::new(timings));
    with_session(render_page)
}

// ── /api/config ────────────────────────────────────────────────────

fn config_json(timings: &Timings) -> String {
    serde_json::to_string(timings).unwrap_or_else(|_| "{}".to_string())
}

/// Handle GET /api/config: current timings as JSON.
pub fn handle_config_get(_query: &str) -> String {
    with_session(|s| config_json(&s.timings))
}

/// Handle POST /api/config
/// Body: partial JSON `Timings`. Applies to the next session reset and the
/// next memory game opened.
pub fn handle_config_post(body: &str) -> String {
    let result = with_session_mut(|s| -> Result<Timings, RequestError> {
        let merged = s.timings.merged_with(body)?;
        s.timings = merged;
        Ok(merged)
    });
    match result {
        Ok(timings) => config_json(&timings),
        Err(e) => e.to_html(),
    }
}
