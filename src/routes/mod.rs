//! Route handlers. Each returns an HTML fragment (or JSON for `/api/state`
//! and `/api/config`) for the page to swap in.

pub mod flow;
pub mod memory;
pub mod session;
pub mod util;

use crate::error::RequestError;
use crate::game::render::render_page;
use crate::game::state::{Session, with_session_mut};
use util::parse_param;

/// Catch up on timers using the request's `now`, run `action`, then render
/// the page. Errors become the red inline span.
pub(crate) fn act_and_render<F>(params: &[(String, String)], action: F) -> String
where
    F: FnOnce(&mut Session) -> Result<(), RequestError>,
{
    let result = parse_param::<u64>(params, "now").and_then(|now| {
        with_session_mut(|session| -> Result<String, RequestError> {
            if let Some(now) = now {
                session.tick(now);
            }
            action(session)?;
            Ok(render_page(session))
        })
    });
    result.unwrap_or_else(|e| e.to_html())
}
