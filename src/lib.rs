//! Birthday surprise in-browser WASM core.
//!
//! Exports `handle_request(method, path, query, body)` for the Service Worker
//! bridge to call. Uses `matchit` for URL routing and answers with HTML
//! fragments for HTMX to swap, or JSON for `/api/state` and `/api/config`.
//!
//! The page owns rendering polish and real time; this module owns the stage
//! state machine, the memory game rules and every timer, advanced by the
//! `now` the page sends along.

use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod game;
pub mod routes;

/// Process an HTTP-like request and return an HTML fragment.
///
/// Called from JavaScript (Web Worker) via wasm-bindgen.
///
/// # Arguments
/// * `method`: HTTP method ("GET" or "POST")
/// * `path`: URL path (e.g., "/api/flow/heart")
/// * `query`: Query string (e.g., "?now=1200")
/// * `body`: Request body (form data, or JSON for `/api/config`). Empty for GET.
///
/// # Returns
/// An HTML string fragment suitable for HTMX to swap into the DOM.
#[wasm_bindgen]
pub fn handle_request(method: &str, path: &str, query: &str, body: &str) -> String {
    // Build the router. matchit compiles route patterns into a radix tree.
    let mut router = matchit::Router::new();

    router.insert("/api/flow/view", "flow_view").ok();
    router.insert("/api/flow/open", "flow_open").ok();
    router.insert("/api/flow/name", "flow_name").ok();
    router.insert("/api/flow/continue", "flow_continue").ok();
    router.insert("/api/flow/heart", "flow_heart").ok();
    router.insert("/api/flow/gift", "flow_gift").ok();

    router.insert("/api/memory/view", "memory_view").ok();
    router.insert("/api/memory/open", "memory_open").ok();
    router.insert("/api/memory/select", "memory_select").ok();
    router.insert("/api/memory/reset", "memory_reset").ok();
    router.insert("/api/memory/size", "memory_size").ok();
    router.insert("/api/memory/close", "memory_close").ok();

    router.insert("/api/tick", "tick").ok();
    router.insert("/api/state", "state").ok();
    router.insert("/api/reset", "reset").ok();
    router.insert("/api/config", "config").ok();

    match router.at(path) {
        Ok(matched) => match (*matched.value, method) {
            ("flow_view", "GET") => routes::flow::handle_view_get(query),
            ("flow_open", "POST") => routes::flow::handle_open_post(body),
            ("flow_name", "POST") => routes::flow::handle_name_post(body),
            ("flow_continue", "POST") => routes::flow::handle_continue_post(body),
            ("flow_heart", "POST") => routes::flow::handle_heart_post(body),
            ("flow_gift", "POST") => routes::flow::handle_gift_post(body),

            ("memory_view", "GET") => routes::memory::handle_view_get(query),
            ("memory_open", "POST") => routes::memory::handle_open_post(body),
            ("memory_select", "POST") => routes::memory::handle_select_post(body),
            ("memory_reset", "POST") => routes::memory::handle_reset_post(body),
            ("memory_size", "POST") => routes::memory::handle_size_post(body),
            ("memory_close", "POST") => routes::memory::handle_close_post(body),

            ("tick", "POST") => routes::session::handle_tick_post(body),
            ("state", "GET") => routes::session::handle_state_get(query),
            ("reset", "POST") => routes::session::handle_reset_post(body),
            ("config", "GET") => routes::session::handle_config_get(query),
            ("config", "POST") => routes::session::handle_config_post(body),

            _ => method_not_allowed(),
        },
        Err(_) => not_found(),
    }
}

fn not_found() -> String {
    r#"<span class="text-bday-red">404: route not found</span>"#.to_string()
}

fn method_not_allowed() -> String {
    r#"<span class="text-bday-red">405: method not allowed</span>"#.to_string()
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn handle_request_runs_in_browser() {
        let html = handle_request("POST", "/api/flow/open", "", "now=0");
        assert!(html.contains(r#"data-stage="name-input""#));
    }
}
