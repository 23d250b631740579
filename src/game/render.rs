//! HTML fragments for the page.
//!
//! Every flow and memory route answers with `render_page`: the active stage
//! swapped into `#stage`, plus the memory overlay sent out-of-band into
//! `#memory-overlay`. Animation (floating icons, confetti, shakes) is driven
//! by the page from the `data-*` flags on the stage wrapper.
//!
//! While any timer is pending, a poller posts `/api/tick` with the page's
//! `performance.now()` so delayed transitions and the typewriter advance.

use crate::game::flow::{FlowState, GiftChoice, HEART_COUNT, Stage};
use crate::game::memory::{Board, MemoryGame};
use crate::game::state::Session;
use crate::routes::util::escape_html;

/// `hx-vals` attribute carrying the host clock on every request.
const NOW_VALS: &str = r#"hx-vals='js:{now: Math.round(performance.now())}'"#;
const SWAP: &str = r##"hx-target="#stage" hx-swap="innerHTML""##;

const PRIMARY_BTN: &str =
    "bg-bday-pink hover:bg-pink-600 text-white font-bold py-3 px-8 rounded-full shadow-lg";
const OUTLINE_BTN: &str =
    "border-2 border-purple-300 hover:border-purple-500 text-purple-800 font-semibold py-2 px-6 rounded-full";

fn post_button(path: &str, extra_vals: &str, class: &str, label: &str) -> String {
    let vals = if extra_vals.is_empty() {
        NOW_VALS.to_string()
    } else {
        format!(
            r#"hx-vals='js:{{now: Math.round(performance.now()), {}}}'"#,
            extra_vals
        )
    };
    format!(
        r#"<button type="button" class="{}" hx-post="{}" {} {}>{}</button>"#,
        class, path, vals, SWAP, label
    )
}

/// Full response for a flow or memory request.
pub fn render_page(session: &Session) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str(&render_stage(session.flow.state()));
    if session.has_pending_timers() {
        html.push_str(&format!(
            r#"<div class="hidden" hx-post="/api/tick" hx-trigger="every 50ms" {} {}></div>"#,
            NOW_VALS, SWAP
        ));
    }
    html.push_str(r#"<div id="memory-overlay" hx-swap-oob="true">"#);
    if let Some(game) = &session.memory {
        html.push_str(&render_memory(game, session.flow.state().user_name()));
    }
    html.push_str("</div>");
    html
}

/// The active stage wrapped in a container carrying the presentation flags.
pub fn render_stage(state: &FlowState) -> String {
    let mut html = String::with_capacity(2048);
    html.push_str(&format!(
        r#"<div class="flex flex-col items-center justify-center min-h-screen p-8" data-stage="{}" data-hearts="{}" data-confetti="{}">"#,
        state.stage.as_str(),
        state.background_hearts,
        state.confetti
    ));
    let name = escape_html(state.user_name());
    match state.stage {
        Stage::Landing => {
            html.push_str(r#"<h1 class="text-2xl md:text-4xl font-bold text-center mb-12 text-purple-800">I have a surprise for you. Click on the gift box to open it.</h1>"#);
            html.push_str(&post_button(
                "/api/flow/open",
                "",
                "bg-gradient-to-br from-pink-400 to-purple-500 p-8 rounded-3xl text-7xl",
                "🎁",
            ));
        }
        Stage::NameInput => {
            html.push_str(r#"<h2 class="text-3xl font-bold text-purple-800 mb-6">What's your name?</h2>"#);
            html.push_str(&format!(
                r#"<form x-data="{{ name: '' }}" hx-post="/api/flow/name" {} {} class="flex flex-col gap-4 w-full max-w-sm">"#,
                NOW_VALS, SWAP
            ));
            html.push_str(r#"<input type="text" name="name" x-model="name" placeholder="Enter your name..." class="border-2 border-purple-200 rounded-xl px-4 py-3 text-lg" autofocus>"#);
            html.push_str(&format!(
                r#"<button type="submit" :disabled="!name.trim()" class="{} disabled:opacity-50">Continue</button>"#,
                PRIMARY_BTN
            ));
            html.push_str("</form>");
        }
        Stage::Greeting => {
            html.push_str(r#"<div class="text-8xl mb-6">😸</div>"#);
            html.push_str(&format!(
                r#"<h1 class="text-4xl md:text-6xl font-bold text-purple-800 mb-4">Hi, {}!</h1>"#,
                name
            ));
            html.push_str(r#"<p class="text-xl text-purple-600 mb-8">I have something for you.</p>"#);
            if state.greeting_button_visible {
                html.push_str(&post_button(
                    "/api/flow/continue",
                    "from: 'greeting'",
                    PRIMARY_BTN,
                    "Click to Continue",
                ));
            }
        }
        Stage::SurpriseModal => {
            html.push_str(r#"<div class="bg-white rounded-3xl p-8 max-w-md w-full shadow-2xl text-center">"#);
            html.push_str(r#"<div class="text-7xl mb-4">😊</div><div class="text-4xl mb-4">🎀</div>"#);
            html.push_str(r#"<h2 class="text-2xl font-bold text-purple-800 mb-6">Click the 4 hearts.</h2>"#);
            html.push_str(&post_button(
                "/api/flow/continue",
                "from: 'surprise'",
                PRIMARY_BTN,
                "Let's Go!",
            ));
            html.push_str("</div>");
        }
        Stage::HeartClicking => {
            html.push_str(r#"<h1 class="text-3xl font-bold text-purple-800 mb-8">Click the 4 hearts.</h1>"#);
            html.push_str(r#"<div class="grid grid-cols-2 gap-6 mb-8">"#);
            for i in 0..HEART_COUNT {
                let clicked = state.clicked_hearts.contains(&i);
                let class = if clicked {
                    "w-24 h-24 rounded-full text-5xl bg-pink-200 shadow-inner text-pink-600"
                } else {
                    "w-24 h-24 rounded-full text-5xl bg-white shadow-lg text-pink-300"
                };
                html.push_str(&post_button(
                    "/api/flow/heart",
                    &format!("index: {}", i),
                    class,
                    if clicked { "💖" } else { "🤍" },
                ));
            }
            html.push_str("</div>");
            html.push_str(&format!(
                r#"<p class="text-lg text-purple-700">{}/{} hearts clicked</p>"#,
                state.clicked_hearts.len(),
                HEART_COUNT
            ));
        }
        Stage::BirthdaySequence => {
            if let Some(tw) = &state.typewriter {
                html.push_str(&format!(
                    r#"<div class="text-3xl md:text-5xl font-bold text-purple-800 min-h-[4rem] mb-8" data-line="{}">{}</div>"#,
                    tw.line_index(),
                    escape_html(tw.visible_text())
                ));
            }
            html.push_str(r#"<div class="flex gap-6 text-6xl mb-8"><span>🐱</span><span>🎂</span><span>🐱</span></div>"#);
            if state.birthday_continue_visible {
                html.push_str(&post_button(
                    "/api/flow/continue",
                    "from: 'birthday'",
                    PRIMARY_BTN,
                    "Continue",
                ));
            }
        }
        Stage::FinalModal => {
            html.push_str(r#"<div class="bg-white rounded-3xl p-8 max-w-lg w-full shadow-2xl text-center">"#);
            html.push_str(r#"<p class="text-lg text-purple-700 mb-6">You bring so much joy and happiness to everyone around you. Your special day deserves to be celebrated with all the love in the world! 🌟</p>"#);
            html.push_str(&post_button(
                "/api/flow/continue",
                "from: 'final'",
                PRIMARY_BTN,
                "Continue",
            ));
            html.push_str("</div>");
        }
        Stage::GiftQuestion => {
            html.push_str(r#"<div class="bg-white rounded-3xl p-8 max-w-md w-full shadow-2xl text-center">"#);
            html.push_str(&format!(
                r#"<h2 class="text-2xl font-bold text-purple-800 mb-6">{}, do you want a gift?</h2>"#,
                name
            ));
            html.push_str(r#"<div class="flex gap-4 justify-center">"#);
            html.push_str(&post_button("/api/flow/gift", "choice: 'yes'", PRIMARY_BTN, "Yes! 🎁"));
            html.push_str(&post_button("/api/flow/gift", "choice: 'no'", OUTLINE_BTN, "No thanks"));
            html.push_str("</div>");
            html.push_str(&post_button(
                "/api/memory/open",
                "seed: Math.floor(Math.random() * 4294967296)",
                "mt-6 text-sm text-purple-600 underline",
                "Earn it in a memory challenge 🧠",
            ));
            html.push_str("</div>");
        }
        Stage::GiftResponse => {
            html.push_str(r#"<div class="bg-white rounded-3xl p-8 max-w-md w-full shadow-2xl text-center">"#);
            match state.gift_choice {
                Some(GiftChoice::No) => {
                    html.push_str(r#"<h2 class="text-2xl font-bold text-purple-800 mb-4">Too bad! You're getting one anyway! 🎉</h2>"#);
                    html.push_str(r#"<p class="text-lg text-purple-600">You can't escape birthday surprises! 😸</p>"#);
                }
                _ => {
                    html.push_str(r#"<h2 class="text-2xl font-bold text-purple-800">Pehle party de 😼</h2>"#);
                }
            }
            html.push_str("</div>");
        }
        Stage::FinalMessage => {
            html.push_str(r#"<div class="bg-white rounded-3xl p-8 max-w-lg w-full shadow-2xl text-center">"#);
            html.push_str(&format!(
                r#"<h2 class="text-3xl font-bold text-purple-800 mb-4">Happy Birthday, {}! 🎂</h2>"#,
                name
            ));
            html.push_str(r#"<p class="text-lg text-purple-700">May your special day be filled with happiness, laughter, and all your favorite things. You deserve all the joy in the world! Here's to another amazing year ahead! ✨🎈</p>"#);
            if state.gift_unlocked {
                html.push_str(r#"<p class="mt-6 text-xl font-bold text-emerald-600">🎁 Gift unlocked!</p>"#);
            }
            html.push_str("</div>");
        }
    }
    html.push_str("</div>");
    html
}

fn render_card_grid(board: &Board) -> String {
    let mut html = String::with_capacity(board.cards.len() * 200);
    html.push_str(&format!(
        r#"<div class="grid gap-3 mb-6 mx-auto{}" style="grid-template-columns: repeat({}, minmax(0,1fr)); max-width: min(100%, {}px)">"#,
        if board.shake { " animate-shake" } else { "" },
        board.grid_size,
        board.grid_size as u32 * 70
    ));
    for card in &board.cards {
        let class = if card.is_matched {
            "bg-green-200 scale-110 shadow-xl border-2 border-green-400"
        } else if card.is_flipped {
            "bg-blue-100 border-2 border-blue-300"
        } else {
            "bg-gradient-to-br from-purple-200 to-pink-200 border-2 border-purple-200"
        };
        let (face, label) = if card.is_face_up() {
            (card.face, format!("Card {}", card.face))
        } else {
            ("❓", "Hidden card".to_string())
        };
        html.push_str(&format!(
            r#"<button type="button" class="w-14 h-14 sm:w-20 sm:h-20 rounded-xl text-3xl {}" aria-label="{}" hx-post="/api/memory/select" hx-vals='js:{{now: Math.round(performance.now()), card: {}}}' {}>{}</button>"#,
            class, label, card.id, SWAP, face
        ));
    }
    html.push_str("</div>");
    html
}

/// Memory challenge overlay.
pub fn render_memory(game: &MemoryGame, user_name: &str) -> String {
    let board = game.board();
    let mut html = String::with_capacity(8192);
    html.push_str(r#"<div class="fixed inset-0 bg-gradient-to-br from-purple-100 to-pink-200 flex items-center justify-center p-4 z-50">"#);
    html.push_str(r#"<div class="bg-white rounded-3xl p-8 max-w-lg w-full shadow-2xl text-center">"#);

    if board.won {
        html.push_str(r#"<div class="text-8xl mb-6">🎉</div>"#);
        html.push_str(r#"<h2 class="text-5xl font-extrabold text-purple-900 mb-3">Congratulations!</h2>"#);
        html.push_str(&format!(
            r#"<p class="text-xl text-purple-700 mb-5">You completed the memory challenge in <span class="font-bold">{}</span> moves!</p>"#,
            board.moves
        ));
        html.push_str(r#"<p class="text-purple-600 text-lg">Your gift is coming right up... 🎁</p>"#);
    } else {
        html.push_str(r#"<div class="flex justify-between items-center mb-6">"#);
        html.push_str(r#"<h2 class="text-4xl font-extrabold text-purple-900">Memory Challenge! 🧠</h2>"#);
        html.push_str(&post_button("/api/memory/close", "", OUTLINE_BTN, "✕"));
        html.push_str("</div>");
        html.push_str(&format!(
            r#"<p class="text-purple-700 mb-4">Find the matching pairs to get your gift, <span class="font-bold">{}</span>!</p>"#,
            escape_html(user_name)
        ));
        html.push_str(&format!(
            r#"<div class="flex justify-between text-sm text-purple-700 mb-4 px-2"><span>Moves: {}</span><span>Pairs: {}/{}</span></div>"#,
            board.moves,
            board.matched_pairs,
            board.total_pairs()
        ));
        html.push_str(&format!(
            r#"<div class="mb-6 flex justify-center items-center gap-2"><label for="gridSize" class="text-purple-700 font-semibold">Grid Size:</label><input type="number" id="gridSize" name="size" min="2" max="10" value="{}" hx-post="/api/memory/size" hx-trigger="change" {} {} class="border-2 border-purple-300 rounded px-2 py-1 w-16 text-center" aria-label="Select grid size"></div>"#,
            board.grid_size, NOW_VALS, SWAP
        ));
        html.push_str(&render_card_grid(board));
        html.push_str(&post_button("/api/memory/reset", "", OUTLINE_BTN, "Reset Game 🔄"));
    }

    html.push_str("</div></div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timings;
    use crate::game::flow::FlowAction;

    #[test]
    fn landing_offers_gift_box() {
        let html = render_stage(&FlowState::default());
        assert!(html.contains(r#"data-stage="landing""#));
        assert!(html.contains(r#"hx-post="/api/flow/open""#));
    }

    #[test]
    fn user_name_is_escaped() {
        let mut s = Session::default();
        s.flow.dispatch(FlowAction::OpenGift);
        s.flow.dispatch(FlowAction::SubmitName("<script>".into()));
        let html = render_stage(s.flow.state());
        assert!(html.contains("Hi, &lt;script&gt;!"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn greeting_button_hidden_until_visible() {
        let mut s = Session::default();
        s.flow.dispatch(FlowAction::OpenGift);
        s.flow.dispatch(FlowAction::SubmitName("Ada".into()));
        assert!(!render_stage(s.flow.state()).contains("Click to Continue"));
        s.tick(2000);
        assert!(render_stage(s.flow.state()).contains("Click to Continue"));
    }

    #[test]
    fn poller_only_while_timers_pending() {
        let mut s = Session::default();
        assert!(!render_page(&s).contains("/api/tick"));
        s.flow.dispatch(FlowAction::OpenGift);
        s.flow.dispatch(FlowAction::SubmitName("Ada".into()));
        assert!(render_page(&s).contains("/api/tick"));
        s.tick(2000);
        assert!(!render_page(&s).contains("/api/tick"));
    }

    #[test]
    fn overlay_is_sent_out_of_band() {
        let mut s = Session::default();
        s.flow.dispatch(FlowAction::OpenGift);
        s.flow.dispatch(FlowAction::SubmitName("Ada".into()));
        let html = render_page(&s);
        assert!(html.contains(r#"<div id="memory-overlay" hx-swap-oob="true"></div>"#));
        s.open_memory(5, Some(2));
        let html = render_page(&s);
        assert!(html.contains("Memory Challenge!"));
        assert!(html.contains("Pairs: 0/2"));
        assert_eq!(html.matches(r#"hx-post="/api/memory/select""#).count(), 4);
    }

    #[test]
    fn memory_cards_hide_faces_until_flipped() {
        let mut game = MemoryGame::with_seed(1, 2, Timings::default(), 0);
        let html = render_memory(&game, "Ada");
        assert_eq!(html.matches("Hidden card").count(), 4);
        game.select_card(0);
        let html = render_memory(&game, "Ada");
        assert_eq!(html.matches("Hidden card").count(), 3);
        assert!(html.contains(&format!("Card {}", game.board().cards[0].face)));
    }
}
