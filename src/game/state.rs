//! Session state container.
//!
//! Uses `thread_local!` + `RefCell` for safe mutable access in single-threaded
//! WASM. The Web Worker keeps the module alive, so the session lives as long
//! as the page does. Nothing is persisted; a reload starts on the landing
//! screen again.

use serde::Serialize;
use std::cell::RefCell;
use tracing::debug;

use crate::config::Timings;
use crate::game::flow::{FlowState, GiftChoice, GreetingFlow, Stage};
use crate::game::memory::{Board, GameHooks, MemoryGame};
use crate::game::typewriter::TypewriterView;

/// The flow plus the optional memory-game overlay mounted on top of it.
#[derive(Debug, Clone)]
pub struct Session {
    pub flow: GreetingFlow,
    pub memory: Option<MemoryGame>,
    pub timings: Timings,
    /// Latest host time seen, in ms.
    pub clock: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Timings::default())
    }
}

/// Bridges the game's hooks back into the flow.
struct OverlayHooks<'a> {
    flow: &'a mut GreetingFlow,
    dismiss: bool,
}

impl GameHooks for OverlayHooks<'_> {
    fn on_complete(&mut self) {
        self.flow.unlock_gift();
        self.dismiss = true;
    }

    fn on_close(&mut self) {
        self.dismiss = true;
    }
}

impl Session {
    pub fn new(timings: Timings) -> Self {
        Self {
            flow: GreetingFlow::new(timings, 0),
            memory: None,
            timings,
            clock: 0,
        }
    }

    /// Advance every timer to `now`. Earlier times than the last tick are
    /// treated as the last tick.
    pub fn tick(&mut self, now: u64) {
        self.clock = self.clock.max(now);
        self.flow.advance_to(self.clock);

        let Some(game) = self.memory.as_mut() else {
            return;
        };
        let mut hooks = OverlayHooks {
            flow: &mut self.flow,
            dismiss: false,
        };
        game.advance_to(self.clock, &mut hooks);
        if hooks.dismiss {
            debug!("memory overlay dismissed after completion");
            self.memory = None;
        }
    }

    /// Mount the memory game. Needs a name to greet. A game already open is
    /// closed first, so its pending timers never fire.
    pub fn open_memory(&mut self, seed: u64, grid_size: Option<u8>) -> bool {
        if self.flow.state().user_name.is_none() {
            return false;
        }
        if self.close_memory() {
            debug!("memory overlay replaced");
        }
        let size = grid_size.unwrap_or(self.timings.default_grid_size);
        self.memory = Some(MemoryGame::with_seed(seed, size, self.timings, self.clock));
        debug!(seed, "memory overlay mounted");
        true
    }

    /// Dismiss the memory game without completing it.
    pub fn close_memory(&mut self) -> bool {
        let Some(game) = self.memory.take() else {
            return false;
        };
        let mut hooks = OverlayHooks {
            flow: &mut self.flow,
            dismiss: false,
        };
        game.close(&mut hooks);
        true
    }

    /// Wait time hint for the page: whether anything is still scheduled.
    pub fn has_pending_timers(&self) -> bool {
        self.flow.has_pending_timers()
            || self.memory.as_ref().is_some_and(MemoryGame::has_pending_timers)
    }

    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        let state = self.flow.state();
        SessionSnapshot {
            clock: self.clock,
            stage: state.stage,
            finished: state.stage.is_terminal(),
            user_name: state.user_name.as_deref(),
            clicked_hearts: state.clicked_hearts.iter().copied().collect(),
            typewriter: state.typewriter.as_ref().map(|tw| tw.view()),
            gift_choice: state.gift_choice,
            greeting_button_visible: state.greeting_button_visible,
            birthday_continue_visible: state.birthday_continue_visible,
            background_hearts: state.background_hearts,
            confetti: state.confetti,
            gift_unlocked: state.gift_unlocked,
            pending_timers: self.has_pending_timers(),
            memory: self.memory.as_ref().map(MemoryGame::board),
        }
    }
}

/// What the page reads from `/api/state`.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot<'a> {
    pub clock: u64,
    pub stage: Stage,
    /// The closing message is on screen.
    pub finished: bool,
    pub user_name: Option<&'a str>,
    pub clicked_hearts: Vec<u8>,
    pub typewriter: Option<TypewriterView>,
    pub gift_choice: Option<GiftChoice>,
    pub greeting_button_visible: bool,
    pub birthday_continue_visible: bool,
    pub background_hearts: bool,
    pub confetti: bool,
    pub gift_unlocked: bool,
    pub pending_timers: bool,
    pub memory: Option<&'a Board>,
}

thread_local! {
    static SESSION: RefCell<Session> = RefCell::new(Session::default());
}

/// Execute a closure with read access to the session.
pub fn with_session<F, R>(f: F) -> R
where
    F: FnOnce(&Session) -> R,
{
    SESSION.with(|s| f(&s.borrow()))
}

/// Execute a closure with mutable access to the session.
pub fn with_session_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut Session) -> R,
{
    SESSION.with(|s| f(&mut s.borrow_mut()))
}

/// Replace the whole session. The old one, and every timer it held, is dropped.
pub fn replace_session(new_session: Session) {
    SESSION.with(|s| {
        *s.borrow_mut() = new_session;
    });
}

/// Current flow state (cloned).
pub fn flow_state() -> FlowState {
    with_session(|s| s.flow.state().clone())
}

/// Export the session snapshot as JSON.
pub fn export_state_json() -> String {
    with_session(|s| serde_json::to_string(&s.snapshot()).unwrap_or_else(|_| "{}".to_string()))
}
