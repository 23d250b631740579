//! Memory match engine: the "find the pairs" overlay that gates the gift.
//!
//! `Board` is the plain game state and its rules. `MemoryGame` adds the
//! seeded RNG, the resolution timers and the completion hooks.
//!
//! Board sizes: the grid is `n × n` with `n` clamped to 2..=10. The board
//! always holds `2 × ⌊n²/2⌋` cards so every face has a partner; on odd grids
//! the last cell is left empty by the page. The palette has one distinct face
//! per pair of the largest grid, so faces never repeat across pairs.

use rand::Rng;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::Timings;
use crate::game::scheduler::Scheduler;

pub const MIN_GRID: u8 = 2;
pub const MAX_GRID: u8 = 10;

/// Card faces, in the order they are handed out.
pub const FACES: [&str; 50] = [
    "🎂", "🎁", "🎉", "🎈", "🌟", "🎊", "🍰", "🎵", "🌈", "🥳", //
    "😊", "😍", "😉", "😘", "🤗", "🤩", "😎", "😌", "😜", "😝", //
    "🍭", "🍬", "🧁", "🍩", "🍪", "🍫", "🍓", "🍒", "🍉", "🍍", //
    "🌸", "🌻", "🌷", "🍀", "🦄", "🐱", "🐶", "🐼", "🦊", "🐰", //
    "🐝", "🦋", "🐢", "🐙", "🚀", "⭐", "💎", "🎀", "🪁", "🎸", //
];

pub fn clamp_grid(size: u8) -> u8 {
    size.clamp(MIN_GRID, MAX_GRID)
}

/// Pairs needed for a (clamped) grid size.
pub fn pair_count(grid_size: u8) -> usize {
    let n = clamp_grid(grid_size) as usize;
    n * n / 2
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: usize,
    pub face: &'static str,
    pub is_flipped: bool,
    pub is_matched: bool,
}

impl Card {
    pub fn is_face_up(&self) -> bool {
        self.is_flipped || self.is_matched
    }
}

/// Result of selecting a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The selection had no effect.
    Ignored,
    /// First card of a pair is face up.
    Flipped,
    /// Second card is face up; the pair awaits resolution.
    PairPending { first: usize, second: usize, matched: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    pub grid_size: u8,
    pub cards: Vec<Card>,
    pub flipped: Vec<usize>,
    pub moves: u32,
    pub matched_pairs: u32,
    pub shake: bool,
    pub won: bool,
}

impl Board {
    /// Build a freshly shuffled board for `grid_size` (clamped).
    pub fn generate<R: Rng + ?Sized>(grid_size: u8, rng: &mut R) -> Self {
        let grid_size = clamp_grid(grid_size);
        let faces = &FACES[..pair_count(grid_size)];
        let mut deck: Vec<&'static str> = faces.iter().chain(faces.iter()).copied().collect();
        deck.shuffle(rng);
        let cards = deck
            .into_iter()
            .enumerate()
            .map(|(id, face)| Card {
                id,
                face,
                is_flipped: false,
                is_matched: false,
            })
            .collect();
        Self {
            grid_size,
            cards,
            flipped: Vec::with_capacity(2),
            moves: 0,
            matched_pairs: 0,
            shake: false,
            won: false,
        }
    }

    pub fn total_pairs(&self) -> usize {
        pair_count(self.grid_size)
    }

    /// Flip card `id` if the rules allow it.
    pub fn select(&mut self, id: usize) -> Selection {
        if self.won || self.flipped.len() >= 2 {
            return Selection::Ignored;
        }
        let Some(card) = self.cards.get_mut(id) else {
            return Selection::Ignored;
        };
        if card.is_flipped || card.is_matched {
            return Selection::Ignored;
        }
        card.is_flipped = true;
        self.flipped.push(id);

        if let [first, second] = self.flipped[..] {
            self.moves += 1;
            let matched = self.cards[first].face == self.cards[second].face;
            if !matched {
                self.shake = true;
            }
            Selection::PairPending {
                first,
                second,
                matched,
            }
        } else {
            Selection::Flipped
        }
    }

    /// Lock in a matching pair. Returns true when this completes the board.
    pub fn resolve_match(&mut self, first: usize, second: usize) -> bool {
        if self.flipped[..] != [first, second] {
            return false;
        }
        for id in [first, second] {
            self.cards[id].is_matched = true;
        }
        self.matched_pairs += 1;
        self.flipped.clear();
        let complete = !self.cards.is_empty() && self.matched_pairs as usize == self.total_pairs();
        if complete && !self.won {
            self.won = true;
            return true;
        }
        false
    }

    /// Turn a mismatched pair face down again.
    pub fn resolve_mismatch(&mut self, first: usize, second: usize) {
        if self.flipped[..] != [first, second] {
            return;
        }
        for id in [first, second] {
            self.cards[id].is_flipped = false;
        }
        self.flipped.clear();
        self.shake = false;
    }
}

/// Outbound hooks to whatever mounted the game.
pub trait GameHooks {
    /// Fired once, a short while after the board is won.
    fn on_complete(&mut self);
    /// Fired when the host dismisses the overlay.
    fn on_close(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameTimer {
    Match(usize, usize),
    Mismatch(usize, usize),
    Complete,
}

/// A mounted memory game instance.
#[derive(Debug, Clone)]
pub struct MemoryGame {
    board: Board,
    rng: ChaCha8Rng,
    timers: Scheduler<GameTimer>,
    timings: Timings,
}

impl MemoryGame {
    /// New game with a deterministic shuffle sequence derived from `seed`.
    pub fn with_seed(seed: u64, grid_size: u8, timings: Timings, now: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let board = Board::generate(grid_size, &mut rng);
        debug!(grid_size = board.grid_size, cards = board.cards.len(), "memory board built");
        Self {
            board,
            rng,
            timers: Scheduler::starting_at(now),
            timings,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn grid_size(&self) -> u8 {
        self.board.grid_size
    }

    pub fn has_pending_timers(&self) -> bool {
        !self.timers.is_idle()
    }

    /// Rebuild the board at `grid_size`, discarding all progress and timers.
    pub fn initialize(&mut self, grid_size: u8) {
        self.timers.cancel_all();
        self.board = Board::generate(grid_size, &mut self.rng);
        debug!(
            grid_size = self.board.grid_size,
            cards = self.board.cards.len(),
            "memory board built"
        );
    }

    pub fn reset(&mut self) {
        self.initialize(self.board.grid_size);
    }

    pub fn set_grid_size(&mut self, grid_size: u8) {
        self.initialize(grid_size);
    }

    pub fn select_card(&mut self, id: usize) -> Selection {
        let selection = self.board.select(id);
        match selection {
            Selection::Ignored => trace!(card = id, "card selection ignored"),
            Selection::Flipped => {}
            Selection::PairPending {
                first,
                second,
                matched,
            } => {
                debug!(first, second, matched, moves = self.board.moves, "pair flipped");
                if matched {
                    self.timers
                        .schedule(self.timings.match_resolve_ms, GameTimer::Match(first, second));
                } else {
                    self.timers.schedule(
                        self.timings.mismatch_resolve_ms,
                        GameTimer::Mismatch(first, second),
                    );
                }
            }
        }
        selection
    }

    /// Fire due resolution timers; `hooks.on_complete` runs here.
    pub fn advance_to(&mut self, now: u64, hooks: &mut dyn GameHooks) {
        while let Some(timer) = self.timers.pop_due(now) {
            match timer {
                GameTimer::Match(first, second) => {
                    if self.board.resolve_match(first, second) {
                        debug!(moves = self.board.moves, "memory game won");
                        self.timers
                            .schedule(self.timings.win_callback_ms, GameTimer::Complete);
                    }
                }
                GameTimer::Mismatch(first, second) => self.board.resolve_mismatch(first, second),
                GameTimer::Complete => hooks.on_complete(),
            }
        }
        self.timers.settle(now);
    }

    /// Dismiss the game. Pending timers go with it.
    pub fn close(self, hooks: &mut dyn GameHooks) {
        debug!(pending = self.timers.pending(), "memory game closed");
        hooks.on_close();
    }
}
