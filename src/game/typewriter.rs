//! Multi-line typewriter reveal.
//!
//! Holds an ordered list of lines and how much of the active line is visible.
//! The prefix is counted in `char`s so multi-byte text ("Wait…", emoji) is
//! never cut inside a character. Pacing lives in the flow's timers; this type
//! only knows how to step.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typewriter {
    lines: Vec<String>,
    line: usize,
    revealed: usize,
    finished: bool,
}

/// What the host needs to draw the reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypewriterView {
    pub line: usize,
    pub text: String,
    pub finished: bool,
}

impl Typewriter {
    pub fn new(lines: Vec<String>) -> Self {
        let finished = lines.is_empty();
        Self {
            lines,
            line: 0,
            revealed: 0,
            finished,
        }
    }

    pub fn line_index(&self) -> usize {
        self.line
    }

    /// Every line was revealed and the last one was acknowledged.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn active_line(&self) -> &str {
        self.lines.get(self.line).map(String::as_str).unwrap_or("")
    }

    /// The active line is shown in full.
    pub fn is_line_complete(&self) -> bool {
        self.revealed >= self.active_line().chars().count()
    }

    /// Currently visible prefix of the active line.
    pub fn visible_text(&self) -> &str {
        let line = self.active_line();
        match line.char_indices().nth(self.revealed) {
            Some((byte, _)) => &line[..byte],
            None => line,
        }
    }

    /// Reveal one more character. Returns true once the line is complete.
    pub fn reveal_next(&mut self) -> bool {
        if !self.finished && !self.is_line_complete() {
            self.revealed += 1;
        }
        self.is_line_complete()
    }

    /// Move to the next line with an empty prefix. Returns false (and marks
    /// the reveal finished) when there is no next line. Does nothing unless
    /// the active line is complete.
    pub fn advance_line(&mut self) -> bool {
        if self.finished || !self.is_line_complete() {
            return false;
        }
        if self.line + 1 < self.lines.len() {
            self.line += 1;
            self.revealed = 0;
            true
        } else {
            self.finished = true;
            false
        }
    }

    pub fn view(&self) -> TypewriterView {
        TypewriterView {
            line: self.line,
            text: self.visible_text().to_string(),
            finished: self.finished,
        }
    }
}
