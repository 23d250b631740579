//! Timing and board defaults.
//!
//! Every delay the flow and the memory game schedule lives here so the host
//! can shorten them (tests, reduced-motion setups) with a partial JSON object
//! posted to `/api/config`. Missing fields keep their defaults.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Delay before the greeting's continue button appears.
    pub greeting_button_ms: u64,
    /// Delay between the fourth heart click and the birthday sequence.
    pub celebration_ms: u64,
    /// Interval between two typewriter characters.
    pub type_char_ms: u64,
    /// Pause after a typewriter line is fully revealed.
    pub line_pause_ms: u64,
    /// How long the gift response stays up before the final message.
    pub gift_response_ms: u64,
    /// Delay before a matching pair is marked matched.
    pub match_resolve_ms: u64,
    /// Delay before a mismatched pair flips back.
    pub mismatch_resolve_ms: u64,
    /// Delay between winning the memory game and the completion hook.
    pub win_callback_ms: u64,
    /// Grid size used when the overlay is opened without one.
    pub default_grid_size: u8,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            greeting_button_ms: 2000,
            celebration_ms: 200,
            type_char_ms: 20,
            line_pause_ms: 800,
            gift_response_ms: 3000,
            match_resolve_ms: 400,
            mismatch_resolve_ms: 700,
            win_callback_ms: 1200,
            default_grid_size: 3,
        }
    }
}

impl Timings {
    /// Apply a partial JSON override on top of `self`.
    pub fn merged_with(&self, json: &str) -> Result<Timings, serde_json::Error> {
        let mut base = serde_json::to_value(self)?;
        let patch: serde_json::Value = serde_json::from_str(json)?;
        if let (Some(base), Some(patch)) = (base.as_object_mut(), patch.as_object()) {
            for (key, value) in patch {
                base.insert(key.clone(), value.clone());
            }
        }
        serde_json::from_value(base)
    }
}
