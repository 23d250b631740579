//! Request-level errors.
//!
//! State-machine actions that arrive in the wrong stage are not errors; they
//! are dropped by the reducers. These variants only cover requests the router
//! cannot turn into an action at all.

use thiserror::Error;

use crate::routes::util::escape_html;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Missing {0} parameter")]
    MissingParam(&'static str),

    #[error("Invalid {name} parameter: {value}")]
    InvalidParam { name: &'static str, value: String },

    #[error("Invalid config JSON: {0}")]
    Config(#[from] serde_json::Error),

    #[error("No memory game is open")]
    NoGame,
}

impl RequestError {
    pub fn invalid(name: &'static str, value: &str) -> Self {
        Self::InvalidParam {
            name,
            value: value.to_string(),
        }
    }

    /// Render as the red inline span the page swaps in.
    pub fn to_html(&self) -> String {
        format!(
            r#"<span class="text-bday-red">{}</span>"#,
            escape_html(&self.to_string())
        )
    }
}
