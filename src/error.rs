use std::error::Error as _;

use reqwest::StatusCode;

/// Ways a single chat submission can fail.
///
/// Every variant is terminal for its submission only; the controller turns
/// it into a diagnostic transcript entry and keeps running.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    /// The backend answered with a structured `{"error": ...}` payload.
    #[error("{message}")]
    Backend { status: StatusCode, message: String },

    /// Non-success status without a usable error payload.
    #[error("HTTP error! status: {0}")]
    Status(StatusCode),

    /// Success status, but the body was not `{"response": ...}`.
    #[error("could not read reply: {0}")]
    Decode(String),

    /// The request never produced a response.
    #[error("{0}")]
    Transport(String),
}

impl ChatError {
    /// Text shown to the user in place of the reply.
    pub fn diagnostic(&self) -> String {
        format!(
            "Sorry, an error occurred: {}. Please check your network connection and make sure the chat service is running.",
            self
        )
    }

    /// Build a transport error from a reqwest failure, keeping the whole source chain
    /// so the underlying cause (e.g. "Connection refused") reaches the user.
    pub fn transport(err: &reqwest::Error) -> Self {
        let mut description = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            let text = cause.to_string();
            if !description.contains(&text) {
                description.push_str(": ");
                description.push_str(&text);
            }
            source = cause.source();
        }
        ChatError::Transport(description)
    }
}
