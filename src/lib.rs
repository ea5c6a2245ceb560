//! Terminal chat client for a request/response chat endpoint.
//!
//! The [`controller`] drives each chat turn: the user's message and a
//! pending placeholder are appended to the [`transcript`], the request runs
//! in the background through a [`client::ChatBackend`], and the placeholder
//! is replaced by the reply or by a diagnostic when it settles.

pub mod app;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod handler;
pub mod input;
pub mod logging;
pub mod transcript;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use client::{ChatBackend, HttpChatClient};
pub use config::Config;
pub use controller::{Completion, Controller, SubmissionState};
pub use error::ChatError;
pub use transcript::{ChatRole, EntryId, MessageEntry, Transcript};
