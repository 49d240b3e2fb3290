//! Error types for browser lifecycle operations
//!
//! Simple, flat error hierarchy. No over-engineering.

use std::time::Duration;
use thiserror::Error;

use crate::cdp::CDPError;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("No browser executable found (tried: {0})")]
    ExecutableNotFound(String),

    #[error("CDP error: {0}")]
    Cdp(#[from] CDPError),

    #[error("Not connected to a browser")]
    NotConnected,

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Navigation to {url} failed: {reason}")]
    NavigationFailed { url: String, reason: String },

    #[error("Page crashed")]
    PageCrashed,

    #[error("Timed out after {timeout:?} waiting for {condition}")]
    Timeout {
        condition: String,
        timeout: Duration,
    },

    #[error("Invalid screenshot payload: {0}")]
    ScreenshotDecode(#[from] base64::DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
