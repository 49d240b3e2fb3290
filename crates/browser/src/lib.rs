//! Headless Browser Automation over CDP
//!
//! This crate manages the full lifecycle of a headless Chromium instance:
//! spawning the process, speaking CDP (Chrome DevTools Protocol) over a
//! single WebSocket, driving an isolated browsing context, waiting for
//! network idle, and capturing screenshots.
//!
//! # Architecture
//!
//! 1. **Data structures first**: Clean ownership model, no unnecessary copies
//! 2. **Zero special cases**: Generic handling through traits, not if/else chains
//! 3. **Every handle released exactly once**: launch/connect failures clean up
//!    after themselves, and `stop()` is idempotent

pub mod cdp;
pub mod error;
pub mod events;
pub mod launcher;
pub mod session;
pub mod watchdog;
pub mod watchdogs;

pub use cdp::{CDPClient, CDPSession};
pub use error::{BrowserError, Result};
pub use events::{BrowserEvent, EventBus};
pub use launcher::{BrowserProcess, LaunchConfig};
pub use session::{BrowserSession, SessionConfig};
pub use watchdog::{Watchdog, WatchdogManager};
pub use watchdogs::{CrashWatchdog, IdleConfig, NetworkWatchdog};
