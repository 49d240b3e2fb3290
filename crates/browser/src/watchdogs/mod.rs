//! Watchdog implementations
//!
//! Each watchdog monitors one aspect of browser health and feeds shared
//! state that the session's wait loops consume.

pub mod crash;
pub mod network;

pub use crash::{CrashFlag, CrashWatchdog};
pub use network::{wait_until_idle, IdleConfig, NetworkTracker, NetworkWatchdog};
