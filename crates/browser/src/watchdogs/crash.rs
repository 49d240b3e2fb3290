//! Crash Watchdog - detects renderer crashes via Inspector.targetCrashed
//!
//! A crashed page never reaches network idle, so the idle wait checks this
//! flag and bails out early instead of burning its full timeout.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cdp::CDPClient;
use crate::error::Result;
use crate::events::BrowserEvent;
use crate::watchdog::Watchdog;

/// Shared crash indicator, cheap to clone into wait loops
#[derive(Clone, Default)]
pub struct CrashFlag {
    crashed: Arc<AtomicBool>,
}

impl CrashFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.crashed.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.crashed.store(false, Ordering::SeqCst);
    }

    pub fn is_crashed(&self) -> bool {
        self.crashed.load(Ordering::SeqCst)
    }
}

/// Crash Watchdog - raises a flag when the inspected target crashes
pub struct CrashWatchdog {
    flag: CrashFlag,
}

impl CrashWatchdog {
    pub fn new() -> Self {
        Self {
            flag: CrashFlag::new(),
        }
    }

    /// Handle to the crash flag, for wait loops
    pub fn flag(&self) -> CrashFlag {
        self.flag.clone()
    }
}

impl Default for CrashWatchdog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Watchdog for CrashWatchdog {
    fn name(&self) -> &str {
        "CrashWatchdog"
    }

    async fn on_event(&self, event: &BrowserEvent) {
        // A fresh navigation starts with a clean slate
        if let BrowserEvent::NavigationStarted { url } = event {
            tracing::debug!("[CrashWatchdog] Resetting crash flag for {}", url);
            self.flag.clear();
        }
    }

    async fn on_attach(&self, cdp_client: Arc<CDPClient>) -> Result<()> {
        let flag = self.flag.clone();
        cdp_client.subscribe(
            "Inspector.targetCrashed",
            Arc::new(move |event| {
                tracing::warn!("[CrashWatchdog] Target crashed: {:?}", event.params);
                flag.set();
            }),
        );

        tracing::debug!("[CrashWatchdog] Attached to CDP events");
        Ok(())
    }

    async fn on_detach(&self) -> Result<()> {
        self.flag.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn navigation_clears_crash_flag() {
        let watchdog = CrashWatchdog::new();
        let flag = watchdog.flag();

        flag.set();
        assert!(flag.is_crashed());

        watchdog
            .on_event(&BrowserEvent::NavigationStarted {
                url: "http://localhost:8080/sweets".to_string(),
            })
            .await;

        assert!(!flag.is_crashed());
    }

    #[tokio::test]
    async fn detach_clears_crash_flag() {
        let watchdog = CrashWatchdog::new();
        watchdog.flag().set();

        watchdog.on_detach().await.unwrap();
        assert!(!watchdog.flag().is_crashed());
    }
}
