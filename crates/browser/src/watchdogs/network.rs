//! Network Watchdog - tracks in-flight requests for the network-idle wait
//!
//! "Network idle" is a heuristic: no requests in flight and no network
//! activity for a quiet period. Chrome never tells us a page is "done",
//! so this is the closest observable proxy for "finished loading".

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::cdp::CDPClient;
use crate::error::{BrowserError, Result};
use crate::events::BrowserEvent;
use crate::watchdog::Watchdog;
use crate::watchdogs::crash::CrashFlag;

/// Tunables for the idle wait
#[derive(Debug, Clone, Copy)]
pub struct IdleConfig {
    /// How long the network must stay quiet before the page counts as idle
    pub quiet_period: Duration,

    /// How often to re-check the tracker
    pub poll_interval: Duration,

    /// Overall bound on the wait
    pub timeout: Duration,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_millis(500),
            poll_interval: Duration::from_millis(100),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Tracks a single network request
#[derive(Clone, Debug)]
struct RequestTracker {
    request_id: String,
    start_time: Instant,
    url: String,
}

struct TrackerState {
    inflight: Vec<RequestTracker>,
    last_activity: Instant,
}

/// Shared view of the page's network activity.
///
/// Updates happen inline from CDP subscriber callbacks, so requests are
/// recorded in wire order - a loadingFinished can never overtake the
/// requestWillBeSent it belongs to and strand a phantom in-flight entry.
#[derive(Clone)]
pub struct NetworkTracker {
    state: Arc<Mutex<TrackerState>>,
}

impl NetworkTracker {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TrackerState {
                inflight: Vec::new(),
                last_activity: Instant::now(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        // Callbacks never panic while holding the lock; if one somehow did,
        // the state is still usable
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn track(&self, request_id: String, url: String) {
        let mut state = self.lock();
        tracing::debug!("[NetworkWatchdog] Tracking request {}: {}", request_id, url);
        state.inflight.push(RequestTracker {
            request_id,
            start_time: Instant::now(),
            url,
        });
        state.last_activity = Instant::now();
    }

    fn untrack(&self, request_id: &str) {
        let mut state = self.lock();
        if let Some(pos) = state
            .inflight
            .iter()
            .position(|r| r.request_id == request_id)
        {
            let tracker = state.inflight.remove(pos);
            let elapsed = Instant::now().duration_since(tracker.start_time);
            tracing::debug!(
                "[NetworkWatchdog] Request finished in {:?}: {}",
                elapsed,
                tracker.url
            );
        }
        state.last_activity = Instant::now();
    }

    /// Forget all tracked requests and restart the quiet clock
    pub fn reset(&self) {
        let mut state = self.lock();
        state.inflight.clear();
        state.last_activity = Instant::now();
    }

    pub fn inflight_count(&self) -> usize {
        self.lock().inflight.len()
    }

    /// How long the network has been quiet. Zero while requests are in flight.
    pub fn quiet_for(&self) -> Duration {
        let state = self.lock();
        if state.inflight.is_empty() {
            state.last_activity.elapsed()
        } else {
            Duration::ZERO
        }
    }
}

impl Default for NetworkTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Block until the network has been quiet for the configured period.
///
/// Aborts early when the page crashes - a crashed renderer would otherwise
/// look "idle" forever and waste the whole timeout.
pub async fn wait_until_idle(
    tracker: &NetworkTracker,
    crash: &CrashFlag,
    config: IdleConfig,
) -> Result<()> {
    let start = Instant::now();

    loop {
        if crash.is_crashed() {
            return Err(BrowserError::PageCrashed);
        }

        if tracker.quiet_for() >= config.quiet_period {
            return Ok(());
        }

        if start.elapsed() >= config.timeout {
            return Err(BrowserError::Timeout {
                condition: "network idle".to_string(),
                timeout: config.timeout,
            });
        }

        tokio::time::sleep(config.poll_interval).await;
    }
}

/// Network Watchdog - feeds the tracker from CDP network events
pub struct NetworkWatchdog {
    tracker: NetworkTracker,
}

impl NetworkWatchdog {
    pub fn new() -> Self {
        Self {
            tracker: NetworkTracker::new(),
        }
    }

    /// Handle to the shared tracker, for wait loops
    pub fn tracker(&self) -> NetworkTracker {
        self.tracker.clone()
    }
}

impl Default for NetworkWatchdog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Watchdog for NetworkWatchdog {
    fn name(&self) -> &str {
        "NetworkWatchdog"
    }

    async fn on_event(&self, event: &BrowserEvent) {
        // A fresh navigation restarts idle tracking; requests from the
        // previous document no longer matter.
        if let BrowserEvent::NavigationStarted { url } = event {
            tracing::debug!("[NetworkWatchdog] Resetting tracker for {}", url);
            self.tracker.reset();
        }
    }

    async fn on_attach(&self, cdp_client: Arc<CDPClient>) -> Result<()> {
        // Callbacks update the tracker inline: the client dispatches events
        // in receive order, which keeps start/finish pairs ordered.
        let tracker = self.tracker.clone();
        cdp_client.subscribe(
            "Network.requestWillBeSent",
            Arc::new(move |event| {
                if let Some(params) = event.params.as_ref() {
                    let request_id = params["requestId"].as_str().unwrap_or("").to_string();
                    let url = params["request"]["url"].as_str().unwrap_or("").to_string();
                    tracker.track(request_id, url);
                }
            }),
        );

        let tracker = self.tracker.clone();
        cdp_client.subscribe(
            "Network.loadingFinished",
            Arc::new(move |event| {
                if let Some(params) = event.params.as_ref() {
                    let request_id = params["requestId"].as_str().unwrap_or("");
                    tracker.untrack(request_id);
                }
            }),
        );

        let tracker = self.tracker.clone();
        cdp_client.subscribe(
            "Network.loadingFailed",
            Arc::new(move |event| {
                if let Some(params) = event.params.as_ref() {
                    let request_id = params["requestId"].as_str().unwrap_or("");
                    let error = params["errorText"].as_str().unwrap_or("unknown");
                    tracing::debug!("[NetworkWatchdog] Request {} failed: {}", request_id, error);
                    tracker.untrack(request_id);
                }
            }),
        );

        tracing::debug!("[NetworkWatchdog] Attached to CDP events");
        Ok(())
    }

    async fn on_detach(&self) -> Result<()> {
        self.tracker.reset();
        Ok(())
    }
}
