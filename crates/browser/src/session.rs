//! Browser Session Management
//!
//! This is the high-level API the verification routine drives.
//! Owns the browser process, the CDP connection, and one isolated
//! browsing context with a single page.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;
use uuid::Uuid;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::cdp::protocol::{BrowserContextId, CreateBrowserContextResult, CreateTargetResult};
use crate::cdp::{CDPClient, CDPError, CDPSession};
use crate::error::{BrowserError, Result};
use crate::events::{BrowserEvent, EventBus};
use crate::launcher::{BrowserProcess, LaunchConfig};
use crate::watchdog::WatchdogManager;
use crate::watchdogs::{
    wait_until_idle, CrashFlag, CrashWatchdog, IdleConfig, NetworkTracker, NetworkWatchdog,
};

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub id: String,
    pub launch: LaunchConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            launch: LaunchConfig::default(),
        }
    }
}

/// Browser Session - owns the browser process and its CDP connection
pub struct BrowserSession {
    pub config: SessionConfig,
    pub event_bus: EventBus,

    // Process and CDP infrastructure
    process: RwLock<Option<BrowserProcess>>,
    cdp_client: RwLock<Option<Arc<CDPClient>>>,

    // The one page this session drives, and its isolated context
    page: RwLock<Option<CDPSession>>,
    browser_context: RwLock<Option<BrowserContextId>>,

    // Watchdog system and the shared state it feeds
    watchdogs: WatchdogManager,
    network: NetworkTracker,
    crash: CrashFlag,
}

impl BrowserSession {
    pub fn new(config: SessionConfig) -> Self {
        let mut watchdogs = WatchdogManager::new();

        let network_watchdog = NetworkWatchdog::new();
        let network = network_watchdog.tracker();
        watchdogs.register(Box::new(network_watchdog));

        let crash_watchdog = CrashWatchdog::new();
        let crash = crash_watchdog.flag();
        watchdogs.register(Box::new(crash_watchdog));

        Self {
            config,
            event_bus: EventBus::new(),
            process: RwLock::new(None),
            cdp_client: RwLock::new(None),
            page: RwLock::new(None),
            browser_context: RwLock::new(None),
            watchdogs,
            network,
            crash,
        }
    }

    /// Start the browser session: spawn the process, connect CDP,
    /// attach watchdogs.
    pub async fn start(&self) -> Result<()> {
        let mut process = BrowserProcess::launch(&self.config.launch).await?;

        let client = match CDPClient::connect(process.ws_url()).await {
            Ok(client) => client,
            Err(e) => {
                // The process is ours; don't leak it on a failed connect
                if let Err(kill_err) = process.kill().await {
                    tracing::warn!("Failed to kill browser after connect failure: {}", kill_err);
                }
                return Err(e.into());
            }
        };

        self.watchdogs.attach_all(Arc::clone(&client)).await?;

        *self.cdp_client.write().await = Some(client);
        *self.process.write().await = Some(process);

        self.emit(BrowserEvent::Started).await;
        Ok(())
    }

    /// Open a page inside a fresh, isolated browsing context
    /// (own cookies, storage, and cache - the incognito equivalent).
    pub async fn open_page(&self) -> Result<()> {
        let client = self.client().await?;

        let result = client
            .send_request("Target.createBrowserContext", None, None)
            .await?;
        let context: CreateBrowserContextResult =
            serde_json::from_value(result).map_err(CDPError::Json)?;

        let result = client
            .send_request(
                "Target.createTarget",
                Some(json!({
                    "url": "about:blank",
                    "browserContextId": context.browser_context_id,
                })),
                None,
            )
            .await?;
        let target: CreateTargetResult = serde_json::from_value(result).map_err(CDPError::Json)?;

        let session = CDPSession::attach(client, target.target_id).await?;

        *self.page.write().await = Some(session);
        *self.browser_context.write().await = Some(context.browser_context_id.clone());

        self.emit(BrowserEvent::ContextCreated {
            context_id: context.browser_context_id,
        })
        .await;
        Ok(())
    }

    /// Navigate the page to a URL
    pub async fn navigate(&self, url: &str) -> Result<()> {
        let parsed = Url::parse(url).map_err(|e| BrowserError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        tracing::info!(
            "Navigating to {} (host {:?})",
            url,
            parsed.host_str().unwrap_or("<none>")
        );

        let page = self.page().await?;

        // Watchdogs reset their tracking on this event, so emit it before
        // the navigation actually starts.
        self.emit(BrowserEvent::NavigationStarted {
            url: url.to_string(),
        })
        .await;

        let result = page.navigate(url).await?;
        if let Some(reason) = result.error_text.filter(|t| !t.is_empty()) {
            return Err(BrowserError::NavigationFailed {
                url: url.to_string(),
                reason,
            });
        }

        self.emit(BrowserEvent::NavigationComplete {
            url: url.to_string(),
        })
        .await;
        Ok(())
    }

    /// Block until the page's network activity settles
    pub async fn wait_for_network_idle(&self, config: IdleConfig) -> Result<()> {
        wait_until_idle(&self.network, &self.crash, config).await
    }

    /// Capture a full-page screenshot and write it to `path`,
    /// overwriting any existing file. Parent directories are created.
    pub async fn screenshot(&self, path: &Path) -> Result<()> {
        let page = self.page().await?;

        let data = page.capture_screenshot().await?;
        let bytes = STANDARD.decode(data.as_bytes())?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, &bytes).await?;

        tracing::info!("Wrote {} byte screenshot to {}", bytes.len(), path.display());
        self.emit(BrowserEvent::ScreenshotCaptured {
            path: path.display().to_string(),
        })
        .await;
        Ok(())
    }

    /// Stop the browser session
    ///
    /// Every handle is released exactly once; calling stop on a session
    /// that never started (or stopping twice) is a no-op. Cleanup keeps
    /// going past individual failures so the process always gets killed.
    pub async fn stop(&self) -> Result<()> {
        if let Err(e) = self.watchdogs.detach_all().await {
            tracing::warn!("Watchdog detach failed: {}", e);
        }

        self.page.write().await.take();
        let context = self.browser_context.write().await.take();

        if let Some(client) = self.cdp_client.write().await.take() {
            if let Some(context_id) = context {
                // Best effort - the process is going down either way
                if let Err(e) = client
                    .send_request(
                        "Target.disposeBrowserContext",
                        Some(json!({ "browserContextId": context_id })),
                        None,
                    )
                    .await
                {
                    tracing::debug!("Failed to dispose browser context: {}", e);
                }
            }
            if let Err(e) = client.close().await {
                tracing::debug!("CDP close failed: {}", e);
            }
        }

        if let Some(mut process) = self.process.write().await.take() {
            process.kill().await?;
        }

        self.emit(BrowserEvent::Stopped).await;
        Ok(())
    }

    /// Publish an event and dispatch it to watchdogs
    async fn emit(&self, event: BrowserEvent) {
        let event = Arc::new(event);
        self.event_bus.publish((*event).clone());
        self.watchdogs.dispatch(event).await;
    }

    async fn client(&self) -> Result<Arc<CDPClient>> {
        self.cdp_client
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or(BrowserError::NotConnected)
    }

    async fn page(&self) -> Result<CDPSession> {
        self.page
            .read()
            .await
            .clone()
            .ok_or(BrowserError::NotConnected)
    }
}
