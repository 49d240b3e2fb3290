//! Browser Process Launcher
//!
//! Spawns a headless Chromium with a DevTools port and discovers the
//! browser-level WebSocket URL by polling the /json/version endpoint.
//! The process handle is released exactly once; `kill_on_drop` backstops
//! panics between launch and shutdown.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::{BrowserError, Result};

/// How long the DevTools endpoint gets to come up after spawn.
const STARTUP_TIMEOUT: Duration = Duration::from_secs(20);

/// Poll interval for the /json/version endpoint.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Executables probed in order when no explicit path is configured.
const EXECUTABLE_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

/// Launch configuration for the browser process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Explicit executable path. None means probe the usual names.
    pub executable: Option<String>,
    pub headless: bool,
    pub debug_port: u16,
    pub window_size: (u32, u32),
    pub extra_args: Vec<String>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            debug_port: 9222,
            window_size: (1920, 1080),
            extra_args: Vec::new(),
        }
    }
}

impl LaunchConfig {
    fn args(&self, user_data_dir: &Path) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.debug_port),
            // Unique profile dir avoids ProcessSingleton conflicts between
            // concurrent instances and gives a fresh cookie/cache state.
            format!("--user-data-dir={}", user_data_dir.display()),
            format!("--window-size={},{}", self.window_size.0, self.window_size.1),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-background-networking".to_string(),
            // Required in containers where user namespaces are unavailable
            "--no-sandbox".to_string(),
            // Prevents /dev/shm exhaustion in containerized environments
            "--disable-dev-shm-usage".to_string(),
        ];

        if self.headless {
            args.push("--headless=new".to_string());
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }

    fn candidates(&self) -> Vec<String> {
        match &self.executable {
            Some(exe) => vec![exe.clone()],
            None => EXECUTABLE_CANDIDATES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// A spawned browser process plus its DevTools endpoint
pub struct BrowserProcess {
    child: Option<Child>,
    user_data_dir: PathBuf,
    ws_url: String,
}

impl BrowserProcess {
    /// Spawn the browser and wait for its DevTools endpoint
    pub async fn launch(config: &LaunchConfig) -> Result<Self> {
        let user_data_dir =
            std::env::temp_dir().join(format!("page-verify-{}", Uuid::new_v4()));
        let args = config.args(&user_data_dir);

        let mut child = None;
        for candidate in config.candidates() {
            match Command::new(&candidate)
                .args(&args)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()
            {
                Ok(spawned) => {
                    tracing::info!("Launched {} (pid {:?})", candidate, spawned.id());
                    child = Some(spawned);
                    break;
                }
                Err(e) => {
                    tracing::debug!("Candidate {} not usable: {}", candidate, e);
                }
            }
        }

        let mut child = child.ok_or_else(|| {
            BrowserError::ExecutableNotFound(config.candidates().join(", "))
        })?;

        match discover_ws_url(&mut child, config.debug_port).await {
            Ok(ws_url) => Ok(Self {
                child: Some(child),
                user_data_dir,
                ws_url,
            }),
            Err(e) => {
                if let Err(kill_err) = child.kill().await {
                    tracing::warn!("Failed to kill browser after startup failure: {}", kill_err);
                }
                let _ = tokio::fs::remove_dir_all(&user_data_dir).await;
                Err(e)
            }
        }
    }

    /// WebSocket URL of the browser-level DevTools endpoint
    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Terminate the process and remove its temporary profile.
    /// Safe to call more than once.
    pub async fn kill(&mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            child.kill().await?;
            // Profile dir is disposable; removal failure is not fatal
            if let Err(e) = tokio::fs::remove_dir_all(&self.user_data_dir).await {
                tracing::debug!("Failed to remove user data dir: {}", e);
            }
            tracing::info!("Browser process terminated");
        }
        Ok(())
    }
}

/// Poll /json/version until Chrome publishes its WebSocket debugger URL
async fn discover_ws_url(child: &mut Child, port: u16) -> Result<String> {
    #[derive(Deserialize)]
    struct JsonVersion {
        #[serde(rename = "webSocketDebuggerUrl")]
        web_socket_debugger_url: String,
    }

    let endpoint = format!("http://127.0.0.1:{}/json/version", port);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| BrowserError::Launch(format!("failed to build HTTP client: {}", e)))?;

    let deadline = Instant::now() + STARTUP_TIMEOUT;
    loop {
        if let Some(status) = child.try_wait()? {
            return Err(BrowserError::Launch(format!(
                "browser exited during startup: {}",
                status
            )));
        }

        if let Ok(response) = client.get(&endpoint).send().await {
            if let Ok(version) = response.json::<JsonVersion>().await {
                tracing::debug!("DevTools endpoint ready: {}", version.web_socket_debugger_url);
                return Ok(version.web_socket_debugger_url);
            }
        }

        if Instant::now() >= deadline {
            return Err(BrowserError::Launch(format!(
                "DevTools endpoint on port {} did not come up within {:?}",
                port, STARTUP_TIMEOUT
            )));
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_args_cover_headless_and_port() {
        let config = LaunchConfig::default();
        let args = config.args(Path::new("/tmp/profile"));

        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--remote-debugging-port=9222".to_string()));
        assert!(args.contains(&"--user-data-dir=/tmp/profile".to_string()));
        assert!(args.contains(&"--window-size=1920,1080".to_string()));
    }

    #[test]
    fn visible_mode_drops_headless_flag() {
        let config = LaunchConfig {
            headless: false,
            ..Default::default()
        };
        let args = config.args(Path::new("/tmp/profile"));

        assert!(!args.iter().any(|a| a.starts_with("--headless")));
    }

    #[test]
    fn explicit_executable_is_the_only_candidate() {
        let config = LaunchConfig {
            executable: Some("/opt/chrome/chrome".to_string()),
            ..Default::default()
        };
        assert_eq!(config.candidates(), vec!["/opt/chrome/chrome".to_string()]);
    }

    #[tokio::test]
    async fn launch_fails_cleanly_without_executable() {
        let config = LaunchConfig {
            executable: Some("/nonexistent/browser-binary".to_string()),
            ..Default::default()
        };

        let result = BrowserProcess::launch(&config).await;
        assert!(matches!(result, Err(BrowserError::ExecutableNotFound(_))));
    }

    #[tokio::test]
    #[ignore] // Needs an installed Chromium
    async fn launch_and_kill() {
        let mut process = BrowserProcess::launch(&LaunchConfig::default())
            .await
            .expect("failed to launch browser");

        assert!(process.ws_url().starts_with("ws://"));

        process.kill().await.expect("failed to kill browser");
        // Released exactly once: second kill is a no-op
        process.kill().await.expect("second kill should be a no-op");
    }
}
