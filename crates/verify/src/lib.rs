//! Page Verification Routine
//!
//! A best-effort diagnostic: load the page under test in a fresh headless
//! browser, wait for the network to settle, and save a full-page screenshot.
//! Failure to verify is reported on stdout, never fatal - the routine always
//! releases the browser and returns normally.

use std::path::PathBuf;

use browser::{BrowserError, BrowserSession, IdleConfig, LaunchConfig, SessionConfig};

/// The page under test. The app serves on 8080; unauthenticated visits to
/// /sweets are expected to land on the sign-in flow.
pub const DEFAULT_URL: &str = "http://localhost:8080/sweets";

/// Where the evidence goes.
pub const DEFAULT_SCREENSHOT_PATH: &str = "verification/sweets_unauth.png";

/// Verification inputs. Defaults reproduce the standard check; overriding
/// them does not change behavior for the default case.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    pub url: String,
    pub screenshot_path: PathBuf,
    pub launch: LaunchConfig,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            screenshot_path: PathBuf::from(DEFAULT_SCREENSHOT_PATH),
            launch: LaunchConfig::default(),
        }
    }
}

/// Run the verification end to end.
///
/// One guarded scope: acquire browser, use it, release it. Any failure in
/// the middle is caught at this boundary, printed as a diagnostic, and
/// swallowed - the browser is released on every path and the routine
/// returns normally.
pub async fn run_verification(config: &VerifyConfig) {
    let session = BrowserSession::new(SessionConfig {
        launch: config.launch.clone(),
        ..Default::default()
    });

    match session.start().await {
        Ok(()) => {
            if let Err(e) = verify_page(&session, config).await {
                println!("{}", diagnostic(&e));
            }
        }
        Err(e) => {
            println!("{}", diagnostic(&e));
        }
    }

    // The finally block: release the browser no matter what happened above.
    // stop() is idempotent and safe after a failed start.
    if let Err(e) = session.stop().await {
        tracing::warn!("Failed to stop browser session: {}", e);
    }
}

/// Render a failure as the stdout diagnostic line. Every failure the
/// routine swallows goes through here, so the output is always greppable
/// for `Error`.
pub fn diagnostic(e: &BrowserError) -> String {
    format!("Error: {}", e)
}

async fn verify_page(session: &BrowserSession, config: &VerifyConfig) -> browser::Result<()> {
    session.open_page().await?;
    session.navigate(&config.url).await?;
    session.wait_for_network_idle(IdleConfig::default()).await?;
    session.screenshot(&config.screenshot_path).await?;

    println!("Screenshot taken: {}", config.screenshot_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_standard_check() {
        let config = VerifyConfig::default();

        assert_eq!(config.url, "http://localhost:8080/sweets");
        assert_eq!(
            config.screenshot_path,
            PathBuf::from("verification/sweets_unauth.png")
        );
        assert!(config.launch.headless);
    }

    #[test]
    fn diagnostic_lines_always_carry_error() {
        let refused = BrowserError::NavigationFailed {
            url: DEFAULT_URL.to_string(),
            reason: "net::ERR_CONNECTION_REFUSED".to_string(),
        };
        let rendered = diagnostic(&refused);
        assert!(rendered.contains("Error"), "got: {}", rendered);
        assert!(rendered.contains("net::ERR_CONNECTION_REFUSED"));

        let no_browser = BrowserError::ExecutableNotFound("chromium".to_string());
        assert!(diagnostic(&no_browser).contains("Error"));
    }
}
