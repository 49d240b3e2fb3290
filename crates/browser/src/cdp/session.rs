//! CDP Session - Represents a connection to a specific browser target
//!
//! Design: Lightweight wrapper around CDPClient with target-specific context.
//! All sessions share the same WebSocket - no per-session connection overhead.

use super::client::{CDPClient, CDPError, Result};
use super::protocol::{
    AttachToTargetResult, CaptureScreenshotResult, NavigateResult, SessionId, TargetId,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// Domains enabled on every attached session. Network is required for the
/// idle tracking that backs `wait_for_network_idle`.
const ENABLED_DOMAINS: &[&str] = &["Page", "Network", "Runtime"];

/// CDP Session bound to a specific target
#[derive(Clone)]
pub struct CDPSession {
    /// Shared CDP client
    client: Arc<CDPClient>,

    /// Target this session is attached to
    pub target_id: TargetId,

    /// Session ID assigned by Chrome
    pub session_id: SessionId,
}

impl CDPSession {
    /// Attach to a target and create session
    pub async fn attach(client: Arc<CDPClient>, target_id: TargetId) -> Result<Self> {
        let result = client
            .send_request(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true,
                })),
                None,
            )
            .await?;

        let attach_result: AttachToTargetResult =
            serde_json::from_value(result).map_err(CDPError::Json)?;

        let session_id = attach_result.session_id;

        // Enable all domains in parallel
        let enable_futures: Vec<_> = ENABLED_DOMAINS
            .iter()
            .map(|domain| {
                let client = client.clone();
                let session_id = session_id.clone();
                async move {
                    client
                        .send_request(format!("{}.enable", domain), None, Some(session_id))
                        .await
                }
            })
            .collect();

        // Wait for all enables (ignore individual failures)
        let results = futures_util::future::join_all(enable_futures).await;
        let failures = results.iter().filter(|r| r.is_err()).count();
        if failures > 0 {
            tracing::warn!("Some domain enables failed: {}/{}", failures, results.len());
        }

        Ok(Self {
            client,
            target_id,
            session_id,
        })
    }

    /// Send command within this session's context
    pub async fn send(&self, method: impl Into<String>, params: Option<Value>) -> Result<Value> {
        self.client
            .send_request(method, params, Some(self.session_id.clone()))
            .await
    }

    /// Navigate to URL
    ///
    /// A failed navigation still resolves the command; the failure is in
    /// `error_text` and the caller decides what to do with it.
    pub async fn navigate(&self, url: impl Into<String>) -> Result<NavigateResult> {
        let result = self
            .send("Page.navigate", Some(json!({ "url": url.into() })))
            .await?;

        serde_json::from_value(result).map_err(CDPError::Json)
    }

    /// Evaluate JavaScript
    pub async fn evaluate(&self, expression: impl Into<String>) -> Result<Value> {
        self.send(
            "Runtime.evaluate",
            Some(json!({
                "expression": expression.into(),
                "returnByValue": true,
            })),
        )
        .await
    }

    /// Capture a full-page screenshot, returning the base64 payload
    pub async fn capture_screenshot(&self) -> Result<String> {
        let result = self
            .send(
                "Page.captureScreenshot",
                Some(json!({
                    "format": "png",
                    "captureBeyondViewport": true,
                })),
            )
            .await?;

        let screenshot: CaptureScreenshotResult =
            serde_json::from_value(result).map_err(CDPError::Json)?;

        Ok(screenshot.data)
    }
}
