//! CDP Protocol Types
//!
//! These are the fundamental types for CDP communication.
//! Keep them minimal - add domain-specific types only when needed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request ID - monotonically increasing
pub type RequestId = u64;

/// Target ID from Chrome
pub type TargetId = String;

/// Session ID for attached targets
pub type SessionId = String;

/// Browser context ID from Target.createBrowserContext
pub type BrowserContextId = String;

/// CDP Request sent to browser
#[derive(Debug, Clone, Serialize)]
pub struct CDPRequest {
    pub id: RequestId,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

/// CDP Response from browser
#[derive(Debug, Clone, Deserialize)]
pub struct CDPResponse {
    pub id: RequestId,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<CDPProtocolError>,
}

/// Error object embedded in a CDP response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CDPProtocolError {
    pub code: i32,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// CDP Event from browser (no request ID)
#[derive(Debug, Clone, Deserialize)]
pub struct CDPEvent {
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<SessionId>,
}

/// Unified CDP Message (response or event)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CDPMessage {
    Response(CDPResponse),
    Event(CDPEvent),
}

/// Result of Target.attachToTarget
#[derive(Debug, Clone, Deserialize)]
pub struct AttachToTargetResult {
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
}

/// Result of Target.createBrowserContext
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBrowserContextResult {
    #[serde(rename = "browserContextId")]
    pub browser_context_id: BrowserContextId,
}

/// Result of Target.createTarget
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTargetResult {
    #[serde(rename = "targetId")]
    pub target_id: TargetId,
}

/// Result of Page.navigate
///
/// Chrome reports navigation failures (connection refused, DNS errors) through
/// `errorText` rather than a protocol-level error, so callers must check it.
#[derive(Debug, Clone, Deserialize)]
pub struct NavigateResult {
    #[serde(rename = "frameId")]
    pub frame_id: String,
    #[serde(rename = "errorText", default)]
    pub error_text: Option<String>,
}

/// Result of Page.captureScreenshot - base64-encoded image data
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureScreenshotResult {
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_omits_empty_fields() {
        let request = CDPRequest {
            id: 1,
            method: "Browser.getVersion".to_string(),
            params: None,
            session_id: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("params"));
        assert!(!json.contains("sessionId"));
    }

    #[test]
    fn message_parses_as_response_or_event() {
        let response: CDPMessage =
            serde_json::from_str(r#"{"id":42,"result":{"ok":true}}"#).unwrap();
        assert!(matches!(response, CDPMessage::Response(r) if r.id == 42));

        let event: CDPMessage =
            serde_json::from_str(r#"{"method":"Network.loadingFinished","params":{}}"#).unwrap();
        assert!(matches!(event, CDPMessage::Event(e) if e.method == "Network.loadingFinished"));
    }

    #[test]
    fn navigate_result_carries_error_text() {
        let ok: NavigateResult = serde_json::from_value(json!({ "frameId": "F1" })).unwrap();
        assert!(ok.error_text.is_none());

        let failed: NavigateResult = serde_json::from_value(json!({
            "frameId": "F1",
            "errorText": "net::ERR_CONNECTION_REFUSED",
        }))
        .unwrap();
        assert_eq!(
            failed.error_text.as_deref(),
            Some("net::ERR_CONNECTION_REFUSED")
        );
    }
}
