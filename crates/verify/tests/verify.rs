//! End-to-end tests for the verification routine
//!
//! The routine's contract: it terminates normally whether or not the target
//! server (or even the browser) is available, and the browser process is
//! never leaked. Tests that need an installed Chromium are #[ignore]d.

use std::path::PathBuf;
use std::time::Duration;

use browser::{BrowserSession, LaunchConfig, SessionConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use verify::{diagnostic, run_verification, VerifyConfig};

/// Minimal HTTP server standing in for the application under test.
/// Answers every request with a small HTML page.
async fn spawn_html_server() -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;

                let body = "<html><body><h1>Sign in</h1></body></html>";
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    addr
}

fn temp_screenshot_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("verification").join("page.png")
}

#[tokio::test]
async fn completes_normally_when_browser_cannot_launch() {
    let dir = tempfile::tempdir().unwrap();
    let config = VerifyConfig {
        screenshot_path: temp_screenshot_path(&dir),
        launch: LaunchConfig {
            executable: Some("/nonexistent/browser-binary".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    // Must not panic and must not propagate the launch failure
    run_verification(&config).await;

    assert!(!config.screenshot_path.exists());
}

#[tokio::test]
#[ignore] // Needs an installed Chromium
async fn reachable_server_yields_screenshot() {
    let addr = spawn_html_server().await;
    let dir = tempfile::tempdir().unwrap();

    let config = VerifyConfig {
        url: format!("http://{}/sweets", addr),
        screenshot_path: temp_screenshot_path(&dir),
        launch: LaunchConfig::default(),
    };

    run_verification(&config).await;

    let meta = std::fs::metadata(&config.screenshot_path).expect("screenshot should exist");
    assert!(meta.len() > 0, "screenshot should be non-empty");
}

#[tokio::test]
#[ignore] // Needs an installed Chromium
async fn unreachable_server_is_survived() {
    let dir = tempfile::tempdir().unwrap();

    // Port 1 is never listening
    let config = VerifyConfig {
        url: "http://127.0.0.1:1/sweets".to_string(),
        screenshot_path: temp_screenshot_path(&dir),
        launch: LaunchConfig::default(),
    };

    // Navigation fails with ERR_CONNECTION_REFUSED; the routine logs it
    // and still returns normally with the browser released
    run_verification(&config).await;

    assert!(!config.screenshot_path.exists());

    // The same failure, taken directly from a session, renders as an
    // `Error`-prefixed diagnostic line
    let session = BrowserSession::new(SessionConfig::default());
    session.start().await.expect("browser should launch");
    session.open_page().await.expect("page should open");
    let err = session
        .navigate(&config.url)
        .await
        .expect_err("port 1 should refuse the connection");
    session.stop().await.expect("browser should stop");

    let line = diagnostic(&err);
    assert!(line.contains("Error"), "got: {}", line);
}

#[tokio::test]
#[ignore] // Needs an installed Chromium
async fn repeated_runs_overwrite_the_screenshot() {
    let addr = spawn_html_server().await;
    let dir = tempfile::tempdir().unwrap();

    let config = VerifyConfig {
        url: format!("http://{}/sweets", addr),
        screenshot_path: temp_screenshot_path(&dir),
        launch: LaunchConfig::default(),
    };

    run_verification(&config).await;
    let first = std::fs::metadata(&config.screenshot_path)
        .expect("first screenshot should exist")
        .modified()
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    run_verification(&config).await;
    let second = std::fs::metadata(&config.screenshot_path)
        .expect("second screenshot should exist")
        .modified()
        .unwrap();

    assert!(second > first, "second run should overwrite the file");
}
