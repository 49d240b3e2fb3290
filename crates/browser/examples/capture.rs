//! Basic capture example - launch, navigate, screenshot, shut down

use browser::{BrowserSession, IdleConfig, SessionConfig};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let session = BrowserSession::new(SessionConfig::default());

    println!("Launching headless browser...");
    session.start().await?;

    let result = async {
        session.open_page().await?;
        session.navigate("https://example.com").await?;
        session.wait_for_network_idle(IdleConfig::default()).await?;
        session.screenshot(Path::new("/tmp/example.png")).await
    }
    .await;

    match result {
        Ok(()) => println!("Screenshot taken: /tmp/example.png"),
        Err(e) => println!("Error: {}", e),
    }

    // Clean shutdown, whatever happened above
    session.stop().await?;
    println!("Browser stopped");

    Ok(())
}
