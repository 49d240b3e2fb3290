//! Entry point for the page verification check

use verify::{run_verification, VerifyConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    run_verification(&VerifyConfig::default()).await;
}
