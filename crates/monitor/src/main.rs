//! Firewatch Monitoring Client - Main Entry Point

use monitor::{init_logging, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    run().await
}
