//! Serve command implementation
//!
//! Runs the MLLP listener until a shutdown signal arrives.

use crate::adapters::mllp::{select_sink, MllpServer};
use crate::config::load_config;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override the configured listener port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the configured spool directory
    #[arg(long)]
    pub spool_dir: Option<String>,
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration: {e}");
                return Ok(2);
            }
        };
        if let Some(port) = self.port {
            config.mllp.port = port;
        }
        if self.spool_dir.is_some() {
            config.mllp.spool_dir = self.spool_dir.clone();
        }

        let sink = select_sink(config.mllp.spool_dir.as_deref())?;
        let server = MllpServer::bind(&config.mllp, sink).await?;
        let addr = server.local_addr()?;

        println!("🚀 MLLP listener on {addr}");
        println!("   Press Ctrl+C to stop");

        server.run(shutdown_signal).await?;

        println!("✅ Listener stopped");
        Ok(0)
    }
}
