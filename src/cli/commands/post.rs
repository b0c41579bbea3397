//! Post command implementation
//!
//! Delivers a JSON payload to the configured FHIR endpoint and prints the
//! delivery outcome as JSON.

use crate::adapters::fhir::FhirDeliveryClient;
use crate::config::load_config;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the post command
#[derive(Args, Debug)]
pub struct PostArgs {
    /// JSON file holding the resource or Bundle to deliver
    pub file: PathBuf,
}

impl PostArgs {
    /// Execute the post command
    ///
    /// Returns 1 when the payload ends up in the dead-letter directory.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration: {e}");
                return Ok(2);
            }
        };
        if config.delivery.endpoint.is_empty() {
            println!("❌ delivery.endpoint is not set in {config_path}");
            return Ok(2);
        }

        let contents = match std::fs::read_to_string(&self.file) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to read {}: {e}", self.file.display());
                return Ok(2);
            }
        };
        let payload: serde_json::Value = match serde_json::from_str(&contents) {
            Ok(p) => p,
            Err(e) => {
                println!("❌ {} is not valid JSON: {e}", self.file.display());
                return Ok(2);
            }
        };

        let client = FhirDeliveryClient::from_config(&config.delivery)?;
        let outcome = client.post(&payload).await;

        println!("{}", serde_json::to_string_pretty(&outcome)?);
        if outcome.delivered {
            Ok(0)
        } else {
            println!(
                "❌ Delivery failed; artifacts written to {}",
                config.delivery.deadletter_dir
            );
            Ok(1)
        }
    }
}
