//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the hl7bridge configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates before returning
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  MLLP Listener: {}:{}", config.mllp.host, config.mllp.port);
        println!("  Max Connections: {}", config.mllp.max_connections);
        println!("  Max Frame Bytes: {}", config.mllp.max_frame_bytes);
        match &config.mllp.spool_dir {
            Some(dir) => println!("  Inbound Sink: spool ({dir})"),
            None => println!("  Inbound Sink: ack-only"),
        }
        if config.mllp.supported_versions.is_empty() {
            println!("  Supported Versions: any");
        } else {
            println!(
                "  Supported Versions: {}",
                config.mllp.supported_versions.join(", ")
            );
        }
        if config.delivery.endpoint.is_empty() {
            println!("  FHIR Endpoint: (not set)");
        } else {
            println!("  FHIR Endpoint: {}", config.delivery.endpoint);
        }
        println!(
            "  Bearer Token: {}",
            if config.delivery.token.is_some() { "set" } else { "not set" }
        );
        println!("  Max Retries: {}", config.delivery.max_retries);
        println!("  Dead-letter Dir: {}", config.delivery.deadletter_dir);
        println!("  Transform Rules: {}", config.transform.rules.len());

        Ok(0)
    }
}
