//! CLI interface and argument parsing
//!
//! Exit codes: 0 success, 1 partial or delivery failure, 2 configuration
//! error, 5 fatal error.

pub mod commands;

use clap::{Parser, Subcommand};

/// hl7bridge - HL7 v2 interop engine
#[derive(Parser, Debug)]
#[command(name = "hl7bridge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "hl7bridge.toml", env = "HL7BRIDGE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "HL7BRIDGE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the MLLP listener until interrupted
    Serve(commands::serve::ServeArgs),

    /// Send the messages in a file to an MLLP listener
    Send(commands::send::SendArgs),

    /// Apply the configured field rules to every message in a file
    Transform(commands::transform::TransformArgs),

    /// Wrap or unwrap a batch envelope
    Batch(commands::batch::BatchArgs),

    /// Deliver a JSON payload to the configured FHIR endpoint
    Post(commands::post::PostArgs),

    /// Load a mapping specification and summarise it
    CheckMap(commands::check_map::CheckMapArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),
}
