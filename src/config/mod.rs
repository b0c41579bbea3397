//! Configuration management for hl7bridge.
//!
//! TOML configuration with:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `HL7BRIDGE_<SECTION>_<KEY>` environment overrides
//! - Defaults for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use hl7bridge::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("hl7bridge.toml")?;
//!
//! println!("MLLP: {}:{}", config.mllp.host, config.mllp.port);
//! println!("FHIR endpoint: {}", config.delivery.endpoint);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level
//! - [`MllpConfig`] - listener address, limits, spool directory, version allow-list
//! - [`DeliveryConfig`] - FHIR endpoint, token, retry and dead-letter settings
//! - [`TransformConfig`] - field copy/move rules
//! - [`LoggingConfig`] - local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [mllp]
//! host = "0.0.0.0"
//! port = 2575
//! spool_dir = "out/hl7"
//!
//! [delivery]
//! endpoint = "https://fhir.example.com/fhir"
//! token = "${FHIR_TOKEN}"
//! max_retries = 3
//!
//! [[transform.rules]]
//! from_path = "PID-5.1"
//! to_path = "PID-9.1"
//! op = "copy"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_str};
pub use schema::{
    ApplicationConfig, BridgeConfig, DeliveryConfig, LoggingConfig, MllpConfig, TransformConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
