//! Configuration schema types
//!
//! Every section has defaults, so a minimal file only needs the values that
//! differ from them.

use crate::config::SecretString;
use crate::core::transform::{FieldTransformer, TransformRule};
use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// MLLP listener settings
    #[serde(default)]
    pub mllp: MllpConfig,

    /// FHIR delivery settings
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Field transform rules
    #[serde(default)]
    pub transform: TransformConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.mllp.validate()?;
        self.delivery.validate()?;
        self.transform.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// MLLP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MllpConfig {
    /// Interface to bind
    #[serde(default = "default_mllp_host")]
    pub host: String,

    /// Port to bind
    #[serde(default = "default_mllp_port")]
    pub port: u16,

    /// Connections served at once; further clients wait to be accepted
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Idle timeout per connection
    #[serde(default = "default_read_timeout_seconds")]
    pub read_timeout_seconds: u64,

    /// Largest accepted frame payload
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    /// Spool inbound frames here when set
    #[serde(default)]
    pub spool_dir: Option<String>,

    /// Accepted MSH-12 versions; empty accepts all
    #[serde(default)]
    pub supported_versions: Vec<String>,
}

impl Default for MllpConfig {
    fn default() -> Self {
        Self {
            host: default_mllp_host(),
            port: default_mllp_port(),
            max_connections: default_max_connections(),
            read_timeout_seconds: default_read_timeout_seconds(),
            max_frame_bytes: default_max_frame_bytes(),
            spool_dir: None,
            supported_versions: Vec::new(),
        }
    }
}

impl MllpConfig {
    fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("mllp.host cannot be empty".to_string());
        }
        if self.port == 0 {
            return Err("mllp.port must be > 0".to_string());
        }
        if self.max_connections == 0 {
            return Err("mllp.max_connections must be >= 1".to_string());
        }
        if self.read_timeout_seconds == 0 {
            return Err("mllp.read_timeout_seconds must be > 0".to_string());
        }
        if self.max_frame_bytes == 0 {
            return Err("mllp.max_frame_bytes must be >= 1".to_string());
        }
        Ok(())
    }
}

/// FHIR delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// FHIR endpoint receiving POSTs
    #[serde(default)]
    pub endpoint: String,

    /// Bearer token (optional)
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub token: Option<SecretString>,

    /// Per-attempt request timeout
    #[serde(default = "default_delivery_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Directory for undeliverable payloads
    #[serde(default = "default_deadletter_dir")]
    pub deadletter_dir: String,

    /// Delay before the first retry, doubled for each later one
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Upper bound of the random delay added to each backoff
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            token: None,
            timeout_seconds: default_delivery_timeout_seconds(),
            max_retries: default_max_retries(),
            deadletter_dir: default_deadletter_dir(),
            backoff_base_ms: default_backoff_base_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

impl DeliveryConfig {
    fn validate(&self) -> Result<(), String> {
        if !self.endpoint.is_empty()
            && !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://"))
        {
            return Err(format!(
                "delivery.endpoint must start with http:// or https://, got '{}'",
                self.endpoint
            ));
        }
        if self.timeout_seconds == 0 {
            return Err("delivery.timeout_seconds must be >= 1".to_string());
        }
        if self.deadletter_dir.trim().is_empty() {
            return Err("delivery.deadletter_dir cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Field transform configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Rules applied in order
    #[serde(default)]
    pub rules: Vec<TransformRule>,
}

impl TransformConfig {
    fn validate(&self) -> Result<(), String> {
        FieldTransformer::new(&self.rules)
            .map(|_| ())
            .map_err(|e| format!("Invalid transform rule: {e}"))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled".to_string());
        }
        Ok(())
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_mllp_host() -> String {
    "127.0.0.1".to_string()
}

fn default_mllp_port() -> u16 {
    2575
}

fn default_max_connections() -> usize {
    64
}

fn default_read_timeout_seconds() -> u64 {
    30
}

fn default_max_frame_bytes() -> usize {
    1_000_000
}

fn default_delivery_timeout_seconds() -> u64 {
    20
}

fn default_max_retries() -> u32 {
    3
}

fn default_deadletter_dir() -> String {
    "out/deadletter".to_string()
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_jitter_ms() -> u64 {
    1000
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BridgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mllp.port, 2575);
        assert_eq!(config.mllp.read_timeout_seconds, 30);
        assert_eq!(config.mllp.max_frame_bytes, 1_000_000);
        assert_eq!(config.delivery.max_retries, 3);
        assert_eq!(config.delivery.timeout_seconds, 20);
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig::default();
        assert!(config.validate().is_ok());

        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mllp_config_validation() {
        let mut config = MllpConfig::default();
        config.port = 0;
        assert!(config.validate().is_err());

        let mut config = MllpConfig::default();
        config.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = MllpConfig::default();
        config.max_frame_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_delivery_endpoint_validation() {
        let mut config = DeliveryConfig::default();
        assert!(config.validate().is_ok());

        config.endpoint = "fhir.example.com".to_string();
        assert!(config.validate().is_err());

        config.endpoint = "https://fhir.example.com/fhir".to_string();
        assert!(config.validate().is_ok());

        config.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_transform_rules_must_parse() {
        let mut config = TransformConfig {
            rules: vec![TransformRule::copy("PID-5.1", "PID-9.1")],
        };
        assert!(config.validate().is_ok());

        config.rules.push(TransformRule::copy("PID-5.x", "PID-9"));
        let err = config.validate().unwrap_err();
        assert!(err.contains("Invalid transform rule"));
    }

    #[test]
    fn test_logging_rotation_validation() {
        let mut config = LoggingConfig::default();
        for rotation in ["daily", "hourly", "never"] {
            config.local_rotation = rotation.to_string();
            assert!(config.validate().is_ok());
        }
        config.local_rotation = "weekly".to_string();
        assert!(config.validate().is_err());
    }
}
