//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::BridgeConfig;
use super::secret::secret_string_opt;
use crate::domain::errors::BridgeError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`BridgeConfig`]
/// 4. Applies environment variable overrides (`HL7BRIDGE_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`BridgeError::Configuration`] if the file is missing or
/// unreadable, a referenced variable is unset, the TOML does not parse, or
/// validation fails.
///
/// # Examples
///
/// ```no_run
/// use hl7bridge::config::load_config;
///
/// let config = load_config("hl7bridge.toml").expect("Failed to load config");
/// println!("listening on {}:{}", config.mllp.host, config.mllp.port);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<BridgeConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(BridgeError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        BridgeError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config = load_config_str(&contents)?;
    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Loads configuration from TOML text
///
/// Same steps as [`load_config`] minus the file read.
pub fn load_config_str(contents: &str) -> Result<BridgeConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: BridgeConfig = toml::from_str(&contents)
        .map_err(|e| BridgeError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        BridgeError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| BridgeError::Configuration(e.to_string()))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(BridgeError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        BridgeError::Configuration(format!("Invalid value for {name}: '{value}'"))
    })
}

/// Applies environment variable overrides using the HL7BRIDGE_* prefix
///
/// Environment variables follow the pattern `HL7BRIDGE_<SECTION>_<KEY>`,
/// e.g. `HL7BRIDGE_MLLP_PORT` or `HL7BRIDGE_DELIVERY_ENDPOINT`.
fn apply_env_overrides(config: &mut BridgeConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("HL7BRIDGE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // MLLP overrides
    if let Ok(val) = std::env::var("HL7BRIDGE_MLLP_HOST") {
        config.mllp.host = val;
    }
    if let Ok(val) = std::env::var("HL7BRIDGE_MLLP_PORT") {
        config.mllp.port = parse_override("HL7BRIDGE_MLLP_PORT", &val)?;
    }
    if let Ok(val) = std::env::var("HL7BRIDGE_MLLP_MAX_CONNECTIONS") {
        config.mllp.max_connections = parse_override("HL7BRIDGE_MLLP_MAX_CONNECTIONS", &val)?;
    }

    // Delivery overrides
    if let Ok(val) = std::env::var("HL7BRIDGE_DELIVERY_ENDPOINT") {
        config.delivery.endpoint = val;
    }
    if let Ok(val) = std::env::var("HL7BRIDGE_DELIVERY_TOKEN") {
        config.delivery.token = secret_string_opt(Some(val));
    }
    if let Ok(val) = std::env::var("HL7BRIDGE_DELIVERY_MAX_RETRIES") {
        config.delivery.max_retries = parse_override("HL7BRIDGE_DELIVERY_MAX_RETRIES", &val)?;
    }
    if let Ok(val) = std::env::var("HL7BRIDGE_DELIVERY_DEADLETTER_DIR") {
        config.delivery.deadletter_dir = val;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("HL7BRIDGE_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_override("HL7BRIDGE_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("HL7BRIDGE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
