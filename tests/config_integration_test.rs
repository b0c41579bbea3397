//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables hold ENV_MUTEX to avoid
//! interference between tests.

use hl7bridge::config::load_config;
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("HL7BRIDGE_APPLICATION_LOG_LEVEL");
    std::env::remove_var("HL7BRIDGE_MLLP_PORT");
    std::env::remove_var("HL7BRIDGE_MLLP_HOST");
    std::env::remove_var("HL7BRIDGE_DELIVERY_ENDPOINT");
    std::env::remove_var("HL7BRIDGE_DELIVERY_MAX_RETRIES");
    std::env::remove_var("HL7BRIDGE_LOGGING_LOCAL_ENABLED");
    std::env::remove_var("TEST_FHIR_TOKEN");
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(contents.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[application]
log_level = "debug"

[mllp]
host = "0.0.0.0"
port = 6661
max_connections = 8
read_timeout_seconds = 15
max_frame_bytes = 2048
spool_dir = "out/hl7"
supported_versions = ["2.5", "2.5.1"]

[delivery]
endpoint = "https://fhir.example.com/fhir"
token = "abc123"
timeout_seconds = 10
max_retries = 5
deadletter_dir = "out/dl"
backoff_base_ms = 250
jitter_ms = 0

[[transform.rules]]
from_path = "PID-5.1"
to_path = "PID-9.1"

[logging]
local_enabled = false
local_rotation = "hourly"
"#,
    );

    let config = load_config(temp_file.path()).unwrap();
    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.mllp.host, "0.0.0.0");
    assert_eq!(config.mllp.port, 6661);
    assert_eq!(config.mllp.max_connections, 8);
    assert_eq!(config.mllp.max_frame_bytes, 2048);
    assert_eq!(config.mllp.spool_dir.as_deref(), Some("out/hl7"));
    assert_eq!(config.delivery.endpoint, "https://fhir.example.com/fhir");
    assert_eq!(
        config.delivery.token.as_ref().unwrap().expose_secret().as_ref(),
        "abc123"
    );
    assert_eq!(config.delivery.max_retries, 5);
    assert_eq!(config.delivery.backoff_base_ms, 250);
    assert_eq!(config.delivery.jitter_ms, 0);
    assert_eq!(config.transform.rules.len(), 1);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_minimal_config_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let temp_file = write_config("[mllp]\nport = 2576\n");
    let config = load_config(temp_file.path()).unwrap();

    assert_eq!(config.application.log_level, "info");
    assert_eq!(config.mllp.host, "127.0.0.1");
    assert_eq!(config.mllp.port, 2576);
    assert!(config.mllp.spool_dir.is_none());
    assert!(config.delivery.endpoint.is_empty());
    assert!(config.delivery.token.is_none());
    assert_eq!(config.delivery.deadletter_dir, "out/deadletter");
    assert!(config.transform.rules.is_empty());
}

#[test]
fn test_env_var_substitution_in_token() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_FHIR_TOKEN", "from-env");

    let temp_file = write_config(
        r#"
[delivery]
endpoint = "https://fhir.example.com/fhir"
token = "${TEST_FHIR_TOKEN}"
"#,
    );
    let config = load_config(temp_file.path()).unwrap();
    assert_eq!(
        config.delivery.token.as_ref().unwrap().expose_secret().as_ref(),
        "from-env"
    );

    cleanup_env_vars();
}

#[test]
fn test_missing_substitution_variable_fails() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let temp_file = write_config("[delivery]\ntoken = \"${TEST_FHIR_TOKEN}\"\n");
    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_FHIR_TOKEN"));
}

#[test]
fn test_env_overrides_take_precedence() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("HL7BRIDGE_MLLP_PORT", "7777");
    std::env::set_var("HL7BRIDGE_DELIVERY_MAX_RETRIES", "0");
    std::env::set_var("HL7BRIDGE_APPLICATION_LOG_LEVEL", "warn");

    let temp_file = write_config("[mllp]\nport = 2575\n\n[delivery]\nmax_retries = 4\n");
    let config = load_config(temp_file.path()).unwrap();

    assert_eq!(config.mllp.port, 7777);
    assert_eq!(config.delivery.max_retries, 0);
    assert_eq!(config.application.log_level, "warn");

    cleanup_env_vars();
}

#[test]
fn test_invalid_override_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("HL7BRIDGE_MLLP_PORT", "not-a-port");

    let temp_file = write_config("");
    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("HL7BRIDGE_MLLP_PORT"));

    cleanup_env_vars();
}

#[test]
fn test_local_logging_override_must_be_a_bool() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    let temp_file = write_config("");

    std::env::set_var("HL7BRIDGE_LOGGING_LOCAL_ENABLED", "yes");
    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("HL7BRIDGE_LOGGING_LOCAL_ENABLED"));

    std::env::set_var("HL7BRIDGE_LOGGING_LOCAL_ENABLED", " true ");
    let config = load_config(temp_file.path()).unwrap();
    assert!(config.logging.local_enabled);

    cleanup_env_vars();
}

#[test]
fn test_invalid_values_fail_validation() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    for contents in [
        "[application]\nlog_level = \"loud\"\n",
        "[mllp]\nmax_connections = 0\n",
        "[delivery]\nendpoint = \"fhir.example.com\"\n",
        "[logging]\nlocal_rotation = \"weekly\"\n",
        "[[transform.rules]]\nfrom_path = \"PID-x\"\nto_path = \"PID-3\"\n",
    ] {
        let temp_file = write_config(contents);
        let err = load_config(temp_file.path()).unwrap_err();
        assert!(
            err.to_string().contains("validation failed"),
            "expected validation failure for {contents:?}, got {err}"
        );
    }
}
