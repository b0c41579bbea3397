//! Logging and observability
//!
//! - Console logs on stderr
//! - Optional JSON file logs with daily/hourly rotation
//! - Level from configuration, overridable with `RUST_LOG`
//!
//! # Example
//!
//! ```no_run
//! use hl7bridge::logging::init_logging;
//! use hl7bridge::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(port = 2575, "Listener started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log an inbound MLLP frame
///
/// # Example
///
/// ```no_run
/// use hl7bridge::log_frame_received;
///
/// log_frame_received!("MSG-1", "ADT^A01", 512);
/// ```
#[macro_export]
macro_rules! log_frame_received {
    ($control_id:expr, $message_type:expr, $bytes:expr) => {
        tracing::info!(
            control_id = $control_id,
            message_type = $message_type,
            bytes = $bytes,
            "Frame received"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use hl7bridge::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, 2000u64, "HTTP 503");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_retries:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_retries = $max_retries,
            delay_ms = $delay_ms,
            error = %$reason,
            "Retrying operation"
        );
    };
}
