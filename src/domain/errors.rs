//! Domain error types
//!
//! This module defines the error hierarchy for hl7bridge. Each concern owns a
//! focused error enum which is wrapped by [`BridgeError`]. Third-party error
//! types are converted to strings at the boundary and never leak out.

use thiserror::Error;

/// Main hl7bridge error type
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed field coordinate
    #[error("Coordinate error: {0}")]
    Coordinate(#[from] CoordinateError),

    /// A scalar value failed a conversion precondition
    #[error("Value transform error: {0}")]
    ValueTransform(#[from] ValueTransformError),

    /// Mapping specification could not be loaded
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// MLLP transport errors
    #[error("MLLP error: {0}")]
    Mllp(#[from] MllpError),

    /// Delivery setup errors (never raised for HTTP failures)
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Message declares an HL7 version outside the configured allow-list
    #[error(transparent)]
    UnsupportedVersion(#[from] UnsupportedVersion),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

/// Malformed `SEGMENT-field[.component]` path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    /// Path has no `-` separating segment and field
    #[error("missing '-' separator in path '{0}'")]
    MissingSeparator(String),

    /// Segment name is empty
    #[error("empty segment name in path '{0}'")]
    EmptySegment(String),

    /// Field index is not a positive integer
    #[error("invalid field index in path '{0}'")]
    InvalidField(String),

    /// Component index is not a positive integer
    #[error("invalid component index in path '{0}'")]
    InvalidComponent(String),
}

/// Input failed a value transform's precision or format precondition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueTransformError {
    /// Input was empty
    #[error("{transform}: empty input")]
    EmptyInput { transform: &'static str },

    /// Input carries fewer digits than the target type needs
    #[error("{transform}: '{value}' needs at least {required} digits")]
    InsufficientPrecision {
        transform: &'static str,
        value: String,
        required: usize,
    },

    /// Input is not in the expected HL7 encoding
    #[error("{transform}: invalid value '{value}'")]
    InvalidFormat {
        transform: &'static str,
        value: String,
    },

    /// Quantity value is not numeric
    #[error("invalid numeric value '{0}'")]
    InvalidNumber(String),

    /// Rule references a transform name that does not exist
    #[error("unknown transform '{0}'")]
    UnknownTransform(String),

    /// Transform given the wrong number of source values
    #[error("{transform}: takes {min} to {max} source value(s), got {got}")]
    Arity {
        transform: &'static str,
        min: usize,
        max: usize,
        got: usize,
    },
}

/// Mapping specification loading errors
#[derive(Debug, Error)]
pub enum MappingError {
    /// File could not be read
    #[error("failed to read mapping file {path}: {message}")]
    Read { path: String, message: String },

    /// YAML document does not match the mapping schema
    #[error("invalid mapping document: {0}")]
    Parse(String),
}

/// MLLP framing and socket errors
#[derive(Debug, Error)]
pub enum MllpError {
    /// Failed to bind or connect
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Read or connect deadline elapsed
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Peer closed the connection before a full frame arrived
    #[error("Connection closed while awaiting frame terminator")]
    UnexpectedEof,

    /// Frame exceeded the configured size limit
    #[error("Frame exceeds {limit} bytes")]
    FrameTooLarge { limit: usize },

    /// Socket I/O failure
    #[error("I/O error: {0}")]
    Io(String),
}

/// Delivery client construction errors
///
/// HTTP statuses and transport failures are reported through
/// `DeliveryOutcome`, not through this type.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// Endpoint URL is unusable
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Message version is not in the configured allow-list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported HL7 version '{version}'")]
pub struct UnsupportedVersion {
    /// Version read from MSH-12 (empty when absent)
    pub version: String,
}

impl From<std::io::Error> for MllpError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => MllpError::UnexpectedEof,
            std::io::ErrorKind::TimedOut => MllpError::Timeout(err.to_string()),
            _ => MllpError::Io(err.to_string()),
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for BridgeError {
    fn from(err: toml::de::Error) -> Self {
        BridgeError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_error_display() {
        let err = BridgeError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_coordinate_error_conversion() {
        let err: BridgeError = CoordinateError::InvalidField("PID-x".to_string()).into();
        assert!(matches!(err, BridgeError::Coordinate(_)));
        assert!(err.to_string().contains("PID-x"));
    }

    #[test]
    fn test_value_transform_error_display() {
        let err = ValueTransformError::InsufficientPrecision {
            transform: "ts_to_instant",
            value: "2025".to_string(),
            required: 14,
        };
        assert_eq!(
            err.to_string(),
            "ts_to_instant: '2025' needs at least 14 digits"
        );
    }

    #[test]
    fn test_unsupported_version_is_transparent() {
        let err: BridgeError = UnsupportedVersion {
            version: "2.1".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Unsupported HL7 version '2.1'");
    }

    #[test]
    fn test_io_error_maps_eof() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        assert!(matches!(MllpError::from(io_err), MllpError::UnexpectedEof));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: BridgeError = toml_err.into();
        assert!(matches!(err, BridgeError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: BridgeError = json_err.into();
        assert!(matches!(err, BridgeError::Serialization(_)));
    }
}
