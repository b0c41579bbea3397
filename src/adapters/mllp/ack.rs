//! Acknowledgment messages

use crate::domain::Document;
use chrono::Utc;
use std::fmt;

/// Version written when the inbound message does not declare one
pub const DEFAULT_ACK_VERSION: &str = "2.5.1";

/// Control ID written when the inbound one is unavailable
pub const UNKNOWN_CONTROL_ID: &str = "NA";

/// MSA-1 acknowledgment code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckCode {
    /// `AA` application accept
    Accept,
    /// `AE` application error
    Error,
    /// `AR` application reject
    Reject,
}

impl AckCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "AA",
            Self::Error => "AE",
            Self::Reject => "AR",
        }
    }
}

impl fmt::Display for AckCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build an `ACK` for an inbound message
///
/// Sender and receiver are swapped from the inbound MSH. Without an inbound
/// document (or without MSH-10) the control ID is `NA`.
///
/// # Example
///
/// ```
/// use hl7bridge::adapters::mllp::ack::{build_ack, AckCode};
/// use hl7bridge::domain::Document;
///
/// let inbound = Document::parse(b"MSH|^~\\&|SND|SF|RCV|RF|20250130||ADT^A01|MSG-1|P|2.5\r");
/// let ack = build_ack(Some(&inbound), AckCode::Accept);
/// assert!(ack.starts_with("MSH|^~\\&|RCV|RF|SND|SF|"));
/// assert!(ack.ends_with("||ACK|MSG-1|P|2.5\rMSA|AA|MSG-1\r"));
/// ```
pub fn build_ack(inbound: Option<&Document>, code: AckCode) -> String {
    let pick = |value: Option<&str>, fallback: &'static str| -> String {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(fallback)
            .to_string()
    };

    let control_id = pick(inbound.map(Document::control_id), UNKNOWN_CONTROL_ID);
    let version = pick(inbound.map(Document::version), DEFAULT_ACK_VERSION);
    let sending_app = pick(inbound.map(Document::receiving_application), "");
    let sending_facility = pick(inbound.map(Document::receiving_facility), "");
    let receiving_app = pick(inbound.map(Document::sending_application), "");
    let receiving_facility = pick(inbound.map(Document::sending_facility), "");
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");

    format!(
        "MSH|^~\\&|{sending_app}|{sending_facility}|{receiving_app}|{receiving_facility}|{timestamp}||ACK|{control_id}|P|{version}\rMSA|{code}|{control_id}\r"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_echoes_control_id() {
        let inbound = Document::parse(
            b"MSH|^~\\&|SND|SF|RCV|RF|20250130120000||ADT^A01|MSG-1|P|2.5.1\rPID|1\r",
        );
        let ack = build_ack(Some(&inbound), AckCode::Accept);
        assert!(ack.contains("MSA|AA|MSG-1\r"));

        let doc = Document::parse(ack.as_bytes());
        assert_eq!(doc.message_type(), "ACK");
        assert_eq!(doc.control_id(), "MSG-1");
        assert_eq!(doc.sending_application(), "RCV");
        assert_eq!(doc.receiving_facility(), "SF");
    }

    #[test]
    fn test_ack_without_inbound() {
        let ack = build_ack(None, AckCode::Error);
        assert!(ack.starts_with("MSH|^~\\&|||||"));
        assert!(ack.ends_with("||ACK|NA|P|2.5.1\rMSA|AE|NA\r"));
    }

    #[test]
    fn test_ack_for_message_without_msh() {
        let inbound = Document::parse(b"PID|1||123\r");
        let ack = build_ack(Some(&inbound), AckCode::Reject);
        assert!(ack.ends_with("MSA|AR|NA\r"));
    }

    #[test]
    fn test_ack_code_strings() {
        assert_eq!(AckCode::Accept.to_string(), "AA");
        assert_eq!(AckCode::Error.as_str(), "AE");
        assert_eq!(AckCode::Reject.as_str(), "AR");
    }
}
