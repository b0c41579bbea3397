//! FHIR delivery
//!
//! - [`client`] - retrying HTTP delivery client
//! - [`deadletter`] - storage for payloads that could not be delivered

pub mod client;
pub mod deadletter;

pub use client::{DeliveryOutcome, FhirDeliveryClient, RetryPolicy};
pub use deadletter::{payload_id, DeadLetterStore, FsDeadLetterStore};
