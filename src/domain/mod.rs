//! Domain models and types for hl7bridge.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Document model** ([`Document`], [`Segment`]) for HL7 v2 messages
//! - **Field addressing** ([`Coordinate`]) with `SEG-N[.C]` paths
//! - **Error types** ([`BridgeError`] and the per-concern enums)
//! - **Result type alias** ([`Result`])
//!
//! # Addressing fields
//!
//! ```rust
//! use hl7bridge::domain::{Coordinate, Document};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut doc = Document::parse(b"PID|1||12345\r");
//! let authority = Coordinate::parse("PID-3.4")?;
//!
//! // Writing past the last component pads the field
//! doc.set(&authority, "HOSP");
//! assert_eq!(doc.get(&Coordinate::parse("PID-3")?), "12345^^^HOSP");
//! # Ok(())
//! # }
//! ```

pub mod coordinate;
pub mod document;
pub mod errors;
pub mod result;

// Re-export commonly used types for convenience
pub use coordinate::Coordinate;
pub use document::{Document, Segment};
pub use errors::{
    BridgeError, CoordinateError, DeliveryError, MappingError, MllpError, UnsupportedVersion,
    ValueTransformError,
};
pub use result::Result;
