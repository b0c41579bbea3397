//! Core message processing for hl7bridge.
//!
//! Everything here is pure: no sockets, no HTTP, no global state.
//!
//! # Modules
//!
//! - [`batch`] - `FHS`/`BHS` envelope codec and multi-message splitting
//! - [`transform`] - Copy/move field rules applied to a [`Document`](crate::domain::Document)
//! - [`mapping`] - YAML mapping specifications and scalar value transforms
//!
//! # Example
//!
//! ```rust
//! use hl7bridge::core::batch;
//! use hl7bridge::core::transform::{FieldTransformer, TransformRule};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transformer = FieldTransformer::new(&[TransformRule::copy("PID-5.1", "PID-9.1")])?;
//!
//! let text = "MSH|^~\\&|A\rPID|1||1||DOE^JO\nMSH|^~\\&|B\rPID|1||2||ROE^AL\n";
//! let rewritten: Vec<Vec<u8>> = batch::split_messages(text)
//!     .iter()
//!     .map(|m| transformer.apply_bytes(m.as_bytes()))
//!     .collect();
//! assert_eq!(rewritten.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod mapping;
pub mod transform;
