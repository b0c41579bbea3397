// hl7bridge - HL7 v2 interop engine
// Copyright (c) 2025 hl7bridge Contributors
// Licensed under the MIT License

//! # hl7bridge - HL7 v2 interop engine
//!
//! hl7bridge receives HL7 v2 messages over MLLP or from batch files, reshapes
//! them with field-level rules, and delivers FHIR payloads to a server with
//! retry and dead-letter handling.
//!
//! ## Overview
//!
//! This library provides:
//! - **Parsing** HL7 v2 text into an indexed [`domain::Document`] and back
//! - **Receiving** framed messages over MLLP, acknowledging each with `AA`/`AE`/`AR`
//! - **Transforming** documents with copy/move rules addressed by `SEG-F[.C]` paths
//! - **Mapping** HL7 values into FHIR datatypes via named scalar transforms
//! - **Delivering** JSON payloads to a FHIR endpoint with exponential backoff
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Batch envelopes, field transforms, mapping specifications
//! - [`adapters`] - External integrations (MLLP, FHIR)
//! - [`domain`] - Document model, path coordinates, errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust
//! use hl7bridge::core::transform::{FieldTransformer, TransformRule};
//! use hl7bridge::domain::Document;
//!
//! let raw = b"MSH|^~\\&|LAB|HOSP|EHR|HOSP|20240101120000||ADT^A01|MSG-1|P|2.5.1\rPID|1||123^^^HOSP^MR||DOE^JANE\r";
//! let transformer = FieldTransformer::new(&[TransformRule::copy("PID-5.1", "PID-9.1")])?;
//!
//! let mut doc = Document::parse(raw);
//! transformer.apply(&mut doc);
//!
//! assert_eq!(doc.control_id(), "MSG-1");
//! assert_eq!(doc.segment("PID").map(|s| s.field(9)), Some("DOE"));
//! # Ok::<(), hl7bridge::domain::CoordinateError>(())
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`domain::Result`], whose error type
//! [`domain::BridgeError`] wraps the per-area error enums. The MLLP server and
//! the FHIR client turn failures into acknowledgments and delivery outcomes
//! rather than errors.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
