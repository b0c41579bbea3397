//! External system integrations for hl7bridge.
//!
//! - [`mllp`] - MLLP listener, sender and framing codec
//! - [`fhir`] - FHIR delivery client with dead-letter storage
//!
//! # Example
//!
//! ```rust,no_run
//! use hl7bridge::adapters::mllp::{select_sink, MllpServer};
//! use hl7bridge::config::MllpConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MllpConfig::default();
//! let sink = select_sink(config.spool_dir.as_deref())?;
//! let server = MllpServer::bind(&config, sink).await?;
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! server.run(shutdown_rx).await?;
//! # Ok(())
//! # }
//! ```

pub mod fhir;
pub mod mllp;
