//! Inbound message sinks
//!
//! A sink receives every complete frame the server reads. The server picks
//! one implementation at start-up: [`AckOnlySink`] when no spool directory is
//! configured, [`SpoolSink`] otherwise.

use crate::domain::{BridgeError, Document, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Destination for inbound frames
///
/// An error makes the server answer `AE` for that frame.
#[async_trait]
pub trait InboundSink: Send + Sync {
    /// Handle one frame payload and its parsed document
    async fn accept(&self, payload: &[u8], doc: &Document) -> Result<()>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Acknowledge only; the frame is not stored
#[derive(Debug, Default, Clone, Copy)]
pub struct AckOnlySink;

#[async_trait]
impl InboundSink for AckOnlySink {
    async fn accept(&self, _payload: &[u8], _doc: &Document) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ack-only"
    }
}

/// Write each frame to `<dir>/<UTC timestamp>-<seq>.hl7`
#[derive(Debug)]
pub struct SpoolSink {
    dir: PathBuf,
    sequence: AtomicU64,
}

impl SpoolSink {
    /// Create the sink, creating `dir` if needed
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| {
            BridgeError::Configuration(format!(
                "Failed to create spool directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self {
            dir,
            sequence: AtomicU64::new(0),
        })
    }

    /// Spool directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn next_path(&self) -> PathBuf {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.6fZ");
        self.dir.join(format!("{stamp}-{seq:06}.hl7"))
    }
}

#[async_trait]
impl InboundSink for SpoolSink {
    async fn accept(&self, payload: &[u8], doc: &Document) -> Result<()> {
        let path = self.next_path();
        let mut contents = payload.to_vec();
        if contents.last() != Some(&b'\r') {
            contents.push(b'\r');
        }
        tokio::fs::write(&path, &contents).await?;

        tracing::debug!(
            path = %path.display(),
            control_id = doc.control_id(),
            bytes = contents.len(),
            "Spooled inbound message"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "spool"
    }
}

/// Pick the sink for an optional spool directory
pub fn select_sink(spool_dir: Option<&str>) -> Result<Arc<dyn InboundSink>> {
    match spool_dir.map(str::trim).filter(|d| !d.is_empty()) {
        Some(dir) => Ok(Arc::new(SpoolSink::new(dir)?)),
        None => Ok(Arc::new(AckOnlySink)),
    }
}
