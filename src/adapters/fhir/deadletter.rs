//! Dead-letter storage for payloads that could not be delivered
//!
//! Each failed payload leaves two artifacts keyed by its `id`:
//! `<id>_request.json` (the payload, pretty-printed) and
//! `<id>_response.json` (the last response body, empty when the endpoint
//! never answered).

use crate::domain::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Identifier used when a payload has no `id`
pub const UNKNOWN_PAYLOAD_ID: &str = "unknown";

/// Durable store for undeliverable payloads
#[async_trait]
pub trait DeadLetterStore: Send + Sync {
    /// Persist a payload and the last response body
    async fn store(&self, payload: &Value, response_body: &str) -> Result<()>;
}

/// Payload identifier used to key dead-letter artifacts
///
/// String ids are used as-is, other JSON values through their textual form.
/// Path separators are replaced so the id cannot escape the directory.
pub fn payload_id(payload: &Value) -> String {
    let raw = match payload.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Null) | None => UNKNOWN_PAYLOAD_ID.to_string(),
        Some(Value::String(_)) => UNKNOWN_PAYLOAD_ID.to_string(),
        Some(other) => other.to_string(),
    };
    raw.replace(['/', '\\'], "_")
}

/// Dead-letter files in a local directory
#[derive(Debug, Clone)]
pub struct FsDeadLetterStore {
    dir: PathBuf,
}

impl FsDeadLetterStore {
    /// Store rooted at `dir`; the directory is created on first use
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths of the request and response artifacts for an id
    pub fn paths_for(&self, id: &str) -> (PathBuf, PathBuf) {
        (
            self.dir.join(format!("{id}_request.json")),
            self.dir.join(format!("{id}_response.json")),
        )
    }
}

#[async_trait]
impl DeadLetterStore for FsDeadLetterStore {
    async fn store(&self, payload: &Value, response_body: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let id = payload_id(payload);
        let (request_path, response_path) = self.paths_for(&id);
        let request = serde_json::to_string_pretty(payload)?;
        tokio::fs::write(&request_path, request).await?;
        tokio::fs::write(&response_path, response_body).await?;

        tracing::warn!(
            payload_id = %id,
            path = %request_path.display(),
            "Payload written to dead-letter directory"
        );
        Ok(())
    }
}
