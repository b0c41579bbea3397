//! Transform command implementation
//!
//! Applies the configured `[[transform.rules]]` to every message in a file.

use crate::config::load_config;
use crate::core::batch::split_messages;
use crate::core::transform::FieldTransformer;
use clap::Args;
use std::io::Write;
use std::path::PathBuf;

/// Arguments for the transform command
#[derive(Args, Debug)]
pub struct TransformArgs {
    /// File with the messages to transform
    pub file: PathBuf,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl TransformArgs {
    /// Execute the transform command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load configuration: {e}");
                return Ok(2);
            }
        };
        let transformer = FieldTransformer::new(&config.transform.rules)?;

        let text = match std::fs::read_to_string(&self.file) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("❌ Failed to read {}: {e}", self.file.display());
                return Ok(2);
            }
        };

        let mut out = Vec::with_capacity(text.len());
        let mut count = 0usize;
        for message in split_messages(&text) {
            if !message.starts_with("MSH|") {
                continue;
            }
            out.extend_from_slice(&transformer.apply_bytes(message.as_bytes()));
            count += 1;
        }

        match &self.output {
            Some(path) => {
                std::fs::write(path, &out)?;
                eprintln!(
                    "✅ Transformed {count} message(s) with {} rule(s) into {}",
                    transformer.len(),
                    path.display()
                );
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&out)?;
                stdout.flush()?;
            }
        }

        tracing::info!(messages = count, rules = transformer.len(), "Transform complete");
        Ok(0)
    }
}
