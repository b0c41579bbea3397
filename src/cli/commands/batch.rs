//! Batch command implementation

use crate::core::batch::{normalize_line_endings, split_messages, unwrap, wrap};
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Arguments for the batch command
#[derive(Args, Debug)]
pub struct BatchArgs {
    #[command(subcommand)]
    pub action: BatchAction,
}

/// Batch envelope operations
#[derive(Subcommand, Debug)]
pub enum BatchAction {
    /// Wrap the messages of a file in an FHS/BHS envelope
    Wrap {
        /// Input file with one or more messages
        input: PathBuf,
        /// Output file for the envelope
        output: PathBuf,
    },
    /// Extract the messages from an enveloped file
    Unwrap {
        /// Enveloped input file
        input: PathBuf,
        /// Output file for the bare messages
        output: PathBuf,
    },
}

impl BatchArgs {
    /// Execute the batch command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let (input, output) = match &self.action {
            BatchAction::Wrap { input, output } | BatchAction::Unwrap { input, output } => {
                (input, output)
            }
        };
        let text = match std::fs::read_to_string(input) {
            Ok(t) => t,
            Err(e) => {
                println!("❌ Failed to read {}: {e}", input.display());
                return Ok(2);
            }
        };

        let (contents, count) = match &self.action {
            BatchAction::Wrap { .. } => {
                let messages: Vec<String> = split_messages(&text)
                    .into_iter()
                    .filter(|m| m.starts_with("MSH|"))
                    .collect();
                (wrap(&messages), messages.len())
            }
            BatchAction::Unwrap { .. } => {
                let messages = unwrap(&normalize_line_endings(&text));
                (messages.concat(), messages.len())
            }
        };

        std::fs::write(output, contents)?;
        println!("✅ Wrote {count} message(s) to {}", output.display());
        Ok(0)
    }
}
