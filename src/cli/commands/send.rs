//! Send command implementation
//!
//! Reads a file holding one or more messages (bare or batch-enveloped) and
//! sends each over a single MLLP connection, printing every acknowledgment.

use crate::adapters::mllp::codec::payload;
use crate::adapters::mllp::MllpClient;
use crate::core::batch::split_messages;
use crate::domain::Document;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Arguments for the send command
#[derive(Args, Debug)]
pub struct SendArgs {
    /// File with the messages to send
    pub file: PathBuf,

    /// Listener host
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Listener port
    #[arg(short, long, default_value_t = 2575)]
    pub port: u16,

    /// Seconds to wait for each acknowledgment
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

impl SendArgs {
    /// Execute the send command
    ///
    /// Returns 1 when any acknowledgment is not `AA`.
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let text = match std::fs::read_to_string(&self.file) {
            Ok(t) => t,
            Err(e) => {
                println!("❌ Failed to read {}: {e}", self.file.display());
                return Ok(2);
            }
        };
        let messages: Vec<String> = split_messages(&text)
            .into_iter()
            .filter(|m| m.starts_with("MSH|"))
            .collect();
        if messages.is_empty() {
            println!("❌ No messages found in {}", self.file.display());
            return Ok(2);
        }

        let client = MllpClient::new(&self.host, self.port)
            .with_timeouts(Duration::from_secs(10), Duration::from_secs(self.timeout));
        println!(
            "📤 Sending {} message(s) to {}",
            messages.len(),
            client.address()
        );

        let acks = client.send_batch(&messages).await?;

        let mut rejected = 0usize;
        for (index, raw) in acks.iter().enumerate() {
            let ack = Document::parse(payload(raw).unwrap_or(raw.as_slice()));
            let code = ack.segment("MSA").map(|s| s.field(1)).unwrap_or("");
            let control_id = ack.segment("MSA").map(|s| s.field(2)).unwrap_or("");
            if code == "AA" {
                println!("  ✅ #{} {control_id}: {code}", index + 1);
            } else {
                rejected += 1;
                println!("  ❌ #{} {control_id}: {code}", index + 1);
            }
        }

        println!();
        if rejected == 0 {
            println!("✅ All {} message(s) accepted", acks.len());
            Ok(0)
        } else {
            println!("⚠️  {rejected} of {} message(s) not accepted", acks.len());
            Ok(1)
        }
    }
}
