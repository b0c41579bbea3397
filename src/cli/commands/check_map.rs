//! Check-map command implementation
//!
//! Loads a YAML mapping specification, prints a summary, and flags rules
//! whose path or transform name would fail at translation time.

use crate::core::mapping::load;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the check-map command
#[derive(Args, Debug)]
pub struct CheckMapArgs {
    /// Mapping specification file
    pub file: PathBuf,
}

impl CheckMapArgs {
    /// Execute the check-map command
    ///
    /// Returns 2 when the file cannot be loaded and 1 when it loads but
    /// holds rules that would fail.
    pub async fn execute(&self) -> anyhow::Result<i32> {
        println!("🔍 Checking mapping file: {}", self.file.display());
        println!();

        let spec = match load(&self.file) {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to load mapping");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let message_types: Vec<&str> = spec.message_types.iter().map(String::as_str).collect();
        println!("  Message Types: {}", message_types.join(", "));
        println!("  Resources: {}", spec.resource_plan.len());
        println!("  Rules: {}", spec.rule_count());

        let mut problems = 0usize;
        for plan in &spec.resource_plan {
            println!(
                "  - {} ({} rule(s){})",
                plan.resource,
                plan.rules.len(),
                plan.profile
                    .as_deref()
                    .map(|p| format!(", profile {p}"))
                    .unwrap_or_default()
            );
            for rule in &plan.rules {
                if let Err(e) = rule.check() {
                    problems += 1;
                    println!("    ❌ {} -> {}: {e}", rule.hl7_path, rule.fhir_path);
                }
            }
        }

        println!();
        if problems == 0 {
            println!("✅ Mapping is valid");
            Ok(0)
        } else {
            println!("⚠️  {problems} problem(s) found");
            Ok(1)
        }
    }
}
