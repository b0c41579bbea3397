//! Field transform operator
//!
//! Applies an ordered list of copy/move rules between document coordinates.
//! Paths are parsed once, when the [`FieldTransformer`] is built, so a bad
//! path is a configuration error rather than a per-message failure.
//!
//! The destination is always written, even when the source is empty; a copy
//! from an empty field is how a rule clears its destination.

pub mod rule;

pub use rule::{TransformOp, TransformRule};

use crate::domain::{CoordinateError, Document};
use rule::CompiledRule;

/// Compiled, reusable rule set
#[derive(Debug, Clone, Default)]
pub struct FieldTransformer {
    rules: Vec<CompiledRule>,
}

impl FieldTransformer {
    /// Compile rules
    ///
    /// # Errors
    ///
    /// Returns the first [`CoordinateError`] found in any rule path.
    ///
    /// # Example
    ///
    /// ```
    /// use hl7bridge::core::transform::{FieldTransformer, TransformRule};
    /// use hl7bridge::domain::Document;
    ///
    /// let transformer = FieldTransformer::new(&[TransformRule::moving("PID-2", "PID-3")]).unwrap();
    /// let mut doc = Document::parse(b"PID|1|ALT-9\r");
    /// transformer.apply(&mut doc);
    /// assert_eq!(doc.to_hl7_string(), "PID|1||ALT-9\r");
    /// ```
    pub fn new(rules: &[TransformRule]) -> Result<Self, CoordinateError> {
        let rules = rules
            .iter()
            .map(TransformRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Number of compiled rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the rule set is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule, in order, to a document
    pub fn apply(&self, doc: &mut Document) {
        for rule in &self.rules {
            let value = doc.get(&rule.from).to_string();
            if rule.op == TransformOp::Move {
                doc.set(&rule.from, "");
            }
            doc.set(&rule.to, &value);
            tracing::trace!(
                from = %rule.from,
                to = %rule.to,
                op = %rule.op,
                "Applied field rule"
            );
        }
    }

    /// Parse raw bytes, apply the rules and serialize the result
    pub fn apply_bytes(&self, raw: &[u8]) -> Vec<u8> {
        let mut doc = Document::parse(raw);
        self.apply(&mut doc);
        doc.serialize()
    }
}
