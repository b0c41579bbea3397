//! Copy/move rule definitions

use crate::domain::{Coordinate, CoordinateError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation applied by a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformOp {
    /// Copy the source value to the destination
    #[default]
    Copy,
    /// Copy, then clear the source
    Move,
}

impl fmt::Display for TransformOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => write!(f, "copy"),
            Self::Move => write!(f, "move"),
        }
    }
}

/// A rule as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRule {
    /// Source path, e.g. `PID-5.1`
    pub from_path: String,
    /// Destination path
    pub to_path: String,
    /// Operation, `copy` when omitted
    #[serde(default)]
    pub op: TransformOp,
}

impl TransformRule {
    /// Create a copy rule
    pub fn copy(from_path: impl Into<String>, to_path: impl Into<String>) -> Self {
        Self {
            from_path: from_path.into(),
            to_path: to_path.into(),
            op: TransformOp::Copy,
        }
    }

    /// Create a move rule
    pub fn moving(from_path: impl Into<String>, to_path: impl Into<String>) -> Self {
        Self {
            from_path: from_path.into(),
            to_path: to_path.into(),
            op: TransformOp::Move,
        }
    }

    pub(crate) fn compile(&self) -> Result<CompiledRule, CoordinateError> {
        Ok(CompiledRule {
            from: Coordinate::parse(&self.from_path)?,
            to: Coordinate::parse(&self.to_path)?,
            op: self.op,
        })
    }
}

/// A rule with both paths parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CompiledRule {
    pub from: Coordinate,
    pub to: Coordinate,
    pub op: TransformOp,
}
