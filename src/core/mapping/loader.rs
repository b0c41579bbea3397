//! Mapping specification loader
//!
//! Reads the YAML rule sets that drive HL7 to FHIR translation:
//!
//! ```yaml
//! messageTypes: ["ADT^A01", "ADT^A08"]
//! resourcePlan:
//!   - resource: Patient
//!     profile: http://hl7.org/fhir/us/core/StructureDefinition/us-core-patient
//!     rules:
//!       - hl7_path: PID-3
//!         fhir_path: Patient.identifier
//!         transform: pid3_to_identifiers
//! ```
//!
//! `hl7_path` takes three forms. A single path (`PID-8`) feeds one value to
//! the transform. Paths joined by `|` (`OBX-2|OBX-5|OBX-6`) feed each value in
//! order. A lone `-` feeds nothing and relies on the transform to produce a
//! constant.
//!
//! Neither paths nor transform names are checked on load. [`Rule::check`]
//! reports both, and an unknown name otherwise fails when the rule is
//! evaluated.

use super::values::{apply_named_args, ValueTransform};
use crate::domain::{Coordinate, CoordinateError, Document, MappingError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// A single field mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Source HL7 path, e.g. `PID-5.1`
    pub hl7_path: String,
    /// Target FHIR element path
    pub fhir_path: String,
    /// Optional value transform name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
}

/// `hl7_path` of a rule with no HL7 input
pub const CONSTANT_SOURCE: &str = "-";

/// Parsed form of a rule's `hl7_path`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    /// No input; the transform yields a fixed value
    Constant,
    /// One field
    Single(Coordinate),
    /// Several fields, passed to the transform in order
    Multi(Vec<Coordinate>),
}

impl RuleSource {
    /// Number of values handed to the transform
    pub fn arity(&self) -> usize {
        match self {
            Self::Constant => 0,
            Self::Single(_) => 1,
            Self::Multi(coords) => coords.len(),
        }
    }

    /// Read the source values from a document
    pub fn values<'a>(&self, doc: &'a Document) -> Vec<&'a str> {
        match self {
            Self::Constant => Vec::new(),
            Self::Single(coord) => vec![doc.get(coord)],
            Self::Multi(coords) => coords.iter().map(|c| doc.get(c)).collect(),
        }
    }
}

impl Rule {
    /// Parse the HL7 path
    pub fn source(&self) -> std::result::Result<RuleSource, CoordinateError> {
        let path = self.hl7_path.trim();
        if path == CONSTANT_SOURCE {
            return Ok(RuleSource::Constant);
        }
        if path.contains('|') {
            let coords = path
                .split('|')
                .map(|p| Coordinate::parse(p.trim()))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            return Ok(RuleSource::Multi(coords));
        }
        Coordinate::parse(path).map(RuleSource::Single)
    }

    /// Check that the path parses and the transform exists and accepts as
    /// many values as the path supplies
    pub fn check(&self) -> std::result::Result<(), String> {
        let source = self.source().map_err(|e| e.to_string())?;
        match &self.transform {
            Some(name) => {
                let transform = name.parse::<ValueTransform>().map_err(|e| e.to_string())?;
                transform
                    .check_arity(source.arity())
                    .map_err(|e| e.to_string())
            }
            None if source == RuleSource::Constant => {
                Err(format!("'{CONSTANT_SOURCE}' source needs a transform"))
            }
            None => Ok(()),
        }
    }

    /// Evaluate against a document
    ///
    /// Returns `None` when every source field is empty, or when the result
    /// is an empty string, object or array. Without a transform the first
    /// source value is taken as-is.
    pub fn evaluate(&self, doc: &Document) -> Result<Option<Value>> {
        let source = self.source()?;
        let values = source.values(doc);
        if source != RuleSource::Constant && values.iter().all(|v| v.is_empty()) {
            return Ok(None);
        }

        let value = match &self.transform {
            Some(name) => apply_named_args(name, &values)?,
            None => match values.first() {
                Some(v) => Value::String((*v).to_string()),
                None => return Ok(None),
            },
        };
        Ok(Some(value).filter(|v| !is_empty_value(v)))
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Rules producing one FHIR resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePlan {
    /// Resource type, e.g. `Patient`
    pub resource: String,
    /// Optional profile canonical URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Field rules in application order
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// Loaded mapping specification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSpec {
    /// Message types (MSH-9) this mapping handles
    #[serde(rename = "messageTypes", default)]
    pub message_types: BTreeSet<String>,
    /// Resource plans in order
    #[serde(rename = "resourcePlan", default)]
    pub resource_plan: Vec<ResourcePlan>,
}

impl MapSpec {
    /// Whether the mapping declares the given message type
    pub fn handles(&self, message_type: &str) -> bool {
        self.message_types.contains(message_type)
    }

    /// First plan producing the given resource type
    pub fn plan_for(&self, resource: &str) -> Option<&ResourcePlan> {
        self.resource_plan.iter().find(|p| p.resource == resource)
    }

    /// Total number of rules across all plans
    pub fn rule_count(&self) -> usize {
        self.resource_plan.iter().map(|p| p.rules.len()).sum()
    }
}

/// Load a mapping specification from a YAML file
///
/// # Errors
///
/// Returns [`MappingError::Read`] when the file cannot be read and
/// [`MappingError::Parse`] when it does not match the mapping schema.
pub fn load(path: impl AsRef<Path>) -> std::result::Result<MapSpec, MappingError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| MappingError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let spec = load_str(&contents)?;

    tracing::debug!(
        path = %path.display(),
        message_types = spec.message_types.len(),
        resources = spec.resource_plan.len(),
        rules = spec.rule_count(),
        "Loaded mapping specification"
    );
    Ok(spec)
}

/// Load a mapping specification from YAML text
///
/// An empty document yields an empty specification.
pub fn load_str(yaml: &str) -> std::result::Result<MapSpec, MappingError> {
    if yaml.trim().is_empty() {
        return Ok(MapSpec::default());
    }
    let spec: Option<MapSpec> =
        serde_yaml::from_str(yaml).map_err(|e| MappingError::Parse(e.to_string()))?;
    Ok(spec.unwrap_or_default())
}
