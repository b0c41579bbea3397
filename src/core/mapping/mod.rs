//! HL7 to FHIR mapping support
//!
//! - [`loader`] reads YAML mapping specifications into a [`MapSpec`]
//! - [`values`] holds the scalar value transforms those specifications name

pub mod loader;
pub mod values;

pub use loader::{load, load_str, MapSpec, ResourcePlan, Rule, RuleSource};
pub use values::{apply_named, apply_named_args, ValueTransform};
