//! CLI command implementations

pub mod batch;
pub mod check_map;
pub mod post;
pub mod send;
pub mod serve;
pub mod transform;
pub mod validate;
