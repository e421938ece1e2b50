//! Shared data model for Fragments story content.

pub mod defs;
pub mod validate;

pub use defs::*;
pub use validate::{Issue, LoopRisk, Severity, validate_story};
