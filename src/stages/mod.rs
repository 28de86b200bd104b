//! Built-in stage implementations and the registry that resolves a
//! [`StageConfig`](crate::config::StageConfig) into a constructed
//! [`Stage`](crate::core::stage::Stage).
//!
//! These are illustrative processors — a source, a couple of field
//! transforms, and a sink — enough to exercise every composition operator
//! end to end from a config file. A production deployment would register
//! many more.

pub mod log;
pub mod registry;
pub mod set_field;
pub mod simulated;
