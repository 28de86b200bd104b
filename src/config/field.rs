//! Field Configuration Module
//!
//! This module defines how processors map input fields to output fields.
//! It supports various field transformation patterns commonly used in data processing.

use serde::{Serialize, Deserialize};
use std::collections::HashMap;

/// Configuration for field operations in processors.
///
/// Defines how input fields are mapped to output fields during processing.
/// Different variants support different use cases from simple renaming to
/// complex multi-field transformations. Built by
/// [`crate::config::params::extract_field_params`] from a stage's raw
/// parameter map; the variants here are plain data, not validated on
/// construction.
///
/// # Examples
///
/// ```rust
/// use cascadeflow::config::FieldConfig;
///
/// // Simple field transformation
/// let config = FieldConfig::Single {
///     input: "temperature".to_string(),
///     output: "scaled_temp".to_string(),
/// };
///
/// // Multiple parallel transformations
/// let config = FieldConfig::Multiple {
///     inputs: vec!["temp".to_string(), "humidity".to_string()],
///     outputs: vec!["scaled_temp".to_string(), "scaled_humidity".to_string()],
/// };
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldConfig {
    /// Single field transformation: input field → output field
    ///
    /// Used when a processor transforms one input field to one output field.
    /// This is the most common case for processors like scale, filter, etc.
    Single {
        input: String,
        output: String,
    },

    /// Multiple parallel field transformations
    ///
    /// Processes multiple input fields in parallel, producing corresponding
    /// output fields. The inputs and outputs vectors must have the same length.
    Multiple {
        inputs: Vec<String>,
        outputs: Vec<String>,
    },

    /// Complex field mapping with custom input→output relationships
    ///
    /// Allows arbitrary mapping between input and output field names.
    /// Useful for processors that need non-parallel field transformations.
    Mapping(HashMap<String, String>),

    /// Output-only configuration for input/source processors
    ///
    /// Used by processors that generate data (like simulators) and only
    /// need to specify what field name to use for their output.
    OutputOnly (String),

    /// No field configuration required
    ///
    /// Used by processors that don't need field mapping, such as
    /// logging processors that work with entire messages.
    None,
}
