//! Configuration type definitions.
//!
//! Core structures deserialised from TOML configuration files and used to
//! build a linear pipeline [`crate::core::pipeline::Sequence`] of
//! registry-resolved stages. Declaration order matters: `stage` is a TOML
//! array of tables, which (unlike a `HashMap`) preserves textual order, so
//! the stages a config file lists are exactly the stages a Sequence wires in
//! the same order.
//!
//! Richer topologies (Fanin, Fanout, Switch, If) have no config-file
//! representation; they are reached only through the programmatic builder
//! API in [`crate::core::pipeline`].

use serde::Deserialize;
use std::collections::HashMap;

/// Root configuration: a named pipeline and its ordered stage list.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct Config {
    /// Human-readable pipeline name, used in log output.
    #[serde(default = "default_name")]
    pub name: String,

    /// Default bounded-queue capacity for stages that don't override it.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Stages in textual (declaration) order.
    #[serde(default, rename = "stage")]
    pub stages: Vec<StageConfig>,
}

fn default_name() -> String {
    "pipeline".to_string()
}

/// Provides the default queue capacity for stages that don't override it.
const fn default_capacity() -> usize {
    128
}

/// Configuration for a single registry-resolved stage.
///
/// # Stage Types
///
/// A config-file pipeline is always a flat [`crate::core::pipeline::Sequence`]:
/// the first stage is typically a source (no meaningful upstream input), the
/// last is typically a sink (its `output` queue goes nowhere), and everything
/// in between transforms what passes through.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StageConfig {
    /// The registry key to instantiate (e.g. `"simulated"`, `"set_field"`, `"log"`).
    #[serde(rename = "type")]
    pub r#type: String,

    /// Name for this stage instance, used in logs and `Tag`-policy output.
    /// Defaults to `type` when omitted, so simple configs can skip it.
    pub name: Option<String>,

    /// What to do when this stage's processor fails: `reject` (default),
    /// `tag`, or `ignore`. Parsed via `ErrorPolicy::from_str`.
    pub on_error: Option<String>,

    /// Overrides the config-wide default queue capacity for this stage.
    pub capacity: Option<usize>,

    /// Processor-specific configuration parameters.
    pub parameters: Option<HashMap<String, serde_json::Value>>,
}

impl StageConfig {
    /// The effective instance name: `name` if given, else `type`.
    pub fn instance_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.r#type)
    }
}
