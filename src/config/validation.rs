//! Configuration validation.
//!
//! Structural checks only: a config-file pipeline is always a flat,
//! ordered list of stages, so there's no input/output wiring to check (that
//! topology question only exists for the programmatic builder API in
//! [`crate::core::pipeline`]). What's left to validate here is that the
//! list itself makes sense independent of what any particular stage type
//! means — whether `type` names a registered processor is checked later, by
//! [`crate::stages::registry::build`], which is the one place that actually
//! knows the registry.
//!
//! # Example Usage
//!
//! ```rust
//! use cascadeflow::config::{load_config, validate_config};
//!
//! let config = load_config("config.toml")?;
//! validate_config(&config)?;
//! ```

use crate::config::types::Config;
use crate::core::stage::ErrorPolicy;
use std::collections::HashSet;
use std::str::FromStr;

/// Validates the entire configuration for structural correctness.
///
/// # Errors
///
/// - The stage list is empty.
/// - Two stages share the same effective name ([`StageConfig::instance_name`](crate::config::types::StageConfig::instance_name)).
/// - A stage's `on_error` is set to something other than `reject`, `tag`, or `ignore`.
/// - A stage's `capacity` is `0`.
pub fn validate_config(config: &Config) -> anyhow::Result<()> {
    if config.stages.is_empty() {
        return Err(anyhow::anyhow!("configuration '{}' has no stages", config.name));
    }

    let mut seen = HashSet::new();
    for stage in &config.stages {
        let instance_name = stage.instance_name();
        if !seen.insert(instance_name.to_string()) {
            return Err(anyhow::anyhow!("duplicate stage name '{instance_name}'"));
        }

        if let Some(policy) = &stage.on_error {
            ErrorPolicy::from_str(policy)
                .map_err(|e| anyhow::anyhow!("stage '{instance_name}': {e}"))?;
        }

        if stage.capacity == Some(0) {
            return Err(anyhow::anyhow!("stage '{instance_name}': capacity must be greater than zero"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::load_config_from_string;

    #[test]
    fn rejects_empty_stage_list() {
        let config = load_config_from_string("name = \"empty\"\n").unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_duplicate_names() {
        let toml = r#"
            [[stage]]
            type = "simulated"
            name = "a"

            [[stage]]
            type = "log"
            name = "a"
        "#;
        let config = load_config_from_string(toml).unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_unknown_error_policy() {
        let toml = r#"
            [[stage]]
            type = "log"
            on_error = "retry"
        "#;
        let config = load_config_from_string(toml).unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn accepts_well_formed_config() {
        let toml = r#"
            [[stage]]
            type = "simulated"
            name = "source"

            [[stage]]
            type = "log"
            name = "sink"
            on_error = "tag"
        "#;
        let config = load_config_from_string(toml).unwrap();
        assert!(validate_config(&config).is_ok());
    }
}
