//! Stage registry: maps a config file's `type` string to a constructor.
//!
//! Grounded on the teacher's `processors::factory` module — a
//! `OnceLock`-guarded static map from type name to constructor function,
//! looked up once per config-driven stage and listable for `--list-stages`.

use crate::config::types::StageConfig;
use crate::core::pipeline::Sequence;
use crate::core::stage::{ErrorPolicy, SimpleStage, Stage};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;

type Constructor = fn(&StageConfig, usize) -> anyhow::Result<Box<dyn Stage>>;

fn registry() -> &'static HashMap<&'static str, Constructor> {
    static REGISTRY: OnceLock<HashMap<&'static str, Constructor>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map: HashMap<&'static str, Constructor> = HashMap::new();
        map.insert("simulated", build_simulated);
        map.insert("set_field", build_set_field);
        map.insert("regex_extract", build_regex_extract);
        map.insert("log", build_log);
        map
    })
}

/// Type names known to the registry, for `--list-stages`.
pub fn list() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = registry().keys().copied().collect();
    names.sort_unstable();
    names
}

fn error_policy(config: &StageConfig) -> anyhow::Result<ErrorPolicy> {
    match &config.on_error {
        Some(policy) => ErrorPolicy::from_str(policy).map_err(|e| anyhow::anyhow!(e)),
        None => Ok(ErrorPolicy::default()),
    }
}

fn build_simulated(config: &StageConfig, _capacity: usize) -> anyhow::Result<Box<dyn Stage>> {
    use crate::stages::simulated::SimulatedSource;
    Ok(Box::new(SimulatedSource::from_stage_config(config)?))
}

fn build_set_field(config: &StageConfig, capacity: usize) -> anyhow::Result<Box<dyn Stage>> {
    use crate::stages::set_field::SetField;
    let processor = SetField::from_stage_config(config)?;
    Ok(Box::new(
        SimpleStage::new(config.instance_name(), Box::new(processor), error_policy(config)?).with_capacity(capacity),
    ))
}

fn build_regex_extract(config: &StageConfig, capacity: usize) -> anyhow::Result<Box<dyn Stage>> {
    use crate::stages::set_field::RegexExtract;
    let processor = RegexExtract::from_stage_config(config)?;
    Ok(Box::new(
        SimpleStage::new(config.instance_name(), Box::new(processor), error_policy(config)?).with_capacity(capacity),
    ))
}

fn build_log(config: &StageConfig, capacity: usize) -> anyhow::Result<Box<dyn Stage>> {
    use crate::stages::log::LogSink;
    let processor = LogSink::from_stage_config(config)?;
    Ok(Box::new(
        SimpleStage::new(config.instance_name(), Box::new(processor), error_policy(config)?).with_capacity(capacity),
    ))
}

/// Builds a linear [`Sequence`] from a config's ordered stage list, resolving
/// each `type` against the registry. Fails on the first unknown type or
/// per-stage construction error, naming the offending stage.
pub fn build(config: &crate::config::types::Config) -> anyhow::Result<Sequence> {
    let ctors = registry();
    let mut children = Vec::with_capacity(config.stages.len());
    for stage_config in &config.stages {
        let ctor = ctors
            .get(stage_config.r#type.as_str())
            .ok_or_else(|| anyhow::anyhow!("unknown stage type '{}'", stage_config.r#type))?;
        let capacity = stage_config.capacity.unwrap_or(config.capacity);
        let stage = ctor(stage_config, capacity)
            .map_err(|e| anyhow::anyhow!("stage '{}': {e}", stage_config.instance_name()))?;
        children.push(stage);
    }
    Ok(Sequence::new(config.name.clone(), children))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_are_listed() {
        let names = list();
        assert!(names.contains(&"log"));
        assert!(names.contains(&"simulated"));
        assert!(names.contains(&"set_field"));
        assert!(names.contains(&"regex_extract"));
    }

    #[test]
    fn build_rejects_unknown_type() {
        let toml = r#"
            [[stage]]
            type = "does_not_exist"
        "#;
        let config = crate::config::load_config_from_string(toml).unwrap();
        assert!(build(&config).is_err());
    }
}
