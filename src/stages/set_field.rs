//! Field-mapping transforms: `set_field` copies/renames fields according to
//! a [`FieldConfig`]; `regex_extract` matches a field against a pattern and
//! spreads its named capture groups into new fields.
//!
//! Grounded on the teacher's `processors::common::field_utils` (the
//! `FieldConfig`-driven copy loop) and `processors::transform` (a
//! pattern-matching transform over one input field).

use crate::config::field::FieldConfig;
use crate::config::params::{extract_field_params, extract_param};
use crate::config::traits::ProcessorConfig;
use crate::config::types::StageConfig;
use crate::core::event::Event;
use crate::core::stage::{LeafProcessor, StageOutcome};
use crate::error::ProcessError;
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

/// Copies (and optionally renames) fields per a [`FieldConfig`]. Supports
/// `Single`, `Multiple`, and `Mapping` — the three patterns that describe an
/// actual input→output relationship; `OutputOnly`/`None` are rejected at
/// construction since there is nothing for `set_field` to copy from.
pub struct SetField {
    field_config: FieldConfig,
}

impl SetField {
    pub fn from_stage_config(config: &StageConfig) -> anyhow::Result<Self> {
        let field_config = extract_field_params(&config.parameters);
        match &field_config {
            FieldConfig::Single { .. } | FieldConfig::Multiple { .. } | FieldConfig::Mapping(_) => {
                Ok(Self { field_config })
            }
            _ => Err(anyhow::anyhow!(
                "set_field requires field_in/field_out, fields_in/fields_out, or field_mapping parameters"
            )),
        }
    }
}

impl ProcessorConfig for SetField {
    fn from_stage_config(config: &StageConfig) -> anyhow::Result<Self> {
        SetField::from_stage_config(config)
    }
}

#[async_trait]
impl LeafProcessor for SetField {
    async fn process(&mut self, mut event: Event) -> Result<StageOutcome, ProcessError> {
        match &self.field_config {
            FieldConfig::Single { input, output } => {
                let value = event.get(input);
                event.set_field(output.clone(), value);
            }
            FieldConfig::Multiple { inputs, outputs } => {
                for (input, output) in inputs.iter().zip(outputs.iter()) {
                    let value = event.get(input);
                    event.set_field(output.clone(), value);
                }
            }
            FieldConfig::Mapping(mapping) => {
                for (input, output) in mapping {
                    let value = event.get(input);
                    event.set_field(output.clone(), value);
                }
            }
            FieldConfig::OutputOnly(_) | FieldConfig::None => unreachable!("rejected in from_stage_config"),
        }
        Ok(StageOutcome::Forward(event))
    }
}

/// Matches `field_in` against `pattern` and writes every named capture group
/// into the event as a new field. A non-match is a processing error, so
/// `on_error` (tag/reject/ignore) governs what happens to unparseable input.
pub struct RegexExtract {
    field_in: String,
    pattern: Regex,
}

impl RegexExtract {
    pub fn from_stage_config(config: &StageConfig) -> anyhow::Result<Self> {
        let field_in: Option<String> = extract_param(&config.parameters, "field_in", None::<String>);
        let field_in = field_in.ok_or_else(|| anyhow::anyhow!("regex_extract requires a 'field_in' parameter"))?;

        let pattern: Option<String> = extract_param(&config.parameters, "pattern", None::<String>);
        let pattern = pattern.ok_or_else(|| anyhow::anyhow!("regex_extract requires a 'pattern' parameter"))?;
        let pattern = Regex::new(&pattern).map_err(|e| anyhow::anyhow!("invalid regex pattern '{pattern}': {e}"))?;

        Ok(Self { field_in, pattern })
    }
}

impl ProcessorConfig for RegexExtract {
    fn from_stage_config(config: &StageConfig) -> anyhow::Result<Self> {
        RegexExtract::from_stage_config(config)
    }
}

#[async_trait]
impl LeafProcessor for RegexExtract {
    async fn process(&mut self, mut event: Event) -> Result<StageOutcome, ProcessError> {
        let text = match event.get(&self.field_in) {
            Value::String(s) => s,
            other => other.to_string(),
        };

        match self.pattern.captures(&text) {
            Some(captures) => {
                for name in self.pattern.capture_names().flatten() {
                    if let Some(m) = captures.name(name) {
                        event.set_field(name, m.as_str());
                    }
                }
                Ok(StageOutcome::Forward(event))
            }
            None => Err(ProcessError::new(
                event,
                anyhow::anyhow!("pattern did not match field '{}'", self.field_in),
            )),
        }
    }

    fn error_tag(&self) -> &str {
        "_unparsed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn stage_config(parameters: HashMap<String, Value>) -> StageConfig {
        StageConfig {
            r#type: "set_field".to_string(),
            name: None,
            on_error: None,
            capacity: None,
            parameters: Some(parameters),
        }
    }

    #[tokio::test]
    async fn set_field_copies_single_mapping() {
        let config = stage_config(HashMap::from([
            ("field_in".to_string(), serde_json::json!("temp")),
            ("field_out".to_string(), serde_json::json!("temperature")),
        ]));
        let mut stage = SetField::from_stage_config(&config).unwrap();

        let mut event = Event::new();
        event.set_field("temp", 21.5);
        match stage.process(event).await.unwrap() {
            StageOutcome::Forward(event) => assert_eq!(event.get("temperature"), serde_json::json!(21.5)),
            StageOutcome::Consumed => panic!("set_field should forward"),
        }
    }

    #[tokio::test]
    async fn set_field_rejects_output_only_config() {
        let config = stage_config(HashMap::from([("field_out".to_string(), serde_json::json!("x"))]));
        assert!(SetField::from_stage_config(&config).is_err());
    }

    #[tokio::test]
    async fn regex_extract_spreads_named_groups() {
        let config = StageConfig {
            r#type: "regex_extract".to_string(),
            name: None,
            on_error: None,
            capacity: None,
            parameters: Some(HashMap::from([
                ("field_in".to_string(), serde_json::json!("line")),
                (
                    "pattern".to_string(),
                    serde_json::json!(r"(?P<host>\S+) - (?P<status>\d+)"),
                ),
            ])),
        };
        let mut stage = RegexExtract::from_stage_config(&config).unwrap();

        let mut event = Event::new();
        event.set_field("line", "web-1 - 200");
        match stage.process(event).await.unwrap() {
            StageOutcome::Forward(event) => {
                assert_eq!(event.get("host"), serde_json::json!("web-1"));
                assert_eq!(event.get("status"), serde_json::json!("200"));
            }
            StageOutcome::Consumed => panic!("regex_extract should forward on match"),
        }
    }

    #[tokio::test]
    async fn regex_extract_errors_on_no_match() {
        let config = StageConfig {
            r#type: "regex_extract".to_string(),
            name: None,
            on_error: None,
            capacity: None,
            parameters: Some(HashMap::from([
                ("field_in".to_string(), serde_json::json!("line")),
                ("pattern".to_string(), serde_json::json!(r"^\d+$")),
            ])),
        };
        let mut stage = RegexExtract::from_stage_config(&config).unwrap();

        let mut event = Event::new();
        event.set_field("line", "not a number");
        assert!(stage.process(event).await.is_err());
    }
}
