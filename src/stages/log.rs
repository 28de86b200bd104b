//! Log sink: a terminal stage that renders each event as JSON through
//! `tracing` and forwards it unchanged, so it can also sit mid-sequence as
//! a debugging tap.
//!
//! Grounded on the teacher's `processors::output::log`.

use crate::config::params::extract_param;
use crate::config::traits::ProcessorConfig;
use crate::config::types::StageConfig;
use crate::core::event::Event;
use crate::core::stage::{LeafProcessor, StageOutcome};
use crate::error::ProcessError;
use async_trait::async_trait;
use std::str::FromStr;
use tracing::Level;

pub struct LogSink {
    level: Level,
}

impl LogSink {
    pub fn from_stage_config(config: &StageConfig) -> anyhow::Result<Self> {
        let level_name: String = extract_param(&config.parameters, "level", "info".to_string());
        let level = Level::from_str(&level_name)
            .map_err(|_| anyhow::anyhow!("invalid log level '{level_name}' (expected trace|debug|info|warn|error)"))?;
        Ok(Self { level })
    }
}

impl ProcessorConfig for LogSink {
    fn from_stage_config(config: &StageConfig) -> anyhow::Result<Self> {
        LogSink::from_stage_config(config)
    }
}

#[async_trait]
impl LeafProcessor for LogSink {
    async fn process(&mut self, event: Event) -> Result<StageOutcome, ProcessError> {
        let rendered = event.to_json();
        match self.level {
            Level::TRACE => tracing::trace!(event = %rendered),
            Level::DEBUG => tracing::debug!(event = %rendered),
            Level::INFO => tracing::info!(event = %rendered),
            Level::WARN => tracing::warn!(event = %rendered),
            Level::ERROR => tracing::error!(event = %rendered),
        }
        Ok(StageOutcome::Forward(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forwards_the_event_unchanged() {
        let mut sink = LogSink { level: Level::INFO };
        let mut event = Event::new();
        event.set_field("x", 1);
        match sink.process(event).await.unwrap() {
            StageOutcome::Forward(event) => assert_eq!(event.get("x"), serde_json::json!(1)),
            StageOutcome::Consumed => panic!("log sink should forward"),
        }
    }

    #[test]
    fn rejects_unknown_level() {
        let config = StageConfig {
            r#type: "log".to_string(),
            name: None,
            on_error: None,
            capacity: None,
            parameters: Some(std::collections::HashMap::from([(
                "level".to_string(),
                serde_json::json!("shout"),
            )])),
        };
        assert!(LogSink::from_stage_config(&config).is_err());
    }
}
