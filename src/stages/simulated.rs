//! Simulated input source: emits normally-distributed samples on a fixed
//! interval. Exists so a pipeline can be exercised end to end without a
//! real upstream data source.
//!
//! Grounded on the teacher's `processors::input::simulated`; implements
//! [`Stage`] directly rather than riding on [`SimpleStage`]/[`LeafProcessor`]
//! since an input stage has no upstream to process from — it originates
//! events rather than transforming received ones.

use crate::config::params::extract_param;
use crate::config::traits::ProcessorConfig;
use crate::config::types::StageConfig;
use crate::core::event::Event;
use crate::core::queue::Queue;
use crate::core::stage::{Stage, StageState};
use async_trait::async_trait;
use rand_distr::{Distribution, Normal};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct SimulatedSource {
    name: String,
    field_out: String,
    interval: Duration,
    mean: f64,
    std_dev: f64,
    output: Option<Arc<dyn Queue>>,
    state: Arc<AtomicU8>,
    control_tx: Option<mpsc::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl SimulatedSource {
    pub fn from_stage_config(config: &StageConfig) -> anyhow::Result<Self> {
        let field_out: Option<String> = extract_param(&config.parameters, "field_out", None::<String>);
        let field_out = field_out.ok_or_else(|| anyhow::anyhow!("simulated source requires a 'field_out' parameter"))?;
        let interval_ms: u64 = extract_param(&config.parameters, "interval_ms", 1000);
        let mean: f64 = extract_param(&config.parameters, "mean", 0.0);
        let std_dev: f64 = extract_param(&config.parameters, "std_dev", 1.0);

        Ok(Self {
            name: config.instance_name().to_string(),
            field_out,
            interval: Duration::from_millis(interval_ms.max(1)),
            mean,
            std_dev,
            output: None,
            state: Arc::new(AtomicU8::new(StageState::Created as u8)),
            control_tx: None,
            worker: None,
        })
    }
}

impl ProcessorConfig for SimulatedSource {
    fn from_stage_config(config: &StageConfig) -> anyhow::Result<Self> {
        SimulatedSource::from_stage_config(config)
    }
}

#[async_trait]
impl Stage for SimulatedSource {
    fn name(&self) -> &str {
        &self.name
    }

    /// A source has no single producer feeding it, so its own "input queue"
    /// (the value `setup` must return to satisfy the `Stage` contract) is
    /// never fed by anything; returning `output` itself keeps the type
    /// honest without allocating a queue nobody will ever write to.
    fn setup(&mut self, output: Arc<dyn Queue>) -> Arc<dyn Queue> {
        self.output = Some(output.clone());
        output
    }

    async fn start(&mut self) -> anyhow::Result<()> {
        let output = self
            .output
            .clone()
            .ok_or_else(|| anyhow::anyhow!("source '{}' started before setup()", self.name))?;
        let field_out = self.field_out.clone();
        let interval = self.interval;
        let mean = self.mean;
        let std_dev = self.std_dev;
        let name = self.name.clone();

        let (control_tx, mut control_rx) = mpsc::channel(1);
        self.control_tx = Some(control_tx);

        let state = self.state.clone();
        state.store(StageState::Running as u8, Ordering::Release);

        let worker = tokio::spawn(async move {
            let normal = Normal::new(mean, std_dev).unwrap_or_else(|_| Normal::new(0.0, 1.0).expect("unit normal is always valid"));
            let mut rng = rand::rng();
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    biased;
                    _ = control_rx.recv() => break,
                    _ = ticker.tick() => {
                        let sample = normal.sample(&mut rng);
                        let mut event = Event::new();
                        event.set_field(field_out.clone(), sample);
                        if output.put(event).await.is_err() {
                            tracing::debug!(stage = %name, "output closed, stopping source");
                            break;
                        }
                    }
                }
            }
            state.store(StageState::Stopped as u8, Ordering::Release);
            tracing::debug!(stage = %name, "source stopped");
        });

        self.worker = Some(worker);
        Ok(())
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        self.state.store(StageState::Stopping as u8, Ordering::Release);
        if let Some(tx) = self.control_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(worker) = self.worker.take() {
            worker.await?;
        }
        Ok(())
    }

    fn state(&self) -> StageState {
        StageState::from(self.state.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::queue::bounded;
    use std::collections::HashMap;

    #[tokio::test]
    async fn emits_samples_on_the_configured_field() {
        let config = StageConfig {
            r#type: "simulated".to_string(),
            name: Some("source".to_string()),
            on_error: None,
            capacity: None,
            parameters: Some(HashMap::from([
                ("field_out".to_string(), serde_json::json!("value")),
                ("interval_ms".to_string(), serde_json::json!(5)),
            ])),
        };
        let mut source = SimulatedSource::from_stage_config(&config).unwrap();

        let (output, mut consumer) = bounded(8);
        source.setup(output);
        source.start().await.unwrap();

        let event = tokio::time::timeout(Duration::from_secs(1), consumer.get())
            .await
            .expect("sample within timeout")
            .expect("channel open");
        assert!(event.has_field("value"));

        source.stop().await.unwrap();
    }

    #[test]
    fn requires_field_out() {
        let config = StageConfig {
            r#type: "simulated".to_string(),
            name: None,
            on_error: None,
            capacity: None,
            parameters: None,
        };
        assert!(SimulatedSource::from_stage_config(&config).is_err());
    }
}
