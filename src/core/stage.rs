//! Stage base: the lifecycle contract shared by every node in the pipeline
//! graph, and [`SimpleStage`], the generic worker loop that every leaf
//! implementation rides on.
//!
//! Grounded on the teacher's `processors::processor::Processor` trait for
//! the lifecycle shape, and on `core::stage::ControlMessage` (the orphaned
//! `stages` generation) for the stop-signal naming — the one piece of that
//! dead code worth carrying forward.

use crate::core::queue::{bounded, Queue, QueueConsumer};
use crate::error::ProcessError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::event::Event;

/// Per-stage behaviour when `process` fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Drop the event, record a metric (a structured `tracing::warn!`), do
    /// not forward.
    Reject,
    /// Append a stage-defined tag and forward the original event unchanged.
    Tag,
    /// Forward the event unchanged, as if nothing happened.
    Ignore,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        ErrorPolicy::Reject
    }
}

impl std::str::FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject" => Ok(ErrorPolicy::Reject),
            "tag" => Ok(ErrorPolicy::Tag),
            "ignore" => Ok(ErrorPolicy::Ignore),
            other => Err(format!("unknown on_error policy '{other}' (expected reject|tag|ignore)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StageState {
    Created = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl From<u8> for StageState {
    fn from(value: u8) -> Self {
        match value {
            1 => StageState::Running,
            2 => StageState::Stopping,
            3 => StageState::Stopped,
            _ => StageState::Created,
        }
    }
}

/// A node in the pipeline graph. `setup` threads queues leaves-last; `start`
/// spawns workers; `stop` drains and terminates. Implemented directly by
/// [`SimpleStage`] and by every composition operator in
/// [`crate::core::pipeline`].
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &str;

    /// Allocates this stage's input queue, records `output`, and returns the
    /// new input queue. Idempotent: a second call without an intervening
    /// reset returns the same queue.
    fn setup(&mut self, output: Arc<dyn Queue>) -> Arc<dyn Queue>;

    async fn start(&mut self) -> anyhow::Result<()>;

    /// Signals the worker (if any) to drain remaining input then exit;
    /// blocks until it has.
    async fn stop(&mut self) -> anyhow::Result<()>;

    fn state(&self) -> StageState;
}

/// What a [`LeafProcessor`] did with an event it was handed.
pub enum StageOutcome {
    /// `process(event) -> true`: forward the (possibly mutated) event to
    /// `output`.
    Forward(Event),
    /// `process(event) -> false`: this processor has taken responsibility
    /// for the event (e.g. routed it into a Switch case); do not forward.
    Consumed,
}

/// The stage-specific transformation a [`SimpleStage`] drives through the
/// canonical worker loop.
///
/// `process` takes the event by value rather than by `&mut` reference so
/// that a processor which routes the event elsewhere (Switch, If) can move
/// it into another queue without an unnecessary clone; on failure the event
/// is handed back inside [`ProcessError`] so the worker loop can still apply
/// the stage's error policy.
#[async_trait]
pub trait LeafProcessor: Send + Sync {
    async fn process(&mut self, event: Event) -> Result<StageOutcome, ProcessError>;

    /// The tag appended to an event under `on_error = tag`. Defaults to
    /// `_unparsed`, matching the teacher's regex/parse-stage convention.
    fn error_tag(&self) -> &str {
        "_unparsed"
    }
}

pub(crate) enum ControlMessage {
    Terminate,
}

/// The one worker implementation every leaf stage shares: get, process,
/// forward/drop/apply-error-policy, repeat; drain remaining input on stop
/// before exiting.
pub struct SimpleStage {
    name: String,
    processor: Option<Box<dyn LeafProcessor>>,
    error_policy: ErrorPolicy,
    output: Option<Arc<dyn Queue>>,
    input_consumer: Option<QueueConsumer>,
    input_handle: Option<Arc<dyn Queue>>,
    state: Arc<AtomicU8>,
    control_tx: Option<mpsc::Sender<ControlMessage>>,
    worker: Option<JoinHandle<()>>,
    capacity: usize,
}

impl SimpleStage {
    pub fn new(name: impl Into<String>, processor: Box<dyn LeafProcessor>, error_policy: ErrorPolicy) -> Self {
        Self {
            name: name.into(),
            processor: Some(processor),
            error_policy,
            output: None,
            input_consumer: None,
            input_handle: None,
            state: Arc::new(AtomicU8::new(StageState::Created as u8)),
            control_tx: None,
            worker: None,
            capacity: 128,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

#[async_trait]
impl Stage for SimpleStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&mut self, output: Arc<dyn Queue>) -> Arc<dyn Queue> {
        if let Some(handle) = &self.input_handle {
            self.output = Some(output);
            return handle.clone();
        }
        let (producer, consumer) = bounded(self.capacity);
        self.output = Some(output);
        self.input_consumer = Some(consumer);
        self.input_handle = Some(producer.clone() as Arc<dyn Queue>);
        producer as Arc<dyn Queue>
    }

    async fn start(&mut self) -> anyhow::Result<()> {
        let mut processor = self
            .processor
            .take()
            .ok_or_else(|| anyhow::anyhow!("stage '{}' started twice", self.name))?;
        let mut input = self
            .input_consumer
            .take()
            .ok_or_else(|| anyhow::anyhow!("stage '{}' started before setup()", self.name))?;
        let output = self
            .output
            .clone()
            .ok_or_else(|| anyhow::anyhow!("stage '{}' started before setup()", self.name))?;
        let error_policy = self.error_policy;
        let name = self.name.clone();
        let (control_tx, mut control_rx) = mpsc::channel(1);
        self.control_tx = Some(control_tx);

        let state = self.state.clone();
        state.store(StageState::Running as u8, Ordering::Release);

        let worker = tokio::spawn(async move {
            let mut stopping = false;
            loop {
                let event = if stopping {
                    match input.try_get() {
                        Some(event) => event,
                        None => break,
                    }
                } else {
                    tokio::select! {
                        biased;
                        _ = control_rx.recv() => {
                            stopping = true;
                            continue;
                        }
                        maybe = input.get() => {
                            match maybe {
                                Some(event) => event,
                                None => break,
                            }
                        }
                    }
                };

                match processor.process(event).await {
                    Ok(StageOutcome::Forward(event)) => {
                        if output.put(event).await.is_err() {
                            tracing::debug!(stage = %name, "output closed, stopping worker");
                            break;
                        }
                    }
                    Ok(StageOutcome::Consumed) => {}
                    Err(ProcessError { mut event, source }) => match error_policy {
                        ErrorPolicy::Reject => {
                            tracing::warn!(stage = %name, error = %source, "event rejected by error policy");
                        }
                        ErrorPolicy::Tag => {
                            event.add_tag(processor.error_tag());
                            let _ = output.put(event).await;
                        }
                        ErrorPolicy::Ignore => {
                            let _ = output.put(event).await;
                        }
                    },
                }
            }
            state.store(StageState::Stopped as u8, Ordering::Release);
            tracing::debug!(stage = %name, "worker exited");
        });

        self.worker = Some(worker);
        Ok(())
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        self.state.store(StageState::Stopping as u8, Ordering::Release);
        if let Some(tx) = self.control_tx.take() {
            let _ = tx.send(ControlMessage::Terminate).await;
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
    use crate::core::queue::bounded as new_bounded;

    struct PassThrough;

    #[async_trait]
    impl LeafProcessor for PassThrough {
        async fn process(&mut self, event: Event) -> Result<StageOutcome, ProcessError> {
            Ok(StageOutcome::Forward(event))
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl LeafProcessor for AlwaysFails {
        async fn process(&mut self, event: Event) -> Result<StageOutcome, ProcessError> {
            Err(ProcessError::new(event, anyhow::anyhow!("boom")))
        }

        fn error_tag(&self) -> &str {
            "_unparsed"
        }
    }

    #[tokio::test]
    async fn forwards_events_through_process() {
        let (output_producer, mut output_consumer) = new_bounded(8);
        let mut stage = SimpleStage::new("pass", Box::new(PassThrough), ErrorPolicy::Reject);
        let input = stage.setup(output_producer);
        stage.start().await.unwrap();

        let mut event = Event::new();
        event.set_field("x", 1);
        input.put(event).await.unwrap();

        let received = output_consumer.get().await.unwrap();
        assert_eq!(received.get("x"), serde_json::json!(1));

        stage.stop().await.unwrap();
    }

    #[tokio::test]
    async fn tag_policy_forwards_with_tag_on_error() {
        let (output_producer, mut output_consumer) = new_bounded(8);
        let mut stage = SimpleStage::new("failing", Box::new(AlwaysFails), ErrorPolicy::Tag);
        let input = stage.setup(output_producer);
        stage.start().await.unwrap();

        let mut event = Event::new();
        event.set_field("data", "abc");
        input.put(event).await.unwrap();

        let received = output_consumer.get().await.unwrap();
        assert_eq!(received.get("data"), serde_json::json!("abc"));
        assert_eq!(received.tags(), &["_unparsed".to_string()]);

        stage.stop().await.unwrap();
    }

    #[tokio::test]
    async fn reject_policy_drops_event() {
        let (output_producer, mut output_consumer) = new_bounded(8);
        let mut stage = SimpleStage::new("failing", Box::new(AlwaysFails), ErrorPolicy::Reject);
        let input = stage.setup(output_producer);
        stage.start().await.unwrap();

        input.put(Event::new()).await.unwrap();
        stage.stop().await.unwrap();

        assert!(output_consumer.try_get().is_none());
    }

    #[tokio::test]
    async fn stop_drains_in_flight_events() {
        let (output_producer, mut output_consumer) = new_bounded(8);
        let mut stage = SimpleStage::new("pass", Box::new(PassThrough), ErrorPolicy::Reject);
        let input = stage.setup(output_producer);
        stage.start().await.unwrap();

        for i in 0..5 {
            let mut event = Event::new();
            event.set_field("i", i);
            input.put(event).await.unwrap();
        }
        stage.stop().await.unwrap();

        let mut seen = Vec::new();
        while let Some(event) = output_consumer.try_get() {
            seen.push(event.get("i"));
        }
        assert_eq!(seen.len(), 5);
    }
}
