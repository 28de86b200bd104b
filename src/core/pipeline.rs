//! Composition operators: the MultiStage variants that wire child stages
//! into Sequence, Fanin, Fanout, Switch, and If topologies.
//!
//! Wiring algorithms are translated directly from the original `flow.py`
//! (reverse-order `setup` for Sequence, shared-output for Fanin,
//! broadcast-queue for Fanout, ordered-case routing for Switch). The scoped
//! "current composite" builder the source leans on is replaced here by
//! closures that receive an explicit `&mut` builder handle — option (a) from
//! the design notes: no hidden global, and it falls out of Rust's ownership
//! model for free.

use crate::core::condition::Condition;
use crate::core::event::Event;
use crate::core::queue::{BroadcastQueue, Queue};
use crate::core::stage::{
    ErrorPolicy, LeafProcessor, SimpleStage, Stage, StageOutcome, StageState,
};
use crate::error::{ConfigError, ProcessError};
use async_trait::async_trait;
use std::sync::Arc;

/// A stage that simply forwards whatever it receives. Used internally so
/// [`Fanin`] can present a uniform `setup`/input contract even though its
/// children, not Fanin itself, are the real data sources.
pub(crate) struct PassThrough;

#[async_trait]
impl LeafProcessor for PassThrough {
    async fn process(&mut self, event: Event) -> Result<StageOutcome, ProcessError> {
        Ok(StageOutcome::Forward(event))
    }
}

// --- Sequence ------------------------------------------------------------

/// Linear chain: `setup` wires children right-to-left so each stage's output
/// becomes the next stage's input, without threading a mutable list. The
/// sequence's own input is the input of its first child.
pub struct Sequence {
    name: String,
    children: Vec<Box<dyn Stage>>,
    input: Option<Arc<dyn Queue>>,
    state: StageState,
}

impl Sequence {
    pub fn new(name: impl Into<String>, children: Vec<Box<dyn Stage>>) -> Self {
        Self {
            name: name.into(),
            children,
            input: None,
            state: StageState::Created,
        }
    }

    /// Builds a sequence from a closure that appends children in textual
    /// order to an explicit builder handle.
    pub fn build(name: impl Into<String>, build: impl FnOnce(&mut Children)) -> Self {
        let mut children = Children::default();
        build(&mut children);
        Self::new(name, children.into_inner())
    }
}

#[async_trait]
impl Stage for Sequence {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&mut self, output: Arc<dyn Queue>) -> Arc<dyn Queue> {
        if let Some(input) = &self.input {
            return input.clone();
        }
        let mut q = output;
        for child in self.children.iter_mut().rev() {
            q = child.setup(q);
        }
        self.input = Some(q.clone());
        q
    }

    async fn start(&mut self) -> anyhow::Result<()> {
        // Textual (first-to-last) order: downstream stages must be ready to
        // accept before an upstream stage's worker starts pushing into them.
        for child in self.children.iter_mut() {
            child.start().await?;
        }
        self.state = StageState::Running;
        Ok(())
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        self.state = StageState::Stopping;
        // Stop head-to-tail: each stage fully drains into the next stage's
        // queue before that next stage is told to drain-and-exit, otherwise
        // a tail stage could stop while its upstream neighbour is still
        // pushing events into it.
        for child in self.children.iter_mut() {
            child.stop().await?;
        }
        self.state = StageState::Stopped;
        Ok(())
    }

    fn state(&self) -> StageState {
        self.state
    }
}

// --- Fanin -----------------------------------------------------------------

/// N→1 merge: every child receives the same output queue, so events from
/// all children interleave on it in arrival order with no ordering guarantee
/// across children. Fanin itself is not fed by any single source — its own
/// `setup`-returned queue exists only so it satisfies the `Stage` contract
/// uniformly (e.g. when nested as a root); anything written there is simply
/// forwarded to `output` like one more anonymous child.
pub struct Fanin {
    name: String,
    children: Vec<Box<dyn Stage>>,
    own: SimpleStage,
}

impl Fanin {
    pub fn new(name: impl Into<String>, children: Vec<Box<dyn Stage>>) -> Self {
        let name = name.into();
        let own = SimpleStage::new(format!("{name}::own-input"), Box::new(PassThrough), ErrorPolicy::Ignore);
        Self { name, children, own }
    }

    pub fn build(name: impl Into<String>, build: impl FnOnce(&mut Children)) -> Self {
        let mut children = Children::default();
        build(&mut children);
        Self::new(name, children.into_inner())
    }
}

#[async_trait]
impl Stage for Fanin {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&mut self, output: Arc<dyn Queue>) -> Arc<dyn Queue> {
        for child in self.children.iter_mut() {
            child.setup(output.clone());
        }
        self.own.setup(output)
    }

    async fn start(&mut self) -> anyhow::Result<()> {
        for child in self.children.iter_mut() {
            child.start().await?;
        }
        self.own.start().await
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        for child in self.children.iter_mut() {
            child.stop().await?;
        }
        self.own.stop().await
    }

    fn state(&self) -> StageState {
        self.own.state()
    }
}

// --- Fanout ----------------------------------------------------------------

/// 1→N broadcast: every child's `setup` produces that child's own input
/// queue; Fanout's own input is a [`BroadcastQueue`] over those. The operator
/// has no worker of its own — it exists only as a queue topology.
pub struct Fanout {
    name: String,
    children: Vec<Box<dyn Stage>>,
    input: Option<Arc<dyn Queue>>,
    state: StageState,
}

impl Fanout {
    pub fn new(name: impl Into<String>, children: Vec<Box<dyn Stage>>) -> Self {
        Self {
            name: name.into(),
            children,
            input: None,
            state: StageState::Created,
        }
    }

    pub fn build(name: impl Into<String>, build: impl FnOnce(&mut Children)) -> Self {
        let mut children = Children::default();
        build(&mut children);
        Self::new(name, children.into_inner())
    }
}

#[async_trait]
impl Stage for Fanout {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&mut self, output: Arc<dyn Queue>) -> Arc<dyn Queue> {
        if let Some(input) = &self.input {
            return input.clone();
        }
        let branch_inputs: Vec<Arc<dyn Queue>> = self
            .children
            .iter_mut()
            .map(|child| child.setup(output.clone()))
            .collect();
        let broadcast: Arc<dyn Queue> = Arc::new(BroadcastQueue::new(branch_inputs));
        self.input = Some(broadcast.clone());
        broadcast
    }

    async fn start(&mut self) -> anyhow::Result<()> {
        for child in self.children.iter_mut() {
            child.start().await?;
        }
        self.state = StageState::Running;
        Ok(())
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        self.state = StageState::Stopping;
        for child in self.children.iter_mut() {
            child.stop().await?;
        }
        self.state = StageState::Stopped;
        Ok(())
    }

    fn state(&self) -> StageState {
        self.state
    }
}

// --- Switch / If -------------------------------------------------------

struct SwitchProcessor {
    cases: Vec<(Condition, Arc<dyn Queue>)>,
}

#[async_trait]
impl LeafProcessor for SwitchProcessor {
    async fn process(&mut self, event: Event) -> Result<StageOutcome, ProcessError> {
        for (condition, queue) in &self.cases {
            if condition.evaluate(&event) {
                if queue.put(event).await.is_err() {
                    tracing::warn!("switch case queue closed while routing event");
                }
                return Ok(StageOutcome::Consumed);
            }
        }
        Ok(StageOutcome::Forward(event))
    }
}

/// SimpleStage with children: routes an event to the first matching case's
/// sub-sequence, or passes it through unchanged if none match. Each
/// sub-sequence is wired so its tail emits back into Switch's own `output`,
/// so Switch is a router with N paths that rejoin downstream.
pub struct Switch {
    name: String,
    cases: Vec<(Condition, Box<dyn Stage>)>,
    error_policy: ErrorPolicy,
    inner: Option<SimpleStage>,
}

impl Switch {
    /// `If`: a Switch with exactly one case and no default. On no match,
    /// `process` passes the event through unchanged — the general Switch
    /// behaviour already gives this for free once there is no default case.
    pub fn if_then(name: impl Into<String>, condition: Condition, chain: Box<dyn Stage>, error_policy: ErrorPolicy) -> Self {
        Self {
            name: name.into(),
            cases: vec![(condition, chain)],
            error_policy,
            inner: None,
        }
    }

    pub fn builder(name: impl Into<String>, error_policy: ErrorPolicy) -> SwitchBuilder {
        SwitchBuilder::new(name, error_policy)
    }
}

#[async_trait]
impl Stage for Switch {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&mut self, output: Arc<dyn Queue>) -> Arc<dyn Queue> {
        if let Some(inner) = &mut self.inner {
            return inner.setup(output);
        }
        let case_queues: Vec<(Condition, Arc<dyn Queue>)> = self
            .cases
            .iter_mut()
            .map(|(condition, chain)| (condition.clone(), chain.setup(output.clone())))
            .collect();
        let processor = SwitchProcessor { cases: case_queues };
        let mut inner = SimpleStage::new(self.name.clone(), Box::new(processor), self.error_policy);
        let input = inner.setup(output);
        self.inner = Some(inner);
        input
    }

    async fn start(&mut self) -> anyhow::Result<()> {
        for (_, chain) in self.cases.iter_mut() {
            chain.start().await?;
        }
        self.inner
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("switch '{}' started before setup()", self.name))?
            .start()
            .await
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        // Stop the router first: it must finish draining (and therefore
        // finish dispatching) before the sub-chains it fed are told to
        // drain and exit in turn.
        self.inner
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("switch '{}' stopped before setup()", self.name))?
            .stop()
            .await?;
        for (_, chain) in self.cases.iter_mut() {
            chain.stop().await?;
        }
        Ok(())
    }

    fn state(&self) -> StageState {
        self.inner.as_ref().map(Stage::state).unwrap_or(StageState::Created)
    }
}

/// Builder for [`Switch`]. Cases are registered in textual order; a case
/// registered through [`SwitchBuilder::default_case`] must be last —
/// appending any case afterward is a configuration error, matching the
/// cheap-to-detect half of the open question in the design notes (an
/// always-true *condition string* placed early is not specially detected).
pub struct SwitchBuilder {
    name: String,
    error_policy: ErrorPolicy,
    cases: Vec<(Condition, Box<dyn Stage>)>,
    default_registered: bool,
}

impl SwitchBuilder {
    fn new(name: impl Into<String>, error_policy: ErrorPolicy) -> Self {
        Self {
            name: name.into(),
            error_policy,
            cases: Vec::new(),
            default_registered: false,
        }
    }

    pub fn case(&mut self, condition: Condition, chain: Box<dyn Stage>) -> Result<&mut Self, ConfigError> {
        if self.default_registered {
            return Err(ConfigError::configuration(
                self.name.as_str(),
                "default case must be registered last; a case was appended after it",
            ));
        }
        self.cases.push((condition, chain));
        Ok(self)
    }

    pub fn default_case(&mut self, chain: Box<dyn Stage>) -> Result<&mut Self, ConfigError> {
        if self.default_registered {
            return Err(ConfigError::configuration(self.name.as_str(), "a default case is already registered"));
        }
        self.default_registered = true;
        self.cases.push((Condition::always(), chain));
        Ok(self)
    }

    pub fn build(self) -> Switch {
        Switch {
            name: self.name,
            cases: self.cases,
            error_policy: self.error_policy,
            inner: None,
        }
    }
}

// --- Children builder (shared by Sequence / Fanin / Fanout) -------------

/// Explicit, ordered child accumulator passed into a `build` closure. Each
/// top-level `add` call registers one child in textual order; nesting is
/// achieved by building another composite and adding it as a single child.
#[derive(Default)]
pub struct Children(Vec<Box<dyn Stage>>);

impl Children {
    pub fn add(&mut self, stage: Box<dyn Stage>) -> &mut Self {
        self.0.push(stage);
        self
    }

    fn into_inner(self) -> Vec<Box<dyn Stage>> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::queue::bounded;

    struct SetField(&'static str, i64);

    #[async_trait]
    impl LeafProcessor for SetField {
        async fn process(&mut self, mut event: Event) -> Result<StageOutcome, ProcessError> {
            event.set_field(self.0, self.1);
            Ok(StageOutcome::Forward(event))
        }
    }

    fn leaf(name: &str, field: &'static str, value: i64) -> Box<dyn Stage> {
        Box::new(SimpleStage::new(name, Box::new(SetField(field, value)), ErrorPolicy::Reject))
    }

    #[tokio::test]
    async fn sequence_preserves_relative_order() {
        let (output, mut consumer) = bounded(8);
        let mut sequence = Sequence::new(
            "seq",
            vec![leaf("a", "a", 1), leaf("b", "b", 2), leaf("c", "c", 3)],
        );
        let input = sequence.setup(output);
        sequence.start().await.unwrap();

        for i in 0..3 {
            let mut event = Event::new();
            event.set_field("order", i);
            input.put(event).await.unwrap();
        }
        sequence.stop().await.unwrap();

        for expected in 0..3 {
            let event = consumer.get().await.unwrap();
            assert_eq!(event.get("order"), serde_json::json!(expected));
            assert_eq!(event.get("a"), serde_json::json!(1));
            assert_eq!(event.get("c"), serde_json::json!(3));
        }
    }

    #[tokio::test]
    async fn fanout_delivers_one_copy_per_branch() {
        let (output_a, mut consumer_a) = bounded(8);
        let (output_b, mut consumer_b) = bounded(8);

        let sink_a = Sequence::new("sink_a", vec![Box::new(Relay::new(output_a))]);
        let sink_b = Sequence::new("sink_b", vec![Box::new(Relay::new(output_b))]);

        let mut fanout = Fanout::new("fanout", vec![Box::new(sink_a), Box::new(sink_b)]);
        let (terminal, _unused_consumer) = bounded(8);
        let input = fanout.setup(terminal);
        fanout.start().await.unwrap();

        let mut event = Event::new();
        event.set_field("f", 1);
        input.put(event).await.unwrap();
        fanout.stop().await.unwrap();

        assert_eq!(consumer_a.get().await.unwrap().get("f"), serde_json::json!(1));
        assert_eq!(consumer_b.get().await.unwrap().get("f"), serde_json::json!(1));
    }

    /// A leaf that ignores its assigned `output` and relays directly into a
    /// queue captured at construction — used only so the fanout test above
    /// can observe each branch's terminal queue directly rather than a
    /// shared one.
    struct Relay(Arc<dyn Queue>);

    impl Relay {
        fn new(target: Arc<dyn Queue>) -> SimpleStage {
            SimpleStage::new("relay", Box::new(RelayProcessor(target)), ErrorPolicy::Reject)
        }
    }

    struct RelayProcessor(Arc<dyn Queue>);

    #[async_trait]
    impl LeafProcessor for RelayProcessor {
        async fn process(&mut self, event: Event) -> Result<StageOutcome, ProcessError> {
            let _ = self.0.put(event).await;
            Ok(StageOutcome::Consumed)
        }
    }

    #[tokio::test]
    async fn switch_routes_first_match_else_passthrough() {
        let (output, mut consumer) = bounded(8);

        let (chain_a_target, mut chain_a_consumer) = bounded(8);
        let (chain_b_target, mut chain_b_consumer) = bounded(8);
        let chain_a: Box<dyn Stage> = Box::new(Relay::new(chain_a_target));
        let chain_b: Box<dyn Stage> = Box::new(Relay::new(chain_b_target));

        let mut builder = SwitchBuilder::new("kind-router", ErrorPolicy::Reject);
        builder.case(Condition::compile("kind == \"A\"").unwrap(), chain_a).unwrap();
        builder.case(Condition::compile("kind == \"B\"").unwrap(), chain_b).unwrap();
        let mut switch = builder.build();

        let input = switch.setup(output);
        switch.start().await.unwrap();

        for kind in ["A", "B", "C"] {
            let mut event = Event::new();
            event.set_field("kind", kind);
            input.put(event).await.unwrap();
        }
        switch.stop().await.unwrap();

        assert_eq!(chain_a_consumer.get().await.unwrap().get("kind"), serde_json::json!("A"));
        assert_eq!(chain_b_consumer.get().await.unwrap().get("kind"), serde_json::json!("B"));
        assert_eq!(consumer.get().await.unwrap().get("kind"), serde_json::json!("C"));
    }

    #[test]
    fn default_case_must_be_last() {
        let mut builder = SwitchBuilder::new("router", ErrorPolicy::Reject);
        builder
            .default_case(Box::new(SimpleStage::new("d", Box::new(PassThrough), ErrorPolicy::Reject)))
            .unwrap();
        let result = builder.case(
            Condition::always(),
            Box::new(SimpleStage::new("late", Box::new(PassThrough), ErrorPolicy::Reject)),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn if_then_routes_matches_and_passes_through_otherwise() {
        let (chain_target, mut chain_consumer) = bounded(8);
        let chain = Box::new(Relay::new(chain_target));

        let mut if_stage = Switch::if_then(
            "is-db",
            Condition::compile("\"db\" in tags").unwrap(),
            chain,
            ErrorPolicy::Reject,
        );

        let (output, mut consumer) = bounded(8);
        let input = if_stage.setup(output);
        if_stage.start().await.unwrap();

        let mut tagged = Event::new();
        tagged.add_tag("db");
        input.put(tagged).await.unwrap();

        let mut untagged = Event::new();
        untagged.set_field("kind", "other");
        input.put(untagged).await.unwrap();

        if_stage.stop().await.unwrap();

        assert!(chain_consumer.get().await.unwrap().tags().contains(&"db".to_string()));
        assert_eq!(consumer.get().await.unwrap().get("kind"), serde_json::json!("other"));
    }
}
