//! Queue and BroadcastQueue: the wiring between stages.
//!
//! Grounded on the teacher's `PubSubChannel`/`FanoutChannel` split
//! (`core::channel`): a producer-facing handle that is cheap to clone and
//! share across multiple writers, paired with a single owned consumer used
//! by exactly one worker loop. `BroadcastQueue` reuses the same "for each
//! registered sender, send a clone" loop as `FanoutChannel::publish`, except
//! branches are registered once at `setup` time rather than via a dynamic
//! `subscribe()` call, since a Fanout's branches are fixed at configuration
//! time.

use crate::core::event::Event;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
#[error("queue is closed")]
pub struct QueueClosed;

/// Producer-facing side of a queue: anything that can accept an [`Event`]
/// and report how many are currently buffered. Implemented by both
/// [`BoundedQueue`] (point-to-point) and [`BroadcastQueue`] (fan-out).
#[async_trait]
pub trait Queue: Send + Sync {
    async fn put(&self, event: Event) -> Result<(), QueueClosed>;
    fn len(&self) -> usize;
}

/// A bounded, ordered, multi-producer single-consumer FIFO of events.
///
/// The [`Arc<BoundedQueue>`] returned by [`bounded`] is the producer handle
/// threaded through `setup()` calls; the paired [`QueueConsumer`] is kept by
/// the owning stage's worker loop and is never shared.
pub struct BoundedQueue {
    sender: mpsc::Sender<Event>,
    len: Arc<AtomicUsize>,
}

/// The exclusive consuming half of a [`BoundedQueue`].
pub struct QueueConsumer {
    receiver: mpsc::Receiver<Event>,
    len: Arc<AtomicUsize>,
}

/// Creates a bounded queue, returning the shareable producer handle and the
/// exclusive consumer.
pub fn bounded(capacity: usize) -> (Arc<BoundedQueue>, QueueConsumer) {
    let (sender, receiver) = mpsc::channel(capacity);
    let len = Arc::new(AtomicUsize::new(0));
    (
        Arc::new(BoundedQueue {
            sender,
            len: len.clone(),
        }),
        QueueConsumer { receiver, len },
    )
}

#[async_trait]
impl Queue for BoundedQueue {
    async fn put(&self, event: Event) -> Result<(), QueueClosed> {
        self.sender.send(event).await.map_err(|_| QueueClosed)?;
        self.len.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }
}

impl QueueConsumer {
    /// Blocking get: suspends until an event is available or the producer
    /// handle has been dropped (`None`).
    pub async fn get(&mut self) -> Option<Event> {
        let event = self.receiver.recv().await;
        if event.is_some() {
            self.len.fetch_sub(1, Ordering::AcqRel);
        }
        event
    }

    /// Non-blocking get, used by the worker loop's drain-on-stop path: keep
    /// consuming whatever is already buffered without waiting for more.
    pub fn try_get(&mut self) -> Option<Event> {
        match self.receiver.try_recv() {
            Ok(event) => {
                self.len.fetch_sub(1, Ordering::AcqRel);
                Some(event)
            }
            Err(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }
}

/// A put-only facade fanning each event to every registered branch queue.
///
/// Order across branches is unspecified; per branch, order matches the put
/// sequence (each branch is itself a [`BoundedQueue`], which preserves FIFO
/// order independently). Per the ownership contract in the core spec, each
/// branch receives a structural clone of the event rather than a shared
/// reference, so branches are free to mutate their own copy.
pub struct BroadcastQueue {
    branches: Vec<Arc<dyn Queue>>,
}

impl BroadcastQueue {
    pub fn new(branches: Vec<Arc<dyn Queue>>) -> Self {
        Self { branches }
    }
}

#[async_trait]
impl Queue for BroadcastQueue {
    async fn put(&self, event: Event) -> Result<(), QueueClosed> {
        let puts = self.branches.iter().map(|branch| branch.put(event.clone()));
        futures::future::try_join_all(puts).await?;
        Ok(())
    }

    fn len(&self) -> usize {
        self.branches.iter().map(|b| b.len()).sum()
    }
}

/// A queue that discards everything put into it. Used as the terminal
/// output for a top-level pipeline whose last stage is itself a sink (e.g.
/// `log`) and therefore has nothing real to forward to.
pub struct Null;

#[async_trait]
impl Queue for Null {
    async fn put(&self, _event: Event) -> Result<(), QueueClosed> {
        Ok(())
    }

    fn len(&self) -> usize {
        0
    }
}
