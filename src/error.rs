//! Error Taxonomy Module
//!
//! Defines the error types raised by the pipeline core. Configuration and
//! condition-compilation failures are fatal at build time and are surfaced to
//! the loader as [`ConfigError`]. Failures raised by a stage's `process` are
//! carried as [`ProcessError`], which hands the event back to the caller so
//! the stage's error policy can still act on it. Strict-mode formatting
//! failures are [`MissingFieldError`].
//!
//! `Shutdown` is not represented as an error type at all: it is a control
//! signal (see [`crate::core::stage::ControlMessage`]), not a failure.

use crate::core::event::Event;

/// Errors raised while building a pipeline graph, before any stage starts.
///
/// Both "malformed graph" (e.g. a default [`Switch`](crate::core::pipeline::Switch)
/// case registered before a later case) and "condition string failed to
/// compile" are fatal-at-build-time and are reported identically to an
/// external loader, so they share one enum rather than two.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration error in stage '{stage}': {message}")]
    Configuration { stage: String, message: String },

    #[error("failed to compile condition `{source_text}`: {message}")]
    Parse { source_text: String, message: String },
}

impl ConfigError {
    pub fn configuration(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            stage: stage.into(),
            message: message.into(),
        }
    }

    pub fn parse(source_text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            source_text: source_text.into(),
            message: message.into(),
        }
    }
}

/// Raised by a leaf stage's `process`. Carries the event back to the worker
/// loop, which still owes it a disposition under the stage's error policy
/// (reject, tag, or ignore) — the event must not be dropped on the floor
/// just because processing failed.
#[derive(Debug)]
pub struct ProcessError {
    pub event: Event,
    pub source: anyhow::Error,
}

impl ProcessError {
    pub fn new(event: Event, source: impl Into<anyhow::Error>) -> Self {
        Self {
            event,
            source: source.into(),
        }
    }
}

impl std::fmt::Display for ProcessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "process failed: {}", self.source)
    }
}

impl std::error::Error for ProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Raised by [`Event::format`](crate::core::event::Event::format) in strict
/// mode when a referenced field is absent. In default mode this never
/// surfaces: the missing name simply renders as an empty string.
#[derive(Debug, thiserror::Error)]
#[error("missing field '{0}' referenced in format template")]
pub struct MissingFieldError(pub String);
