//! cascadeflow: a framework for building branching event processing
//! pipelines out of small, composable stages.
//!
//! The core types ([`core::event::Event`], [`core::queue::Queue`],
//! [`core::stage::Stage`]) are runtime-agnostic with respect to how a
//! pipeline is assembled: [`core::pipeline`] provides Sequence/Fanin/Fanout/
//! Switch/If composition for building one programmatically, while
//! [`config`] and [`stages::registry`] provide a config-file-driven path
//! that builds a flat Sequence of registered stage types.

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod stages;
