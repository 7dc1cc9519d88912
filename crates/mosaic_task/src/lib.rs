//! Dataflow task graphs and mapping results for the Mosaic toolkit.
//!
//! A [`Taskgraph`] is the workload side of the mapping problem: named nodes
//! connected by multi-source multi-sink edges, both carrying opaque
//! [`Metadata`](mosaic_common::Metadata). A [`Map`] pairs a task graph with
//! a fabric and accumulates the placement and routing results. The
//! [`RuleSet`] trait is the mappability oracle dispatching over both
//! vocabularies.

#![warn(missing_docs)]

pub mod map;
pub mod rules;
pub mod taskgraph;

pub use map::Map;
pub use rules::{DefaultRules, RuleSet};
pub use taskgraph::{TaskEdge, TaskNode, Taskgraph};
