//! The pairing of a fabric with a task graph and its mapping result.

use crate::rules::RuleSet;
use crate::taskgraph::Taskgraph;
use indexmap::IndexMap;
use mosaic_arch::{Path, TopLevel};
use mosaic_common::{Ident, Metadata};
use std::sync::Arc;

/// A mapping problem instance and its (partial) solution.
///
/// The fabric and task graph are frozen; `place` fills `placement`
/// (task name → slot path), `route` fills `routes` (task-edge index →
/// routing-resource paths), and both stages record their metrics in
/// `metadata`.
pub struct Map {
    /// The fabric being mapped onto.
    pub top: TopLevel,
    /// The workload being mapped.
    pub tasks: Taskgraph,
    rules: Arc<dyn RuleSet>,
    /// Placement result: each task's assigned component path.
    pub placement: IndexMap<Ident, Path>,
    /// Routing result: for each routed task-edge index, the paths of the
    /// routing resources its channel occupies.
    pub routes: IndexMap<usize, Vec<Path>>,
    /// Mapping metrics and fabric-specific annotations.
    pub metadata: Metadata,
}

impl Map {
    /// Pairs a fabric with a task graph under the given oracle.
    pub fn new(top: TopLevel, tasks: Taskgraph, rules: Arc<dyn RuleSet>) -> Self {
        Self {
            top,
            tasks,
            rules,
            placement: IndexMap::new(),
            routes: IndexMap::new(),
            metadata: Metadata::new(),
        }
    }

    /// Returns the mappability oracle.
    pub fn rules(&self) -> &dyn RuleSet {
        self.rules.as_ref()
    }

    /// Returns a clone of the oracle handle.
    pub fn rules_arc(&self) -> Arc<dyn RuleSet> {
        Arc::clone(&self.rules)
    }

    /// Returns the assigned path of a task, if placed.
    pub fn location_of(&self, task: Ident) -> Option<&Path> {
        self.placement.get(&task)
    }

    /// Returns `true` if every task has an assigned path.
    pub fn is_fully_placed(&self) -> bool {
        self.tasks.nodes().all(|n| self.placement.contains_key(&n.name))
    }

    /// Discards any existing routing result.
    pub fn clear_routes(&mut self) {
        self.routes.clear();
    }
}

impl std::fmt::Debug for Map {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map")
            .field("top", &self.top.name)
            .field("tasks", &self.tasks.name)
            .field("placed", &self.placement.len())
            .field("routed", &self.routes.len())
            .finish()
    }
}
