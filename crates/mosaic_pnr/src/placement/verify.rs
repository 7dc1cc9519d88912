//! Placement invariant verification.

use crate::ids::NodeId;
use crate::placement::state::PlacerState;
use mosaic_arch::{ArchRef, TopLevel};
use mosaic_common::Interner;
use mosaic_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use mosaic_task::{RuleSet, Taskgraph};

/// The outcome of a placement verification pass.
///
/// Verification is read-only and idempotent: running it twice on unchanged
/// state yields identical reports.
#[derive(Debug, Clone)]
pub struct PlacementReport {
    /// Nodes violating any placement invariant, sorted and deduplicated.
    pub bad_nodes: Vec<NodeId>,
}

impl PlacementReport {
    /// Returns `true` if no invariant was violated.
    pub fn is_consistent(&self) -> bool {
        self.bad_nodes.is_empty()
    }
}

/// Checks grid consistency, exclusive occupancy and seat legality.
///
/// Findings are emitted into the sink with the offending node's name; the
/// report collects the offending node indices.
pub fn verify_placement(
    state: &PlacerState,
    top: &TopLevel,
    graph: &Taskgraph,
    rules: &dyn RuleSet,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> PlacementReport {
    let mut bad_nodes: Vec<NodeId> = Vec::new();

    // every node is recorded in the grid at its own location
    for (i, node) in state.nodes.iter().enumerate() {
        let id = NodeId::from_raw(i as u32);
        if !node.loc.is_placed() {
            bad_nodes.push(id);
            sink.emit(
                Diagnostic::error(DiagnosticCode::new(Category::Verify, 101), "task is not seated")
                    .with_subject(interner.resolve(node.name)),
            );
            continue;
        }
        if state.grid.get(node.loc) != Some(id) {
            bad_nodes.push(id);
            sink.emit(
                Diagnostic::error(
                    DiagnosticCode::new(Category::Verify, 102),
                    "grid does not record this task at its location",
                )
                .with_subject(interner.resolve(node.name)),
            );
        }
    }

    // every occupied cell points back at a node seated there
    for (loc, id) in state.grid.occupied() {
        let ok = id.index() < state.nodes.len() && state.nodes[id.index()].loc == loc;
        if !ok {
            bad_nodes.push(id);
            sink.emit(
                Diagnostic::error(
                    DiagnosticCode::new(Category::Verify, 103),
                    format!(
                        "grid cell (addr {}, slot {}) holds a stale occupant",
                        loc.addr, loc.slot
                    ),
                )
                .with_subject(format!("node {id}")),
            );
        }
    }

    // every seat is legal under the map table and the oracle
    for (i, node) in state.nodes.iter().enumerate() {
        if !node.loc.is_placed() {
            continue;
        }
        let id = NodeId::from_raw(i as u32);
        let table_ok =
            state
                .maptable
                .is_legal(node.class, node.loc.addr as usize, node.loc.slot);
        let oracle_ok = table_ok
            && state
                .path_table
                .slot(node.loc.addr as usize, node.loc.slot)
                .and_then(|path| match top.resolve(path) {
                    Some(ArchRef::Component(comp)) => {
                        graph.node(node.name).map(|task| rules.can_map(task, comp))
                    }
                    _ => Some(false),
                })
                .unwrap_or(false);
        if !oracle_ok {
            bad_nodes.push(id);
            sink.emit(
                Diagnostic::error(
                    DiagnosticCode::new(Category::Verify, 104),
                    "task is seated on an illegal slot",
                )
                .with_subject(interner.resolve(node.name)),
            );
        }
    }

    bad_nodes.sort_unstable();
    bad_nodes.dedup();
    PlacementReport { bad_nodes }
}
