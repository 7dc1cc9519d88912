//! Routing invariant verification.

use crate::routing::graph::VertexKind;
use crate::routing::pathfinder::{Route, RoutingStruct};
use mosaic_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use mosaic_task::{RuleSet, Taskgraph};
use std::collections::{HashMap, HashSet, VecDeque};

/// The outcome of a routing verification pass.
///
/// Read-only and idempotent, like placement verification.
#[derive(Debug, Clone)]
pub struct RoutingReport {
    /// Task-edge indices whose channels violate a routing invariant.
    pub bad_channels: Vec<usize>,
    /// Vertices over capacity at verification time.
    pub overused: usize,
}

impl RoutingReport {
    /// Returns `true` if every routed channel is well-formed and no vertex
    /// is over capacity.
    pub fn is_consistent(&self) -> bool {
        self.bad_channels.is_empty() && self.overused == 0
    }
}

fn covers_group(route: &Route, group: &[u32]) -> bool {
    group.iter().any(|v| route.verts.contains(v))
}

/// Forward (or reverse) closure over the route's own edges from a seed set.
fn route_closure(route: &Route, seeds: &[u32], forward: bool) -> HashSet<u32> {
    let mut adj: HashMap<u32, Vec<u32>> = HashMap::new();
    for &(a, b) in &route.edges {
        if forward {
            adj.entry(a).or_default().push(b);
        } else {
            adj.entry(b).or_default().push(a);
        }
    }
    let mut seen: HashSet<u32> = seeds.iter().copied().collect();
    let mut queue: VecDeque<u32> = seeds.iter().copied().collect();
    while let Some(v) = queue.pop_front() {
        if let Some(next) = adj.get(&v) {
            for &n in next {
                if seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
    }
    seen
}

/// Checks every routed channel for group coverage, oracle admissibility
/// and internal reachability, and the whole table for capacity.
pub fn verify_routing(
    rs: &RoutingStruct,
    tasks: &Taskgraph,
    rules: &dyn RuleSet,
    sink: &DiagnosticSink,
) -> RoutingReport {
    let mut bad_channels: Vec<usize> = Vec::new();

    for (ci, chan) in rs.channels.iter().enumerate() {
        let edge = &tasks.edges()[chan.edge_index];
        let Some(route) = &rs.routes[ci] else {
            if !rs.is_failed(ci) {
                bad_channels.push(chan.edge_index);
                sink.emit(
                    Diagnostic::error(
                        DiagnosticCode::new(Category::Verify, 201),
                        "channel has no route",
                    )
                    .with_subject(format!("edge {}", chan.edge_index)),
                );
            }
            continue;
        };

        let groups_ok = chan
            .start_groups
            .iter()
            .chain(&chan.stop_groups)
            .all(|g| covers_group(route, g));
        if !groups_ok {
            bad_channels.push(chan.edge_index);
            sink.emit(
                Diagnostic::error(
                    DiagnosticCode::new(Category::Verify, 202),
                    "route does not touch every endpoint group",
                )
                .with_subject(format!("edge {}", chan.edge_index)),
            );
        }

        let usable_ok = route.verts.iter().all(|&v| match rs.graph.vertex(v).kind {
            VertexKind::Port { .. } => true,
            VertexKind::Link => rs
                .graph
                .link_at(v)
                .map(|l| rules.can_use(l, edge))
                .unwrap_or(false),
        });
        if !usable_ok {
            bad_channels.push(chan.edge_index);
            sink.emit(
                Diagnostic::error(
                    DiagnosticCode::new(Category::Verify, 203),
                    "route occupies a vertex the oracle rejects",
                )
                .with_subject(format!("edge {}", chan.edge_index)),
            );
        }

        // every route vertex lies on a start→stop walk within the route
        let starts: Vec<u32> = chan
            .start_groups
            .iter()
            .flatten()
            .copied()
            .filter(|v| route.verts.contains(v))
            .collect();
        let stops: Vec<u32> = chan
            .stop_groups
            .iter()
            .flatten()
            .copied()
            .filter(|v| route.verts.contains(v))
            .collect();
        let from_start = route_closure(route, &starts, true);
        let to_stop = route_closure(route, &stops, false);
        let reachable_ok = route
            .verts
            .iter()
            .all(|v| from_start.contains(v) && to_stop.contains(v));
        if !reachable_ok {
            bad_channels.push(chan.edge_index);
            sink.emit(
                Diagnostic::error(
                    DiagnosticCode::new(Category::Verify, 204),
                    "route contains vertices not on any source→sink walk",
                )
                .with_subject(format!("edge {}", chan.edge_index)),
            );
        }
    }

    let overused = rs.links.overused_count();
    if overused > 0 {
        sink.emit(Diagnostic::error(
            DiagnosticCode::new(Category::Verify, 205),
            format!("{overused} routing vertices exceed their capacity"),
        ));
    }

    bad_channels.sort_unstable();
    bad_channels.dedup();
    RoutingReport {
        bad_channels,
        overused,
    }
}
