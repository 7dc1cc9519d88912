//! Routing: negotiated-congestion channel routing over the resource graph.
//!
//! [`route`] builds the routing graph and channels from a placed [`Map`],
//! runs Pathfinder to a fixed point (or failure), verifies the result and
//! transcribes each channel's resource paths back into the map.

pub mod channels;
pub mod congestion;
pub mod graph;
pub mod pathfinder;
pub mod verify;

pub use channels::{build_channels, RoutingChannel};
pub use congestion::{LinkTable, RoutingLink};
pub use graph::{RouteVertex, RoutingGraph, VertexKind};
pub use pathfinder::{Route, RouteOutcome, RoutingStruct};
pub use verify::{verify_routing, RoutingReport};

use crate::metrics;
use mosaic_arch::Path;
use mosaic_common::{Interner, MosaicResult};
use mosaic_diagnostics::DiagnosticSink;
use mosaic_task::Map;
use std::time::Instant;

/// Knobs for [`route`].
#[derive(Debug, Clone)]
pub struct RouteOptions {
    /// Pathfinder iteration budget.
    pub max_iterations: usize,
    /// Iterations without overuse improvement before giving up.
    pub stall_iterations: usize,
    /// Base cost of expanding into any vertex.
    pub base_cost: f64,
    /// History increment per unit of overuse per iteration.
    pub h_factor: f64,
    /// Present-penalty factor at the first iteration.
    pub p_initial: f64,
    /// Present-penalty growth per iteration.
    pub p_growth: f64,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            stall_iterations: 10,
            base_cost: 1.0,
            h_factor: 1.0,
            p_initial: 0.5,
            p_growth: 1.5,
        }
    }
}

/// Routes every channel of a placed map.
///
/// Outcome flags and metrics land in the map metadata: `routing_passed`
/// reflects only the final occupancy check (no vertex over capacity),
/// `routing_error` is set on any structured routing failure (connectivity
/// or non-convergence). Verifier findings about individual channels are
/// reported through the sink without affecting `routing_passed`. Routed
/// channels are transcribed as resource-path lists and handed to the
/// oracle's `annotate` hook even when other channels failed.
pub fn route(
    map: &mut Map,
    options: RouteOptions,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> MosaicResult<()> {
    let build_start = Instant::now();
    let mut rs = RoutingStruct::build(map, &options, interner)?;
    map.metadata.set(
        metrics::ROUTING_STRUCT_TIME,
        metrics::secs(build_start.elapsed()),
    );
    map.metadata
        .set(metrics::ROUTING_STRUCT_BYTES, rs.approx_bytes() as u64);
    map.metadata
        .set(metrics::ROUTING_GLOBAL_LINKS, rs.graph.global_links() as u64);

    let route_start = Instant::now();
    let outcome = rs.run(map, &options, sink);
    map.metadata
        .set(metrics::ROUTING_TIME, metrics::secs(route_start.elapsed()));
    map.metadata
        .set(metrics::ROUTING_BYTES, rs.approx_bytes() as u64);

    let rules = map.rules_arc();
    let report = verify_routing(&rs, &map.tasks, rules.as_ref(), sink);

    // routing_passed is the occupancy check alone; channel-level findings
    // stay in the sink and the verification report
    map.metadata
        .set(metrics::ROUTING_PASSED, report.overused == 0);
    map.metadata.set(
        metrics::ROUTING_ERROR,
        outcome.connectivity_error || outcome.congestion_error,
    );

    map.routes.clear();
    for (ci, chan) in rs.channels.iter().enumerate() {
        let Some(route) = &rs.routes[ci] else {
            continue;
        };
        let paths: Vec<Path> = route
            .verts
            .iter()
            .map(|&v| rs.graph.vertex(v).path.clone())
            .collect();
        let edge = &map.tasks.edges()[chan.edge_index];
        rules.annotate(chan.edge_index, edge, &paths, &mut map.metadata);
        map.routes.insert(chan.edge_index, paths);
    }
    map.routes.sort_keys();
    Ok(())
}
