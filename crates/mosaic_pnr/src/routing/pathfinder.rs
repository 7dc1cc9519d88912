//! Negotiated-congestion routing (Pathfinder).
//!
//! Every iteration rips up and re-routes each channel in priority order
//! with a multi-source Dijkstra whose vertex weights combine base cost,
//! live present congestion, and accumulated history. Penalties grow across
//! iterations until every channel coexists within capacity, the iteration
//! budget runs out, or the overuse count stops improving.

use crate::routing::channels::RoutingChannel;
use crate::routing::congestion::LinkTable;
use crate::routing::graph::{RoutingGraph, VertexKind};
use crate::routing::RouteOptions;
use mosaic_common::{Interner, MosaicResult};
use mosaic_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use mosaic_task::{Map, RuleSet, TaskEdge};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

const NO_PREV: u32 = u32::MAX;

/// The resource subgraph assigned to one channel: a tree (or stitched
/// forest spine) of vertices and the directed edges connecting them.
#[derive(Clone, Debug)]
pub struct Route {
    /// Vertices occupied by the channel.
    pub verts: Vec<u32>,
    /// Tree edges as `(from, to)` pairs following signal flow.
    pub edges: Vec<(u32, u32)>,
}

/// What one routing run produced.
#[derive(Debug, Clone, Copy)]
pub struct RouteOutcome {
    /// Every channel routed and no vertex over capacity.
    pub passed: bool,
    /// At least one channel had no path even ignoring congestion.
    pub connectivity_error: bool,
    /// The iteration budget ran out (or progress stalled) with vertices
    /// still overused.
    pub congestion_error: bool,
    /// Pathfinder iterations executed.
    pub iterations: usize,
    /// Overused vertices at exit.
    pub overused: usize,
}

/// The routing working set: graph, congestion table, channels and routes.
pub struct RoutingStruct {
    /// The flattened resource graph.
    pub graph: RoutingGraph,
    /// Per-vertex congestion state.
    pub links: LinkTable,
    /// Channels in routing priority order.
    pub channels: Vec<RoutingChannel>,
    /// Current route per channel, parallel to `channels`.
    pub routes: Vec<Option<Route>>,
    failed: Vec<bool>,
}

/// A frontier entry in the Dijkstra heap.
#[derive(Debug, Clone)]
struct SearchState {
    vertex: u32,
    cost: f64,
}

impl PartialEq for SearchState {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}

impl Eq for SearchState {}

impl Ord for SearchState {
    fn cmp(&self, other: &Self) -> Ordering {
        // reverse order for a min-heap (BinaryHeap is a max-heap)
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for SearchState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Multi-source Dijkstra over vertex weights. Seeds start at cost zero;
/// returns the first settled vertex satisfying `is_target`.
#[allow(clippy::too_many_arguments)]
fn shortest_path(
    graph: &RoutingGraph,
    links: &LinkTable,
    seeds: &[u32],
    usable: &dyn Fn(u32) -> bool,
    is_target: &dyn Fn(u32) -> bool,
    dist: &mut [f64],
    prev: &mut [u32],
    touched: &mut Vec<u32>,
) -> Option<u32> {
    for &v in touched.iter() {
        dist[v as usize] = f64::INFINITY;
        prev[v as usize] = NO_PREV;
    }
    touched.clear();

    let mut heap = BinaryHeap::new();
    for &s in seeds {
        if dist[s as usize] != 0.0 {
            dist[s as usize] = 0.0;
            touched.push(s);
            heap.push(SearchState { vertex: s, cost: 0.0 });
        }
    }

    while let Some(SearchState { vertex, cost }) = heap.pop() {
        if cost > dist[vertex as usize] {
            continue; // stale entry
        }
        if is_target(vertex) {
            return Some(vertex);
        }
        for &next in graph.adjacent(vertex) {
            if !usable(next) {
                continue;
            }
            let next_cost = cost + links.vertex_cost(next);
            if next_cost < dist[next as usize] {
                if dist[next as usize] == f64::INFINITY {
                    touched.push(next);
                }
                dist[next as usize] = next_cost;
                prev[next as usize] = vertex;
                heap.push(SearchState {
                    vertex: next,
                    cost: next_cost,
                });
            }
        }
    }
    None
}

/// Adds the retraced path ending at a newly settled target to the tree.
fn graft_path(
    target: u32,
    prev: &[u32],
    tree_verts: &mut Vec<u32>,
    tree_edges: &mut Vec<(u32, u32)>,
    in_tree: &mut [bool],
) {
    let mut v = target;
    while !in_tree[v as usize] {
        in_tree[v as usize] = true;
        tree_verts.push(v);
        let p = prev[v as usize];
        if p == NO_PREV {
            break; // reached a seed
        }
        tree_edges.push((p, v));
        v = p;
    }
}

/// Adds the retraced path from a source-group seed up to an existing tree
/// vertex (the settled target).
fn graft_branch_into_tree(
    target: u32,
    prev: &[u32],
    tree_verts: &mut Vec<u32>,
    tree_edges: &mut Vec<(u32, u32)>,
    in_tree: &mut [bool],
) {
    let mut v = target;
    loop {
        let p = prev[v as usize];
        if p == NO_PREV {
            break;
        }
        tree_edges.push((p, v));
        if in_tree[p as usize] {
            break;
        }
        in_tree[p as usize] = true;
        tree_verts.push(p);
        v = p;
    }
}

/// Routes one channel: grow a tree from the first start group through
/// every stop group, re-seeding the frontier from the tree at cost zero
/// after each sink, then stitch any remaining start groups into the tree.
#[allow(clippy::too_many_arguments)]
fn route_channel(
    graph: &RoutingGraph,
    links: &LinkTable,
    chan: &RoutingChannel,
    edge: &TaskEdge,
    rules: &dyn RuleSet,
    dist: &mut [f64],
    prev: &mut [u32],
    touched: &mut Vec<u32>,
    in_tree: &mut [bool],
) -> Result<Route, String> {
    let usable = |v: u32| match graph.vertex(v).kind {
        VertexKind::Port { .. } => true,
        VertexKind::Link => graph
            .link_at(v)
            .map(|l| rules.can_use(l, edge))
            .unwrap_or(false),
    };

    if chan.start_groups.iter().any(Vec::is_empty) || chan.start_groups.is_empty() {
        return Err("a source has no candidate source port".into());
    }
    if chan.stop_groups.iter().any(Vec::is_empty) || chan.stop_groups.is_empty() {
        return Err("a sink has no candidate sink port".into());
    }

    let mut tree_verts: Vec<u32> = Vec::new();
    let mut tree_edges: Vec<(u32, u32)> = Vec::new();
    let mut fail: Option<String> = None;

    for (gi, group) in chan.stop_groups.iter().enumerate() {
        if group.iter().any(|&v| in_tree[v as usize]) {
            continue;
        }
        let seeds: &[u32] = if tree_verts.is_empty() {
            &chan.start_groups[0]
        } else {
            &tree_verts
        };
        let is_target = |v: u32| group.contains(&v);
        match shortest_path(graph, links, seeds, &usable, &is_target, dist, prev, touched) {
            Some(t) => graft_path(t, prev, &mut tree_verts, &mut tree_edges, in_tree),
            None => {
                fail = Some(format!("sink group {gi} is unreachable"));
                break;
            }
        }
    }

    if fail.is_none() {
        for (gi, group) in chan.start_groups.iter().enumerate().skip(1) {
            if group.iter().any(|&v| in_tree[v as usize]) {
                continue;
            }
            let is_target = |v: u32| in_tree[v as usize];
            match shortest_path(graph, links, group, &usable, &is_target, dist, prev, touched) {
                Some(t) => {
                    graft_branch_into_tree(t, prev, &mut tree_verts, &mut tree_edges, in_tree)
                }
                None => {
                    fail = Some(format!("source group {gi} cannot reach the route tree"));
                    break;
                }
            }
        }
    }

    for &v in &tree_verts {
        in_tree[v as usize] = false;
    }
    match fail {
        Some(reason) => Err(reason),
        None => Ok(Route {
            verts: tree_verts,
            edges: tree_edges,
        }),
    }
}

impl RoutingStruct {
    /// Builds the routing working set from a placed map.
    pub fn build(map: &Map, options: &RouteOptions, interner: &Interner) -> MosaicResult<Self> {
        let graph = RoutingGraph::build(&map.top);
        let links = LinkTable::build(
            &graph,
            map.rules(),
            options.base_cost,
            options.h_factor,
            options.p_initial,
            options.p_growth,
        );
        let channels = crate::routing::channels::build_channels(map, &graph, interner)?;
        let routes = vec![None; channels.len()];
        let failed = vec![false; channels.len()];
        Ok(Self {
            graph,
            links,
            channels,
            routes,
            failed,
        })
    }

    /// Whether a channel was declared unroutable (connectivity failure).
    pub fn is_failed(&self, channel: usize) -> bool {
        self.failed[channel]
    }

    /// Runs the Pathfinder loop to a fixed point or failure.
    pub fn run(&mut self, map: &Map, options: &RouteOptions, sink: &DiagnosticSink) -> RouteOutcome {
        let rules = map.rules();
        let n = self.graph.len();
        let mut dist = vec![f64::INFINITY; n];
        let mut prev = vec![NO_PREV; n];
        let mut touched: Vec<u32> = Vec::new();
        let mut in_tree = vec![false; n];

        let mut connectivity_error = false;
        let mut last_overused = usize::MAX;
        let mut stall = 0usize;
        let mut iterations = 0usize;

        for k in 1..=options.max_iterations {
            iterations = k;
            for ci in 0..self.channels.len() {
                if self.failed[ci] {
                    continue;
                }
                if let Some(route) = self.routes[ci].take() {
                    for &v in &route.verts {
                        self.links.release(v, ci as u32);
                    }
                }
                let chan = &self.channels[ci];
                let edge = &map.tasks.edges()[chan.edge_index];
                match route_channel(
                    &self.graph,
                    &self.links,
                    chan,
                    edge,
                    rules,
                    &mut dist,
                    &mut prev,
                    &mut touched,
                    &mut in_tree,
                ) {
                    Ok(route) => {
                        for &v in &route.verts {
                            self.links.occupy(v, ci as u32);
                        }
                        self.routes[ci] = Some(route);
                    }
                    Err(reason) => {
                        // permanent: reported once, skipped from now on
                        self.failed[ci] = true;
                        connectivity_error = true;
                        sink.emit(
                            Diagnostic::error(
                                DiagnosticCode::new(Category::Route, 201),
                                format!("channel is unroutable: {reason}"),
                            )
                            .with_subject(format!("edge {}", chan.edge_index)),
                        );
                    }
                }
            }

            let overused = self.links.overused_count();
            if overused == 0 {
                break;
            }
            self.links.update_penalties(k);
            if overused >= last_overused {
                stall += 1;
                if stall >= options.stall_iterations {
                    break;
                }
            } else {
                stall = 0;
            }
            last_overused = overused;
        }

        let overused = self.links.overused_count();
        let any_failed = self.failed.iter().any(|&f| f);
        let congestion_error = overused > 0;
        if congestion_error {
            sink.emit(Diagnostic::warning(
                DiagnosticCode::new(Category::Route, 202),
                format!(
                    "routing did not converge after {iterations} iterations \
                     ({overused} overused resources)"
                ),
            ));
        }
        RouteOutcome {
            passed: !congestion_error && !any_failed,
            connectivity_error,
            congestion_error,
            iterations,
            overused,
        }
    }

    /// Approximate heap footprint in bytes.
    pub fn approx_bytes(&self) -> usize {
        let routes: usize = self
            .routes
            .iter()
            .flatten()
            .map(|r| {
                r.verts.capacity() * std::mem::size_of::<u32>()
                    + r.edges.capacity() * std::mem::size_of::<(u32, u32)>()
            })
            .sum();
        let channels: usize = self
            .channels
            .iter()
            .map(|c| {
                c.start_groups
                    .iter()
                    .chain(&c.stop_groups)
                    .map(|g| g.capacity() * std::mem::size_of::<u32>())
                    .sum::<usize>()
            })
            .sum();
        self.graph.approx_bytes() + self.links.approx_bytes() + routes + channels
    }
}
