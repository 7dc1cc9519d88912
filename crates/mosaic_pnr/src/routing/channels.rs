//! Routing channels: start/stop vertex groups per task-graph edge.

use crate::routing::graph::{RoutingGraph, VertexKind};
use mosaic_arch::{ArchRef, Direction, Path, TopLevel};
use mosaic_common::{Ident, Interner, MappingError, MosaicResult};
use mosaic_task::{Map, RuleSet, TaskEdge};

/// One channel to route: the physical endpoints of a task-graph edge.
///
/// Each start group collects the candidate source-port vertices of one
/// source task; each stop group the candidate sink-port vertices of one
/// sink task. A legal route touches at least one vertex of every group on
/// both sides.
#[derive(Clone, Debug)]
pub struct RoutingChannel {
    /// Index of the task-graph edge this channel realizes.
    pub edge_index: usize,
    /// Candidate source vertices, one group per source task.
    pub start_groups: Vec<Vec<u32>>,
    /// Candidate sink vertices, one group per sink task.
    pub stop_groups: Vec<Vec<u32>>,
    /// Routing priority; lower routes earlier. Defaults to ascending
    /// fanout then ascending group count, packed into one key; the oracle
    /// may replace it wholesale via `routing_channel`.
    pub priority: i64,
}

impl RoutingChannel {
    fn default_priority(edge: &TaskEdge, groups: usize) -> i64 {
        edge.fanout() as i64 * 1_000_000 + groups as i64
    }
}

impl PartialEq for RoutingChannel {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.edge_index == other.edge_index
    }
}

impl Eq for RoutingChannel {}

impl PartialOrd for RoutingChannel {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RoutingChannel {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority
            .cmp(&other.priority)
            .then(self.edge_index.cmp(&other.edge_index))
    }
}

fn port_group(
    top: &TopLevel,
    graph: &RoutingGraph,
    mapped: &Path,
    edge: &TaskEdge,
    rules: &dyn RuleSet,
    want: Direction,
) -> Vec<u32> {
    let Some(ArchRef::Component(comp)) = top.resolve(mapped) else {
        return Vec::new();
    };
    let mut group = Vec::new();
    for port in comp.ports() {
        if port.direction != want {
            continue;
        }
        let accepted = match want {
            Direction::Output => rules.is_source_port(port, edge),
            Direction::Input => rules.is_sink_port(port, edge),
        };
        if !accepted {
            continue;
        }
        if let Some(v) = graph.index_of(&mapped.child(port.name)) {
            debug_assert!(matches!(
                graph.vertex(v).kind,
                VertexKind::Port { .. }
            ));
            group.push(v);
        }
    }
    group
}

fn mapped_of<'a>(map: &'a Map, name: Ident, interner: &Interner) -> MosaicResult<&'a Path> {
    map.placement.get(&name).ok_or_else(|| {
        MappingError::PlacementInconsistency(format!(
            "task '{}' is unplaced; route requires a complete placement",
            interner.resolve(name)
        ))
    })
}

/// Builds the channel list for every edge with `needs_routing`, sorted by
/// priority so harder channels route first.
pub fn build_channels(
    map: &Map,
    graph: &RoutingGraph,
    interner: &Interner,
) -> MosaicResult<Vec<RoutingChannel>> {
    let rules = map.rules();
    let mut channels = Vec::new();

    for (edge_index, edge) in map.tasks.edges().iter().enumerate() {
        if !rules.needs_routing(edge) {
            continue;
        }
        let mut start_groups = Vec::with_capacity(edge.sources.len());
        for &name in &edge.sources {
            start_groups.push(port_group(
                &map.top,
                graph,
                mapped_of(map, name, interner)?,
                edge,
                rules,
                Direction::Output,
            ));
        }
        let mut stop_groups = Vec::with_capacity(edge.sinks.len());
        for &name in &edge.sinks {
            stop_groups.push(port_group(
                &map.top,
                graph,
                mapped_of(map, name, interner)?,
                edge,
                rules,
                Direction::Input,
            ));
        }

        let groups = start_groups.len() + stop_groups.len();
        let priority = rules
            .routing_channel(edge_index, edge)
            .unwrap_or_else(|| RoutingChannel::default_priority(edge, groups));
        channels.push(RoutingChannel {
            edge_index,
            start_groups,
            stop_groups,
            priority,
        });
    }

    channels.sort();
    Ok(channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use mosaic_arch::Address;
    use mosaic_common::Interner;

    fn placed_chain_map(interner: &Interner) -> (Map, RoutingGraph) {
        let mut map = testutil::chain_map(
            &interner,
            3,
            &["a", "b", "c"],
            &[(&["a"], &["b", "c"]), (&["b"], &["c"])],
        );
        // place by hand: task i on tile i's pe
        let pe = interner.get_or_intern("pe");
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            map.placement.insert(
                interner.get_or_intern(name),
                Path::global(Address::new(vec![i as i32]), vec![pe]),
            );
        }
        let graph = RoutingGraph::build(&map.top);
        (map, graph)
    }

    #[test]
    fn groups_point_at_mapped_ports() {
        let interner = Interner::new();
        let (map, graph) = placed_chain_map(&interner);
        let channels = build_channels(&map, &graph, &interner).unwrap();
        assert_eq!(channels.len(), 2);

        for chan in &channels {
            assert!(!chan.start_groups.is_empty());
            for group in &chan.start_groups {
                assert_eq!(group.len(), 1); // the pe has one output port
            }
            for group in &chan.stop_groups {
                assert_eq!(group.len(), 1); // and one input port
            }
        }
    }

    #[test]
    fn low_fanout_routes_first() {
        let interner = Interner::new();
        let (map, graph) = placed_chain_map(&interner);
        let channels = build_channels(&map, &graph, &interner).unwrap();
        // edge 1 (b→c, fanout 1) sorts before edge 0 (a→{b,c}, fanout 2)
        assert_eq!(channels[0].edge_index, 1);
        assert_eq!(channels[1].edge_index, 0);
    }

    #[test]
    fn unplaced_task_is_an_error() {
        let interner = Interner::new();
        let (mut map, graph) = placed_chain_map(&interner);
        map.placement.shift_remove(&interner.get_or_intern("b"));
        assert!(build_channels(&map, &graph, &interner).is_err());
    }

    #[test]
    fn needs_routing_false_is_skipped() {
        let interner = Interner::new();
        struct NoRoutes;
        impl RuleSet for NoRoutes {
            fn needs_routing(&self, _: &TaskEdge) -> bool {
                false
            }
            fn is_mappable(&self, c: &mosaic_arch::Component) -> bool {
                c.is_primitive()
            }
        }
        let top = testutil::chain_fabric(&interner, 2, &[]);
        let tasks = testutil::tasks_of(
            &interner,
            &[("a", "alu"), ("b", "alu")],
            &[(&["a"], &["b"])],
        );
        let map = Map::new(top, tasks, std::sync::Arc::new(NoRoutes));
        let graph = RoutingGraph::build(&map.top);
        let channels = build_channels(&map, &graph, &interner).unwrap();
        assert!(channels.is_empty());
    }
}
