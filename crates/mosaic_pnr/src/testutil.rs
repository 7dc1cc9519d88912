//! Shared builders for unit tests: a small linear fabric and task graphs.

use crate::placement::cost::AuxCost;
use crate::placement::state::PlacerState;
use mosaic_arch::{Address, Component, Direction, Link, Path, Port, TopLevel};
use mosaic_common::{Ident, Interner, Metadata};
use mosaic_task::{Map, RuleSet, TaskEdge, TaskNode, Taskgraph};
use std::sync::Arc;

/// Test oracle: primitives are the mappable slots; tasks partition by their
/// "kind" metadata; "mem" tasks are special and land only on `sram`-tagged
/// primitives, everything else avoids them.
pub(crate) struct PeRules {
    sram: Ident,
}

impl PeRules {
    pub(crate) fn new(interner: &Interner) -> Arc<Self> {
        Arc::new(Self {
            sram: interner.get_or_intern("sram"),
        })
    }
}

impl RuleSet for PeRules {
    fn is_mappable(&self, component: &Component) -> bool {
        component.is_primitive()
    }

    fn is_equivalent(&self, a: &TaskNode, b: &TaskNode) -> bool {
        a.metadata.get_str("kind") == b.metadata.get_str("kind")
    }

    fn is_special(&self, node: &TaskNode) -> bool {
        node.metadata.get_str("kind") == Some("mem")
    }

    fn can_map(&self, node: &TaskNode, component: &Component) -> bool {
        if node.metadata.get_str("kind") == Some("mem") {
            component.primitive == Some(self.sram)
        } else {
            component.primitive != Some(self.sram)
        }
    }
}

/// One tile: `in`/`out` boundary ports, a `pe` primitive, a pass-through
/// wire, and optionally an `sram` primitive.
pub(crate) fn make_tile(interner: &Interner, with_mem: bool) -> Component {
    let inp = interner.get_or_intern("in");
    let out = interner.get_or_intern("out");
    let pe = interner.get_or_intern("pe");
    let in0 = interner.get_or_intern("in0");
    let pout = interner.get_or_intern("out");

    let mut tile = Component::new(interner.get_or_intern("tile"));
    tile.add_port(Port::new(inp, Direction::Input)).unwrap();
    tile.add_port(Port::new(out, Direction::Output)).unwrap();

    let mut prim = Component::primitive(pe, interner.get_or_intern("alu"));
    prim.add_port(Port::new(in0, Direction::Input)).unwrap();
    prim.add_port(Port::new(pout, Direction::Output)).unwrap();
    tile.add_child(prim).unwrap();

    if with_mem {
        let mut mem = Component::primitive(
            interner.get_or_intern("mem"),
            interner.get_or_intern("sram"),
        );
        mem.add_port(Port::new(in0, Direction::Input)).unwrap();
        mem.add_port(Port::new(pout, Direction::Output)).unwrap();
        tile.add_child(mem).unwrap();
        tile.add_link(Link::new(
            interner.get_or_intern("w_min"),
            vec![Path::local(vec![inp])],
            vec![Path::local(vec![interner.get_or_intern("mem"), in0])],
        ))
        .unwrap();
        tile.add_link(Link::new(
            interner.get_or_intern("w_mout"),
            vec![Path::local(vec![interner.get_or_intern("mem"), pout])],
            vec![Path::local(vec![out])],
        ))
        .unwrap();
    }

    tile.add_link(Link::new(
        interner.get_or_intern("w_in"),
        vec![Path::local(vec![inp])],
        vec![Path::local(vec![pe, in0])],
    ))
    .unwrap();
    tile.add_link(Link::new(
        interner.get_or_intern("w_out"),
        vec![Path::local(vec![pe, pout])],
        vec![Path::local(vec![out])],
    ))
    .unwrap();
    tile.add_link(Link::new(
        interner.get_or_intern("thru"),
        vec![Path::local(vec![inp])],
        vec![Path::local(vec![out])],
    ))
    .unwrap();

    tile
}

/// A 1-D chain of tiles with bidirectional neighbor links. `mem_at` lists
/// the addresses that additionally carry an `sram` primitive.
pub(crate) fn chain_fabric(interner: &Interner, n: i32, mem_at: &[i32]) -> TopLevel {
    let mut top = TopLevel::new(interner.get_or_intern("chain"), 1);
    let inp = interner.get_or_intern("in");
    let out = interner.get_or_intern("out");
    for x in 0..n {
        top.add_tile(
            Address::new(vec![x]),
            make_tile(interner, mem_at.contains(&x)),
        )
        .unwrap();
    }
    for x in 0..n - 1 {
        top.add_link(Link::new(
            interner.get_or_intern(&format!("east{x}")),
            vec![Path::global(Address::new(vec![x]), vec![out])],
            vec![Path::global(Address::new(vec![x + 1]), vec![inp])],
        ))
        .unwrap();
        top.add_link(Link::new(
            interner.get_or_intern(&format!("west{x}")),
            vec![Path::global(Address::new(vec![x + 1]), vec![out])],
            vec![Path::global(Address::new(vec![x]), vec![inp])],
        ))
        .unwrap();
    }
    top
}

/// A task graph from `(name, kind)` pairs plus `(sources, sinks)` edges.
pub(crate) fn tasks_of(
    interner: &Interner,
    nodes: &[(&str, &str)],
    edges: &[(&[&str], &[&str])],
) -> Taskgraph {
    let mut g = Taskgraph::new(interner.get_or_intern("tasks"));
    for (name, kind) in nodes {
        let mut md = Metadata::new();
        md.set("kind", *kind);
        g.add_node(TaskNode::with_metadata(interner.get_or_intern(name), md))
            .unwrap();
    }
    for (sources, sinks) in edges {
        let srcs = sources.iter().map(|n| interner.get_or_intern(n)).collect();
        let snks = sinks.iter().map(|n| interner.get_or_intern(n)).collect();
        g.add_edge(TaskEdge::new(srcs, snks)).unwrap();
    }
    g
}

/// A chain fabric paired with all-"alu" tasks under [`PeRules`].
pub(crate) fn chain_map(
    interner: &Interner,
    n: i32,
    names: &[&str],
    edges: &[(&[&str], &[&str])],
) -> Map {
    let nodes: Vec<(&str, &str)> = names.iter().map(|n| (*n, "alu")).collect();
    chain_map_kinds(interner, n, &[], &nodes, edges)
}

/// A chain fabric with `sram` primitives at `mem_at`, paired with the given
/// `(name, kind)` tasks under [`PeRules`].
pub(crate) fn chain_map_kinds(
    interner: &Interner,
    n: i32,
    mem_at: &[i32],
    nodes: &[(&str, &str)],
    edges: &[(&[&str], &[&str])],
) -> Map {
    let top = chain_fabric(interner, n, mem_at);
    let graph = tasks_of(interner, nodes, edges);
    Map::new(top, graph, PeRules::new(interner))
}

pub(crate) fn build_state(map: &Map, interner: &Interner) -> PlacerState {
    PlacerState::build(map, true, false, None, None, interner).unwrap()
}

pub(crate) fn build_state_slotted(map: &Map, interner: &Interner) -> PlacerState {
    PlacerState::build(map, false, false, None, None, interner).unwrap()
}

pub(crate) fn build_state_with_address_costs(
    map: &Map,
    interner: &Interner,
    costs: &[(Address, f64)],
) -> PlacerState {
    PlacerState::build(map, true, true, Some(costs), None, interner).unwrap()
}

pub(crate) fn build_state_with_aux(
    map: &Map,
    interner: &Interner,
    aux: Box<dyn AuxCost>,
) -> PlacerState {
    PlacerState::build(map, true, false, None, Some(aux), interner).unwrap()
}
