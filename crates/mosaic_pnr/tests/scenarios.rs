//! End-to-end mapping scenarios on small fabrics.

use mosaic_arch::{Address, Component, Direction, Link, Path, Port, TopLevel};
use mosaic_common::{Ident, Interner, Metadata};
use mosaic_diagnostics::DiagnosticSink;
use mosaic_pnr::placement::cost;
use mosaic_pnr::{
    metrics, place, route, Location, MoveGenerator, NodeId, PlaceOptions, PlacerState,
    RandomMoveGen, RouteOptions, RoutingStruct,
};
use mosaic_task::{Map, RuleSet, TaskEdge, TaskNode, Taskgraph};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// Oracle for the test fabrics: primitives are the slots, tasks partition
/// by "kind", "mem" tasks are special and live on `sram` primitives, and
/// self-edges carry no data.
struct GridRules {
    sram: Ident,
}

impl GridRules {
    fn new(interner: &Interner) -> Arc<Self> {
        Arc::new(Self {
            sram: interner.get_or_intern("sram"),
        })
    }
}

impl RuleSet for GridRules {
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

    fn needs_routing(&self, edge: &TaskEdge) -> bool {
        edge.sources != edge.sinks
    }
}

/// One tile: boundary `in`/`out`, a `pe` primitive, a pass-through wire,
/// optionally an `sram` primitive.
fn make_tile(interner: &Interner, with_mem: bool) -> Component {
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
        let mem_name = interner.get_or_intern("mem");
        let mut mem = Component::primitive(mem_name, interner.get_or_intern("sram"));
        mem.add_port(Port::new(in0, Direction::Input)).unwrap();
        mem.add_port(Port::new(pout, Direction::Output)).unwrap();
        tile.add_child(mem).unwrap();
        tile.add_link(Link::new(
            interner.get_or_intern("w_min"),
            vec![Path::local(vec![inp])],
            vec![Path::local(vec![mem_name, in0])],
        ))
        .unwrap();
        tile.add_link(Link::new(
            interner.get_or_intern("w_mout"),
            vec![Path::local(vec![mem_name, pout])],
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

/// A `w×h` 2-D mesh with bidirectional neighbor links.
fn grid_fabric(interner: &Interner, w: i32, h: i32, mem_at: &[(i32, i32)]) -> TopLevel {
    let mut top = TopLevel::new(interner.get_or_intern("mesh"), 2);
    let inp = interner.get_or_intern("in");
    let out = interner.get_or_intern("out");
    for x in 0..w {
        for y in 0..h {
            top.add_tile(
                Address::new(vec![x, y]),
                make_tile(interner, mem_at.contains(&(x, y))),
            )
            .unwrap();
        }
    }
    let mut wire = 0usize;
    for x in 0..w {
        for y in 0..h {
            for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= w || ny >= h {
                    continue;
                }
                top.add_link(Link::new(
                    interner.get_or_intern(&format!("wire{wire}")),
                    vec![Path::global(Address::new(vec![x, y]), vec![out])],
                    vec![Path::global(Address::new(vec![nx, ny]), vec![inp])],
                ))
                .unwrap();
                wire += 1;
            }
        }
    }
    top
}

/// A 1-D chain with bidirectional neighbor links.
fn chain_fabric(interner: &Interner, n: i32) -> TopLevel {
    let mut top = TopLevel::new(interner.get_or_intern("chain"), 1);
    let inp = interner.get_or_intern("in");
    let out = interner.get_or_intern("out");
    for x in 0..n {
        top.add_tile(Address::new(vec![x]), make_tile(interner, false))
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

fn tasks_of(
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

fn quick_place(seed: u64) -> PlaceOptions {
    PlaceOptions {
        seed: Some(seed),
        move_attempts: 200,
        ..PlaceOptions::default()
    }
}

// S1: a singleton fabric with one task and a dataless self-edge maps at
// zero cost and routes vacuously.
#[test]
fn singleton_grid_maps_at_zero_cost() {
    let interner = Interner::new();
    let top = chain_fabric(&interner, 1);
    let tasks = tasks_of(&interner, &[("only", "alu")], &[(&["only"], &["only"])]);
    let mut map = Map::new(top, tasks, GridRules::new(&interner));
    let sink = DiagnosticSink::new();

    place(&mut map, quick_place(1), &interner, &sink).unwrap();
    route(&mut map, RouteOptions::default(), &interner, &sink).unwrap();

    assert_eq!(map.metadata.get_f64(metrics::PLACEMENT_OBJECTIVE), Some(0.0));
    assert_eq!(map.metadata.get_bool(metrics::ROUTING_PASSED), Some(true));
    assert_eq!(map.metadata.get_bool(metrics::ROUTING_ERROR), Some(false));
    assert!(map.routes.is_empty());
}

// S2: two interchangeable tasks on two tiles; every legal placement has
// the same channel cost, the hop distance between the tiles.
#[test]
fn two_tile_swap_objective_is_one_hop() {
    let interner = Interner::new();
    let top = chain_fabric(&interner, 2);
    let tasks = tasks_of(
        &interner,
        &[("a", "alu"), ("b", "alu")],
        &[(&["a"], &["b"])],
    );
    let mut map = Map::new(top, tasks, GridRules::new(&interner));
    let sink = DiagnosticSink::new();

    place(&mut map, quick_place(5), &interner, &sink).unwrap();
    assert_eq!(map.metadata.get_f64(metrics::PLACEMENT_OBJECTIVE), Some(1.0));
    assert!(map.is_fully_placed());
}

// S3: two channels forced through the single middle wire of a 4-chain.
// The router must report failure, and the contested vertex's history cost
// strictly increases with every extra iteration.
#[test]
fn forced_congestion_fails_with_growing_history() {
    let interner = Interner::new();
    let build_map = || {
        let top = chain_fabric(&interner, 4);
        let tasks = tasks_of(
            &interner,
            &[("a", "alu"), ("b", "alu"), ("c", "alu"), ("d", "alu")],
            &[(&["a"], &["c"]), (&["b"], &["d"])],
        );
        let mut map = Map::new(top, tasks, GridRules::new(&interner));
        let pe = interner.get_or_intern("pe");
        for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
            map.placement.insert(
                interner.get_or_intern(name),
                Path::global(Address::new(vec![i as i32]), vec![pe]),
            );
        }
        map
    };

    let mut map = build_map();
    let sink = DiagnosticSink::new();
    route(
        &mut map,
        RouteOptions {
            max_iterations: 8,
            ..RouteOptions::default()
        },
        &interner,
        &sink,
    )
    .unwrap();
    assert_eq!(map.metadata.get_bool(metrics::ROUTING_PASSED), Some(false));
    assert_eq!(map.metadata.get_bool(metrics::ROUTING_ERROR), Some(true));

    // history on the middle tile's exit port grows with the iteration count
    let history_after = |iterations: usize| {
        let map = build_map();
        let opts = RouteOptions {
            max_iterations: iterations,
            ..RouteOptions::default()
        };
        let mut rs = RoutingStruct::build(&map, &opts, &interner).unwrap();
        rs.run(&map, &opts, &DiagnosticSink::new());
        let contested = rs
            .graph
            .index_of(&Path::global(
                Address::new(vec![1]),
                vec![interner.get_or_intern("out")],
            ))
            .unwrap();
        rs.links.link(contested).history_cost
    };
    let hist: Vec<f64> = (1..=4).map(history_after).collect();
    assert!(hist[0] > 0.0);
    assert!(hist.windows(2).all(|w| w[1] > w[0]), "history {hist:?}");
}

// S4: a fanout of three routes as a tree sharing prefix vertices, using
// strictly fewer vertices than three independently routed sinks.
#[test]
fn fanout_of_three_shares_tree_vertices() {
    let interner = Interner::new();
    let pe = interner.get_or_intern("pe");
    let seats = [
        ("src", (0, 0)),
        ("s1", (0, 1)),
        ("s2", (1, 0)),
        ("s3", (1, 1)),
    ];

    let routed_verts = |edges: &[(&[&str], &[&str])]| -> usize {
        let top = grid_fabric(&interner, 2, 2, &[]);
        let tasks = tasks_of(
            &interner,
            &[
                ("src", "alu"),
                ("s1", "alu"),
                ("s2", "alu"),
                ("s3", "alu"),
            ],
            edges,
        );
        let mut map = Map::new(top, tasks, GridRules::new(&interner));
        for (name, (x, y)) in seats {
            map.placement.insert(
                interner.get_or_intern(name),
                Path::global(Address::new(vec![x, y]), vec![pe]),
            );
        }
        let sink = DiagnosticSink::new();
        route(&mut map, RouteOptions::default(), &interner, &sink).unwrap();
        assert_eq!(map.metadata.get_bool(metrics::ROUTING_PASSED), Some(true));
        map.routes.values().map(Vec::len).sum()
    };

    let tree = routed_verts(&[(&["src"], &["s1", "s2", "s3"])]);
    let independent = routed_verts(&[(&["src"], &["s1"])])
        + routed_verts(&[(&["src"], &["s2"])])
        + routed_verts(&[(&["src"], &["s3"])]);
    assert!(
        tree < independent,
        "tree {tree} should share vertices ({independent} independent)"
    );
}

// S5: a special task with a two-address whitelist on a 4×4 mesh. Move
// proposals never leave the whitelist, and with address costs enabled the
// objective is the cheaper of the two whitelist addresses.
#[test]
fn special_class_sticks_to_whitelist() {
    let interner = Interner::new();
    let w1 = Address::new(vec![0, 3]);
    let w2 = Address::new(vec![3, 0]);

    let top = grid_fabric(&interner, 4, 4, &[(0, 3), (3, 0)]);
    let tasks = tasks_of(&interner, &[("m", "mem"), ("a", "alu")], &[]);
    let mut map = Map::new(top, tasks, GridRules::new(&interner));

    // every proposal for the special task stays on the whitelist
    let mut state = PlacerState::build(&map, true, false, None, None, &interner).unwrap();
    let space = state.distance.space().clone();
    let w1_idx = space.index(&w1).unwrap() as u32;
    let w2_idx = space.index(&w2).unwrap() as u32;
    let m = NodeId::from_raw(0);
    let m_class = state.get_class(m);
    let slot = state.maptable.valid_slots(m_class, w1_idx as usize)[0];
    state.assign(m, Location::new(w1_idx, slot));
    let mut rng = StdRng::seed_from_u64(13);
    let mut movegen = RandomMoveGen::new();
    for _ in 0..200 {
        let loc = movegen.propose(&mut rng, &state, m, 8).unwrap();
        assert!(loc.addr == w1_idx || loc.addr == w2_idx);
    }

    // with address costs on, the annealer parks the task on the cheaper
    // whitelist address
    let sink = DiagnosticSink::new();
    place(
        &mut map,
        PlaceOptions {
            seed: Some(3),
            move_attempts: 200,
            enable_address: true,
            address_costs: Some(vec![(w1.clone(), 7.0), (w2.clone(), 3.0)]),
            ..PlaceOptions::default()
        },
        &interner,
        &sink,
    )
    .unwrap();
    assert_eq!(map.metadata.get_f64(metrics::PLACEMENT_OBJECTIVE), Some(3.0));
    let m_path = map
        .location_of(interner.get_or_intern("m"))
        .unwrap()
        .clone();
    assert_eq!(m_path.address, Some(w2));
}

// S6: the same fabric mapped with and without the flat table regime
// produces, for a fixed seed, identical objectives and addresses.
#[test]
fn flat_and_slotted_regimes_agree() {
    let interner = Interner::new();
    let run = |enable_flatness: bool| {
        let top = chain_fabric(&interner, 5);
        let tasks = tasks_of(
            &interner,
            &[("a", "alu"), ("b", "alu"), ("c", "alu")],
            &[(&["a"], &["b"]), (&["b"], &["c"])],
        );
        let mut map = Map::new(top, tasks, GridRules::new(&interner));
        let sink = DiagnosticSink::new();
        place(
            &mut map,
            PlaceOptions {
                seed: Some(21),
                move_attempts: 200,
                enable_flatness,
                ..PlaceOptions::default()
            },
            &interner,
            &sink,
        )
        .unwrap();
        let addrs: Vec<Option<Address>> = map
            .placement
            .values()
            .map(|p| p.address.clone())
            .collect();
        (
            addrs,
            map.metadata.get_f64(metrics::PLACEMENT_OBJECTIVE).unwrap(),
        )
    };
    assert_eq!(run(true), run(false));
}

// Round-trip law: a double swap restores locations, grid and total cost
// exactly.
#[test]
fn double_swap_is_identity() {
    let interner = Interner::new();
    let top = chain_fabric(&interner, 4);
    let tasks = tasks_of(
        &interner,
        &[("a", "alu"), ("b", "alu"), ("c", "alu")],
        &[(&["a"], &["b", "c"])],
    );
    let map = Map::new(top, tasks, GridRules::new(&interner));
    let mut state = PlacerState::build(&map, true, false, None, None, &interner).unwrap();
    for (i, addr) in [0u32, 2, 3].iter().enumerate() {
        state.assign(NodeId::from_raw(i as u32), Location::new(*addr, 0));
    }

    let before_locs: Vec<Location> = state.nodes.iter().map(|n| n.loc).collect();
    let before_cost = cost::total_cost(&state);
    let (i, j) = (NodeId::from_raw(0), NodeId::from_raw(2));
    state.swap(i, j);
    state.swap(i, j);

    let after_locs: Vec<Location> = state.nodes.iter().map(|n| n.loc).collect();
    assert_eq!(before_locs, after_locs);
    assert_eq!(before_cost, cost::total_cost(&state));
    for (idx, loc) in after_locs.iter().enumerate() {
        assert_eq!(state.node_at(*loc), Some(NodeId::from_raw(idx as u32)));
    }
}

// Determinism: identical seeds yield identical placements and objectives
// end to end.
#[test]
fn identical_seeds_identical_results() {
    let interner = Interner::new();
    let run = || {
        let top = grid_fabric(&interner, 3, 3, &[]);
        let tasks = tasks_of(
            &interner,
            &[("a", "alu"), ("b", "alu"), ("c", "alu"), ("d", "alu")],
            &[(&["a"], &["b"]), (&["b"], &["c", "d"])],
        );
        let mut map = Map::new(top, tasks, GridRules::new(&interner));
        let sink = DiagnosticSink::new();
        place(&mut map, quick_place(77), &interner, &sink).unwrap();
        let placement: Vec<Path> = map.placement.values().cloned().collect();
        (
            placement,
            map.metadata.get_f64(metrics::PLACEMENT_OBJECTIVE).unwrap(),
        )
    };
    assert_eq!(run(), run());
}
