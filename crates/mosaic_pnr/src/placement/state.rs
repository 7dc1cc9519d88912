//! Mutable placement state: nodes, channels, grid and lookup tables.

use crate::placement::cost::AuxCost;
use crate::distance::DistanceLut;
use crate::ids::{ChannelId, NodeId};
use crate::tables::{ClassTable, MapTable, PathTable};
use mosaic_arch::Address;
use mosaic_common::{Ident, Interner, MosaicResult};
use mosaic_task::Map;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A concrete slot: dense address index plus slot index within the address.
///
/// One location type serves both regimes; in the flat regime the slot is
/// always 0.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Location {
    /// Dense address index into the fabric's address space.
    pub addr: u32,
    /// Slot index into the path table entry at that address.
    pub slot: u16,
}

impl Location {
    /// The not-yet-seated sentinel.
    pub const UNPLACED: Location = Location {
        addr: u32::MAX,
        slot: u16::MAX,
    };

    /// Creates a location.
    pub fn new(addr: u32, slot: u16) -> Self {
        Self { addr, slot }
    }

    /// Returns `true` if this is a real location rather than the sentinel.
    pub fn is_placed(self) -> bool {
        self != Self::UNPLACED
    }
}

/// A placeable task in the annealer's working set.
#[derive(Clone, Debug)]
pub struct SaNode {
    /// The task name this node was created from.
    pub name: Ident,
    /// The node's equivalence class.
    pub class: u16,
    /// Current location, or [`Location::UNPLACED`].
    pub loc: Location,
    /// Channels this node drives.
    pub out_channels: Vec<ChannelId>,
    /// Channels this node consumes. A channel already present in
    /// `out_channels` is not repeated here, so per-node cost sums count
    /// each channel once.
    pub in_channels: Vec<ChannelId>,
}

/// A placement channel mirroring one task-graph edge.
#[derive(Clone, Debug)]
pub enum SaChannel {
    /// Point-to-point connection.
    Two {
        /// Driving node.
        src: NodeId,
        /// Consuming node.
        dst: NodeId,
    },
    /// Multi-source, multi-sink connection.
    Multi {
        /// Driving nodes.
        srcs: Vec<NodeId>,
        /// Consuming nodes.
        sinks: Vec<NodeId>,
    },
}

/// Slot-occupancy array indexed by location.
///
/// A cell holds 0 when empty, otherwise the occupying node index plus one.
#[derive(Clone, Debug)]
pub struct Grid {
    cells: Vec<u32>,
    slots_per_addr: usize,
}

impl Grid {
    /// Creates an empty grid.
    pub fn new(addr_count: usize, slots_per_addr: usize) -> Self {
        let slots_per_addr = slots_per_addr.max(1);
        Self {
            cells: vec![0; addr_count * slots_per_addr],
            slots_per_addr,
        }
    }

    fn cell(&self, loc: Location) -> usize {
        loc.addr as usize * self.slots_per_addr + loc.slot as usize
    }

    /// Returns the node occupying `loc`, if any.
    pub fn get(&self, loc: Location) -> Option<NodeId> {
        match self.cells[self.cell(loc)] {
            0 => None,
            n => Some(NodeId::from_raw(n - 1)),
        }
    }

    /// Sets or clears the occupant of `loc`.
    pub fn set(&mut self, loc: Location, node: Option<NodeId>) {
        let cell = self.cell(loc);
        self.cells[cell] = match node {
            None => 0,
            Some(n) => n.as_raw() + 1,
        };
    }

    /// The number of slots per address the grid was sized with.
    pub fn slots_per_addr(&self) -> usize {
        self.slots_per_addr
    }

    /// Iterates over occupied `(location, node)` pairs.
    pub fn occupied(&self) -> impl Iterator<Item = (Location, NodeId)> + '_ {
        self.cells.iter().enumerate().filter_map(|(i, &c)| {
            if c == 0 {
                return None;
            }
            let loc = Location::new(
                (i / self.slots_per_addr) as u32,
                (i % self.slots_per_addr) as u16,
            );
            Some((loc, NodeId::from_raw(c - 1)))
        })
    }

    /// Approximate heap footprint in bytes.
    pub fn approx_bytes(&self) -> usize {
        self.cells.capacity() * std::mem::size_of::<u32>()
    }
}

/// Everything the annealer reads and mutates.
///
/// All mutation routes through [`assign`](PlacerState::assign),
/// [`move_node`](PlacerState::move_node) and [`swap`](PlacerState::swap),
/// which keep the grid synchronized with node locations.
pub struct PlacerState {
    /// Placement nodes, index-parallel to the task graph's node order.
    pub nodes: Vec<SaNode>,
    /// Channels, index-parallel to the task graph's edge list.
    pub channels: Vec<SaChannel>,
    /// Task equivalence classes.
    pub classes: ClassTable,
    /// Per-class legality tables.
    pub maptable: MapTable,
    /// All-pairs hop distances.
    pub distance: DistanceLut,
    /// Per-address mappable slot paths.
    pub path_table: PathTable,
    /// Slot occupancy.
    pub grid: Grid,
    /// Dense address index → address, cached so hot-loop radius checks
    /// never materialize coordinates.
    pub addresses: Vec<Address>,
    /// Optional per-location penalty table, indexed like the grid.
    pub address_cost: Option<Vec<f64>>,
    /// Optional global cost term evaluated on the full state.
    pub aux: Option<Box<dyn AuxCost>>,
}

impl PlacerState {
    /// Builds the placement state from a map. Nodes start unseated.
    pub fn build(
        map: &Map,
        enable_flatness: bool,
        enable_address: bool,
        address_costs: Option<&[(Address, f64)]>,
        aux: Option<Box<dyn AuxCost>>,
        interner: &Interner,
    ) -> MosaicResult<Self> {
        let rules = map.rules();
        let space = map.top.address_space();
        let distance = DistanceLut::build(&map.top);
        let path_table = PathTable::build(&map.top, rules, &space);
        let classes = ClassTable::build(&map.tasks, rules);
        let maptable = MapTable::build(
            &map.top,
            &path_table,
            &classes,
            &map.tasks,
            rules,
            &space,
            enable_flatness,
            interner,
        )?;

        let mut nodes: Vec<SaNode> = map
            .tasks
            .nodes()
            .enumerate()
            .map(|(i, n)| SaNode {
                name: n.name,
                class: classes.class_of[i],
                loc: Location::UNPLACED,
                out_channels: Vec::new(),
                in_channels: Vec::new(),
            })
            .collect();
        let node_index: HashMap<Ident, NodeId> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.name, NodeId::from_raw(i as u32)))
            .collect();

        let mut channels = Vec::with_capacity(map.tasks.edges().len());
        for (ci, edge) in map.tasks.edges().iter().enumerate() {
            let cid = ChannelId::from_raw(ci as u32);
            let srcs: Vec<NodeId> = edge.sources.iter().map(|n| node_index[n]).collect();
            let sinks: Vec<NodeId> = edge.sinks.iter().map(|n| node_index[n]).collect();
            for &s in &srcs {
                let list = &mut nodes[s.index()].out_channels;
                if !list.contains(&cid) {
                    list.push(cid);
                }
            }
            for &s in &sinks {
                let node = &mut nodes[s.index()];
                if !node.out_channels.contains(&cid) && !node.in_channels.contains(&cid) {
                    node.in_channels.push(cid);
                }
            }
            let channel = if srcs.len() == 1 && sinks.len() == 1 {
                SaChannel::Two {
                    src: srcs[0],
                    dst: sinks[0],
                }
            } else {
                SaChannel::Multi { srcs, sinks }
            };
            channels.push(channel);
        }

        let addresses: Vec<Address> = (0..space.len()).map(|i| space.address(i)).collect();
        let grid = Grid::new(space.len(), path_table.max_slots());

        let address_cost = if enable_address {
            let spa = path_table.max_slots().max(1);
            let mut table = vec![0.0; space.len() * spa];
            if let Some(costs) = address_costs {
                for (addr, cost) in costs {
                    if let Some(ai) = space.index(addr) {
                        for s in 0..spa {
                            table[ai * spa + s] = *cost;
                        }
                    }
                }
            }
            Some(table)
        } else {
            None
        };

        Ok(Self {
            nodes,
            channels,
            classes,
            maptable,
            distance,
            path_table,
            grid,
            addresses,
            address_cost,
            aux,
        })
    }

    /// Seats a node on an empty location.
    ///
    /// # Panics
    ///
    /// Panics if the node is already seated or the location is occupied.
    pub fn assign(&mut self, i: NodeId, loc: Location) {
        assert!(!self.nodes[i.index()].loc.is_placed());
        assert!(self.grid.get(loc).is_none());
        self.nodes[i.index()].loc = loc;
        self.grid.set(loc, Some(i));
    }

    /// Relocates a seated node to an empty location.
    pub fn move_node(&mut self, i: NodeId, loc: Location) {
        debug_assert!(self.grid.get(loc).is_none());
        let old = self.nodes[i.index()].loc;
        self.grid.set(old, None);
        self.nodes[i.index()].loc = loc;
        self.grid.set(loc, Some(i));
    }

    /// Exchanges the locations of two seated nodes.
    pub fn swap(&mut self, i: NodeId, j: NodeId) {
        let li = self.nodes[i.index()].loc;
        let lj = self.nodes[j.index()].loc;
        self.nodes[i.index()].loc = lj;
        self.nodes[j.index()].loc = li;
        self.grid.set(lj, Some(i));
        self.grid.set(li, Some(j));
    }

    /// The current location of a node.
    pub fn location(&self, i: NodeId) -> Location {
        self.nodes[i.index()].loc
    }

    /// The class of a node.
    pub fn get_class(&self, i: NodeId) -> u16 {
        self.nodes[i.index()].class
    }

    /// The node occupying a location, if any.
    pub fn node_at(&self, loc: Location) -> Option<NodeId> {
        self.grid.get(loc)
    }

    /// The number of placement nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The largest finite hop distance of the fabric.
    pub fn max_hop(&self) -> u16 {
        self.distance.max_hop()
    }

    /// Approximate heap footprint in bytes.
    pub fn approx_bytes(&self) -> usize {
        let nodes: usize = self
            .nodes
            .iter()
            .map(|n| {
                std::mem::size_of::<SaNode>()
                    + (n.out_channels.capacity() + n.in_channels.capacity())
                        * std::mem::size_of::<ChannelId>()
            })
            .sum();
        nodes
            + self.channels.capacity() * std::mem::size_of::<SaChannel>()
            + self.distance.approx_bytes()
            + self.path_table.approx_bytes()
            + self.maptable.approx_bytes()
            + self.grid.approx_bytes()
            + self.addresses.capacity() * std::mem::size_of::<Address>()
            + self
                .address_cost
                .as_ref()
                .map(|t| t.capacity() * std::mem::size_of::<f64>())
                .unwrap_or(0)
    }
}
