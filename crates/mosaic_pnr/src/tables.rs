//! Slot and legality tables consumed by the placement hot loop.
//!
//! [`PathTable`] enumerates, per tile address, the mappable component paths
//! inside that tile. [`ClassTable`] partitions tasks into equivalence
//! classes. [`MapTable`] stores, per class, where that class may land — a
//! bit-mask over addresses in the flat regime, per-address slot-index lists
//! otherwise.

use bitvec::vec::BitVec;
use mosaic_arch::{AddressSpace, ArchRef, Component, Path, TopLevel};
use mosaic_common::{Ident, Interner, MappingError, MosaicResult};
use mosaic_task::{RuleSet, Taskgraph};
use std::collections::HashMap;

static SLOT_ZERO: [u16; 1] = [0];

/// Per-address ordered lists of mappable component paths.
///
/// Identical tiles produce identical lists; the table interns them through a
/// shared pool so a large homogeneous fabric stores each list once.
#[derive(Clone, Debug)]
pub struct PathTable {
    pool: Vec<Vec<Path>>,
    by_addr: Vec<Option<u32>>,
    max_slots: usize,
}

impl PathTable {
    /// Walks every tile and collects its mappable component paths in DFS
    /// preorder, filtered by `is_mappable`.
    pub fn build(top: &TopLevel, rules: &dyn RuleSet, space: &AddressSpace) -> Self {
        let mut pool: Vec<Vec<Path>> = Vec::new();
        let mut pool_index: HashMap<Vec<Path>, u32> = HashMap::new();
        let mut by_addr = vec![None; space.len()];
        let mut max_slots = 0usize;

        for (address, tile) in top.tiles() {
            let Some(ai) = space.index(address) else {
                continue;
            };
            let mut slots = Vec::new();
            let base = Path::global(address.clone(), Vec::new());
            collect_mappable(tile, &base, rules, &mut slots);
            max_slots = max_slots.max(slots.len());
            let pi = *pool_index.entry(slots.clone()).or_insert_with(|| {
                pool.push(slots);
                (pool.len() - 1) as u32
            });
            by_addr[ai] = Some(pi);
        }

        Self {
            pool,
            by_addr,
            max_slots,
        }
    }

    /// The mappable component paths at a dense address index.
    pub fn slots(&self, addr: usize) -> &[Path] {
        match self.by_addr.get(addr).copied().flatten() {
            Some(pi) => &self.pool[pi as usize],
            None => &[],
        }
    }

    /// The path of one slot, if it exists.
    pub fn slot(&self, addr: usize, slot: u16) -> Option<&Path> {
        self.slots(addr).get(slot as usize)
    }

    /// The largest slot count over all addresses.
    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    /// Number of distinct slot lists in the pool.
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Approximate heap footprint in bytes.
    pub fn approx_bytes(&self) -> usize {
        let pool: usize = self
            .pool
            .iter()
            .map(|v| v.capacity() * std::mem::size_of::<Path>())
            .sum();
        pool + self.by_addr.capacity() * std::mem::size_of::<Option<u32>>()
    }
}

fn collect_mappable(comp: &Component, path: &Path, rules: &dyn RuleSet, out: &mut Vec<Path>) {
    if rules.is_mappable(comp) {
        out.push(path.clone());
    }
    for child in comp.children() {
        collect_mappable(child, &path.child(child.name), rules, out);
    }
}

/// The partition of tasks into placement equivalence classes.
///
/// Special tasks (per `is_special`) are partitioned separately from normal
/// ones; a special task never shares a class with a normal task.
#[derive(Clone, Debug)]
pub struct ClassTable {
    /// Class of each task, indexed by task-graph node order.
    pub class_of: Vec<u16>,
    /// Representative task name per class.
    pub reps: Vec<Ident>,
    /// Whether each class is special.
    pub special: Vec<bool>,
}

impl ClassTable {
    /// Partitions the tasks of `graph` by `is_equivalent` and `is_special`.
    pub fn build(graph: &Taskgraph, rules: &dyn RuleSet) -> Self {
        let mut class_of = Vec::with_capacity(graph.node_count());
        let mut reps: Vec<Ident> = Vec::new();
        let mut special: Vec<bool> = Vec::new();

        for node in graph.nodes() {
            let node_special = rules.is_special(node);
            let found = (0..reps.len()).find(|&c| {
                special[c] == node_special
                    && rules.is_equivalent(node, graph.node(reps[c]).expect("rep exists"))
            });
            let class = match found {
                Some(c) => c,
                None => {
                    reps.push(node.name);
                    special.push(node_special);
                    reps.len() - 1
                }
            };
            class_of.push(class as u16);
        }

        Self {
            class_of,
            reps,
            special,
        }
    }

    /// The number of classes.
    pub fn len(&self) -> usize {
        self.reps.len()
    }

    /// Returns `true` if no tasks were partitioned.
    pub fn is_empty(&self) -> bool {
        self.reps.is_empty()
    }
}

/// Where one class may land.
#[derive(Clone, Debug)]
enum ClassSlots {
    /// Flat regime: one bit per address, slot index always 0.
    Flat(BitVec),
    /// Per-address sorted lists of valid slot indices.
    Slotted(Vec<Vec<u16>>),
}

/// Legal addresses and slots for one class.
#[derive(Clone, Debug)]
pub struct ClassEntry {
    slots: ClassSlots,
    /// Dense address indices with at least one valid slot. For special
    /// classes this doubles as the explicit address vector drawn from by
    /// the restricted move generator.
    addresses: Vec<u32>,
}

/// Per-class legality tables.
#[derive(Clone, Debug)]
pub struct MapTable {
    entries: Vec<ClassEntry>,
    flat: bool,
}

impl MapTable {
    /// Builds the legality tables for every class.
    ///
    /// The flat regime is entered when `enable_flatness` is set and no
    /// address holds more than one mappable slot. Fails if a populated
    /// class has an empty legal address set.
    pub fn build(
        top: &TopLevel,
        path_table: &PathTable,
        classes: &ClassTable,
        graph: &Taskgraph,
        rules: &dyn RuleSet,
        space: &AddressSpace,
        enable_flatness: bool,
        interner: &Interner,
    ) -> MosaicResult<Self> {
        let flat = enable_flatness && path_table.max_slots() <= 1;
        let k = space.len();
        let mut entries = Vec::with_capacity(classes.len());

        for (class, &rep_name) in classes.reps.iter().enumerate() {
            let rep = graph.node(rep_name).expect("rep exists");
            let mut addresses = Vec::new();
            let slots = if flat {
                let mut mask = BitVec::repeat(false, k);
                for addr in 0..k {
                    if let Some(path) = path_table.slot(addr, 0) {
                        if slot_accepts(top, path, rep, rules) {
                            mask.set(addr, true);
                            addresses.push(addr as u32);
                        }
                    }
                }
                ClassSlots::Flat(mask)
            } else {
                let mut lists = vec![Vec::new(); k];
                for (addr, list) in lists.iter_mut().enumerate() {
                    for (si, path) in path_table.slots(addr).iter().enumerate() {
                        if slot_accepts(top, path, rep, rules) {
                            list.push(si as u16);
                        }
                    }
                    if !list.is_empty() {
                        addresses.push(addr as u32);
                    }
                }
                ClassSlots::Slotted(lists)
            };

            let populated = classes.class_of.iter().any(|&c| c as usize == class);
            if populated && addresses.is_empty() {
                return Err(MappingError::Construction(format!(
                    "class of task '{}' has an empty mappable set",
                    interner.resolve(rep_name)
                )));
            }
            entries.push(ClassEntry { slots, addresses });
        }

        Ok(Self { entries, flat })
    }

    /// Returns `true` if the table is in the flat regime.
    pub fn is_flat(&self) -> bool {
        self.flat
    }

    /// The valid slot indices for a class at an address.
    pub fn valid_slots(&self, class: u16, addr: usize) -> &[u16] {
        match &self.entries[class as usize].slots {
            ClassSlots::Flat(mask) => {
                if mask[addr] {
                    &SLOT_ZERO
                } else {
                    &[]
                }
            }
            ClassSlots::Slotted(lists) => &lists[addr],
        }
    }

    /// Whether a class may occupy a specific slot.
    pub fn is_legal(&self, class: u16, addr: usize, slot: u16) -> bool {
        match &self.entries[class as usize].slots {
            ClassSlots::Flat(mask) => slot == 0 && mask[addr],
            ClassSlots::Slotted(lists) => lists[addr].contains(&slot),
        }
    }

    /// The dense address indices where a class has at least one valid slot.
    pub fn addresses(&self, class: u16) -> &[u32] {
        &self.entries[class as usize].addresses
    }

    /// Approximate heap footprint in bytes.
    pub fn approx_bytes(&self) -> usize {
        self.entries
            .iter()
            .map(|e| {
                let slots = match &e.slots {
                    ClassSlots::Flat(mask) => mask.capacity() / 8,
                    ClassSlots::Slotted(lists) => lists
                        .iter()
                        .map(|l| l.capacity() * std::mem::size_of::<u16>())
                        .sum(),
                };
                slots + e.addresses.capacity() * std::mem::size_of::<u32>()
            })
            .sum()
    }
}

fn slot_accepts(
    top: &TopLevel,
    path: &Path,
    node: &mosaic_task::TaskNode,
    rules: &dyn RuleSet,
) -> bool {
    match top.resolve(path) {
        Some(ArchRef::Component(comp)) => rules.can_map(node, comp),
        _ => false,
    }
}
