//! Move generators: sampling candidate target locations for trial moves.

use crate::ids::NodeId;
use crate::placement::state::{Location, PlacerState};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::HashMap;

/// A strategy producing candidate locations for a node within the current
/// move radius.
///
/// Returning `None` means the node has no legal destination inside the
/// radius; the driver counts the trial as a non-move.
pub trait MoveGenerator: Send {
    /// Proposes a target location for `node`, or `None`.
    fn propose(
        &mut self,
        rng: &mut StdRng,
        state: &PlacerState,
        node: NodeId,
        radius: u16,
    ) -> Option<Location>;
}

fn pick_slot(rng: &mut StdRng, state: &PlacerState, class: u16, addr: u32) -> Option<Location> {
    let slots = state.maptable.valid_slots(class, addr as usize);
    match slots.len() {
        0 => None,
        // single valid slot: no draw, keeping the RNG stream identical
        // between the flat and slotted table representations
        1 => Some(Location::new(addr, slots[0])),
        n => Some(Location::new(addr, slots[rng.gen_range(0..n)])),
    }
}

fn eligible(state: &PlacerState, class: u16, from: u32, radius: u16, out: &mut Vec<u32>) {
    out.clear();
    let cur = &state.addresses[from as usize];
    for &a in state.maptable.addresses(class) {
        if state.addresses[a as usize].chebyshev(cur) <= radius as u32 {
            out.push(a);
        }
    }
}

/// Uncached generator: enumerates the eligible addresses on every call.
///
/// Normal classes draw uniformly from the class-valid addresses inside the
/// radius ball; special classes draw from their explicit address vector
/// masked by the same radius. Both report "no move" on an empty candidate
/// set.
pub struct RandomMoveGen {
    scratch: Vec<u32>,
}

impl RandomMoveGen {
    /// Creates the generator.
    pub fn new() -> Self {
        Self {
            scratch: Vec::new(),
        }
    }
}

impl Default for RandomMoveGen {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveGenerator for RandomMoveGen {
    fn propose(
        &mut self,
        rng: &mut StdRng,
        state: &PlacerState,
        node: NodeId,
        radius: u16,
    ) -> Option<Location> {
        let class = state.get_class(node);
        let cur = state.location(node);
        eligible(state, class, cur.addr, radius, &mut self.scratch);
        if self.scratch.is_empty() {
            return None;
        }
        let addr = self.scratch[rng.gen_range(0..self.scratch.len())];
        pick_slot(rng, state, class, addr)
    }
}

/// Caching generator: memoizes the eligible-address list per
/// `(class, current address)` for the radius it was computed at.
///
/// The whole cache is dropped whenever the effective radius changes, in
/// particular when the limiter shrinks it below the cached value; entries
/// computed at a larger radius would otherwise leak illegal candidates.
pub struct CachedMoveGen {
    cache: HashMap<(u16, u32), Vec<u32>>,
    cached_radius: Option<u16>,
    scratch: Vec<u32>,
}

impl CachedMoveGen {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            cached_radius: None,
            scratch: Vec::new(),
        }
    }

    /// Number of memoized candidate lists.
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

impl Default for CachedMoveGen {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveGenerator for CachedMoveGen {
    fn propose(
        &mut self,
        rng: &mut StdRng,
        state: &PlacerState,
        node: NodeId,
        radius: u16,
    ) -> Option<Location> {
        if self.cached_radius != Some(radius) {
            self.cache.clear();
            self.cached_radius = Some(radius);
        }
        let class = state.get_class(node);
        let cur = state.location(node);
        let key = (class, cur.addr);
        if !self.cache.contains_key(&key) {
            eligible(state, class, cur.addr, radius, &mut self.scratch);
            self.cache.insert(key, self.scratch.clone());
        }
        let list = &self.cache[&key];
        if list.is_empty() {
            return None;
        }
        let addr = list[rng.gen_range(0..list.len())];
        pick_slot(rng, state, class, addr)
    }
}
