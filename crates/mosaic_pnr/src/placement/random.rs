//! Random initial placement.
//!
//! Seats every node on a uniformly drawn free legal location before
//! annealing begins. Nodes are seated in task-graph order under the shared
//! seeded RNG, so the initial placement is part of the reproducible
//! trajectory.

use crate::ids::NodeId;
use crate::placement::state::{Location, PlacerState};
use mosaic_common::{Interner, MappingError, MosaicResult};
use rand::rngs::StdRng;
use rand::Rng;

/// Seats every unplaced node on a random free legal location.
///
/// Fails with [`MappingError::PlacementInfeasible`] when a node has no free
/// legal location left — for example a special class whose whitelist is
/// exhausted, or more tasks of a class than slots accepting it.
pub(crate) fn initial_placement(
    state: &mut PlacerState,
    rng: &mut StdRng,
    interner: &Interner,
) -> MosaicResult<()> {
    let mut candidates: Vec<Location> = Vec::new();
    for i in 0..state.node_count() {
        let node = NodeId::from_raw(i as u32);
        if state.location(node).is_placed() {
            continue;
        }
        let class = state.get_class(node);
        candidates.clear();
        for &addr in state.maptable.addresses(class) {
            for &slot in state.maptable.valid_slots(class, addr as usize) {
                let loc = Location::new(addr, slot);
                if state.node_at(loc).is_none() {
                    candidates.push(loc);
                }
            }
        }
        if candidates.is_empty() {
            return Err(MappingError::PlacementInfeasible(format!(
                "no free legal location for task '{}'",
                interner.resolve(state.nodes[i].name)
            )));
        }
        let loc = candidates[rng.gen_range(0..candidates.len())];
        state.assign(node, loc);
    }
    Ok(())
}
