//! Placement cost model.
//!
//! Channel cost is the precomputed hop distance between endpoint addresses
//! (summed over all source/sink pairs for multi-endpoint channels). Node and
//! node-pair costs are the incremental quantities the annealer compares
//! before and after a trial move; the pair variant omits channels shared by
//! both nodes from the second sum so swap deltas are exact.

use crate::ids::{ChannelId, NodeId};
use crate::placement::state::{PlacerState, SaChannel};

/// An optional global cost term evaluated on the full placement state.
///
/// Only called in full-map contexts (per-round totals and move deltas that
/// re-evaluate the whole term); implementations must not cache state.
pub trait AuxCost: Send {
    /// The current value of the term.
    fn cost(&self, state: &PlacerState) -> f64;
}

/// The hop-distance cost of one channel.
///
/// A two-point channel costs `D[addr(src), addr(dst)]`; a multi-point
/// channel costs the sum over the Cartesian product of source and sink
/// addresses. Distances may be asymmetric. Unreachable pairs contribute
/// the unreachable sentinel value, which dominates any real distance.
pub fn channel_cost(state: &PlacerState, channel: ChannelId) -> f64 {
    match &state.channels[channel.index()] {
        SaChannel::Two { src, dst } => {
            let a = state.location(*src).addr as usize;
            let b = state.location(*dst).addr as usize;
            state.distance.hops_idx(a, b) as f64
        }
        SaChannel::Multi { srcs, sinks } => {
            let mut sum = 0.0;
            for &s in srcs {
                let a = state.location(s).addr as usize;
                for &t in sinks {
                    let b = state.location(t).addr as usize;
                    sum += state.distance.hops_idx(a, b) as f64;
                }
            }
            sum
        }
    }
}

/// The per-location penalty of a node's current location (zero when the
/// address-cost table is disabled).
pub fn address_cost(state: &PlacerState, node: NodeId) -> f64 {
    let Some(table) = &state.address_cost else {
        return 0.0;
    };
    let loc = state.location(node);
    table[loc.addr as usize * state.grid.slots_per_addr() + loc.slot as usize]
}

/// The global auxiliary term, zero when absent.
pub fn aux_cost(state: &PlacerState) -> f64 {
    state.aux.as_ref().map(|a| a.cost(state)).unwrap_or(0.0)
}

/// The cost attributable to one node: its outgoing and incoming channels,
/// its address penalty, and the auxiliary term.
pub fn node_cost(state: &PlacerState, node: NodeId) -> f64 {
    let n = &state.nodes[node.index()];
    let mut cost = 0.0;
    for &c in &n.out_channels {
        cost += channel_cost(state, c);
    }
    for &c in &n.in_channels {
        cost += channel_cost(state, c);
    }
    cost + address_cost(state, node) + aux_cost(state)
}

/// The cost attributable to a pair of nodes.
///
/// Counts all of `i`'s channels, then `j`'s channels except those already
/// counted through `i` — in particular the channels connecting the two —
/// so that `pair_cost_after − pair_cost_before` equals the true map-cost
/// delta of a swap. The auxiliary term is included once.
pub fn node_pair_cost(state: &PlacerState, i: NodeId, j: NodeId) -> f64 {
    let ni = &state.nodes[i.index()];
    let nj = &state.nodes[j.index()];
    let mut cost = 0.0;
    for &c in ni.out_channels.iter().chain(&ni.in_channels) {
        cost += channel_cost(state, c);
    }
    for &c in nj.out_channels.iter().chain(&nj.in_channels) {
        if ni.out_channels.contains(&c) || ni.in_channels.contains(&c) {
            continue;
        }
        cost += channel_cost(state, c);
    }
    cost + address_cost(state, i) + address_cost(state, j) + aux_cost(state)
}

/// The total map cost: every channel once, every address penalty, plus the
/// auxiliary term. This is the placement objective.
pub fn total_cost(state: &PlacerState) -> f64 {
    let mut cost = 0.0;
    for c in 0..state.channels.len() {
        cost += channel_cost(state, ChannelId::from_raw(c as u32));
    }
    for n in 0..state.nodes.len() {
        cost += address_cost(state, NodeId::from_raw(n as u32));
    }
    cost + aux_cost(state)
}
