//! Per-vertex congestion state for negotiated congestion routing.
//!
//! Every routing vertex carries a [`RoutingLink`] record: capacity, the set
//! of channels currently occupying it, and the two Pathfinder penalty
//! terms. Present penalties are recomputed from live occupancy on every
//! cost query, so a channel routed later in a sweep observes the rip-ups
//! and installs of every earlier channel; history accumulates only at sweep
//! boundaries and never decreases.

use crate::routing::graph::{RoutingGraph, VertexKind};
use mosaic_task::RuleSet;
use std::collections::HashSet;

/// Congestion bookkeeping for one routing vertex.
#[derive(Clone, Debug)]
pub struct RoutingLink {
    /// How many channels may occupy the vertex simultaneously.
    pub capacity: u32,
    /// Channel indices currently routed through the vertex.
    pub occupants: HashSet<u32>,
    /// Accumulated penalty for past overuse; non-decreasing.
    pub history_cost: f64,
    /// Present penalty as of the last sweep-end update.
    pub present_penalty: f64,
}

impl RoutingLink {
    fn new(capacity: u32) -> Self {
        Self {
            capacity,
            occupants: HashSet::new(),
            history_cost: 0.0,
            present_penalty: 0.0,
        }
    }

    /// The number of occupying channels.
    pub fn occupancy(&self) -> u32 {
        self.occupants.len() as u32
    }

    /// Occupancy beyond capacity, zero when within it.
    pub fn overuse(&self) -> u32 {
        self.occupancy().saturating_sub(self.capacity)
    }

    /// Returns `true` when occupancy exceeds capacity.
    pub fn is_congested(&self) -> bool {
        self.occupancy() > self.capacity
    }
}

/// The table of per-vertex congestion records plus the sweep-global
/// penalty factors.
#[derive(Clone, Debug)]
pub struct LinkTable {
    links: Vec<RoutingLink>,
    pres_fac: f64,
    base_cost: f64,
    h_factor: f64,
    p_initial: f64,
    p_growth: f64,
}

impl LinkTable {
    /// Annotates every graph vertex: ports get capacity one, links ask the
    /// oracle.
    pub fn build(
        graph: &RoutingGraph,
        rules: &dyn RuleSet,
        base_cost: f64,
        h_factor: f64,
        p_initial: f64,
        p_growth: f64,
    ) -> Self {
        let links = (0..graph.len() as u32)
            .map(|v| {
                let capacity = match graph.vertex(v).kind {
                    VertexKind::Port { .. } => 1,
                    VertexKind::Link => {
                        graph.link_at(v).map(|l| rules.get_capacity(l)).unwrap_or(1)
                    }
                };
                RoutingLink::new(capacity)
            })
            .collect();
        Self {
            links,
            pres_fac: p_initial,
            base_cost,
            h_factor,
            p_initial,
            p_growth,
        }
    }

    /// The record for one vertex.
    pub fn link(&self, v: u32) -> &RoutingLink {
        &self.links[v as usize]
    }

    /// Marks a channel as occupying a vertex.
    pub fn occupy(&mut self, v: u32, channel: u32) {
        self.links[v as usize].occupants.insert(channel);
    }

    /// Removes a channel's occupancy of a vertex.
    pub fn release(&mut self, v: u32, channel: u32) {
        self.links[v as usize].occupants.remove(&channel);
    }

    /// The negotiated-congestion cost of expanding into a vertex:
    /// `base·(1 + present) + history`, with the present term computed from
    /// live occupancy.
    pub fn vertex_cost(&self, v: u32) -> f64 {
        let link = &self.links[v as usize];
        let over = link.occupancy() as i64 - link.capacity as i64 + 1;
        let present = self.pres_fac * over.max(1) as f64;
        self.base_cost * (1.0 + present) + link.history_cost
    }

    /// Sweep-end penalty update for iteration `k`:
    /// `history += h_factor·overuse` and
    /// `present_penalty = p_initial·p_growth^k·max(1, occupancy − capacity + 1)`.
    pub fn update_penalties(&mut self, iteration: usize) {
        self.pres_fac = self.p_initial * self.p_growth.powi(iteration as i32);
        for link in &mut self.links {
            link.history_cost += self.h_factor * link.overuse() as f64;
            let over = link.occupancy() as i64 - link.capacity as i64 + 1;
            link.present_penalty = self.pres_fac * over.max(1) as f64;
        }
    }

    /// The number of congested vertices.
    pub fn overused_count(&self) -> usize {
        self.links.iter().filter(|l| l.is_congested()).count()
    }

    /// Returns `true` if any vertex is congested.
    pub fn has_congestion(&self) -> bool {
        self.links.iter().any(|l| l.is_congested())
    }

    /// Approximate heap footprint in bytes.
    pub fn approx_bytes(&self) -> usize {
        self.links.capacity() * std::mem::size_of::<RoutingLink>()
            + self
                .links
                .iter()
                .map(|l| l.occupants.capacity() * std::mem::size_of::<u32>())
                .sum::<usize>()
    }
}
