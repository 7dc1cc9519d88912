//! Simulated-annealing driver: warm-up, cooling, radius and exit schedules.
//!
//! The driver runs WARM → RUN → DONE. Warm-up raises the temperature until
//! trial moves are almost always accepted; each RUN round performs a window
//! of trials, then lets the pluggable schedules update the temperature and
//! move radius from the observed acceptance ratio; the done predicate ends
//! the run.

use crate::ids::NodeId;
use crate::placement::cost::{node_cost, node_pair_cost, total_cost};
use crate::placement::movegen::MoveGenerator;
use crate::placement::state::PlacerState;
use rand::rngs::StdRng;
use rand::Rng;

/// Warm-up schedule: raises the temperature until acceptance is high.
pub trait Warmer: Send {
    /// Given the current temperature and the acceptance ratio of the last
    /// window, returns the next temperature to try, or `None` when warm-up
    /// is complete.
    fn next(&mut self, temperature: f64, accept_ratio: f64) -> Option<f64>;
}

/// Cooling schedule: maps (temperature, acceptance ratio) to the next
/// temperature.
pub trait Cooler: Send {
    /// Returns the temperature for the next round.
    fn next(&mut self, temperature: f64, accept_ratio: f64) -> f64;
}

/// Radius schedule: adapts the move radius to steer acceptance.
pub trait Limiter: Send {
    /// Returns the move radius for the next round.
    fn next(&mut self, radius: u16, accept_ratio: f64, max_hop: u16) -> u16;
}

/// Exit predicate for the RUN phase.
pub trait Doner: Send {
    /// Returns `true` when annealing should stop. `cost` is the map cost
    /// at the end of the round, `best_cost` the lowest seen so far.
    fn done(
        &mut self,
        temperature: f64,
        cost: f64,
        best_cost: f64,
        channel_count: usize,
        round: usize,
    ) -> bool;
}

/// Doubles the temperature until the acceptance ratio reaches a target.
pub struct GeometricWarmer {
    /// Multiplier applied per warm-up window.
    pub factor: f64,
    /// Target acceptance ratio ending warm-up.
    pub target: f64,
    /// Upper bound on warm-up windows, guarding fabrics where the target
    /// is unreachable.
    pub max_windows: usize,
    windows: usize,
}

impl GeometricWarmer {
    /// The default warm-up: factor 2, target 0.96.
    pub fn new() -> Self {
        Self {
            factor: 2.0,
            target: 0.96,
            max_windows: 64,
            windows: 0,
        }
    }
}

impl Default for GeometricWarmer {
    fn default() -> Self {
        Self::new()
    }
}

impl Warmer for GeometricWarmer {
    fn next(&mut self, temperature: f64, accept_ratio: f64) -> Option<f64> {
        if accept_ratio >= self.target || self.windows >= self.max_windows {
            return None;
        }
        self.windows += 1;
        Some(temperature * self.factor)
    }
}

/// Cools faster when acceptance drops: `α = clamp(0.5 + 0.44·r, 0.5, 0.94)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AdaptiveCooler;

impl Cooler for AdaptiveCooler {
    fn next(&mut self, temperature: f64, accept_ratio: f64) -> f64 {
        let alpha = (0.5 + 0.44 * accept_ratio).clamp(0.5, 0.94);
        temperature * alpha
    }
}

/// Scales the radius to drive acceptance toward 0.44:
/// `r ← clamp(r·(1 − 0.44 + a), 1, max_hop)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AdaptiveLimiter;

impl Limiter for AdaptiveLimiter {
    fn next(&mut self, radius: u16, accept_ratio: f64, max_hop: u16) -> u16 {
        let scaled = radius as f64 * (1.0 - 0.44 + accept_ratio);
        (scaled.round() as i64).clamp(1, max_hop as i64) as u16
    }
}

/// Default exit predicate: temperature below a fraction of the per-channel
/// cost, a frozen cost, or a round cap.
pub struct DefaultDoner {
    /// Hard cap on RUN rounds.
    pub max_rounds: usize,
    /// Consecutive rounds with an unchanged cost before exiting. A hot
    /// placement keeps fluctuating, so this only fires once the system is
    /// frozen (or was flat to begin with).
    pub stall_rounds: usize,
    /// Exit when `T < temp_fraction · best_cost / channel_count`.
    pub temp_fraction: f64,
    /// Absolute temperature floor.
    pub min_temperature: f64,
    last_cost: f64,
    stalled: usize,
}

impl DefaultDoner {
    /// The default predicate.
    pub fn new() -> Self {
        Self {
            max_rounds: 512,
            stall_rounds: 16,
            temp_fraction: 0.005,
            min_temperature: 1e-4,
            last_cost: f64::INFINITY,
            stalled: 0,
        }
    }
}

impl Default for DefaultDoner {
    fn default() -> Self {
        Self::new()
    }
}

impl Doner for DefaultDoner {
    fn done(
        &mut self,
        temperature: f64,
        cost: f64,
        best_cost: f64,
        channel_count: usize,
        round: usize,
    ) -> bool {
        if round >= self.max_rounds || temperature < self.min_temperature {
            return true;
        }
        if (cost - self.last_cost).abs() < 1e-12 {
            self.stalled += 1;
            if self.stalled >= self.stall_rounds {
                return true;
            }
        } else {
            self.last_cost = cost;
            self.stalled = 0;
        }
        temperature < self.temp_fraction * best_cost / channel_count.max(1) as f64
    }
}

/// Counters and final values reported by one annealing run.
#[derive(Debug, Clone, Copy)]
pub struct AnnealStats {
    /// RUN rounds executed.
    pub rounds: usize,
    /// Accepted moves over the whole run.
    pub accepted: u64,
    /// Attempted trials over the whole run.
    pub attempted: u64,
    /// Temperature at exit.
    pub final_temperature: f64,
    /// Move radius at exit.
    pub final_radius: u16,
    /// Total map cost at exit — the placement objective.
    pub objective: f64,
}

fn metropolis(rng: &mut StdRng, delta: f64, temperature: f64) -> bool {
    delta <= 0.0 || rng.gen::<f64>() < (-delta / temperature).exp()
}

/// One window of trials. Returns `(accepted, decided, attempted)`.
///
/// A trial samples a node, asks the generator for a target, and applies a
/// move (empty target) or a class-legality-checked swap (occupied target)
/// under the Metropolis criterion, undoing on rejection. A trial counts as
/// *decided* once it reaches an accept/reject decision; proposals that
/// yield no move (no candidate, the current location, the node itself) are
/// attempts only, so acceptance ratios are not diluted by them. Attempts
/// are capped at a multiple of the requested successful-move count so
/// windows terminate on frozen placements.
fn run_window(
    state: &mut PlacerState,
    movegen: &mut dyn MoveGenerator,
    rng: &mut StdRng,
    temperature: f64,
    radius: u16,
    move_attempts: usize,
) -> (u64, u64, u64) {
    let attempts_cap = (move_attempts as u64).saturating_mul(8);
    let node_count = state.node_count();
    let mut accepted = 0u64;
    let mut decided = 0u64;
    let mut attempted = 0u64;

    while accepted < move_attempts as u64 && attempted < attempts_cap {
        attempted += 1;
        let i = NodeId::from_raw(rng.gen_range(0..node_count) as u32);
        let Some(target) = movegen.propose(rng, state, i, radius) else {
            continue;
        };
        let from = state.location(i);
        if target == from {
            continue;
        }
        match state.node_at(target) {
            None => {
                decided += 1;
                let before = node_cost(state, i);
                state.move_node(i, target);
                let delta = node_cost(state, i) - before;
                if metropolis(rng, delta, temperature) {
                    accepted += 1;
                } else {
                    state.move_node(i, from);
                }
            }
            Some(j) => {
                if j == i {
                    continue;
                }
                decided += 1;
                // swap legality: each class must accept the other's slot
                let cj = state.get_class(j);
                let ci = state.get_class(i);
                if !state.maptable.is_legal(cj, from.addr as usize, from.slot)
                    || !state.maptable.is_legal(ci, target.addr as usize, target.slot)
                {
                    continue; // an illegal swap is a rejection
                }
                let before = node_pair_cost(state, i, j);
                state.swap(i, j);
                let delta = node_pair_cost(state, i, j) - before;
                if metropolis(rng, delta, temperature) {
                    accepted += 1;
                } else {
                    state.swap(i, j);
                }
            }
        }
    }
    (accepted, decided, attempted)
}

/// Runs the full WARM → RUN → DONE state machine.
#[allow(clippy::too_many_arguments)]
pub(crate) fn anneal(
    state: &mut PlacerState,
    movegen: &mut dyn MoveGenerator,
    warmer: &mut dyn Warmer,
    cooler: &mut dyn Cooler,
    limiter: &mut dyn Limiter,
    doner: &mut dyn Doner,
    rng: &mut StdRng,
    move_attempts: usize,
    initial_temperature: f64,
) -> AnnealStats {
    let max_hop = state.max_hop();
    let mut stats = AnnealStats {
        rounds: 0,
        accepted: 0,
        attempted: 0,
        final_temperature: initial_temperature,
        final_radius: max_hop,
        objective: total_cost(state),
    };
    if state.node_count() < 2 {
        return stats;
    }

    // WARM: raise the temperature until the fabric melts
    let mut temperature = initial_temperature;
    loop {
        let (acc, dec, att) = run_window(state, movegen, rng, temperature, max_hop, move_attempts);
        stats.accepted += acc;
        stats.attempted += att;
        let ratio = if dec > 0 { acc as f64 / dec as f64 } else { 0.0 };
        match warmer.next(temperature, ratio) {
            Some(next) => temperature = next,
            None => break,
        }
    }

    // RUN: anneal until the done predicate fires
    let mut radius = max_hop;
    let mut best = total_cost(state);
    let channel_count = state.channels.len();
    loop {
        let (acc, dec, att) = run_window(state, movegen, rng, temperature, radius, move_attempts);
        stats.accepted += acc;
        stats.attempted += att;
        let ratio = if dec > 0 { acc as f64 / dec as f64 } else { 0.0 };

        let cost = total_cost(state);
        best = best.min(cost);
        temperature = cooler.next(temperature, ratio);
        radius = limiter.next(radius, ratio, max_hop);
        stats.rounds += 1;
        if doner.done(temperature, cost, best, channel_count, stats.rounds) {
            break;
        }
    }

    stats.final_temperature = temperature;
    stats.final_radius = radius;
    stats.objective = total_cost(state);
    stats
}
