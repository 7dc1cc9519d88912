//! Placement: seeded initial seating plus simulated-annealing refinement.
//!
//! [`place`] builds the lookup tables and placement state from a [`Map`],
//! seats every task, anneals under the configured schedules, verifies the
//! result and transcribes each task's slot path back into the map.

pub mod anneal;
pub mod cost;
pub mod movegen;
pub mod random;
pub mod state;
pub mod verify;

pub use anneal::{
    AdaptiveCooler, AdaptiveLimiter, AnnealStats, Cooler, DefaultDoner, Doner, GeometricWarmer,
    Limiter, Warmer,
};
pub use cost::AuxCost;
pub use movegen::{CachedMoveGen, MoveGenerator, RandomMoveGen};
pub use state::{Grid, Location, PlacerState, SaChannel, SaNode};
pub use verify::{verify_placement, PlacementReport};

use crate::metrics;
use mosaic_arch::Address;
use mosaic_common::{Interner, MappingError, MosaicResult};
use mosaic_diagnostics::DiagnosticSink;
use mosaic_task::Map;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

/// Knobs for [`place`]. Every strategy slot falls back to the default
/// implementation when left empty.
pub struct PlaceOptions {
    /// Master RNG seed; drawn from the OS when absent.
    pub seed: Option<u64>,
    /// Successful moves per annealing round.
    pub move_attempts: usize,
    /// Temperature entering warm-up.
    pub initial_temperature: f64,
    /// Use the bit-mask map-table representation when every address has at
    /// most one mappable slot.
    pub enable_flatness: bool,
    /// Allocate the per-location penalty table.
    pub enable_address: bool,
    /// Per-address penalties installed into the table when
    /// `enable_address` is set.
    pub address_costs: Option<Vec<(Address, f64)>>,
    /// Warm-up schedule override.
    pub warmer: Option<Box<dyn Warmer>>,
    /// Cooling schedule override.
    pub cooler: Option<Box<dyn Cooler>>,
    /// Radius schedule override.
    pub limiter: Option<Box<dyn Limiter>>,
    /// Exit predicate override.
    pub doner: Option<Box<dyn Doner>>,
    /// Move generator override (default: cached).
    pub movegen: Option<Box<dyn MoveGenerator>>,
    /// Optional global cost term.
    pub aux: Option<Box<dyn AuxCost>>,
}

impl Default for PlaceOptions {
    fn default() -> Self {
        Self {
            seed: None,
            move_attempts: 20_000,
            initial_temperature: 1.0,
            enable_flatness: true,
            enable_address: false,
            address_costs: None,
            warmer: None,
            cooler: None,
            limiter: None,
            doner: None,
            movegen: None,
            aux: None,
        }
    }
}

/// Places every task of the map onto a fabric slot.
///
/// On success the map's `placement` holds one slot path per task and the
/// placement metrics are recorded in its metadata. Verifier findings are
/// emitted into the sink; an inconsistent result still transcribes the
/// partial placement before returning the error.
pub fn place(
    map: &mut Map,
    options: PlaceOptions,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> MosaicResult<()> {
    let PlaceOptions {
        seed,
        move_attempts,
        initial_temperature,
        enable_flatness,
        enable_address,
        address_costs,
        warmer,
        cooler,
        limiter,
        doner,
        movegen,
        aux,
    } = options;

    let build_start = Instant::now();
    let mut state = PlacerState::build(
        map,
        enable_flatness,
        enable_address,
        address_costs.as_deref(),
        aux,
        interner,
    )?;
    map.metadata.set(
        metrics::PLACEMENT_STRUCT_TIME,
        metrics::secs(build_start.elapsed()),
    );
    map.metadata
        .set(metrics::PLACEMENT_STRUCT_BYTES, state.approx_bytes() as u64);

    let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut rng = StdRng::seed_from_u64(seed);

    let place_start = Instant::now();
    random::initial_placement(&mut state, &mut rng, interner)?;

    let mut movegen = movegen.unwrap_or_else(|| Box::new(CachedMoveGen::new()));
    let mut warmer = warmer.unwrap_or_else(|| Box::new(GeometricWarmer::new()));
    let mut cooler = cooler.unwrap_or_else(|| Box::new(AdaptiveCooler));
    let mut limiter = limiter.unwrap_or_else(|| Box::new(AdaptiveLimiter));
    let mut doner = doner.unwrap_or_else(|| Box::new(DefaultDoner::new()));

    let stats = anneal::anneal(
        &mut state,
        movegen.as_mut(),
        warmer.as_mut(),
        cooler.as_mut(),
        limiter.as_mut(),
        doner.as_mut(),
        &mut rng,
        move_attempts,
        initial_temperature,
    );
    map.metadata
        .set(metrics::PLACEMENT_TIME, metrics::secs(place_start.elapsed()));
    map.metadata
        .set(metrics::PLACEMENT_BYTES, state.approx_bytes() as u64);
    map.metadata
        .set(metrics::PLACEMENT_OBJECTIVE, stats.objective);

    let rules = map.rules_arc();
    let report = verify_placement(&state, &map.top, &map.tasks, rules.as_ref(), interner, sink);

    map.placement.clear();
    for node in &state.nodes {
        if let Some(path) = state
            .path_table
            .slot(node.loc.addr as usize, node.loc.slot)
        {
            map.placement.insert(node.name, path.clone());
        }
    }

    if !report.is_consistent() {
        return Err(MappingError::PlacementInconsistency(format!(
            "{} node(s) violate placement invariants",
            report.bad_nodes.len()
        )));
    }
    Ok(())
}
