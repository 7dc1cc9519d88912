//! Placement and routing engines for the Mosaic mapping toolkit.
//!
//! This crate takes a [`Map`] — a fabric paired with a task graph under a
//! `RuleSet` oracle — assigns every task to a physical slot (placement) and
//! connects every data edge over physical wires respecting capacity
//! (routing). Placement is a simulated-annealing move/swap loop over
//! precomputed lookup tables; routing is Pathfinder-style negotiated
//! congestion over the flattened resource graph.
//!
//! # Pipeline
//!
//! 1. **Tables** — distance LUT, per-address slot paths, per-class
//!    legality masks
//! 2. **Place** — seeded random seating + annealing refinement, verified
//! 3. **Route** — iterative rip-up and re-route until capacity holds
//! 4. **Transcribe** — slot paths and resource paths written back to the
//!    map, metrics into its metadata
//!
//! # Usage
//!
//! ```ignore
//! use mosaic_pnr::{place, route, PlaceOptions, RouteOptions};
//!
//! place(&mut map, PlaceOptions { seed: Some(7), ..Default::default() }, &interner, &sink)?;
//! route(&mut map, RouteOptions::default(), &interner, &sink)?;
//! assert_eq!(map.metadata.get_bool("routing_passed"), Some(true));
//! ```

#![warn(missing_docs)]

pub mod distance;
pub mod ids;
pub mod metrics;
pub mod placement;
pub mod routing;
pub mod tables;

#[cfg(test)]
pub(crate) mod testutil;

pub use distance::DistanceLut;
pub use ids::{ChannelId, NodeId, VertexId};
pub use placement::{
    place, AuxCost, CachedMoveGen, Location, MoveGenerator, PlaceOptions, PlacerState,
    RandomMoveGen, verify_placement, PlacementReport,
};
pub use routing::{
    route, RouteOptions, RouteOutcome, RoutingGraph, RoutingStruct, verify_routing, RoutingReport,
};
pub use tables::{ClassTable, MapTable, PathTable};

use mosaic_common::{Interner, MosaicResult};
use mosaic_diagnostics::DiagnosticSink;
use mosaic_task::Map;

/// Places and routes a map in one call.
///
/// Equivalent to [`place`] followed by [`route`]; the map carries the
/// results and metrics of both stages afterwards.
pub fn place_and_route(
    map: &mut Map,
    place_options: PlaceOptions,
    route_options: RouteOptions,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> MosaicResult<()> {
    place(map, place_options, interner, sink)?;
    route(map, route_options, interner, sink)
}
