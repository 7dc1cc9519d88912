//! Well-known metadata keys for mapping metrics.
//!
//! `place` and `route` record their timings, structure sizes and outcomes
//! in the map metadata under these keys. Times are seconds as `f64`, sizes
//! are approximate heap bytes.

use std::time::Duration;

/// Seconds spent building the placement structures.
pub const PLACEMENT_STRUCT_TIME: &str = "placement_struct_time";
/// Approximate bytes held by the placement structures.
pub const PLACEMENT_STRUCT_BYTES: &str = "placement_struct_bytes";
/// Seconds spent seating and annealing.
pub const PLACEMENT_TIME: &str = "placement_time";
/// Approximate bytes held by the placement state after annealing.
pub const PLACEMENT_BYTES: &str = "placement_bytes";
/// Final total map cost.
pub const PLACEMENT_OBJECTIVE: &str = "placement_objective";
/// Seconds spent building the routing structures.
pub const ROUTING_STRUCT_TIME: &str = "routing_struct_time";
/// Approximate bytes held by the routing structures.
pub const ROUTING_STRUCT_BYTES: &str = "routing_struct_bytes";
/// Seconds spent in the Pathfinder loop.
pub const ROUTING_TIME: &str = "routing_time";
/// Approximate bytes held by the routing state after routing.
pub const ROUTING_BYTES: &str = "routing_bytes";
/// Whether the final occupancy check passed: no vertex over capacity.
pub const ROUTING_PASSED: &str = "routing_passed";
/// Whether any structured routing failure occurred (connectivity or
/// congestion).
pub const ROUTING_ERROR: &str = "routing_error";
/// Number of top-level (inter-tile) link vertices in the routing graph.
pub const ROUTING_GLOBAL_LINKS: &str = "routing_global_links";

/// Renders a duration as fractional seconds for metadata.
pub(crate) fn secs(duration: Duration) -> f64 {
    duration.as_secs_f64()
}
