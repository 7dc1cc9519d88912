//! Common result and error types for the Mosaic mapping stages.

/// The standard result type for fallible mapping operations.
///
/// `Err` is reserved for failures that abort a stage outright (a malformed
/// architecture, an infeasible initial placement). In-loop anomalies — an
/// illegal proposed move, a single unroutable channel — are recovered locally
/// and reported through the diagnostic sink; the stage still returns `Ok`
/// with a partial result for inspection.
pub type MosaicResult<T> = Result<T, MappingError>;

/// Errors that abort a mapping stage.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// The architecture violates a construction precondition, such as a
    /// duplicate port name or a link referencing a missing endpoint.
    #[error("architecture construction error: {0}")]
    Construction(String),

    /// The initial placement cannot seat every task, e.g. a class whose
    /// legal address set is empty or smaller than its population.
    #[error("placement infeasible: {0}")]
    PlacementInfeasible(String),

    /// A placement invariant was violated; detected by the verifier.
    #[error("placement inconsistency: {0}")]
    PlacementInconsistency(String),

    /// A channel has no path through the routing graph even ignoring
    /// congestion.
    #[error("routing connectivity error: {0}")]
    RoutingConnectivity(String),

    /// Pathfinder exhausted its iteration budget while resources remain
    /// overused.
    #[error("routing congestion error: {0}")]
    RoutingCongestion(String),
}
