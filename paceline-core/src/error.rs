//! Error taxonomy shared by both engines.

use thiserror::Error;

/// Hard failures that abort a run before a record is produced.
///
/// A run that merely fails to converge is not an error; it still yields a
/// record with its `converged` flag cleared. These variants are reserved for
/// runs whose data cannot be trusted at all.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The run configuration is invalid. Raised before any iteration runs,
    /// so no partial state exists.
    #[error("invalid run configuration: {reason}")]
    Configuration {
        /// What was wrong with the configuration.
        reason: String,
    },

    /// Too many measuring-phase iterations were discarded as throttled.
    /// Retrying on a throttled device wastes time and yields worse data, so
    /// the run aborts instead.
    #[error(
        "thermal instability: {discarded} of {attempted} measured iterations \
         throttled (bound {max_ratio})"
    )]
    ThermalInstability {
        /// Iterations discarded because the device reported throttling.
        discarded: u32,
        /// Measuring-phase iterations attempted so far.
        attempted: u32,
        /// The configured discard-ratio bound that was exceeded.
        max_ratio: f64,
    },

    /// The collector's hard cap on recorded samples was exceeded, which
    /// points at a misconfigured or non-terminating workload.
    #[error("sample capacity exceeded after {cap} recorded samples")]
    Capacity {
        /// The cap that was hit.
        cap: usize,
    },
}

impl EngineError {
    /// Configuration error with the given reason.
    pub fn config(reason: impl Into<String>) -> Self {
        EngineError::Configuration {
            reason: reason.into(),
        }
    }
}
