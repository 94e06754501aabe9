//! Controller-level failures.

use thiserror::Error;

use paceline_core::EngineError;

use crate::lifecycle::LifecycleError;

/// Hard failures that abort a macrobenchmark run without a record.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// A shared-engine failure: bad configuration, thermal instability, or
    /// sample capacity.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Launching the target kept failing after the retry budget was spent.
    #[error("target failed to launch after {attempts} attempts")]
    LaunchFailure {
        /// Launch attempts made, including the first.
        attempts: u32,
        /// The failure that exhausted the budget.
        #[source]
        source: LifecycleError,
    },

    /// The run was cancelled; the target has been asked to terminate.
    #[error("run cancelled")]
    Cancelled,
}
