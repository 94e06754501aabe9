//! The process-lifecycle collaborator boundary.
//!
//! The controller never touches processes itself; all OS-specific work
//! (terminating, cache dropping, the launch wait) lives behind
//! [`ProcessLifecycle`]. Hosts implement it once per platform; tests script
//! it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use paceline_core::{CompilationMode, StartupMode};

use crate::cancel::CancelToken;

/// What ends the timed portion of one launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionSignal {
    /// The target rendered its first frame.
    FirstFrame,
    /// The target reported itself fully drawn.
    FullyDrawn,
    /// A host-defined marker, matched by the lifecycle collaborator.
    Custom(String),
}

/// One launch order: everything the collaborator needs to bring the target
/// up and decide when the launch is complete.
///
/// Built once per run and reused for every iteration, so all launches of a
/// run are measured under identical terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRequest {
    /// Target application identifier, opaque to the controller.
    pub app_id: String,
    /// Startup mode this run measures.
    pub startup_mode: StartupMode,
    /// Compilation state the target must be in.
    pub compilation_mode: CompilationMode,
    /// Signal that ends the timed region.
    pub signal: CompletionSignal,
    /// How long the collaborator may wait for the signal.
    pub timeout: Duration,
}

/// What the collaborator reports back from a completed launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReceipt {
    /// Compilation state the target actually ran under.
    pub compilation_applied: CompilationMode,
}

/// Failures at the process-lifecycle boundary.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The completion signal did not arrive in time.
    #[error("launch did not complete within {timeout:?}")]
    Timeout {
        /// The wait budget that ran out.
        timeout: Duration,
    },
    /// A lifecycle action (launch, terminate, cache clear) failed outright.
    #[error("lifecycle action failed: {0}")]
    Action(String),
    /// The wait was abandoned because the run was cancelled.
    #[error("launch wait cancelled")]
    Cancelled,
}

/// Host-side process control.
///
/// `launch` blocks until the request's completion signal, its timeout, or
/// cancellation, whichever comes first; implementations must poll the token
/// while waiting. `terminate` and `clear_caches` are best-effort synchronous
/// actions and must be idempotent (terminating a dead process succeeds).
pub trait ProcessLifecycle {
    /// Bring the target up and wait for the request's completion signal.
    fn launch(
        &mut self,
        request: &LaunchRequest,
        cancel: &CancelToken,
    ) -> Result<LaunchReceipt, LifecycleError>;

    /// Stop the target process.
    fn terminate(&mut self, app_id: &str) -> Result<(), LifecycleError>;

    /// Drop OS-level caches affecting the target's next start.
    fn clear_caches(&mut self, app_id: &str) -> Result<(), LifecycleError>;
}

impl<L: ProcessLifecycle + ?Sized> ProcessLifecycle for &mut L {
    fn launch(
        &mut self,
        request: &LaunchRequest,
        cancel: &CancelToken,
    ) -> Result<LaunchReceipt, LifecycleError> {
        (**self).launch(request, cancel)
    }

    fn terminate(&mut self, app_id: &str) -> Result<(), LifecycleError> {
        (**self).terminate(app_id)
    }

    fn clear_caches(&mut self, app_id: &str) -> Result<(), LifecycleError> {
        (**self).clear_caches(app_id)
    }
}
