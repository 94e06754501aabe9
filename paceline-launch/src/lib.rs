#![warn(missing_docs)]
//! Paceline Launch - Macrobenchmark Lifecycle Controller
//!
//! This crate drives out-of-process startup benchmarks:
//! - `MacroBench` repeats application launches under a startup-mode state
//!   machine (cold / warm / hot) and times each launch to its completion
//!   signal
//! - `ProcessLifecycle` is the host boundary: terminate, cache clearing,
//!   and the launch wait itself live behind it
//! - `CancelToken` propagates run-level cancellation into the launch wait

pub mod cancel;
pub mod controller;
pub mod error;
pub mod lifecycle;

pub use cancel::CancelToken;
pub use controller::{MacroBench, DEFAULT_LAUNCH_TIMEOUT, LAUNCH_RETRY_BUDGET};
pub use error::ControllerError;
pub use lifecycle::{
    CompletionSignal, LaunchReceipt, LaunchRequest, LifecycleError, ProcessLifecycle,
};
