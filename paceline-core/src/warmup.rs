//! Warmup and convergence control.
//!
//! One controller instance tracks a single run through its phases:
//!
//! ```text
//! WARMING ──> MEASURING ──> CONVERGED
//!                      └──> TIMED_OUT
//! ```
//!
//! Transitions are monotonic; a run never falls back from measuring to
//! warming. `TIMED_OUT` is not a failure: the run still produces a record,
//! flagged as non-converged, so convergence regressions stay visible.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::config::RunConfiguration;

/// Default trailing-window length for [`WarmupStrategy::Stability`].
pub const DEFAULT_STABILITY_WINDOW: usize = 10;

/// Default coefficient-of-variation bound for warmup stability (5%).
pub const DEFAULT_MAX_CV: f64 = 0.05;

/// Default cap on stability-strategy warmup iterations.
pub const DEFAULT_WARMUP_CAP: u32 = 10_000;

/// How a run decides its warmup is finished.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WarmupStrategy {
    /// Run exactly this many warmup iterations before measuring. Zero skips
    /// warmup entirely.
    Fixed {
        /// Warmup iterations to run.
        iterations: u32,
    },
    /// Warm until the coefficient of variation over the trailing `window`
    /// durations drops to `max_cv` or below (ties count as stable). Gives up
    /// and starts measuring anyway after `cap` iterations, so an inherently
    /// noisy workload cannot warm forever.
    Stability {
        /// Trailing-window length the CV is computed over.
        window: usize,
        /// Inclusive CV bound; at or below means stable.
        max_cv: f64,
        /// Warmup iterations after which to give up waiting for stability.
        cap: u32,
    },
}

impl Default for WarmupStrategy {
    fn default() -> Self {
        WarmupStrategy::Stability {
            window: DEFAULT_STABILITY_WINDOW,
            max_cv: DEFAULT_MAX_CV,
            cap: DEFAULT_WARMUP_CAP,
        }
    }
}

/// Phase of one measurement run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Iterations run but are excluded from statistics.
    Warming,
    /// Iterations are retained toward the final record.
    Measuring,
    /// Enough retained samples and measured time; the run may stop.
    Converged,
    /// The iteration budget ran out before the duration target was met.
    TimedOut,
}

/// Iteration-by-iteration convergence decisions for one run.
///
/// Owned by the driving engine; all state is run-scoped.
#[derive(Debug)]
pub struct WarmupController {
    strategy: WarmupStrategy,
    min_iterations: u32,
    max_iterations: u32,
    min_measurement_ns: u64,
    phase: Phase,
    warmup_iterations: u32,
    window: VecDeque<u64>,
    retained: u32,
    measured_ns: u128,
}

impl WarmupController {
    /// Controller for one run of the given configuration.
    pub fn new(config: &RunConfiguration) -> Self {
        let phase = match config.warmup {
            WarmupStrategy::Fixed { iterations: 0 } => Phase::Measuring,
            _ => Phase::Warming,
        };
        WarmupController {
            strategy: config.warmup,
            min_iterations: config.min_iterations,
            max_iterations: config.max_iterations,
            min_measurement_ns: config.min_measurement_ns,
            phase,
            warmup_iterations: 0,
            window: VecDeque::new(),
            retained: 0,
            measured_ns: 0,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True once the run converged (as opposed to timing out).
    pub fn converged(&self) -> bool {
        self.phase == Phase::Converged
    }

    /// Warmup iterations observed so far.
    pub fn warmup_iterations(&self) -> u32 {
        self.warmup_iterations
    }

    /// Retained measuring-phase samples so far.
    pub fn retained(&self) -> u32 {
        self.retained
    }

    /// Advance on one warmup-phase duration.
    ///
    /// Only meaningful while [`Phase::Warming`]; the engine routes durations
    /// here or to [`observe_measured`](Self::observe_measured) by phase.
    pub fn observe_warmup(&mut self, duration_nanos: u64) {
        debug_assert_eq!(self.phase, Phase::Warming);
        self.warmup_iterations += 1;

        match self.strategy {
            WarmupStrategy::Fixed { iterations } => {
                if self.warmup_iterations >= iterations {
                    self.begin_measuring();
                }
            }
            WarmupStrategy::Stability {
                window,
                max_cv,
                cap,
            } => {
                if self.window.len() == window {
                    self.window.pop_front();
                }
                self.window.push_back(duration_nanos);

                if self.window.len() == window && trailing_cv(&self.window) <= max_cv {
                    self.begin_measuring();
                } else if self.warmup_iterations >= cap {
                    warn!(
                        iterations = self.warmup_iterations,
                        "warmup never stabilized; measuring anyway"
                    );
                    self.begin_measuring();
                }
            }
        }
    }

    /// Advance on one retained measuring-phase duration.
    pub fn observe_measured(&mut self, duration_nanos: u64) {
        debug_assert_eq!(self.phase, Phase::Measuring);
        self.retained += 1;
        self.measured_ns += u128::from(duration_nanos);

        if self.retained >= self.min_iterations
            && self.measured_ns > u128::from(self.min_measurement_ns)
        {
            debug!(retained = self.retained, "run converged");
            self.phase = Phase::Converged;
        } else if self.retained >= self.max_iterations {
            debug!(
                retained = self.retained,
                "iteration budget exhausted before convergence"
            );
            self.phase = Phase::TimedOut;
        }
    }

    fn begin_measuring(&mut self) {
        debug!(
            warmup_iterations = self.warmup_iterations,
            "warmup complete"
        );
        self.phase = Phase::Measuring;
    }
}

/// Coefficient of variation over a trailing window, with the (n - 1) sample
/// variance. Windows too small to judge report infinity so they never pass
/// the stability bound.
fn trailing_cv(window: &VecDeque<u64>) -> f64 {
    if window.len() < 2 {
        return f64::INFINITY;
    }
    let n = window.len() as f64;
    let mean = window.iter().map(|&ns| ns as f64).sum::<f64>() / n;
    if mean <= f64::EPSILON {
        return f64::INFINITY;
    }
    let variance = window
        .iter()
        .map(|&ns| {
            let d = ns as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / (n - 1.0);
    variance.sqrt() / mean
}
