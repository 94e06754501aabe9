//! Run configuration.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::throttle::DEFAULT_MAX_DISCARD_RATIO;
use crate::warmup::WarmupStrategy;

/// How the target application is brought up for each macrobenchmark
/// iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StartupMode {
    /// Terminate the process and clear OS caches before every launch.
    #[default]
    Cold,
    /// Stop the process but keep caches before every launch.
    Warm,
    /// Process stays resident; launches are bring-to-front actions.
    Hot,
}

/// Code-execution state applied to the target before measurement.
///
/// Passed through to the launch request unmodified on every iteration;
/// mixing compilation states across iterations would make them
/// incomparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompilationMode {
    /// No ahead-of-time compilation; the target runs interpreted/JIT.
    None,
    /// Partial ahead-of-time compilation (e.g. profile-guided subset).
    Partial,
    /// Fully ahead-of-time compiled before measurement.
    #[default]
    Full,
}

/// The knobs a caller may set for one run. Immutable once the run starts;
/// engines snapshot it into the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfiguration {
    /// Fewest retained samples a successful run may hold.
    pub min_iterations: u32,
    /// Retained-sample budget; hitting it before the duration target means
    /// the run timed out (non-converged record, not an error).
    pub max_iterations: u32,
    /// Cumulative measured time a converged run must exceed, in nanoseconds.
    pub min_measurement_ns: u64,
    /// Warmup strategy (fixed count or trailing-window stability).
    pub warmup: WarmupStrategy,
    /// Macrobenchmark launch mode; ignored by the microbenchmark engine.
    pub startup_mode: StartupMode,
    /// Macrobenchmark compilation state; ignored by the microbenchmark
    /// engine.
    pub compilation_mode: CompilationMode,
    /// Whether the throttle guard classifies iterations at all.
    pub thermal_guard: bool,
    /// Bound on `discarded / attempted` during measurement before the run
    /// fails with thermal instability. Must be in (0, 1].
    pub max_discard_ratio: f64,
    /// Pin the measuring thread to this CPU before the loop starts
    /// (microbenchmark, Linux). Pin failures are logged, not fatal.
    pub pin_cpu: Option<usize>,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        RunConfiguration {
            min_iterations: 50,
            max_iterations: 100_000,
            min_measurement_ns: 100_000_000,
            warmup: WarmupStrategy::default(),
            startup_mode: StartupMode::default(),
            compilation_mode: CompilationMode::default(),
            thermal_guard: true,
            max_discard_ratio: DEFAULT_MAX_DISCARD_RATIO,
            pin_cpu: None,
        }
    }
}

impl RunConfiguration {
    /// Validate before any iteration runs.
    ///
    /// Engines call this first; a rejected configuration produces no partial
    /// state and the workload is never invoked.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.min_iterations > self.max_iterations {
            return Err(EngineError::config(format!(
                "min_iterations ({}) exceeds max_iterations ({})",
                self.min_iterations, self.max_iterations
            )));
        }
        if self.min_measurement_ns == 0 {
            return Err(EngineError::config(
                "min_measurement_ns must be positive",
            ));
        }
        if !(self.max_discard_ratio > 0.0 && self.max_discard_ratio <= 1.0) {
            return Err(EngineError::config(format!(
                "max_discard_ratio ({}) must be in (0, 1]",
                self.max_discard_ratio
            )));
        }
        if let WarmupStrategy::Stability {
            window,
            max_cv,
            cap,
        } = self.warmup
        {
            if window < 2 {
                return Err(EngineError::config(
                    "stability warmup needs a window of at least 2",
                ));
            }
            if !(max_cv.is_finite() && max_cv >= 0.0) {
                return Err(EngineError::config(format!(
                    "stability warmup max_cv ({max_cv}) must be finite and non-negative"
                )));
            }
            if cap == 0 {
                return Err(EngineError::config(
                    "stability warmup cap must be positive",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(RunConfiguration::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_min_over_max() {
        let config = RunConfiguration {
            min_iterations: 10,
            max_iterations: 5,
            ..RunConfiguration::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, EngineError::Configuration { .. }));
    }

    #[test]
    fn test_rejects_zero_duration_bound() {
        let config = RunConfiguration {
            min_measurement_ns: 0,
            ..RunConfiguration::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_discard_ratio() {
        for ratio in [0.0, -0.5, 1.5, f64::NAN] {
            let config = RunConfiguration {
                max_discard_ratio: ratio,
                ..RunConfiguration::default()
            };
            assert!(config.validate().is_err(), "ratio {ratio} should fail");
        }
    }

    #[test]
    fn test_rejects_degenerate_stability_window() {
        let config = RunConfiguration {
            warmup: WarmupStrategy::Stability {
                window: 1,
                max_cv: 0.05,
                cap: 100,
            },
            ..RunConfiguration::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_boundary_ratio_is_accepted() {
        let config = RunConfiguration {
            max_discard_ratio: 1.0,
            ..RunConfiguration::default()
        };
        assert!(config.validate().is_ok());
    }
}
