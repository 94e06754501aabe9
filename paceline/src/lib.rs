#![warn(missing_docs)]
//! # Paceline
//!
//! Benchmark execution engines with convergence control and thermal guarding.
//!
//! Paceline measures two kinds of performance:
//! - **Microbenchmarks**: tight in-process loops around a workload closure,
//!   timed per invocation with warmup and convergence control
//! - **Macrobenchmarks**: repeated application launches (cold / warm / hot)
//!   measured from launch request to a completion signal such as the first
//!   rendered frame
//!
//! Both engines share the same support layer:
//! - **Robust Statistics**: median, trimmed mean, confidence interval, and
//!   IQR outlier counts over the retained samples
//! - **Thermal Guarding**: samples taken under device throttling are
//!   discarded; persistently throttled runs fail instead of degrading
//! - **Deterministic Records**: every run yields a `MeasurementRecord`
//!   whose statistics are recomputable from its raw samples
//!
//! ## Quick Start
//!
//! ```ignore
//! use paceline::prelude::*;
//!
//! let mut bench = MicroBench::new(ConstantProbe::nominal(), NullSink);
//! let record = bench.run(
//!     &TestDefinition::new("com.example", "Parsing", "parse_header"),
//!     &RunConfiguration::default(),
//!     || parse_header(INPUT),
//! )?;
//! println!("median: {} ns", record.statistics.median_ns);
//! ```
//!
//! ## Startup Benchmarks
//!
//! ```ignore
//! let mut bench = MacroBench::new(host, SysfsThermalProbe::new(), sink);
//! let record = bench.run(
//!     "com.example.app",
//!     &TestDefinition::new("com.example.app", "Startup", "cold"),
//!     &config,
//!     CompletionSignal::FirstFrame,
//!     &CancelToken::new(),
//! )?;
//! ```

// Re-export engine types
pub use paceline_core::{
    CompilationMode, ConstantProbe, EngineError, IterationSample, JsonLinesSink, MeasurementRecord,
    MemorySink, MicroBench, NullSink, RecordSink, RunConfiguration, StartupMode, TestDefinition,
    ThermalProbe, ThrottleReason, ThrottleState, WarmupStrategy,
};

#[cfg(target_os = "linux")]
pub use paceline_core::SysfsThermalProbe;

// Re-export the launch controller
pub use paceline_launch::{
    CancelToken, CompletionSignal, ControllerError, LaunchReceipt, LaunchRequest, LifecycleError,
    MacroBench, ProcessLifecycle, DEFAULT_LAUNCH_TIMEOUT, LAUNCH_RETRY_BUDGET,
};

// Re-export stats
pub use paceline_stats::{summarize, summarize_with, SummaryOptions, SummaryStatistics};

pub mod config;

pub use config::PaceConfig;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        CancelToken, CompletionSignal, ConstantProbe, MacroBench, MeasurementRecord, MicroBench,
        NullSink, ProcessLifecycle, RunConfiguration, StartupMode, TestDefinition, WarmupStrategy,
    };
}
