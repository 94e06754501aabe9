#![warn(missing_docs)]
//! Paceline Core - Measurement Engines
//!
//! This crate provides the run-time machinery shared by both benchmark
//! flavors:
//! - `MicroBench` for in-process repeated-call timing
//! - Warmup/convergence control and thermal throttle guarding
//! - The sample collector and the `MeasurementRecord` it feeds
//! - Record sinks (in-memory, JSON lines, null)

pub mod config;
pub mod definition;
pub mod error;
pub mod measure;
pub mod micro;
pub mod record;
pub mod sample;
pub mod sink;
pub mod throttle;
pub mod warmup;

pub use config::{CompilationMode, RunConfiguration, StartupMode};
pub use definition::TestDefinition;
pub use error::EngineError;
pub use measure::{pin_to_cpu, Timer};
pub use micro::MicroBench;
pub use record::MeasurementRecord;
pub use sample::{IterationSample, SampleCollector, MAX_RECORDED_SAMPLES};
pub use sink::{JsonLinesSink, MemorySink, NullSink, RecordSink};
pub use throttle::{
    ConstantProbe, ThermalProbe, ThrottleGuard, ThrottleReason, ThrottleState, Verdict,
};
#[cfg(target_os = "linux")]
pub use throttle::SysfsThermalProbe;
pub use warmup::{Phase, WarmupController, WarmupStrategy};
