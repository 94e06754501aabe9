//! In-process microbenchmark engine.

use tracing::{info, warn};

use crate::config::RunConfiguration;
use crate::definition::TestDefinition;
use crate::error::EngineError;
use crate::measure::{pin_to_cpu, Timer};
use crate::record::MeasurementRecord;
use crate::sample::SampleCollector;
use crate::sink::RecordSink;
use crate::throttle::{ThermalProbe, ThrottleGuard, Verdict};
use crate::warmup::{Phase, WarmupController};

/// Drives repeated in-process invocation of a workload closure until the
/// warmup controller declares the run converged or out of budget.
///
/// The probe and sink are owned for the engine's lifetime; one engine runs
/// any number of benchmarks sequentially. Per-run state (collector, warmup
/// controller, throttle guard) is created fresh inside [`run`](Self::run).
#[derive(Debug)]
pub struct MicroBench<P, S> {
    probe: P,
    sink: S,
}

impl<P: ThermalProbe, S: RecordSink> MicroBench<P, S> {
    /// Engine over the given probe and sink.
    pub fn new(probe: P, sink: S) -> Self {
        MicroBench { probe, sink }
    }

    /// Execute one benchmark run.
    ///
    /// Each iteration brackets exactly one workload call with the timer and
    /// one throttle snapshot on each side. A run that fails validation or
    /// trips the thermal guard returns the error and emits nothing; a run
    /// that merely exhausts `max_iterations` still produces a record with
    /// `converged` cleared.
    pub fn run<R, W: FnMut() -> R>(
        &mut self,
        definition: &TestDefinition,
        config: &RunConfiguration,
        mut workload: W,
    ) -> Result<MeasurementRecord, EngineError> {
        config.validate()?;
        if let Some(cpu) = config.pin_cpu {
            if !pin_to_cpu(cpu) {
                warn!(cpu, "failed to pin measuring thread");
            }
        }
        info!(target = %definition, "microbenchmark run starting");

        let mut controller = WarmupController::new(config);
        let mut guard = ThrottleGuard::from_config(config);
        let mut collector = SampleCollector::new();

        loop {
            let measuring = controller.phase() == Phase::Measuring;

            let before = self.probe.query_throttled();
            let timer = Timer::start();
            std::hint::black_box(workload());
            let duration_nanos = timer.stop();
            let after = self.probe.query_throttled();

            match (guard.classify(measuring, before, after)?, measuring) {
                (Verdict::Keep, false) => {
                    collector.record(duration_nanos, true, false)?;
                    controller.observe_warmup(duration_nanos);
                }
                (Verdict::Discard, false) => {
                    // Sample dropped without an ordinal, but warmup still
                    // advances: a throttled device must eventually reach
                    // measuring, where the guard can fail the run.
                    controller.observe_warmup(duration_nanos);
                }
                (Verdict::Keep, true) => {
                    collector.record(duration_nanos, false, false)?;
                    controller.observe_measured(duration_nanos);
                }
                (Verdict::Discard, true) => {
                    collector.record(duration_nanos, false, true)?;
                }
            }

            if matches!(controller.phase(), Phase::Converged | Phase::TimedOut) {
                break;
            }
        }

        let record = MeasurementRecord::assemble(
            definition.clone(),
            config.clone(),
            collector.into_samples(),
            controller.converged(),
            guard.discarded(),
        );
        info!(
            target = %definition,
            retained = record.retained_count(),
            discarded = record.discarded,
            converged = record.converged,
            "microbenchmark run finished"
        );
        if let Err(err) = self.sink.emit(&record) {
            warn!(error = %err, "record sink failed; returning record anyway");
        }
        Ok(record)
    }
}
