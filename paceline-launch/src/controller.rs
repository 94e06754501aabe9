//! Startup-lifecycle benchmark controller.

use std::time::Duration;

use tracing::{info, warn};

use paceline_core::measure::Timer;
use paceline_core::sample::SampleCollector;
use paceline_core::sink::RecordSink;
use paceline_core::throttle::{ThermalProbe, ThrottleGuard, Verdict};
use paceline_core::warmup::{Phase, WarmupController};
use paceline_core::{EngineError, MeasurementRecord, RunConfiguration, StartupMode, TestDefinition};

use crate::cancel::CancelToken;
use crate::error::ControllerError;
use crate::lifecycle::{CompletionSignal, LaunchRequest, LifecycleError, ProcessLifecycle};

/// Failed launch attempts tolerated per run before the run is abandoned.
pub const LAUNCH_RETRY_BUDGET: u32 = 3;

/// Default per-launch wait budget.
pub const DEFAULT_LAUNCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives repeated application launches under a startup-mode state machine,
/// timing each launch from request to completion signal.
///
/// Each iteration is one full lifecycle transition: bring the target into
/// the configured pre-launch state, launch, and wait for the signal. Only
/// the launch-to-signal span is timed; preparation runs outside the timer.
#[derive(Debug)]
pub struct MacroBench<L, P, S> {
    lifecycle: L,
    probe: P,
    sink: S,
    launch_timeout: Duration,
}

impl<L: ProcessLifecycle, P: ThermalProbe, S: RecordSink> MacroBench<L, P, S> {
    /// Controller over the given collaborators.
    pub fn new(lifecycle: L, probe: P, sink: S) -> Self {
        MacroBench {
            lifecycle,
            probe,
            sink,
            launch_timeout: DEFAULT_LAUNCH_TIMEOUT,
        }
    }

    /// Replace the per-launch wait budget.
    pub fn with_launch_timeout(mut self, timeout: Duration) -> Self {
        self.launch_timeout = timeout;
        self
    }

    /// Execute one macrobenchmark run against `app_id`.
    ///
    /// Failed launches are retried within a per-run budget and leave no
    /// sample behind; exhausting the budget terminates the target and
    /// aborts. Cancellation at any blocking point terminates the target
    /// and surfaces [`ControllerError::Cancelled`], never a record.
    pub fn run(
        &mut self,
        app_id: &str,
        definition: &TestDefinition,
        config: &RunConfiguration,
        signal: CompletionSignal,
        cancel: &CancelToken,
    ) -> Result<MeasurementRecord, ControllerError> {
        config.validate()?;

        // One request reused for every iteration keeps compilation state
        // and timeout identical across the whole run.
        let request = LaunchRequest {
            app_id: app_id.to_owned(),
            startup_mode: config.startup_mode,
            compilation_mode: config.compilation_mode,
            signal,
            timeout: self.launch_timeout,
        };
        info!(
            app = app_id,
            mode = ?config.startup_mode,
            "macrobenchmark run starting"
        );

        let mut controller = WarmupController::new(config);
        let mut guard = ThrottleGuard::from_config(config);
        let mut collector = SampleCollector::new();
        let mut attempts_failed: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(self.abort_cancelled(app_id));
            }

            if let Err(err) = self.prepare_target(app_id, config.startup_mode) {
                match err {
                    LifecycleError::Cancelled => return Err(self.abort_cancelled(app_id)),
                    err => {
                        attempts_failed += 1;
                        if attempts_failed > LAUNCH_RETRY_BUDGET {
                            return Err(self.exhaust_budget(app_id, attempts_failed, err));
                        }
                        warn!(attempt = attempts_failed, error = %err, "target preparation failed; retrying");
                        continue;
                    }
                }
            }

            let measuring = controller.phase() == Phase::Measuring;
            let before = self.probe.query_throttled();
            let timer = Timer::start();
            let outcome = self.lifecycle.launch(&request, cancel);
            let duration_nanos = timer.stop();
            let after = self.probe.query_throttled();

            let receipt = match outcome {
                Ok(receipt) => receipt,
                Err(LifecycleError::Cancelled) => return Err(self.abort_cancelled(app_id)),
                Err(err) => {
                    attempts_failed += 1;
                    if attempts_failed > LAUNCH_RETRY_BUDGET {
                        return Err(self.exhaust_budget(app_id, attempts_failed, err));
                    }
                    warn!(attempt = attempts_failed, error = %err, "launch failed; retrying");
                    continue;
                }
            };

            if receipt.compilation_applied != config.compilation_mode {
                return Err(EngineError::config(format!(
                    "collaborator applied compilation mode {:?} but the run requires {:?}",
                    receipt.compilation_applied, config.compilation_mode
                ))
                .into());
            }

            match (guard.classify(measuring, before, after)?, measuring) {
                (Verdict::Keep, false) => {
                    collector.record(duration_nanos, true, false)?;
                    controller.observe_warmup(duration_nanos);
                }
                (Verdict::Discard, false) => {
                    // Dropped without an ordinal, but warmup still advances
                    // so a throttled device cannot stall the run in warmup.
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
            app = app_id,
            retained = record.retained_count(),
            discarded = record.discarded,
            converged = record.converged,
            "macrobenchmark run finished"
        );
        if let Err(err) = self.sink.emit(&record) {
            warn!(error = %err, "record sink failed; returning record anyway");
        }
        Ok(record)
    }

    /// Bring the target into the pre-launch state the startup mode demands.
    fn prepare_target(&mut self, app_id: &str, mode: StartupMode) -> Result<(), LifecycleError> {
        match mode {
            StartupMode::Cold => {
                self.lifecycle.terminate(app_id)?;
                self.lifecycle.clear_caches(app_id)
            }
            StartupMode::Warm => self.lifecycle.terminate(app_id),
            StartupMode::Hot => Ok(()),
        }
    }

    /// Terminate the target and wrap the failure that spent the budget.
    fn exhaust_budget(
        &mut self,
        app_id: &str,
        attempts: u32,
        source: LifecycleError,
    ) -> ControllerError {
        if let Err(err) = self.lifecycle.terminate(app_id) {
            warn!(app = app_id, error = %err, "terminate after launch failure also failed");
        }
        ControllerError::LaunchFailure { attempts, source }
    }

    /// Kill the target so cancellation never orphans it, then surface the
    /// cancellation.
    fn abort_cancelled(&mut self, app_id: &str) -> ControllerError {
        if let Err(err) = self.lifecycle.terminate(app_id) {
            warn!(app = app_id, error = %err, "terminate after cancellation failed");
        }
        ControllerError::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LaunchReceipt;
    use paceline_core::sink::MemorySink;
    use paceline_core::throttle::ConstantProbe;
    use paceline_core::{CompilationMode, WarmupStrategy};

    /// Scripted lifecycle host that logs every call it receives.
    #[derive(Default)]
    struct FakeHost {
        calls: Vec<String>,
        fail_launches: u32,
        applied: Option<CompilationMode>,
        cancel_during_launch: bool,
    }

    impl ProcessLifecycle for FakeHost {
        fn launch(
            &mut self,
            request: &LaunchRequest,
            cancel: &CancelToken,
        ) -> Result<LaunchReceipt, LifecycleError> {
            self.calls.push("launch".into());
            if self.cancel_during_launch {
                cancel.cancel();
                return Err(LifecycleError::Cancelled);
            }
            if self.fail_launches > 0 {
                self.fail_launches -= 1;
                return Err(LifecycleError::Timeout {
                    timeout: request.timeout,
                });
            }
            std::thread::sleep(Duration::from_micros(100));
            Ok(LaunchReceipt {
                compilation_applied: self.applied.unwrap_or(request.compilation_mode),
            })
        }

        fn terminate(&mut self, _app_id: &str) -> Result<(), LifecycleError> {
            self.calls.push("terminate".into());
            Ok(())
        }

        fn clear_caches(&mut self, _app_id: &str) -> Result<(), LifecycleError> {
            self.calls.push("clear_caches".into());
            Ok(())
        }
    }

    fn quick_config(mode: StartupMode) -> RunConfiguration {
        RunConfiguration {
            min_iterations: 2,
            max_iterations: 10,
            min_measurement_ns: 1,
            warmup: WarmupStrategy::Fixed { iterations: 0 },
            startup_mode: mode,
            ..RunConfiguration::default()
        }
    }

    fn definition() -> TestDefinition {
        TestDefinition::new("com.example.app", "StartupSuite", "cold_start")
    }

    fn run_with(
        host: &mut FakeHost,
        config: &RunConfiguration,
    ) -> Result<MeasurementRecord, ControllerError> {
        let mut bench = MacroBench::new(host, ConstantProbe::nominal(), MemorySink::new());
        bench.run(
            "com.example.app",
            &definition(),
            config,
            CompletionSignal::FirstFrame,
            &CancelToken::new(),
        )
    }

    #[test]
    fn test_cold_terminates_and_clears_before_every_launch() {
        let mut host = FakeHost::default();
        let record = run_with(&mut host, &quick_config(StartupMode::Cold)).unwrap();

        assert_eq!(record.retained_count(), 2);
        assert_eq!(
            host.calls,
            vec![
                "terminate",
                "clear_caches",
                "launch",
                "terminate",
                "clear_caches",
                "launch"
            ]
        );
    }

    #[test]
    fn test_warm_terminates_but_keeps_caches() {
        let mut host = FakeHost::default();
        run_with(&mut host, &quick_config(StartupMode::Warm)).unwrap();

        assert_eq!(host.calls, vec!["terminate", "launch", "terminate", "launch"]);
    }

    #[test]
    fn test_hot_only_launches() {
        let mut host = FakeHost::default();
        run_with(&mut host, &quick_config(StartupMode::Hot)).unwrap();

        assert_eq!(host.calls, vec!["launch", "launch"]);
    }

    #[test]
    fn test_bounded_launch_failures_recover() {
        let mut host = FakeHost {
            fail_launches: 2,
            ..FakeHost::default()
        };
        let record = run_with(&mut host, &quick_config(StartupMode::Hot)).unwrap();

        // Two failed attempts left no samples behind.
        assert_eq!(record.samples.len(), 2);
        assert!(record.converged);
        assert_eq!(host.calls.iter().filter(|c| *c == "launch").count(), 4);
    }

    #[test]
    fn test_retry_budget_exhaustion_terminates_target() {
        let mut host = FakeHost {
            fail_launches: u32::MAX,
            ..FakeHost::default()
        };
        let err = run_with(&mut host, &quick_config(StartupMode::Hot)).unwrap_err();

        match err {
            ControllerError::LaunchFailure { attempts, .. } => {
                assert_eq!(attempts, LAUNCH_RETRY_BUDGET + 1);
            }
            other => panic!("expected LaunchFailure, got {other:?}"),
        }
        assert_eq!(host.calls.last().map(String::as_str), Some("terminate"));
    }

    #[test]
    fn test_compilation_mismatch_is_a_configuration_error() {
        let mut host = FakeHost {
            applied: Some(CompilationMode::Partial),
            ..FakeHost::default()
        };
        let err = run_with(&mut host, &quick_config(StartupMode::Hot)).unwrap_err();

        assert!(matches!(
            err,
            ControllerError::Engine(EngineError::Configuration { .. })
        ));
    }

    #[test]
    fn test_precancelled_run_terminates_and_never_launches() {
        let mut host = FakeHost::default();
        let token = CancelToken::new();
        token.cancel();

        let mut bench = MacroBench::new(&mut host, ConstantProbe::nominal(), MemorySink::new());
        let err = bench
            .run(
                "com.example.app",
                &definition(),
                &quick_config(StartupMode::Cold),
                CompletionSignal::FirstFrame,
                &token,
            )
            .unwrap_err();

        assert!(matches!(err, ControllerError::Cancelled));
        assert_eq!(host.calls, vec!["terminate"]);
    }

    #[test]
    fn test_cancellation_during_wait_kills_target() {
        let mut host = FakeHost {
            cancel_during_launch: true,
            ..FakeHost::default()
        };
        let mut sink = MemorySink::new();
        let err = {
            let mut bench = MacroBench::new(&mut host, ConstantProbe::nominal(), &mut sink);
            bench
                .run(
                    "com.example.app",
                    &definition(),
                    &quick_config(StartupMode::Hot),
                    CompletionSignal::FirstFrame,
                    &CancelToken::new(),
                )
                .unwrap_err()
        };

        assert!(matches!(err, ControllerError::Cancelled));
        assert_eq!(host.calls, vec!["launch", "terminate"]);
        assert!(sink.records.is_empty(), "cancelled run must not emit");
    }
}
