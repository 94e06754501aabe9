//! Thermal throttle detection and discard policy.
//!
//! The guard only classifies; retry and backoff policy belongs to the
//! engines that call it. Engines query the probe fresh before and after
//! every iteration so no decision rests on a stale snapshot.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RunConfiguration;
use crate::error::EngineError;

/// Default bound on the throttle-discard ratio during measurement.
pub const DEFAULT_MAX_DISCARD_RATIO: f64 = 0.25;

/// Measuring-phase attempts required before the ratio is enforced, so a
/// single early blip cannot abort a run at ratio 1/1.
pub const DISCARD_RATIO_FLOOR: u32 = 8;

/// Why the device reported degraded performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThrottleReason {
    /// A thermal zone is at or above its trip point.
    Thermal,
    /// The platform is in a low-power or battery-saver state.
    PowerSave,
    /// CPU clocks are being scaled below nominal.
    ClockScaling,
}

/// Snapshot of device throttle state. Queried fresh each time it is needed;
/// never persisted across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleState {
    /// Whether the device currently reports throttling.
    pub throttled: bool,
    /// Best-effort cause, when the probe knows one.
    pub reason: Option<ThrottleReason>,
}

impl ThrottleState {
    /// A clear, unthrottled state.
    pub const NOMINAL: ThrottleState = ThrottleState {
        throttled: false,
        reason: None,
    };

    /// A throttled state with the given cause.
    pub fn throttled(reason: ThrottleReason) -> Self {
        ThrottleState {
            throttled: true,
            reason: Some(reason),
        }
    }
}

/// Source of throttle-state snapshots.
///
/// Implementations must be cheap and non-blocking: the engines call this
/// twice per iteration, bracketing the timed region.
pub trait ThermalProbe {
    /// Current throttle state.
    fn query_throttled(&self) -> ThrottleState;
}

impl<P: ThermalProbe + ?Sized> ThermalProbe for &P {
    fn query_throttled(&self) -> ThrottleState {
        (**self).query_throttled()
    }
}

/// Probe that always answers the same thing. `nominal()` opts a run out of
/// throttle detection; scripted states drive tests.
#[derive(Debug, Clone, Copy)]
pub struct ConstantProbe {
    state: ThrottleState,
}

impl ConstantProbe {
    /// Probe that never reports throttling.
    pub fn nominal() -> Self {
        ConstantProbe {
            state: ThrottleState::NOMINAL,
        }
    }

    /// Probe that always reports the given state.
    pub fn always(state: ThrottleState) -> Self {
        ConstantProbe { state }
    }
}

impl ThermalProbe for ConstantProbe {
    fn query_throttled(&self) -> ThrottleState {
        self.state
    }
}

/// Linux probe reading `/sys/class/thermal/thermal_zone*/temp` against a
/// trip point. Zones that cannot be read count as not throttled; a machine
/// without sysfs thermal data simply never throttles by this probe's lights.
#[cfg(target_os = "linux")]
#[derive(Debug, Clone)]
pub struct SysfsThermalProbe {
    trip_millideg: i64,
}

#[cfg(target_os = "linux")]
impl SysfsThermalProbe {
    /// Probe tripping at 80°C, a common passive trip point.
    pub fn new() -> Self {
        Self::with_trip_celsius(80.0)
    }

    /// Probe tripping at the given temperature.
    pub fn with_trip_celsius(celsius: f64) -> Self {
        SysfsThermalProbe {
            trip_millideg: (celsius * 1000.0) as i64,
        }
    }

    /// Hottest readable zone, in millidegrees Celsius.
    fn max_zone_millideg() -> Option<i64> {
        let entries = std::fs::read_dir("/sys/class/thermal").ok()?;
        let mut hottest = None;
        for entry in entries.flatten() {
            if !entry
                .file_name()
                .to_string_lossy()
                .starts_with("thermal_zone")
            {
                continue;
            }
            let reading = std::fs::read_to_string(entry.path().join("temp"))
                .ok()
                .and_then(|raw| raw.trim().parse::<i64>().ok());
            if let Some(millideg) = reading {
                hottest = Some(hottest.map_or(millideg, |h: i64| h.max(millideg)));
            }
        }
        hottest
    }
}

#[cfg(target_os = "linux")]
impl Default for SysfsThermalProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "linux")]
impl ThermalProbe for SysfsThermalProbe {
    fn query_throttled(&self) -> ThrottleState {
        match Self::max_zone_millideg() {
            Some(millideg) if millideg >= self.trip_millideg => {
                ThrottleState::throttled(ThrottleReason::Thermal)
            }
            _ => ThrottleState::NOMINAL,
        }
    }
}

/// Guard's ruling on one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The sample is usable for its phase.
    Keep,
    /// The sample was taken under throttling and must not count.
    Discard,
}

/// Classifies iterations against throttle snapshots and enforces the
/// discard-ratio bound during measurement.
#[derive(Debug)]
pub struct ThrottleGuard {
    enabled: bool,
    max_discard_ratio: f64,
    attempted: u32,
    discarded: u32,
}

impl ThrottleGuard {
    /// Guard with explicit policy.
    pub fn new(enabled: bool, max_discard_ratio: f64) -> Self {
        ThrottleGuard {
            enabled,
            max_discard_ratio,
            attempted: 0,
            discarded: 0,
        }
    }

    /// Guard configured from the run's knobs.
    pub fn from_config(config: &RunConfiguration) -> Self {
        Self::new(config.thermal_guard, config.max_discard_ratio)
    }

    /// Measuring-phase samples discarded so far.
    pub fn discarded(&self) -> u32 {
        self.discarded
    }

    /// Classify one iteration from the snapshots taken around it.
    ///
    /// Warmup discards are silent; measuring discards count toward the ratio
    /// bound and fail the run once they exceed it (after an attempt floor).
    pub fn classify(
        &mut self,
        measuring: bool,
        before: ThrottleState,
        after: ThrottleState,
    ) -> Result<Verdict, EngineError> {
        if !self.enabled {
            return Ok(Verdict::Keep);
        }

        let throttled = before.throttled || after.throttled;
        if !measuring {
            return Ok(if throttled {
                Verdict::Discard
            } else {
                Verdict::Keep
            });
        }

        self.attempted += 1;
        if !throttled {
            return Ok(Verdict::Keep);
        }

        self.discarded += 1;
        debug!(
            reason = ?after.reason.or(before.reason),
            discarded = self.discarded,
            attempted = self.attempted,
            "iteration throttled; sample discarded"
        );

        if self.attempted >= DISCARD_RATIO_FLOOR
            && f64::from(self.discarded) / f64::from(self.attempted) > self.max_discard_ratio
        {
            return Err(EngineError::ThermalInstability {
                discarded: self.discarded,
                attempted: self.attempted,
                max_ratio: self.max_discard_ratio,
            });
        }
        Ok(Verdict::Discard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOT: ThrottleState = ThrottleState {
        throttled: true,
        reason: Some(ThrottleReason::Thermal),
    };

    #[test]
    fn test_warmup_discards_are_silent() {
        let mut guard = ThrottleGuard::new(true, 0.25);
        for _ in 0..100 {
            let verdict = guard.classify(false, HOT, HOT).unwrap();
            assert_eq!(verdict, Verdict::Discard);
        }
        // Nothing counted: warmup throttling is harmless.
        assert_eq!(guard.discarded(), 0);
    }

    #[test]
    fn test_clean_iterations_keep() {
        let mut guard = ThrottleGuard::new(true, 0.25);
        let verdict = guard
            .classify(true, ThrottleState::NOMINAL, ThrottleState::NOMINAL)
            .unwrap();
        assert_eq!(verdict, Verdict::Keep);
    }

    #[test]
    fn test_either_snapshot_throttles() {
        let mut guard = ThrottleGuard::new(true, 1.0);
        assert_eq!(
            guard.classify(true, HOT, ThrottleState::NOMINAL).unwrap(),
            Verdict::Discard
        );
        assert_eq!(
            guard.classify(true, ThrottleState::NOMINAL, HOT).unwrap(),
            Verdict::Discard
        );
    }

    #[test]
    fn test_permanently_throttled_run_fails_at_floor() {
        let mut guard = ThrottleGuard::new(true, 0.25);
        for attempt in 1..DISCARD_RATIO_FLOOR {
            let verdict = guard.classify(true, HOT, HOT).unwrap();
            assert_eq!(verdict, Verdict::Discard, "attempt {attempt}");
        }
        let err = guard.classify(true, HOT, HOT).unwrap_err();
        assert!(matches!(err, EngineError::ThermalInstability { .. }));
    }

    #[test]
    fn test_single_blip_survives() {
        let mut guard = ThrottleGuard::new(true, 0.25);
        guard.classify(true, HOT, HOT).unwrap();
        for _ in 0..20 {
            guard
                .classify(true, ThrottleState::NOMINAL, ThrottleState::NOMINAL)
                .unwrap();
        }
        assert_eq!(guard.discarded(), 1);
    }

    #[test]
    fn test_disabled_guard_keeps_everything() {
        let mut guard = ThrottleGuard::new(false, 0.25);
        for _ in 0..100 {
            let verdict = guard.classify(true, HOT, HOT).unwrap();
            assert_eq!(verdict, Verdict::Keep);
        }
        assert_eq!(guard.discarded(), 0);
    }
}
