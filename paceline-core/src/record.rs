//! The immutable outcome of a completed run.

use chrono::{DateTime, Utc};
use paceline_stats::{summarize, SummaryStatistics};
use serde::{Deserialize, Serialize};

use crate::config::RunConfiguration;
use crate::definition::TestDefinition;
use crate::sample::IterationSample;

/// Everything a completed run produced, assembled exactly once when the run
/// reaches a terminal phase. Holds the full recorded sequence (warmup and
/// throttled samples included) so ordinals stay contiguous; the `retained_*`
/// accessors give the measurement view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// What was measured.
    pub definition: TestDefinition,
    /// The knobs the run was executed under.
    pub config: RunConfiguration,
    /// Every recorded sample, in recording order.
    pub samples: Vec<IterationSample>,
    /// Whether the run converged, as opposed to hitting the iteration cap.
    pub converged: bool,
    /// Measuring-phase samples discarded for throttling.
    pub discarded: u32,
    /// Summary over the retained samples.
    pub statistics: SummaryStatistics,
    /// When the run completed.
    pub completed_at: DateTime<Utc>,
}

impl MeasurementRecord {
    /// Assemble the record for a run that just reached a terminal phase,
    /// computing statistics over the retained samples.
    pub fn assemble(
        definition: TestDefinition,
        config: RunConfiguration,
        samples: Vec<IterationSample>,
        converged: bool,
        discarded: u32,
    ) -> Self {
        let retained: Vec<u64> = samples
            .iter()
            .filter(|s| s.retained())
            .map(|s| s.duration_nanos)
            .collect();
        MeasurementRecord {
            definition,
            config,
            samples,
            converged,
            discarded,
            statistics: summarize(&retained),
            completed_at: Utc::now(),
        }
    }

    /// Samples that count toward statistics.
    pub fn retained(&self) -> impl Iterator<Item = &IterationSample> {
        self.samples.iter().filter(|s| s.retained())
    }

    /// Number of retained samples.
    pub fn retained_count(&self) -> usize {
        self.retained().count()
    }

    /// Durations of the retained samples, in recording order.
    pub fn retained_durations(&self) -> Vec<u64> {
        self.retained().map(|s| s.duration_nanos).collect()
    }
}
