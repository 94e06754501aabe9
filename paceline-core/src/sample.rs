//! Raw samples and the per-run collector.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Hard cap on samples recorded per run. A loop that gets here is not going
/// to converge; failing beats unbounded memory growth.
pub const MAX_RECORDED_SAMPLES: usize = 1 << 22;

/// One raw measurement: a single workload invocation or launch.
///
/// Never mutated after creation; the collector appends and readers iterate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationSample {
    /// Position in the recorded sequence, contiguous from zero within a run.
    pub ordinal: u64,
    /// Elapsed wall time of the timed region.
    pub duration_nanos: u64,
    /// Ran during warmup; excluded from statistics.
    pub warmup: bool,
    /// Discarded because the device reported throttling around it.
    pub throttled: bool,
}

impl IterationSample {
    /// A measured, non-discarded sample: the statistics input.
    pub fn retained(&self) -> bool {
        !self.warmup && !self.throttled
    }
}

/// Append-only sample store for one run.
///
/// Single-writer by construction: owned by the engine driving the run, no
/// interior mutability. Ordinals are assigned here, at record time, which is
/// what keeps them contiguous.
#[derive(Debug, Default)]
pub struct SampleCollector {
    samples: Vec<IterationSample>,
    cap: usize,
}

impl SampleCollector {
    /// Collector with the standard capacity cap.
    pub fn new() -> Self {
        Self::with_cap(MAX_RECORDED_SAMPLES)
    }

    /// Collector with a custom cap. Exceeding the cap is an error, never a
    /// silent truncation.
    pub fn with_cap(cap: usize) -> Self {
        SampleCollector {
            samples: Vec::new(),
            cap,
        }
    }

    /// Record one sample, assigning the next ordinal. Returns the ordinal,
    /// or the capacity error once the cap is reached.
    pub fn record(
        &mut self,
        duration_nanos: u64,
        warmup: bool,
        throttled: bool,
    ) -> Result<u64, EngineError> {
        if self.samples.len() >= self.cap {
            return Err(EngineError::Capacity { cap: self.cap });
        }
        let ordinal = self.samples.len() as u64;
        self.samples.push(IterationSample {
            ordinal,
            duration_nanos,
            warmup,
            throttled,
        });
        Ok(ordinal)
    }

    /// The recorded sequence, in iteration order.
    pub fn snapshot(&self) -> &[IterationSample] {
        &self.samples
    }

    /// Consume the collector, keeping the recorded sequence.
    pub fn into_samples(self) -> Vec<IterationSample> {
        self.samples
    }

    /// Durations of retained samples, in iteration order.
    pub fn retained_durations(&self) -> Vec<u64> {
        self.samples
            .iter()
            .filter(|s| s.retained())
            .map(|s| s.duration_nanos)
            .collect()
    }

    /// Count of retained samples.
    pub fn retained_count(&self) -> usize {
        self.samples.iter().filter(|s| s.retained()).count()
    }

    /// Total recorded samples, warmup and discards included.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_are_contiguous() {
        let mut collector = SampleCollector::new();
        for i in 0..10 {
            let ordinal = collector.record(100 + i, false, false).unwrap();
            assert_eq!(ordinal, i);
        }
        for (i, sample) in collector.snapshot().iter().enumerate() {
            assert_eq!(sample.ordinal, i as u64);
        }
    }

    #[test]
    fn test_cap_is_an_error_not_a_truncation() {
        let mut collector = SampleCollector::with_cap(2);
        collector.record(1, false, false).unwrap();
        collector.record(2, false, false).unwrap();

        let err = collector.record(3, false, false).unwrap_err();
        assert!(matches!(err, EngineError::Capacity { cap: 2 }));
        assert_eq!(collector.len(), 2);
    }

    #[test]
    fn test_retained_excludes_warmup_and_throttled() {
        let mut collector = SampleCollector::new();
        collector.record(10, true, false).unwrap();
        collector.record(20, false, true).unwrap();
        collector.record(30, false, false).unwrap();

        assert_eq!(collector.retained_count(), 1);
        assert_eq!(collector.retained_durations(), vec![30]);
        assert_eq!(collector.len(), 3);
    }
}
