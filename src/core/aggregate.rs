//! Per-request outcome collection and run summaries
//!
//! The aggregator owns the "exactly one outcome per request" invariant: a
//! slot per request index, written once, never overwritten. A duplicate
//! write signals a dispatcher bug and is fatal to the run.

use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::errors::DispatchError;

/// Terminal state of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The agent matched an intent
    Success {
        transcript: Option<String>,
        intent: Option<String>,
    },
    /// The call completed but no intent matched
    NoMatch,
    /// The service reported resource exhaustion; this request triggered
    /// batch-wide shutdown
    QuotaExceeded,
    /// An isolated request-level failure
    ApiError(String),
    /// The request never started, or was abandoned after the shutdown signal
    Cancelled,
}

impl Outcome {
    /// Short label for log lines
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success { .. } => "success",
            Outcome::NoMatch => "no-match",
            Outcome::QuotaExceeded => "quota-exceeded",
            Outcome::ApiError(_) => "api-error",
            Outcome::Cancelled => "cancelled",
        }
    }
}

/// Aggregate counts per outcome kind plus total wall-clock duration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub success: usize,
    pub no_match: usize,
    pub quota_exceeded: usize,
    pub api_error: usize,
    pub cancelled: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Total number of recorded outcomes
    pub fn total(&self) -> usize {
        self.success + self.no_match + self.quota_exceeded + self.api_error + self.cancelled
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requests in {:.2}s: {} success, {} no-match, {} quota-exceeded, {} api-error, {} cancelled",
            self.total(),
            self.elapsed.as_secs_f64(),
            self.success,
            self.no_match,
            self.quota_exceeded,
            self.api_error,
            self.cancelled
        )
    }
}

/// Collects one outcome per request index for a single run
pub struct OutcomeAggregator {
    slots: Mutex<Vec<Option<Outcome>>>,
    started: Instant,
}

impl OutcomeAggregator {
    /// Create an aggregator expecting `expected` outcomes; starts the run clock
    pub fn new(expected: usize) -> Self {
        Self {
            slots: Mutex::new(vec![None; expected]),
            started: Instant::now(),
        }
    }

    /// Record the terminal outcome for a request index
    ///
    /// Fails with [`DispatchError::DuplicateOutcome`] if the index was
    /// already recorded; the previously recorded value is preserved.
    pub fn record(&self, index: usize, outcome: Outcome) -> Result<(), DispatchError> {
        let mut slots = self.slots.lock();
        match slots.get_mut(index) {
            Some(slot) => {
                if slot.is_some() {
                    return Err(DispatchError::DuplicateOutcome { index });
                }
                *slot = Some(outcome);
                Ok(())
            }
            None => Err(DispatchError::MissingOutcome { index }),
        }
    }

    /// Build the final summary
    ///
    /// May only be called once every expected index has been recorded; an
    /// empty slot at this point is a dispatcher defect.
    pub fn summarize(&self) -> Result<RunSummary, DispatchError> {
        let slots = self.slots.lock();
        let mut summary = RunSummary {
            elapsed: self.started.elapsed(),
            ..Default::default()
        };

        for (index, slot) in slots.iter().enumerate() {
            match slot {
                Some(Outcome::Success { .. }) => summary.success += 1,
                Some(Outcome::NoMatch) => summary.no_match += 1,
                Some(Outcome::QuotaExceeded) => summary.quota_exceeded += 1,
                Some(Outcome::ApiError(_)) => summary.api_error += 1,
                Some(Outcome::Cancelled) => summary.cancelled += 1,
                None => return Err(DispatchError::MissingOutcome { index }),
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_summarize() {
        let agg = OutcomeAggregator::new(3);
        agg.record(0, Outcome::Success { transcript: None, intent: None }).unwrap();
        agg.record(2, Outcome::Cancelled).unwrap();
        agg.record(1, Outcome::ApiError("boom".into())).unwrap();

        let summary = agg.summarize().unwrap();
        assert_eq!(summary.success, 1);
        assert_eq!(summary.api_error, 1);
        assert_eq!(summary.cancelled, 1);
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn test_duplicate_record_fails_and_preserves_original() {
        let agg = OutcomeAggregator::new(1);
        agg.record(0, Outcome::NoMatch).unwrap();

        let err = agg.record(0, Outcome::Cancelled).unwrap_err();
        assert!(matches!(err, DispatchError::DuplicateOutcome { index: 0 }));

        // The first write wins
        let summary = agg.summarize().unwrap();
        assert_eq!(summary.no_match, 1);
        assert_eq!(summary.cancelled, 0);
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let agg = OutcomeAggregator::new(2);
        let err = agg.record(5, Outcome::NoMatch).unwrap_err();
        assert!(matches!(err, DispatchError::MissingOutcome { index: 5 }));
    }

    #[test]
    fn test_summarize_rejects_missing_outcomes() {
        let agg = OutcomeAggregator::new(2);
        agg.record(0, Outcome::NoMatch).unwrap();
        let err = agg.summarize().unwrap_err();
        assert!(matches!(err, DispatchError::MissingOutcome { index: 1 }));
    }

    #[test]
    fn test_empty_run_summarizes_to_zero() {
        let agg = OutcomeAggregator::new(0);
        let summary = agg.summarize().unwrap();
        assert_eq!(summary.total(), 0);
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            success: 4,
            cancelled: 2,
            elapsed: Duration::from_millis(1500),
            ..Default::default()
        };
        let line = summary.to_string();
        assert!(line.contains("6 requests"));
        assert!(line.contains("4 success"));
        assert!(line.contains("2 cancelled"));
    }
}
