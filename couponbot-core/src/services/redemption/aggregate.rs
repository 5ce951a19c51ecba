use chrono::{DateTime, Utc};

use couponbot_common::models::RedemptionOutcome;

/// Overall classification of a batch, used to colour the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    AllSuccess,
    PartialSuccess,
    AllFailure,
}

impl Severity {
    /// Pure function of the success/total counts; outcome order does not matter.
    /// An empty slice has nothing that succeeded and classifies as `AllFailure`.
    pub fn classify(outcomes: &[RedemptionOutcome]) -> Severity {
        Self::from_counts(success_count(outcomes), outcomes.len())
    }

    pub fn from_counts(successes: usize, total: usize) -> Severity {
        if successes == 0 {
            Severity::AllFailure
        } else if successes == total {
            Severity::AllSuccess
        } else {
            Severity::PartialSuccess
        }
    }
}

pub fn success_count(outcomes: &[RedemptionOutcome]) -> usize {
    outcomes.iter().filter(|o| o.succeeded).count()
}

/// Everything one `!redeem` produced, in the order the accounts were processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub code: String,
    pub outcomes: Vec<RedemptionOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchResult {
    pub fn success_count(&self) -> usize {
        success_count(&self.outcomes)
    }

    pub fn total_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn severity(&self) -> Severity {
        Severity::classify(&self.outcomes)
    }
}
