use chrono::{DateTime, Utc};
use serde::Serialize;

use super::state::SharedState;

/// What happened during one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Node ids in completion order
    pub executed: Vec<String>,
    /// Node ids that never became ready
    pub unreached: Vec<String>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.unreached.is_empty()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Final state plus the run report
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub state: SharedState,
    pub report: RunReport,
}
