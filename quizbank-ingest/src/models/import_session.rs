//! Batch import state machine
//!
//! A batch moves through four states and always reaches the terminal one:
//! RECEIVED → VALIDATING → PERSISTING → REPORTED
//!
//! A batch with no valid records goes straight from VALIDATING to REPORTED.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::import_result::ContentOwner;

/// Batch import state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BatchState {
    /// Records accepted, owner tag checked
    Received,
    /// Validation engine running over the whole batch
    Validating,
    /// Valid records going through media resolution and persistence
    Persisting,
    /// Report produced
    Reported,
}

/// State transition event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub batch_id: Uuid,
    pub old_state: BatchState,
    pub new_state: BatchState,
    pub transitioned_at: DateTime<Utc>,
}

/// In-memory batch bookkeeping
#[derive(Debug, Clone, Serialize)]
pub struct BatchSession {
    /// Unique batch identifier, carried in every log line for the batch
    pub batch_id: Uuid,

    /// Current state
    pub state: BatchState,

    /// Content owner applied to every record
    pub created_by: ContentOwner,

    /// Records received
    pub total_records: usize,

    /// Records persisted
    pub success_count: usize,

    /// Records that failed persistence
    pub failure_count: usize,

    /// Failure messages, capped at `max_failures`
    pub failures: Vec<String>,

    #[serde(skip)]
    max_failures: usize,

    pub started_at: DateTime<Utc>,

    pub ended_at: Option<DateTime<Utc>>,
}

impl BatchSession {
    pub fn new(created_by: ContentOwner, total_records: usize, max_failures: usize) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            state: BatchState::Received,
            created_by,
            total_records,
            success_count: 0,
            failure_count: 0,
            failures: Vec::new(),
            max_failures,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to new state
    pub fn transition_to(&mut self, new_state: BatchState) -> StateTransition {
        let transition = StateTransition {
            batch_id: self.batch_id,
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.state = new_state;

        if new_state == BatchState::Reported {
            self.ended_at = Some(Utc::now());
        }

        tracing::debug!(
            batch_id = %self.batch_id,
            from = ?transition.old_state,
            to = ?transition.new_state,
            "Batch state transition"
        );

        transition
    }

    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    /// Count a failed record; the message is kept only while under the cap
    pub fn record_failure(&mut self, message: String) {
        self.failure_count += 1;
        if self.failures.len() < self.max_failures {
            self.failures.push(message);
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state == BatchState::Reported
    }

    /// Elapsed milliseconds since the batch was received
    pub fn elapsed_ms(&self) -> i64 {
        (self.ended_at.unwrap_or_else(Utc::now) - self.started_at).num_milliseconds()
    }
}
