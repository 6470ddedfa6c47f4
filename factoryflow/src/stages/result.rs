//! Per-stage execution record.

use crate::core::{StageData, StageId, StageStatus};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::debug;

/// The execution record of one stage within a run.
///
/// Created when the stage is reached, updated by the retry loop, and frozen
/// once it reaches `Completed` or `Failed`. Transition methods are no-ops on
/// a terminal record.
#[derive(Debug, Clone)]
pub struct StageResult {
    stage: StageId,
    status: StageStatus,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    started: Instant,
    duration: Option<Duration>,
    retry_count: u32,
    error: Option<String>,
    output: Option<StageData>,
}

impl StageResult {
    /// Creates a pending record starting now.
    #[must_use]
    pub fn pending(stage: StageId) -> Self {
        Self {
            stage,
            status: StageStatus::Pending,
            started_at: Utc::now(),
            ended_at: None,
            started: Instant::now(),
            duration: None,
            retry_count: 0,
            error: None,
            output: None,
        }
    }

    /// The stage this record belongs to.
    #[must_use]
    pub const fn stage(&self) -> StageId {
        self.stage
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> StageStatus {
        self.status
    }

    /// When the first attempt was scheduled.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the record became terminal.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Wall time across all attempts and delays, once terminal.
    #[must_use]
    pub const fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Number of retries performed.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// The most recent error message, if any attempt failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The stage output, present only when completed.
    #[must_use]
    pub const fn output(&self) -> Option<&StageData> {
        self.output.as_ref()
    }

    /// Returns true if the stage completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == StageStatus::Completed
    }

    /// Returns true if the stage failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status == StageStatus::Failed
    }

    fn transition(&mut self, to: StageStatus) -> bool {
        if !self.status.can_transition_to(to) {
            debug!(stage = %self.stage, from = %self.status, to = %to, "ignoring invalid stage transition");
            return false;
        }
        self.status = to;
        true
    }

    fn seal(&mut self) {
        self.ended_at = Some(Utc::now());
        self.duration = Some(self.started.elapsed());
    }

    /// Marks an attempt as running.
    pub(crate) fn begin_attempt(&mut self) {
        self.transition(StageStatus::InProgress);
    }

    /// Records a failed attempt's error without changing status.
    pub(crate) fn record_error(&mut self, message: impl Into<String>) {
        if !self.status.is_terminal() {
            self.error = Some(message.into());
        }
    }

    /// Marks the stage as waiting for another attempt.
    pub(crate) fn schedule_retry(&mut self) {
        self.transition(StageStatus::Retrying);
    }

    /// Counts a retry that is about to start.
    pub(crate) fn increment_retry(&mut self) {
        if !self.status.is_terminal() {
            self.retry_count += 1;
        }
    }

    /// Completes the stage with its output.
    pub(crate) fn complete(&mut self, output: StageData) {
        if self.transition(StageStatus::Completed) {
            self.output = Some(output);
            self.seal();
        }
    }

    /// Fails the stage with a final error.
    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        if self.transition(StageStatus::Failed) {
            self.error = Some(message.into());
            self.seal();
        }
    }
}
