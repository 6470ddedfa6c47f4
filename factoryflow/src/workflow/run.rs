//! The in-progress record of one workflow execution.

use crate::config::WorkflowConfig;
use crate::core::{StageData, StageId, StageStatus};
use crate::errors::StageError;
use crate::stages::StageResult;
use crate::utils::generate_run_id;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};

/// The mutable record of one `execute` call.
///
/// Stage records are appended strictly in stage order, and a record for
/// stage *k* is accepted only after stage *k-1* completed.
#[derive(Debug, Clone)]
pub struct WorkflowRun {
    run_id: String,
    config: WorkflowConfig,
    stages: Vec<StageResult>,
    current: Option<StageId>,
    started_at: DateTime<Utc>,
    started: Instant,
    ended_at: Option<DateTime<Utc>>,
    total_duration: Option<Duration>,
    halted: Option<String>,
}

/// Status of one stage in a [`RunSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageStatusEntry {
    /// The stage.
    pub stage: StageId,
    /// Its current status.
    pub status: StageStatus,
}

/// A serializable view of a run at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct RunSnapshot {
    /// Run identifier.
    pub run_id: String,
    /// The run's config.
    pub config: WorkflowConfig,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// The stage currently being attempted, if any.
    pub current_stage: Option<StageId>,
    /// Status of every stage reached so far.
    pub stages: Vec<StageStatusEntry>,
}

impl WorkflowRun {
    /// Starts a run with a freshly generated id.
    #[must_use]
    pub fn new(config: WorkflowConfig) -> Self {
        Self::with_id(generate_run_id(), config)
    }

    /// Starts a run with a caller-supplied id.
    #[must_use]
    pub fn with_id(run_id: impl Into<String>, config: WorkflowConfig) -> Self {
        Self {
            run_id: run_id.into(),
            config,
            stages: Vec::new(),
            current: None,
            started_at: Utc::now(),
            started: Instant::now(),
            ended_at: None,
            total_duration: None,
            halted: None,
        }
    }

    /// Run identifier.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// The run's config.
    #[must_use]
    pub const fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Stage records in execution order.
    #[must_use]
    pub fn stages(&self) -> &[StageResult] {
        &self.stages
    }

    /// Looks up the record for a stage.
    #[must_use]
    pub fn stage(&self, id: StageId) -> Option<&StageResult> {
        self.stages.iter().find(|result| result.stage() == id)
    }

    /// Wall-clock start.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Wall-clock end, once finished.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Time since the run started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.total_duration.unwrap_or_else(|| self.started.elapsed())
    }

    /// Total duration, once finished.
    #[must_use]
    pub const fn total_duration(&self) -> Option<Duration> {
        self.total_duration
    }

    /// Returns true once [`WorkflowRun::finish`] has been called.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.ended_at.is_some()
    }

    /// The next stage allowed to run, or `None` if the run halted or is done.
    #[must_use]
    pub fn next_stage(&self) -> Option<StageId> {
        match self.stages.last() {
            None => Some(StageId::TrendCollection),
            Some(last) if last.is_completed() => last.stage().next(),
            Some(_) => None,
        }
    }

    /// Marks `stage` as the one being attempted.
    pub(crate) fn begin(&mut self, stage: StageId) {
        self.current = Some(stage);
    }

    /// Appends a terminal stage record.
    ///
    /// Rejects records that are out of order or not terminal.
    pub(crate) fn record(&mut self, result: StageResult) -> Result<(), StageError> {
        if self.next_stage() != Some(result.stage()) {
            return Err(StageError::Internal(format!(
                "stage {} recorded out of order",
                result.stage()
            )));
        }
        if !result.status().is_terminal() {
            return Err(StageError::Internal(format!(
                "stage {} recorded before reaching a terminal state",
                result.stage()
            )));
        }
        self.current = None;
        self.stages.push(result);
        Ok(())
    }

    /// Records why the run stopped before its last stage. The first reason wins.
    pub(crate) fn halt(&mut self, reason: impl Into<String>) {
        if self.halted.is_none() {
            self.halted = Some(reason.into());
        }
    }

    /// Why the run stopped early, if it did.
    #[must_use]
    pub fn halt_reason(&self) -> Option<&str> {
        self.halted.as_deref()
    }

    /// Sets the end time. Later calls are ignored.
    pub(crate) fn finish(&mut self) {
        if self.ended_at.is_none() {
            self.current = None;
            self.ended_at = Some(Utc::now());
            self.total_duration = Some(self.started.elapsed());
        }
    }

    /// Output of the most recent stage, if it completed.
    #[must_use]
    pub fn last_output(&self) -> Option<&StageData> {
        self.stages.last().and_then(StageResult::output)
    }

    /// Output of a specific completed stage.
    #[must_use]
    pub fn output_of(&self, id: StageId) -> Option<&StageData> {
        self.stage(id).and_then(StageResult::output)
    }

    /// Number of completed stages.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.stages.iter().filter(|result| result.is_completed()).count()
    }

    /// The stage that halted the run, if one failed.
    #[must_use]
    pub fn failed_stage(&self) -> Option<StageId> {
        self.stages
            .iter()
            .find(|result| result.is_failed())
            .map(StageResult::stage)
    }

    /// The stage currently in progress or retrying.
    #[must_use]
    pub const fn current_stage(&self) -> Option<StageId> {
        self.current
    }

    /// A serializable view of where the run stands.
    #[must_use]
    pub fn status_snapshot(&self) -> RunSnapshot {
        let mut stages: Vec<StageStatusEntry> = self
            .stages
            .iter()
            .map(|result| StageStatusEntry {
                stage: result.stage(),
                status: result.status(),
            })
            .collect();
        if let Some(stage) = self.current {
            stages.push(StageStatusEntry {
                stage,
                status: StageStatus::InProgress,
            });
        }

        RunSnapshot {
            run_id: self.run_id.clone(),
            config: self.config.clone(),
            started_at: self.started_at,
            current_stage: self.current,
            stages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn completed(stage: StageId) -> StageResult {
        let mut result = StageResult::pending(stage);
        result.begin_attempt();
        result.complete(StageData::new().with("stage", json!(stage.as_str())));
        result
    }

    fn failed(stage: StageId) -> StageResult {
        let mut result = StageResult::pending(stage);
        result.begin_attempt();
        result.fail("boom");
        result
    }

    #[test]
    fn test_run_id_format() {
        let run = WorkflowRun::new(WorkflowConfig::new("focus"));
        assert!(run.run_id().starts_with("workflow_"));
        assert_eq!(run.run_id().len(), "workflow_".len() + 32);
    }

    #[test]
    fn test_records_in_order() {
        let mut run = WorkflowRun::new(WorkflowConfig::new("focus"));
        run.record(completed(StageId::TrendCollection)).unwrap();
        run.record(completed(StageId::UxAnalysis)).unwrap();

        assert_eq!(run.completed_count(), 2);
        assert_eq!(run.next_stage(), Some(StageId::DesignSystem));
        assert_eq!(
            run.last_output().unwrap().get("stage"),
            Some(&json!("ux_analysis"))
        );
    }

    #[test]
    fn test_rejects_out_of_order_record() {
        let mut run = WorkflowRun::new(WorkflowConfig::new("focus"));
        let err = run.record(completed(StageId::DesignSystem)).unwrap_err();
        assert!(err.to_string().contains("out of order"));
        assert!(run.stages().is_empty());
    }

    #[test]
    fn test_no_record_after_failure() {
        let mut run = WorkflowRun::new(WorkflowConfig::new("focus"));
        run.record(completed(StageId::TrendCollection)).unwrap();
        run.record(failed(StageId::UxAnalysis)).unwrap();

        assert_eq!(run.next_stage(), None);
        assert_eq!(run.failed_stage(), Some(StageId::UxAnalysis));
        assert!(run.last_output().is_none());
        assert!(run.record(completed(StageId::DesignSystem)).is_err());
    }

    #[test]
    fn test_output_of_only_completed_stages() {
        let mut run = WorkflowRun::new(WorkflowConfig::new("focus"));
        run.record(completed(StageId::TrendCollection)).unwrap();
        run.record(failed(StageId::UxAnalysis)).unwrap();

        assert_eq!(
            run.output_of(StageId::TrendCollection).unwrap().get("stage"),
            Some(&json!("trend_collection"))
        );
        assert!(run.output_of(StageId::UxAnalysis).is_none());
        assert!(run.output_of(StageId::Reporting).is_none());
    }

    #[test]
    fn test_first_halt_reason_wins() {
        let mut run = WorkflowRun::new(WorkflowConfig::new("focus"));
        assert_eq!(run.halt_reason(), None);

        run.halt("cancelled: shutdown");
        run.halt("ux_analysis failed: boom");
        assert_eq!(run.halt_reason(), Some("cancelled: shutdown"));
    }

    #[test]
    fn test_rejects_non_terminal_record() {
        let mut run = WorkflowRun::new(WorkflowConfig::new("focus"));
        let err = run
            .record(StageResult::pending(StageId::TrendCollection))
            .unwrap_err();
        assert!(err.to_string().contains("terminal"));
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut run = WorkflowRun::new(WorkflowConfig::new("focus"));
        run.finish();
        let ended = run.ended_at();
        let total = run.total_duration();
        run.finish();

        assert!(run.is_finished());
        assert_eq!(run.ended_at(), ended);
        assert_eq!(run.total_duration(), total);
        assert_eq!(run.elapsed(), total.unwrap());
    }

    #[test]
    fn test_snapshot_reports_current_stage() {
        let mut run = WorkflowRun::with_id("workflow_snap", WorkflowConfig::new("focus"));
        run.record(completed(StageId::TrendCollection)).unwrap();
        run.begin(StageId::UxAnalysis);

        assert_eq!(run.current_stage(), Some(StageId::UxAnalysis));
        let snapshot = serde_json::to_value(run.status_snapshot()).unwrap();
        assert_eq!(snapshot["run_id"], "workflow_snap");
        assert_eq!(snapshot["current_stage"], "ux_analysis");
        assert_eq!(snapshot["stages"][0]["status"], "completed");
        assert_eq!(snapshot["stages"][1]["status"], "in_progress");
        assert_eq!(snapshot["config"]["topic"], "focus");
    }
}
