//! Test assertions for workflow reports.

use crate::core::{OverallStatus, StageId, StageStatus};
use crate::workflow::WorkflowReport;

/// Asserts that every declared stage completed.
pub fn assert_report_completed(report: &WorkflowReport) {
    assert_eq!(
        report.status,
        OverallStatus::Completed,
        "Expected a completed run, got {:?} with stages {:?}",
        report.status,
        report.stage_statuses()
    );
}

/// Asserts that the run halted at `stage` and nothing ran after it.
pub fn assert_halted_at(report: &WorkflowReport, stage: StageId) {
    let last = report.stages.last().map(|s| (s.stage, s.status));
    assert_eq!(
        last,
        Some((stage, StageStatus::Failed)),
        "Expected run to halt at {stage}, stages were {:?}",
        report.stage_statuses()
    );
}

/// Asserts that stage records appear in stage order, with no gaps and no
/// record after a failed one.
pub fn assert_stage_order(report: &WorkflowReport) {
    for (position, stage) in report.stages.iter().enumerate() {
        assert_eq!(
            stage.stage.index(),
            position,
            "Stage {} recorded at position {}",
            stage.stage,
            position
        );
        if position + 1 < report.stages.len() {
            assert_eq!(
                stage.status,
                StageStatus::Completed,
                "Stage {} is {} but later stages ran",
                stage.stage,
                stage.status
            );
        }
    }
}

/// Asserts that no stage retried more than `max_retries` times.
pub fn assert_retry_budget(report: &WorkflowReport, max_retries: u32) {
    for stage in &report.stages {
        assert!(
            stage.retry_count <= max_retries,
            "Stage {} retried {} times, budget is {}",
            stage.stage,
            stage.retry_count,
            max_retries
        );
    }
}

/// Asserts that no stage took longer than the whole run.
pub fn assert_durations_within_total(report: &WorkflowReport) {
    for stage in &report.stages {
        assert!(
            stage.duration_secs <= report.metrics.total_duration_secs,
            "Stage {} took {}s, run took {}s",
            stage.stage,
            stage.duration_secs,
            report.metrics.total_duration_secs
        );
    }
}
