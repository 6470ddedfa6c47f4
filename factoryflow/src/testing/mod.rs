//! Testing utilities for factoryflow workflows.
//!
//! This module provides:
//! - Scripted executors for retry scenarios
//! - Failing and recording sinks
//! - Report assertions and a sample report

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_durations_within_total, assert_halted_at, assert_report_completed,
    assert_retry_budget, assert_stage_order,
};
pub use fixtures::sample_report;
pub use mocks::{FailingReportSink, FailingStorageSink, RecordingReportSink, ScriptedExecutor};
