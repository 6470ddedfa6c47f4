//! Scripted executors and sinks for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::core::StageData;
use crate::errors::{SinkError, StageError};
use crate::sinks::{ReportSink, StorageSink};
use crate::stages::{StageExecutor, StageInput};
use crate::workflow::WorkflowReport;

/// An executor that fails a scripted number of times, then succeeds.
///
/// On success it delegates to an inner executor if one was given, otherwise
/// it returns a fixed output. Every call and every received input is recorded.
#[derive(Debug)]
pub struct ScriptedExecutor {
    failures: Option<usize>,
    inner: Option<Arc<dyn StageExecutor>>,
    output: StageData,
    calls: AtomicUsize,
    inputs: Mutex<Vec<Option<StageData>>>,
}

impl ScriptedExecutor {
    /// Fails the first `n` calls.
    #[must_use]
    pub fn failing_first(n: usize) -> Self {
        Self {
            failures: Some(n),
            inner: None,
            output: StageData::new(),
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call.
    #[must_use]
    pub fn always_failing() -> Self {
        Self {
            failures: None,
            ..Self::failing_first(0)
        }
    }

    /// Delegates successful calls to `inner`.
    #[must_use]
    pub fn then(mut self, inner: Arc<dyn StageExecutor>) -> Self {
        self.inner = Some(inner);
        self
    }

    /// Returns `output` on successful calls when there is no inner executor.
    #[must_use]
    pub fn with_output(mut self, output: StageData) -> Self {
        self.output = output;
        self
    }

    /// Number of times the executor was invoked.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The previous-stage output seen by each call.
    #[must_use]
    pub fn seen_inputs(&self) -> Vec<Option<StageData>> {
        self.inputs.lock().clone()
    }
}

#[async_trait]
impl StageExecutor for ScriptedExecutor {
    async fn execute(&self, input: &StageInput<'_>) -> Result<StageData, StageError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.inputs.lock().push(input.previous.cloned());

        let fails = self.failures.map_or(true, |n| call <= n);
        if fails {
            return Err(StageError::capability(
                "scripted",
                anyhow::anyhow!("scripted failure {call}"),
            ));
        }

        match &self.inner {
            Some(inner) => inner.execute(input).await,
            None => Ok(self.output.clone()),
        }
    }
}

/// A storage sink that always fails.
#[derive(Debug, Default)]
pub struct FailingStorageSink {
    calls: AtomicUsize,
}

impl FailingStorageSink {
    /// Creates a new failing storage sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persist attempts.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageSink for FailingStorageSink {
    async fn persist(&self, _report: &WorkflowReport) -> Result<(), SinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::Http("storage unreachable".to_string()))
    }
}

/// A report sink that always fails.
#[derive(Debug, Default)]
pub struct FailingReportSink {
    calls: AtomicUsize,
}

impl FailingReportSink {
    /// Creates a new failing report sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of publish attempts.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportSink for FailingReportSink {
    async fn publish(&self, _report: &WorkflowReport) -> Result<(), SinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::Rejected {
            sink: "failing",
            status: 503,
            body: "service unavailable".to_string(),
        })
    }
}

/// A report sink that keeps every published report.
#[derive(Debug, Default)]
pub struct RecordingReportSink {
    reports: Mutex<Vec<WorkflowReport>>,
}

impl RecordingReportSink {
    /// Creates a new recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports published so far.
    #[must_use]
    pub fn reports(&self) -> Vec<WorkflowReport> {
        self.reports.lock().clone()
    }
}

#[async_trait]
impl ReportSink for RecordingReportSink {
    async fn publish(&self, report: &WorkflowReport) -> Result<(), SinkError> {
        self.reports.lock().push(report.clone());
        Ok(())
    }
}
