//! The workflow engine: runs the six stages in order and builds the report.

use super::retry::{FixedDelay, RetryPolicy};
use super::runner::StageRunner;
use crate::cancellation::CancellationToken;
use crate::capabilities::{
    CollaboratorKind, CollaboratorMode, Collaborators, DesignSystemBuilder, PrototypeBuilder,
    TrendSource, UxAnalyzer,
};
use crate::config::WorkflowConfig;
use crate::core::StageId;
use crate::errors::{ConfigError, InitError, StageError};
use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
use crate::sinks::{ReportSink, StorageSink};
use crate::stages::{StageExecutor, StageInput, StageRegistry};
use crate::workflow::{aggregate, WorkflowReport, WorkflowRun};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};

/// Runs workflows.
///
/// Collaborators are resolved once, when the engine is built. The engine
/// keeps no state between `execute` calls.
pub struct WorkflowEngine {
    collaborators: Collaborators,
    registry: StageRegistry,
    retry_policy: Option<Arc<dyn RetryPolicy>>,
    storage_sink: Option<Arc<dyn StorageSink>>,
    report_sink: Option<Arc<dyn ReportSink>>,
    events: Arc<dyn EventSink>,
}

impl fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("collaborators", &self.collaborators)
            .field("registry", &self.registry)
            .field("retry_policy", &self.retry_policy)
            .field("storage_sink", &self.storage_sink.is_some())
            .field("report_sink", &self.report_sink.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl WorkflowEngine {
    /// Starts building an engine.
    #[must_use]
    pub fn builder() -> WorkflowEngineBuilder {
        WorkflowEngineBuilder::default()
    }

    /// Mode each collaborator was resolved to.
    #[must_use]
    pub fn collaborator_modes(&self) -> Vec<(CollaboratorKind, CollaboratorMode)> {
        self.collaborators.modes()
    }

    /// The stages this engine runs.
    #[must_use]
    pub const fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    /// Runs the workflow after validating the config.
    pub async fn execute_checked(
        &self,
        config: WorkflowConfig,
    ) -> Result<WorkflowReport, ConfigError> {
        config.validate()?;
        Ok(self.execute(config).await)
    }

    /// Runs the workflow to completion or to the first exhausted stage.
    ///
    /// Never fails; the report's status says how far the run got.
    pub async fn execute(&self, config: WorkflowConfig) -> WorkflowReport {
        let cancel = CancellationToken::new();
        self.execute_with_cancel(config, &cancel).await
    }

    /// Like [`WorkflowEngine::execute`], stopping early once `cancel` fires.
    pub async fn execute_with_cancel(
        &self,
        config: WorkflowConfig,
        cancel: &CancellationToken,
    ) -> WorkflowReport {
        let run = WorkflowRun::new(config);
        let span = info_span!("workflow", run_id = %run.run_id());
        self.drive(run, cancel).instrument(span).await
    }

    async fn drive(&self, mut run: WorkflowRun, cancel: &CancellationToken) -> WorkflowReport {
        let events: &dyn EventSink = if run.config().enable_monitoring {
            self.events.as_ref()
        } else {
            &NoOpEventSink
        };
        let policy: Arc<dyn RetryPolicy> = self
            .retry_policy
            .clone()
            .unwrap_or_else(|| Arc::new(FixedDelay::from_config(run.config())));

        info!(
            topic = %run.config().topic,
            max_retries = policy.max_retries().min(run.config().max_retries),
            stages = self.registry.len(),
            "workflow started"
        );
        events
            .emit("workflow.started", serde_json::to_value(run.status_snapshot()).ok())
            .await;

        let runner = StageRunner {
            policy: policy.as_ref(),
            timeout: run.config().stage_timeout,
            events,
            cancel,
        };

        for registered in self.registry.iter() {
            if cancel.is_cancelled() {
                let halted = StageError::Cancelled(cancel.reason().unwrap_or_default());
                warn!(stage = %registered.id, reason = %halted, "workflow cancelled before stage");
                run.halt(halted.to_string());
                break;
            }

            run.begin(registered.id);
            let record = {
                let input = StageInput {
                    stage: registered.id,
                    run_id: run.run_id(),
                    config: run.config(),
                    previous: run.last_output(),
                    run_started_at: run.started_at(),
                    elapsed: run.elapsed(),
                    cancel,
                };
                runner.run_stage(registered.executor.as_ref(), &input).await
            };

            let failure = (!record.is_completed()).then(|| {
                format!(
                    "{} failed: {}",
                    registered.id,
                    record.error().unwrap_or("unknown error")
                )
            });
            if let Err(err) = run.record(record) {
                error!(stage = %registered.id, error = %err, "stage record rejected");
                run.halt(err.to_string());
                break;
            }
            if let Some(reason) = failure {
                run.halt(reason);
                break;
            }
        }

        run.finish();
        let report = aggregate(&run, self.registry.len(), &self.collaborators.modes());

        info!(
            status = %report.status,
            successful_stages = %report.successful_stages,
            total_time = %report.metrics.total_time,
            "workflow finished"
        );
        events
            .emit(
                "workflow.completed",
                Some(json!({
                    "run_id": report.run_id,
                    "status": report.status,
                    "successful_stages": report.successful_stages,
                    "total_duration_secs": report.metrics.total_duration_secs,
                })),
            )
            .await;

        self.deliver(&report, run.config(), events).await;
        report
    }

    /// Hands the report to the configured sinks. Failures are logged only.
    async fn deliver(&self, report: &WorkflowReport, config: &WorkflowConfig, events: &dyn EventSink) {
        if config.save_to_storage {
            match &self.storage_sink {
                Some(sink) => {
                    if let Err(err) = sink.persist(report).await {
                        warn!(sink = "storage", error = %err, "failed to persist report");
                        events
                            .emit(
                                "sink.failed",
                                Some(json!({
                                    "run_id": report.run_id,
                                    "sink": "storage",
                                    "error": err.to_string(),
                                })),
                            )
                            .await;
                    }
                }
                None => warn!("storage sink not configured, skipping save"),
            }
        }

        if config.publish_report {
            match &self.report_sink {
                Some(sink) => {
                    if let Err(err) = sink.publish(report).await {
                        warn!(sink = "report", error = %err, "failed to publish report");
                        events
                            .emit(
                                "sink.failed",
                                Some(json!({
                                    "run_id": report.run_id,
                                    "sink": "report",
                                    "error": err.to_string(),
                                })),
                            )
                            .await;
                    }
                }
                None => warn!("report sink not configured, skipping publish"),
            }
        }
    }
}

/// Builder for [`WorkflowEngine`].
///
/// Any collaborator that is not supplied, or whose construction failed,
/// is replaced by its mock when [`WorkflowEngineBuilder::build`] runs.
#[derive(Default)]
pub struct WorkflowEngineBuilder {
    trend_source: Option<Result<Arc<dyn TrendSource>, InitError>>,
    ux_analyzer: Option<Result<Arc<dyn UxAnalyzer>, InitError>>,
    design_system_builder: Option<Result<Arc<dyn DesignSystemBuilder>, InitError>>,
    prototype_builder: Option<Result<Arc<dyn PrototypeBuilder>, InitError>>,
    overrides: Vec<(StageId, Arc<dyn StageExecutor>)>,
    retry_policy: Option<Arc<dyn RetryPolicy>>,
    storage_sink: Option<Arc<dyn StorageSink>>,
    report_sink: Option<Arc<dyn ReportSink>>,
    event_sink: Option<Arc<dyn EventSink>>,
}

impl fmt::Debug for WorkflowEngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowEngineBuilder")
            .field("overrides", &self.overrides)
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}

impl WorkflowEngineBuilder {
    /// Uses a real trend source.
    #[must_use]
    pub fn trend_source(self, source: impl TrendSource + 'static) -> Self {
        self.try_trend_source(Ok(source))
    }

    /// Uses the trend source if it was constructed, the mock otherwise.
    #[must_use]
    pub fn try_trend_source<T: TrendSource + 'static>(mut self, attempt: Result<T, InitError>) -> Self {
        self.trend_source = Some(attempt.map(|source| Arc::new(source) as Arc<dyn TrendSource>));
        self
    }

    /// Uses a real UX analyzer.
    #[must_use]
    pub fn ux_analyzer(self, analyzer: impl UxAnalyzer + 'static) -> Self {
        self.try_ux_analyzer(Ok(analyzer))
    }

    /// Uses the UX analyzer if it was constructed, the mock otherwise.
    #[must_use]
    pub fn try_ux_analyzer<T: UxAnalyzer + 'static>(mut self, attempt: Result<T, InitError>) -> Self {
        self.ux_analyzer = Some(attempt.map(|analyzer| Arc::new(analyzer) as Arc<dyn UxAnalyzer>));
        self
    }

    /// Uses a real design-system builder.
    #[must_use]
    pub fn design_system_builder(self, builder: impl DesignSystemBuilder + 'static) -> Self {
        self.try_design_system_builder(Ok(builder))
    }

    /// Uses the design-system builder if it was constructed, the mock otherwise.
    #[must_use]
    pub fn try_design_system_builder<T: DesignSystemBuilder + 'static>(
        mut self,
        attempt: Result<T, InitError>,
    ) -> Self {
        self.design_system_builder =
            Some(attempt.map(|builder| Arc::new(builder) as Arc<dyn DesignSystemBuilder>));
        self
    }

    /// Uses a real prototype builder.
    #[must_use]
    pub fn prototype_builder(self, builder: impl PrototypeBuilder + 'static) -> Self {
        self.try_prototype_builder(Ok(builder))
    }

    /// Uses the prototype builder if it was constructed, the mock otherwise.
    #[must_use]
    pub fn try_prototype_builder<T: PrototypeBuilder + 'static>(
        mut self,
        attempt: Result<T, InitError>,
    ) -> Self {
        self.prototype_builder =
            Some(attempt.map(|builder| Arc::new(builder) as Arc<dyn PrototypeBuilder>));
        self
    }

    /// Replaces the executor for one stage.
    #[must_use]
    pub fn stage_executor(mut self, stage: StageId, executor: Arc<dyn StageExecutor>) -> Self {
        self.overrides.push((stage, executor));
        self
    }

    /// Overrides the retry policy built from each run's config.
    ///
    /// The policy supplies the delays. Its retry budget can only tighten the
    /// run config's `max_retries`, never extend it.
    #[must_use]
    pub fn retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.retry_policy = Some(Arc::new(policy));
        self
    }

    /// Sets the storage sink.
    #[must_use]
    pub fn storage_sink(mut self, sink: Arc<dyn StorageSink>) -> Self {
        self.storage_sink = Some(sink);
        self
    }

    /// Sets the report-publishing sink.
    #[must_use]
    pub fn report_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.report_sink = Some(sink);
        self
    }

    /// Sets the monitoring event sink. Defaults to [`LoggingEventSink`].
    #[must_use]
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Resolves collaborators and binds stage executors.
    #[must_use]
    pub fn build(self) -> WorkflowEngine {
        let collaborators = Collaborators::resolve(
            self.trend_source
                .unwrap_or_else(|| Err(InitError::not_provided(CollaboratorKind::TrendSource.as_str()))),
            self.ux_analyzer
                .unwrap_or_else(|| Err(InitError::not_provided(CollaboratorKind::UxAnalyzer.as_str()))),
            self.design_system_builder.unwrap_or_else(|| {
                Err(InitError::not_provided(
                    CollaboratorKind::DesignSystemBuilder.as_str(),
                ))
            }),
            self.prototype_builder.unwrap_or_else(|| {
                Err(InitError::not_provided(
                    CollaboratorKind::PrototypeBuilder.as_str(),
                ))
            }),
        );

        let registry = self
            .overrides
            .into_iter()
            .fold(StageRegistry::standard(&collaborators), |registry, (stage, executor)| {
                registry.with_executor(stage, executor)
            });

        WorkflowEngine {
            collaborators,
            registry,
            retry_policy: self.retry_policy,
            storage_sink: self.storage_sink,
            report_sink: self.report_sink,
            events: self
                .event_sink
                .unwrap_or_else(|| Arc::new(LoggingEventSink::default())),
        }
    }
}
