//! The per-stage retry loop.

use super::retry::RetryPolicy;
use crate::cancellation::CancellationToken;
use crate::core::StageData;
use crate::errors::StageError;
use crate::events::EventSink;
use crate::stages::{StageExecutor, StageInput, StageResult};
use serde_json::json;
use std::time::Duration;
use tracing::{error, info, warn};

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Runs one stage to a terminal state.
///
/// Every attempt is bounded by the optional timeout and raced against
/// cancellation, as is every retry delay.
pub(crate) struct StageRunner<'a> {
    pub(crate) policy: &'a dyn RetryPolicy,
    pub(crate) timeout: Option<Duration>,
    pub(crate) events: &'a dyn EventSink,
    pub(crate) cancel: &'a CancellationToken,
}

impl StageRunner<'_> {
    fn cancelled_error(&self) -> StageError {
        StageError::Cancelled(self.cancel.reason().unwrap_or_else(|| "cancelled".to_string()))
    }

    async fn attempt(
        &self,
        executor: &dyn StageExecutor,
        input: &StageInput<'_>,
    ) -> Result<StageData, StageError> {
        let bounded = async {
            let run = executor.execute(input);
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, run)
                    .await
                    .unwrap_or(Err(StageError::Timeout(limit))),
                None => run.await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(self.cancelled_error()),
            result = bounded => result,
        }
    }

    /// Attempts the stage up to `max_retries + 1` times, where `max_retries`
    /// is the smaller of the policy's and the run config's budget.
    pub(crate) async fn run_stage(
        &self,
        executor: &dyn StageExecutor,
        input: &StageInput<'_>,
    ) -> StageResult {
        let stage = input.stage;
        let run_id = input.run_id;
        let max_attempts = self
            .policy
            .max_attempts()
            .min(input.config.max_retries.saturating_add(1));
        let mut record = StageResult::pending(stage);
        let mut attempt: u32 = 1;

        loop {
            record.begin_attempt();
            info!(run_id = %run_id, stage = %stage, attempt, max_attempts, "stage attempt started");
            self.events
                .emit(
                    "stage.started",
                    Some(json!({"run_id": run_id, "stage": stage, "attempt": attempt})),
                )
                .await;

            let err = match self.attempt(executor, input).await {
                Ok(output) => {
                    record.complete(output);
                    let duration_ms = record.duration().map_or(0, millis);
                    info!(
                        run_id = %run_id,
                        stage = %stage,
                        retry_count = record.retry_count(),
                        duration_ms,
                        "stage completed"
                    );
                    self.events
                        .emit(
                            "stage.completed",
                            Some(json!({
                                "run_id": run_id,
                                "stage": stage,
                                "retry_count": record.retry_count(),
                                "duration_ms": duration_ms,
                            })),
                        )
                        .await;
                    return record;
                }
                Err(err) => err,
            };

            let message = err.to_string();
            record.record_error(message.clone());

            if !err.is_retryable() || attempt >= max_attempts {
                return self.give_up(record, input, message).await;
            }

            record.schedule_retry();
            let delay = self.policy.delay_for(attempt);
            warn!(
                run_id = %run_id,
                stage = %stage,
                attempt,
                delay_ms = millis(delay),
                error = %message,
                "stage attempt failed, retrying"
            );
            self.events
                .emit(
                    "stage.retrying",
                    Some(json!({
                        "run_id": run_id,
                        "stage": stage,
                        "attempt": attempt,
                        "delay_ms": millis(delay),
                        "error": message,
                    })),
                )
                .await;

            let interrupted = tokio::select! {
                biased;
                () = self.cancel.cancelled() => true,
                () = tokio::time::sleep(delay) => false,
            };
            if interrupted {
                // Resume before failing; Failed is only reachable from InProgress.
                record.begin_attempt();
                let message = self.cancelled_error().to_string();
                return self.give_up(record, input, message).await;
            }

            record.increment_retry();
            attempt += 1;
        }
    }

    async fn give_up(
        &self,
        mut record: StageResult,
        input: &StageInput<'_>,
        message: String,
    ) -> StageResult {
        record.fail(message.clone());
        error!(
            run_id = %input.run_id,
            stage = %input.stage,
            retry_count = record.retry_count(),
            error = %message,
            "stage failed"
        );
        self.events
            .emit(
                "stage.failed",
                Some(json!({
                    "run_id": input.run_id,
                    "stage": input.stage,
                    "retry_count": record.retry_count(),
                    "error": message,
                })),
            )
            .await;
        record
    }
}
