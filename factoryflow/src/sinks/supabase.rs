//! Storage sink backed by a Supabase (PostgREST) table.

use super::StorageSink;
use crate::errors::{InitError, SinkError};
use crate::workflow::WorkflowReport;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

const TABLE: &str = "ai_app_workflows";

/// Project URL and service key for Supabase.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// API key sent as both `apikey` and bearer token.
    pub key: String,
}

impl SupabaseConfig {
    /// Reads `SUPABASE_URL` and `SUPABASE_KEY`.
    pub fn from_env() -> Result<Self, InitError> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|value| !value.is_empty())
                .ok_or_else(|| InitError::missing_env("supabase_storage_sink", name))
        };
        Ok(Self {
            url: read("SUPABASE_URL")?,
            key: read("SUPABASE_KEY")?,
        })
    }
}

#[derive(Debug, Serialize)]
struct WorkflowRow<'a> {
    workflow_id: &'a str,
    trend_keyword: &'a str,
    category: Option<&'a str>,
    status: String,
    total_duration: f64,
    successful_stages: &'a str,
    result_data: String,
    created_at: String,
}

impl<'a> WorkflowRow<'a> {
    fn from_report(report: &'a WorkflowReport) -> Result<Self, SinkError> {
        Ok(Self {
            workflow_id: &report.run_id,
            trend_keyword: &report.config.topic,
            category: report.config.category.as_deref(),
            status: report.status.to_string(),
            total_duration: report.metrics.total_duration_secs,
            successful_stages: &report.successful_stages,
            result_data: serde_json::to_string(report)?,
            created_at: report.started_at.to_rfc3339(),
        })
    }
}

/// Inserts each report as a row in the `ai_app_workflows` table.
#[derive(Debug, Clone)]
pub struct SupabaseStorageSink {
    client: reqwest::Client,
    config: SupabaseConfig,
}

impl SupabaseStorageSink {
    /// Creates the sink.
    pub fn new(config: SupabaseConfig) -> Result<Self, InitError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| InitError::new("supabase_storage_sink", e.to_string()))?;
        Ok(Self { client, config })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{TABLE}", self.config.url.trim_end_matches('/'))
    }
}

#[async_trait]
impl StorageSink for SupabaseStorageSink {
    async fn persist(&self, report: &WorkflowReport) -> Result<(), SinkError> {
        let row = WorkflowRow::from_report(report)?;
        let response = self
            .client
            .post(self.table_url())
            .header("apikey", &self.config.key)
            .bearer_auth(&self.config.key)
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                sink: "supabase",
                status: status.as_u16(),
                body,
            });
        }

        info!(run_id = %report.run_id, table = TABLE, "report stored in supabase");
        Ok(())
    }
}
