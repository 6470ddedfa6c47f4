//! Storage sink that writes reports as JSON files.

use super::StorageSink;
use crate::errors::SinkError;
use crate::workflow::WorkflowReport;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes each report to `<dir>/<run_id>.json`.
#[derive(Debug, Clone)]
pub struct FileStorageSink {
    dir: PathBuf,
}

impl FileStorageSink {
    /// Creates a sink rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory reports are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the report for `run_id` is written to.
    #[must_use]
    pub fn path_for(&self, run_id: &str) -> PathBuf {
        self.dir.join(format!("{run_id}.json"))
    }
}

#[async_trait]
impl StorageSink for FileStorageSink {
    async fn persist(&self, report: &WorkflowReport) -> Result<(), SinkError> {
        let body = serde_json::to_vec_pretty(report)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(&report.run_id);
        tokio::fs::write(&path, body).await?;
        info!(run_id = %report.run_id, path = %path.display(), "report persisted");
        Ok(())
    }
}
