//! Best-effort consumers of the final report.
//!
//! Sinks run after the report is computed. A sink error is logged by the
//! engine and never changes the report the caller receives.

mod file;
mod notion;
#[cfg(feature = "remote-sinks")]
mod supabase;

pub use file::FileStorageSink;
pub use notion::render_notion_page;
#[cfg(feature = "remote-sinks")]
pub use notion::{NotionConfig, NotionReportSink};
#[cfg(feature = "remote-sinks")]
pub use supabase::{SupabaseConfig, SupabaseStorageSink};

use crate::errors::SinkError;
use crate::workflow::WorkflowReport;
use async_trait::async_trait;

/// Persists a report for later retrieval.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageSink: Send + Sync {
    /// Stores the report.
    async fn persist(&self, report: &WorkflowReport) -> Result<(), SinkError>;
}

/// Publishes a report to an external collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Renders and sends the report.
    async fn publish(&self, report: &WorkflowReport) -> Result<(), SinkError>;
}
