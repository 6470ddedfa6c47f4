//! # Factoryflow
//!
//! A sequential workflow engine for the app factory content pipeline.
//!
//! A run turns a topic keyword into a deployable web-app scaffold through six
//! fixed stages:
//!
//! 1. **Trend collection**: pick a trending keyword for the topic
//! 2. **UX analysis**: personas and strategies for the trend
//! 3. **Design system**: tokens, components and an app concept
//! 4. **Prototype build**: a project scaffold on disk
//! 5. **Deployment config**: hosting configuration for the scaffold
//! 6. **Reporting**: a summary of the run
//!
//! Each stage only sees the output of the stage before it. Stages are retried
//! up to a budget; the first stage to exhaust its retries halts the run. A
//! [`workflow::WorkflowReport`] is always produced and optionally handed to
//! storage and report-publishing sinks.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use factoryflow::prelude::*;
//!
//! let engine = WorkflowEngine::builder()
//!     .storage_sink(Arc::new(FileStorageSink::new("./reports")))
//!     .build();
//!
//! let report = engine.execute(WorkflowConfig::new("ai productivity")).await;
//! println!("{} ({})", report.status, report.successful_stages);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod capabilities;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod sinks;
pub mod stages;
pub mod testing;
pub mod utils;
pub mod workflow;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::capabilities::{
        CollaboratorKind, CollaboratorMode, DesignSystemBuilder, PrototypeBuilder,
        TrendFinding, TrendSource, UxAnalyzer,
    };
    pub use crate::config::WorkflowConfig;
    pub use crate::core::{OverallStatus, StageData, StageId, StageStatus};
    pub use crate::errors::{ConfigError, FactoryflowError, InitError, SinkError, StageError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::pipeline::{
        ExponentialBackoff, FixedDelay, JitterStrategy, RetryPolicy, WorkflowEngine,
        WorkflowEngineBuilder,
    };
    pub use crate::sinks::{FileStorageSink, ReportSink, StorageSink};
    pub use crate::stages::{StageExecutor, StageInput};
    pub use crate::workflow::{WorkflowReport, WorkflowRun};
}
