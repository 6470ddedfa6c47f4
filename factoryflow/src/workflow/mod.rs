//! Run state and reporting.
//!
//! A [`WorkflowRun`] accumulates stage records during `execute`; once the
//! pipeline halts, [`aggregate`] turns it into a [`WorkflowReport`].

mod aggregate;
mod report;
mod run;

pub use aggregate::{aggregate, NO_DATA};
pub use report::{PerformanceMetrics, StageReport, WorkflowReport};
pub use run::{RunSnapshot, StageStatusEntry, WorkflowRun};
