//! Workflow execution.
//!
//! This module provides:
//! - The workflow engine and its builder
//! - Retry policies for stage attempts
//! - The per-stage retry loop

mod engine;
mod retry;
mod runner;


pub use engine::{WorkflowEngine, WorkflowEngineBuilder};
pub use retry::{ExponentialBackoff, FixedDelay, JitterStrategy, RetryPolicy};
