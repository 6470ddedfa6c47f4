//! Core domain model types for factoryflow.
//!
//! This module contains the fundamental types used throughout the engine:
//! - Stage identifiers and status enums
//! - The opaque data mapping handed from stage to stage

mod output;
mod status;

pub use output::StageData;
pub use status::{OverallStatus, StageId, StageStatus};
