//! Utility functions for identifiers, durations and text.

pub mod durations;
mod ids;
mod text;

pub use durations::format_seconds;
pub use ids::{generate_run_id, generate_uuid};
pub use text::{slugify, title_case_compact};
