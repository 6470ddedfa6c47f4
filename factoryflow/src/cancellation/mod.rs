//! Cooperative cancellation for workflow runs.
//!
//! A [`CancellationToken`] is checked before every stage, raced against every
//! attempt and every retry delay.

mod token;

pub use token::CancellationToken;
