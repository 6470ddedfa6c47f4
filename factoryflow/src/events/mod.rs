//! Monitoring events.
//!
//! When monitoring is enabled the engine reports lifecycle transitions to an
//! [`EventSink`]. Event types:
//!
//! | type                 | when                                   |
//! |----------------------|----------------------------------------|
//! | `workflow.started`   | a run begins                           |
//! | `stage.started`      | an attempt begins                      |
//! | `stage.retrying`     | an attempt failed and another is queued |
//! | `stage.completed`    | a stage succeeded                      |
//! | `stage.failed`       | a stage exhausted its retries          |
//! | `workflow.completed` | the report has been aggregated         |
//! | `sink.failed`        | a storage or report sink failed        |

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RecordedEvent};
