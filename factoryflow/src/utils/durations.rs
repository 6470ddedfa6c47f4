//! Duration helpers.
//!
//! Durations cross the serialization boundary as fractional seconds.

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Formats a duration as `"12.34 seconds"`.
#[must_use]
pub fn format_seconds(duration: Duration) -> String {
    format!("{:.2} seconds", duration.as_secs_f64())
}

/// Serde adapter for `Duration` as fractional seconds.
pub mod secs {
    use super::{Deserialize, Deserializer, Duration, Serializer};

    /// Serializes a duration as seconds.
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    /// Deserializes a duration from non-negative seconds.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `Option<Duration>` as fractional seconds.
pub mod opt_secs {
    use super::{Deserialize, Deserializer, Duration, Serializer};

    /// Serializes an optional duration as seconds or null.
    pub fn serialize<S: Serializer>(
        duration: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match duration {
            Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional duration from seconds or null.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(deserializer)?
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom))
            .transpose()
    }
}
