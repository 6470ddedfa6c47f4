//! Opaque stage output data.

use crate::core::StageId;
use crate::errors::StageError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The mapping a stage produces and its successor consumes.
///
/// The engine never interprets the contents; only the executors and the
/// report aggregator look inside.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageData(Map<String, Value>);

impl StageData {
    /// Creates empty data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self, StageError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(StageError::Internal(format!(
                "stage data must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Inserts a value, returning the previous one for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Adds a value and returns self.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Gets a top-level value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Looks up a nested value by RFC 6901 JSON pointer, e.g.
    /// `/project_info/app_name`.
    #[must_use]
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        let rest = pointer.strip_prefix('/')?;
        let head = rest.split_once('/').map_or(rest, |(head, _)| head);
        let value = self.0.get(&head.replace("~1", "/").replace("~0", "~"))?;
        match &rest[head.len()..] {
            "" => Some(value),
            tail => value.pointer(tail),
        }
    }

    /// Looks up a nested string by JSON pointer.
    #[must_use]
    pub fn pointer_str(&self, pointer: &str) -> Option<&str> {
        self.pointer(pointer).and_then(Value::as_str)
    }

    /// Requires a nested string, naming the consuming stage on failure.
    pub fn require_str(&self, stage: StageId, pointer: &str) -> Result<&str, StageError> {
        self.pointer_str(pointer)
            .ok_or_else(|| StageError::missing_input(stage, pointer))
    }

    /// Requires a nested object, naming the consuming stage on failure.
    pub fn require_object(
        &self,
        stage: StageId,
        pointer: &str,
    ) -> Result<&Map<String, Value>, StageError> {
        self.pointer(pointer)
            .and_then(Value::as_object)
            .ok_or_else(|| StageError::missing_input(stage, pointer))
    }

    /// Returns the number of top-level keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Converts into a JSON object value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for StageData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> StageData {
        StageData::from_value(json!({
            "project_info": {"app_name": "FocusPro", "project_path": "/tmp/focuspro"},
            "generated_files": {"components": ["Button.jsx", "Card.jsx"]},
            "score": 87.5
        }))
        .unwrap()
    }

    #[test]
    fn test_from_value_requires_object() {
        assert!(StageData::from_value(json!([1, 2])).is_err());
        assert!(StageData::from_value(json!("text")).is_err());
        assert!(StageData::from_value(json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_pointer_lookup() {
        let data = sample();
        assert_eq!(data.pointer_str("/project_info/app_name"), Some("FocusPro"));
        assert_eq!(
            data.pointer("/generated_files/components/1"),
            Some(&json!("Card.jsx"))
        );
        assert!(data.pointer("/project_info/missing").is_none());
        assert!(data.pointer("project_info").is_none());
        assert!(data.pointer("/score/nested").is_none());
    }

    #[test]
    fn test_pointer_unescapes_tokens() {
        let data = StageData::new()
            .with("a/b", json!({"c~d": 1, "e/f": {"g": 2}}))
            .with("", json!("empty key"));
        assert_eq!(data.pointer("/a~1b/c~0d"), Some(&json!(1)));
        assert_eq!(data.pointer("/a~1b/e~1f/g"), Some(&json!(2)));
        assert_eq!(data.pointer_str("/"), Some("empty key"));
        assert!(data.pointer("/a/b").is_none());
    }

    #[test]
    fn test_require_reports_stage_and_key() {
        let data = sample();
        let err = data
            .require_str(StageId::DeploymentConfig, "/project_info/version")
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("deployment_config"));
        assert!(message.contains("/project_info/version"));

        assert!(data
            .require_object(StageId::DeploymentConfig, "/project_info")
            .is_ok());
        assert!(data
            .require_object(StageId::DeploymentConfig, "/score")
            .is_err());
    }

    #[test]
    fn test_serializes_transparently() {
        let data = StageData::new().with("count", json!(3));
        assert_eq!(serde_json::to_value(&data).unwrap(), json!({"count": 3}));
    }
}
