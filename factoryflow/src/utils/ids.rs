//! Run identifier generation.

use uuid::Uuid;

/// Generates a new UUID v4.
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Generates a workflow run identifier, e.g. `workflow_3f2a...`.
#[must_use]
pub fn generate_run_id() -> String {
    format!("workflow_{}", generate_uuid().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_uuid_is_v4() {
        assert_eq!(generate_uuid().get_version_num(), 4);
    }

    #[test]
    fn test_run_ids_are_unique_and_prefixed() {
        let a = generate_run_id();
        let b = generate_run_id();
        assert!(a.starts_with("workflow_"));
        assert_eq!(a.len(), "workflow_".len() + 32);
        assert_ne!(a, b);
    }
}
