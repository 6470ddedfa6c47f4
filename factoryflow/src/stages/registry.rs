//! The fixed, ordered list of stages a run executes.

use super::executors::{
    DeploymentConfigStage, DesignSystemStage, PrototypeBuildStage, ReportingStage,
    TrendCollectionStage, UxAnalysisStage,
};
use super::StageExecutor;
use crate::capabilities::Collaborators;
use crate::core::StageId;
use std::sync::Arc;

/// A stage bound to its executor.
#[derive(Debug, Clone)]
pub struct RegisteredStage {
    /// Stage identity.
    pub id: StageId,
    /// The executor run for this stage.
    pub executor: Arc<dyn StageExecutor>,
}

/// Ordered stage list. Always holds all six stages in declaration order;
/// only the executor bound to each stage may change.
#[derive(Debug, Clone)]
pub struct StageRegistry {
    stages: Vec<RegisteredStage>,
}

impl StageRegistry {
    /// Binds the built-in executor for every stage.
    #[must_use]
    pub fn standard(collaborators: &Collaborators) -> Self {
        let executors: [Arc<dyn StageExecutor>; 6] = [
            Arc::new(TrendCollectionStage::new(collaborators.trend_source.clone())),
            Arc::new(UxAnalysisStage::new(collaborators.ux_analyzer.clone())),
            Arc::new(DesignSystemStage::new(
                collaborators.design_system_builder.clone(),
            )),
            Arc::new(PrototypeBuildStage::new(
                collaborators.prototype_builder.clone(),
            )),
            Arc::new(DeploymentConfigStage),
            Arc::new(ReportingStage),
        ];

        let stages = StageId::ALL
            .iter()
            .zip(executors)
            .map(|(&id, executor)| RegisteredStage { id, executor })
            .collect();
        Self { stages }
    }

    /// Replaces the executor bound to `id`.
    #[must_use]
    pub fn with_executor(mut self, id: StageId, executor: Arc<dyn StageExecutor>) -> Self {
        if let Some(slot) = self.stages.iter_mut().find(|stage| stage.id == id) {
            slot.executor = executor;
        }
        self
    }

    /// Looks up the executor bound to a stage.
    #[must_use]
    pub fn get(&self, id: StageId) -> Option<&Arc<dyn StageExecutor>> {
        self.stages
            .iter()
            .find(|stage| stage.id == id)
            .map(|stage| &stage.executor)
    }

    /// Iterates stages in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredStage> {
        self.stages.iter()
    }

    /// Number of declared stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if no stages are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::{FnExecutor, StageInput};

    #[test]
    fn test_standard_registry_order() {
        let registry = StageRegistry::standard(&Collaborators::mocks());
        let ids: Vec<StageId> = registry.iter().map(|stage| stage.id).collect();
        assert_eq!(ids, StageId::ALL.to_vec());
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn test_with_executor_replaces_binding_only() {
        let replacement: Arc<dyn StageExecutor> =
            Arc::new(FnExecutor::new("stub", |_: &StageInput<'_>| {
                Ok(crate::core::StageData::new())
            }));
        let registry = StageRegistry::standard(&Collaborators::mocks())
            .with_executor(StageId::DesignSystem, Arc::clone(&replacement));

        assert_eq!(registry.len(), 6);
        let bound = registry.get(StageId::DesignSystem).unwrap();
        assert!(Arc::ptr_eq(bound, &replacement));
        assert!(format!("{bound:?}").contains("stub"));
    }
}
