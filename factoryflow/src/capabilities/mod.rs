//! Capability interfaces for the pluggable collaborators.
//!
//! Each collaborator kind exposes a single async method. The engine resolves
//! every collaborator once, at construction, into a [`Collaborator`] that is
//! either the real implementation or a deterministic mock.

mod mocks;

pub use mocks::{MockDesignSystemBuilder, MockPrototypeBuilder, MockTrendSource, MockUxAnalyzer};

use crate::core::StageData;
use crate::errors::InitError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// One ranked finding returned by a [`TrendSource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendFinding {
    /// Trend keyword.
    pub keyword: String,
    /// Relevance score; higher ranks first.
    pub score: f64,
    /// Market category, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Source-specific extras (mentions, growth, images).
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl TrendFinding {
    /// Creates a finding without extra details.
    #[must_use]
    pub fn new(keyword: impl Into<String>, score: f64) -> Self {
        Self {
            keyword: keyword.into(),
            score,
            category: None,
            details: serde_json::Map::new(),
        }
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Adds a detail entry.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}

/// Looks up trending topics.
#[async_trait]
pub trait TrendSource: Send + Sync {
    /// Returns findings ranked best first.
    async fn collect_trends(
        &self,
        topic: &str,
        category: Option<&str>,
    ) -> anyhow::Result<Vec<TrendFinding>>;
}

/// Produces personas, jobs-to-be-done and UX strategies.
#[async_trait]
pub trait UxAnalyzer: Send + Sync {
    /// Analyzes a trend within its category.
    async fn analyze(&self, topic: &str, category: &str) -> anyhow::Result<StageData>;
}

/// Turns UX analysis into design tokens and a component spec.
#[async_trait]
pub trait DesignSystemBuilder: Send + Sync {
    /// Builds the design system for the analyzed strategy.
    async fn build_design_system(&self, ux_analysis: &StageData) -> anyhow::Result<StageData>;
}

/// Produces a generated-artifact manifest for a named app.
#[async_trait]
pub trait PrototypeBuilder: Send + Sync {
    /// Builds the prototype under `output_dir`.
    async fn build_prototype(
        &self,
        design_system: &StageData,
        ux_analysis: &StageData,
        app_name: &str,
        output_dir: &Path,
    ) -> anyhow::Result<StageData>;
}

/// The four collaborator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorKind {
    /// [`TrendSource`].
    TrendSource,
    /// [`UxAnalyzer`].
    UxAnalyzer,
    /// [`DesignSystemBuilder`].
    DesignSystemBuilder,
    /// [`PrototypeBuilder`].
    PrototypeBuilder,
}

impl CollaboratorKind {
    /// Returns the snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TrendSource => "trend_source",
            Self::UxAnalyzer => "ux_analyzer",
            Self::DesignSystemBuilder => "design_system_builder",
            Self::PrototypeBuilder => "prototype_builder",
        }
    }
}

impl fmt::Display for CollaboratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a collaborator is the real implementation or a stand-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollaboratorMode {
    /// The real implementation was constructed.
    Real,
    /// Construction failed and the mock was substituted.
    Mock,
}

/// A resolved collaborator: real or mock, decided once.
pub enum Collaborator<T: ?Sized> {
    /// The real implementation.
    Real(Arc<T>),
    /// The deterministic stand-in.
    Mock(Arc<T>),
}

impl<T: ?Sized> Clone for Collaborator<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Real(inner) => Self::Real(Arc::clone(inner)),
            Self::Mock(inner) => Self::Mock(Arc::clone(inner)),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Collaborator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Collaborator").field(&self.mode()).finish()
    }
}

impl<T: ?Sized> Collaborator<T> {
    /// Picks the real implementation if it was built, otherwise the mock.
    ///
    /// The initialization error is logged once here and never surfaces again.
    pub fn resolve(
        kind: CollaboratorKind,
        attempt: Result<Arc<T>, InitError>,
        mock: impl FnOnce() -> Arc<T>,
    ) -> Self {
        match attempt {
            Ok(real) => {
                info!(collaborator = %kind, "collaborator initialized");
                Self::Real(real)
            }
            Err(err) => {
                warn!(
                    collaborator = %kind,
                    error = %err,
                    "collaborator initialization failed, substituting mock"
                );
                Self::Mock(mock())
            }
        }
    }

    /// Returns the implementation regardless of mode.
    #[must_use]
    pub fn get(&self) -> &T {
        match self {
            Self::Real(inner) | Self::Mock(inner) => inner,
        }
    }

    /// Returns the mode.
    #[must_use]
    pub const fn mode(&self) -> CollaboratorMode {
        match self {
            Self::Real(_) => CollaboratorMode::Real,
            Self::Mock(_) => CollaboratorMode::Mock,
        }
    }

    /// Returns true if the mock was substituted.
    #[must_use]
    pub const fn is_mock(&self) -> bool {
        matches!(self, Self::Mock(_))
    }
}

/// The full set of resolved collaborators for an engine.
#[derive(Debug, Clone)]
pub struct Collaborators {
    /// Trend lookup.
    pub trend_source: Collaborator<dyn TrendSource>,
    /// Persona and strategy analysis.
    pub ux_analyzer: Collaborator<dyn UxAnalyzer>,
    /// Design token generation.
    pub design_system_builder: Collaborator<dyn DesignSystemBuilder>,
    /// Scaffold generation.
    pub prototype_builder: Collaborator<dyn PrototypeBuilder>,
}

impl Collaborators {
    /// Every collaborator as its mock.
    #[must_use]
    pub fn mocks() -> Self {
        Self {
            trend_source: Collaborator::Mock(Arc::new(MockTrendSource)),
            ux_analyzer: Collaborator::Mock(Arc::new(MockUxAnalyzer)),
            design_system_builder: Collaborator::Mock(Arc::new(MockDesignSystemBuilder)),
            prototype_builder: Collaborator::Mock(Arc::new(MockPrototypeBuilder)),
        }
    }

    /// Resolves each collaborator from its construction attempt.
    #[must_use]
    pub fn resolve(
        trend_source: Result<Arc<dyn TrendSource>, InitError>,
        ux_analyzer: Result<Arc<dyn UxAnalyzer>, InitError>,
        design_system_builder: Result<Arc<dyn DesignSystemBuilder>, InitError>,
        prototype_builder: Result<Arc<dyn PrototypeBuilder>, InitError>,
    ) -> Self {
        Self {
            trend_source: Collaborator::resolve(
                CollaboratorKind::TrendSource,
                trend_source,
                || -> Arc<dyn TrendSource> { Arc::new(MockTrendSource) },
            ),
            ux_analyzer: Collaborator::resolve(
                CollaboratorKind::UxAnalyzer,
                ux_analyzer,
                || -> Arc<dyn UxAnalyzer> { Arc::new(MockUxAnalyzer) },
            ),
            design_system_builder: Collaborator::resolve(
                CollaboratorKind::DesignSystemBuilder,
                design_system_builder,
                || -> Arc<dyn DesignSystemBuilder> { Arc::new(MockDesignSystemBuilder) },
            ),
            prototype_builder: Collaborator::resolve(
                CollaboratorKind::PrototypeBuilder,
                prototype_builder,
                || -> Arc<dyn PrototypeBuilder> { Arc::new(MockPrototypeBuilder) },
            ),
        }
    }

    /// The mode each collaborator ended up in.
    #[must_use]
    pub fn modes(&self) -> Vec<(CollaboratorKind, CollaboratorMode)> {
        vec![
            (CollaboratorKind::TrendSource, self.trend_source.mode()),
            (CollaboratorKind::UxAnalyzer, self.ux_analyzer.mode()),
            (
                CollaboratorKind::DesignSystemBuilder,
                self.design_system_builder.mode(),
            ),
            (CollaboratorKind::PrototypeBuilder, self.prototype_builder.mode()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedTrends;

    #[async_trait]
    impl TrendSource for FixedTrends {
        async fn collect_trends(
            &self,
            _topic: &str,
            _category: Option<&str>,
        ) -> anyhow::Result<Vec<TrendFinding>> {
            Ok(vec![TrendFinding::new("real", 1.0)])
        }
    }

    #[tokio::test]
    async fn test_resolve_keeps_real() {
        let resolved: Collaborator<dyn TrendSource> = Collaborator::resolve(
            CollaboratorKind::TrendSource,
            Ok(Arc::new(FixedTrends) as Arc<dyn TrendSource>),
            || -> Arc<dyn TrendSource> { Arc::new(MockTrendSource) },
        );
        assert_eq!(resolved.mode(), CollaboratorMode::Real);
        let findings = resolved.get().collect_trends("x", None).await.unwrap();
        assert_eq!(findings[0].keyword, "real");
    }

    #[test]
    fn test_resolve_substitutes_mock_on_init_error() {
        let mut mock_built = false;
        let resolved: Collaborator<dyn TrendSource> = Collaborator::resolve(
            CollaboratorKind::TrendSource,
            Err(InitError::missing_env("trend_source", "REDDIT_CLIENT_ID")),
            || -> Arc<dyn TrendSource> {
                mock_built = true;
                Arc::new(MockTrendSource)
            },
        );
        assert!(resolved.is_mock());
        assert!(mock_built);
    }

    #[test]
    fn test_resolve_all_missing_gives_all_mocks() {
        let collaborators = Collaborators::resolve(
            Err(InitError::not_provided("trend_source")),
            Err(InitError::not_provided("ux_analyzer")),
            Err(InitError::not_provided("design_system_builder")),
            Err(InitError::not_provided("prototype_builder")),
        );
        assert!(collaborators
            .modes()
            .iter()
            .all(|(_, mode)| *mode == CollaboratorMode::Mock));
    }

    #[test]
    fn test_finding_serializes_details_flat() {
        let finding = TrendFinding::new("focus", 80.0)
            .with_category("productivity")
            .with_detail("reddit_mentions", serde_json::json!(245));
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["keyword"], "focus");
        assert_eq!(json["reddit_mentions"], 245);
        assert_eq!(json["category"], "productivity");
    }
}
