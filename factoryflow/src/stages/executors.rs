//! The six built-in stage executors.
//!
//! The first four delegate to a collaborator; deployment-config and reporting
//! are local transformations of the previous stage's output.

use super::{StageExecutor, StageInput};
use crate::capabilities::{
    Collaborator, CollaboratorKind, CollaboratorMode, DesignSystemBuilder, PrototypeBuilder,
    TrendFinding, TrendSource, UxAnalyzer,
};
use crate::core::{StageData, StageId};
use crate::errors::StageError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use tracing::{debug, info};

/// Key under which design-system output forwards the UX analysis.
pub(crate) const UX_STRATEGY_KEY: &str = "ux_strategy";

/// Stage 1: asks the trend source and selects the finding to pursue.
#[derive(Debug, Clone)]
pub struct TrendCollectionStage {
    source: Collaborator<dyn TrendSource>,
}

impl TrendCollectionStage {
    /// Creates the stage over a resolved trend source.
    #[must_use]
    pub const fn new(source: Collaborator<dyn TrendSource>) -> Self {
        Self { source }
    }
}

/// First finding whose keyword contains the topic, else the top-ranked one.
fn select_trend<'a>(findings: &'a [TrendFinding], topic: &str) -> Option<&'a TrendFinding> {
    let needle = topic.to_lowercase();
    findings
        .iter()
        .find(|finding| finding.keyword.to_lowercase().contains(&needle))
        .or_else(|| findings.first())
}

#[async_trait]
impl StageExecutor for TrendCollectionStage {
    async fn execute(&self, input: &StageInput<'_>) -> Result<StageData, StageError> {
        let config = input.config;
        let findings = self
            .source
            .get()
            .collect_trends(&config.topic, config.category.as_deref())
            .await
            .map_err(|err| StageError::capability(CollaboratorKind::TrendSource.as_str(), err))?;

        let selected = select_trend(&findings, &config.topic)
            .ok_or_else(|| StageError::missing_input(input.stage, "trend findings"))?;
        if !selected.keyword.to_lowercase().contains(&config.topic.to_lowercase()) {
            info!(topic = %config.topic, selected = %selected.keyword, "topic not among trends, using top trend");
        }

        let method = match self.source.mode() {
            CollaboratorMode::Real => "api",
            CollaboratorMode::Mock => "mock",
        };

        Ok(StageData::new()
            .with("selected_trend", to_json(selected)?)
            .with("all_trends", to_json(&findings)?)
            .with("collection_method", json!(method)))
    }
}

/// Stage 2: runs the UX analyzer on the selected trend.
#[derive(Debug, Clone)]
pub struct UxAnalysisStage {
    analyzer: Collaborator<dyn UxAnalyzer>,
}

impl UxAnalysisStage {
    /// Creates the stage over a resolved UX analyzer.
    #[must_use]
    pub const fn new(analyzer: Collaborator<dyn UxAnalyzer>) -> Self {
        Self { analyzer }
    }
}

#[async_trait]
impl StageExecutor for UxAnalysisStage {
    async fn execute(&self, input: &StageInput<'_>) -> Result<StageData, StageError> {
        let trends = input.require_previous()?;
        let keyword = trends.require_str(input.stage, "/selected_trend/keyword")?;
        let category = trends
            .pointer_str("/selected_trend/category")
            .unwrap_or_else(|| input.config.category_or_default());

        self.analyzer
            .get()
            .analyze(keyword, category)
            .await
            .map_err(|err| StageError::capability(CollaboratorKind::UxAnalyzer.as_str(), err))
    }
}

/// Stage 3: builds the design system and forwards the UX analysis with it.
#[derive(Debug, Clone)]
pub struct DesignSystemStage {
    builder: Collaborator<dyn DesignSystemBuilder>,
}

impl DesignSystemStage {
    /// Creates the stage over a resolved design-system builder.
    #[must_use]
    pub const fn new(builder: Collaborator<dyn DesignSystemBuilder>) -> Self {
        Self { builder }
    }
}

#[async_trait]
impl StageExecutor for DesignSystemStage {
    async fn execute(&self, input: &StageInput<'_>) -> Result<StageData, StageError> {
        let ux_analysis = input.require_previous()?;
        let mut design = self
            .builder
            .get()
            .build_design_system(ux_analysis)
            .await
            .map_err(|err| {
                StageError::capability(CollaboratorKind::DesignSystemBuilder.as_str(), err)
            })?;

        design.insert(UX_STRATEGY_KEY, ux_analysis.clone().into_value());
        Ok(design)
    }
}

/// Stage 4: builds the prototype for the designed app.
#[derive(Debug, Clone)]
pub struct PrototypeBuildStage {
    builder: Collaborator<dyn PrototypeBuilder>,
}

impl PrototypeBuildStage {
    /// Creates the stage over a resolved prototype builder.
    #[must_use]
    pub const fn new(builder: Collaborator<dyn PrototypeBuilder>) -> Self {
        Self { builder }
    }
}

#[async_trait]
impl StageExecutor for PrototypeBuildStage {
    async fn execute(&self, input: &StageInput<'_>) -> Result<StageData, StageError> {
        let design = input.require_previous()?;
        let app_name = design.require_str(input.stage, "/app_concept/name")?;
        let ux_analysis = StageData::from(
            design
                .require_object(input.stage, &format!("/{UX_STRATEGY_KEY}"))?
                .clone(),
        );

        debug!(app_name = %app_name, output_dir = %input.config.output_dir.display(), "building prototype");
        self.builder
            .get()
            .build_prototype(design, &ux_analysis, app_name, &input.config.output_dir)
            .await
            .map_err(|err| StageError::capability(CollaboratorKind::PrototypeBuilder.as_str(), err))
    }
}

/// Stage 5: renders hosting configuration for the generated project.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeploymentConfigStage;

const NETLIFY_TOML: &str = r#"[build]
  publish = "build"
  command = "npm run build"

[[redirects]]
  from = "/*"
  to = "/index.html"
  status = 200
"#;

fn vercel_config() -> Value {
    json!({
        "version": 2,
        "builds": [{"src": "package.json", "use": "@vercel/static-build"}],
        "routes": [{"src": "/(.*)", "dest": "/index.html"}]
    })
}

#[async_trait]
impl StageExecutor for DeploymentConfigStage {
    async fn execute(&self, input: &StageInput<'_>) -> Result<StageData, StageError> {
        let manifest = input.require_previous()?;
        let project_info = manifest.require_object(input.stage, "/project_info")?;
        let project_path = manifest.require_str(input.stage, "/project_info/project_path")?;
        let project_dir = Path::new(project_path);

        let vercel = serde_json::to_string_pretty(&vercel_config())
            .map_err(|err| StageError::Internal(err.to_string()))?;

        Ok(StageData::new()
            .with("deployment_configs", json!(["vercel.json", "netlify.toml"]))
            .with(
                "platforms",
                json!({
                    "vercel": {
                        "config_file": project_dir.join("vercel.json").display().to_string(),
                        "config": vercel,
                        "deploy_command": "vercel --prod",
                        "ready": true
                    },
                    "netlify": {
                        "config_file": project_dir.join("netlify.toml").display().to_string(),
                        "config": NETLIFY_TOML,
                        "deploy_command": "netlify deploy --prod",
                        "ready": true
                    }
                }),
            )
            .with(
                "instructions",
                json!([
                    format!("cd {project_path}"),
                    "npm install",
                    "npm run build",
                    "Deploy using vercel --prod or netlify deploy --prod"
                ]),
            )
            .with("project_info", Value::Object(project_info.clone())))
    }
}

/// Stage 6: summarizes the run from the deployment output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportingStage;

#[async_trait]
impl StageExecutor for ReportingStage {
    async fn execute(&self, input: &StageInput<'_>) -> Result<StageData, StageError> {
        let deployment = input.require_previous()?;
        let app_name = deployment.require_str(input.stage, "/project_info/app_name")?;
        let project_path = deployment.require_str(input.stage, "/project_info/project_path")?;
        let platforms: Vec<&str> = deployment
            .require_object(input.stage, "/platforms")?
            .keys()
            .map(String::as_str)
            .collect();

        Ok(StageData::new()
            .with(
                "workflow_summary",
                json!({
                    "workflow_id": input.run_id,
                    "trend_keyword": input.config.topic,
                    "start_time": input.run_started_at.to_rfc3339(),
                    "elapsed_secs": input.elapsed.as_secs_f64(),
                }),
            )
            .with(
                "final_outputs",
                json!({
                    "app_name": app_name,
                    "project_path": project_path,
                }),
            )
            .with("deployment_platforms", json!(platforms)))
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Value, StageError> {
    serde_json::to_value(value).map_err(|err| StageError::Internal(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancellation::CancellationToken;
    use crate::capabilities::{
        MockDesignSystemBuilder, MockPrototypeBuilder, MockTrendSource, MockUxAnalyzer,
    };
    use crate::config::WorkflowConfig;
    use chrono::Utc;
    use std::sync::Arc;
    use std::time::Duration;

    fn input<'a>(
        stage: StageId,
        config: &'a WorkflowConfig,
        previous: Option<&'a StageData>,
        cancel: &'a CancellationToken,
    ) -> StageInput<'a> {
        StageInput {
            stage,
            run_id: "workflow_test",
            config,
            previous,
            run_started_at: Utc::now(),
            elapsed: Duration::from_millis(5),
            cancel,
        }
    }

    struct RankedTrends(Vec<TrendFinding>);

    #[async_trait]
    impl TrendSource for RankedTrends {
        async fn collect_trends(
            &self,
            _topic: &str,
            _category: Option<&str>,
        ) -> anyhow::Result<Vec<TrendFinding>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenUx;

    #[async_trait]
    impl UxAnalyzer for BrokenUx {
        async fn analyze(&self, _topic: &str, _category: &str) -> anyhow::Result<StageData> {
            anyhow::bail!("quota exceeded")
        }
    }

    #[test]
    fn test_select_trend_prefers_topic_match() {
        let findings = vec![
            TrendFinding::new("Smart Home", 99.0),
            TrendFinding::new("AI Focus Timer", 80.0),
        ];
        assert_eq!(
            select_trend(&findings, "focus").unwrap().keyword,
            "AI Focus Timer"
        );
        assert_eq!(select_trend(&findings, "gardening").unwrap().keyword, "Smart Home");
        assert!(select_trend(&[], "anything").is_none());
    }

    #[tokio::test]
    async fn test_trend_collection_with_real_source() {
        let stage = TrendCollectionStage::new(Collaborator::Real(Arc::new(RankedTrends(vec![
            TrendFinding::new("Smart Home", 99.0).with_category("iot"),
        ]))));
        let config = WorkflowConfig::new("focus");
        let cancel = CancellationToken::new();

        let output = stage
            .execute(&input(StageId::TrendCollection, &config, None, &cancel))
            .await
            .unwrap();
        assert_eq!(output.pointer_str("/selected_trend/keyword"), Some("Smart Home"));
        assert_eq!(output.pointer_str("/collection_method"), Some("api"));
        assert_eq!(output.pointer("/all_trends").unwrap().as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_trend_collection_without_findings_fails() {
        let stage = TrendCollectionStage::new(Collaborator::Real(Arc::new(RankedTrends(vec![]))));
        let config = WorkflowConfig::new("focus");
        let cancel = CancellationToken::new();

        let err = stage
            .execute(&input(StageId::TrendCollection, &config, None, &cancel))
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::MissingInput { .. }));
    }

    #[tokio::test]
    async fn test_ux_analysis_requires_selected_trend() {
        let stage = UxAnalysisStage::new(Collaborator::Mock(Arc::new(MockUxAnalyzer)));
        let config = WorkflowConfig::new("focus");
        let cancel = CancellationToken::new();
        let previous = StageData::new().with("collection_method", json!("mock"));

        let err = stage
            .execute(&input(StageId::UxAnalysis, &config, Some(&previous), &cancel))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "ux_analysis input missing: /selected_trend/keyword"
        );
    }

    #[tokio::test]
    async fn test_ux_analysis_wraps_collaborator_error() {
        let stage = UxAnalysisStage::new(Collaborator::Real(Arc::new(BrokenUx)));
        let config = WorkflowConfig::new("focus");
        let cancel = CancellationToken::new();
        let previous = StageData::new().with("selected_trend", json!({"keyword": "focus"}));

        let err = stage
            .execute(&input(StageId::UxAnalysis, &config, Some(&previous), &cancel))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "ux_analyzer call failed: quota exceeded");
    }

    #[tokio::test]
    async fn test_design_system_forwards_ux_analysis() {
        let stage = DesignSystemStage::new(Collaborator::Mock(Arc::new(MockDesignSystemBuilder)));
        let config = WorkflowConfig::new("focus");
        let cancel = CancellationToken::new();
        let ux = MockUxAnalyzer.analyze("focus", "productivity").await.unwrap();

        let output = stage
            .execute(&input(StageId::DesignSystem, &config, Some(&ux), &cancel))
            .await
            .unwrap();
        assert_eq!(output.pointer_str("/app_concept/name"), Some("FocusPro"));
        assert_eq!(output.pointer_str("/ux_strategy/trend_keyword"), Some("focus"));
    }

    #[tokio::test]
    async fn test_prototype_build_needs_forwarded_ux() {
        let stage = PrototypeBuildStage::new(Collaborator::Mock(Arc::new(MockPrototypeBuilder)));
        let config = WorkflowConfig::new("focus").with_output_dir("/srv/apps");
        let cancel = CancellationToken::new();
        let design = StageData::new().with("app_concept", json!({"name": "FocusPro"}));

        let err = stage
            .execute(&input(StageId::PrototypeBuild, &config, Some(&design), &cancel))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/ux_strategy"));

        let design = design.with(UX_STRATEGY_KEY, json!({"trend_keyword": "focus"}));
        let manifest = stage
            .execute(&input(StageId::PrototypeBuild, &config, Some(&design), &cancel))
            .await
            .unwrap();
        assert_eq!(
            manifest.pointer_str("/project_info/project_path"),
            Some("/srv/apps/focuspro")
        );
    }

    #[tokio::test]
    async fn test_deployment_config_renders_platforms() {
        let config = WorkflowConfig::new("focus");
        let cancel = CancellationToken::new();
        let manifest = StageData::new().with(
            "project_info",
            json!({"app_name": "FocusPro", "project_path": "/srv/apps/focuspro"}),
        );

        let output = DeploymentConfigStage
            .execute(&input(StageId::DeploymentConfig, &config, Some(&manifest), &cancel))
            .await
            .unwrap();
        assert_eq!(
            output.pointer_str("/platforms/vercel/config_file"),
            Some("/srv/apps/focuspro/vercel.json")
        );
        assert_eq!(
            output.pointer_str("/platforms/netlify/deploy_command"),
            Some("netlify deploy --prod")
        );
        assert!(output
            .pointer_str("/platforms/vercel/config")
            .unwrap()
            .contains("@vercel/static-build"));
        assert_eq!(output.pointer_str("/instructions/0"), Some("cd /srv/apps/focuspro"));
        assert_eq!(output.pointer_str("/project_info/app_name"), Some("FocusPro"));
    }

    #[tokio::test]
    async fn test_deployment_config_without_manifest_fails() {
        let config = WorkflowConfig::new("focus");
        let cancel = CancellationToken::new();

        let err = DeploymentConfigStage
            .execute(&input(StageId::DeploymentConfig, &config, None, &cancel))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "deployment_config input missing: prototype_build output"
        );
    }

    #[tokio::test]
    async fn test_reporting_summarizes_deployment() {
        let config = WorkflowConfig::new("focus");
        let cancel = CancellationToken::new();
        let deployment = StageData::new()
            .with(
                "project_info",
                json!({"app_name": "FocusPro", "project_path": "/srv/apps/focuspro"}),
            )
            .with("platforms", json!({"netlify": {}, "vercel": {}}));

        let output = ReportingStage
            .execute(&input(StageId::Reporting, &config, Some(&deployment), &cancel))
            .await
            .unwrap();
        assert_eq!(
            output.pointer_str("/workflow_summary/workflow_id"),
            Some("workflow_test")
        );
        assert_eq!(output.pointer_str("/final_outputs/app_name"), Some("FocusPro"));
        assert_eq!(
            output.pointer("/deployment_platforms"),
            Some(&json!(["netlify", "vercel"]))
        );
    }
}
