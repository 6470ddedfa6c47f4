//! Deterministic stand-ins for the real collaborators.
//!
//! Output depends only on the arguments, so repeated runs with the same
//! config produce identical stage data. No I/O is performed.

use super::{DesignSystemBuilder, PrototypeBuilder, TrendFinding, TrendSource, UxAnalyzer};
use crate::core::StageData;
use crate::utils::{slugify, title_case_compact};
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;

/// Returns a single trend matching the requested topic.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockTrendSource;

#[async_trait]
impl TrendSource for MockTrendSource {
    async fn collect_trends(
        &self,
        topic: &str,
        category: Option<&str>,
    ) -> anyhow::Result<Vec<TrendFinding>> {
        let finding = TrendFinding::new(topic, 87.5)
            .with_category(category.unwrap_or("productivity"))
            .with_detail("data_sources", json!(["reddit", "google_trends"]))
            .with_detail(
                "related_images",
                json!([format!(
                    "https://images.unsplash.com/photo-{}",
                    topic.replace(' ', "-")
                )]),
            )
            .with_detail(
                "trend_data",
                json!({
                    "reddit_mentions": 245,
                    "google_trend_score": 85,
                    "growth_rate": "23%"
                }),
            );
        Ok(vec![finding])
    }
}

/// Returns three fixed personas, jobs-to-be-done and one strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockUxAnalyzer;

#[async_trait]
impl UxAnalyzer for MockUxAnalyzer {
    async fn analyze(&self, topic: &str, category: &str) -> anyhow::Result<StageData> {
        let data = StageData::from_value(json!({
            "trend_keyword": topic,
            "category": category,
            "personas": [
                {
                    "name": "Hyunsoo Kim (busy office worker)",
                    "age": 28,
                    "occupation": "Marketing manager",
                    "pain_points": ["Low work efficiency", "Hard to manage time"],
                    "motivations": ["Higher productivity", "Work-life balance"],
                    "tech_comfort": "high",
                    "preferred_platforms": ["mobile", "desktop"]
                },
                {
                    "name": "Jiyoung Park (freelancer)",
                    "age": 32,
                    "occupation": "Graphic designer",
                    "pain_points": ["Client management", "Project scheduling"],
                    "motivations": ["Organized workflow", "Higher income"],
                    "tech_comfort": "medium",
                    "preferred_platforms": ["desktop", "tablet"]
                },
                {
                    "name": "Minjun Lee (aspiring founder)",
                    "age": 25,
                    "occupation": "Pre-launch founder",
                    "pain_points": ["Scattered ideas", "No team collaboration tools"],
                    "motivations": ["Successful launch", "Team efficiency"],
                    "tech_comfort": "high",
                    "preferred_platforms": ["mobile", "web"]
                }
            ],
            "jobs_to_be_done": {
                "functional_jobs": [
                    "Manage work schedules efficiently",
                    "Automate repetitive tasks",
                    "Communicate smoothly with the team"
                ],
                "emotional_jobs": [
                    "Feel a sense of accomplishment",
                    "Reduce stress"
                ],
                "social_jobs": [
                    "Be seen as an efficient teammate",
                    "Be seen using the latest tools"
                ]
            },
            "strategies": [
                {
                    "name": "AI-First Simplicity",
                    "description": "AI automates the complex work so users only touch a simple interface",
                    "key_principles": [
                        "AI-recommended task priorities",
                        "Automatic schedule optimization",
                        "Smart notifications"
                    ],
                    "target_emotion": "confidence"
                }
            ]
        }))?;
        Ok(data)
    }
}

/// Returns a small design system named after the analyzed topic.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockDesignSystemBuilder;

#[async_trait]
impl DesignSystemBuilder for MockDesignSystemBuilder {
    async fn build_design_system(&self, ux_analysis: &StageData) -> anyhow::Result<StageData> {
        let topic = ux_analysis.pointer_str("/trend_keyword").unwrap_or("app");
        let category = ux_analysis.pointer_str("/category").unwrap_or("productivity");
        let app_name = format!("{}Pro", title_case_compact(topic));

        let data = StageData::from_value(json!({
            "app_concept": {
                "name": app_name,
                "tagline": format!("A smart solution for {topic}"),
                "category": category
            },
            "brand_identity": {
                "color_palette": {
                    "colors": {
                        "primary": {"50": "#f0f9ff", "500": "#0ea5e9", "900": "#0c4a6e"},
                        "secondary": {"500": "#8b5cf6"}
                    }
                },
                "typography_system": {
                    "font_families": {"display": "Inter", "body": "Inter"}
                }
            },
            "component_system": {
                "components": {
                    "button": {"variants": ["primary", "secondary", "ghost"]},
                    "input": {"variants": ["default", "error"]},
                    "card": {"variants": ["default", "elevated"]},
                    "avatar": {"sizes": ["sm", "md", "lg"]}
                }
            }
        }))?;
        Ok(data)
    }
}

/// Returns a React scaffold manifest without touching the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockPrototypeBuilder;

#[async_trait]
impl PrototypeBuilder for MockPrototypeBuilder {
    async fn build_prototype(
        &self,
        _design_system: &StageData,
        _ux_analysis: &StageData,
        app_name: &str,
        output_dir: &Path,
    ) -> anyhow::Result<StageData> {
        let project_path = output_dir.join(slugify(app_name));

        let data = StageData::from_value(json!({
            "project_info": {
                "app_name": app_name,
                "project_path": project_path.display().to_string()
            },
            "generated_files": {
                "components": ["Button.jsx", "Input.jsx", "Card.jsx"],
                "screens": ["MainScreen.jsx", "ProfileScreen.jsx"],
                "config": ["package.json", "tailwind.config.js"]
            },
            "deployment": {
                "vercel": {"ready": true},
                "netlify": {"ready": true}
            },
            "urls": {
                "local_dev": "http://localhost:3000"
            }
        }))?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_mock_trend_uses_topic_and_category() {
        let findings = MockTrendSource
            .collect_trends("remote work", None)
            .await
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].keyword, "remote work");
        assert_eq!(findings[0].score, 87.5);
        assert_eq!(findings[0].category.as_deref(), Some("productivity"));
        assert_eq!(
            findings[0].details["related_images"][0],
            "https://images.unsplash.com/photo-remote-work"
        );
    }

    #[tokio::test]
    async fn test_mock_ux_is_deterministic() {
        let first = MockUxAnalyzer.analyze("focus", "health").await.unwrap();
        let second = MockUxAnalyzer.analyze("focus", "health").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.pointer("/personas").unwrap().as_array().unwrap().len(), 3);
        assert_eq!(first.pointer_str("/category"), Some("health"));
    }

    #[tokio::test]
    async fn test_mock_design_names_app_after_topic() {
        let ux = MockUxAnalyzer.analyze("ai productivity", "work").await.unwrap();
        let design = MockDesignSystemBuilder.build_design_system(&ux).await.unwrap();
        assert_eq!(
            design.pointer_str("/app_concept/name"),
            Some("AiProductivityPro")
        );
        assert_eq!(
            design
                .pointer("/component_system/components")
                .and_then(|c| c.as_object())
                .map(serde_json::Map::len),
            Some(4)
        );
    }

    #[tokio::test]
    async fn test_mock_prototype_places_project_under_output_dir() {
        let manifest = MockPrototypeBuilder
            .build_prototype(
                &StageData::new(),
                &StageData::new(),
                "FocusPro",
                Path::new("/srv/apps"),
            )
            .await
            .unwrap();
        assert_eq!(
            manifest.pointer_str("/project_info/project_path"),
            Some("/srv/apps/focuspro")
        );
        assert_eq!(manifest.pointer_str("/urls/local_dev"), Some("http://localhost:3000"));
    }
}
