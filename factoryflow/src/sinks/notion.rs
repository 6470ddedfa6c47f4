//! Notion report publishing.
//!
//! [`render_notion_page`] builds the page body; [`NotionReportSink`] sends it
//! to the Notion pages API.

use crate::core::StageStatus;
use crate::workflow::WorkflowReport;
use serde_json::{json, Value};

fn text(content: &str) -> Value {
    json!([{"type": "text", "text": {"content": content}}])
}

fn heading(content: &str) -> Value {
    json!({"object": "block", "type": "heading_2", "heading_2": {"rich_text": text(content)}})
}

fn paragraph(content: &str) -> Value {
    json!({"object": "block", "type": "paragraph", "paragraph": {"rich_text": text(content)}})
}

fn bullet(content: &str) -> Value {
    json!({
        "object": "block",
        "type": "bulleted_list_item",
        "bulleted_list_item": {"rich_text": text(content)}
    })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Builds the page-creation request body for a report.
///
/// The page carries title, status, topic, duration and success-rate
/// properties, followed by summary, per-stage and next-step blocks.
#[must_use]
pub fn render_notion_page(report: &WorkflowReport, database_id: &str) -> Value {
    let topic = &report.config.topic;
    let status = capitalize(&report.status.to_string());

    let mut children = vec![
        heading("Workflow Summary"),
        paragraph(&format!(
            "Workflow ID: {}\nTrend Keyword: {topic}\nStatus: {status}\nDuration: {}\nSuccess Rate: {}",
            report.run_id, report.metrics.total_time, report.metrics.success_rate_display
        )),
    ];
    if let Some(reason) = &report.halted {
        children.push(paragraph(&format!("Halted: {reason}")));
    }
    children.push(heading("Stage Results"));
    children.extend(report.stages.iter().map(|stage| {
        let marker = if stage.status == StageStatus::Completed {
            "[ok]"
        } else {
            "[x]"
        };
        paragraph(&format!(
            "{marker} {}: {} ({:.2}s)",
            stage.stage.title(),
            stage.status,
            stage.duration_secs
        ))
    }));
    if !report.next_steps.is_empty() {
        children.push(heading("Next Steps"));
        children.extend(report.next_steps.iter().map(|step| bullet(step)));
    }

    json!({
        "parent": {"database_id": database_id},
        "properties": {
            "Title": {"title": text(&format!("AI App Factory: {topic}"))},
            "Status": {"select": {"name": status}},
            "Trend Keyword": {"rich_text": text(topic)},
            "Duration": {"number": report.metrics.total_duration_secs},
            "Success Rate": {"rich_text": text(&report.metrics.success_rate_display)}
        },
        "children": children
    })
}

#[cfg(feature = "remote-sinks")]
pub use remote::{NotionConfig, NotionReportSink};

#[cfg(feature = "remote-sinks")]
mod remote {
    use super::render_notion_page;
    use crate::errors::{InitError, SinkError};
    use crate::sinks::ReportSink;
    use crate::workflow::WorkflowReport;
    use async_trait::async_trait;
    use std::time::Duration;
    use tracing::info;

    const NOTION_VERSION: &str = "2022-06-28";

    /// Credentials and endpoint for the Notion API.
    #[derive(Debug, Clone)]
    pub struct NotionConfig {
        /// Integration token.
        pub token: String,
        /// Target database.
        pub database_id: String,
        /// API base URL.
        pub endpoint: String,
    }

    impl NotionConfig {
        /// Reads `NOTION_TOKEN` and `NOTION_DATABASE_ID`.
        pub fn from_env() -> Result<Self, InitError> {
            let read = |name: &str| {
                std::env::var(name)
                    .ok()
                    .filter(|value| !value.is_empty())
                    .ok_or_else(|| InitError::missing_env("notion_report_sink", name))
            };
            Ok(Self {
                token: read("NOTION_TOKEN")?,
                database_id: read("NOTION_DATABASE_ID")?,
                endpoint: "https://api.notion.com/v1".to_string(),
            })
        }
    }

    /// Publishes reports as pages in a Notion database.
    #[derive(Debug, Clone)]
    pub struct NotionReportSink {
        client: reqwest::Client,
        config: NotionConfig,
    }

    impl NotionReportSink {
        /// Creates the sink.
        pub fn new(config: NotionConfig) -> Result<Self, InitError> {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .map_err(|e| InitError::new("notion_report_sink", e.to_string()))?;
            Ok(Self { client, config })
        }
    }

    #[async_trait]
    impl ReportSink for NotionReportSink {
        async fn publish(&self, report: &WorkflowReport) -> Result<(), SinkError> {
            let body = render_notion_page(report, &self.config.database_id);
            let response = self
                .client
                .post(format!("{}/pages", self.config.endpoint))
                .bearer_auth(&self.config.token)
                .header("Notion-Version", NOTION_VERSION)
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(SinkError::Rejected {
                    sink: "notion",
                    status: status.as_u16(),
                    body,
                });
            }

            let page: serde_json::Value = response.json().await?;
            info!(
                run_id = %report.run_id,
                url = page.get("url").and_then(|u| u.as_str()).unwrap_or("N/A"),
                "notion report created"
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_report;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("partial"), "Partial");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_page_properties() {
        let report = sample_report("workflow_notion");
        let page = render_notion_page(&report, "db-123");

        assert_eq!(page["parent"]["database_id"], "db-123");
        assert_eq!(
            page["properties"]["Title"]["title"][0]["text"]["content"],
            "AI App Factory: focus"
        );
        assert_eq!(page["properties"]["Status"]["select"]["name"], "Completed");
        assert_eq!(
            page["properties"]["Success Rate"]["rich_text"][0]["text"]["content"],
            report.metrics.success_rate_display
        );
    }

    #[test]
    fn test_page_children_cover_stages_and_steps() {
        let report = sample_report("workflow_notion");
        let page = render_notion_page(&report, "db");
        let children = page["children"].as_array().unwrap();

        let paragraphs = children
            .iter()
            .filter(|block| block["type"] == "paragraph")
            .count();
        let bullets = children
            .iter()
            .filter(|block| block["type"] == "bulleted_list_item")
            .count();
        assert_eq!(paragraphs, 1 + report.stages.len());
        assert_eq!(bullets, report.next_steps.len());

        let summary = children[1]["paragraph"]["rich_text"][0]["text"]["content"]
            .as_str()
            .unwrap();
        assert!(summary.contains("Workflow ID: workflow_notion"));
    }

    #[test]
    fn test_page_shows_halt_reason() {
        let mut report = sample_report("workflow_notion");
        report.halted = Some("cancelled: shutdown".to_string());
        let page = render_notion_page(&report, "db");

        assert_eq!(
            page["children"][2]["paragraph"]["rich_text"][0]["text"]["content"],
            "Halted: cancelled: shutdown"
        );
        assert_eq!(page["children"][3]["type"], "heading_2");
    }
}
