//! Ready-made reports for sink and aggregation tests.

use serde_json::json;

use crate::capabilities::Collaborators;
use crate::config::WorkflowConfig;
use crate::core::{StageData, StageId};
use crate::stages::StageResult;
use crate::workflow::{aggregate, WorkflowReport, WorkflowRun};

fn sample_output(stage: StageId) -> StageData {
    let project_info = json!({"app_name": "FocusPro", "project_path": "./generated_apps/focuspro"});
    match stage {
        StageId::TrendCollection => StageData::new()
            .with("selected_trend", json!({"keyword": "focus", "score": 87.5}))
            .with("collection_method", json!("mock")),
        StageId::UxAnalysis => StageData::new()
            .with("personas", json!([{"name": "A"}, {"name": "B"}, {"name": "C"}]))
            .with("strategies", json!([{"name": "AI-First Simplicity"}])),
        StageId::DesignSystem => StageData::new()
            .with("app_concept", json!({"name": "FocusPro"}))
            .with("component_system", json!({"components": {"button": {}, "card": {}}})),
        StageId::PrototypeBuild => StageData::new()
            .with("project_info", project_info)
            .with(
                "generated_files",
                json!({"components": ["Button.jsx"], "screens": ["MainScreen.jsx"], "config": ["package.json"]}),
            ),
        StageId::DeploymentConfig => StageData::new()
            .with("platforms", json!({"vercel": {"ready": true}, "netlify": {"ready": true}}))
            .with("project_info", project_info),
        StageId::Reporting => {
            StageData::new().with("final_outputs", json!({"app_name": "FocusPro"}))
        }
    }
}

/// A finished, fully completed report for topic `focus` with all-mock
/// collaborators.
#[must_use]
pub fn sample_report(run_id: &str) -> WorkflowReport {
    let mut run = WorkflowRun::with_id(run_id, WorkflowConfig::new("focus"));
    for stage in StageId::ALL {
        let mut result = StageResult::pending(stage);
        result.begin_attempt();
        result.complete(sample_output(stage));
        // In order and terminal.
        let _ = run.record(result);
    }
    run.finish();
    aggregate(&run, StageId::ALL.len(), &Collaborators::mocks().modes())
}
