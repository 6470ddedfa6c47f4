//! Turns a finished run into a [`WorkflowReport`].
//!
//! Aggregation never fails: missing or malformed stage output degrades to
//! placeholder text.

use super::report::{PerformanceMetrics, StageReport, WorkflowReport};
use super::run::WorkflowRun;
use crate::capabilities::{CollaboratorKind, CollaboratorMode};
use crate::core::{OverallStatus, StageData, StageId};
use crate::stages::StageResult;
use crate::utils::format_seconds;
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Summary used when a stage has no usable output.
pub const NO_DATA: &str = "No data available";

/// Builds the report for `run` against `declared` stages.
#[must_use]
pub fn aggregate(
    run: &WorkflowRun,
    declared: usize,
    collaborators: &[(CollaboratorKind, CollaboratorMode)],
) -> WorkflowReport {
    let completed = run.completed_count();
    let total = run.elapsed();

    let stages = run.stages().iter().map(stage_report).collect();
    let generated_outputs = StageId::ALL
        .iter()
        .filter_map(|&id| run.output_of(id).map(|data| (id, data.clone())))
        .collect();

    WorkflowReport {
        run_id: run.run_id().to_string(),
        config: run.config().summary(),
        status: OverallStatus::from_counts(completed, declared),
        started_at: run.started_at(),
        ended_at: run.ended_at().unwrap_or_else(Utc::now),
        successful_stages: format!("{completed}/{declared}"),
        stages,
        generated_outputs,
        metrics: metrics(total, completed, declared),
        next_steps: next_steps(run),
        collaborators: collaborators.iter().copied().collect::<BTreeMap<_, _>>(),
        halted: run.halt_reason().map(str::to_string),
    }
}

#[allow(clippy::cast_precision_loss)]
fn metrics(total: Duration, completed: usize, declared: usize) -> PerformanceMetrics {
    let (average, success_rate) = if declared == 0 {
        (Duration::ZERO, 0.0)
    } else {
        let divisor = u32::try_from(declared).unwrap_or(u32::MAX);
        (total / divisor, completed as f64 / declared as f64)
    };

    PerformanceMetrics {
        total_duration_secs: total.as_secs_f64(),
        average_stage_duration_secs: average.as_secs_f64(),
        success_rate,
        completed_stages: completed,
        declared_stages: declared,
        total_time: format_seconds(total),
        average_stage_time: format_seconds(average),
        success_rate_display: format!("{:.1}%", success_rate * 100.0),
    }
}

fn stage_report(result: &StageResult) -> StageReport {
    let summary = result
        .output()
        .filter(|_| result.is_completed())
        .and_then(|data| summarize(result.stage(), data))
        .unwrap_or_else(|| NO_DATA.to_string());

    StageReport {
        stage: result.stage(),
        status: result.status(),
        started_at: result.started_at(),
        ended_at: result.ended_at(),
        duration_secs: result.duration().unwrap_or_default().as_secs_f64(),
        retry_count: result.retry_count(),
        error: result.error().map(str::to_string),
        summary,
    }
}

fn array_len(data: &StageData, pointer: &str) -> Option<usize> {
    data.pointer(pointer).and_then(Value::as_array).map(Vec::len)
}

fn object_len(data: &StageData, pointer: &str) -> Option<usize> {
    data.pointer(pointer)
        .and_then(Value::as_object)
        .map(serde_json::Map::len)
}

/// One-line summary of a stage's output, or `None` if the shape is wrong.
fn summarize(stage: StageId, data: &StageData) -> Option<String> {
    match stage {
        StageId::TrendCollection => {
            let keyword = data.pointer_str("/selected_trend/keyword")?;
            let score = data.pointer("/selected_trend/score").filter(|v| v.is_number())?;
            Some(format!("Selected trend: {keyword} (Score: {score})"))
        }
        StageId::UxAnalysis => {
            let personas = array_len(data, "/personas")?;
            let strategies = array_len(data, "/strategies")?;
            Some(format!(
                "Generated {personas} personas and {strategies} strategies"
            ))
        }
        StageId::DesignSystem => {
            let name = data.pointer_str("/app_concept/name")?;
            let components = object_len(data, "/component_system/components")?;
            Some(format!(
                "Created design system for {name} with {components} components"
            ))
        }
        StageId::PrototypeBuild => {
            let name = data.pointer_str("/project_info/app_name")?;
            data.pointer("/generated_files").and_then(Value::as_object)?;
            let files: usize = ["components", "screens", "config"]
                .iter()
                .map(|group| array_len(data, &format!("/generated_files/{group}")).unwrap_or(0))
                .sum();
            Some(format!(
                "Built React prototype for {name} with {files} files"
            ))
        }
        StageId::DeploymentConfig => {
            let platforms = object_len(data, "/platforms")?;
            Some(format!("Configured deployment for {platforms} platforms"))
        }
        StageId::Reporting => Some("Generated comprehensive workflow report".to_string()),
    }
}

/// Project steps if a prototype exists, otherwise generic remediation.
fn next_steps(run: &WorkflowRun) -> Vec<String> {
    let project_path = run
        .stages()
        .iter()
        .rev()
        .filter(|result| result.is_completed())
        .find_map(|result| result.output()?.pointer_str("/project_info/project_path"));

    match project_path {
        Some(path) => vec![
            format!("1. Navigate to project: cd {path}"),
            "2. Install dependencies: npm install".to_string(),
            "3. Start development: npm start".to_string(),
            "4. Open http://localhost:3000".to_string(),
            "5. Deploy using vercel --prod or netlify deploy --prod".to_string(),
        ],
        None => vec![
            "1. Review the generated outputs above".to_string(),
            "2. Check stage results for any errors".to_string(),
            "3. Re-run failed stages if needed".to_string(),
            "4. Check the configuration and API keys".to_string(),
        ],
    }
}
