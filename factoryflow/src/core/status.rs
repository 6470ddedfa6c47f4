//! Stage identifiers and status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the six fixed stages of the app factory workflow.
///
/// The derived ordering is the execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    /// Look up market trends for the topic.
    TrendCollection,
    /// Build personas and UX strategies for the selected trend.
    UxAnalysis,
    /// Turn the UX strategy into design tokens and a component spec.
    DesignSystem,
    /// Produce a scaffold manifest from the design system.
    PrototypeBuild,
    /// Render hosting configuration for the generated project.
    DeploymentConfig,
    /// Summarize the run.
    Reporting,
}

impl StageId {
    /// Every stage, in execution order.
    pub const ALL: [Self; 6] = [
        Self::TrendCollection,
        Self::UxAnalysis,
        Self::DesignSystem,
        Self::PrototypeBuild,
        Self::DeploymentConfig,
        Self::Reporting,
    ];

    /// Returns the stable snake_case name used in reports and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TrendCollection => "trend_collection",
            Self::UxAnalysis => "ux_analysis",
            Self::DesignSystem => "design_system",
            Self::PrototypeBuild => "prototype_build",
            Self::DeploymentConfig => "deployment_config",
            Self::Reporting => "reporting",
        }
    }

    /// Zero-based position in the pipeline.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The stage that runs immediately before this one.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::TrendCollection => None,
            Self::UxAnalysis => Some(Self::TrendCollection),
            Self::DesignSystem => Some(Self::UxAnalysis),
            Self::PrototypeBuild => Some(Self::DesignSystem),
            Self::DeploymentConfig => Some(Self::PrototypeBuild),
            Self::Reporting => Some(Self::DeploymentConfig),
        }
    }

    /// The stage that runs immediately after this one.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::TrendCollection => Some(Self::UxAnalysis),
            Self::UxAnalysis => Some(Self::DesignSystem),
            Self::DesignSystem => Some(Self::PrototypeBuild),
            Self::PrototypeBuild => Some(Self::DeploymentConfig),
            Self::DeploymentConfig => Some(Self::Reporting),
            Self::Reporting => None,
        }
    }

    /// Human-readable title, e.g. "Ux Analysis".
    #[must_use]
    pub fn title(self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_uppercase().chain(chars).collect()
                })
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The execution status of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage record exists but no attempt has started.
    #[default]
    Pending,
    /// An attempt is running.
    InProgress,
    /// Stage finished successfully.
    Completed,
    /// Retries were exhausted or the run was cancelled. Only entered from
    /// `InProgress`; a cancel during a retry delay resumes the stage first.
    Failed,
    /// The last attempt failed and another one is scheduled.
    Retrying,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Retrying => write!(f, "retrying"),
        }
    }
}

impl StageStatus {
    /// Returns true if the status represents a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether the per-stage state machine allows moving to `next`.
    ///
    /// `Pending -> InProgress`, `InProgress -> Retrying | Completed | Failed`,
    /// `Retrying -> InProgress`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending | Self::Retrying, Self::InProgress)
                | (Self::InProgress, Self::Retrying | Self::Completed | Self::Failed)
        )
    }
}

/// Degree of success of a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// Every declared stage completed.
    Completed,
    /// Some, but not all, stages completed.
    Partial,
    /// No stage completed.
    Failed,
}

impl OverallStatus {
    /// Derives the overall status from completed and declared stage counts.
    #[must_use]
    pub const fn from_counts(completed: usize, declared: usize) -> Self {
        if completed == 0 {
            Self::Failed
        } else if completed >= declared {
            Self::Completed
        } else {
            Self::Partial
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Partial => write!(f, "partial"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
