use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The seven lifecycle stages, in progression order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowStage {
    Assess,
    SelfReview,
    ManagerReview,
    Calibrate,
    Plan,
    #[serde(rename = "execute-30")]
    Execute30,
    #[serde(rename = "monitor-90")]
    Monitor90,
}

impl WorkflowStage {
    pub const ALL: [WorkflowStage; 7] = [
        WorkflowStage::Assess,
        WorkflowStage::SelfReview,
        WorkflowStage::ManagerReview,
        WorkflowStage::Calibrate,
        WorkflowStage::Plan,
        WorkflowStage::Execute30,
        WorkflowStage::Monitor90,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStage::Assess => "assess",
            WorkflowStage::SelfReview => "self-review",
            WorkflowStage::ManagerReview => "manager-review",
            WorkflowStage::Calibrate => "calibrate",
            WorkflowStage::Plan => "plan",
            WorkflowStage::Execute30 => "execute-30",
            WorkflowStage::Monitor90 => "monitor-90",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStage {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        WorkflowStage::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| anyhow::anyhow!("unknown workflow stage: {value}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStepStatus {
    Completed,
    Current,
    Upcoming,
    Blocked,
    Skipped,
}

/// Parsed leniently from any casing; unrecognized values become `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ReviewStatus {
    Draft,
    Submitted,
    Completed,
    Other,
}

impl From<&str> for ReviewStatus {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => ReviewStatus::Draft,
            "submitted" => ReviewStatus::Submitted,
            "completed" => ReviewStatus::Completed,
            _ => ReviewStatus::Other,
        }
    }
}

impl From<String> for ReviewStatus {
    fn from(value: String) -> Self {
        ReviewStatus::from(value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub performance: u8,
    pub potential: u8,
    pub assessed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub assessment: Option<Assessment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEntry {
    pub status: ReviewStatus,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub employee_id: Uuid,
    #[serde(default, rename = "self")]
    pub self_review: Option<ReviewEntry>,
    #[serde(default, rename = "manager")]
    pub manager_review: Option<ReviewEntry>,
}

impl ReviewRecord {
    /// A self-review counts once it has been submitted or completed.
    pub fn self_review_satisfied(&self) -> bool {
        matches!(
            self.self_review.as_ref().map(|entry| entry.status),
            Some(ReviewStatus::Submitted | ReviewStatus::Completed)
        )
    }

    pub fn manager_review_satisfied(&self) -> bool {
        matches!(
            self.manager_review.as_ref().map(|entry| entry.status),
            Some(ReviewStatus::Completed)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevelopmentPlan {
    pub employee_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_reviewed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub action_items: Vec<ActionItem>,
}

impl DevelopmentPlan {
    /// True when the plan was looked at again after it was written.
    pub fn reviewed_since_creation(&self) -> bool {
        self.last_reviewed
            .is_some_and(|reviewed| reviewed > self.created_at)
    }

    pub fn open_action_items(&self) -> usize {
        self.action_items.iter().filter(|item| !item.done).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub stage: WorkflowStage,
    pub status: WorkflowStepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub days_in_stage: i64,
    pub blockers: Vec<String>,
    pub can_auto_advance: bool,
    pub next_action: String,
}

impl WorkflowStep {
    pub fn is_completed(&self) -> bool {
        self.status == WorkflowStepStatus::Completed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeWorkflow {
    pub employee_id: Uuid,
    pub employee_name: String,
    pub current_stage: WorkflowStage,
    pub current_step_index: usize,
    pub steps: Vec<WorkflowStep>,
    pub overall_progress: u8,
    pub total_days_in_workflow: i64,
    pub is_stuck: bool,
    pub estimated_completion: Option<DateTime<Utc>>,
    pub last_advanced_at: Option<DateTime<Utc>>,
}

impl EmployeeWorkflow {
    pub fn current_step(&self) -> Option<&WorkflowStep> {
        self.steps.get(self.current_step_index)
    }

    pub fn days_in_current_stage(&self) -> i64 {
        self.current_step().map_or(0, |step| step.days_in_stage)
    }

    pub fn is_complete(&self) -> bool {
        self.overall_progress == 100
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        };
        f.write_str(label)
    }
}

/// What a remediation prompt would do if a person chose to act on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemediationKind {
    SendReminder,
    EscalateToManager,
    ScheduleCalibrationSession,
    DraftPlans,
    ScheduleCheckIn,
    ReviewProgress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedAction {
    pub kind: RemediationKind,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowBottleneck {
    pub stage: WorkflowStage,
    pub employee_count: usize,
    pub average_days_stuck: f64,
    pub severity: Severity,
    pub affected_employees: Vec<Uuid>,
    pub suggested_actions: Vec<SuggestedAction>,
    pub impact_description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowVelocityMetrics {
    pub average_time_to_assess: i64,
    pub average_time_to_review: i64,
    pub average_time_to_calibrate: i64,
    pub average_time_to_plan: i64,
    pub average_complete_cycle: i64,
    pub completion_rate: u8,
    pub stuck_count: usize,
    pub fastest_cycle: i64,
    pub slowest_cycle: i64,
}
