use chrono::{DateTime, Duration, Utc};

use crate::config::Thresholds;
use crate::models::{Employee, EmployeeWorkflow, WorkflowStage, WorkflowStep, WorkflowStepStatus};
use crate::resolver::days_since;

pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (100.0 * completed as f64 / total as f64).round() as u8
}

/// Folds a step list into the per-employee workflow record.
pub fn assemble(
    employee: &Employee,
    steps: Vec<WorkflowStep>,
    now: DateTime<Utc>,
    thresholds: &Thresholds,
) -> EmployeeWorkflow {
    let current_step_index = steps
        .iter()
        .position(|step| step.status == WorkflowStepStatus::Current)
        .unwrap_or(steps.len().saturating_sub(1));

    let current_stage = steps
        .get(current_step_index)
        .map_or(WorkflowStage::Monitor90, |step| step.stage);

    let completed = steps.iter().filter(|step| step.is_completed()).count();
    let remaining = steps.len() - completed;

    let total_days_in_workflow = steps
        .first()
        .filter(|step| step.is_completed())
        .and_then(|step| step.completed_at)
        .map_or(0, |first| days_since(first, now));

    let is_stuck = steps
        .get(current_step_index)
        .is_some_and(|step| step.days_in_stage > thresholds.stuck_after_days);

    let estimated_completion = (remaining > 0).then(|| {
        now + Duration::days(thresholds.projected_days_per_step * remaining as i64)
    });

    let last_advanced_at = steps.iter().filter_map(|step| step.completed_at).max();

    EmployeeWorkflow {
        employee_id: employee.id,
        employee_name: employee.name.clone(),
        current_stage,
        current_step_index,
        overall_progress: progress_percent(completed, WorkflowStage::COUNT),
        total_days_in_workflow,
        is_stuck,
        estimated_completion,
        last_advanced_at,
        steps,
    }
}
