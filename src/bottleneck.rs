use std::collections::BTreeMap;

use tracing::info;
use uuid::Uuid;

use crate::config::Thresholds;
use crate::models::{
    EmployeeWorkflow, RemediationKind, SuggestedAction, WorkflowBottleneck, WorkflowStage,
};

#[derive(Default)]
struct StageGroup {
    employees: Vec<Uuid>,
    total_days: u64,
}

impl StageGroup {
    fn average_days(&self) -> f64 {
        if self.employees.is_empty() {
            0.0
        } else {
            self.total_days as f64 / self.employees.len() as f64
        }
    }
}

fn action(kind: RemediationKind, label: impl Into<String>) -> SuggestedAction {
    SuggestedAction {
        kind,
        label: label.into(),
    }
}

/// Advisory remediation prompts for a congested stage. Nothing here runs.
pub fn suggested_actions(stage: WorkflowStage, employee_count: usize) -> Vec<SuggestedAction> {
    use RemediationKind::*;

    match stage {
        WorkflowStage::Assess => vec![
            action(SendReminder, format!("Send assessment reminders to {employee_count} managers")),
            action(EscalateToManager, "Escalate overdue assessments to department heads"),
        ],
        WorkflowStage::SelfReview => vec![
            action(SendReminder, format!("Send self-review reminders to {employee_count} employees")),
            action(EscalateToManager, "Ask managers to nudge direct reports"),
        ],
        WorkflowStage::ManagerReview => vec![
            action(SendReminder, format!("Send reminders for {employee_count} pending manager reviews")),
            action(EscalateToManager, "Escalate overdue reviews to skip-level managers"),
        ],
        WorkflowStage::Calibrate => vec![action(
            ScheduleCalibrationSession,
            "Schedule a calibration session",
        )],
        WorkflowStage::Plan => vec![
            action(DraftPlans, format!("AI-draft {employee_count} development plans")),
            action(SendReminder, "Remind managers to finalize development plans"),
        ],
        WorkflowStage::Execute30 => vec![
            action(ScheduleCheckIn, format!("Schedule {employee_count} 30-day check-ins")),
            action(SendReminder, "Remind managers to log plan progress"),
        ],
        WorkflowStage::Monitor90 => vec![action(
            ReviewProgress,
            format!("Review 90-day progress for {employee_count} plans"),
        )],
    }
}

fn impact_description(stage: WorkflowStage, employee_count: usize, average_days: f64) -> String {
    let people = if employee_count == 1 { "employee" } else { "employees" };
    format!(
        "{employee_count} {people} waiting in {stage} for an average of {average_days:.1} days"
    )
}

/// Groups workflows by current stage and reports the congested ones, most
/// severe first.
pub fn detect(workflows: &[EmployeeWorkflow], thresholds: &Thresholds) -> Vec<WorkflowBottleneck> {
    let mut groups: BTreeMap<WorkflowStage, StageGroup> = BTreeMap::new();

    for workflow in workflows {
        let group = groups.entry(workflow.current_stage).or_default();
        group.employees.push(workflow.employee_id);
        group.total_days += workflow.days_in_current_stage().max(0) as u64;
    }

    let mut bottlenecks: Vec<WorkflowBottleneck> = groups
        .into_iter()
        .filter_map(|(stage, mut group)| {
            let employee_count = group.employees.len();
            let average_days = group.average_days();
            if !thresholds.is_bottleneck(employee_count, average_days) {
                return None;
            }

            group.employees.sort();
            Some(WorkflowBottleneck {
                stage,
                employee_count,
                average_days_stuck: average_days,
                severity: thresholds.severity(employee_count, average_days),
                affected_employees: group.employees,
                suggested_actions: suggested_actions(stage, employee_count),
                impact_description: impact_description(stage, employee_count, average_days),
            })
        })
        .collect();

    bottlenecks.sort_by(|a, b| a.severity.cmp(&b.severity).then(a.stage.cmp(&b.stage)));

    if !bottlenecks.is_empty() {
        info!(
            count = bottlenecks.len(),
            worst = %bottlenecks[0].stage,
            severity = %bottlenecks[0].severity,
            "workflow bottlenecks detected"
        );
    }

    bottlenecks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Severity, WorkflowStep, WorkflowStepStatus};

    fn workflow(stage: WorkflowStage, days: i64) -> EmployeeWorkflow {
        let steps = WorkflowStage::ALL
            .into_iter()
            .map(|step_stage| WorkflowStep {
                stage: step_stage,
                status: if step_stage < stage {
                    WorkflowStepStatus::Completed
                } else if step_stage == stage {
                    WorkflowStepStatus::Current
                } else {
                    WorkflowStepStatus::Upcoming
                },
                started_at: None,
                completed_at: None,
                days_in_stage: if step_stage == stage { days } else { 0 },
                blockers: Vec::new(),
                can_auto_advance: false,
                next_action: String::new(),
            })
            .collect();

        EmployeeWorkflow {
            employee_id: Uuid::new_v4(),
            employee_name: "Avery Lee".to_string(),
            current_stage: stage,
            current_step_index: stage.index(),
            steps,
            overall_progress: 0,
            total_days_in_workflow: 0,
            is_stuck: days > 14,
            estimated_completion: None,
            last_advanced_at: None,
        }
    }

    fn many(stage: WorkflowStage, count: usize, days: i64) -> Vec<EmployeeWorkflow> {
        (0..count).map(|_| workflow(stage, days)).collect()
    }

    #[test]
    fn crowded_stage_qualifies_on_count_alone() {
        let workflows = many(WorkflowStage::ManagerReview, 12, 10);
        let bottlenecks = detect(&workflows, &Thresholds::default());

        assert_eq!(bottlenecks.len(), 1);
        let found = &bottlenecks[0];
        assert_eq!(found.stage, WorkflowStage::ManagerReview);
        assert_eq!(found.employee_count, 12);
        assert_eq!(found.average_days_stuck, 10.0);
        assert_eq!(found.severity, Severity::Medium);
        assert_eq!(found.affected_employees.len(), 12);
    }

    #[test]
    fn crowded_and_slow_stage_is_critical() {
        let workflows = many(WorkflowStage::Plan, 22, 35);
        let bottlenecks = detect(&workflows, &Thresholds::default());

        assert_eq!(bottlenecks[0].severity, Severity::Critical);
        assert!(bottlenecks[0]
            .suggested_actions
            .iter()
            .any(|action| action.kind == RemediationKind::DraftPlans
                && action.label == "AI-draft 22 development plans"));
    }

    #[test]
    fn small_quick_groups_are_ignored() {
        let mut workflows = many(WorkflowStage::Assess, 4, 3);
        workflows.extend(many(WorkflowStage::SelfReview, 9, 14));
        assert!(detect(&workflows, &Thresholds::default()).is_empty());
    }

    #[test]
    fn single_long_wait_qualifies_on_duration() {
        let workflows = many(WorkflowStage::Execute30, 1, 22);
        let bottlenecks = detect(&workflows, &Thresholds::default());

        assert_eq!(bottlenecks.len(), 1);
        assert_eq!(bottlenecks[0].severity, Severity::High);
        assert_eq!(
            bottlenecks[0].impact_description,
            "1 employee waiting in execute-30 for an average of 22.0 days"
        );
    }

    #[test]
    fn output_is_ranked_most_severe_first() {
        let mut workflows = many(WorkflowStage::SelfReview, 10, 1);
        workflows.extend(many(WorkflowStage::ManagerReview, 3, 40));
        workflows.extend(many(WorkflowStage::Assess, 16, 2));

        let order: Vec<Severity> = detect(&workflows, &Thresholds::default())
            .iter()
            .map(|found| found.severity)
            .collect();
        assert_eq!(order, vec![Severity::Critical, Severity::High, Severity::Medium]);
    }

    #[test]
    fn no_workflows_no_bottlenecks() {
        assert!(detect(&[], &Thresholds::default()).is_empty());
    }
}
