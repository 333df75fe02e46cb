use crate::assemble::progress_percent;
use crate::models::{EmployeeWorkflow, WorkflowStage, WorkflowVelocityMetrics};
use crate::resolver::days_between;

fn rounded_mean(values: &[i64]) -> i64 {
    if values.is_empty() {
        return 0;
    }
    let total: i64 = values.iter().sum();
    (total as f64 / values.len() as f64).round() as i64
}

/// Days from entering the lifecycle to finishing `stage`, for every workflow
/// that has finished it with a known timestamp.
fn days_to_reach(workflows: &[EmployeeWorkflow], stage: WorkflowStage) -> Vec<i64> {
    workflows
        .iter()
        .filter_map(|workflow| {
            let entered = workflow.steps.first()?.started_at?;
            let step = workflow.steps.get(stage.index())?;
            if !step.is_completed() {
                return None;
            }
            Some(days_between(entered, step.completed_at?))
        })
        .collect()
}

pub fn calculate(workflows: &[EmployeeWorkflow]) -> WorkflowVelocityMetrics {
    let cycles: Vec<i64> = workflows
        .iter()
        .filter(|workflow| workflow.is_complete())
        .map(|workflow| workflow.total_days_in_workflow)
        .collect();

    WorkflowVelocityMetrics {
        average_time_to_assess: rounded_mean(&days_to_reach(workflows, WorkflowStage::Assess)),
        average_time_to_review: rounded_mean(&days_to_reach(
            workflows,
            WorkflowStage::ManagerReview,
        )),
        average_time_to_calibrate: rounded_mean(&days_to_reach(
            workflows,
            WorkflowStage::Calibrate,
        )),
        average_time_to_plan: rounded_mean(&days_to_reach(workflows, WorkflowStage::Plan)),
        average_complete_cycle: rounded_mean(&cycles),
        completion_rate: progress_percent(cycles.len(), workflows.len()),
        stuck_count: workflows.iter().filter(|workflow| workflow.is_stuck).count(),
        fastest_cycle: cycles.iter().copied().min().unwrap_or(0),
        slowest_cycle: cycles.iter().copied().max().unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use uuid::Uuid;

    use crate::assemble::assemble;
    use crate::config::Thresholds;
    use crate::models::{
        Assessment, DevelopmentPlan, Employee, ReviewEntry, ReviewRecord, ReviewStatus,
    };
    use crate::steps::build_steps;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        now() - Duration::days(days)
    }

    /// An employee who joined `joined` days ago and finished the whole cycle,
    /// starting with an assessment `assessed` days ago.
    fn finished(joined: i64, assessed: i64) -> EmployeeWorkflow {
        let employee = Employee {
            id: Uuid::new_v4(),
            name: "Avery Lee".to_string(),
            created_at: days_ago(joined),
            assessment: Some(Assessment {
                performance: 3,
                potential: 3,
                assessed_at: days_ago(assessed),
            }),
        };
        let review = ReviewRecord {
            employee_id: employee.id,
            self_review: Some(ReviewEntry {
                status: ReviewStatus::Completed,
                submitted_at: Some(days_ago(assessed - 2)),
            }),
            manager_review: Some(ReviewEntry {
                status: ReviewStatus::Completed,
                submitted_at: Some(days_ago(assessed - 4)),
            }),
        };
        let plan = DevelopmentPlan {
            employee_id: employee.id,
            created_at: days_ago(assessed - 5),
            last_reviewed: Some(days_ago(assessed - 40)),
            action_items: Vec::new(),
        };
        build(&employee, Some(&review), Some(&plan))
    }

    fn waiting(joined: i64) -> EmployeeWorkflow {
        let employee = Employee {
            id: Uuid::new_v4(),
            name: "Jules Moreno".to_string(),
            created_at: days_ago(joined),
            assessment: None,
        };
        build(&employee, None, None)
    }

    fn build(
        employee: &Employee,
        review: Option<&ReviewRecord>,
        plan: Option<&DevelopmentPlan>,
    ) -> EmployeeWorkflow {
        let thresholds = Thresholds::default();
        let steps = build_steps(employee, review, plan, now(), &thresholds);
        assemble(employee, steps, now(), &thresholds)
    }

    #[test]
    fn empty_population_yields_zeroes() {
        assert_eq!(calculate(&[]), WorkflowVelocityMetrics::default());
    }

    #[test]
    fn completed_cycles_drive_cycle_stats() {
        let workflows = vec![finished(130, 95), finished(150, 120), waiting(20)];
        let metrics = calculate(&workflows);

        assert_eq!(metrics.completion_rate, 67);
        assert_eq!(metrics.fastest_cycle, 95);
        assert_eq!(metrics.slowest_cycle, 120);
        assert_eq!(metrics.average_complete_cycle, 108);
        assert_eq!(metrics.stuck_count, 1);
    }

    #[test]
    fn stage_timings_skip_workflows_that_never_got_there() {
        let workflows = vec![finished(130, 95), finished(150, 120), waiting(20)];
        let metrics = calculate(&workflows);

        // (130 - 95) and (150 - 120): 35 and 30 days to first assessment.
        assert_eq!(metrics.average_time_to_assess, 33);
        assert_eq!(metrics.average_time_to_review, 37);
        assert_eq!(metrics.average_time_to_calibrate, 37);
        assert_eq!(metrics.average_time_to_plan, 38);
    }
}
