use chrono::{DateTime, Duration, Utc};

use crate::config::Thresholds;
use crate::models::{
    DevelopmentPlan, Employee, ReviewRecord, WorkflowStage, WorkflowStep, WorkflowStepStatus,
};
use crate::resolver::{days_since, resolve_facts, StageFacts};

/// Fixed per-stage annotations.
struct StageProfile {
    /// Shown on the following stage while this one is unmet.
    waiting_on: &'static str,
    next_action: &'static str,
    can_auto_advance: bool,
}

fn profile(stage: WorkflowStage) -> StageProfile {
    match stage {
        WorkflowStage::Assess => StageProfile {
            waiting_on: "Waiting for assessment",
            next_action: "Complete the performance and potential assessment",
            can_auto_advance: false,
        },
        WorkflowStage::SelfReview => StageProfile {
            waiting_on: "Waiting for self-review",
            next_action: "Employee submits their self-review",
            can_auto_advance: true,
        },
        WorkflowStage::ManagerReview => StageProfile {
            waiting_on: "Waiting for manager review",
            next_action: "Manager completes the review",
            can_auto_advance: true,
        },
        WorkflowStage::Calibrate => StageProfile {
            waiting_on: "Waiting for calibration",
            next_action: "Calibrate ratings with peer managers",
            can_auto_advance: false,
        },
        WorkflowStage::Plan => StageProfile {
            waiting_on: "Waiting for development plan",
            next_action: "Create a development plan",
            can_auto_advance: true,
        },
        WorkflowStage::Execute30 => StageProfile {
            waiting_on: "Waiting for 30-day check-in",
            next_action: "Hold the 30-day development plan check-in",
            can_auto_advance: false,
        },
        WorkflowStage::Monitor90 => StageProfile {
            waiting_on: "Waiting for 90-day review",
            next_action: "Track plan progress through the 90-day review",
            can_auto_advance: false,
        },
    }
}

fn next_action(stage: WorkflowStage, plan: Option<&DevelopmentPlan>) -> String {
    let base = profile(stage).next_action;
    match (stage, plan) {
        (WorkflowStage::Execute30 | WorkflowStage::Monitor90, Some(plan)) => {
            let open = plan.open_action_items();
            let noun = if open == 1 { "item" } else { "items" };
            format!("{base} ({open} open action {noun})")
        }
        _ => base.to_string(),
    }
}

/// The timestamp at which a stage's completion condition became true.
fn completion_time(
    stage: WorkflowStage,
    employee: &Employee,
    review: Option<&ReviewRecord>,
    plan: Option<&DevelopmentPlan>,
    thresholds: &Thresholds,
) -> Option<DateTime<Utc>> {
    let manager_submitted = || {
        review
            .and_then(|record| record.manager_review.as_ref())
            .and_then(|entry| entry.submitted_at)
    };

    match stage {
        WorkflowStage::Assess => employee
            .assessment
            .as_ref()
            .map(|assessment| assessment.assessed_at),
        WorkflowStage::SelfReview => review
            .and_then(|record| record.self_review.as_ref())
            .and_then(|entry| entry.submitted_at),
        WorkflowStage::ManagerReview => manager_submitted(),
        // Calibration is instantaneous once the manager review lands.
        WorkflowStage::Calibrate => manager_submitted(),
        WorkflowStage::Plan => plan.map(|plan| plan.created_at),
        WorkflowStage::Execute30 => plan.and_then(|plan| plan.last_reviewed),
        // The window closes at creation + 90 days, but never before the
        // check-in that ended execute-30.
        WorkflowStage::Monitor90 => plan.map(|plan| {
            let window_end = plan.created_at + Duration::days(thresholds.monitor_window_days);
            plan.last_reviewed.map_or(window_end, |reviewed| reviewed.max(window_end))
        }),
    }
}

/// Expands an employee's facts into all seven lifecycle steps, in stage order.
///
/// At most one step is `Current`: the stage the resolver picks for the same
/// facts. Unfinished steps before it are `Skipped`; unfinished steps after it
/// are `Blocked` when their predecessor is done and `Upcoming` otherwise.
pub fn build_steps(
    employee: &Employee,
    review: Option<&ReviewRecord>,
    plan: Option<&DevelopmentPlan>,
    now: DateTime<Utc>,
    thresholds: &Thresholds,
) -> Vec<WorkflowStep> {
    let facts = StageFacts::derive(employee, review, plan, now, thresholds);
    let current = resolve_facts(&facts);
    let mut steps: Vec<WorkflowStep> = Vec::with_capacity(WorkflowStage::COUNT);

    for stage in WorkflowStage::ALL {
        let complete = facts.is_complete(stage);
        let previous = steps.last();
        let previous_complete = previous.map_or(true, WorkflowStep::is_completed);

        let status = if complete {
            WorkflowStepStatus::Completed
        } else if stage == current {
            WorkflowStepStatus::Current
        } else if stage < current {
            WorkflowStepStatus::Skipped
        } else if previous_complete {
            WorkflowStepStatus::Blocked
        } else {
            WorkflowStepStatus::Upcoming
        };

        let started_at = match previous {
            None => Some(employee.created_at),
            Some(prev) if prev.status == WorkflowStepStatus::Skipped => prev.started_at,
            Some(prev) => prev.completed_at,
        };

        let completed_at = if complete {
            completion_time(stage, employee, review, plan, thresholds)
        } else {
            None
        };

        let days_in_stage = if complete {
            0
        } else {
            started_at.map_or(0, |started| days_since(started, now))
        };

        let blockers = match previous {
            // Ready to run, but held until the resolver's stage is done.
            _ if status == WorkflowStepStatus::Blocked => {
                vec![profile(current).waiting_on.to_string()]
            }
            Some(prev)
                if !complete
                    && !previous_complete
                    && prev.status != WorkflowStepStatus::Skipped =>
            {
                vec![profile(prev.stage).waiting_on.to_string()]
            }
            _ => Vec::new(),
        };

        steps.push(WorkflowStep {
            stage,
            status,
            started_at,
            completed_at,
            days_in_stage,
            blockers,
            can_auto_advance: profile(stage).can_auto_advance,
            next_action: next_action(stage, plan),
        });
    }

    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    use crate::models::{ActionItem, Assessment, ReviewEntry, ReviewStatus};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        now() - Duration::days(days)
    }

    fn employee(created: i64, assessed: Option<i64>) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            name: "Jules Moreno".to_string(),
            created_at: days_ago(created),
            assessment: assessed.map(|days| Assessment {
                performance: 2,
                potential: 3,
                assessed_at: days_ago(days),
            }),
        }
    }

    fn completed_reviews(employee: &Employee, own: i64, manager: i64) -> ReviewRecord {
        ReviewRecord {
            employee_id: employee.id,
            self_review: Some(ReviewEntry {
                status: ReviewStatus::Completed,
                submitted_at: Some(days_ago(own)),
            }),
            manager_review: Some(ReviewEntry {
                status: ReviewStatus::Completed,
                submitted_at: Some(days_ago(manager)),
            }),
        }
    }

    fn statuses(steps: &[WorkflowStep]) -> Vec<WorkflowStepStatus> {
        steps.iter().map(|step| step.status).collect()
    }

    fn build(employee: &Employee, review: Option<&ReviewRecord>, plan: Option<&DevelopmentPlan>) -> Vec<WorkflowStep> {
        build_steps(employee, review, plan, now(), &Thresholds::default())
    }

    #[test]
    fn new_employee_sits_in_assess() {
        use WorkflowStepStatus::*;

        let person = employee(5, None);
        let steps = build(&person, None, None);

        assert_eq!(steps.len(), 7);
        assert_eq!(
            statuses(&steps),
            vec![Current, Upcoming, Upcoming, Upcoming, Upcoming, Upcoming, Upcoming]
        );
        assert_eq!(steps[0].started_at, Some(person.created_at));
        assert_eq!(steps[0].days_in_stage, 5);
        assert!(steps[0].blockers.is_empty());
        assert_eq!(steps[1].blockers, vec!["Waiting for assessment".to_string()]);
        assert_eq!(steps[1].started_at, None);
        assert_eq!(steps[1].days_in_stage, 0);
    }

    #[test]
    fn assessed_employee_waits_on_self_review() {
        let person = employee(40, Some(20));
        let steps = build(&person, None, None);

        assert_eq!(steps[0].status, WorkflowStepStatus::Completed);
        assert_eq!(steps[0].completed_at, Some(days_ago(20)));
        assert_eq!(steps[1].status, WorkflowStepStatus::Current);
        assert_eq!(steps[1].started_at, Some(days_ago(20)));
        assert_eq!(steps[1].days_in_stage, 20);
        assert_eq!(steps[2].blockers, vec!["Waiting for self-review".to_string()]);
    }

    #[test]
    fn calibrate_completes_with_manager_review() {
        let person = employee(80, Some(60));
        let review = completed_reviews(&person, 50, 40);
        let steps = build(&person, Some(&review), None);

        assert_eq!(steps[3].status, WorkflowStepStatus::Completed);
        assert_eq!(steps[3].completed_at, Some(days_ago(40)));
        assert_eq!(steps[4].status, WorkflowStepStatus::Current);
        assert_eq!(steps[4].started_at, Some(days_ago(40)));
        assert_eq!(steps[4].days_in_stage, 40);
    }

    #[test]
    fn fresh_plan_skips_check_in_and_starts_monitoring() {
        let person = employee(80, Some(60));
        let review = completed_reviews(&person, 50, 40);
        let plan = DevelopmentPlan {
            employee_id: person.id,
            created_at: days_ago(10),
            last_reviewed: None,
            action_items: vec![
                ActionItem {
                    title: "Shadow a staff engineer".to_string(),
                    done: false,
                },
                ActionItem {
                    title: "Present at guild".to_string(),
                    done: true,
                },
            ],
        };
        let steps = build(&person, Some(&review), Some(&plan));

        assert_eq!(steps[5].status, WorkflowStepStatus::Skipped);
        assert_eq!(steps[5].started_at, Some(days_ago(10)));
        assert_eq!(steps[6].status, WorkflowStepStatus::Current);
        assert_eq!(steps[6].started_at, Some(days_ago(10)));
        assert_eq!(steps[6].days_in_stage, 10);
        assert!(steps[6].blockers.is_empty());
        assert_eq!(
            steps[6].next_action,
            "Track plan progress through the 90-day review (1 open action item)"
        );
    }

    #[test]
    fn out_of_order_facts_block_instead_of_doubling_current() {
        use WorkflowStepStatus::*;

        let person = employee(10, None);
        let review = ReviewRecord {
            employee_id: person.id,
            self_review: Some(ReviewEntry {
                status: ReviewStatus::Submitted,
                submitted_at: Some(days_ago(3)),
            }),
            manager_review: None,
        };
        let steps = build(&person, Some(&review), None);

        assert_eq!(
            statuses(&steps),
            vec![Current, Completed, Blocked, Upcoming, Upcoming, Upcoming, Upcoming]
        );
        assert_eq!(steps[2].days_in_stage, 3);
        assert_eq!(steps[2].blockers, vec!["Waiting for assessment".to_string()]);
        let current = steps.iter().filter(|step| step.status == Current).count();
        assert_eq!(current, 1);
    }

    #[test]
    fn finished_plan_completes_every_step() {
        let person = employee(120, Some(110));
        let review = completed_reviews(&person, 105, 100);
        let plan = DevelopmentPlan {
            employee_id: person.id,
            created_at: days_ago(95),
            last_reviewed: Some(days_ago(60)),
            action_items: Vec::new(),
        };
        let steps = build(&person, Some(&review), Some(&plan));

        assert!(steps.iter().all(WorkflowStep::is_completed));
        assert_eq!(steps[5].completed_at, Some(days_ago(60)));
        assert_eq!(steps[6].completed_at, Some(days_ago(5)));
        assert!(steps.iter().all(|step| step.days_in_stage == 0));
    }

    #[test]
    fn late_check_in_closes_the_monitoring_window() {
        let person = employee(200, Some(190));
        let review = completed_reviews(&person, 185, 180);
        let plan = DevelopmentPlan {
            employee_id: person.id,
            created_at: days_ago(120),
            last_reviewed: Some(days_ago(10)),
            action_items: Vec::new(),
        };
        let steps = build(&person, Some(&review), Some(&plan));

        assert!(steps.iter().all(WorkflowStep::is_completed));
        assert_eq!(steps[6].started_at, Some(days_ago(10)));
        assert_eq!(steps[6].completed_at, Some(days_ago(10)));
        for step in &steps {
            if let (Some(started), Some(completed)) = (step.started_at, step.completed_at) {
                assert!(completed >= started, "{} completed before it started", step.stage);
            }
        }
    }

    #[test]
    fn auto_advance_flags_are_static() {
        let person = employee(5, None);
        let flags: Vec<bool> = build(&person, None, None)
            .iter()
            .map(|step| step.can_auto_advance)
            .collect();
        assert_eq!(flags, vec![false, true, true, false, true, false, false]);
    }

    #[test]
    fn missing_submission_time_reads_as_zero_days() {
        let person = employee(50, Some(40));
        let review = ReviewRecord {
            employee_id: person.id,
            self_review: Some(ReviewEntry {
                status: ReviewStatus::Completed,
                submitted_at: None,
            }),
            manager_review: None,
        };
        let steps = build(&person, Some(&review), None);

        assert_eq!(steps[2].status, WorkflowStepStatus::Current);
        assert_eq!(steps[2].started_at, None);
        assert_eq!(steps[2].days_in_stage, 0);
    }
}
