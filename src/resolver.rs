use chrono::{DateTime, Utc};

use crate::config::Thresholds;
use crate::models::{DevelopmentPlan, Employee, ReviewRecord, WorkflowStage};

/// Whole days from `from` to `to`, never negative.
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_days().max(0)
}

pub fn days_since(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    days_between(then, now)
}

/// The completion facts every stage decision is made from.
///
/// Resolving the current stage and building the step list both read this
/// struct, so the two can never disagree about what is satisfied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageFacts {
    pub assessed: bool,
    pub self_review_done: bool,
    pub manager_review_done: bool,
    pub calibrated: bool,
    pub has_plan: bool,
    pub plan_age_days: i64,
    pub plan_reviewed: bool,
    pub check_in_due: bool,
    pub monitoring_done: bool,
}

impl StageFacts {
    pub fn derive(
        employee: &Employee,
        review: Option<&ReviewRecord>,
        plan: Option<&DevelopmentPlan>,
        now: DateTime<Utc>,
        thresholds: &Thresholds,
    ) -> Self {
        let assessed = employee.assessment.is_some();
        let self_review_done = review.is_some_and(ReviewRecord::self_review_satisfied);
        let manager_review_done = review.is_some_and(ReviewRecord::manager_review_satisfied);
        // Calibration has no fact of its own: it holds as soon as its inputs do.
        let calibrated = assessed && self_review_done && manager_review_done;

        let plan_age_days = plan.map_or(0, |plan| days_since(plan.created_at, now));
        let plan_reviewed = plan.is_some_and(DevelopmentPlan::reviewed_since_creation);

        Self {
            assessed,
            self_review_done,
            manager_review_done,
            calibrated,
            has_plan: plan.is_some(),
            plan_age_days,
            plan_reviewed,
            check_in_due: plan.is_some()
                && plan_age_days >= thresholds.check_in_after_days
                && !plan_reviewed,
            monitoring_done: plan_reviewed && plan_age_days >= thresholds.monitor_window_days,
        }
    }

    /// Whether the stage's own completion condition holds.
    pub fn is_complete(&self, stage: WorkflowStage) -> bool {
        match stage {
            WorkflowStage::Assess => self.assessed,
            WorkflowStage::SelfReview => self.self_review_done,
            WorkflowStage::ManagerReview => self.manager_review_done,
            WorkflowStage::Calibrate => self.calibrated,
            WorkflowStage::Plan => self.has_plan,
            WorkflowStage::Execute30 => self.plan_reviewed,
            WorkflowStage::Monitor90 => self.monitoring_done,
        }
    }
}

type Rule = (fn(&StageFacts) -> bool, WorkflowStage);

fn not_assessed(facts: &StageFacts) -> bool {
    !facts.assessed
}

fn self_review_pending(facts: &StageFacts) -> bool {
    !facts.self_review_done
}

fn manager_review_pending(facts: &StageFacts) -> bool {
    !facts.manager_review_done
}

fn not_calibrated(facts: &StageFacts) -> bool {
    !facts.calibrated
}

fn no_plan(facts: &StageFacts) -> bool {
    !facts.has_plan
}

fn check_in_due(facts: &StageFacts) -> bool {
    facts.check_in_due
}

/// Evaluated top to bottom; the first matching predicate names the stage.
const RULES: [Rule; 6] = [
    (not_assessed, WorkflowStage::Assess),
    (self_review_pending, WorkflowStage::SelfReview),
    (manager_review_pending, WorkflowStage::ManagerReview),
    (not_calibrated, WorkflowStage::Calibrate),
    (no_plan, WorkflowStage::Plan),
    (check_in_due, WorkflowStage::Execute30),
];

pub fn resolve_facts(facts: &StageFacts) -> WorkflowStage {
    RULES
        .iter()
        .find(|(applies, _)| applies(facts))
        .map_or(WorkflowStage::Monitor90, |&(_, stage)| stage)
}

pub fn resolve(
    employee: &Employee,
    review: Option<&ReviewRecord>,
    plan: Option<&DevelopmentPlan>,
    now: DateTime<Utc>,
    thresholds: &Thresholds,
) -> WorkflowStage {
    resolve_facts(&StageFacts::derive(employee, review, plan, now, thresholds))
}
