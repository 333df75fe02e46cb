use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::assemble::assemble;
use crate::bottleneck;
use crate::config::Thresholds;
use crate::models::{
    DevelopmentPlan, Employee, EmployeeWorkflow, ReviewRecord, WorkflowBottleneck, WorkflowStage,
    WorkflowVelocityMetrics,
};
use crate::steps::build_steps;
use crate::velocity;

/// An immutable, fully derived view of every employee's workflow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowSnapshot {
    generated_at: Option<DateTime<Utc>>,
    workflows: Vec<EmployeeWorkflow>,
    index: HashMap<Uuid, usize>,
}

impl WorkflowSnapshot {
    pub fn build(
        employees: &[Employee],
        reviews: &[ReviewRecord],
        plans: &[DevelopmentPlan],
        now: DateTime<Utc>,
        thresholds: &Thresholds,
    ) -> Self {
        let reviews_by_employee = index_by_employee(reviews, |record| record.employee_id, "review");
        let plans_by_employee = index_by_employee(plans, |plan| plan.employee_id, "plan");

        let mut workflows = Vec::with_capacity(employees.len());
        let mut index = HashMap::with_capacity(employees.len());

        for employee in employees {
            let review = reviews_by_employee.get(&employee.id).copied();
            let plan = plans_by_employee.get(&employee.id).copied();
            let steps = build_steps(employee, review, plan, now, thresholds);
            let workflow = assemble(employee, steps, now, thresholds);

            match index.get(&employee.id).copied() {
                Some(slot) => {
                    warn!(employee_id = %employee.id, "duplicate employee, keeping the later record");
                    workflows[slot] = workflow;
                }
                None => {
                    index.insert(employee.id, workflows.len());
                    workflows.push(workflow);
                }
            }
        }

        Self {
            generated_at: Some(now),
            workflows,
            index,
        }
    }

    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        self.generated_at
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }

    pub fn get(&self, employee_id: Uuid) -> Option<&EmployeeWorkflow> {
        self.index
            .get(&employee_id)
            .and_then(|&slot| self.workflows.get(slot))
    }

    /// Workflows in employee input order.
    pub fn workflows(&self) -> &[EmployeeWorkflow] {
        &self.workflows
    }

    pub fn by_stage(&self, stage: WorkflowStage) -> Vec<&EmployeeWorkflow> {
        self.workflows
            .iter()
            .filter(|workflow| workflow.current_stage == stage)
            .collect()
    }

    pub fn to_map(&self) -> HashMap<Uuid, EmployeeWorkflow> {
        self.workflows
            .iter()
            .map(|workflow| (workflow.employee_id, workflow.clone()))
            .collect()
    }

    /// Head count per stage, in stage order.
    pub fn stage_distribution(&self) -> Vec<(WorkflowStage, usize)> {
        let mut counts = [0usize; WorkflowStage::COUNT];
        for workflow in &self.workflows {
            counts[workflow.current_stage.index()] += 1;
        }
        WorkflowStage::ALL.into_iter().zip(counts).collect()
    }

    /// Stuck workflows, longest wait first.
    pub fn stuck(&self) -> Vec<&EmployeeWorkflow> {
        let mut stuck: Vec<&EmployeeWorkflow> =
            self.workflows.iter().filter(|workflow| workflow.is_stuck).collect();
        stuck.sort_by(|a, b| {
            b.days_in_current_stage()
                .cmp(&a.days_in_current_stage())
                .then_with(|| a.employee_name.cmp(&b.employee_name))
        });
        stuck
    }

    pub fn bottlenecks(&self, thresholds: &Thresholds) -> Vec<WorkflowBottleneck> {
        bottleneck::detect(&self.workflows, thresholds)
    }

    pub fn velocity(&self) -> WorkflowVelocityMetrics {
        velocity::calculate(&self.workflows)
    }
}

/// Last record wins when a collection holds several for one employee.
fn index_by_employee<'a, T>(
    records: &'a [T],
    key: impl Fn(&T) -> Uuid,
    kind: &str,
) -> HashMap<Uuid, &'a T> {
    let mut indexed = HashMap::with_capacity(records.len());
    for record in records {
        let employee_id = key(record);
        if indexed.insert(employee_id, record).is_some() {
            warn!(%employee_id, kind, "multiple records for one employee, keeping the last");
        }
    }
    indexed
}

/// Owns the current snapshot and replaces it wholesale on every refresh.
///
/// Readers take an `Arc` to whichever snapshot is current and keep using it
/// while a refresh builds and swaps in the next one. The refresh count lives
/// here, never in a snapshot, so equal inputs give equal snapshots.
#[derive(Debug, Default)]
pub struct OrchestrationCache {
    thresholds: Thresholds,
    current: RwLock<Arc<WorkflowSnapshot>>,
    refreshes: Mutex<u64>,
}

impl OrchestrationCache {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            current: RwLock::new(Arc::new(WorkflowSnapshot::default())),
            refreshes: Mutex::new(0),
        }
    }

    /// How many refreshes have completed.
    pub fn generation(&self) -> u64 {
        *self.refreshes.lock()
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn refresh(
        &self,
        employees: &[Employee],
        reviews: &[ReviewRecord],
        plans: &[DevelopmentPlan],
    ) -> Arc<WorkflowSnapshot> {
        self.refresh_at(employees, reviews, plans, Utc::now())
    }

    pub fn refresh_at(
        &self,
        employees: &[Employee],
        reviews: &[ReviewRecord],
        plans: &[DevelopmentPlan],
        now: DateTime<Utc>,
    ) -> Arc<WorkflowSnapshot> {
        let mut refreshes = self.refreshes.lock();

        let next = Arc::new(WorkflowSnapshot::build(
            employees,
            reviews,
            plans,
            now,
            &self.thresholds,
        ));

        *self.current.write() = Arc::clone(&next);
        *refreshes += 1;
        debug!(
            generation = *refreshes,
            employees = next.len(),
            "workflow snapshot refreshed"
        );
        next
    }

    pub fn snapshot(&self) -> Arc<WorkflowSnapshot> {
        Arc::clone(&self.current.read())
    }

    pub fn get(&self, employee_id: Uuid) -> Option<EmployeeWorkflow> {
        self.snapshot().get(employee_id).cloned()
    }

    pub fn get_by_stage(&self, stage: WorkflowStage) -> Vec<EmployeeWorkflow> {
        self.snapshot().by_stage(stage).into_iter().cloned().collect()
    }

    pub fn bottlenecks(&self) -> Vec<WorkflowBottleneck> {
        self.snapshot().bottlenecks(&self.thresholds)
    }

    pub fn velocity(&self) -> WorkflowVelocityMetrics {
        self.snapshot().velocity()
    }
}
