//! Derives where each employee sits in the seven-stage talent lifecycle
//! (assess, self-review, manager-review, calibrate, plan, execute-30,
//! monitor-90) from independently maintained facts, and rolls the results up
//! into bottleneck and velocity analytics.
//!
//! Everything is recomputed from the facts on each refresh; nothing the
//! engine produces is stored or acted upon by it.

pub mod assemble;
pub mod bottleneck;
pub mod cache;
pub mod config;
pub mod facts;
pub mod models;
pub mod report;
pub mod resolver;
pub mod steps;
pub mod velocity;

pub use cache::{OrchestrationCache, WorkflowSnapshot};
pub use config::Thresholds;
pub use models::{
    EmployeeWorkflow, Severity, WorkflowBottleneck, WorkflowStage, WorkflowStep,
    WorkflowStepStatus, WorkflowVelocityMetrics,
};
