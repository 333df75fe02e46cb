use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::models::Severity;

/// A severity band: a stage lands in it when either bound is crossed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityTier {
    pub min_employees: usize,
    pub min_average_days: f64,
}

impl SeverityTier {
    pub fn matches(&self, employee_count: usize, average_days: f64) -> bool {
        employee_count >= self.min_employees || average_days > self.min_average_days
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Thresholds {
    pub stuck_after_days: i64,
    pub check_in_after_days: i64,
    pub monitor_window_days: i64,
    pub projected_days_per_step: i64,
    pub bottleneck_min_employees: usize,
    pub bottleneck_min_average_days: f64,
    pub critical: SeverityTier,
    pub high: SeverityTier,
    pub medium: SeverityTier,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            stuck_after_days: 14,
            check_in_after_days: 30,
            monitor_window_days: 90,
            projected_days_per_step: 14,
            bottleneck_min_employees: 10,
            bottleneck_min_average_days: 14.0,
            critical: SeverityTier {
                min_employees: 20,
                min_average_days: 30.0,
            },
            high: SeverityTier {
                min_employees: 15,
                min_average_days: 21.0,
            },
            medium: SeverityTier {
                min_employees: 10,
                min_average_days: 14.0,
            },
        }
    }
}

impl Thresholds {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read thresholds from {}", path.display()))?;
        let thresholds = serde_json::from_str(&raw)
            .with_context(|| format!("invalid thresholds file {}", path.display()))?;
        Ok(thresholds)
    }

    pub fn is_bottleneck(&self, employee_count: usize, average_days: f64) -> bool {
        employee_count >= self.bottleneck_min_employees
            || average_days > self.bottleneck_min_average_days
    }

    pub fn severity(&self, employee_count: usize, average_days: f64) -> Severity {
        if self.critical.matches(employee_count, average_days) {
            Severity::Critical
        } else if self.high.matches(employee_count, average_days) {
            Severity::High
        } else if self.medium.matches(employee_count, average_days) {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}
