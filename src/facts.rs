use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    ActionItem, Assessment, DevelopmentPlan, Employee, ReviewEntry, ReviewRecord, ReviewStatus,
};

/// The three input collections, as handed over by the host application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactBundle {
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub reviews: Vec<ReviewRecord>,
    #[serde(default)]
    pub plans: Vec<DevelopmentPlan>,
}

/// Reads a JSON bundle, or a directory of CSV files.
pub fn load(path: &Path) -> anyhow::Result<FactBundle> {
    if path.is_dir() {
        import_csv_dir(path)
    } else {
        load_json(path)
    }
}

pub fn load_json(path: &Path) -> anyhow::Result<FactBundle> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read facts from {}", path.display()))?;
    let bundle = serde_json::from_str(&raw)
        .with_context(|| format!("invalid facts file {}", path.display()))?;
    Ok(bundle)
}

pub fn write_json(path: &Path, bundle: &FactBundle) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(bundle)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_timestamp(value: &str) -> anyhow::Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid timestamp: {value}"))?;
    let midnight = date.and_hms_opt(0, 0, 0).context("invalid date")?;
    Ok(midnight.and_utc())
}

fn parse_optional(value: Option<String>) -> anyhow::Result<Option<DateTime<Utc>>> {
    value
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_timestamp(&raw))
        .transpose()
}

fn review_entry(
    status: Option<String>,
    submitted_at: Option<String>,
) -> anyhow::Result<Option<ReviewEntry>> {
    let Some(status) = status.filter(|raw| !raw.trim().is_empty()) else {
        return Ok(None);
    };
    Ok(Some(ReviewEntry {
        status: ReviewStatus::from(status.as_str()),
        submitted_at: parse_optional(submitted_at)?,
    }))
}

fn action_items(raw: Option<String>) -> Vec<ActionItem> {
    raw.unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match item.strip_prefix("[x]") {
            Some(title) => ActionItem {
                title: title.trim().to_string(),
                done: true,
            },
            None => ActionItem {
                title: item.to_string(),
                done: false,
            },
        })
        .collect()
}

/// Reads `employees.csv`, plus `reviews.csv` and `plans.csv` when present.
pub fn import_csv_dir(dir: &Path) -> anyhow::Result<FactBundle> {
    #[derive(serde::Deserialize)]
    struct EmployeeRow {
        id: Uuid,
        name: String,
        created_at: String,
        performance: Option<u8>,
        potential: Option<u8>,
        assessed_at: Option<String>,
    }

    #[derive(serde::Deserialize)]
    struct ReviewRow {
        employee_id: Uuid,
        self_status: Option<String>,
        self_submitted_at: Option<String>,
        manager_status: Option<String>,
        manager_submitted_at: Option<String>,
    }

    #[derive(serde::Deserialize)]
    struct PlanRow {
        employee_id: Uuid,
        created_at: String,
        last_reviewed: Option<String>,
        action_items: Option<String>,
    }

    let mut bundle = FactBundle::default();

    let employees_path = dir.join("employees.csv");
    let mut reader = csv::Reader::from_path(&employees_path)
        .with_context(|| format!("failed to open {}", employees_path.display()))?;
    for result in reader.deserialize::<EmployeeRow>() {
        let row = result.with_context(|| format!("bad row in {}", employees_path.display()))?;
        let assessment = parse_optional(row.assessed_at)?.map(|assessed_at| Assessment {
            performance: row.performance.unwrap_or_default(),
            potential: row.potential.unwrap_or_default(),
            assessed_at,
        });
        bundle.employees.push(Employee {
            id: row.id,
            name: row.name,
            created_at: parse_timestamp(&row.created_at)?,
            assessment,
        });
    }

    let reviews_path = dir.join("reviews.csv");
    if reviews_path.exists() {
        let mut reader = csv::Reader::from_path(&reviews_path)
            .with_context(|| format!("failed to open {}", reviews_path.display()))?;
        for result in reader.deserialize::<ReviewRow>() {
            let row = result.with_context(|| format!("bad row in {}", reviews_path.display()))?;
            bundle.reviews.push(ReviewRecord {
                employee_id: row.employee_id,
                self_review: review_entry(row.self_status, row.self_submitted_at)?,
                manager_review: review_entry(row.manager_status, row.manager_submitted_at)?,
            });
        }
    }

    let plans_path = dir.join("plans.csv");
    if plans_path.exists() {
        let mut reader = csv::Reader::from_path(&plans_path)
            .with_context(|| format!("failed to open {}", plans_path.display()))?;
        for result in reader.deserialize::<PlanRow>() {
            let row = result.with_context(|| format!("bad row in {}", plans_path.display()))?;
            bundle.plans.push(DevelopmentPlan {
                employee_id: row.employee_id,
                created_at: parse_timestamp(&row.created_at)?,
                last_reviewed: parse_optional(row.last_reviewed)?,
                action_items: action_items(row.action_items),
            });
        }
    }

    Ok(bundle)
}

/// A small organization spread across the lifecycle, dated relative to `now`.
pub fn seed(now: DateTime<Utc>) -> FactBundle {
    let ago = |days: i64| now - Duration::days(days);
    let mut bundle = FactBundle::default();

    let people = [
        ("Avery Lee", 5, None),
        ("Jules Moreno", 45, Some(20)),
        ("Kiara Patel", 60, Some(30)),
        ("Noah Brooks", 70, Some(50)),
        ("Mina Okafor", 120, Some(90)),
        ("Diego Alvarez", 100, Some(70)),
        ("Priya Nair", 150, Some(130)),
        ("Sam Whitfield", 110, Some(85)),
    ];

    for (name, joined, assessed) in people {
        bundle.employees.push(Employee {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: ago(joined),
            assessment: assessed.map(|days| Assessment {
                performance: 2,
                potential: 2,
                assessed_at: ago(days),
            }),
        });
    }

    let ids: Vec<Uuid> = bundle.employees.iter().map(|employee| employee.id).collect();
    let entry = |status: ReviewStatus, days: i64| {
        Some(ReviewEntry {
            status,
            submitted_at: Some(ago(days)),
        })
    };

    bundle.reviews.push(ReviewRecord {
        employee_id: ids[1],
        self_review: entry(ReviewStatus::Draft, 10),
        manager_review: None,
    });
    bundle.reviews.push(ReviewRecord {
        employee_id: ids[2],
        self_review: entry(ReviewStatus::Submitted, 25),
        manager_review: entry(ReviewStatus::Draft, 5),
    });
    for (slot, assessed) in [(3, 50), (4, 90), (5, 70), (6, 130), (7, 85)] {
        bundle.reviews.push(ReviewRecord {
            employee_id: ids[slot],
            self_review: entry(ReviewStatus::Completed, assessed - 5),
            manager_review: entry(ReviewStatus::Completed, assessed - 10),
        });
    }

    let plan = |slot: usize, created: i64, reviewed: Option<i64>, items: &[(&str, bool)]| {
        DevelopmentPlan {
            employee_id: ids[slot],
            created_at: ago(created),
            last_reviewed: reviewed.map(ago),
            action_items: items
                .iter()
                .map(|&(title, done)| ActionItem {
                    title: title.to_string(),
                    done,
                })
                .collect(),
        }
    };

    bundle.plans.push(plan(
        4,
        40,
        None,
        &[("Lead a cross-team design review", false), ("Pair with platform on on-call", false)],
    ));
    bundle.plans.push(plan(5, 12, None, &[("Complete mentoring course", false)]));
    bundle.plans.push(plan(
        6,
        100,
        Some(65),
        &[("Own the Q2 roadmap", true), ("Present at the engineering all-hands", true)],
    ));
    bundle.plans.push(plan(7, 50, Some(15), &[("Shadow the staff engineer", false)]));

    bundle
}
