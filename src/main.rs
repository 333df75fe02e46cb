use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use talent_workflow::facts::{self, FactBundle};
use talent_workflow::{report, OrchestrationCache, Thresholds, WorkflowStage};

#[derive(Parser)]
#[command(name = "talent-workflow")]
#[command(about = "Talent lifecycle workflow status, bottlenecks, and velocity", long_about = None)]
#[command(group(
    ArgGroup::new("source")
        .args(["facts", "csv_dir"])
        .multiple(false)
))]
struct Cli {
    /// JSON fact bundle (employees, reviews, plans)
    #[arg(long, global = true)]
    facts: Option<PathBuf>,
    /// Directory holding employees.csv, reviews.csv and plans.csv
    #[arg(long, global = true)]
    csv_dir: Option<PathBuf>,
    /// JSON file overriding the default thresholds
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Evaluate as of this date instead of now
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List employee workflows
    Status {
        #[arg(long)]
        stage: Option<WorkflowStage>,
        #[arg(long, default_value_t = 25)]
        limit: usize,
    },
    /// Show every step for one employee
    Show {
        #[arg(long)]
        employee: Uuid,
    },
    /// Rank congested stages
    Bottlenecks,
    /// Organization-wide timing and completion stats
    Velocity,
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Write a sample fact bundle
    Seed {
        #[arg(long, default_value = "facts.json")]
        out: PathBuf,
    },
}

fn load_facts(cli: &Cli) -> anyhow::Result<FactBundle> {
    let path = match (&cli.facts, &cli.csv_dir) {
        (Some(path), _) | (None, Some(path)) => path.clone(),
        (None, None) => std::env::var("TALENT_FACTS")
            .map(PathBuf::from)
            .context("pass --facts or --csv-dir, or set TALENT_FACTS")?,
    };
    facts::load(&path)
}

fn evaluation_time(as_of: Option<NaiveDate>) -> anyhow::Result<DateTime<Utc>> {
    match as_of {
        Some(date) => Ok(date
            .and_hms_opt(23, 59, 59)
            .context("invalid --as-of date")?
            .and_utc()),
        None => Ok(Utc::now()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_report(out: &Path, contents: String) -> anyhow::Result<()> {
    std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let now = evaluation_time(cli.as_of)?;

    if let Commands::Seed { out } = &cli.command {
        facts::write_json(out, &facts::seed(now))?;
        println!("Seed facts written to {}.", out.display());
        return Ok(());
    }

    let thresholds = match &cli.config {
        Some(path) => Thresholds::load(path)?,
        None => Thresholds::default(),
    };
    let bundle = load_facts(&cli)?;
    let cache = OrchestrationCache::new(thresholds);
    let snapshot = cache.refresh_at(&bundle.employees, &bundle.reviews, &bundle.plans, now);

    match cli.command {
        Commands::Status { stage, limit } => {
            let workflows = match stage {
                Some(stage) => snapshot.by_stage(stage),
                None => snapshot.workflows().iter().collect(),
            };

            if workflows.is_empty() {
                println!("No employees found.");
                return Ok(());
            }

            for workflow in workflows.iter().take(limit) {
                println!(
                    "- {} ({}) {} for {} days, {}% complete{}",
                    workflow.employee_name,
                    workflow.employee_id,
                    workflow.current_stage,
                    workflow.days_in_current_stage(),
                    workflow.overall_progress,
                    if workflow.is_stuck { ", stuck" } else { "" }
                );
            }
        }
        Commands::Show { employee } => {
            let workflow = cache
                .get(employee)
                .with_context(|| format!("no employee with id {employee}"))?;
            print_json(&workflow)?;
        }
        Commands::Bottlenecks => {
            let bottlenecks = cache.bottlenecks();
            if bottlenecks.is_empty() {
                println!("No bottlenecks.");
                return Ok(());
            }
            print_json(&bottlenecks)?;
        }
        Commands::Velocity => {
            print_json(&cache.velocity())?;
        }
        Commands::Report { out } => {
            write_report(&out, report::build_report(&snapshot, cache.thresholds()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Seed { .. } => {}
    }

    Ok(())
}
