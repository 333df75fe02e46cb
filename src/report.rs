use std::fmt::Write;

use crate::cache::WorkflowSnapshot;
use crate::config::Thresholds;

pub fn build_report(snapshot: &WorkflowSnapshot, thresholds: &Thresholds) -> String {
    let bottlenecks = snapshot.bottlenecks(thresholds);
    let velocity = snapshot.velocity();

    let mut output = String::new();
    let generated = snapshot
        .generated_at()
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "never".to_string());

    let _ = writeln!(output, "# Talent Workflow Report");
    let _ = writeln!(
        output,
        "Generated {} for {} employees",
        generated,
        snapshot.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Lifecycle Distribution");

    if snapshot.is_empty() {
        let _ = writeln!(output, "No employees in the workflow.");
    } else {
        for (stage, count) in snapshot.stage_distribution() {
            let _ = writeln!(output, "- {}: {}", stage, count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Bottlenecks");

    if bottlenecks.is_empty() {
        let _ = writeln!(output, "No stages over the bottleneck thresholds.");
    } else {
        for bottleneck in &bottlenecks {
            let _ = writeln!(
                output,
                "- [{}] {}: {}",
                bottleneck.severity, bottleneck.stage, bottleneck.impact_description
            );
            for action in &bottleneck.suggested_actions {
                let _ = writeln!(output, "  - {}", action.label);
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Velocity");
    let _ = writeln!(output, "- Time to assess: {} days", velocity.average_time_to_assess);
    let _ = writeln!(output, "- Time to review: {} days", velocity.average_time_to_review);
    let _ = writeln!(
        output,
        "- Time to calibrate: {} days",
        velocity.average_time_to_calibrate
    );
    let _ = writeln!(output, "- Time to plan: {} days", velocity.average_time_to_plan);
    let _ = writeln!(
        output,
        "- Complete cycle: {} days (fastest {}, slowest {})",
        velocity.average_complete_cycle, velocity.fastest_cycle, velocity.slowest_cycle
    );
    let _ = writeln!(output, "- Completion rate: {}%", velocity.completion_rate);
    let _ = writeln!(output, "- Stuck: {}", velocity.stuck_count);

    let stuck = snapshot.stuck();
    let _ = writeln!(output);
    let _ = writeln!(output, "## Longest Waits");

    if stuck.is_empty() {
        let _ = writeln!(output, "Nobody is stuck.");
    } else {
        for workflow in stuck.iter().take(10) {
            let next = workflow
                .current_step()
                .map(|step| step.next_action.as_str())
                .unwrap_or("-");
            let _ = writeln!(
                output,
                "- {} in {} for {} days: {}",
                workflow.employee_name,
                workflow.current_stage,
                workflow.days_in_current_stage(),
                next
            );
        }
    }

    output
}
