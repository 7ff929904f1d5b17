//! Table rendering for run results.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use console::style;

use crate::domain::models::{ConvergenceResult, TaskStatus};
use crate::services::{RunSummary, TaskDisposition};

/// Create a standard list table with the given headers.
///
/// Uses the NOTHING preset (no borders) for a clean CLI aesthetic.
fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

fn status_cell(disposition: &TaskDisposition) -> String {
    match disposition.status {
        TaskStatus::Succeeded => style("succeeded").green().to_string(),
        TaskStatus::Abandoned => {
            let reason = disposition.abandon_reason.as_deref().unwrap_or("abandoned");
            style(format!("abandoned ({reason})")).red().to_string()
        }
        other => other.as_str().to_string(),
    }
}

fn convergence_cell(disposition: &TaskDisposition) -> String {
    match &disposition.convergence {
        None => "-".to_string(),
        Some(report) => match report.result {
            ConvergenceResult::Converged => {
                format!("converged in {} round(s)", report.rounds_used())
            }
            ConvergenceResult::RoundsExhausted => style(format!(
                "rounds exhausted ({})",
                report.rounds_used()
            ))
            .yellow()
            .to_string(),
        },
    }
}

/// Render a run summary as a disposition table plus a tally line.
pub fn render_summary(summary: &RunSummary) -> String {
    if summary.dispositions.is_empty() {
        return "No tasks were run.".to_string();
    }

    let mut table = list_table(&["task", "status", "attempts", "final tier", "review"]);
    for disposition in &summary.dispositions {
        table.add_row(vec![
            disposition.title.clone(),
            status_cell(disposition),
            disposition.attempts.len().to_string(),
            disposition
                .final_tier
                .map_or_else(|| "-".to_string(), |t| t.to_string()),
            convergence_cell(disposition),
        ]);
    }

    let tally = format!(
        "{} task(s): {} succeeded, {} abandoned",
        summary.dispositions.len(),
        summary.succeeded(),
        summary.abandoned()
    );
    format!("{table}\n\n{tally}")
}
