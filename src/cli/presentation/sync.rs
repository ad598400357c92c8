//! Sync and purge presentation.

use super::short_commit;
use crate::cli::output::to_json;
use crate::error::{ApiError, SyncError};
use crate::sync::SyncOutcome;
use crate::types::ProjectId;
use owo_colors::OwoColorize;
use serde_json::json;

pub fn format_sync_results_text(results: &[(ProjectId, Result<SyncOutcome, SyncError>)]) -> String {
    let mut out = Vec::new();
    for (id, result) in results {
        match result {
            Ok(SyncOutcome::Skipped) => {
                out.push(format!("Project {}: skipped (no clone URL)", id));
            }
            Ok(SyncOutcome::UpToDate { commit }) => {
                out.push(format!("Project {}: up to date at {}", id, short_commit(commit)));
            }
            Ok(SyncOutcome::Synced(report)) => {
                let from = report
                    .previous_commit
                    .as_deref()
                    .map(short_commit)
                    .unwrap_or("none");
                out.push(format!(
                    "Project {}: {} -> {} ({} created, {} updated, {} deleted, {} unchanged)",
                    id,
                    from,
                    short_commit(&report.commit),
                    report.created,
                    report.updated,
                    report.deleted,
                    report.unchanged
                ));
                if report.skipped > 0 {
                    out.push(format!("  {} unreadable file(s) skipped", report.skipped));
                }
                for warning in &report.warnings {
                    out.push(format!("  {} {}", "warning:".yellow(), warning));
                }
                for failure in &report.failures {
                    out.push(format!(
                        "  {} {} {} in {}: {}",
                        "failed:".red(),
                        failure.operation,
                        failure.name,
                        failure.path,
                        failure.error
                    ));
                }
                if !report.finalized {
                    out.push("  commit marker not advanced".to_string());
                }
            }
            Err(e) => out.push(format!("Project {}: {} {}", id, "error:".red(), e)),
        }
    }
    out.join("\n")
}

pub fn format_sync_results_json(
    results: &[(ProjectId, Result<SyncOutcome, SyncError>)],
) -> Result<String, ApiError> {
    let items: Vec<serde_json::Value> = results
        .iter()
        .map(|(id, result)| match result {
            Ok(outcome) => json!({ "project_id": id, "outcome": outcome }),
            Err(e) => json!({ "project_id": id, "error": e.to_string() }),
        })
        .collect();
    to_json(&json!({ "results": items }))
}
