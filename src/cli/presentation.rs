//! CLI presentation: text and json formatters per command family.

mod entries;
mod project;
mod sync;

pub use entries::{format_entries_json, format_entries_text};
pub use project::{format_project_list_json, format_project_list_text};
pub use sync::{format_sync_results_json, format_sync_results_text};

use owo_colors::OwoColorize;

pub(crate) fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub(crate) fn short_commit(commit: &str) -> &str {
    &commit[..commit.len().min(7)]
}
