//! Project command presentation: list text/json.

use super::{format_section_heading, short_commit};
use crate::cli::output::to_json;
use crate::error::ApiError;
use crate::store::Project;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::json;

pub fn format_project_list_text(projects: &[Project]) -> String {
    if projects.is_empty() {
        return "No projects registered.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["ID", "Name", "Clone URL", "Commit", "Updated"]);
    for project in projects {
        table.add_row(vec![
            project.id.to_string(),
            project.name.clone(),
            if project.clone_url.is_empty() {
                "-".to_string()
            } else {
                project.clone_url.clone()
            },
            project
                .file_tree_commit
                .as_deref()
                .map(short_commit)
                .unwrap_or("-")
                .to_string(),
            project
                .file_tree_updated
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string()),
        ]);
    }
    format!(
        "{}\n\n{}\n\nTotal: {} project(s)",
        format_section_heading("Projects"),
        table,
        projects.len()
    )
}

pub fn format_project_list_json(projects: &[Project]) -> Result<String, ApiError> {
    to_json(&json!({ "projects": projects, "total": projects.len() }))
}
