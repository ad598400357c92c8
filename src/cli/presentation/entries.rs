//! Entry listing presentation (`ls`).

use super::format_section_heading;
use crate::cli::output::to_json;
use crate::error::ApiError;
use crate::store::{Project, TreeEntry};
use crate::types::EntryKind;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use serde_json::json;

fn size_column(entry: &TreeEntry) -> String {
    match (entry.kind, entry.size) {
        (EntryKind::Folder, Some(n)) => format!("{} item(s)", n),
        (EntryKind::File, Some(bytes)) => format!("{} B", bytes),
        (_, None) => "-".to_string(),
    }
}

pub fn format_entries_text(project: &Project, dir: &str, entries: &[TreeEntry]) -> String {
    let heading = format_section_heading(&format!("{} {}", project.name, dir));
    if entries.is_empty() {
        return format!("{}\n\n  (empty)", heading);
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Kind", "Name", "Size", "LFS OID"]);
    for entry in entries {
        table.add_row(vec![
            entry.kind.to_string(),
            entry.name.clone(),
            size_column(entry),
            entry.lfs_oid.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    format!("{}\n\n{}", heading, table)
}

pub fn format_entries_json(
    project: &Project,
    dir: &str,
    entries: &[TreeEntry],
) -> Result<String, ApiError> {
    to_json(&json!({
        "project_id": project.id,
        "path": dir,
        "entries": entries,
    }))
}
