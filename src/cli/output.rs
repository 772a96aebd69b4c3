use std::collections::HashSet;

use serde::Serialize;

use crate::model::issue::Issue;
use crate::model::table::IssueTable;
use crate::ops::check::{CheckError, CheckResult, CheckWarning};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct DeleteJson {
    pub removed: Vec<String>,
}

#[derive(Serialize)]
pub struct ImportJson {
    pub imported: usize,
    pub dropped: usize,
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// `ID  Level  Summary [↑parent] [blocks: ...]`
pub fn format_issue_line(issue: &Issue) -> String {
    let mut line = format!("{:<10} {:<9} {}", issue.id, issue.level.name(), issue.summary);
    if !issue.epic_name.is_empty() {
        line.push_str(&format!(" ({})", issue.epic_name));
    }
    if !issue.parent_id.is_empty() {
        line.push_str(&format!("  ↑{}", issue.parent_id));
    }
    if !issue.blocks.is_empty() {
        line.push_str(&format!("  blocks: {}", issue.blocks.join(", ")));
    }
    line
}

pub fn format_issue_detail(issue: &Issue, table: &IssueTable) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", issue.id, issue.summary));
    out.push_str(&format!("  level: {}\n", issue.level));
    if !issue.epic_name.is_empty() {
        out.push_str(&format!("  epic name: {}\n", issue.epic_name));
    }
    if !issue.parent_id.is_empty() {
        let note = if table.contains(&issue.parent_id) {
            ""
        } else {
            " (missing)"
        };
        out.push_str(&format!("  parent: {}{}\n", issue.parent_id, note));
    }
    let children: Vec<&str> = table.children(&issue.id).map(|c| c.id.as_str()).collect();
    if !children.is_empty() {
        out.push_str(&format!("  children: {}\n", children.join(", ")));
    }
    if !issue.blocks.is_empty() {
        out.push_str(&format!("  blocks: {}\n", issue.blocks.join(", ")));
    }
    let blocked_by: Vec<&str> = table
        .iter()
        .filter(|r| r.blocks.iter().any(|b| *b == issue.id))
        .map(|r| r.id.as_str())
        .collect();
    if !blocked_by.is_empty() {
        out.push_str(&format!("  blocked by: {}\n", blocked_by.join(", ")));
    }
    out
}

/// Indented hierarchy. Rows caught in a Parent ID cycle, which no root
/// reaches, are printed after the roots.
pub fn format_tree(table: &IssueTable) -> String {
    let mut out = String::new();
    let mut visited: HashSet<&str> = HashSet::new();

    for root in table.roots() {
        write_subtree(table, root, 0, &mut visited, &mut out);
    }
    for issue in table {
        if !visited.contains(issue.id.as_str()) {
            write_subtree(table, issue, 0, &mut visited, &mut out);
        }
    }
    out
}

fn write_subtree<'a>(
    table: &'a IssueTable,
    issue: &'a Issue,
    depth: usize,
    visited: &mut HashSet<&'a str>,
    out: &mut String,
) {
    if !visited.insert(issue.id.as_str()) {
        return;
    }
    out.push_str(&format!(
        "{}{} {}: {}\n",
        "  ".repeat(depth),
        issue.id,
        issue.level,
        issue.summary
    ));
    for child in table.children(&issue.id) {
        write_subtree(table, child, depth + 1, visited, out);
    }
}

pub fn format_check(result: &CheckResult) -> String {
    let mut out = String::new();
    for err in &result.errors {
        let line = match err {
            CheckError::DanglingParent {
                issue_id,
                parent_id,
            } => format!("error: {} has missing parent {}", issue_id, parent_id),
            CheckError::DanglingBlock {
                issue_id,
                target_id,
            } => format!("error: {} blocks missing issue {}", issue_id, target_id),
            CheckError::SelfBlock { issue_id } => format!("error: {} blocks itself", issue_id),
        };
        out.push_str(&line);
        out.push('\n');
    }
    for warning in &result.warnings {
        let line = match warning {
            CheckWarning::ParentCycle { ids } => {
                format!("warning: parent cycle {} -> {}", ids.join(" -> "), ids[0])
            }
            CheckWarning::EpicNameOnNonEpic { issue_id, level } => {
                format!("warning: {} is a {} but has an epic name", issue_id, level)
            }
            CheckWarning::LevelInversion {
                issue_id,
                level,
                parent_id,
                parent_level,
            } => format!(
                "warning: {} ({}) is under {} ({})",
                issue_id, level, parent_id, parent_level
            ),
        };
        out.push_str(&line);
        out.push('\n');
    }
    if result.valid && result.warnings.is_empty() {
        out.push_str("ok\n");
    }
    out
}
