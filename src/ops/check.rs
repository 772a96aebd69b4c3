use std::collections::HashSet;

use indexmap::IndexSet;
use serde::Serialize;

use crate::model::issue::{Issue, Level};
use crate::model::table::IssueTable;

/// Structured result from `mm check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// A validation error (something that should be fixed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// Parent ID names an issue that doesn't exist
    #[serde(rename = "dangling_parent")]
    DanglingParent { issue_id: String, parent_id: String },
    /// A Blocks entry names an issue that doesn't exist
    #[serde(rename = "dangling_block")]
    DanglingBlock { issue_id: String, target_id: String },
    /// An issue lists itself in Blocks
    #[serde(rename = "self_block")]
    SelfBlock { issue_id: String },
}

/// A validation warning (non-critical issue).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// Parent ID chain loops back on itself. `ids` starts at the smallest ID
    /// and follows Parent ID.
    #[serde(rename = "parent_cycle")]
    ParentCycle { ids: Vec<String> },
    /// Epic Name is set on a row that isn't an Epic
    #[serde(rename = "epic_name_on_non_epic")]
    EpicNameOnNonEpic { issue_id: String, level: Level },
    /// Child sits at the same or a higher level than its parent
    #[serde(rename = "level_inversion")]
    LevelInversion {
        issue_id: String,
        level: Level,
        parent_id: String,
        parent_level: Level,
    },
}

// ---------------------------------------------------------------------------
// Main check entry point
// ---------------------------------------------------------------------------

/// Validate a table and return structured results.
///
/// This is a read-only operation. Nothing reported here prevents rendering:
/// dangling references just produce no edge.
pub fn check_table(table: &IssueTable) -> CheckResult {
    let mut result = CheckResult::default();
    let ids = table.ids();

    for issue in table {
        check_issue(issue, table, &ids, &mut result);
    }

    for ids in find_parent_cycles(table) {
        result.warnings.push(CheckWarning::ParentCycle { ids });
    }

    result.valid = result.errors.is_empty();
    result
}

fn check_issue(issue: &Issue, table: &IssueTable, ids: &HashSet<&str>, result: &mut CheckResult) {
    if !issue.parent_id.is_empty() {
        match table.get(&issue.parent_id) {
            None => result.errors.push(CheckError::DanglingParent {
                issue_id: issue.id.clone(),
                parent_id: issue.parent_id.clone(),
            }),
            Some(parent) if parent.level >= issue.level => {
                result.warnings.push(CheckWarning::LevelInversion {
                    issue_id: issue.id.clone(),
                    level: issue.level,
                    parent_id: parent.id.clone(),
                    parent_level: parent.level,
                })
            }
            Some(_) => {}
        }
    }

    for target in &issue.blocks {
        if *target == issue.id {
            result.errors.push(CheckError::SelfBlock {
                issue_id: issue.id.clone(),
            });
        } else if !ids.contains(target.as_str()) {
            result.errors.push(CheckError::DanglingBlock {
                issue_id: issue.id.clone(),
                target_id: target.clone(),
            });
        }
    }

    if issue.level != Level::Epic && !issue.epic_name.is_empty() {
        result.warnings.push(CheckWarning::EpicNameOnNonEpic {
            issue_id: issue.id.clone(),
            level: issue.level,
        });
    }
}

// ---------------------------------------------------------------------------
// Cycle detection
// ---------------------------------------------------------------------------

/// Every distinct Parent ID cycle, each reported once.
pub fn find_parent_cycles(table: &IssueTable) -> Vec<Vec<String>> {
    let mut cycles: IndexSet<Vec<String>> = IndexSet::new();

    for start in table {
        let mut path: Vec<&str> = Vec::new();
        let mut current = Some(start);
        while let Some(issue) = current {
            if let Some(pos) = path.iter().position(|id| *id == issue.id) {
                cycles.insert(canonical_cycle(&path[pos..]));
                break;
            }
            path.push(&issue.id);
            current = if issue.parent_id.is_empty() {
                None
            } else {
                table.get(&issue.parent_id)
            };
        }
    }

    cycles.into_iter().collect()
}

/// Rotate so the smallest ID comes first.
fn canonical_cycle(ids: &[&str]) -> Vec<String> {
    let start = ids
        .iter()
        .enumerate()
        .min_by_key(|(_, id)| **id)
        .map_or(0, |(i, _)| i);
    ids[start..]
        .iter()
        .chain(ids[..start].iter())
        .map(|s| s.to_string())
        .collect()
}
