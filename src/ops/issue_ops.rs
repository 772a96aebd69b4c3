use std::collections::HashSet;

use indexmap::IndexSet;

use crate::model::config::IdStrategy;
use crate::model::issue::{split_blocks, Issue, Level, RawIssue};
use crate::model::table::IssueTable;

/// Error type for issue table operations
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("issue not found: {0}")]
    NotFound(String),
    #[error("summary cannot be empty")]
    EmptySummary,
    #[error("an issue cannot block itself: {0}")]
    SelfBlock(String),
    #[error("block target cannot contain ';': {0}")]
    InvalidBlockTarget(String),
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Canonicalize raw rows into a table.
///
/// Trims ID and Parent ID, drops rows whose ID is empty, keeps only the first
/// row for each ID, fills missing optional fields with empty values, and
/// splits Blocks into trimmed non-empty IDs. Idempotent.
pub fn normalize<I>(rows: I) -> IssueTable
where
    I: IntoIterator<Item = RawIssue>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    let mut dropped = 0usize;

    for raw in rows {
        let id = raw.id.trim().to_string();
        if id.is_empty() || seen.contains(&id) {
            dropped += 1;
            continue;
        }
        seen.insert(id.clone());
        out.push(Issue {
            id,
            level: raw.level,
            summary: raw.summary,
            epic_name: raw.epic_name.unwrap_or_default(),
            parent_id: raw.parent_id.as_deref().unwrap_or("").trim().to_string(),
            blocks: raw.blocks.as_deref().map(split_blocks).unwrap_or_default(),
        });
    }

    if dropped > 0 {
        tracing::debug!(dropped, kept = out.len(), "normalize dropped rows");
    }
    IssueTable::from_rows_unchecked(out)
}

/// Re-run normalization over an existing table (after an external edit).
pub fn renormalize(table: IssueTable) -> IssueTable {
    normalize(table.into_rows().into_iter().map(RawIssue::from))
}

/// Replace the whole table with the normalized form of `rows`.
/// Returns the number of rows kept.
pub fn replace_rows(table: &mut IssueTable, rows: Vec<RawIssue>) -> usize {
    let incoming = rows.len();
    *table = normalize(rows);
    tracing::info!(incoming, kept = table.len(), "table replaced");
    table.len()
}

/// Replace the whole table with the two default rows.
pub fn reset_defaults(table: &mut IssueTable) {
    *table = IssueTable::defaults();
    tracing::info!("table reset to defaults");
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// Append a new issue and return it.
///
/// `parent_id` is not required to resolve. `epic_name` only sticks on Epics;
/// an Epic created without one takes its summary.
pub fn add_issue(
    table: &mut IssueTable,
    strategy: IdStrategy,
    level: Level,
    summary: &str,
    parent_id: &str,
    epic_name: Option<&str>,
) -> Result<Issue, IssueError> {
    let summary = summary.trim();
    if summary.is_empty() {
        return Err(IssueError::EmptySummary);
    }

    let id = next_id(table, level, strategy);
    let epic_name = if level == Level::Epic {
        match epic_name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => summary.to_string(),
        }
    } else {
        String::new()
    };

    let issue = Issue::new(id, level, summary)
        .with_parent(parent_id.trim())
        .with_epic_name(epic_name);
    table.rows_mut().push(issue.clone());
    tracing::debug!(id = %issue.id, level = %level, "issue added");
    Ok(issue)
}

/// Update an issue's summary and, for Epics only, its epic name.
///
/// Unknown IDs return `NotFound` and leave the table untouched. An epic name
/// passed for a non-Epic row is ignored.
pub fn edit_issue(
    table: &mut IssueTable,
    id: &str,
    new_summary: Option<&str>,
    new_epic_name: Option<&str>,
) -> Result<(), IssueError> {
    let issue = table
        .get_mut(id)
        .ok_or_else(|| IssueError::NotFound(id.to_string()))?;

    let summary = match new_summary.map(str::trim) {
        Some("") => return Err(IssueError::EmptySummary),
        other => other,
    };

    if let Some(summary) = summary {
        issue.summary = summary.to_string();
    }
    if let Some(epic_name) = new_epic_name {
        if issue.level == Level::Epic {
            issue.epic_name = epic_name.trim().to_string();
        } else {
            tracing::debug!(id, level = %issue.level, "ignoring epic name on non-epic");
        }
    }
    Ok(())
}

/// Remove an issue.
///
/// Without `cascade`, direct children are detached (their Parent ID is
/// cleared). With `cascade`, every transitive descendant is removed too.
/// Returns the removed IDs in table order; empty if `id` is unknown.
pub fn delete_issue(table: &mut IssueTable, id: &str, cascade: bool) -> IndexSet<String> {
    if !table.contains(id) {
        tracing::debug!(id, "delete of unknown issue is a no-op");
        return IndexSet::new();
    }

    let doomed: HashSet<String> = if cascade {
        descendants_closure(table, id)
    } else {
        HashSet::from([id.to_string()])
    };

    let removed: IndexSet<String> = table
        .iter()
        .filter(|r| doomed.contains(&r.id))
        .map(|r| r.id.clone())
        .collect();

    let rows = table.rows_mut();
    rows.retain(|r| !doomed.contains(&r.id));
    if !cascade {
        for row in rows.iter_mut().filter(|r| r.parent_id == id) {
            row.parent_id.clear();
        }
    }

    tracing::info!(id, cascade, removed = removed.len(), "issue deleted");
    removed
}

/// `id` plus everything reachable from it by following Parent ID downwards.
///
/// Grows a set until a pass adds nothing, so it terminates even if Parent ID
/// chains contain a cycle.
pub fn descendants_closure(table: &IssueTable, id: &str) -> HashSet<String> {
    let mut closure = HashSet::from([id.to_string()]);
    loop {
        let before = closure.len();
        for row in table.iter() {
            if !row.parent_id.is_empty() && closure.contains(&row.parent_id) {
                closure.insert(row.id.clone());
            }
        }
        if closure.len() == before {
            return closure;
        }
    }
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// Set or clear (`""`) an issue's parent. The parent need not resolve.
pub fn set_parent(table: &mut IssueTable, id: &str, parent_id: &str) -> Result<(), IssueError> {
    let issue = table
        .get_mut(id)
        .ok_or_else(|| IssueError::NotFound(id.to_string()))?;
    issue.parent_id = parent_id.trim().to_string();
    Ok(())
}

/// Record that `id` blocks `target`. No-op if already present.
pub fn add_block(table: &mut IssueTable, id: &str, target: &str) -> Result<(), IssueError> {
    let target = target.trim();
    if target == id {
        return Err(IssueError::SelfBlock(id.to_string()));
    }
    if target.contains(';') {
        return Err(IssueError::InvalidBlockTarget(target.to_string()));
    }
    let issue = table
        .get_mut(id)
        .ok_or_else(|| IssueError::NotFound(id.to_string()))?;
    if !target.is_empty() && !issue.blocks.iter().any(|b| b == target) {
        issue.blocks.push(target.to_string());
    }
    Ok(())
}

pub fn remove_block(table: &mut IssueTable, id: &str, target: &str) -> Result<(), IssueError> {
    let issue = table
        .get_mut(id)
        .ok_or_else(|| IssueError::NotFound(id.to_string()))?;
    issue.blocks.retain(|b| b != target.trim());
    Ok(())
}

// ---------------------------------------------------------------------------
// ID generation
// ---------------------------------------------------------------------------

/// Generate a fresh ID for `level` that is not taken in `table`.
///
/// IDs stay above every numeric suffix already used for the prefix. If that
/// suffix is `u64::MAX` the search restarts at 1 and takes the first free one.
pub fn next_id(table: &IssueTable, level: Level, strategy: IdStrategy) -> String {
    let prefix = level.id_prefix();
    let floor = match max_numeric_suffix(table, prefix) {
        Some(max) => max.checked_add(1),
        None => Some(0),
    };
    let mut n = match (strategy, floor) {
        (IdStrategy::Timestamp, Some(floor)) => now_nanos().max(floor),
        (IdStrategy::Counter, Some(floor)) => floor.max(1),
        (_, None) => {
            tracing::warn!(prefix, "ID suffix space exhausted; reusing a free low number");
            1
        }
    };
    // Each taken candidate is a distinct row, so this ends within len + 1 steps.
    loop {
        let candidate = format!("{}{}", prefix, n);
        if !table.contains(&candidate) {
            return candidate;
        }
        n = n.checked_add(1).unwrap_or(1);
    }
}

/// Highest `N` among IDs of the form `<prefix><digits>`.
fn max_numeric_suffix(table: &IssueTable, prefix: &str) -> Option<u64> {
    table
        .iter()
        .filter_map(|r| r.id.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|rest| rest.parse::<u64>().ok())
        .max()
}

fn now_nanos() -> u64 {
    let now = chrono::Utc::now();
    now.timestamp_nanos_opt()
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or_else(|| u64::try_from(now.timestamp_micros()).unwrap_or(0) * 1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw(id: &str, level: Level, parent: &str) -> RawIssue {
        RawIssue {
            id: id.to_string(),
            level,
            summary: format!("{} summary", id.trim()),
            epic_name: None,
            parent_id: Some(parent.to_string()),
            blocks: None,
        }
    }

    fn chain() -> IssueTable {
        normalize(vec![
            raw("A", Level::UseCase, ""),
            raw("B", Level::Epic, "A"),
            raw("C", Level::Story, "B"),
        ])
    }

    fn ids(table: &IssueTable) -> Vec<&str> {
        table.iter().map(|r| r.id.as_str()).collect()
    }

    // --- normalize ---

    #[test]
    fn normalize_trims_drops_and_dedupes() {
        let mut dup = raw("A", Level::Task, "");
        dup.summary = "second A".into();
        let table = normalize(vec![
            raw("  A ", Level::UseCase, " X "),
            raw("   ", Level::Epic, ""),
            dup,
            raw("B", Level::Story, ""),
        ]);
        assert_eq!(ids(&table), vec!["A", "B"]);
        let a = table.get("A").unwrap();
        assert_eq!(a.level, Level::UseCase);
        assert_eq!(a.parent_id, "X");
    }

    #[test]
    fn normalize_fills_missing_fields() {
        let table = normalize(vec![RawIssue {
            id: "A".into(),
            level: Level::Epic,
            summary: "s".into(),
            epic_name: None,
            parent_id: None,
            blocks: Some(" B;;C ".into()),
        }]);
        let a = table.get("A").unwrap();
        assert_eq!(a.epic_name, "");
        assert_eq!(a.parent_id, "");
        assert_eq!(a.blocks, vec!["B", "C"]);
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut messy = raw(" A", Level::UseCase, " ");
        messy.blocks = Some("B; ;".into());
        let once = normalize(vec![
            messy,
            raw("", Level::Epic, "A"),
            raw("B", Level::Epic, " A "),
            raw("B ", Level::Story, ""),
        ]);
        let twice = renormalize(once.clone());
        assert_eq!(once, twice);
    }

    // --- add ---

    #[test]
    fn add_appends_exactly_one_row() {
        let mut table = chain();
        let before = table.clone();
        let issue = add_issue(
            &mut table,
            IdStrategy::Timestamp,
            Level::Task,
            "  Write tests ",
            "C",
            None,
        )
        .unwrap();

        assert_eq!(table.len(), before.len() + 1);
        assert_eq!(&table.rows()[..before.len()], before.rows());
        assert_eq!(table.rows().last(), Some(&issue));
        assert!(issue.id.starts_with("TS"));
        assert_eq!(issue.summary, "Write tests");
        assert_eq!(issue.parent_id, "C");
        assert_eq!(issue.epic_name, "");
    }

    #[test]
    fn add_rejects_blank_summary() {
        let mut table = chain();
        let err = add_issue(&mut table, IdStrategy::Timestamp, Level::Task, "  ", "", None);
        assert!(matches!(err, Err(IssueError::EmptySummary)));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn add_epic_name_only_on_epics() {
        let mut table = IssueTable::new();
        let epic = add_issue(
            &mut table,
            IdStrategy::Counter,
            Level::Epic,
            "Auth",
            "",
            Some("Auth Epic"),
        )
        .unwrap();
        assert_eq!(epic.epic_name, "Auth Epic");

        let bare = add_issue(&mut table, IdStrategy::Counter, Level::Epic, "Billing", "", None)
            .unwrap();
        assert_eq!(bare.epic_name, "Billing");

        let story = add_issue(
            &mut table,
            IdStrategy::Counter,
            Level::Story,
            "Login form",
            "",
            Some("ignored"),
        )
        .unwrap();
        assert_eq!(story.epic_name, "");
    }

    #[test]
    fn add_accepts_dangling_parent() {
        let mut table = IssueTable::new();
        let issue =
            add_issue(&mut table, IdStrategy::Timestamp, Level::Story, "s", "NOPE", None).unwrap();
        assert_eq!(issue.parent_id, "NOPE");
    }

    #[test]
    fn timestamp_ids_are_unique_in_a_burst() {
        let mut table = IssueTable::new();
        for i in 0..50 {
            add_issue(
                &mut table,
                IdStrategy::Timestamp,
                Level::SubTask,
                &format!("sub {}", i),
                "",
                None,
            )
            .unwrap();
        }
        let unique: HashSet<&str> = table.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(unique.len(), 50);
    }

    #[test]
    fn counter_ids_follow_existing_numbers() {
        let mut table = normalize(vec![
            raw("ST7", Level::Story, ""),
            raw("STx", Level::Story, ""),
        ]);
        let issue =
            add_issue(&mut table, IdStrategy::Counter, Level::Story, "next", "", None).unwrap();
        assert_eq!(issue.id, "ST8");
        let first_task =
            add_issue(&mut table, IdStrategy::Counter, Level::Task, "t", "", None).unwrap();
        assert_eq!(first_task.id, "TS1");
    }

    #[test]
    fn ids_after_max_suffix_still_terminate() {
        for strategy in [IdStrategy::Timestamp, IdStrategy::Counter] {
            let mut table = normalize(vec![
                raw("UC18446744073709551615", Level::UseCase, ""),
                raw("UC1", Level::UseCase, ""),
            ]);
            let issue =
                add_issue(&mut table, strategy, Level::UseCase, "another", "", None).unwrap();
            assert_eq!(issue.id, "UC2");
            assert_eq!(table.len(), 3);
        }
    }

    #[test]
    fn timestamp_ids_bump_past_wrapped_neighbours() {
        let mut table = normalize(vec![
            raw("TS18446744073709551615", Level::Task, ""),
            raw("TS1", Level::Task, ""),
            raw("TS2", Level::Task, ""),
        ]);
        let first = next_id(&table, Level::Task, IdStrategy::Timestamp);
        assert_eq!(first, "TS3");
        add_issue(&mut table, IdStrategy::Timestamp, Level::Task, "t", "", None).unwrap();
        assert_eq!(next_id(&table, Level::Task, IdStrategy::Timestamp), "TS4");
    }

    // --- edit ---

    #[test]
    fn edit_updates_summary() {
        let mut table = chain();
        edit_issue(&mut table, "C", Some("Renamed"), None).unwrap();
        assert_eq!(table.get("C").unwrap().summary, "Renamed");
    }

    #[test]
    fn edit_epic_name_only_on_epics() {
        let mut table = chain();
        edit_issue(&mut table, "B", None, Some("Auth Epic")).unwrap();
        assert_eq!(table.get("B").unwrap().epic_name, "Auth Epic");

        edit_issue(&mut table, "C", Some("Story"), Some("nope")).unwrap();
        let c = table.get("C").unwrap();
        assert_eq!(c.summary, "Story");
        assert_eq!(c.epic_name, "");
    }

    #[test]
    fn edit_unknown_id_is_not_found_and_unchanged() {
        let mut table = chain();
        let before = table.clone();
        let err = edit_issue(&mut table, "Z", Some("x"), Some("y"));
        assert!(matches!(err, Err(IssueError::NotFound(id)) if id == "Z"));
        assert_eq!(table, before);
    }

    #[test]
    fn edit_rejects_blank_summary() {
        let mut table = chain();
        let before = table.clone();
        assert!(matches!(
            edit_issue(&mut table, "A", Some(" "), None),
            Err(IssueError::EmptySummary)
        ));
        assert_eq!(table, before);
    }

    // --- delete ---

    #[test]
    fn cascade_delete_removes_whole_chain() {
        let mut table = chain();
        let removed = delete_issue(&mut table, "A", true);
        assert!(table.is_empty());
        assert_eq!(removed.into_iter().collect::<Vec<_>>(), vec!["A", "B", "C"]);
    }

    #[test]
    fn cascade_delete_leaves_siblings() {
        let mut table = normalize(vec![
            raw("A", Level::UseCase, ""),
            raw("B", Level::Epic, "A"),
            raw("C", Level::Story, "B"),
            raw("D", Level::UseCase, ""),
            raw("E", Level::Epic, "D"),
        ]);
        let removed = delete_issue(&mut table, "B", true);
        assert_eq!(removed.len(), 2);
        assert_eq!(ids(&table), vec!["A", "D", "E"]);
    }

    #[test]
    fn cascade_delete_terminates_on_cycle() {
        let mut table = normalize(vec![
            raw("A", Level::Epic, "B"),
            raw("B", Level::Story, "A"),
            raw("C", Level::Task, ""),
        ]);
        let removed = delete_issue(&mut table, "A", true);
        assert_eq!(removed.len(), 2);
        assert_eq!(ids(&table), vec!["C"]);
    }

    #[test]
    fn plain_delete_detaches_children() {
        let mut table = chain();
        let removed = delete_issue(&mut table, "A", false);
        assert_eq!(removed.into_iter().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(ids(&table), vec!["B", "C"]);
        assert_eq!(table.get("B").unwrap().parent_id, "");
        assert_eq!(table.get("C").unwrap().parent_id, "B");
    }

    #[test]
    fn delete_unknown_is_noop() {
        let mut table = chain();
        let before = table.clone();
        assert!(delete_issue(&mut table, "Z", true).is_empty());
        assert!(delete_issue(&mut table, "Z", false).is_empty());
        assert_eq!(table, before);
    }

    // --- links ---

    #[test]
    fn blocks_are_deduplicated() {
        let mut table = chain();
        add_block(&mut table, "B", "C").unwrap();
        add_block(&mut table, "B", " C ").unwrap();
        assert_eq!(table.get("B").unwrap().blocks, vec!["C"]);
        remove_block(&mut table, "B", "C").unwrap();
        assert!(table.get("B").unwrap().blocks.is_empty());
    }

    #[test]
    fn block_target_with_separator_is_rejected() {
        let mut table = chain();
        assert!(matches!(
            add_block(&mut table, "B", "C;D"),
            Err(IssueError::InvalidBlockTarget(t)) if t == "C;D"
        ));
        assert!(table.get("B").unwrap().blocks.is_empty());
    }

    #[test]
    fn self_block_is_rejected() {
        let mut table = chain();
        assert!(matches!(
            add_block(&mut table, "B", "B"),
            Err(IssueError::SelfBlock(_))
        ));
    }

    #[test]
    fn set_parent_and_clear() {
        let mut table = chain();
        set_parent(&mut table, "C", " A ").unwrap();
        assert_eq!(table.get("C").unwrap().parent_id, "A");
        set_parent(&mut table, "C", "").unwrap();
        assert!(table.get("C").unwrap().is_root());
        assert!(matches!(
            set_parent(&mut table, "Z", "A"),
            Err(IssueError::NotFound(_))
        ));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut table = chain();
        reset_defaults(&mut table);
        assert_eq!(table, IssueTable::defaults());
    }

    #[test]
    fn replace_rows_normalizes() {
        let mut table = chain();
        let kept = replace_rows(
            &mut table,
            vec![raw("X", Level::Task, ""), raw("X", Level::Task, "")],
        );
        assert_eq!(kept, 1);
        assert_eq!(ids(&table), vec!["X"]);
    }
}
