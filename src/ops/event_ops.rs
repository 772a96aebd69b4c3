use crate::model::config::IdStrategy;
use crate::model::event::CanvasEvent;
use crate::model::issue::{Issue, Level};
use crate::model::table::IssueTable;
use crate::ops::issue_ops::{add_issue, IssueError};

/// Apply one canvas event to the table.
///
/// A create event adds a row exactly as `add_issue` would; Epics take their
/// summary as epic name.
pub fn apply_event(
    table: &mut IssueTable,
    strategy: IdStrategy,
    event: CanvasEvent,
) -> Result<Issue, IssueError> {
    match event {
        CanvasEvent::Create {
            level,
            summary,
            parent_id,
        } => {
            let epic_name = (level == Level::Epic).then_some(summary.as_str());
            let issue = add_issue(table, strategy, level, &summary, &parent_id, epic_name)?;
            tracing::info!(id = %issue.id, "Added {}: {}", issue.level, issue.summary);
            Ok(issue)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_event_appends_child() {
        let mut table = IssueTable::defaults();
        let event = CanvasEvent::parse(
            r#"{"kind":"create","level":"Story","summary":"Login form","parentId":"E1"}"#,
        )
        .unwrap();
        let issue = apply_event(&mut table, IdStrategy::Timestamp, event).unwrap();
        assert_eq!(table.len(), 3);
        assert!(issue.id.starts_with("ST"));
        assert_eq!(issue.parent_id, "E1");
        assert_eq!(issue.label(), "Story: Login form");
    }

    #[test]
    fn create_epic_copies_summary_to_epic_name() {
        let mut table = IssueTable::new();
        let event = CanvasEvent::Create {
            level: Level::Epic,
            summary: "Payments".into(),
            parent_id: String::new(),
        };
        let issue = apply_event(&mut table, IdStrategy::Counter, event).unwrap();
        assert_eq!(issue.id, "EP1");
        assert_eq!(issue.epic_name, "Payments");
        assert!(issue.is_root());
    }

    #[test]
    fn blank_summary_is_rejected() {
        let mut table = IssueTable::new();
        let event = CanvasEvent::Create {
            level: Level::Task,
            summary: "   ".into(),
            parent_id: String::new(),
        };
        assert!(apply_event(&mut table, IdStrategy::Counter, event).is_err());
        assert!(table.is_empty());
    }
}
