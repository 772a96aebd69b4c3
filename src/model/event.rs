use serde::{Deserialize, Deserializer};

use super::issue::Level;

/// An event posted by the interactive canvas.
///
/// Only `create` exists today; the wire shape is
/// `{"kind": "create", "level": "Epic", "summary": "...", "parentId": "UC1"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CanvasEvent {
    Create {
        #[serde(deserialize_with = "deserialize_level")]
        level: Level,
        summary: String,
        #[serde(rename = "parentId", default)]
        parent_id: String,
    },
}

/// Levels are read with the same loose spelling rules as CSV and the CLI.
fn deserialize_level<'de, D>(deserializer: D) -> Result<Level, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    text.parse().map_err(serde::de::Error::custom)
}

impl CanvasEvent {
    /// Parse a raw payload. Anything unparseable, including unknown kinds or
    /// levels, is treated as no event.
    pub fn parse(payload: &str) -> Option<CanvasEvent> {
        let payload = payload.trim();
        if payload.is_empty() {
            return None;
        }
        match serde_json::from_str(payload) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unparseable canvas event");
                None
            }
        }
    }
}

/// One-shot slot for the next canvas event.
///
/// Posting replaces whatever is pending; taking clears it, so a given event
/// is consumed at most once.
#[derive(Debug, Default)]
pub struct Mailbox {
    pending: Option<CanvasEvent>,
}

impl Mailbox {
    pub fn new() -> Self {
        Mailbox::default()
    }

    pub fn post(&mut self, event: CanvasEvent) {
        self.pending = Some(event);
    }

    /// Parse and post a raw payload. Returns false if it was ignored.
    pub fn post_raw(&mut self, payload: &str) -> bool {
        match CanvasEvent::parse(payload) {
            Some(event) => {
                self.post(event);
                true
            }
            None => false,
        }
    }

    pub fn take(&mut self) -> Option<CanvasEvent> {
        self.pending.take()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_create_event() {
        let event =
            CanvasEvent::parse(r#"{"kind":"create","level":"Epic","summary":"Auth","parentId":"UC1"}"#);
        assert_eq!(
            event,
            Some(CanvasEvent::Create {
                level: Level::Epic,
                summary: "Auth".into(),
                parent_id: "UC1".into(),
            })
        );
    }

    #[test]
    fn missing_parent_means_root() {
        let event = CanvasEvent::parse(r#"{"kind":"create","level":"Task","summary":"x"}"#);
        assert!(matches!(
            event,
            Some(CanvasEvent::Create { parent_id, .. }) if parent_id.is_empty()
        ));
    }

    #[test]
    fn level_spelling_is_loose() {
        let event =
            CanvasEvent::parse(r#"{"kind":"create","level":"use case","summary":"Checkout"}"#);
        assert!(matches!(
            event,
            Some(CanvasEvent::Create { level: Level::UseCase, .. })
        ));
        let event = CanvasEvent::parse(r#"{"kind":"create","level":"SUBTASK","summary":"x"}"#);
        assert!(matches!(
            event,
            Some(CanvasEvent::Create { level: Level::SubTask, .. })
        ));
    }

    #[test]
    fn garbage_is_no_event() {
        assert_eq!(CanvasEvent::parse(""), None);
        assert_eq!(CanvasEvent::parse("{not json"), None);
        assert_eq!(CanvasEvent::parse(r#"{"kind":"delete","id":"A"}"#), None);
        assert_eq!(
            CanvasEvent::parse(r#"{"kind":"create","level":"Saga","summary":"x"}"#),
            None
        );
    }

    #[test]
    fn mailbox_is_one_shot() {
        let mut mailbox = Mailbox::new();
        assert!(mailbox.post_raw(r#"{"kind":"create","level":"Story","summary":"s"}"#));
        assert!(!mailbox.is_empty());
        assert!(mailbox.take().is_some());
        assert!(mailbox.take().is_none());
        assert!(mailbox.is_empty());
    }

    #[test]
    fn mailbox_ignores_bad_payload() {
        let mut mailbox = Mailbox::new();
        assert!(!mailbox.post_raw("nope"));
        assert!(mailbox.take().is_none());
    }
}
