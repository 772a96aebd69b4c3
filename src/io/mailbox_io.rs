use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::io::project_io::{write_file, ProjectError};
use crate::model::event::{CanvasEvent, Mailbox};

/// File the canvas drops its next event into
pub const EVENT_FILE: &str = "event.json";

pub fn event_path(data_dir: &Path) -> PathBuf {
    data_dir.join(EVENT_FILE)
}

/// Store a raw payload for the next `take_event`, replacing any pending one.
pub fn post_event(data_dir: &Path, payload: &str) -> Result<(), ProjectError> {
    write_file(&event_path(data_dir), payload.as_bytes())
}

/// Consume the pending event, if any.
///
/// The file is removed whether or not its content parses, so a bad payload
/// is dropped rather than retried.
pub fn take_event(data_dir: &Path) -> Result<Option<CanvasEvent>, ProjectError> {
    let path = event_path(data_dir);
    let payload = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(ProjectError::ReadError { path, source }),
    };
    fs::remove_file(&path)?;

    let mut mailbox = Mailbox::new();
    mailbox.post_raw(&payload);
    Ok(mailbox.take())
}
