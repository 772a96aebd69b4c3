use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Rank of an issue in the fixed hierarchy Use-Case > Epic > Story > Task > Sub-task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    #[serde(rename = "Use-Case")]
    UseCase,
    Epic,
    Story,
    Task,
    #[serde(rename = "Sub-task")]
    SubTask,
}

impl Level {
    /// All levels, top of the hierarchy first
    pub const ALL: [Level; 5] = [
        Level::UseCase,
        Level::Epic,
        Level::Story,
        Level::Task,
        Level::SubTask,
    ];

    /// Display name, also used as the CSV value and the renderer style class
    pub fn name(self) -> &'static str {
        match self {
            Level::UseCase => "Use-Case",
            Level::Epic => "Epic",
            Level::Story => "Story",
            Level::Task => "Task",
            Level::SubTask => "Sub-task",
        }
    }

    /// Prefix for generated IDs
    pub fn id_prefix(self) -> &'static str {
        match self {
            Level::UseCase => "UC",
            Level::Epic => "EP",
            Level::Story => "ST",
            Level::Task => "TS",
            Level::SubTask => "SB",
        }
    }

    /// Depth in the hierarchy (0 = Use-Case)
    pub fn rank(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown level '{0}' (expected one of Use-Case, Epic, Story, Task, Sub-task)")]
pub struct UnknownLevel(pub String);

impl FromStr for Level {
    type Err = UnknownLevel;

    /// Case-insensitive; separators between words are optional
    /// (`use-case`, `Use Case`, `usecase`, `subtask` all parse).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "usecase" => Ok(Level::UseCase),
            "epic" => Ok(Level::Epic),
            "story" => Ok(Level::Story),
            "task" => Ok(Level::Task),
            "subtask" => Ok(Level::SubTask),
            _ => Err(UnknownLevel(s.trim().to_string())),
        }
    }
}

/// One row of the issue table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub level: Level,
    pub summary: String,
    /// Only meaningful when `level` is `Epic`
    #[serde(default)]
    pub epic_name: String,
    /// Empty for roots. Need not resolve.
    #[serde(default)]
    pub parent_id: String,
    /// IDs this issue blocks, in order
    #[serde(default)]
    pub blocks: Vec<String>,
}

impl Issue {
    pub fn new(id: impl Into<String>, level: Level, summary: impl Into<String>) -> Self {
        Issue {
            id: id.into(),
            level,
            summary: summary.into(),
            epic_name: String::new(),
            parent_id: String::new(),
            blocks: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = parent_id.into();
        self
    }

    pub fn with_epic_name(mut self, epic_name: impl Into<String>) -> Self {
        self.epic_name = epic_name.into();
        self
    }

    pub fn with_blocks<I, S>(mut self, blocks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocks = blocks.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_empty()
    }

    /// `"<Level>: <Summary>"`, the label shown on the rendered node
    pub fn label(&self) -> String {
        format!("{}: {}", self.level, self.summary)
    }

    /// Blocks in their serialized `;`-joined form
    pub fn blocks_joined(&self) -> String {
        self.blocks.join(";")
    }
}

/// A row as it arrives from outside (CSV, a data grid): optional fields may
/// be missing and nothing has been trimmed or de-duplicated yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIssue {
    pub id: String,
    pub level: Level,
    pub summary: String,
    pub epic_name: Option<String>,
    pub parent_id: Option<String>,
    /// Unsplit `;`-joined form
    pub blocks: Option<String>,
}

impl From<Issue> for RawIssue {
    fn from(issue: Issue) -> Self {
        let blocks = issue.blocks_joined();
        RawIssue {
            id: issue.id,
            level: issue.level,
            summary: issue.summary,
            epic_name: Some(issue.epic_name),
            parent_id: Some(issue.parent_id),
            blocks: Some(blocks),
        }
    }
}

/// Split a serialized Blocks cell into trimmed, non-empty IDs
pub fn split_blocks(cell: &str) -> Vec<String> {
    cell.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
