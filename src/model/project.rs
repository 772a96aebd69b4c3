use std::path::PathBuf;

use super::config::ProjectConfig;
use super::table::IssueTable;

/// A fully loaded mindmap workspace: the state one session owns
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of `mindmap/`)
    pub root: PathBuf,
    /// Path to the `mindmap/` directory
    pub data_dir: PathBuf,
    /// Parsed project.toml
    pub config: ProjectConfig,
    /// The issue table from issues.csv
    pub table: IssueTable,
}
