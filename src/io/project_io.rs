use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::config::ProjectConfig;
use crate::model::project::Project;
use crate::model::table::IssueTable;
use crate::ops::issue_ops::normalize;
use crate::parse::{parse_csv, serialize_csv, CsvError};

/// Name of the workspace directory under the project root
pub const DATA_DIR: &str = "mindmap";
pub const CONFIG_FILE: &str = "project.toml";
pub const ISSUES_FILE: &str = "issues.csv";

/// Error type for project I/O operations
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("not a mindmap project: no mindmap/ directory found")]
    NotAProject,
    #[error("mindmap/ already exists in {0} (use --force to reinitialize)")]
    AlreadyInitialized(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not parse {path}: {source}")]
    CsvError { path: PathBuf, source: CsvError },
    #[error("could not parse project.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
}

/// Discover the project by walking up from the given directory, looking for
/// a `mindmap/` subdirectory with a project.toml.
pub fn discover_project(start: &Path) -> Result<PathBuf, ProjectError> {
    let mut current = start.to_path_buf();
    loop {
        let data_dir = current.join(DATA_DIR);
        if data_dir.is_dir() && data_dir.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(ProjectError::NotAProject);
        }
    }
}

/// Load config and issue table from the given root directory.
///
/// A missing issues.csv loads as an empty table.
pub fn load_project(root: &Path) -> Result<Project, ProjectError> {
    let data_dir = root.join(DATA_DIR);
    if !data_dir.is_dir() {
        return Err(ProjectError::NotAProject);
    }

    let config_path = data_dir.join(CONFIG_FILE);
    let config_text = read_file(&config_path)?;
    let config: ProjectConfig = toml::from_str(&config_text)?;

    let issues_path = data_dir.join(ISSUES_FILE);
    let table = if issues_path.exists() {
        read_table(&issues_path)?
    } else {
        IssueTable::new()
    };

    tracing::debug!(root = %root.display(), issues = table.len(), "project loaded");
    Ok(Project {
        root: root.to_path_buf(),
        data_dir,
        config,
        table,
    })
}

/// Read and normalize an issue CSV from any path.
pub fn read_table(path: &Path) -> Result<IssueTable, ProjectError> {
    let text = read_file(path)?;
    let rows = parse_csv(&text).map_err(|source| ProjectError::CsvError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(normalize(rows))
}

/// Write the project's table back to issues.csv
pub fn save_table(project: &Project) -> Result<(), ProjectError> {
    let path = project.data_dir.join(ISSUES_FILE);
    write_file(&path, serialize_csv(&project.table).as_bytes())?;
    tracing::debug!(path = %path.display(), issues = project.table.len(), "table saved");
    Ok(())
}

/// Create `mindmap/` with a config and an initial table under `root`.
pub fn init_project(
    root: &Path,
    config_text: &str,
    table: &IssueTable,
    force: bool,
) -> Result<PathBuf, ProjectError> {
    let data_dir = root.join(DATA_DIR);
    if data_dir.join(CONFIG_FILE).exists() && !force {
        return Err(ProjectError::AlreadyInitialized(root.to_path_buf()));
    }
    fs::create_dir_all(&data_dir).map_err(|source| ProjectError::WriteError {
        path: data_dir.clone(),
        source,
    })?;
    write_file(&data_dir.join(CONFIG_FILE), config_text.as_bytes())?;
    write_file(&data_dir.join(ISSUES_FILE), serialize_csv(table).as_bytes())?;
    tracing::info!(root = %root.display(), "project initialized");
    Ok(data_dir)
}

/// Write to a temp file in the same directory, then rename over the target.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub(crate) fn read_file(path: &Path) -> Result<String, ProjectError> {
    fs::read_to_string(path).map_err(|source| ProjectError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_file(path: &Path, content: &[u8]) -> Result<(), ProjectError> {
    atomic_write(path, content).map_err(|source| ProjectError::WriteError {
        path: path.to_path_buf(),
        source,
    })
}
