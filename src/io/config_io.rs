use std::path::Path;

use crate::io::project_io::{read_file, write_file, ProjectError, CONFIG_FILE};
use crate::model::config::{IdStrategy, ProjectConfig};

/// Read the project config, returning both the parsed config and the raw
/// toml_edit document for round-trip-safe editing.
pub fn read_config(data_dir: &Path) -> Result<(ProjectConfig, toml_edit::DocumentMut), ProjectError> {
    let config_text = read_file(&data_dir.join(CONFIG_FILE))?;
    let config: ProjectConfig = toml::from_str(&config_text)?;
    let doc: toml_edit::DocumentMut = config_text.parse().map_err(|e: toml_edit::TomlError| {
        ProjectError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(data_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ProjectError> {
    write_file(&data_dir.join(CONFIG_FILE), doc.to_string().as_bytes())
}

/// Set `[ids] strategy`
pub fn set_id_strategy(doc: &mut toml_edit::DocumentMut, strategy: IdStrategy) {
    ensure_table(doc, "ids");
    doc["ids"]["strategy"] = toml_edit::value(strategy.as_str());
}

/// Set `[export] title`
pub fn set_export_title(doc: &mut toml_edit::DocumentMut, title: &str) {
    ensure_table(doc, "export");
    doc["export"]["title"] = toml_edit::value(title);
}

fn ensure_table(doc: &mut toml_edit::DocumentMut, key: &str) {
    if !doc.contains_key(key) {
        doc[key] = toml_edit::Item::Table(toml_edit::Table::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample_config() -> &'static str {
        r#"[project]
name = "test"

# keep IDs short
[ids]
strategy = "counter"
"#
    }

    #[test]
    fn test_round_trip_config() {
        let tmp = TempDir::new().unwrap();
        let data_dir = tmp.path().join("mindmap");
        fs::create_dir_all(&data_dir).unwrap();
        fs::write(data_dir.join("project.toml"), sample_config()).unwrap();

        let (config, doc) = read_config(&data_dir).unwrap();
        assert_eq!(config.ids.strategy, IdStrategy::Counter);
        write_config(&data_dir, &doc).unwrap();

        let written = fs::read_to_string(data_dir.join("project.toml")).unwrap();
        assert_eq!(written, sample_config());
    }

    #[test]
    fn test_set_strategy_keeps_comments() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        set_id_strategy(&mut doc, IdStrategy::Timestamp);
        let result = doc.to_string();
        assert!(result.contains("# keep IDs short"));
        assert!(result.contains("strategy = \"timestamp\""));
    }

    #[test]
    fn test_set_title_creates_table() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        set_export_title(&mut doc, "Roadmap");
        let config: ProjectConfig = toml::from_str(&doc.to_string()).unwrap();
        assert_eq!(config.export.title.as_deref(), Some("Roadmap"));
    }
}
