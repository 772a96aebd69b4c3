use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::issue::Level;

/// Configuration from project.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub project: ProjectInfo,
    #[serde(default)]
    pub ids: IdConfig,
    #[serde(default)]
    pub export: ExportConfig,
    /// Per-level node styles, keyed by level name (`"Use-Case"`, `"Epic"`, ...).
    /// Levels not listed here fall back to [`LevelStyle::default_for`].
    #[serde(default)]
    pub styles: IndexMap<String, LevelStyle>,
}

impl ProjectConfig {
    pub fn new(name: impl Into<String>) -> Self {
        ProjectConfig {
            project: ProjectInfo { name: name.into() },
            ids: IdConfig::default(),
            export: ExportConfig::default(),
            styles: IndexMap::new(),
        }
    }

    /// Resolved style for a level (configured override or built-in default)
    pub fn style_for(&self, level: Level) -> LevelStyle {
        self.styles
            .iter()
            .find(|(name, _)| name.parse::<Level>().ok() == Some(level))
            .map(|(_, style)| style.clone())
            .unwrap_or_else(|| LevelStyle::default_for(level))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
}

/// How new issue IDs are generated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// `prefix + nanoseconds since the epoch`, kept strictly increasing per prefix
    #[default]
    Timestamp,
    /// `prefix + next integer` after the highest existing one
    Counter,
}

impl IdStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            IdStrategy::Timestamp => "timestamp",
            IdStrategy::Counter => "counter",
        }
    }
}

impl std::fmt::Display for IdStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdConfig {
    #[serde(default)]
    pub strategy: IdStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Document title; the project name when absent
    #[serde(default)]
    pub title: Option<String>,
    /// Script URL of the graph renderer embedded in exported HTML
    #[serde(default = "default_renderer_src")]
    pub renderer_src: String,
    /// Renderer layout name
    #[serde(default = "default_layout")]
    pub layout: String,
    /// Canvas height in pixels
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            title: None,
            renderer_src: default_renderer_src(),
            layout: default_layout(),
            height: default_height(),
        }
    }
}

fn default_renderer_src() -> String {
    "https://unpkg.com/cytoscape/dist/cytoscape.min.js".to_string()
}

fn default_layout() -> String {
    "breadthfirst".to_string()
}

fn default_height() -> u32 {
    450
}

/// Visual style of one level's nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStyle {
    pub color: String,
    pub shape: String,
    /// Width and height in pixels
    pub size: u32,
}

impl LevelStyle {
    pub fn default_for(level: Level) -> Self {
        let (color, shape, size) = match level {
            Level::UseCase => ("#1f77b4", "ellipse", 80),
            Level::Epic => ("#2ca02c", "round-rectangle", 70),
            Level::Story => ("#ff7f0e", "diamond", 60),
            Level::Task => ("#7f7f7f", "triangle", 50),
            Level::SubTask => ("#9467bd", "hexagon", 40),
        };
        LevelStyle {
            color: color.to_string(),
            shape: shape.to_string(),
            size,
        }
    }
}
