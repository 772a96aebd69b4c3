use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::model::config::IdStrategy;
use crate::model::issue::Level;

#[derive(Parser)]
#[command(name = "mm", about = concat!("mindmap v", env!("CARGO_PKG_VERSION"), " - issue trees as a table and a graph"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different project directory
    #[arg(short = 'C', long = "project-dir", global = true)]
    pub project_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new mindmap project in the current directory
    Init(InitArgs),
    /// List issues in table order
    List(ListArgs),
    /// Show one issue
    Show(ShowArgs),
    /// Print the issue hierarchy
    Tree,
    /// Add an issue
    Add(AddArgs),
    /// Change an issue's summary or epic name
    Edit(EditArgs),
    /// Set or clear an issue's parent
    Parent(ParentArgs),
    /// Add or remove "blocks" links
    Block(BlockCmd),
    /// Delete an issue
    Delete(DeleteArgs),
    /// Replace the table with the contents of a CSV file
    Import(ImportArgs),
    /// Export the table as CSV or HTML
    Export(ExportArgs),
    /// Print the node/edge payload for the graph renderer
    Elements,
    /// Apply a canvas event (inline JSON, or the pending mailbox event)
    Event(EventArgs),
    /// Validate table integrity
    Check,
    /// Replace the table with the default rows
    Reset,
    /// Show or change project settings
    Config(ConfigArgs),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Project name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// ID generation strategy
    #[arg(long, value_enum, default_value_t = IdStrategyArg::Timestamp)]
    pub ids: IdStrategyArg,
    /// Start with an empty table instead of the default rows
    #[arg(long)]
    pub empty: bool,
    /// Reinitialize even if mindmap/ already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum IdStrategyArg {
    Timestamp,
    Counter,
}

impl From<IdStrategyArg> for IdStrategy {
    fn from(arg: IdStrategyArg) -> Self {
        match arg {
            IdStrategyArg::Timestamp => IdStrategy::Timestamp,
            IdStrategyArg::Counter => IdStrategy::Counter,
        }
    }
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Only issues at this level
    #[arg(long, value_parser = parse_level)]
    pub level: Option<Level>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Issue ID to show
    pub id: String,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Level: Use-Case, Epic, Story, Task or Sub-task
    #[arg(value_parser = parse_level)]
    pub level: Level,
    /// Summary text
    pub summary: String,
    /// Parent issue ID
    #[arg(long, short = 'p', default_value = "")]
    pub parent: String,
    /// Epic name (Epics only; defaults to the summary)
    #[arg(long)]
    pub epic_name: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Issue ID
    pub id: String,
    /// New summary
    #[arg(long, short = 's')]
    pub summary: Option<String>,
    /// New epic name (ignored unless the issue is an Epic)
    #[arg(long)]
    pub epic_name: Option<String>,
}

#[derive(Args)]
pub struct ParentArgs {
    /// Issue ID
    pub id: String,
    /// New parent ID (omit to make the issue a root)
    pub parent: Option<String>,
}

#[derive(Args)]
pub struct BlockCmd {
    #[command(subcommand)]
    pub action: BlockAction,
}

#[derive(Subcommand)]
pub enum BlockAction {
    /// Record that ID blocks TARGET
    Add {
        id: String,
        target: String,
    },
    /// Remove a blocks link
    Rm {
        id: String,
        target: String,
    },
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Issue ID
    pub id: String,
    /// Also delete every descendant
    #[arg(long)]
    pub cascade: bool,
}

#[derive(Args)]
pub struct ImportArgs {
    /// CSV file to import
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output format
    #[arg(value_enum)]
    pub format: ExportFormat,
    /// Write to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Html,
}

#[derive(Args)]
pub struct EventArgs {
    /// Event JSON, e.g. '{"kind":"create","level":"Epic","summary":"Auth","parentId":"UC1"}'.
    /// Without it, the pending mindmap/event.json is consumed.
    pub payload: Option<String>,
    /// Queue the payload in mindmap/event.json instead of applying it
    #[arg(long, requires = "payload")]
    pub post: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// ID generation strategy for new issues
    #[arg(long, value_enum)]
    pub ids: Option<IdStrategyArg>,
    /// Title of the HTML export
    #[arg(long)]
    pub title: Option<String>,
}

fn parse_level(s: &str) -> Result<Level, String> {
    s.parse::<Level>().map_err(|e| e.to_string())
}
