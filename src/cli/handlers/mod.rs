mod init;
pub use init::cmd_init;

use std::path::Path;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::export::render_html;
use crate::io::project_io::{self, ProjectError};
use crate::io::{config_io, mailbox_io};
use crate::model::event::CanvasEvent;
use crate::model::project::Project;
use crate::model::table::IssueTable;
use crate::ops::elements::derive_elements;
use crate::ops::issue_ops::{self, IssueError};
use crate::ops::{check, event_ops};
use crate::parse::{parse_csv, serialize_csv};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let dir = cli.project_dir.as_deref();

    match cli.command {
        Commands::Init(args) => cmd_init(args, dir),

        // Read commands
        Commands::List(args) => cmd_list(dir, args, json),
        Commands::Show(args) => cmd_show(dir, args, json),
        Commands::Tree => cmd_tree(dir),
        Commands::Elements => cmd_elements(dir),
        Commands::Check => cmd_check(dir, json),
        Commands::Export(args) => cmd_export(dir, args),

        // Write commands
        Commands::Add(args) => cmd_add(dir, args, json),
        Commands::Edit(args) => cmd_edit(dir, args),
        Commands::Parent(args) => cmd_parent(dir, args),
        Commands::Block(args) => cmd_block(dir, args),
        Commands::Delete(args) => cmd_delete(dir, args, json),
        Commands::Import(args) => cmd_import(dir, args, json),
        Commands::Event(args) => cmd_event(dir, args, json),
        Commands::Reset => cmd_reset(dir),
        Commands::Config(args) => cmd_config(dir, args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load the session's project from `-C` or by walking up from the cwd.
fn load_project(dir: Option<&Path>) -> Result<Project, ProjectError> {
    let start = match dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };
    let root = project_io::discover_project(&start)?;
    project_io::load_project(&root)
}

/// Finish a mutation: renormalize the table and persist it.
fn commit(project: &mut Project) -> Result<(), ProjectError> {
    let table = std::mem::replace(&mut project.table, IssueTable::new());
    project.table = issue_ops::renormalize(table);
    project_io::save_table(project)
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(dir: Option<&Path>, args: ListArgs, json: bool) -> CmdResult {
    let project = load_project(dir)?;
    let rows: Vec<_> = project
        .table
        .iter()
        .filter(|r| args.level.is_none_or(|level| r.level == level))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for issue in rows {
            println!("{}", format_issue_line(issue));
        }
    }
    Ok(())
}

fn cmd_show(dir: Option<&Path>, args: ShowArgs, json: bool) -> CmdResult {
    let project = load_project(dir)?;
    let issue = project
        .table
        .get(&args.id)
        .ok_or_else(|| IssueError::NotFound(args.id.clone()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(issue)?);
    } else {
        print!("{}", format_issue_detail(issue, &project.table));
    }
    Ok(())
}

fn cmd_tree(dir: Option<&Path>) -> CmdResult {
    let project = load_project(dir)?;
    print!("{}", format_tree(&project.table));
    Ok(())
}

fn cmd_elements(dir: Option<&Path>) -> CmdResult {
    let project = load_project(dir)?;
    let elements = derive_elements(&project.table);
    println!("{}", serde_json::to_string_pretty(&elements)?);
    Ok(())
}

fn cmd_check(dir: Option<&Path>, json: bool) -> CmdResult {
    let project = load_project(dir)?;
    let result = check::check_table(&project.table);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", format_check(&result));
    }
    if !result.valid {
        return Err(format!("check found {} error(s)", result.errors.len()).into());
    }
    Ok(())
}

fn cmd_export(dir: Option<&Path>, args: ExportArgs) -> CmdResult {
    let project = load_project(dir)?;
    let content = match args.format {
        ExportFormat::Csv => serialize_csv(&project.table),
        ExportFormat::Html => render_html(&derive_elements(&project.table), &project.config),
    };

    match args.output {
        Some(path) => {
            project_io::atomic_write(&path, content.as_bytes())
                .map_err(|e| format!("could not write {}: {}", path.display(), e))?;
            tracing::info!(path = %path.display(), "exported");
            eprintln!("wrote {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(dir: Option<&Path>, args: AddArgs, json: bool) -> CmdResult {
    let mut project = load_project(dir)?;
    let strategy = project.config.ids.strategy;
    let issue = issue_ops::add_issue(
        &mut project.table,
        strategy,
        args.level,
        &args.summary,
        &args.parent,
        args.epic_name.as_deref(),
    )?;
    commit(&mut project)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&issue)?);
    } else {
        println!("{}", issue.id);
    }
    Ok(())
}

fn cmd_edit(dir: Option<&Path>, args: EditArgs) -> CmdResult {
    if args.summary.is_none() && args.epic_name.is_none() {
        return Err("nothing to change: pass --summary and/or --epic-name".into());
    }
    let mut project = load_project(dir)?;
    issue_ops::edit_issue(
        &mut project.table,
        &args.id,
        args.summary.as_deref(),
        args.epic_name.as_deref(),
    )?;
    commit(&mut project)?;
    Ok(())
}

fn cmd_parent(dir: Option<&Path>, args: ParentArgs) -> CmdResult {
    let mut project = load_project(dir)?;
    let parent = args.parent.as_deref().unwrap_or("");
    issue_ops::set_parent(&mut project.table, &args.id, parent)?;
    if !parent.is_empty() && !project.table.contains(parent) {
        eprintln!("warning: parent {} does not exist; no edge will be drawn", parent);
    }
    commit(&mut project)?;
    Ok(())
}

fn cmd_block(dir: Option<&Path>, args: BlockCmd) -> CmdResult {
    let mut project = load_project(dir)?;
    match args.action {
        BlockAction::Add { id, target } => {
            issue_ops::add_block(&mut project.table, &id, &target)?;
            if !project.table.contains(&target) {
                eprintln!("warning: {} does not exist; no edge will be drawn", target);
            }
        }
        BlockAction::Rm { id, target } => {
            issue_ops::remove_block(&mut project.table, &id, &target)?;
        }
    }
    commit(&mut project)?;
    Ok(())
}

fn cmd_delete(dir: Option<&Path>, args: DeleteArgs, json: bool) -> CmdResult {
    let mut project = load_project(dir)?;
    let removed = issue_ops::delete_issue(&mut project.table, &args.id, args.cascade);
    if !removed.is_empty() {
        commit(&mut project)?;
    }

    if json {
        let out = DeleteJson {
            removed: removed.into_iter().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if removed.is_empty() {
        eprintln!("nothing deleted: {} not found", args.id);
    } else {
        for id in &removed {
            println!("{}", id);
        }
    }
    Ok(())
}

fn cmd_import(dir: Option<&Path>, args: ImportArgs, json: bool) -> CmdResult {
    let mut project = load_project(dir)?;
    let text = std::fs::read_to_string(&args.file)
        .map_err(|e| format!("could not read {}: {}", args.file.display(), e))?;
    // A parse failure leaves the table and issues.csv untouched
    let rows = parse_csv(&text).map_err(|e| format!("{}: {}", args.file.display(), e))?;
    let incoming = rows.len();
    let imported = issue_ops::replace_rows(&mut project.table, rows);
    commit(&mut project)?;

    let dropped = incoming - imported;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&ImportJson { imported, dropped })?
        );
    } else {
        println!("imported {} issues", imported);
        if dropped > 0 {
            eprintln!("dropped {} rows with empty or duplicate IDs", dropped);
        }
    }
    Ok(())
}

fn cmd_event(dir: Option<&Path>, args: EventArgs, json: bool) -> CmdResult {
    let mut project = load_project(dir)?;
    if args.post {
        let payload = args.payload.unwrap_or_default();
        mailbox_io::post_event(&project.data_dir, &payload)?;
        eprintln!("queued {}", mailbox_io::event_path(&project.data_dir).display());
        return Ok(());
    }
    let event = match args.payload {
        Some(payload) => CanvasEvent::parse(&payload),
        None => mailbox_io::take_event(&project.data_dir)?,
    };
    let Some(event) = event else {
        eprintln!("no event");
        return Ok(());
    };

    let strategy = project.config.ids.strategy;
    let issue = event_ops::apply_event(&mut project.table, strategy, event)?;
    commit(&mut project)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&issue)?);
    } else {
        println!("Added {}: {} ({})", issue.level, issue.summary, issue.id);
    }
    Ok(())
}

fn cmd_reset(dir: Option<&Path>) -> CmdResult {
    let mut project = load_project(dir)?;
    issue_ops::reset_defaults(&mut project.table);
    commit(&mut project)?;
    println!("table reset to {} default rows", project.table.len());
    Ok(())
}

fn cmd_config(dir: Option<&Path>, args: ConfigArgs, json: bool) -> CmdResult {
    let project = load_project(dir)?;
    let (mut config, mut doc) = config_io::read_config(&project.data_dir)?;

    let changed = args.ids.is_some() || args.title.is_some();
    if let Some(ids) = args.ids {
        config.ids.strategy = ids.into();
        config_io::set_id_strategy(&mut doc, config.ids.strategy);
    }
    if let Some(title) = args.title {
        config_io::set_export_title(&mut doc, &title);
        config.export.title = Some(title);
    }
    if changed {
        config_io::write_config(&project.data_dir, &doc)?;
        tracing::info!("project.toml updated");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("name: {}", config.project.name);
        println!("ids: {}", config.ids.strategy);
        if let Some(title) = &config.export.title {
            println!("title: {}", title);
        }
        println!("layout: {}", config.export.layout);
    }
    Ok(())
}
