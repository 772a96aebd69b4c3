use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::{config_io, project_io};
use crate::model::table::IssueTable;

const PROJECT_TOML_TEMPLATE: &str = r##"[project]
name = ""

# --- IDs ---
# "timestamp": level prefix + nanoseconds (UC1700000000000000000)
# "counter":   level prefix + next number (UC1, UC2, ...)
[ids]
strategy = "timestamp"

# --- HTML export ---
[export]
# title = "My roadmap"
renderer_src = "https://unpkg.com/cytoscape/dist/cytoscape.min.js"
layout = "breadthfirst"
height = 450

# --- Node styles ---
# Uncomment and edit to override the built-in look of a level.
#
# [styles.Use-Case]
# color = "#1f77b4"
# shape = "ellipse"
# size = 80
#
# [styles.Epic]
# color = "#2ca02c"
# shape = "round-rectangle"
# size = 70
"##;

/// Infer a project name from a directory name: replace hyphens with spaces, title-case.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split(['-', '_'])
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + chars.as_str()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_project_toml(name: &str, args: &InitArgs) -> Result<String, Box<dyn std::error::Error>> {
    let mut doc: toml_edit::DocumentMut = PROJECT_TOML_TEMPLATE.parse()?;
    doc["project"]["name"] = toml_edit::value(name);
    config_io::set_id_strategy(&mut doc, args.ids.into());
    Ok(doc.to_string())
}

pub fn cmd_init(args: InitArgs, project_dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let root = match project_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };

    if let Some(parent) = root.parent()
        && let Ok(parent_root) = project_io::discover_project(parent)
    {
        eprintln!(
            "Note: parent project found at {}/",
            parent_root.join(project_io::DATA_DIR).display()
        );
    }

    let name = args.name.clone().unwrap_or_else(|| {
        root.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .unwrap_or_else(|| "Mindmap".to_string())
    });

    let config_text = render_project_toml(&name, &args)?;
    let table = if args.empty {
        IssueTable::new()
    } else {
        IssueTable::defaults()
    };

    let data_dir = project_io::init_project(&root, &config_text, &table, args.force)?;
    println!("Initialized {} in {}/", name, data_dir.display());
    Ok(())
}
