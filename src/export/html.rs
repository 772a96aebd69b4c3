use serde_json::{json, Value};

use crate::model::config::ProjectConfig;
use crate::model::elements::Elements;
use crate::model::issue::Level;

/// Render a self-contained HTML page that draws `elements` with the
/// configured renderer script, layout and per-level styles.
///
/// The page doubles as the canvas: arming a level button and tapping the
/// background (a root) or a node (a child) records a create event that
/// `mm event` accepts, both as copyable text and as an `event.json` download.
pub fn render_html(elements: &Elements, config: &ProjectConfig) -> String {
    let title = config
        .export
        .title
        .as_deref()
        .unwrap_or(config.project.name.as_str());
    let payload = script_json(&elements.to_renderer_json());
    let style = script_json(&stylesheet(config));
    let layout = script_json(&json!({
        "name": config.export.layout,
        "directed": true,
        "spacingFactor": 1.5,
    }));

    format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <script src="{src}"></script>
  <style>
    body {{ margin: 0; font-family: sans-serif; }}
    #levels {{ padding: 4px; }}
    .pill {{ margin: 4px; padding: 4px 8px; border: 1px solid #ccc; border-radius: 6px; background: #fff; cursor: pointer; }}
    .pill.active {{ border: 2px solid #000; }}
    #cy {{ width: 100%; height: {height}px; background: #fff; }}
    #event {{ padding: 4px; }}
    #bridge {{ width: 100%; box-sizing: border-box; font-family: monospace; }}
  </style>
</head>
<body>
  <div id="levels">
{buttons}  </div>
  <div id="cy"></div>
  <div id="event">
    <textarea id="bridge" rows="2" readonly placeholder="Arm a level, then tap the canvas or a node"></textarea>
    <a id="event-download" download="event.json" hidden>Download event.json</a>
  </div>
  <script>
    var cy = cytoscape({{
      container: document.getElementById('cy'),
      elements: {payload},
      style: {style},
      layout: {layout}
    }});

    var armedLevel = null;
    document.querySelectorAll('.pill').forEach(function (btn) {{
      btn.addEventListener('click', function () {{
        document.querySelectorAll('.pill').forEach(function (b) {{ b.classList.remove('active'); }});
        if (armedLevel === btn.dataset.level) {{
          armedLevel = null;
        }} else {{
          armedLevel = btn.dataset.level;
          btn.classList.add('active');
        }}
      }});
    }});

    var downloadUrl = null;
    function recordEvent(event) {{
      var text = JSON.stringify(event);
      var bridge = document.getElementById('bridge');
      bridge.value = text;
      bridge.dispatchEvent(new Event('input', {{ bubbles: true }}));
      if (downloadUrl) URL.revokeObjectURL(downloadUrl);
      downloadUrl = URL.createObjectURL(new Blob([text], {{ type: 'application/json' }}));
      var link = document.getElementById('event-download');
      link.href = downloadUrl;
      link.hidden = false;
    }}

    function createAt(parentId) {{
      if (!armedLevel) return;
      var summary = window.prompt('Enter ' + armedLevel + ' name:');
      if (summary && summary.trim()) {{
        recordEvent({{ kind: "create", level: armedLevel, summary: summary.trim(), parentId: parentId }});
      }}
    }}

    cy.on('tap', function (evt) {{
      if (evt.target === cy) createAt("");
    }});
    cy.on('tap', 'node', function (evt) {{
      createAt(evt.target.id());
    }});
  </script>
</body>
</html>
"#,
        title = escape_html(title),
        src = escape_html(&config.export.renderer_src),
        height = config.export.height,
        buttons = level_buttons(),
    )
}

/// One `.pill` button per level, top of the hierarchy first.
fn level_buttons() -> String {
    Level::ALL
        .iter()
        .map(|level| {
            let name = escape_html(level.name());
            format!(
                "    <button class=\"pill\" data-level=\"{}\">{}</button>\n",
                name, name
            )
        })
        .collect()
}

/// Renderer stylesheet: base node/edge rules plus one class rule per level.
pub fn stylesheet(config: &ProjectConfig) -> Value {
    let mut rules = vec![json!({
        "selector": "node",
        "style": {
            "label": "data(label)",
            "color": "white",
            "text-outline-color": "#000",
            "text-outline-width": 2,
            "text-valign": "center",
            "text-halign": "center",
        },
    })];

    for level in Level::ALL {
        let style = config.style_for(level);
        rules.push(json!({
            "selector": format!(".{}", level.name()),
            "style": {
                "background-color": style.color,
                "shape": style.shape,
                "width": style.size,
                "height": style.size,
            },
        }));
    }

    rules.push(json!({
        "selector": "edge[relation = 'hierarchy']",
        "style": {
            "curve-style": "bezier",
            "target-arrow-shape": "triangle",
            "line-color": "#999",
            "target-arrow-color": "#999",
        },
    }));
    rules.push(json!({
        "selector": "edge[relation = 'dependency']",
        "style": {
            "curve-style": "bezier",
            "line-style": "dashed",
            "target-arrow-shape": "vee",
            "line-color": "#d62728",
            "target-arrow-color": "#d62728",
        },
    }));

    Value::Array(rules)
}

/// JSON safe to inline in a `<script>` block: `<` is escaped so no string
/// value can close the element.
fn script_json(value: &Value) -> String {
    value.to_string().replace('<', "\\u003c")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
