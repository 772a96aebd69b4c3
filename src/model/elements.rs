use serde::Serialize;

use super::issue::Level;

/// Kind of a rendered edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// parent → child, from Parent ID
    Hierarchy,
    /// issue → blocked target, from Blocks
    Dependency,
}

impl Relation {
    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Hierarchy => "hierarchy",
            Relation::Dependency => "dependency",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    /// Style class; always the node's level name
    pub class: Level,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub relation: Relation,
}

/// The node/edge payload handed to the graph renderer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Elements {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Elements {
    /// Flatten into the renderer's element list: nodes as
    /// `{data: {id, label}, classes}` and edges as `{data: {source, target, relation}}`.
    pub fn to_renderer_json(&self) -> serde_json::Value {
        let nodes = self.nodes.iter().map(|n| {
            serde_json::json!({
                "data": { "id": n.id, "label": n.label },
                "classes": n.class.name(),
            })
        });
        let edges = self.edges.iter().map(|e| {
            serde_json::json!({
                "data": {
                    "source": e.source,
                    "target": e.target,
                    "relation": e.relation.as_str(),
                },
            })
        });
        serde_json::Value::Array(nodes.chain(edges).collect())
    }
}
