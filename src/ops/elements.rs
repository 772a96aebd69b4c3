use crate::model::elements::{Edge, Elements, Node, Relation};
use crate::model::table::IssueTable;

/// Flatten the table into the renderer's node/edge payload.
///
/// One node per issue. A hierarchy edge for every Parent ID that resolves, a
/// dependency edge for every Blocks entry that resolves. References to IDs
/// not in the table produce nothing.
pub fn derive_elements(table: &IssueTable) -> Elements {
    let ids = table.ids();
    let mut elements = Elements::default();

    for issue in table {
        elements.nodes.push(Node {
            id: issue.id.clone(),
            label: issue.label(),
            class: issue.level,
        });
    }

    for issue in table {
        if !issue.parent_id.is_empty() && ids.contains(issue.parent_id.as_str()) {
            elements.edges.push(Edge {
                source: issue.parent_id.clone(),
                target: issue.id.clone(),
                relation: Relation::Hierarchy,
            });
        }
        for target in &issue.blocks {
            if !target.is_empty() && ids.contains(target.as_str()) {
                elements.edges.push(Edge {
                    source: issue.id.clone(),
                    target: target.clone(),
                    relation: Relation::Dependency,
                });
            }
        }
    }

    elements
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::model::issue::{Issue, Level, RawIssue};
    use crate::ops::issue_ops::{delete_issue, normalize};

    fn table() -> IssueTable {
        let rows = vec![
            Issue::new("UC1", Level::UseCase, "User Login"),
            Issue::new("E1", Level::Epic, "Auth")
                .with_parent("UC1")
                .with_epic_name("Auth Epic"),
            Issue::new("S1", Level::Story, "Form")
                .with_parent("E1")
                .with_blocks(["S2", "GHOST"]),
            Issue::new("S2", Level::Story, "Reset").with_parent("MISSING"),
        ];
        normalize(rows.into_iter().map(RawIssue::from))
    }

    #[test]
    fn nodes_carry_label_and_class() {
        let elements = derive_elements(&table());
        assert_eq!(elements.nodes.len(), 4);
        let first = &elements.nodes[0];
        assert_eq!(first.id, "UC1");
        assert_eq!(first.label, "Use-Case: User Login");
        assert_eq!(first.class, Level::UseCase);
    }

    #[test]
    fn edges_skip_dangling_references() {
        let elements = derive_elements(&table());
        let edges: Vec<(&str, &str, Relation)> = elements
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str(), e.relation))
            .collect();
        assert_eq!(
            edges,
            vec![
                ("UC1", "E1", Relation::Hierarchy),
                ("E1", "S1", Relation::Hierarchy),
                ("S1", "S2", Relation::Dependency),
            ]
        );
    }

    #[test]
    fn no_dangling_edges_after_delete() {
        let mut table = table();
        delete_issue(&mut table, "S2", false);
        delete_issue(&mut table, "UC1", true);
        let elements = derive_elements(&table);
        let node_ids: HashSet<&str> = elements.nodes.iter().map(|n| n.id.as_str()).collect();
        for edge in &elements.edges {
            assert!(node_ids.contains(edge.source.as_str()));
            assert!(node_ids.contains(edge.target.as_str()));
        }
    }

    #[test]
    fn node_ids_are_unique() {
        let elements = derive_elements(&table());
        let unique: HashSet<&str> = elements.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(unique.len(), elements.nodes.len());
    }

    #[test]
    fn derivation_is_deterministic() {
        let t = table();
        assert_eq!(derive_elements(&t), derive_elements(&t));
    }

    #[test]
    fn renderer_json_shape() {
        let json = derive_elements(&table()).to_renderer_json();
        let arr = json.as_array().unwrap();
        assert_eq!(arr.len(), 4 + 3);
        assert_eq!(arr[0]["data"]["id"], "UC1");
        assert_eq!(arr[0]["classes"], "Use-Case");
        assert_eq!(arr[4]["data"]["relation"], "hierarchy");
        assert_eq!(arr[6]["data"]["relation"], "dependency");
    }

    #[test]
    fn payload_serializes_with_level_class() {
        let json = serde_json::to_value(derive_elements(&table())).unwrap();
        assert_eq!(json["nodes"][3]["class"], "Story");
        assert_eq!(json["edges"][2]["relation"], "dependency");
    }
}
