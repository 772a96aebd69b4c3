use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::issue::{Issue, Level};

/// The canonical, ordered set of issue rows for one session.
///
/// Insertion order is display order. The table itself does not enforce ID
/// uniqueness; every path that builds one from outside data goes through
/// [`crate::ops::issue_ops::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueTable {
    rows: Vec<Issue>,
}

impl IssueTable {
    pub fn new() -> Self {
        IssueTable::default()
    }

    /// The two rows a fresh workspace starts with
    pub fn defaults() -> Self {
        IssueTable {
            rows: vec![
                Issue::new("UC1", Level::UseCase, "User Login"),
                Issue::new("E1", Level::Epic, "Authentication Epic")
                    .with_epic_name("Auth Epic")
                    .with_parent("UC1"),
            ],
        }
    }

    /// Wrap rows that are already known to be normalized.
    pub(crate) fn from_rows_unchecked(rows: Vec<Issue>) -> Self {
        IssueTable { rows }
    }

    pub fn rows(&self) -> &[Issue] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Issue> {
        &mut self.rows
    }

    pub fn into_rows(self) -> Vec<Issue> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.rows.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Issue> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Issue> {
        self.rows.iter_mut().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> HashSet<&str> {
        self.rows.iter().map(|r| r.id.as_str()).collect()
    }

    /// Direct children of `id`, in table order
    pub fn children<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Issue> + 'a {
        self.rows.iter().filter(move |r| r.parent_id == id)
    }

    /// Rows with no parent, or whose parent doesn't resolve
    pub fn roots(&self) -> Vec<&Issue> {
        let ids = self.ids();
        self.rows
            .iter()
            .filter(|r| r.is_root() || !ids.contains(r.parent_id.as_str()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a IssueTable {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_link_epic_to_use_case() {
        let table = IssueTable::defaults();
        assert_eq!(table.len(), 2);
        let epic = table.get("E1").unwrap();
        assert_eq!(epic.parent_id, "UC1");
        assert_eq!(epic.epic_name, "Auth Epic");
        assert_eq!(table.children("UC1").count(), 1);
    }

    #[test]
    fn roots_include_dangling_parents() {
        let table = IssueTable::from_rows_unchecked(vec![
            Issue::new("A", Level::UseCase, "a"),
            Issue::new("B", Level::Epic, "b").with_parent("A"),
            Issue::new("C", Level::Story, "c").with_parent("GONE"),
        ]);
        let roots: Vec<&str> = table.roots().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(roots, vec!["A", "C"]);
    }
}
