//! Structural comparison of two graphs
//!
//! Both graphs are upgraded to GFA 2.0 first, so a 1.0 link and the
//! equivalent 2.0 edge compare equal. Edge and tag identifiers are ignored;
//! segments and groups are matched by name.

use crate::gfa::GfaGraph;
use crate::record::{natural_cmp, Edge};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Differences between a first and a second graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDiff {
    /// Segment names only in the first graph
    pub segments_removed: Vec<String>,
    /// Segment names only in the second graph
    pub segments_added: Vec<String>,
    /// Segments in both whose length or sequence differ
    pub segments_changed: Vec<String>,
    pub edges_removed: Vec<String>,
    pub edges_added: Vec<String>,
    pub groups_removed: Vec<String>,
    pub groups_added: Vec<String>,
    /// Groups in both whose kind or steps differ
    pub groups_changed: Vec<String>,
}

/// Edge text without its id and tags
fn edge_key(edge: &Edge) -> String {
    let anonymous = Edge {
        id: "*".to_string(),
        tags: Vec::new(),
        ..edge.clone()
    };
    anonymous
        .to_line()
        .trim_start_matches("E\t*\t")
        .replace('\t', " ")
}

fn sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort_by(|a, b| natural_cmp(a, b));
    names
}

/// Compare `first` against `second`
pub fn diff(first: &mut GfaGraph, second: &mut GfaGraph) -> GraphDiff {
    first.upgrade_to_v2();
    second.upgrade_to_v2();

    let mut result = GraphDiff::default();

    for (name, segment) in &first.segments {
        match second.segments.get(name) {
            None => result.segments_removed.push(name.clone()),
            Some(other) => {
                if segment.length != other.length || segment.sequence != other.sequence {
                    result.segments_changed.push(name.clone());
                }
            }
        }
    }
    result.segments_added = second
        .segments
        .keys()
        .filter(|name| !first.segments.contains_key(name.as_str()))
        .cloned()
        .collect();

    let first_edges: BTreeSet<String> = first.edges.iter().map(edge_key).collect();
    let second_edges: BTreeSet<String> = second.edges.iter().map(edge_key).collect();
    result.edges_removed = first_edges.difference(&second_edges).cloned().collect();
    result.edges_added = second_edges.difference(&first_edges).cloned().collect();

    for (id, group) in &first.groups {
        match second.groups.get(id) {
            None => result.groups_removed.push(id.clone()),
            Some(other) => {
                if group.ordered != other.ordered || group.steps != other.steps {
                    result.groups_changed.push(id.clone());
                }
            }
        }
    }
    result.groups_added = second
        .groups
        .keys()
        .filter(|id| !first.groups.contains_key(id.as_str()))
        .cloned()
        .collect();

    result.segments_removed = sorted(result.segments_removed);
    result.segments_added = sorted(result.segments_added);
    result.segments_changed = sorted(result.segments_changed);
    result.groups_removed = sorted(result.groups_removed);
    result.groups_added = sorted(result.groups_added);
    result.groups_changed = sorted(result.groups_changed);

    debug!(differences = result.len(), "compared graphs");
    result
}

impl GraphDiff {
    /// Total number of differing records
    pub fn len(&self) -> usize {
        self.segments_removed.len()
            + self.segments_added.len()
            + self.segments_changed.len()
            + self.edges_removed.len()
            + self.edges_added.len()
            + self.groups_removed.len()
            + self.groups_added.len()
            + self.groups_changed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Line-oriented report: `<` first graph only, `>` second graph only,
    /// `!` present in both but different
    pub fn format_report(&self) -> String {
        let mut output = String::new();
        output.push_str("=== GFA Graph Diff ===\n\n");

        let sections = [
            (
                "Segments",
                "segment",
                &self.segments_removed,
                &self.segments_added,
                Some(&self.segments_changed),
            ),
            ("Edges", "edge", &self.edges_removed, &self.edges_added, None),
            (
                "Groups",
                "group",
                &self.groups_removed,
                &self.groups_added,
                Some(&self.groups_changed),
            ),
        ];
        for (label, _, removed, added, changed) in &sections {
            output.push_str(&format!(
                "{:<10}{:>8} removed {:>8} added {:>8} changed\n",
                format!("{}:", label),
                removed.len(),
                added.len(),
                changed.map_or(0, |c| c.len())
            ));
        }
        output.push('\n');

        if self.is_empty() {
            output.push_str("No differences\n");
            return output;
        }

        for (_, kind, removed, added, changed) in &sections {
            for item in removed.iter() {
                output.push_str(&format!("< {} {}\n", kind, item));
            }
            for item in added.iter() {
                output.push_str(&format!("> {} {}\n", kind, item));
            }
            for item in changed.iter().flat_map(|c| c.iter()) {
                output.push_str(&format!("! {} {}\n", kind, item));
            }
        }

        output
    }

    /// Export the differences as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const FIRST: &str = "H\tVN:Z:1.0\n\
                         S\t1\tACGT\n\
                         S\t2\tGG\n\
                         S\t3\tT\n\
                         L\t1\t+\t2\t+\t0M\n\
                         P\tp\t1+,2+\t0M\n\
                         P\tq\t2+\t*\n";

    const SECOND: &str = "H\tVN:Z:2.0\n\
                          S\t1\t4\tACGT\n\
                          S\t2\t2\tGC\n\
                          S\t4\t1\tA\n\
                          E\t7\t1+\t2+\t4$\t4$\t0\t0\t0M\n\
                          E\t9\t2+\t4-\t2$\t2$\t1$\t1$\t0M\n\
                          O\tp\t1+ 2+\n\
                          O\tq\t2-\n";

    #[test]
    fn test_diff_across_versions() {
        let mut first = GfaGraph::parse(Cursor::new(FIRST)).unwrap();
        let mut second: GfaGraph = SECOND.parse().unwrap();
        let result = diff(&mut first, &mut second);

        assert_eq!(result.segments_removed, vec!["3"]);
        assert_eq!(result.segments_added, vec!["4"]);
        assert_eq!(result.segments_changed, vec!["2"]);
        assert!(result.edges_removed.is_empty());
        assert_eq!(result.edges_added, vec!["2+ 4- 2$ 2$ 1$ 1$ 0M"]);
        assert!(result.groups_removed.is_empty());
        assert!(result.groups_added.is_empty());
        assert_eq!(result.groups_changed, vec!["q"]);
        assert_eq!(result.len(), 5);

        let report = result.format_report();
        assert!(report.contains("< segment 3\n"));
        assert!(report.contains("> segment 4\n"));
        assert!(report.contains("! segment 2\n"));
        assert!(report.contains("> edge 2+ 4- 2$ 2$ 1$ 1$ 0M\n"));
        assert!(report.contains("! group q\n"));
    }

    #[test]
    fn test_identical_graphs_have_no_differences() {
        let mut first = GfaGraph::parse(Cursor::new(FIRST)).unwrap();
        let mut second = first.clone();
        let result = diff(&mut first, &mut second);

        assert!(result.is_empty());
        assert!(result.format_report().contains("No differences"));
        let json = result.to_json().unwrap();
        assert!(json.contains("\"segments_added\": []"));
    }

    #[test]
    fn test_edge_ids_and_tags_are_ignored() {
        let mut first: GfaGraph = "H\tVN:Z:2.0\n\
                                   S\ta\t4\tACGT\n\
                                   S\tb\t4\tACGT\n\
                                   E\t1\ta+\tb+\t4$\t4$\t0\t0\t0M\tXX:Z:x\n"
            .parse()
            .unwrap();
        let mut second: GfaGraph = "H\tVN:Z:1.0\n\
                                    S\ta\tACGT\n\
                                    S\tb\tACGT\n\
                                    L\ta\t+\tb\t+\t0M\tID:Z:e5\n"
            .parse()
            .unwrap();
        assert!(diff(&mut first, &mut second).is_empty());
    }
}
