//! Id-range subgraphs
//!
//! A subset keeps the segments whose numeric id falls inside an inclusive
//! range, plus the records that only touch those segments. The result is
//! always a GFA 2.0 graph; segments with non-numeric names are never kept.

use crate::gfa::GfaGraph;
use crate::record::{numeric_id, Group, Version};
use std::collections::HashSet;
use tracing::debug;

impl GfaGraph {
    /// The GFA 2.0 subgraph induced by segments with `start <= id <= end`.
    ///
    /// Edges and gaps survive when both ends are kept, fragments when their
    /// segment is. Groups keep only their steps on kept segments; a group left
    /// with no steps is dropped. Headers are copied as they are.
    pub fn subset(&mut self, start: u64, end: u64) -> GfaGraph {
        self.upgrade_to_v2();

        let in_range =
            |name: &str| matches!(numeric_id(name), Some(n) if n >= start && n <= end);
        let kept: HashSet<&str> = self
            .segments
            .keys()
            .map(String::as_str)
            .filter(|&name| in_range(name))
            .collect();

        let mut sub = GfaGraph::new();
        sub.set_version(Version::V2_0);
        for header in &self.headers {
            sub.add_header(header.clone());
        }
        for name in self.sorted_segment_names() {
            if kept.contains(name) {
                sub.add_segment(self.segments[name].clone());
            }
        }

        for edge in &self.edges {
            if kept.contains(edge.source.as_str()) && kept.contains(edge.sink.as_str()) {
                sub.add_edge(edge.clone());
            }
        }
        for fragment in &self.fragments {
            if kept.contains(fragment.segment.as_str()) {
                sub.add_fragment(fragment.clone());
            }
        }
        for gap in &self.gaps {
            if kept.contains(gap.source.as_str()) && kept.contains(gap.sink.as_str()) {
                sub.add_gap(gap.clone());
            }
        }

        let mut dropped_groups = 0;
        for group in self.groups.values() {
            let steps: Vec<_> = group
                .steps
                .iter()
                .filter(|step| kept.contains(step.segment.as_str()))
                .cloned()
                .collect();
            if steps.is_empty() {
                dropped_groups += 1;
                continue;
            }
            sub.add_group(Group {
                id: group.id.clone(),
                ordered: group.ordered,
                steps,
                tags: group.tags.clone(),
            });
        }

        debug!(
            start,
            end,
            segments = sub.segments.len(),
            edges = sub.edges.len(),
            groups = sub.groups.len(),
            dropped_groups,
            "extracted subgraph"
        );
        sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Orientation, PathStep};
    use crate::writer::OutputOrder;
    use std::io::Cursor;

    const CHAIN: &str = "H\tVN:Z:1.0\n\
                         H\tPN:Z:chain\n\
                         S\t1\tACGT\n\
                         S\t2\tGG\n\
                         S\t3\tTTT\n\
                         S\t4\tA\n\
                         S\tx\tC\n\
                         L\t1\t+\t2\t+\t0M\n\
                         L\t2\t+\t3\t-\t1M\n\
                         L\t3\t+\t4\t+\t0M\n\
                         L\tx\t+\t2\t+\t0M\n\
                         P\tp\t1+,2+,3-,4+\t0M,1M,0M\n";

    #[test]
    fn test_subset_of_v1_chain() {
        let mut graph = GfaGraph::parse(Cursor::new(CHAIN)).unwrap();
        let sub = graph.subset(2, 3);

        assert_eq!(sub.version, Version::V2_0);
        assert_eq!(sub.sorted_segment_names(), vec!["2", "3"]);
        assert_eq!(sub.edges.len(), 1);
        assert_eq!((sub.edges[0].source.as_str(), sub.edges[0].sink.as_str()), ("2", "3"));
        assert_eq!(
            sub.groups["p"].steps,
            vec![
                PathStep::new("2", Orientation::Forward),
                PathStep::new("3", Orientation::Reverse),
            ]
        );
        assert!(sub.links.is_empty());
        assert_eq!(sub.headers.len(), 1);
        assert!(sub.dangling_references().is_empty());
    }

    #[test]
    fn test_subset_filters_fragments_gaps_and_groups() {
        let content = "H\tVN:Z:2.0\n\
                       S\t1\t4\tACGT\n\
                       S\t2\t4\tACGT\n\
                       S\t3\t4\tACGT\n\
                       F\t1\tread1+\t0\t4$\t0\t4\t*\n\
                       F\t2\tread2-\t0\t2\t5\t7\t*\n\
                       G\tg1\t2+\t3+\t10\n\
                       G\tg2\t1+\t3-\t20\n\
                       U\tu1\t1\n\
                       U\tu2\t1 3\n";
        let mut graph: GfaGraph = content.parse().unwrap();
        let mut sub = graph.subset(2, 10);

        assert_eq!(sub.segment_count(), 2);
        assert_eq!(sub.fragments.len(), 1);
        assert_eq!(sub.fragments[0].external, "read2");
        assert_eq!(sub.gaps.len(), 1);
        assert_eq!(sub.gaps[0].id, "g1");
        assert!(!sub.groups.contains_key("u1"));
        assert_eq!(sub.groups["u2"].steps, vec![PathStep::new("3", Orientation::Forward)]);

        let text = sub.to_text(Version::V2_0, OutputOrder::Block);
        let reparsed: GfaGraph = text.parse().unwrap();
        assert_eq!(reparsed.segment_count(), 2);
        assert_eq!(reparsed.gaps.len(), 1);
    }

    #[test]
    fn test_empty_range_gives_empty_graph() {
        let mut graph = GfaGraph::parse(Cursor::new(CHAIN)).unwrap();
        let sub = graph.subset(10, 20);
        assert_eq!(sub.segment_count(), 0);
        assert!(sub.edges.is_empty());
        assert!(sub.groups.is_empty());
    }
}
