//! Statistics computation for GFA graphs

use crate::gfa::GfaGraph;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Statistics about a GFA graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GfaStats {
    /// Declared format version
    pub version: String,
    /// Total number of segments (nodes)
    pub segment_count: usize,
    pub link_count: usize,
    pub containment_count: usize,
    pub edge_count: usize,
    pub fragment_count: usize,
    pub gap_count: usize,
    pub group_count: usize,
    pub path_count: usize,
    pub walk_count: usize,
    /// Total declared length across all segments
    pub total_sequence_length: u64,
    /// Average segment length
    pub average_segment_length: f64,
    /// Minimum segment length
    pub min_segment_length: u64,
    /// Maximum segment length
    pub max_segment_length: u64,
    /// N50 of segment lengths
    pub n50: u64,
    /// Number of segments at or above the N50
    pub l50: usize,
    /// N90 of segment lengths
    pub n90: u64,
    pub l90: usize,
    /// GC content percentage over sequences present in the file
    pub gc_content: f64,
    /// Segments with a `*` sequence
    pub placeholder_sequences: usize,
    /// Number of connected components over links, containments and edges
    pub connected_components: usize,
    /// Segment length histogram (binned)
    pub segment_length_histogram: Vec<(String, usize)>,
}

impl GfaStats {
    /// Compute statistics from a GFA graph
    pub fn from_graph(graph: &GfaGraph) -> Self {
        let segment_lengths: Vec<u64> = graph.segments.values().map(|s| s.length).collect();

        let (min_segment_length, max_segment_length, average_segment_length) =
            match (segment_lengths.iter().min(), segment_lengths.iter().max()) {
                (Some(&min), Some(&max)) => {
                    let sum: u128 = segment_lengths.iter().map(|&l| u128::from(l)).sum();
                    (min, max, sum as f64 / segment_lengths.len() as f64)
                }
                _ => (0, 0, 0.0),
            };

        let (n50, l50) = compute_nx(&segment_lengths, 50);
        let (n90, l90) = compute_nx(&segment_lengths, 90);

        GfaStats {
            version: graph.version.to_string(),
            segment_count: graph.segment_count(),
            link_count: graph.links.len(),
            containment_count: graph.containments.len(),
            edge_count: graph.edges.len(),
            fragment_count: graph.fragments.len(),
            gap_count: graph.gaps.len(),
            group_count: graph.groups.len(),
            path_count: graph.paths.len(),
            walk_count: graph.walks.len(),
            total_sequence_length: graph.total_sequence_length(),
            average_segment_length,
            min_segment_length,
            max_segment_length,
            n50,
            l50,
            n90,
            l90,
            gc_content: compute_gc_content(graph),
            placeholder_sequences: graph.segments.values().filter(|s| !s.has_sequence()).count(),
            connected_components: compute_connected_components(graph),
            segment_length_histogram: compute_length_histogram(&segment_lengths),
        }
    }

    /// Format statistics as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut output = String::new();
        output.push_str("=== GFA Graph Statistics ===\n\n");

        output.push_str(&format!("GFA version:             {:>12}\n", self.version));
        output.push_str(&format!(
            "Segments (nodes):        {:>12}\n",
            self.segment_count
        ));
        let tables = [
            ("Links:", self.link_count),
            ("Containments:", self.containment_count),
            ("Edges:", self.edge_count),
            ("Fragments:", self.fragment_count),
            ("Gaps:", self.gap_count),
            ("Groups:", self.group_count),
            ("Paths:", self.path_count),
            ("Walks:", self.walk_count),
        ];
        for (label, count) in tables {
            if count > 0 {
                output.push_str(&format!("{:<25}{:>12}\n", label, count));
            }
        }
        output.push_str(&format!(
            "Connected components:    {:>12}\n",
            self.connected_components
        ));
        output.push('\n');

        output.push_str("--- Sequence Statistics ---\n");
        output.push_str(&format!(
            "Total sequence length:   {:>12} bp\n",
            self.total_sequence_length
        ));
        output.push_str(&format!(
            "Average segment length:  {:>12.2} bp\n",
            self.average_segment_length
        ));
        output.push_str(&format!(
            "Min segment length:      {:>12} bp\n",
            self.min_segment_length
        ));
        output.push_str(&format!(
            "Max segment length:      {:>12} bp\n",
            self.max_segment_length
        ));
        output.push_str(&format!("N50:                     {:>12} bp\n", self.n50));
        output.push_str(&format!("L50:                     {:>12}\n", self.l50));
        output.push_str(&format!("N90:                     {:>12} bp\n", self.n90));
        output.push_str(&format!("L90:                     {:>12}\n", self.l90));
        output.push_str(&format!(
            "GC content:              {:>12.2}%\n",
            self.gc_content
        ));
        if self.placeholder_sequences > 0 {
            output.push_str(&format!(
                "Placeholder sequences:   {:>12}\n",
                self.placeholder_sequences
            ));
        }
        output.push('\n');

        output.push_str("--- Segment Length Distribution ---\n");
        for (bin, count) in &self.segment_length_histogram {
            if *count > 0 {
                output.push_str(&format!("{:>15}: {:>8}\n", bin, count));
            }
        }

        output
    }

    /// Export statistics as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Nx and Lx for `percent` of the total length
fn compute_nx(lengths: &[u64], percent: u64) -> (u64, usize) {
    if lengths.is_empty() {
        return (0, 0);
    }

    let mut sorted: Vec<u64> = lengths.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    let total: u128 = sorted.iter().map(|&l| u128::from(l)).sum();
    let target = (total * u128::from(percent) + 99) / 100;

    let mut cumsum: u128 = 0;
    for (i, len) in sorted.iter().enumerate() {
        cumsum += u128::from(*len);
        if cumsum >= target {
            return (*len, i + 1);
        }
    }

    (0, 0)
}

fn compute_gc_content(graph: &GfaGraph) -> f64 {
    let mut gc_count: u64 = 0;
    let mut total_count: u64 = 0;

    for segment in graph.segments.values().filter(|s| s.has_sequence()) {
        for c in segment.sequence.bytes() {
            match c.to_ascii_uppercase() {
                b'G' | b'C' => {
                    gc_count += 1;
                    total_count += 1;
                }
                b'A' | b'T' => {
                    total_count += 1;
                }
                _ => {}
            }
        }
    }

    if total_count == 0 {
        0.0
    } else {
        (gc_count as f64 / total_count as f64) * 100.0
    }
}

fn compute_connected_components(graph: &GfaGraph) -> usize {
    if graph.segments.is_empty() {
        return 0;
    }

    let mut adjacency: HashMap<&str, HashSet<&str>> = HashMap::new();
    for segment in graph.segments.keys() {
        adjacency.insert(segment.as_str(), HashSet::new());
    }

    let pairs = graph
        .links
        .iter()
        .map(|l| (l.source.as_str(), l.sink.as_str()))
        .chain(
            graph
                .containments
                .iter()
                .map(|c| (c.source.as_str(), c.sink.as_str())),
        )
        .chain(graph.edges.iter().map(|e| (e.source.as_str(), e.sink.as_str())));
    for (a, b) in pairs {
        if adjacency.contains_key(a) && adjacency.contains_key(b) {
            adjacency.entry(a).or_default().insert(b);
            adjacency.entry(b).or_default().insert(a);
        }
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut components = 0;
    let mut stack = Vec::new();

    for segment in graph.segments.keys() {
        if !visited.insert(segment.as_str()) {
            continue;
        }
        components += 1;
        stack.push(segment.as_str());
        while let Some(node) = stack.pop() {
            if let Some(neighbors) = adjacency.get(node) {
                for &neighbor in neighbors {
                    if visited.insert(neighbor) {
                        stack.push(neighbor);
                    }
                }
            }
        }
    }

    components
}

fn compute_length_histogram(lengths: &[u64]) -> Vec<(String, usize)> {
    let bins = [
        (0, 100, "0-100"),
        (100, 500, "100-500"),
        (500, 1000, "500-1K"),
        (1000, 5000, "1K-5K"),
        (5000, 10000, "5K-10K"),
        (10000, 50000, "10K-50K"),
        (50000, 100000, "50K-100K"),
        (100000, 500000, "100K-500K"),
        (500000, 1000000, "500K-1M"),
        (1000000, u64::MAX, ">1M"),
    ];

    let mut histogram: Vec<(String, usize)> = bins
        .iter()
        .map(|(_, _, label)| (label.to_string(), 0))
        .collect();

    for &len in lengths {
        if let Some(i) = bins
            .iter()
            .position(|(min, max, _)| len >= *min && (len < *max || *max == u64::MAX))
        {
            histogram[i].1 += 1;
        }
    }

    histogram
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn create_test_graph() -> GfaGraph {
        let gfa_content = "H\tVN:Z:1.0\n\
                          S\ts1\tACGTACGT\n\
                          S\ts2\tGGGGGGGG\n\
                          S\ts3\tTTTTTTTT\n\
                          S\ts4\t*\tLN:i:200\n\
                          L\ts1\t+\ts2\t+\t0M\n\
                          L\ts2\t+\ts3\t+\t0M\n\
                          P\tpath1\ts1+,s2+,s3+\t*\n";
        GfaGraph::parse(Cursor::new(gfa_content)).unwrap()
    }

    #[test]
    fn test_basic_stats() {
        let graph = create_test_graph();
        let stats = GfaStats::from_graph(&graph);

        assert_eq!(stats.version, "1.0");
        assert_eq!(stats.segment_count, 4);
        assert_eq!(stats.link_count, 2);
        assert_eq!(stats.path_count, 1);
        assert_eq!(stats.walk_count, 3);
        assert_eq!(stats.total_sequence_length, 224);
        assert_eq!(stats.min_segment_length, 8);
        assert_eq!(stats.max_segment_length, 200);
        assert_eq!(stats.placeholder_sequences, 1);
    }

    #[test]
    fn test_gc_content() {
        let graph = create_test_graph();
        let stats = GfaStats::from_graph(&graph);

        // 12 GC bases out of 24 called bases; s4 has no sequence
        assert!((stats.gc_content - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_nx() {
        let lengths = vec![10, 20, 30, 40, 50];
        // Total = 150; 50% needs 75 (50 + 40), 90% needs 135 (50 + 40 + 30 + 20)
        assert_eq!(compute_nx(&lengths, 50), (40, 2));
        assert_eq!(compute_nx(&lengths, 90), (20, 4));
        assert_eq!(compute_nx(&[], 50), (0, 0));
    }

    #[test]
    fn test_huge_lengths_do_not_overflow() {
        let content = "H\tVN:Z:2.0\n\
                       S\ta\t10000000000000000000\t*\n\
                       S\tb\t10000000000000000000\t*\n";
        let graph: GfaGraph = content.parse().unwrap();
        let stats = GfaStats::from_graph(&graph);

        assert_eq!(stats.total_sequence_length, u64::MAX);
        assert_eq!(stats.n50, 10_000_000_000_000_000_000);
        assert_eq!(stats.l50, 1);
        assert_eq!(stats.l90, 2);
        assert!((stats.average_segment_length - 1e19).abs() < 1e4);
    }

    #[test]
    fn test_connected_components() {
        let graph = create_test_graph();
        let stats = GfaStats::from_graph(&graph);
        // s1-s2-s3 plus the isolated s4
        assert_eq!(stats.connected_components, 2);
    }

    #[test]
    fn test_components_follow_edges() {
        let content = "H\tVN:Z:2.0\n\
                       S\ta\t4\tACGT\n\
                       S\tb\t4\tACGT\n\
                       E\t*\ta+\tb+\t4$\t4$\t0\t0\t0M\n";
        let graph: GfaGraph = content.parse().unwrap();
        let stats = GfaStats::from_graph(&graph);
        assert_eq!(stats.connected_components, 1);
        assert_eq!(stats.edge_count, 1);
    }

    #[test]
    fn test_json_and_summary() {
        let stats = GfaStats::from_graph(&create_test_graph());
        let json = stats.to_json().unwrap();
        assert!(json.contains("\"n50\": 200"));
        let summary = stats.format_summary();
        assert!(summary.contains("N50:"));
        assert!(summary.contains("Walks:"));
        assert!(!summary.contains("Fragments:"));
    }
}
