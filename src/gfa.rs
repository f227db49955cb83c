//! GFA graph model and parser
//!
//! [`GfaGraph`] owns one table per record kind. It is filled either by
//! [`GfaGraph::parse`] or by the `add_*` mutation calls, and carries the
//! declared version plus the bookkeeping the normalizer needs to run each
//! conversion at most once.

use crate::error::{GfaError, Result};
use crate::fasta::SequenceSource;
use crate::grammar;
use crate::record::{
    natural_cmp, numeric_id, Alignment, Containment, Edge, Fragment, Gap, GfaPath, Group, Header,
    Link, Record, Segment, Version, Walk,
};
use flate2::read::GzDecoder;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// A non-fatal condition found while normalizing, merging or validating
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Diagnostic {
    /// An edge that is neither link-like nor containment-like, dropped when
    /// writing GFA 1.0 / 0.1
    UnrepresentableEdge {
        id: String,
        source: String,
        sink: String,
    },
    /// An unordered group, which has no path equivalent
    UnorderedGroup { id: String },
    /// A fragment or gap, dropped when writing GFA 1.0 / 0.1
    UnrepresentableRecord { record: String, id: String },
    /// A segment name declared twice; the later declaration replaced the first
    DuplicateSegment { name: String },
    /// A segment present in both inputs of a merge; the first graph's copy was kept
    DuplicateMergeSegment { name: String },
    /// A record that names a segment the graph does not contain
    DanglingReference {
        record: String,
        owner: String,
        segment: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnrepresentableEdge { id, source, sink } => write!(
                f,
                "edge {} ({} -> {}) is neither a link nor a containment and cannot be written below GFA 2.0",
                id, source, sink
            ),
            Diagnostic::UnorderedGroup { id } => {
                write!(f, "group {} is unordered and has no path equivalent", id)
            }
            Diagnostic::UnrepresentableRecord { record, id } => write!(
                f,
                "{} record {} has no GFA 1.0 form and cannot be written below GFA 2.0",
                record, id
            ),
            Diagnostic::DuplicateSegment { name } => {
                write!(f, "segment {} declared more than once; keeping the last", name)
            }
            Diagnostic::DuplicateMergeSegment { name } => {
                write!(f, "segment {} present in both merged graphs; keeping the first", name)
            }
            Diagnostic::DanglingReference {
                record,
                owner,
                segment,
            } => write!(
                f,
                "{} record {} references unknown segment {}",
                record, owner, segment
            ),
        }
    }
}

impl Diagnostic {
    /// Raised by the 1.0 downgrade, which recomputes all of them on each run
    pub(crate) fn from_downgrade(&self) -> bool {
        matches!(
            self,
            Diagnostic::UnrepresentableEdge { .. }
                | Diagnostic::UnorderedGroup { .. }
                | Diagnostic::UnrepresentableRecord { .. }
        )
    }
}

/// Which conversions have already run on a graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct NormalizationState {
    pub walks_as_paths: bool,
    pub paths_as_walks: bool,
    pub upgraded: bool,
    pub downgraded: bool,
}

/// Complete GFA graph representation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GfaGraph {
    /// Declared format version
    pub version: Version,
    /// Header entries other than `VN`, in arrival order
    pub headers: Vec<Header>,
    /// Segments indexed by name
    pub segments: HashMap<String, Segment>,
    pub links: Vec<Link>,
    pub containments: Vec<Containment>,
    pub edges: Vec<Edge>,
    pub fragments: Vec<Fragment>,
    pub gaps: Vec<Gap>,
    /// Groups indexed by id
    pub groups: HashMap<String, Group>,
    /// Paths indexed by name
    pub paths: HashMap<String, GfaPath>,
    pub walks: Vec<Walk>,
    pub alignments: Vec<Alignment>,
    pub(crate) state: NormalizationState,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) last_group_id: u64,
}

impl GfaGraph {
    /// Create a new empty GFA graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a GFA file from a path; `.gz` files are decompressed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GfaError::FileNotFound(path.display().to_string()));
        }

        let reader = open_gfa_reader(path)?;
        Self::parse(reader)
    }

    /// Parse GFA from a buffered reader.
    ///
    /// The first malformed line aborts the parse. Once all lines are read,
    /// walks and paths are converted into each other so both tables are
    /// populated whichever the input used.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut graph = GfaGraph::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let record = grammar::parse_line(line, graph.version, line_num + 1)?;
            graph.add_record(record);
        }

        graph.walks_as_paths();
        graph.paths_as_walks();

        debug!(
            version = %graph.version,
            segments = graph.segments.len(),
            links = graph.links.len(),
            edges = graph.edges.len(),
            paths = graph.paths.len(),
            groups = graph.groups.len(),
            "parsed GFA graph"
        );
        Ok(graph)
    }

    /// Insert one parsed record into its table
    pub fn add_record(&mut self, record: Record) {
        match record {
            Record::Header(headers) => {
                for header in headers {
                    self.add_header(header);
                }
            }
            Record::Segment(segment) => self.add_segment(segment),
            Record::Link(link) => self.add_link(link),
            Record::Containment(containment) => self.add_containment(containment),
            Record::Edge(edge) => self.add_edge(edge),
            Record::Fragment(fragment) => self.add_fragment(fragment),
            Record::Gap(gap) => self.add_gap(gap),
            Record::Group(group) => {
                self.add_group(group);
            }
            Record::Path(path) => self.add_path(path),
            Record::Walk(walk) => self.add_walk(walk),
            Record::Alignment(alignment) => self.add_alignment(alignment),
            Record::Comment => {}
        }
    }

    /// Add a header entry. A `VN` entry with a known version sets the
    /// declared version instead of being stored.
    pub fn add_header(&mut self, header: Header) {
        if header.key == "VN" {
            if let Some(version) = Version::from_number(&header.value) {
                self.set_version(version);
                return;
            }
        }
        self.headers.push(header);
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// Add a segment, replacing any segment already declared under its name
    pub fn add_segment(&mut self, segment: Segment) {
        if self.segments.contains_key(&segment.name) {
            self.record_diagnostic(Diagnostic::DuplicateSegment {
                name: segment.name.clone(),
            });
        }
        self.segments.insert(segment.name.clone(), segment);
    }

    pub fn add_link(&mut self, link: Link) {
        self.state.upgraded = false;
        self.links.push(link);
    }

    pub fn add_containment(&mut self, containment: Containment) {
        self.state.upgraded = false;
        self.containments.push(containment);
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.state.downgraded = false;
        self.edges.push(edge);
    }

    pub fn add_fragment(&mut self, fragment: Fragment) {
        self.state.downgraded = false;
        self.fragments.push(fragment);
    }

    pub fn add_gap(&mut self, gap: Gap) {
        self.state.downgraded = false;
        self.gaps.push(gap);
    }

    /// Add a group and return its id. A group whose id is `*` is given the
    /// next unused numeric id.
    pub fn add_group(&mut self, mut group: Group) -> String {
        if group.id == "*" {
            group.id = self.next_group_id();
        }
        self.note_group_id(&group.id);
        self.state.downgraded = false;

        let id = group.id.clone();
        self.groups.insert(id.clone(), group);
        id
    }

    pub fn add_path(&mut self, path: GfaPath) {
        self.note_group_id(&path.name);
        self.state.paths_as_walks = false;
        self.state.upgraded = false;
        self.paths.insert(path.name.clone(), path);
    }

    pub fn add_walk(&mut self, walk: Walk) {
        self.note_group_id(&walk.path);
        self.state.walks_as_paths = false;
        self.state.upgraded = false;
        self.walks.push(walk);
    }

    pub fn add_alignment(&mut self, alignment: Alignment) {
        self.alignments.push(alignment);
    }

    fn note_group_id(&mut self, id: &str) {
        if let Some(n) = numeric_id(id) {
            self.last_group_id = self.last_group_id.max(n);
        }
    }

    fn next_group_id(&self) -> String {
        let mut candidate = self.last_group_id.saturating_add(1);
        while self.groups.contains_key(&candidate.to_string())
            || self.paths.contains_key(&candidate.to_string())
        {
            candidate = candidate.saturating_add(1);
        }
        candidate.to_string()
    }

    /// Recompute the group id counter after ids were rewritten
    pub(crate) fn sync_group_counter(&mut self) {
        self.last_group_id = self
            .groups
            .keys()
            .chain(self.paths.keys())
            .chain(self.walks.iter().map(|w| &w.path))
            .filter_map(|id| numeric_id(id))
            .max()
            .unwrap_or(0);
    }

    /// Record a diagnostic and log it
    pub(crate) fn record_diagnostic(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// Diagnostics recorded so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Remove and return the recorded diagnostics
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Get segment by name
    pub fn get_segment(&self, name: &str) -> Option<&Segment> {
        self.segments.get(name)
    }

    /// Segment names in natural id order
    pub fn sorted_segment_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.segments.keys().map(String::as_str).collect();
        names.sort_by(|a, b| natural_cmp(a, b));
        names
    }

    pub fn links_from<'a>(&'a self, segment: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |l| l.source == segment)
    }

    pub fn containments_from<'a>(
        &'a self,
        segment: &'a str,
    ) -> impl Iterator<Item = &'a Containment> + 'a {
        self.containments.iter().filter(move |c| c.source == segment)
    }

    pub fn edges_from<'a>(&'a self, segment: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == segment)
    }

    pub fn fragments_of<'a>(
        &'a self,
        segment: &'a str,
    ) -> impl Iterator<Item = &'a Fragment> + 'a {
        self.fragments.iter().filter(move |f| f.segment == segment)
    }

    pub fn gaps_from<'a>(&'a self, segment: &'a str) -> impl Iterator<Item = &'a Gap> + 'a {
        self.gaps.iter().filter(move |g| g.source == segment)
    }

    pub fn walks_of<'a>(&'a self, segment: &'a str) -> impl Iterator<Item = &'a Walk> + 'a {
        self.walks.iter().filter(move |w| w.segment == segment)
    }

    /// Every reference to a segment the graph does not contain.
    ///
    /// Parsing never rejects these; this check is opt-in.
    pub fn dangling_references(&self) -> Vec<Diagnostic> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        let mut check = |record: &str, owner: String, segment: &str| {
            if self.segments.contains_key(segment) {
                return;
            }
            let diagnostic = Diagnostic::DanglingReference {
                record: record.to_string(),
                owner,
                segment: segment.to_string(),
            };
            if seen.insert(diagnostic.clone()) {
                found.push(diagnostic);
            }
        };

        for l in &self.links {
            let owner = format!("{}{} -> {}{}", l.source, l.source_orientation, l.sink, l.sink_orientation);
            check("L", owner.clone(), &l.source);
            check("L", owner, &l.sink);
        }
        for c in &self.containments {
            let owner = format!("{} > {}", c.source, c.sink);
            check("C", owner.clone(), &c.source);
            check("C", owner, &c.sink);
        }
        for e in &self.edges {
            check("E", e.id.clone(), &e.source);
            check("E", e.id.clone(), &e.sink);
        }
        for f in &self.fragments {
            check("F", f.external.clone(), &f.segment);
        }
        for g in &self.gaps {
            check("G", g.id.clone(), &g.source);
            check("G", g.id.clone(), &g.sink);
        }

        let mut group_ids: Vec<&String> = self.groups.keys().collect();
        group_ids.sort_by(|a, b| natural_cmp(a, b));
        for id in group_ids {
            let group = &self.groups[id];
            let kind = if group.ordered { "O" } else { "U" };
            for step in &group.steps {
                check(kind, id.clone(), &step.segment);
            }
        }

        let mut path_names: Vec<&String> = self.paths.keys().collect();
        path_names.sort_by(|a, b| natural_cmp(a, b));
        for name in path_names {
            for step in &self.paths[name].steps {
                check("P", name.clone(), &step.segment);
            }
        }

        for w in &self.walks {
            check("W", w.path.clone(), &w.segment);
        }
        found
    }

    /// Replace placeholder sequences with text from `source`, refreshing the
    /// segment length. Returns how many segments were filled.
    pub fn fill_sequences(&mut self, source: &dyn SequenceSource) -> Result<usize> {
        let mut filled = 0;
        for segment in self.segments.values_mut() {
            if segment.has_sequence() {
                continue;
            }
            match source.sequence_for(&segment.name)? {
                Some(sequence) => {
                    segment.length = sequence.len() as u64;
                    segment.sequence = sequence;
                    filled += 1;
                }
                None => debug!(segment = %segment.name, "no sequence available"),
            }
        }
        Ok(filled)
    }

    /// Sum of declared segment lengths, saturating at `u64::MAX`
    pub fn total_sequence_length(&self) -> u64 {
        self.segments
            .values()
            .fold(0u64, |total, s| total.saturating_add(s.length))
    }

    /// Get number of segments
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

impl FromStr for GfaGraph {
    type Err = GfaError;

    fn from_str(s: &str) -> Result<Self> {
        GfaGraph::parse(s.as_bytes())
    }
}

/// Open a GFA file as a buffered reader, decompressing `.gz` files
pub fn open_gfa_reader<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path)?;

    if path.extension().map_or(false, |ext| ext == "gz") {
        return Ok(Box::new(BufReader::new(GzDecoder::new(file))));
    }

    Ok(Box::new(BufReader::new(file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Orientation, PathStep, Tag};
    use std::io::{Cursor, Write};

    const SIMPLE: &str = "H\tVN:Z:1.0\n\
                          S\t1\tACGT\n\
                          S\t2\tGGTT\n\
                          L\t1\t+\t2\t+\t4M\n\
                          P\tpath1\t1+,2+\t4M\n";

    #[test]
    fn test_parse_simple_gfa() {
        let graph = GfaGraph::parse(Cursor::new(SIMPLE)).unwrap();

        assert_eq!(graph.version, Version::V1_0);
        assert!(graph.headers.is_empty());
        assert_eq!(graph.segment_count(), 2);
        assert_eq!(graph.links.len(), 1);
        assert_eq!(graph.paths.len(), 1);
        assert_eq!(graph.total_sequence_length(), 8);

        let path = &graph.paths["path1"];
        assert_eq!(path.steps.len(), 2);
        assert_eq!(path.overlaps, vec!["4M".to_string()]);
    }

    #[test]
    fn test_paths_become_walks_at_end_of_input() {
        let graph = GfaGraph::parse(Cursor::new(SIMPLE)).unwrap();
        assert_eq!(graph.walks.len(), 2);
        assert_eq!(graph.walks[0].segment, "1");
        assert_eq!(graph.walks[0].rank, 1);
        assert_eq!(graph.walks[1].rank, 2);
    }

    #[test]
    fn test_walks_become_paths_at_end_of_input() {
        let content = "H\tVN:Z:0.1\n\
                       S\t1\tACGT\n\
                       S\t2\tGGTT\n\
                       W\t2\tchr\t2\t-\t*\n\
                       W\t1\tchr\t1\t+\t*\n";
        let graph: GfaGraph = content.parse().unwrap();
        assert_eq!(graph.version, Version::V0_1);

        let path = &graph.paths["chr"];
        assert_eq!(
            path.steps,
            vec![
                PathStep::new("1", Orientation::Forward),
                PathStep::new("2", Orientation::Reverse)
            ]
        );
        assert_eq!(graph.walks.len(), 2);
    }

    #[test]
    fn test_vn_switches_segment_layout() {
        let content = "H\tVN:Z:2.0\nS\tx\t100\t*\n";
        let graph: GfaGraph = content.parse().unwrap();
        assert_eq!(graph.version, Version::V2_0);
        assert_eq!(graph.get_segment("x").unwrap().length, 100);
    }

    #[test]
    fn test_repeated_headers_are_kept() {
        let content = "H\tVN:Z:1.0\nH\tPG:Z:one\nH\tPG:Z:two\n";
        let graph: GfaGraph = content.parse().unwrap();
        assert_eq!(
            graph.headers,
            vec![Tag::new("PG", "Z", "one"), Tag::new("PG", "Z", "two")]
        );
    }

    #[test]
    fn test_duplicate_segment_keeps_last() {
        let content = "S\t1\tACGT\nS\t1\tGG\n";
        let graph: GfaGraph = content.parse().unwrap();
        assert_eq!(graph.get_segment("1").unwrap().sequence, "GG");
        assert_eq!(
            graph.diagnostics(),
            &[Diagnostic::DuplicateSegment {
                name: "1".to_string()
            }]
        );
    }

    #[test]
    fn test_total_length_saturates() {
        let content = "H\tVN:Z:2.0\n\
                       S\ta\t10000000000000000000\t*\n\
                       S\tb\t10000000000000000000\t*\n";
        let graph: GfaGraph = content.parse().unwrap();
        assert_eq!(graph.total_sequence_length(), u64::MAX);
    }

    #[test]
    fn test_malformed_line_aborts_with_line_number() {
        let content = "S\t1\tACGT\nL\t1\t+\t2\n";
        let err = GfaGraph::parse(Cursor::new(content)).unwrap_err();
        assert!(matches!(err, GfaError::Parse { line: 2, .. }));

        let err = "S\t1\tACGT\n\nX\tfoo\n".parse::<GfaGraph>().unwrap_err();
        assert!(matches!(err, GfaError::UnknownRecord { line: 3, .. }));
    }

    #[test]
    fn test_crlf_and_comments() {
        let content = "# made by hand\r\nS\t1\tACGT\r\n";
        let graph: GfaGraph = content.parse().unwrap();
        assert_eq!(graph.get_segment("1").unwrap().sequence, "ACGT");
    }

    #[test]
    fn test_anonymous_groups_get_fresh_ids() {
        let content = "H\tVN:Z:2.0\n\
                       O\t4\t1+ 2+\n\
                       O\t*\t2+ 1-\n\
                       U\t*\t1 2\n";
        let graph: GfaGraph = content.parse().unwrap();
        assert!(graph.groups.contains_key("4"));
        assert!(graph.groups["5"].ordered);
        assert!(!graph.groups["6"].ordered);
    }

    #[test]
    fn test_adjacency_lookups() {
        let content = "S\t1\tA\nS\t2\tC\nS\t3\tG\n\
                       L\t1\t+\t2\t+\t0M\n\
                       L\t1\t+\t3\t-\t0M\n\
                       L\t2\t+\t3\t+\t0M\n\
                       C\t1\t+\t3\t+\t0\t1M\n";
        let graph: GfaGraph = content.parse().unwrap();
        assert_eq!(graph.links_from("1").count(), 2);
        assert_eq!(graph.links_from("3").count(), 0);
        assert_eq!(graph.containments_from("1").count(), 1);
        assert_eq!(graph.sorted_segment_names(), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_dangling_references_are_reported_not_rejected() {
        let content = "S\t1\tACGT\nL\t1\t+\t9\t+\t0M\nP\tp\t1+,9+,9+\t*\n";
        let graph: GfaGraph = content.parse().unwrap();
        let dangling = graph.dangling_references();
        assert_eq!(dangling.len(), 3);
        assert!(dangling.iter().all(|d| matches!(
            d,
            Diagnostic::DanglingReference { segment, .. } if segment == "9"
        )));
    }

    #[test]
    fn test_fill_sequences() {
        let content = "S\t1\t*\nS\t2\tACGT\nS\t3\t*\n";
        let mut graph: GfaGraph = content.parse().unwrap();
        let mut source = HashMap::new();
        source.insert("1".to_string(), "GATTACA".to_string());

        assert_eq!(graph.fill_sequences(&source).unwrap(), 1);
        assert_eq!(graph.get_segment("1").unwrap().length, 7);
        assert_eq!(graph.get_segment("2").unwrap().sequence, "ACGT");
        assert!(!graph.get_segment("3").unwrap().has_sequence());
    }

    #[test]
    fn test_from_file_missing() {
        let err = GfaGraph::from_file("/nonexistent/graph.gfa").unwrap_err();
        assert!(matches!(err, GfaError::FileNotFound(_)));
    }

    #[test]
    fn test_from_gz_file() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.gfa.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(SIMPLE.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let graph = GfaGraph::from_file(&path).unwrap();
        assert_eq!(graph.segment_count(), 2);
        assert_eq!(graph.links.len(), 1);
    }
}
