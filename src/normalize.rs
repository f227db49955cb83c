//! Conversions between the three revisions' representations of the same
//! graph: walks and paths, links/containments and edges, groups and paths.
//!
//! The free functions are pure one-record (or one-table) conversions. The
//! `GfaGraph` methods compose them, fill in only what the target table is
//! missing, and remember that they ran.

use crate::gfa::{Diagnostic, GfaGraph};
use crate::record::{
    natural_cmp, Containment, Edge, GfaPath, Group, Link, PathStep, Segment, Tag, Terminals, Walk,
};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// How an edge maps onto GFA 1.0 records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Link,
    Containment,
    Unrepresentable,
}

/// Classify an edge by its terminal markers.
///
/// Exactly `{source_begin, source_end}` terminal is a dovetail link; a
/// non-terminal source begin with a terminal sink end is a containment.
pub fn classify_edge(edge: &Edge) -> EdgeKind {
    match edge.terminals.flags() {
        [true, true, false, false] => EdgeKind::Link,
        [false, _, _, true] => EdgeKind::Containment,
        _ => EdgeKind::Unrepresentable,
    }
}

/// Fold walks into one path per traversal name, in first-seen order.
///
/// Walks are ordered by rank. An unranked walk (rank 0) stays after every
/// walk of its traversal that arrived before it.
pub fn walks_to_paths(walks: &[Walk]) -> Vec<GfaPath> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_name: HashMap<&str, Vec<(u64, &Walk)>> = HashMap::new();
    let mut highest: HashMap<&str, u64> = HashMap::new();

    for walk in walks {
        let name = walk.path.as_str();
        let seen = highest.entry(name).or_insert(0);
        let key = if walk.rank == 0 { *seen } else { walk.rank };
        *seen = (*seen).max(key);

        by_name
            .entry(name)
            .or_insert_with(|| {
                order.push(name);
                Vec::new()
            })
            .push((key, walk));
    }

    order
        .into_iter()
        .filter_map(|name| {
            let mut steps = by_name.remove(name)?;
            steps.sort_by_key(|(key, _)| *key);

            let overlaps: Vec<String> = steps.iter().map(|(_, w)| w.overlap.clone()).collect();
            let overlaps = if overlaps.iter().all(|o| o == "*") {
                Vec::new()
            } else {
                overlaps
            };

            Some(GfaPath {
                name: name.to_string(),
                steps: steps
                    .iter()
                    .map(|(_, w)| PathStep::new(w.segment.clone(), w.orientation))
                    .collect(),
                overlaps,
                tags: Vec::new(),
            })
        })
        .collect()
}

/// Explode a path into one ranked walk per step.
///
/// With `n` steps and `m` overlaps, the first `n - m` walks take the last
/// overlap and the remaining walks take the overlaps in order.
pub fn path_to_walks(path: &GfaPath) -> Vec<Walk> {
    let n = path.steps.len();
    let m = path.overlaps.len();
    let k = n.saturating_sub(m);
    let last = path.overlaps.last().map(String::as_str).unwrap_or("*");

    path.steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let overlap = if i < k {
                last
            } else {
                path.overlaps
                    .get(i - k)
                    .map(String::as_str)
                    .unwrap_or("*")
            };
            Walk {
                segment: step.segment.clone(),
                path: path.name.clone(),
                rank: i as u64 + 1,
                orientation: step.orientation,
                overlap: overlap.to_string(),
                tags: Vec::new(),
            }
        })
        .collect()
}

fn segment_length(segments: &HashMap<String, Segment>, name: &str) -> u64 {
    segments.get(name).map_or(0, |s| s.length)
}

/// Leading integer of a CIGAR string, e.g. `12` for `12M2I`
fn cigar_span(cigar: &str) -> Option<u64> {
    let digits: String = cigar.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Split an `ID:Z:` tag off a tag list
fn take_id_tag(tags: &[Tag]) -> (String, Vec<Tag>) {
    let mut id = "*".to_string();
    let mut rest = Vec::with_capacity(tags.len());
    for tag in tags {
        if tag.key == "ID" && id == "*" {
            id = tag.value.clone();
        } else {
            rest.push(tag.clone());
        }
    }
    (id, rest)
}

fn with_id_tag(id: &str, tags: &[Tag]) -> Vec<Tag> {
    let mut out = tags.to_vec();
    if id != "*" {
        out.push(Tag::new("ID", "Z", id));
    }
    out
}

/// A dovetail link as an edge: the source spans `[len$, len$]`, the sink `[0, 0]`
pub fn link_to_edge(link: &Link, segments: &HashMap<String, Segment>) -> Edge {
    let source_len = segment_length(segments, &link.source);
    let (id, tags) = take_id_tag(&link.tags);
    Edge {
        id,
        source: link.source.clone(),
        source_orientation: link.source_orientation,
        sink: link.sink.clone(),
        sink_orientation: link.sink_orientation,
        source_begin: source_len,
        source_end: source_len,
        sink_begin: 0,
        sink_end: 0,
        terminals: Terminals::new([true, true, false, false]),
        alignment: link.overlap.clone(),
        tags,
    }
}

/// A containment as an edge: the source spans the contained region, the
/// sink its whole length.
pub fn containment_to_edge(containment: &Containment, segments: &HashMap<String, Segment>) -> Edge {
    let source_len = segment_length(segments, &containment.source);
    let sink_len = segment_length(segments, &containment.sink);
    let span = cigar_span(&containment.overlap).unwrap_or(sink_len);
    let source_end = containment.position.saturating_add(span);
    let (id, tags) = take_id_tag(&containment.tags);
    Edge {
        id,
        source: containment.source.clone(),
        source_orientation: containment.source_orientation,
        sink: containment.sink.clone(),
        sink_orientation: containment.sink_orientation,
        source_begin: containment.position,
        source_end,
        sink_begin: 0,
        sink_end: sink_len,
        terminals: Terminals::new([false, source_len > 0 && source_end == source_len, true, true]),
        alignment: containment.overlap.clone(),
        tags,
    }
}

pub fn edge_to_link(edge: &Edge) -> Link {
    Link {
        source: edge.source.clone(),
        source_orientation: edge.source_orientation,
        sink: edge.sink.clone(),
        sink_orientation: edge.sink_orientation,
        overlap: edge.alignment.clone(),
        tags: with_id_tag(&edge.id, &edge.tags),
    }
}

pub fn edge_to_containment(edge: &Edge) -> Containment {
    Containment {
        source: edge.source.clone(),
        source_orientation: edge.source_orientation,
        sink: edge.sink.clone(),
        sink_orientation: edge.sink_orientation,
        position: edge.source_begin,
        overlap: edge.alignment.clone(),
        tags: with_id_tag(&edge.id, &edge.tags),
    }
}

/// An ordered group as a path; unordered groups have none
pub fn group_to_path(group: &Group) -> Option<GfaPath> {
    if !group.ordered {
        return None;
    }
    Some(GfaPath {
        name: group.id.clone(),
        steps: group.steps.clone(),
        overlaps: Vec::new(),
        tags: group.tags.clone(),
    })
}

pub fn path_to_group(path: &GfaPath) -> Group {
    Group {
        id: path.name.clone(),
        ordered: true,
        steps: path.steps.clone(),
        tags: path.tags.clone(),
    }
}

fn canonical_link(mut link: Link) -> Link {
    link.tags.sort();
    link
}

fn canonical_containment(mut containment: Containment) -> Containment {
    containment.tags.sort();
    containment
}

impl GfaGraph {
    /// Build paths for walk traversals that have no path of the same name
    pub fn walks_as_paths(&mut self) {
        if self.state.walks_as_paths {
            return;
        }
        self.state.walks_as_paths = true;
        if self.walks.is_empty() {
            return;
        }

        let mut added = 0;
        for path in walks_to_paths(&self.walks) {
            if !self.paths.contains_key(&path.name) {
                self.paths.insert(path.name.clone(), path);
                added += 1;
            }
        }
        if added > 0 {
            self.state.paths_as_walks = false;
            self.state.upgraded = false;
        }
        debug!(added, "folded walks into paths");
    }

    /// Build walks for paths that have no walk traversal of the same name
    pub fn paths_as_walks(&mut self) {
        if self.state.paths_as_walks {
            return;
        }
        self.state.paths_as_walks = true;
        if self.paths.is_empty() {
            return;
        }

        let walked: HashSet<&str> = self.walks.iter().map(|w| w.path.as_str()).collect();
        let mut names: Vec<&String> = self
            .paths
            .keys()
            .filter(|name| !walked.contains(name.as_str()))
            .collect();
        names.sort_by(|a, b| natural_cmp(a, b));

        let new_walks: Vec<Walk> = names
            .into_iter()
            .flat_map(|name| path_to_walks(&self.paths[name]))
            .collect();
        debug!(added = new_walks.len(), "exploded paths into walks");
        self.walks.extend(new_walks);
    }

    /// Make the graph complete as GFA 2.0: edges for every link and
    /// containment, and an ordered group for every path.
    pub fn upgrade_to_v2(&mut self) {
        if self.state.upgraded {
            return;
        }
        self.walks_as_paths();

        let mut known_links = HashSet::new();
        let mut known_containments = HashSet::new();
        for edge in &self.edges {
            match classify_edge(edge) {
                EdgeKind::Link => {
                    known_links.insert(canonical_link(edge_to_link(edge)));
                }
                EdgeKind::Containment => {
                    known_containments.insert(canonical_containment(edge_to_containment(edge)));
                }
                EdgeKind::Unrepresentable => {}
            }
        }

        let mut new_edges = Vec::new();
        for link in &self.links {
            if known_links.insert(canonical_link(link.clone())) {
                new_edges.push(link_to_edge(link, &self.segments));
            }
        }
        for containment in &self.containments {
            if known_containments.insert(canonical_containment(containment.clone())) {
                new_edges.push(containment_to_edge(containment, &self.segments));
            }
        }

        let mut names: Vec<&String> = self
            .paths
            .keys()
            .filter(|name| !self.groups.contains_key(name.as_str()))
            .collect();
        names.sort_by(|a, b| natural_cmp(a, b));
        let new_groups: Vec<Group> = names
            .into_iter()
            .map(|name| path_to_group(&self.paths[name]))
            .collect();

        debug!(
            edges = new_edges.len(),
            groups = new_groups.len(),
            "upgraded graph to GFA 2.0"
        );
        self.edges.extend(new_edges);
        for group in new_groups {
            self.groups.insert(group.id.clone(), group);
        }
        self.state.upgraded = true;
    }

    /// Make the graph complete as GFA 1.0: links and containments for every
    /// representable edge, and a path for every ordered group. Edges, groups,
    /// fragments and gaps without an equivalent are recorded as diagnostics,
    /// replacing those of any earlier downgrade.
    pub fn downgrade_to_v1(&mut self) {
        if self.state.downgraded {
            return;
        }

        let mut known_links: HashSet<Link> =
            self.links.iter().cloned().map(canonical_link).collect();
        let mut known_containments: HashSet<Containment> = self
            .containments
            .iter()
            .cloned()
            .map(canonical_containment)
            .collect();

        let mut new_links = Vec::new();
        let mut new_containments = Vec::new();
        let mut diagnostics = Vec::new();
        for edge in &self.edges {
            match classify_edge(edge) {
                EdgeKind::Link => {
                    let link = edge_to_link(edge);
                    if known_links.insert(canonical_link(link.clone())) {
                        new_links.push(link);
                    }
                }
                EdgeKind::Containment => {
                    let containment = edge_to_containment(edge);
                    if known_containments.insert(canonical_containment(containment.clone())) {
                        new_containments.push(containment);
                    }
                }
                EdgeKind::Unrepresentable => diagnostics.push(Diagnostic::UnrepresentableEdge {
                    id: edge.id.clone(),
                    source: edge.source.clone(),
                    sink: edge.sink.clone(),
                }),
            }
        }

        let mut ids: Vec<&String> = self.groups.keys().collect();
        ids.sort_by(|a, b| natural_cmp(a, b));
        let mut new_paths = Vec::new();
        for id in ids {
            let group = &self.groups[id];
            match group_to_path(group) {
                Some(path) => {
                    if !self.paths.contains_key(id.as_str()) {
                        new_paths.push(path);
                    }
                }
                None => diagnostics.push(Diagnostic::UnorderedGroup { id: id.clone() }),
            }
        }

        debug!(
            links = new_links.len(),
            containments = new_containments.len(),
            paths = new_paths.len(),
            "downgraded graph to GFA 1.0"
        );
        self.links.extend(new_links);
        self.containments.extend(new_containments);
        if !new_paths.is_empty() {
            self.state.paths_as_walks = false;
        }
        for path in new_paths {
            self.paths.insert(path.name.clone(), path);
        }
        for f in &self.fragments {
            diagnostics.push(Diagnostic::UnrepresentableRecord {
                record: "F".to_string(),
                id: format!("{} on {}", f.external, f.segment),
            });
        }
        for g in &self.gaps {
            diagnostics.push(Diagnostic::UnrepresentableRecord {
                record: "G".to_string(),
                id: format!("{} ({} -> {})", g.id, g.source, g.sink),
            });
        }

        self.diagnostics.retain(|d| !d.from_downgrade());
        for diagnostic in diagnostics {
            self.record_diagnostic(diagnostic);
        }
        self.state.downgraded = true;
    }
}
