//! Numeric identifier bookkeeping for combining graphs
//!
//! Each graph has five id categories: segments, edges, fragments, gaps and
//! groups (paths and walk traversals share the group category). Link and
//! containment `ID` tags count as edge ids. Any all-digit id takes part;
//! leading zeros are kept in front of the shifted number, so `007` shifted
//! by 5 becomes `0012` and never meets a shifted `7` or `07`. Every other
//! name is left alone.

use crate::error::{GfaError, Result};
use crate::gfa::{Diagnostic, GfaGraph};
use crate::record::{natural_cmp, numeric_id, Tag};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Highest numeric id per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdOffsets {
    pub segment: u64,
    pub edge: u64,
    pub fragment: u64,
    pub gap: u64,
    pub group: u64,
}

impl IdOffsets {
    /// Component-wise maximum
    pub fn max(self, other: IdOffsets) -> IdOffsets {
        IdOffsets {
            segment: self.segment.max(other.segment),
            edge: self.edge.max(other.edge),
            fragment: self.fragment.max(other.fragment),
            gap: self.gap.max(other.gap),
            group: self.group.max(other.group),
        }
    }
}

impl fmt::Display for IdOffsets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.segment, self.edge, self.fragment, self.gap, self.group
        )
    }
}

impl FromStr for IdOffsets {
    type Err = GfaError;

    /// Parse `segment:edge:fragment:gap:group`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            GfaError::InvalidInput(format!(
                "Invalid id offsets: {}. Expected five colon-separated integers",
                s
            ))
        };
        let values: Vec<u64> = s
            .split(':')
            .map(|part| part.trim().parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<_>>()?;
        match values.as_slice() {
            [segment, edge, fragment, gap, group] => Ok(IdOffsets {
                segment: *segment,
                edge: *edge,
                fragment: *fragment,
                gap: *gap,
                group: *group,
            }),
            _ => Err(invalid()),
        }
    }
}

/// Leading-zero prefix and numeric value of an all-digit id; the last digit
/// always belongs to the number, so `"00"` splits as `("0", 0)`
fn split_numeric(id: &str) -> Option<(&str, u64)> {
    let n = numeric_id(id)?;
    let zeros = id.len() - id.trim_start_matches('0').len();
    Some((&id[..zeros.min(id.len() - 1)], n))
}

fn fold_max<'a>(ids: impl Iterator<Item = &'a str>) -> u64 {
    ids.filter_map(numeric_id).max().unwrap_or(0)
}

fn id_tags<'a>(tags: &'a [Tag]) -> impl Iterator<Item = &'a str> {
    tags.iter()
        .filter(|t| t.key == "ID")
        .map(|t| t.value.as_str())
}

/// Edge ids, including the `ID` tags of links and containments
fn edge_ids(graph: &GfaGraph) -> impl Iterator<Item = &str> {
    graph
        .edges
        .iter()
        .map(|e| e.id.as_str())
        .chain(graph.links.iter().flat_map(|l| id_tags(&l.tags)))
        .chain(graph.containments.iter().flat_map(|c| id_tags(&c.tags)))
}

/// Scan a graph for its highest numeric id in each category
pub fn compute_offsets(graph: &GfaGraph) -> IdOffsets {
    IdOffsets {
        segment: fold_max(graph.segments.keys().map(String::as_str)),
        edge: fold_max(edge_ids(graph)),
        fragment: fold_max(graph.fragments.iter().map(|f| f.external.as_str())),
        gap: fold_max(graph.gaps.iter().map(|g| g.id.as_str())),
        group: fold_max(
            graph
                .groups
                .keys()
                .chain(graph.paths.keys())
                .map(String::as_str)
                .chain(graph.walks.iter().map(|w| w.path.as_str())),
        ),
    }
}

fn fold_min<'a>(ids: impl Iterator<Item = &'a str>) -> Option<u64> {
    ids.filter_map(numeric_id).min()
}

/// Adds a fixed amount to every numeric id of one category
struct Shift {
    by: u64,
    category: &'static str,
}

impl Shift {
    /// Shift ids past `base`; a category that uses id 0 moves one further so
    /// its 0 cannot land on `base` itself.
    fn new(base: u64, lowest: Option<u64>, category: &'static str) -> Self {
        let by = match lowest {
            Some(0) => base.saturating_add(1),
            _ => base,
        };
        Shift { by, category }
    }

    fn apply(&self, id: &mut String) -> Result<()> {
        if self.by == 0 {
            return Ok(());
        }
        if let Some((zeros, n)) = split_numeric(id) {
            let shifted = n.checked_add(self.by).ok_or_else(|| {
                GfaError::InvalidInput(format!(
                    "{} id {} overflows when offset by {}",
                    self.category, id, self.by
                ))
            })?;
            let renamed = format!("{}{}", zeros, shifted);
            *id = renamed;
        }
        Ok(())
    }

    fn apply_id_tags(&self, tags: &mut [Tag]) -> Result<()> {
        for tag in tags.iter_mut().filter(|t| t.key == "ID") {
            self.apply(&mut tag.value)?;
        }
        Ok(())
    }

    fn rekey<V>(
        &self,
        table: HashMap<String, V>,
        mut name_of: impl FnMut(&mut V) -> &mut String,
    ) -> Result<HashMap<String, V>> {
        let mut out = HashMap::with_capacity(table.len());
        for (mut key, mut value) in table {
            self.apply(&mut key)?;
            self.apply(name_of(&mut value))?;
            out.insert(key, value);
        }
        Ok(out)
    }
}

/// Shift every numeric id of `graph` past `base`, in primary keys and in all
/// cross-references. Returns the component-wise maximum of `base` and the
/// graph's new highest ids, ready to pass to the next graph.
///
/// Fails when a shifted id would not fit in a `u64`; the graph is then left
/// partly rewritten and should be discarded.
pub fn reidentify(graph: &mut GfaGraph, base: IdOffsets) -> Result<IdOffsets> {
    let seg = Shift::new(
        base.segment,
        fold_min(graph.segments.keys().map(String::as_str)),
        "segment",
    );
    let edge = Shift::new(base.edge, fold_min(edge_ids(graph)), "edge");
    let frag = Shift::new(
        base.fragment,
        fold_min(graph.fragments.iter().map(|f| f.external.as_str())),
        "fragment",
    );
    let gap = Shift::new(
        base.gap,
        fold_min(graph.gaps.iter().map(|g| g.id.as_str())),
        "gap",
    );
    let group = Shift::new(
        base.group,
        fold_min(
            graph
                .groups
                .keys()
                .chain(graph.paths.keys())
                .map(String::as_str)
                .chain(graph.walks.iter().map(|w| w.path.as_str())),
        ),
        "group",
    );

    let segments = std::mem::take(&mut graph.segments);
    graph.segments = seg.rekey(segments, |s| &mut s.name)?;

    for l in &mut graph.links {
        seg.apply(&mut l.source)?;
        seg.apply(&mut l.sink)?;
        edge.apply_id_tags(&mut l.tags)?;
    }
    for c in &mut graph.containments {
        seg.apply(&mut c.source)?;
        seg.apply(&mut c.sink)?;
        edge.apply_id_tags(&mut c.tags)?;
    }
    for e in &mut graph.edges {
        edge.apply(&mut e.id)?;
        seg.apply(&mut e.source)?;
        seg.apply(&mut e.sink)?;
    }
    for f in &mut graph.fragments {
        seg.apply(&mut f.segment)?;
        frag.apply(&mut f.external)?;
    }
    for g in &mut graph.gaps {
        gap.apply(&mut g.id)?;
        seg.apply(&mut g.source)?;
        seg.apply(&mut g.sink)?;
    }
    for w in &mut graph.walks {
        seg.apply(&mut w.segment)?;
        group.apply(&mut w.path)?;
    }
    for a in &mut graph.alignments {
        seg.apply(&mut a.source)?;
    }

    let groups = std::mem::take(&mut graph.groups);
    graph.groups = group.rekey(groups, |g| &mut g.id)?;
    for g in graph.groups.values_mut() {
        for step in &mut g.steps {
            seg.apply(&mut step.segment)?;
        }
    }

    let paths = std::mem::take(&mut graph.paths);
    graph.paths = group.rekey(paths, |p| &mut p.name)?;
    for p in graph.paths.values_mut() {
        for step in &mut p.steps {
            seg.apply(&mut step.segment)?;
        }
    }

    graph.sync_group_counter();
    let next = compute_offsets(graph).max(base);
    debug!(
        segment = seg.by,
        edge = edge.by,
        fragment = frag.by,
        gap = gap.by,
        group = group.by,
        next = %next,
        "reidentified graph"
    );
    Ok(next)
}

/// Merge `b` into `a` after moving `b`'s numeric ids past `a`'s.
///
/// Segments still colliding by name (non-numeric names) keep `a`'s copy.
/// Paths and groups are added when `a` has none of the same name.
pub fn merge(a: GfaGraph, mut b: GfaGraph) -> Result<GfaGraph> {
    reidentify(&mut b, compute_offsets(&a))?;

    let mut merged = a;
    merged.version = merged.version.max(b.version);

    for header in b.headers {
        if !merged.headers.contains(&header) {
            merged.headers.push(header);
        }
    }

    let mut incoming: Vec<_> = b.segments.into_iter().collect();
    incoming.sort_by(|x, y| natural_cmp(&x.0, &y.0));
    for (name, segment) in incoming {
        if merged.segments.contains_key(&name) {
            merged.record_diagnostic(Diagnostic::DuplicateMergeSegment { name });
        } else {
            merged.segments.insert(name, segment);
        }
    }

    merged.links.extend(b.links);
    merged.containments.extend(b.containments);
    merged.edges.extend(b.edges);
    merged.fragments.extend(b.fragments);
    merged.gaps.extend(b.gaps);
    merged.walks.extend(b.walks);
    merged.alignments.extend(b.alignments);
    for (name, path) in b.paths {
        merged.paths.entry(name).or_insert(path);
    }
    for (id, group) in b.groups {
        merged.groups.entry(id).or_insert(group);
    }

    merged.state = Default::default();
    for diagnostic in b.diagnostics {
        merged.record_diagnostic(diagnostic);
    }
    merged.sync_group_counter();
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Version;
    use std::collections::HashSet;

    const A: &str = "H\tVN:Z:1.0\n\
                     S\t1\tACGT\n\
                     S\t2\tGGTT\n\
                     S\tref\tTT\n\
                     L\t1\t+\t2\t+\t0M\n\
                     P\t1\t1+,2+\t0M\n";

    const B: &str = "H\tVN:Z:2.0\n\
                     S\t1\t4\tCCCC\n\
                     S\t3\t2\tAA\n\
                     S\tref\t2\tGG\n\
                     E\t1\t1+\t3+\t4$\t4$\t0\t0\t0M\n\
                     F\t1\t5+\t0\t4$\t0\t4\t*\n\
                     G\t2\t1+\t3-\t10\n\
                     O\t*\t1+ 3+\n";

    #[test]
    fn test_compute_offsets() {
        let a: GfaGraph = A.parse().unwrap();
        assert_eq!(
            compute_offsets(&a),
            IdOffsets {
                segment: 2,
                edge: 0,
                fragment: 0,
                gap: 0,
                group: 1
            }
        );

        let b: GfaGraph = B.parse().unwrap();
        let offsets = compute_offsets(&b);
        assert_eq!(offsets.to_string(), "3:1:5:2:1");
    }

    #[test]
    fn test_offsets_from_str() {
        let offsets: IdOffsets = "10:0:3:0:7".parse().unwrap();
        assert_eq!(offsets.segment, 10);
        assert_eq!(offsets.group, 7);
        assert!("1:2:3".parse::<IdOffsets>().is_err());
        assert!("a:b:c:d:e".parse::<IdOffsets>().is_err());
    }

    #[test]
    fn test_reidentify_shifts_keys_and_references() {
        let mut b: GfaGraph = B.parse().unwrap();
        let base = IdOffsets {
            segment: 10,
            edge: 20,
            fragment: 30,
            gap: 40,
            group: 50,
        };
        let next = reidentify(&mut b, base).unwrap();

        assert!(b.segments.contains_key("11"));
        assert!(b.segments.contains_key("13"));
        assert!(b.segments.contains_key("ref"));
        assert_eq!(b.segments["13"].name, "13");

        let e = &b.edges[0];
        assert_eq!((e.id.as_str(), e.source.as_str(), e.sink.as_str()), ("21", "11", "13"));
        assert_eq!(b.fragments[0].segment, "11");
        assert_eq!(b.fragments[0].external, "35");
        assert_eq!(b.gaps[0].id, "42");
        assert!(b.groups.contains_key("51"));
        assert_eq!(b.groups["51"].steps[1].segment, "13");

        assert_eq!(next.to_string(), "13:21:35:42:51");
    }

    #[test]
    fn test_zero_ids_do_not_collide() {
        let a: GfaGraph = "S\t0\tA\nS\t1\tC\n".parse().unwrap();
        let mut b: GfaGraph = "S\t0\tG\nS\t1\tT\n".parse().unwrap();
        let next = reidentify(&mut b, compute_offsets(&a)).unwrap();
        assert!(b.segments.contains_key("2"));
        assert!(b.segments.contains_key("3"));
        assert_eq!(next.segment, 3);
    }

    #[test]
    fn test_leading_zeros_are_kept_in_front_of_the_shift() {
        let mut g: GfaGraph = "S\t007\tA\nS\t07\tG\nS\t7\tC\nS\t00\tT\n"
            .parse()
            .unwrap();
        reidentify(
            &mut g,
            IdOffsets {
                segment: 5,
                ..Default::default()
            },
        )
        .unwrap();
        // lowest id is 0, so the shift is 6
        let mut keys: Vec<&str> = g.segments.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["0013", "013", "06", "13"]);
        assert_eq!(g.segments["0013"].sequence, "A");
        assert_eq!(g.segments["13"].sequence, "C");
    }

    #[test]
    fn test_zero_padded_ids_do_not_collide_across_graphs() {
        let a: GfaGraph = "S\t7\tA\nS\t007\tC\n".parse().unwrap();
        let mut b: GfaGraph = "S\t07\tG\nS\t007\tT\nL\t07\t+\t007\t+\t0M\n"
            .parse()
            .unwrap();
        let base = compute_offsets(&a);
        assert_eq!(base.segment, 7);
        let next = reidentify(&mut b, base).unwrap();

        let a_ids: HashSet<&String> = a.segments.keys().collect();
        let b_ids: HashSet<&String> = b.segments.keys().collect();
        assert_eq!(b_ids.len(), 2);
        assert!(a_ids.is_disjoint(&b_ids));
        assert!(b
            .segments
            .keys()
            .all(|k| numeric_id(k).unwrap() > base.segment));
        assert_eq!((b.links[0].source.as_str(), b.links[0].sink.as_str()), ("014", "0014"));
        assert_eq!(next.segment, 14);

        let merged = merge(a, "S\t07\tG\nS\t007\tT\n".parse().unwrap()).unwrap();
        assert_eq!(merged.segment_count(), 4);
        assert!(merged.diagnostics().is_empty());
    }

    #[test]
    fn test_link_id_tags_count_as_edge_ids() {
        let g: GfaGraph = "S\t1\tA\nS\t2\tC\nL\t1\t+\t2\t+\t0M\tID:Z:9\n"
            .parse()
            .unwrap();
        assert_eq!(compute_offsets(&g).edge, 9);
    }

    #[test]
    fn test_merged_link_ids_stay_distinct_from_edge_ids() {
        let a: GfaGraph = "H\tVN:Z:2.0\n\
                           S\t1\t4\tACGT\n\
                           S\t2\t4\tACGT\n\
                           E\t3\t1+\t2+\t4$\t4$\t0\t0\t0M\n"
            .parse()
            .unwrap();
        let b: GfaGraph = "H\tVN:Z:1.0\n\
                           S\t1\tACGT\n\
                           S\t2\tACGT\n\
                           L\t1\t+\t2\t-\t0M\tID:Z:3\n\
                           C\t1\t+\t2\t+\t0\t4M\tID:Z:edge7\n"
            .parse()
            .unwrap();
        let mut merged = merge(a, b).unwrap();
        assert_eq!(merged.links[0].tags, vec![Tag::new("ID", "Z", "6")]);
        assert_eq!(merged.containments[0].tags, vec![Tag::new("ID", "Z", "edge7")]);

        merged.upgrade_to_v2();
        let ids: Vec<&str> = merged.edges.iter().map(|e| e.id.as_str()).collect();
        let distinct: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(distinct.len(), 3);
        assert!(distinct.contains("3"));
        assert!(distinct.contains("6"));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let mut g: GfaGraph = "S\t2\tA\n".parse().unwrap();
        let base = IdOffsets {
            segment: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(reidentify(&mut g, base), Err(GfaError::InvalidInput(_))));
    }

    #[test]
    fn test_id_ranges_are_disjoint() {
        let a: GfaGraph = "S\t1\tA\nS\t2\tC\nS\t5\tG\n".parse().unwrap();
        let mut b: GfaGraph = "S\t1\tA\nS\t4\tT\nS\t6\tG\n".parse().unwrap();
        reidentify(&mut b, compute_offsets(&a)).unwrap();

        let a_ids: HashSet<&String> = a.segments.keys().collect();
        let b_ids: HashSet<&String> = b.segments.keys().collect();
        assert!(a_ids.is_disjoint(&b_ids));
    }

    #[test]
    fn test_merge() {
        let a: GfaGraph = A.parse().unwrap();
        let b: GfaGraph = B.parse().unwrap();
        let mut merged = merge(a, b).unwrap();

        assert_eq!(merged.version, Version::V2_0);
        // 1, 2, ref from a; 3, 5 from b; b's "ref" collides
        assert_eq!(merged.segment_count(), 5);
        assert_eq!(merged.get_segment("ref").unwrap().sequence, "TT");
        assert!(merged.get_segment("3").is_some());
        assert!(merged.get_segment("5").is_some());
        assert!(merged
            .diagnostics()
            .contains(&Diagnostic::DuplicateMergeSegment {
                name: "ref".to_string()
            }));

        assert_eq!(merged.links.len(), 1);
        assert_eq!(merged.edges.len(), 1);
        assert_eq!(merged.edges[0].source, "3");
        assert!(merged.paths.contains_key("1"));
        assert!(merged.groups.contains_key("2"));

        merged.upgrade_to_v2();
        assert_eq!(merged.edges.len(), 2);
        assert_eq!(merged.groups.len(), 2);
    }
}
