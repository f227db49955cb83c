//! GFA text output
//!
//! Output has two independent settings: the target [`Version`] and the
//! [`OutputOrder`]. Writing forces whatever normalization the target needs
//! before any line is rendered.

use crate::error::{GfaError, Result};
use crate::gfa::GfaGraph;
use crate::record::{
    natural_cmp, Alignment, Containment, Edge, Fragment, Gap, GfaPath, Group, Link, Orientation,
    Segment, Tag, Terminals, Version, Walk,
};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Line order of serialized output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputOrder {
    /// Records interleaved under the segment they start from
    #[default]
    Declaration,
    /// Records grouped by line type
    Block,
}

impl FromStr for OutputOrder {
    type Err = GfaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "declaration" | "decl" => Ok(OutputOrder::Declaration),
            "block" => Ok(OutputOrder::Block),
            _ => Err(GfaError::InvalidInput(format!(
                "Invalid output order: {}. Valid orders: declaration, block",
                s
            ))),
        }
    }
}

impl fmt::Display for OutputOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputOrder::Declaration => write!(f, "declaration"),
            OutputOrder::Block => write!(f, "block"),
        }
    }
}

fn push_tags(line: &mut String, tags: &[Tag]) {
    for tag in tags {
        line.push('\t');
        line.push_str(&tag.to_string());
    }
}

fn coordinate(value: u64, terminals: Terminals, index: usize) -> String {
    if terminals.is_set(index) {
        format!("{}$", value)
    } else {
        value.to_string()
    }
}

impl Segment {
    /// Below GFA 2.0 a segment without sequence carries its length as `LN:i`
    pub fn to_line(&self, version: Version) -> String {
        if version >= Version::V2_0 {
            let mut line = format!("S\t{}\t{}\t{}", self.name, self.length, self.sequence);
            push_tags(&mut line, &self.tags);
            return line;
        }

        let mut line = format!("S\t{}\t{}", self.name, self.sequence);
        push_tags(&mut line, &self.tags);
        if !self.has_sequence() && self.length > 0 && !self.tags.iter().any(|t| t.key == "LN") {
            line.push_str(&format!("\tLN:i:{}", self.length));
        }
        line
    }
}

impl Link {
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "L\t{}\t{}\t{}\t{}\t{}",
            self.source, self.source_orientation, self.sink, self.sink_orientation, self.overlap
        );
        push_tags(&mut line, &self.tags);
        line
    }
}

impl Containment {
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "C\t{}\t{}\t{}\t{}\t{}\t{}",
            self.source,
            self.source_orientation,
            self.sink,
            self.sink_orientation,
            self.position,
            self.overlap
        );
        push_tags(&mut line, &self.tags);
        line
    }
}

impl Edge {
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "E\t{}\t{}{}\t{}{}\t{}\t{}\t{}\t{}\t{}",
            self.id,
            self.source,
            self.source_orientation,
            self.sink,
            self.sink_orientation,
            coordinate(self.source_begin, self.terminals, Terminals::SOURCE_BEGIN),
            coordinate(self.source_end, self.terminals, Terminals::SOURCE_END),
            coordinate(self.sink_begin, self.terminals, Terminals::SINK_BEGIN),
            coordinate(self.sink_end, self.terminals, Terminals::SINK_END),
            self.alignment
        );
        push_tags(&mut line, &self.tags);
        line
    }
}

impl Fragment {
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "F\t{}\t{}{}\t{}\t{}\t{}\t{}\t{}",
            self.segment,
            self.external,
            self.orientation,
            coordinate(self.segment_begin, self.terminals, 0),
            coordinate(self.segment_end, self.terminals, 1),
            coordinate(self.fragment_begin, self.terminals, 2),
            coordinate(self.fragment_end, self.terminals, 3),
            self.alignment
        );
        push_tags(&mut line, &self.tags);
        line
    }
}

impl Gap {
    pub fn to_line(&self) -> String {
        let end = |name: &str, orientation: Option<Orientation>| match orientation {
            Some(o) => format!("{}{}", name, o),
            None => name.to_string(),
        };
        let mut line = format!(
            "G\t{}\t{}\t{}\t{}",
            self.id,
            end(&self.source, self.source_orientation),
            end(&self.sink, self.sink_orientation),
            self.distance
        );
        if let Some(variance) = &self.variance {
            line.push('\t');
            line.push_str(variance);
        }
        push_tags(&mut line, &self.tags);
        line
    }
}

impl Group {
    pub fn to_line(&self) -> String {
        let items: Vec<String> = if self.ordered {
            self.steps
                .iter()
                .map(|s| format!("{}{}", s.segment, s.orientation))
                .collect()
        } else {
            self.steps.iter().map(|s| s.segment.clone()).collect()
        };
        let mut line = format!(
            "{}\t{}\t{}",
            if self.ordered { 'O' } else { 'U' },
            self.id,
            items.join(" ")
        );
        push_tags(&mut line, &self.tags);
        line
    }
}

impl GfaPath {
    pub fn to_line(&self) -> String {
        let steps: Vec<String> = self
            .steps
            .iter()
            .map(|s| format!("{}{}", s.segment, s.orientation))
            .collect();
        let overlaps = if self.overlaps.is_empty() {
            "*".to_string()
        } else {
            self.overlaps.join(",")
        };
        let mut line = format!("P\t{}\t{}\t{}", self.name, steps.join(","), overlaps);
        push_tags(&mut line, &self.tags);
        line
    }
}

impl Walk {
    pub fn to_line(&self) -> String {
        let mut line = if self.rank == 0 {
            format!(
                "W\t{}\t{}\t{}\t{}",
                self.segment, self.path, self.orientation, self.overlap
            )
        } else {
            format!(
                "W\t{}\t{}\t{}\t{}\t{}",
                self.segment, self.path, self.rank, self.orientation, self.overlap
            )
        };
        push_tags(&mut line, &self.tags);
        line
    }
}

impl Alignment {
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "a\t{}\t{}\t{}\t{}\t{}",
            self.source, self.position, self.reference, self.orientation, self.length
        );
        push_tags(&mut line, &self.tags);
        line
    }
}

/// Records of one table bucketed by the segment they hang off, plus those
/// whose segment the graph does not declare.
struct Buckets<'a, T> {
    by_segment: HashMap<&'a str, Vec<&'a T>>,
    orphans: Vec<&'a T>,
}

impl<'a, T> Buckets<'a, T> {
    fn new(items: &'a [T], segments: &HashMap<String, Segment>, key: fn(&T) -> &str) -> Self {
        let mut by_segment: HashMap<&'a str, Vec<&'a T>> = HashMap::new();
        let mut orphans = Vec::new();
        for item in items {
            let name = key(item);
            if segments.contains_key(name) {
                by_segment.entry(name).or_default().push(item);
            } else {
                orphans.push(item);
            }
        }
        Buckets {
            by_segment,
            orphans,
        }
    }

    fn of(&self, segment: &str) -> &[&'a T] {
        self.by_segment
            .get(segment)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

struct Output {
    text: String,
}

impl Output {
    fn line(&mut self, line: String) {
        self.text.push_str(&line);
        self.text.push('\n');
    }
}

impl GfaGraph {
    /// Normalize for `version` and render the graph as GFA text
    pub fn to_text(&mut self, version: Version, order: OutputOrder) -> String {
        self.prepare_for(version);
        self.render(version, order)
    }

    /// Normalize for `version` and write the graph to `writer`
    pub fn write_to<W: Write>(
        &mut self,
        writer: &mut W,
        version: Version,
        order: OutputOrder,
    ) -> Result<()> {
        let text = self.to_text(version, order);
        writer.write_all(text.as_bytes())?;
        Ok(())
    }

    fn prepare_for(&mut self, version: Version) {
        match version {
            Version::V2_0 => self.upgrade_to_v2(),
            Version::V1_0 => self.downgrade_to_v1(),
            Version::V0_1 => {
                self.downgrade_to_v1();
                self.paths_as_walks();
            }
        }
    }

    fn render(&self, version: Version, order: OutputOrder) -> String {
        let mut out = Output {
            text: String::new(),
        };

        out.line(format!("H\tVN:Z:{}", version));
        for header in &self.headers {
            out.line(format!("H\t{}", header));
        }

        let names = self.sorted_segment_names();
        match (version, order) {
            (Version::V2_0, OutputOrder::Declaration) => self.render_v2_declaration(&mut out, &names),
            (Version::V2_0, OutputOrder::Block) => self.render_v2_block(&mut out, &names),
            (_, OutputOrder::Declaration) => self.render_v1_declaration(&mut out, &names, version),
            (_, OutputOrder::Block) => self.render_v1_block(&mut out, &names, version),
        }
        out.text
    }

    fn sorted_paths(&self) -> Vec<&GfaPath> {
        let mut paths: Vec<&GfaPath> = self.paths.values().collect();
        paths.sort_by(|a, b| natural_cmp(&a.name, &b.name));
        paths
    }

    fn sorted_groups(&self) -> Vec<&Group> {
        let mut groups: Vec<&Group> = self.groups.values().collect();
        groups.sort_by(|a, b| natural_cmp(&a.id, &b.id));
        groups
    }

    fn render_v1_declaration(&self, out: &mut Output, names: &[&str], version: Version) {
        let legacy = version == Version::V0_1;
        let links = Buckets::new(&self.links, &self.segments, |l| l.source.as_str());
        let containments =
            Buckets::new(&self.containments, &self.segments, |c| c.source.as_str());
        let walks = Buckets::new(&self.walks, &self.segments, |w| w.segment.as_str());
        let alignments = Buckets::new(&self.alignments, &self.segments, |a| a.source.as_str());

        if !legacy {
            for path in self.sorted_paths() {
                out.line(path.to_line());
            }
        }

        for name in names {
            out.line(self.segments[*name].to_line(version));
            if legacy {
                for walk in walks.of(name) {
                    out.line(walk.to_line());
                }
            }
            for link in links.of(name) {
                out.line(link.to_line());
            }
            for containment in containments.of(name) {
                out.line(containment.to_line());
            }
            if legacy {
                for alignment in alignments.of(name) {
                    out.line(alignment.to_line());
                }
            }
        }

        if legacy {
            for walk in &walks.orphans {
                out.line(walk.to_line());
            }
        }
        for link in &links.orphans {
            out.line(link.to_line());
        }
        for containment in &containments.orphans {
            out.line(containment.to_line());
        }
        if legacy {
            for alignment in &alignments.orphans {
                out.line(alignment.to_line());
            }
        }
    }

    fn render_v1_block(&self, out: &mut Output, names: &[&str], version: Version) {
        for name in names {
            out.line(self.segments[*name].to_line(version));
        }
        for link in &self.links {
            out.line(link.to_line());
        }
        for containment in &self.containments {
            out.line(containment.to_line());
        }
        if version == Version::V0_1 {
            for walk in &self.walks {
                out.line(walk.to_line());
            }
            for alignment in &self.alignments {
                out.line(alignment.to_line());
            }
        } else {
            for path in self.sorted_paths() {
                out.line(path.to_line());
            }
        }
    }

    fn render_v2_declaration(&self, out: &mut Output, names: &[&str]) {
        let fragments = Buckets::new(&self.fragments, &self.segments, |f| f.segment.as_str());
        let edges = Buckets::new(&self.edges, &self.segments, |e| e.source.as_str());
        let gaps = Buckets::new(&self.gaps, &self.segments, |g| g.source.as_str());

        for group in self.sorted_groups() {
            out.line(group.to_line());
        }
        for name in names {
            out.line(self.segments[*name].to_line(Version::V2_0));
            for fragment in fragments.of(name) {
                out.line(fragment.to_line());
            }
            for edge in edges.of(name) {
                out.line(edge.to_line());
            }
            for gap in gaps.of(name) {
                out.line(gap.to_line());
            }
        }
        for fragment in &fragments.orphans {
            out.line(fragment.to_line());
        }
        for edge in &edges.orphans {
            out.line(edge.to_line());
        }
        for gap in &gaps.orphans {
            out.line(gap.to_line());
        }
    }

    fn render_v2_block(&self, out: &mut Output, names: &[&str]) {
        for name in names {
            out.line(self.segments[*name].to_line(Version::V2_0));
        }
        for fragment in &self.fragments {
            out.line(fragment.to_line());
        }
        for gap in &self.gaps {
            out.line(gap.to_line());
        }
        for edge in &self.edges {
            out.line(edge.to_line());
        }
        for group in self.sorted_groups() {
            out.line(group.to_line());
        }
    }
}
