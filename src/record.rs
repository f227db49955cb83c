//! GFA record types shared by every format revision
//!
//! One struct per line kind, plus the small value types they are built
//! from: [`Version`], [`Orientation`], [`Tag`] and the [`Terminals`] bit set
//! used by GFA 2.0 coordinates.

use crate::error::{GfaError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Declared GFA format revision
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Version {
    /// GFA 0.1: walks (`W`) instead of paths
    V0_1,
    /// GFA 1.0: links, containments and paths
    #[default]
    V1_0,
    /// GFA 2.0: edges, fragments, gaps and groups
    V2_0,
}

impl Version {
    /// Map a `VN` header value onto a revision.
    ///
    /// Any number below 1.0 is 0.1, anything in `[1.0, 2.0)` is 1.0 and
    /// anything in `[2.0, 3.0)` is 2.0.
    pub fn from_number(value: &str) -> Option<Self> {
        let number: f64 = value.trim().parse().ok()?;
        if !number.is_finite() || number < 0.0 {
            None
        } else if number < 1.0 {
            Some(Version::V0_1)
        } else if number < 2.0 {
            Some(Version::V1_0)
        } else if number < 3.0 {
            Some(Version::V2_0)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::V0_1 => "0.1",
            Version::V1_0 => "1.0",
            Version::V2_0 => "2.0",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Version {
    type Err = GfaError;

    fn from_str(s: &str) -> Result<Self> {
        Version::from_number(s).ok_or_else(|| {
            GfaError::InvalidInput(format!(
                "Invalid GFA version: {}. Valid versions: 0.1, 1.0, 2.0",
                s
            ))
        })
    }
}

/// Orientation of a segment in a path, link or edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Forward,
    Reverse,
}

impl Orientation {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Orientation::Forward),
            '-' => Some(Orientation::Reverse),
            _ => None,
        }
    }

    /// Parse a field that must be exactly `+` or `-`
    pub fn from_field(field: &str) -> Option<Self> {
        let mut chars = field.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Orientation::from_char(c),
            _ => None,
        }
    }

    pub fn is_forward(&self) -> bool {
        matches!(self, Orientation::Forward)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Forward => write!(f, "+"),
            Orientation::Reverse => write!(f, "-"),
        }
    }
}

/// Split `name+` / `name-` into the name and its orientation
pub fn split_oriented(field: &str) -> Option<(&str, Orientation)> {
    let last = field.chars().last()?;
    let orientation = Orientation::from_char(last)?;
    let name = &field[..field.len() - 1];
    if name.is_empty() {
        return None;
    }
    Some((name, orientation))
}

/// An optional `key:type:value` annotation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    /// Two-character tag name
    pub key: String,
    /// Type code (`A`, `i`, `f`, `Z`, `J`, `H`, `B`)
    pub kind: String,
    /// Value text; may itself contain colons
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, kind: impl Into<String>, value: impl Into<String>) -> Self {
        Tag {
            key: key.into(),
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// Parse `key:type:value`. Only the first two colons separate fields.
    pub fn parse(field: &str) -> Option<Self> {
        let mut parts = field.splitn(3, ':');
        let key = parts.next()?;
        let kind = parts.next()?;
        let value = parts.next()?;
        if key.is_empty() {
            return None;
        }
        Some(Tag::new(key, kind, value))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.key, self.kind, self.value)
    }
}

/// A header entry (`H` line field). Same shape as a tag.
pub type Header = Tag;

/// Which of the four coordinates of an edge or fragment carry the `$` marker
///
/// Bit order is source-begin, source-end, sink-begin, sink-end (for
/// fragments: segment-begin, segment-end, fragment-begin, fragment-end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Terminals(u8);

impl Terminals {
    pub const SOURCE_BEGIN: usize = 0;
    pub const SOURCE_END: usize = 1;
    pub const SINK_BEGIN: usize = 2;
    pub const SINK_END: usize = 3;

    pub fn new(flags: [bool; 4]) -> Self {
        let mut bits = 0u8;
        for (i, flag) in flags.iter().enumerate() {
            if *flag {
                bits |= 1 << i;
            }
        }
        Terminals(bits)
    }

    pub fn is_set(&self, index: usize) -> bool {
        index < 4 && self.0 & (1 << index) != 0
    }

    pub fn set(&mut self, index: usize, value: bool) {
        if index >= 4 {
            return;
        }
        if value {
            self.0 |= 1 << index;
        } else {
            self.0 &= !(1 << index);
        }
    }

    pub fn flags(&self) -> [bool; 4] {
        [
            self.is_set(0),
            self.is_set(1),
            self.is_set(2),
            self.is_set(3),
        ]
    }
}

/// A segment (node) carrying a sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment name/identifier
    pub name: String,
    /// Declared length; derived from the sequence before GFA 2.0
    pub length: u64,
    /// Sequence data, `*` when absent
    pub sequence: String,
    /// Optional tags
    pub tags: Vec<Tag>,
}

impl Segment {
    /// Build a segment whose length is taken from its sequence
    pub fn new(name: impl Into<String>, sequence: impl Into<String>) -> Self {
        let sequence = sequence.into();
        let length = if is_placeholder(&sequence) {
            0
        } else {
            sequence.len() as u64
        };
        Segment {
            name: name.into(),
            length,
            sequence,
            tags: Vec::new(),
        }
    }

    pub fn has_sequence(&self) -> bool {
        !is_placeholder(&self.sequence)
    }
}

/// `*` or empty sequence text
pub fn is_placeholder(sequence: &str) -> bool {
    sequence.is_empty() || sequence == "*"
}

/// A dovetail link between two segment ends (GFA 0.1 / 1.0)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    /// From segment name
    pub source: String,
    /// From orientation
    pub source_orientation: Orientation,
    /// To segment name
    pub sink: String,
    /// To orientation
    pub sink_orientation: Orientation,
    /// Overlap CIGAR string
    pub overlap: String,
    /// Optional tags
    pub tags: Vec<Tag>,
}

/// A segment contained in another (GFA 0.1 / 1.0)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Containment {
    /// Container segment name
    pub source: String,
    pub source_orientation: Orientation,
    /// Contained segment name
    pub sink: String,
    pub sink_orientation: Orientation,
    /// Offset of the contained segment within the container
    pub position: u64,
    /// Overlap CIGAR string
    pub overlap: String,
    pub tags: Vec<Tag>,
}

/// A generalized GFA 2.0 edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Edge identifier, `*` when anonymous
    pub id: String,
    pub source: String,
    pub source_orientation: Orientation,
    pub sink: String,
    pub sink_orientation: Orientation,
    pub source_begin: u64,
    pub source_end: u64,
    pub sink_begin: u64,
    pub sink_end: u64,
    /// `$` markers on the four coordinates above
    pub terminals: Terminals,
    /// Alignment (CIGAR or trace), `*` when absent
    pub alignment: String,
    pub tags: Vec<Tag>,
}

/// An external read placed on a segment (GFA 2.0)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fragment {
    /// Segment the fragment is placed on
    pub segment: String,
    /// External fragment (read) identifier
    pub external: String,
    /// Orientation of the external fragment
    pub orientation: Orientation,
    pub segment_begin: u64,
    pub segment_end: u64,
    pub fragment_begin: u64,
    pub fragment_end: u64,
    /// `$` markers on the four coordinates above
    pub terminals: Terminals,
    pub alignment: String,
    pub tags: Vec<Tag>,
}

/// A declared gap between two segments (GFA 2.0)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gap {
    pub id: String,
    pub source: String,
    pub source_orientation: Option<Orientation>,
    pub sink: String,
    pub sink_orientation: Option<Orientation>,
    /// Estimated distance between the two ends
    pub distance: i64,
    /// Variance field, `*` or an integer, when present
    pub variance: Option<String>,
    pub tags: Vec<Tag>,
}

/// A step in a path or group
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathStep {
    /// Segment name
    pub segment: String,
    /// Orientation
    pub orientation: Orientation,
}

impl PathStep {
    pub fn new(segment: impl Into<String>, orientation: Orientation) -> Self {
        PathStep {
            segment: segment.into(),
            orientation,
        }
    }
}

/// An ordered (`O`) or unordered (`U`) group (GFA 2.0)
///
/// Members of unordered groups carry no orientation; they are stored as
/// forward steps and written without a suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub ordered: bool,
    pub steps: Vec<PathStep>,
    pub tags: Vec<Tag>,
}

/// A named traversal (GFA 1.0 `P` line)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GfaPath {
    /// Path name
    pub name: String,
    /// Steps in the path
    pub steps: Vec<PathStep>,
    /// Overlaps between consecutive steps; usually one fewer than the steps
    pub overlaps: Vec<String>,
    pub tags: Vec<Tag>,
}

/// One step of a GFA 0.1 traversal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Walk {
    /// Segment visited by this step
    pub segment: String,
    /// Name of the traversal this step belongs to
    pub path: String,
    /// 1-based rank in the traversal; 0 when unranked
    pub rank: u64,
    pub orientation: Orientation,
    pub overlap: String,
    pub tags: Vec<Tag>,
}

/// Legacy alignment annotation (`a` line) found in early GFA 0.1 files
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Alignment {
    pub source: String,
    pub position: i64,
    pub reference: String,
    pub orientation: Orientation,
    pub length: i64,
    pub tags: Vec<Tag>,
}

/// One parsed GFA line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Header(Vec<Header>),
    Segment(Segment),
    Link(Link),
    Containment(Containment),
    Edge(Edge),
    Fragment(Fragment),
    Gap(Gap),
    Group(Group),
    Path(GfaPath),
    Walk(Walk),
    Alignment(Alignment),
    Comment,
}

/// Parse an identifier that consists only of ASCII digits
pub fn numeric_id(id: &str) -> Option<u64> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    id.parse().ok()
}

fn is_all_digits(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// Ordering used for serialized output: all-digit names sort numerically and
/// before every other name; other names sort lexically.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    match (is_all_digits(a), is_all_digits(b)) {
        (true, true) => {
            let a_trim = a.trim_start_matches('0');
            let b_trim = b.trim_start_matches('0');
            a_trim
                .len()
                .cmp(&b_trim.len())
                .then_with(|| a_trim.cmp(b_trim))
                .then_with(|| a.cmp(b))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_from_number() {
        assert_eq!(Version::from_number("0.1"), Some(Version::V0_1));
        assert_eq!(Version::from_number("1.0"), Some(Version::V1_0));
        assert_eq!(Version::from_number("1.1"), Some(Version::V1_0));
        assert_eq!(Version::from_number("2.0"), Some(Version::V2_0));
        assert_eq!(Version::from_number("abc"), None);
        assert_eq!(Version::from_number("3.0"), None);
        assert!("7".parse::<Version>().is_err());
        assert_eq!(Version::V2_0.to_string(), "2.0");
    }

    #[test]
    fn test_orientation_display() {
        assert_eq!(format!("{}", Orientation::Forward), "+");
        assert_eq!(format!("{}", Orientation::Reverse), "-");
        assert_eq!(Orientation::from_field("+"), Some(Orientation::Forward));
        assert_eq!(Orientation::from_field("+-"), None);
    }

    #[test]
    fn test_split_oriented() {
        assert_eq!(split_oriented("s1+"), Some(("s1", Orientation::Forward)));
        assert_eq!(split_oriented("12-"), Some(("12", Orientation::Reverse)));
        assert_eq!(split_oriented("s1"), None);
        assert_eq!(split_oriented("+"), None);
    }

    #[test]
    fn test_tag_value_keeps_colons() {
        let tag = Tag::parse("UR:Z:http://example.org/a:b").unwrap();
        assert_eq!(tag.key, "UR");
        assert_eq!(tag.kind, "Z");
        assert_eq!(tag.value, "http://example.org/a:b");
        assert_eq!(tag.to_string(), "UR:Z:http://example.org/a:b");
        assert!(Tag::parse("nocolons").is_none());
        assert!(Tag::parse("LN:i").is_none());
    }

    #[test]
    fn test_terminals_bits() {
        let mut t = Terminals::new([true, false, false, true]);
        assert!(t.is_set(Terminals::SOURCE_BEGIN));
        assert!(!t.is_set(Terminals::SOURCE_END));
        assert!(t.is_set(Terminals::SINK_END));
        t.set(Terminals::SOURCE_END, true);
        t.set(Terminals::SINK_END, false);
        assert_eq!(t.flags(), [true, true, false, false]);
    }

    #[test]
    fn test_natural_order() {
        let mut ids = vec!["10", "b", "2", "a", "1", "010", "9a"];
        ids.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(ids, vec!["1", "2", "010", "10", "9a", "a", "b"]);
    }

    #[test]
    fn test_numeric_id() {
        assert_eq!(numeric_id("42"), Some(42));
        assert_eq!(numeric_id("s42"), None);
        assert_eq!(numeric_id(""), None);
        assert_eq!(numeric_id("99999999999999999999999"), None);
    }

    #[test]
    fn test_segment_length_from_sequence() {
        assert_eq!(Segment::new("1", "ACGT").length, 4);
        assert_eq!(Segment::new("1", "*").length, 0);
        assert!(!Segment::new("1", "*").has_sequence());
    }
}
