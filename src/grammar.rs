//! Line grammar: one tab-delimited line plus the declared version in, one
//! [`Record`] out
//!
//! Nothing here touches a graph. Field layouts that differ between format
//! revisions (`S`, `P`) are resolved by the `version` argument alone.

use crate::error::{GfaError, Result};
use crate::record::{
    split_oriented, Alignment, Containment, Edge, Fragment, Gap, GfaPath, Group, Link,
    Orientation, PathStep, Record, Segment, Tag, Terminals, Version, Walk,
};

/// Parse a single line (without its newline) read under `version`.
///
/// `line` is the 1-based line number used in error messages.
pub fn parse_line(text: &str, version: Version, line: usize) -> Result<Record> {
    if text.starts_with('#') {
        return Ok(Record::Comment);
    }
    let fields: Vec<&str> = text.split('\t').collect();
    parse_fields(&fields, version, line)
}

/// Dispatch on the leading field of an already split line
pub fn parse_fields(fields: &[&str], version: Version, line: usize) -> Result<Record> {
    let Some(&leader) = fields.first() else {
        return Err(GfaError::parse(line, "Record has no fields"));
    };
    match leader {
        "H" => parse_header(fields, line),
        "S" => parse_segment(fields, version, line),
        "L" => parse_link(fields, line),
        "C" => parse_containment(fields, line),
        "E" => parse_edge(fields, line),
        "F" => parse_fragment(fields, line),
        "G" => parse_gap(fields, line),
        "O" => parse_group(fields, true, line),
        "U" => parse_group(fields, false, line),
        "W" => parse_walk(fields, line),
        "P" => parse_path_line(fields, version, line),
        "a" => parse_alignment(fields, line),
        leader if leader.starts_with('#') => Ok(Record::Comment),
        leader => Err(GfaError::UnknownRecord {
            line,
            leader: leader.to_string(),
        }),
    }
}

fn require(fields: &[&str], count: usize, record: &str, line: usize) -> Result<()> {
    if fields.len() < count {
        return Err(GfaError::parse(
            line,
            format!("{} record requires at least {} fields", record, count),
        ));
    }
    Ok(())
}

fn parse_tags(fields: &[&str], line: usize) -> Result<Vec<Tag>> {
    fields
        .iter()
        .filter(|f| !f.is_empty())
        .map(|f| {
            Tag::parse(f).ok_or_else(|| {
                GfaError::parse(line, format!("Malformed tag '{}', expected key:type:value", f))
            })
        })
        .collect()
}

fn tags_from(fields: &[&str], start: usize, line: usize) -> Result<Vec<Tag>> {
    if fields.len() > start {
        parse_tags(&fields[start..], line)
    } else {
        Ok(Vec::new())
    }
}

/// A positional field that may be omitted; a field holding a colon is
/// already the first tag.
fn optional_positional<'a>(fields: &[&'a str], index: usize) -> Option<&'a str> {
    fields.get(index).copied().filter(|f| !f.contains(':'))
}

fn parse_orientation(field: &str, line: usize) -> Result<Orientation> {
    Orientation::from_field(field)
        .ok_or_else(|| GfaError::parse(line, format!("Invalid orientation: {}", field)))
}

fn parse_reference(field: &str, line: usize) -> Result<(String, Orientation)> {
    split_oriented(field)
        .map(|(name, orientation)| (name.to_string(), orientation))
        .ok_or_else(|| {
            GfaError::parse(
                line,
                format!("Reference '{}' is missing its orientation", field),
            )
        })
}

fn parse_u64(field: &str, what: &str, line: usize) -> Result<u64> {
    field
        .parse()
        .map_err(|_| GfaError::parse(line, format!("Invalid {}: {}", what, field)))
}

fn parse_i64(field: &str, what: &str, line: usize) -> Result<i64> {
    field
        .parse()
        .map_err(|_| GfaError::parse(line, format!("Invalid {}: {}", what, field)))
}

/// A coordinate with an optional trailing `$`
fn parse_coordinate(field: &str, line: usize) -> Result<(u64, bool)> {
    match field.strip_suffix('$') {
        Some(number) => Ok((parse_u64(number, "coordinate", line)?, true)),
        None => Ok((parse_u64(field, "coordinate", line)?, false)),
    }
}

fn parse_header(fields: &[&str], line: usize) -> Result<Record> {
    require(fields, 2, "Header", line)?;
    let headers = parse_tags(&fields[1..], line)?;
    if let Some(vn) = headers.iter().find(|h| h.key == "VN") {
        if Version::from_number(&vn.value).is_none() {
            return Err(GfaError::parse(
                line,
                format!("Unsupported GFA version: {}", vn.value),
            ));
        }
    }
    Ok(Record::Header(headers))
}

fn parse_segment(fields: &[&str], version: Version, line: usize) -> Result<Record> {
    if version >= Version::V2_0 {
        require(fields, 4, "Segment", line)?;
        return Ok(Record::Segment(Segment {
            name: fields[1].to_string(),
            length: parse_u64(fields[2], "segment length", line)?,
            sequence: fields[3].to_string(),
            tags: tags_from(fields, 4, line)?,
        }));
    }

    require(fields, 3, "Segment", line)?;
    let mut segment = Segment::new(fields[1], fields[2]);
    segment.tags = tags_from(fields, 3, line)?;
    if !segment.has_sequence() {
        if let Some(ln) = segment.tags.iter().find(|t| t.key == "LN") {
            segment.length = parse_u64(&ln.value, "LN tag", line)?;
        }
    }
    Ok(Record::Segment(segment))
}

fn parse_link(fields: &[&str], line: usize) -> Result<Record> {
    require(fields, 5, "Link", line)?;
    let overlap = optional_positional(fields, 5);
    let tag_start = if overlap.is_some() { 6 } else { 5 };
    Ok(Record::Link(Link {
        source: fields[1].to_string(),
        source_orientation: parse_orientation(fields[2], line)?,
        sink: fields[3].to_string(),
        sink_orientation: parse_orientation(fields[4], line)?,
        overlap: overlap.unwrap_or("*").to_string(),
        tags: tags_from(fields, tag_start, line)?,
    }))
}

fn parse_containment(fields: &[&str], line: usize) -> Result<Record> {
    require(fields, 6, "Containment", line)?;
    let overlap = optional_positional(fields, 6);
    let tag_start = if overlap.is_some() { 7 } else { 6 };
    Ok(Record::Containment(Containment {
        source: fields[1].to_string(),
        source_orientation: parse_orientation(fields[2], line)?,
        sink: fields[3].to_string(),
        sink_orientation: parse_orientation(fields[4], line)?,
        position: parse_u64(fields[5], "containment position", line)?,
        overlap: overlap.unwrap_or("*").to_string(),
        tags: tags_from(fields, tag_start, line)?,
    }))
}

fn parse_edge(fields: &[&str], line: usize) -> Result<Record> {
    require(fields, 9, "Edge", line)?;
    let (source, source_orientation) = parse_reference(fields[2], line)?;
    let (sink, sink_orientation) = parse_reference(fields[3], line)?;
    let (source_begin, t0) = parse_coordinate(fields[4], line)?;
    let (source_end, t1) = parse_coordinate(fields[5], line)?;
    let (sink_begin, t2) = parse_coordinate(fields[6], line)?;
    let (sink_end, t3) = parse_coordinate(fields[7], line)?;
    Ok(Record::Edge(Edge {
        id: fields[1].to_string(),
        source,
        source_orientation,
        sink,
        sink_orientation,
        source_begin,
        source_end,
        sink_begin,
        sink_end,
        terminals: Terminals::new([t0, t1, t2, t3]),
        alignment: fields[8].to_string(),
        tags: tags_from(fields, 9, line)?,
    }))
}

fn parse_fragment(fields: &[&str], line: usize) -> Result<Record> {
    require(fields, 8, "Fragment", line)?;
    let (external, orientation) = parse_reference(fields[2], line)?;
    let (segment_begin, t0) = parse_coordinate(fields[3], line)?;
    let (segment_end, t1) = parse_coordinate(fields[4], line)?;
    let (fragment_begin, t2) = parse_coordinate(fields[5], line)?;
    let (fragment_end, t3) = parse_coordinate(fields[6], line)?;
    Ok(Record::Fragment(Fragment {
        segment: fields[1].to_string(),
        external,
        orientation,
        segment_begin,
        segment_end,
        fragment_begin,
        fragment_end,
        terminals: Terminals::new([t0, t1, t2, t3]),
        alignment: fields[7].to_string(),
        tags: tags_from(fields, 8, line)?,
    }))
}

/// Gap endpoints may or may not carry an orientation suffix
fn parse_gap_end(field: &str) -> (String, Option<Orientation>) {
    match split_oriented(field) {
        Some((name, orientation)) => (name.to_string(), Some(orientation)),
        None => (field.to_string(), None),
    }
}

fn parse_gap(fields: &[&str], line: usize) -> Result<Record> {
    require(fields, 5, "Gap", line)?;
    let (source, source_orientation) = parse_gap_end(fields[2]);
    let (sink, sink_orientation) = parse_gap_end(fields[3]);
    let variance = optional_positional(fields, 5).map(str::to_string);
    let tag_start = if variance.is_some() { 6 } else { 5 };
    Ok(Record::Gap(Gap {
        id: fields[1].to_string(),
        source,
        source_orientation,
        sink,
        sink_orientation,
        distance: parse_i64(fields[4], "gap distance", line)?,
        variance,
        tags: tags_from(fields, tag_start, line)?,
    }))
}

fn parse_group(fields: &[&str], ordered: bool, line: usize) -> Result<Record> {
    require(fields, 3, "Group", line)?;
    let mut steps = Vec::new();
    for item in fields[2].split(' ').filter(|i| !i.is_empty()) {
        if ordered {
            let (segment, orientation) = parse_reference(item, line)?;
            steps.push(PathStep {
                segment,
                orientation,
            });
        } else {
            steps.push(PathStep::new(item, Orientation::Forward));
        }
    }
    Ok(Record::Group(Group {
        id: fields[1].to_string(),
        ordered,
        steps,
        tags: tags_from(fields, 3, line)?,
    }))
}

/// `W seg path [rank] orientation overlap`; the rank is present when the
/// fourth field is not an orientation.
fn parse_walk(fields: &[&str], line: usize) -> Result<Record> {
    require(fields, 5, "Walk", line)?;
    let (rank, orientation_index) = if Orientation::from_field(fields[3]).is_some() {
        (0, 3)
    } else {
        require(fields, 6, "Ranked walk", line)?;
        (parse_u64(fields[3], "walk rank", line)?, 4)
    };
    Ok(Record::Walk(Walk {
        segment: fields[1].to_string(),
        path: fields[2].to_string(),
        rank,
        orientation: parse_orientation(fields[orientation_index], line)?,
        overlap: fields[orientation_index + 1].to_string(),
        tags: tags_from(fields, orientation_index + 2, line)?,
    }))
}

fn parse_path_line(fields: &[&str], version: Version, line: usize) -> Result<Record> {
    match version {
        Version::V1_0 => parse_path(fields, line),
        Version::V0_1 => parse_walk(fields, line),
        Version::V2_0 => Err(GfaError::VersionMismatch {
            line,
            record: "P".to_string(),
            version: version.to_string(),
        }),
    }
}

fn parse_path(fields: &[&str], line: usize) -> Result<Record> {
    require(fields, 3, "Path", line)?;
    let mut steps = Vec::new();
    for step in fields[2].split(',').filter(|s| !s.is_empty()) {
        let (segment, orientation) = parse_reference(step, line)?;
        steps.push(PathStep {
            segment,
            orientation,
        });
    }

    let overlaps_field = optional_positional(fields, 3);
    let overlaps = match overlaps_field {
        Some("*") | None => Vec::new(),
        Some(list) => list.split(',').map(String::from).collect(),
    };
    let tag_start = if overlaps_field.is_some() { 4 } else { 3 };

    Ok(Record::Path(GfaPath {
        name: fields[1].to_string(),
        steps,
        overlaps,
        tags: tags_from(fields, tag_start, line)?,
    }))
}

fn parse_alignment(fields: &[&str], line: usize) -> Result<Record> {
    require(fields, 6, "Alignment", line)?;
    Ok(Record::Alignment(Alignment {
        source: fields[1].to_string(),
        position: parse_i64(fields[2], "alignment position", line)?,
        reference: fields[3].to_string(),
        orientation: parse_orientation(fields[4], line)?,
        length: parse_i64(fields[5], "alignment length", line)?,
        tags: tags_from(fields, 6, line)?,
    }))
}
