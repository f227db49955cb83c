//! FASTA random access for filling in segment sequences
//!
//! [`FastaIndex`] records where each sequence starts and how its lines are
//! laid out, using the five samtools `.fai` columns. It can be stored as
//! `.fai` text or as a binary snapshot. [`IndexedFasta`] memory-maps the
//! FASTA file and serves whole sequences by name through [`SequenceSource`].

use crate::error::{GfaError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Magic number for binary index files
const INDEX_MAGIC: u64 = 0x4746_414B_4641_4931; // "GFAKFAI1" in hex

/// Binary index format version
const INDEX_VERSION: u32 = 1;

/// Anything that can supply a sequence for a segment name
pub trait SequenceSource {
    /// The sequence named `name`, or `None` when the source has no such record
    fn sequence_for(&self, name: &str) -> Result<Option<String>>;
}

impl SequenceSource for HashMap<String, String> {
    fn sequence_for(&self, name: &str) -> Result<Option<String>> {
        Ok(self.get(name).cloned())
    }
}

/// One `.fai` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaiEntry {
    /// Sequence name (first word of the header line)
    pub name: String,
    /// Number of bases
    pub length: u64,
    /// Byte offset of the first base
    pub offset: u64,
    /// Bases per full line
    pub line_bases: u64,
    /// Bytes per full line, including the line terminator
    pub line_bytes: u64,
}

impl FaiEntry {
    /// Byte offset just past the last base
    fn end_offset(&self) -> u64 {
        if self.line_bases == 0 {
            return self.offset;
        }
        let full_lines = self.length / self.line_bases;
        let rest = self.length % self.line_bases;
        self.offset + full_lines * self.line_bytes + rest
    }
}

/// Index over one FASTA file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastaIndex {
    /// Source FASTA file path
    pub source_file: String,
    /// Index version
    pub version: u32,
    /// Rows in file order
    pub entries: Vec<FaiEntry>,
    by_name: HashMap<String, usize>,
}

impl FastaIndex {
    fn from_entries(source_file: &str, entries: Vec<FaiEntry>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if by_name.insert(entry.name.clone(), i).is_some() {
                return Err(GfaError::Index(format!(
                    "Duplicate sequence name in {}: {}",
                    source_file, entry.name
                )));
            }
        }
        Ok(Self {
            source_file: source_file.to_string(),
            version: INDEX_VERSION,
            entries,
            by_name,
        })
    }

    /// Scan a FASTA file and index every record
    pub fn build<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GfaError::FileNotFound(path.display().to_string()));
        }
        let reader = BufReader::new(File::open(path)?);
        Self::from_reader(reader, &path.display().to_string())
    }

    /// Index FASTA text from a buffered reader
    pub fn from_reader<R: BufRead>(mut reader: R, source_file: &str) -> Result<Self> {
        let mut entries = Vec::new();
        let mut current: Option<FaiEntry> = None;
        let mut short_line_seen = false;
        let mut offset: u64 = 0;
        let mut line_num = 0;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }
            line_num += 1;
            offset += n as u64;

            let mut content = buf.as_slice();
            while let Some((last, rest)) = content.split_last() {
                if *last == b'\n' || *last == b'\r' {
                    content = rest;
                } else {
                    break;
                }
            }

            if let Some(header) = content.strip_prefix(b">") {
                entries.extend(current.take());
                let header = String::from_utf8_lossy(header);
                let name = header.split_whitespace().next().unwrap_or("");
                if name.is_empty() {
                    return Err(GfaError::Index(format!(
                        "Unnamed FASTA record at line {}",
                        line_num
                    )));
                }
                current = Some(FaiEntry {
                    name: name.to_string(),
                    length: 0,
                    offset,
                    line_bases: 0,
                    line_bytes: 0,
                });
                short_line_seen = false;
                continue;
            }

            let entry = match current.as_mut() {
                Some(entry) => entry,
                None if content.is_empty() => continue,
                None => {
                    return Err(GfaError::Index(format!(
                        "Sequence data before the first header at line {}",
                        line_num
                    )))
                }
            };

            let bases = content.len() as u64;
            if bases == 0 && entry.line_bases == 0 {
                entry.offset = offset;
                continue;
            }
            if short_line_seen && bases > 0 {
                return Err(GfaError::Index(format!(
                    "Different line length in sequence {} at line {}",
                    entry.name, line_num
                )));
            }
            if entry.line_bases == 0 {
                entry.line_bases = bases;
                entry.line_bytes = n as u64;
            } else if bases > entry.line_bases {
                return Err(GfaError::Index(format!(
                    "Different line length in sequence {} at line {}",
                    entry.name, line_num
                )));
            }
            if bases < entry.line_bases {
                short_line_seen = true;
            }
            entry.length += bases;
        }
        entries.extend(current);

        debug!(records = entries.len(), source = source_file, "indexed FASTA");
        Self::from_entries(source_file, entries)
    }

    /// Default `.fai` location next to a FASTA file
    pub fn fai_path<P: AsRef<Path>>(fasta: P) -> PathBuf {
        let mut name = fasta.as_ref().as_os_str().to_owned();
        name.push(".fai");
        PathBuf::from(name)
    }

    /// Parse samtools `.fai` text
    pub fn parse_fai<R: BufRead>(reader: R, source_file: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 5 {
                return Err(GfaError::Index(format!(
                    "FAI line {} has {} columns, expected 5",
                    line_num + 1,
                    fields.len()
                )));
            }
            let number = |i: usize| -> Result<u64> {
                fields[i].trim().parse().map_err(|_| {
                    GfaError::Index(format!(
                        "Invalid number '{}' in FAI line {}",
                        fields[i],
                        line_num + 1
                    ))
                })
            };
            entries.push(FaiEntry {
                name: fields[0].to_string(),
                length: number(1)?,
                offset: number(2)?,
                line_bases: number(3)?,
                line_bytes: number(4)?,
            });
        }
        Self::from_entries(source_file, entries)
    }

    /// Read a `.fai` file
    pub fn read_fai<P: AsRef<Path>>(fai: P, source_file: &str) -> Result<Self> {
        let fai = fai.as_ref();
        if !fai.exists() {
            return Err(GfaError::FileNotFound(fai.display().to_string()));
        }
        Self::parse_fai(BufReader::new(File::open(fai)?), source_file)
    }

    /// Render as samtools `.fai` text
    pub fn to_fai_string(&self) -> String {
        let mut output = String::new();
        for e in &self.entries {
            output.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\n",
                e.name, e.length, e.offset, e.line_bases, e.line_bytes
            ));
        }
        output
    }

    /// Write a `.fai` file
    pub fn write_fai<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(self.to_fai_string().as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Save as a binary snapshot
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writer.write_u64::<LittleEndian>(INDEX_MAGIC)?;
        writer.write_u32::<LittleEndian>(self.version)?;

        let data = bincode::serialize(self)?;
        writer.write_u64::<LittleEndian>(data.len() as u64)?;
        writer.write_all(&data)?;
        writer.flush()?;

        Ok(())
    }

    /// Load a binary snapshot
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GfaError::FileNotFound(path.display().to_string()));
        }

        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let magic = reader.read_u64::<LittleEndian>()?;
        if magic != INDEX_MAGIC {
            return Err(GfaError::Index("Invalid index file format".to_string()));
        }

        let version = reader.read_u32::<LittleEndian>()?;
        if version > INDEX_VERSION {
            return Err(GfaError::Index(format!(
                "Index version {} not supported (max: {})",
                version, INDEX_VERSION
            )));
        }

        let data_len = reader.read_u64::<LittleEndian>()? as usize;
        let mut data = vec![0u8; data_len];
        reader.read_exact(&mut data)?;

        let index: FastaIndex = bincode::deserialize(&data)?;
        Ok(index)
    }

    pub fn get(&self, name: &str) -> Option<&FaiEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// Sequence names in file order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get index summary
    pub fn summary(&self) -> String {
        let total: u64 = self.entries.iter().map(|e| e.length).sum();
        let mut output = String::new();
        output.push_str("=== FASTA Index Summary ===\n\n");
        output.push_str(&format!("Source file: {}\n", self.source_file));
        output.push_str(&format!("Version: {}\n", self.version));
        output.push_str(&format!("Sequences: {}\n", self.entries.len()));
        output.push_str(&format!("Total bases: {}\n", total));
        output
    }
}

/// A memory-mapped FASTA file plus its index
pub struct IndexedFasta {
    /// The index
    pub index: FastaIndex,
    data: Mmap,
}

impl IndexedFasta {
    /// Map `fasta` for reading through `index`
    pub fn open<P: AsRef<Path>>(fasta: P, index: FastaIndex) -> Result<Self> {
        let fasta = fasta.as_ref();
        if !fasta.exists() {
            return Err(GfaError::FileNotFound(fasta.display().to_string()));
        }
        let file = File::open(fasta)?;
        // SAFETY: the map is read-only and the file is not modified by this
        // process while the map is alive.
        let data = unsafe { Mmap::map(&file)? };
        Ok(Self { index, data })
    }

    /// Open `fasta` using `fasta.fai`, building and writing the `.fai` when
    /// it does not exist yet
    pub fn open_or_index<P: AsRef<Path>>(fasta: P) -> Result<Self> {
        let fasta = fasta.as_ref();
        let fai = FastaIndex::fai_path(fasta);
        let source = fasta.display().to_string();

        let index = if fai.exists() {
            FastaIndex::read_fai(&fai, &source)?
        } else {
            let index = FastaIndex::build(fasta)?;
            if let Err(e) = index.write_fai(&fai) {
                warn!(path = %fai.display(), error = %e, "could not write FASTA index");
            }
            index
        };
        Self::open(fasta, index)
    }

    /// Whole sequence of a record, line breaks removed
    pub fn fetch(&self, name: &str) -> Result<Option<String>> {
        let entry = match self.index.get(name) {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let start = entry.offset as usize;
        let end = entry.end_offset() as usize;
        let bytes = self.data.get(start..end).ok_or_else(|| {
            GfaError::Index(format!(
                "Sequence {} lies outside {} (bytes {}..{})",
                name, self.index.source_file, start, end
            ))
        })?;

        let sequence: Vec<u8> = bytes
            .iter()
            .copied()
            .filter(|b| *b != b'\n' && *b != b'\r')
            .collect();
        String::from_utf8(sequence)
            .map(Some)
            .map_err(|_| GfaError::Index(format!("Sequence {} is not valid text", name)))
    }
}

impl SequenceSource for IndexedFasta {
    fn sequence_for(&self, name: &str) -> Result<Option<String>> {
        self.fetch(name)
    }
}

/// Write one FASTA record, wrapping the sequence every `line_width` bases
/// (no wrapping when `line_width` is 0)
pub fn write_record<W: Write>(
    writer: &mut W,
    name: &str,
    sequence: &str,
    line_width: usize,
) -> Result<()> {
    writeln!(writer, ">{}", name)?;
    if line_width == 0 || sequence.len() <= line_width {
        writeln!(writer, "{}", sequence)?;
        return Ok(());
    }
    for chunk in sequence.as_bytes().chunks(line_width) {
        writer.write_all(chunk)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}
