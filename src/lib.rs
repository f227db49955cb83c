//! gfakit - GFA assembly graph toolkit
//!
//! A library for reading, normalizing and writing GFA (Graphical Fragment
//! Assembly) files in all three revisions of the format: 0.1, 1.0 and 2.0.
//!
//! # Features
//!
//! - Parse GFA 0.1 / 1.0 / 2.0 text, plain or gzipped
//! - Convert between revisions (walks, paths, links, containments, edges, groups)
//! - Serialize in declaration or block order with natural id sorting
//! - Shift numeric ids and merge independent graphs
//! - Extract id-range subgraphs and compare two graphs
//! - Fill segment sequences from an indexed FASTA file
//! - Compute assembly statistics
//!
//! # Example
//!
//! ```no_run
//! use gfakit::{GfaGraph, GfaStats, OutputOrder, Version};
//!
//! // Parse a GFA file
//! let mut graph = GfaGraph::from_file("example.gfa").unwrap();
//!
//! // Compute statistics
//! let stats = GfaStats::from_graph(&graph);
//! println!("{}", stats.format_summary());
//!
//! // Write it back as GFA 2.0
//! let text = graph.to_text(Version::V2_0, OutputOrder::Block);
//! std::fs::write("example.v2.gfa", text).unwrap();
//! ```

pub mod cli;
pub mod diff;
pub mod error;
pub mod fasta;
pub mod gfa;
pub mod grammar;
pub mod ids;
pub mod normalize;
pub mod record;
pub mod stats;
pub mod subset;
pub mod writer;

pub use diff::{diff, GraphDiff};
pub use error::{GfaError, Result};
pub use fasta::{FastaIndex, IndexedFasta, SequenceSource};
pub use gfa::{Diagnostic, GfaGraph};
pub use ids::{compute_offsets, merge, reidentify, IdOffsets};
pub use record::{Orientation, Record, Version};
pub use stats::GfaStats;
pub use writer::OutputOrder;
