//! Command-line interface for gfakit

use crate::diff::diff;
use crate::fasta::{write_record, FastaIndex, IndexedFasta};
use crate::gfa::GfaGraph;
use crate::ids::{merge, reidentify, IdOffsets};
use crate::record::{natural_cmp, Version};
use crate::stats::GfaStats;
use crate::writer::OutputOrder;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// gfakit - read, convert and combine GFA assembly graphs
#[derive(Parser)]
#[command(name = "gfakit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log normalization passes and parse summaries
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Convert a GFA file to another format version
    Convert {
        /// Path to the GFA file (plain or gzipped)
        #[arg(short, long)]
        input: PathBuf,

        /// Target version (0.1, 1.0 or 2.0)
        #[arg(short, long)]
        spec: Version,

        /// Group output lines by record type
        #[arg(short, long)]
        block_order: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Re-emit a GFA file in natural id order
    Sort {
        /// Path to the GFA file
        #[arg(short, long)]
        input: PathBuf,

        /// Group output lines by record type
        #[arg(short, long)]
        block_order: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Display statistics about a GFA file
    Stats {
        /// Path to the GFA file
        #[arg(short, long)]
        input: PathBuf,

        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge several GFA files into one GFA 2.0 graph
    Merge {
        /// GFA files, merged left to right
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Group output lines by record type
        #[arg(short, long)]
        block_order: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Shift numeric ids so several GFA files can be concatenated
    Ids {
        /// GFA files, shifted in order
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Ids to start past, as segment:edge:fragment:gap:group
        #[arg(long, default_value = "0:0:0:0:0")]
        start_ids: IdOffsets,

        /// Group output lines by record type
        #[arg(short, long)]
        block_order: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract the GFA 2.0 subgraph of segments in a numeric id range
    Subset {
        /// Path to the GFA file
        #[arg(short, long)]
        input: PathBuf,

        /// First segment id to keep
        #[arg(short = 'S', long, default_value_t = 0)]
        start: u64,

        /// Last segment id to keep
        #[arg(short = 'E', long, default_value_t = u64::MAX)]
        end: u64,

        /// Group output lines by record type
        #[arg(short, long)]
        block_order: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report the differences between two GFA files
    Diff {
        /// First GFA file
        first: PathBuf,

        /// Second GFA file
        second: PathBuf,

        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fill placeholder segment sequences from a FASTA file
    Fillseq {
        /// Path to the GFA file
        #[arg(short, long)]
        input: PathBuf,

        /// FASTA file holding the sequences (indexed on first use)
        #[arg(short, long)]
        fasta: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build an index for a FASTA file
    Index {
        /// Path to the FASTA file
        #[arg(short, long)]
        fasta: PathBuf,

        /// Output index path (FASTA.fai, or FASTA.idx with --binary)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write a binary snapshot instead of a .fai text index
        #[arg(long)]
        binary: bool,
    },

    /// Write every segment sequence as FASTA
    Extract {
        /// Path to the GFA file
        #[arg(short, long)]
        input: PathBuf,

        /// Bases per FASTA line (0 keeps each sequence on one line)
        #[arg(short, long, default_value_t = 0)]
        width: usize,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a GFA file
    Validate {
        /// Path to the GFA file
        #[arg(short, long)]
        input: PathBuf,

        /// List every issue instead of the first few
        #[arg(long)]
        all: bool,
    },
}

/// Run the CLI application
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Convert {
            input,
            spec,
            block_order,
            output,
        } => cmd_convert(&input, spec, order_for(block_order), output.as_deref()),
        Commands::Sort {
            input,
            block_order,
            output,
        } => cmd_sort(&input, order_for(block_order), output.as_deref()),
        Commands::Stats {
            input,
            format,
            output,
        } => cmd_stats(&input, &format, output.as_deref()),
        Commands::Merge {
            inputs,
            block_order,
            output,
        } => cmd_merge(&inputs, order_for(block_order), output.as_deref()),
        Commands::Ids {
            inputs,
            start_ids,
            block_order,
            output,
        } => cmd_ids(&inputs, start_ids, order_for(block_order), output.as_deref()),
        Commands::Subset {
            input,
            start,
            end,
            block_order,
            output,
        } => cmd_subset(&input, start, end, order_for(block_order), output.as_deref()),
        Commands::Diff {
            first,
            second,
            format,
            output,
        } => cmd_diff(&first, &second, &format, output.as_deref()),
        Commands::Fillseq {
            input,
            fasta,
            output,
        } => cmd_fillseq(&input, &fasta, output.as_deref()),
        Commands::Index {
            fasta,
            output,
            binary,
        } => cmd_index(&fasta, output.as_deref(), binary),
        Commands::Extract {
            input,
            width,
            output,
        } => cmd_extract(&input, width, output.as_deref()),
        Commands::Validate { input, all } => cmd_validate(&input, all),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed when run from tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

fn order_for(block_order: bool) -> OutputOrder {
    if block_order {
        OutputOrder::Block
    } else {
        OutputOrder::Declaration
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn open_output(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

fn load_graph(path: &Path, spinner: &ProgressBar) -> Result<GfaGraph> {
    spinner.set_message(format!("Reading {}...", path.display()));
    GfaGraph::from_file(path).with_context(|| format!("failed to read {}", path.display()))
}

fn cmd_convert(
    input: &Path,
    version: Version,
    order: OutputOrder,
    output: Option<&Path>,
) -> Result<()> {
    let spinner = create_spinner("Reading GFA file...");
    let start = Instant::now();

    let mut graph = load_graph(input, &spinner)?;
    spinner.set_message(format!("Converting to GFA {}...", version));

    let mut out = open_output(output)?;
    graph.write_to(&mut out, version, order)?;
    out.flush()?;
    spinner.finish_with_message(format!("Converted in {:.2?}", start.elapsed()));

    Ok(())
}

fn cmd_sort(input: &Path, order: OutputOrder, output: Option<&Path>) -> Result<()> {
    let spinner = create_spinner("Reading GFA file...");
    let start = Instant::now();

    let mut graph = load_graph(input, &spinner)?;
    let version = graph.version;

    let mut out = open_output(output)?;
    graph.write_to(&mut out, version, order)?;
    out.flush()?;
    spinner.finish_with_message(format!("Sorted in {:.2?}", start.elapsed()));

    Ok(())
}

fn cmd_stats(input: &Path, format: &str, output: Option<&Path>) -> Result<()> {
    let spinner = create_spinner("Reading GFA file...");
    let start = Instant::now();

    let graph = load_graph(input, &spinner)?;
    spinner.set_message("Computing statistics...");

    let stats = GfaStats::from_graph(&graph);
    spinner.finish_with_message(format!("Done in {:.2?}", start.elapsed()));

    let output_text = match format.to_lowercase().as_str() {
        "json" => stats.to_json()?,
        "text" => stats.format_summary(),
        other => bail!("Invalid stats format: {}. Valid formats: text, json", other),
    };

    if let Some(output_path) = output {
        std::fs::write(output_path, &output_text)?;
        println!("Statistics written to: {}", output_path.display());
    } else {
        println!("{}", output_text);
    }

    Ok(())
}

fn cmd_merge(inputs: &[PathBuf], order: OutputOrder, output: Option<&Path>) -> Result<()> {
    let spinner = create_spinner("Reading GFA files...");
    let start = Instant::now();

    let mut merged: Option<GfaGraph> = None;
    for input in inputs {
        let graph = load_graph(input, &spinner)?;
        merged = Some(match merged {
            Some(acc) => merge(acc, graph)
                .with_context(|| format!("failed to merge {}", input.display()))?,
            None => graph,
        });
    }
    let mut merged = match merged {
        Some(graph) => graph,
        None => bail!("No input files given"),
    };

    let mut out = open_output(output)?;
    merged.write_to(&mut out, Version::V2_0, order)?;
    out.flush()?;
    spinner.finish_with_message(format!(
        "Merged {} files in {:.2?}",
        inputs.len(),
        start.elapsed()
    ));

    Ok(())
}

fn cmd_ids(
    inputs: &[PathBuf],
    start_ids: IdOffsets,
    order: OutputOrder,
    output: Option<&Path>,
) -> Result<()> {
    let spinner = create_spinner("Reading GFA files...");
    let mut out = open_output(output)?;

    let mut offsets = start_ids;
    for input in inputs {
        let mut graph = load_graph(input, &spinner)?;
        offsets = reidentify(&mut graph, offsets)
            .with_context(|| format!("failed to shift ids of {}", input.display()))?;
        let version = graph.version;
        graph.write_to(&mut out, version, order)?;
    }
    out.flush()?;
    spinner.finish_and_clear();

    eprintln!("{}", offsets);
    Ok(())
}

fn cmd_subset(
    input: &Path,
    start: u64,
    end: u64,
    order: OutputOrder,
    output: Option<&Path>,
) -> Result<()> {
    if start > end {
        bail!("Invalid id range: start {} is past end {}", start, end);
    }
    let spinner = create_spinner("Reading GFA file...");
    let begin = Instant::now();

    let mut graph = load_graph(input, &spinner)?;
    spinner.set_message(format!("Extracting segments {} to {}...", start, end));
    let mut sub = graph.subset(start, end);

    let mut out = open_output(output)?;
    sub.write_to(&mut out, Version::V2_0, order)?;
    out.flush()?;
    spinner.finish_with_message(format!(
        "Kept {} of {} segments in {:.2?}",
        sub.segment_count(),
        graph.segment_count(),
        begin.elapsed()
    ));

    Ok(())
}

fn cmd_diff(first: &Path, second: &Path, format: &str, output: Option<&Path>) -> Result<()> {
    let spinner = create_spinner("Reading GFA files...");
    let start = Instant::now();

    let mut a = load_graph(first, &spinner)?;
    let mut b = load_graph(second, &spinner)?;
    spinner.set_message("Comparing graphs...");
    let result = diff(&mut a, &mut b);
    spinner.finish_with_message(format!(
        "{} differences found in {:.2?}",
        result.len(),
        start.elapsed()
    ));

    let output_text = match format.to_lowercase().as_str() {
        "json" => result.to_json()?,
        "text" => result.format_report(),
        other => bail!("Invalid diff format: {}. Valid formats: text, json", other),
    };

    let mut out = open_output(output)?;
    out.write_all(output_text.as_bytes())?;
    out.flush()?;

    Ok(())
}

fn cmd_fillseq(input: &Path, fasta: &Path, output: Option<&Path>) -> Result<()> {
    let spinner = create_spinner("Reading GFA file...");
    let start = Instant::now();

    let mut graph = load_graph(input, &spinner)?;
    spinner.set_message(format!("Indexing {}...", fasta.display()));
    let sequences = IndexedFasta::open_or_index(fasta)
        .with_context(|| format!("failed to open {}", fasta.display()))?;

    spinner.set_message("Filling sequences...");
    let filled = graph.fill_sequences(&sequences)?;

    let version = graph.version;
    let mut out = open_output(output)?;
    graph.write_to(&mut out, version, OutputOrder::Declaration)?;
    out.flush()?;
    spinner.finish_with_message(format!(
        "Filled {} sequences in {:.2?}",
        filled,
        start.elapsed()
    ));

    Ok(())
}

fn cmd_index(fasta: &Path, output: Option<&Path>, binary: bool) -> Result<()> {
    let spinner = create_spinner("Reading FASTA file...");
    let start = Instant::now();

    let index = FastaIndex::build(fasta)
        .with_context(|| format!("failed to index {}", fasta.display()))?;
    spinner.set_message("Saving index...");

    let output = match output {
        Some(path) => path.to_path_buf(),
        None if binary => PathBuf::from(format!("{}.idx", fasta.display())),
        None => FastaIndex::fai_path(fasta),
    };
    if binary {
        index.save(&output)?;
    } else {
        index.write_fai(&output)?;
    }
    spinner.finish_with_message(format!("Index built and saved in {:.2?}", start.elapsed()));

    println!("\n{}", index.summary());
    println!("Index saved to: {}", output.display());

    Ok(())
}

fn cmd_extract(input: &Path, width: usize, output: Option<&Path>) -> Result<()> {
    let spinner = create_spinner("Reading GFA file...");

    let graph = load_graph(input, &spinner)?;
    let mut segments: Vec<_> = graph.segments.values().collect();
    segments.sort_by(|a, b| natural_cmp(&a.name, &b.name));

    let mut out = open_output(output)?;
    let mut skipped = 0;
    for segment in segments {
        if !segment.has_sequence() {
            skipped += 1;
            continue;
        }
        write_record(&mut out, &segment.name, &segment.sequence, width)?;
    }
    out.flush()?;

    if skipped > 0 {
        spinner.finish_with_message(format!("Skipped {} segments without a sequence", skipped));
    } else {
        spinner.finish_and_clear();
    }
    Ok(())
}

fn print_issues(label: &str, marker: &str, issues: &[String], all: bool) {
    println!("{} ({}):", label, issues.len());
    let shown = if all { issues.len() } else { 5 };
    for issue in issues.iter().take(shown) {
        println!("  {} {}", marker, issue);
    }
    if issues.len() > shown {
        println!("  ... and {} more", issues.len() - shown);
    }
}

fn cmd_validate(input: &Path, all: bool) -> Result<()> {
    let spinner = create_spinner("Validating GFA file...");
    let start = Instant::now();

    let graph = load_graph(input, &spinner)?;
    spinner.finish_with_message(format!("File parsed in {:.2?}", start.elapsed()));

    let errors: Vec<String> = graph
        .dangling_references()
        .iter()
        .map(ToString::to_string)
        .collect();

    let mut warnings: Vec<String> = graph
        .diagnostics()
        .iter()
        .map(ToString::to_string)
        .collect();
    let mut placeholders: Vec<&str> = graph
        .segments
        .values()
        .filter(|s| !s.has_sequence())
        .map(|s| s.name.as_str())
        .collect();
    placeholders.sort_by(|a, b| natural_cmp(a, b));
    warnings.extend(
        placeholders
            .into_iter()
            .map(|name| format!("segment {} has no sequence", name)),
    );

    println!("\n=== Validation Results ===\n");
    println!("GFA version: {}", graph.version);
    println!("Segments: {}", graph.segment_count());
    println!("Links: {}", graph.links.len());
    println!("Edges: {}", graph.edges.len());
    println!("Paths: {}", graph.paths.len());
    println!("Groups: {}", graph.groups.len());
    println!();

    if errors.is_empty() && warnings.is_empty() {
        println!("✓ No issues found");
    } else {
        if !errors.is_empty() {
            print_issues("Errors", "✗", &errors, all);
            println!();
        }
        if !warnings.is_empty() {
            print_issues("Warnings", "⚠", &warnings, all);
        }
    }

    if errors.is_empty() {
        println!("\n✓ Validation passed");
        Ok(())
    } else {
        bail!("validation failed with {} errors", errors.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SIMPLE: &str = "H\tVN:Z:1.0\n\
                          S\t1\tACGT\n\
                          S\t2\tGGTT\n\
                          L\t1\t+\t2\t+\t4M\n\
                          P\tpath1\t1+,2+\t4M\n";

    fn write_input(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_cli_parse_convert() {
        let cli = Cli::try_parse_from([
            "gfakit", "convert", "-i", "test.gfa", "-s", "2.0", "-b", "-o", "out.gfa",
        ])
        .unwrap();
        match cli.command {
            Commands::Convert {
                input,
                spec,
                block_order,
                output,
            } => {
                assert_eq!(input, PathBuf::from("test.gfa"));
                assert_eq!(spec, Version::V2_0);
                assert!(block_order);
                assert_eq!(output, Some(PathBuf::from("out.gfa")));
            }
            _ => panic!("Expected Convert command"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_version() {
        assert!(Cli::try_parse_from(["gfakit", "convert", "-i", "x.gfa", "-s", "7"]).is_err());
    }

    #[test]
    fn test_cli_parse_ids() {
        let cli = Cli::try_parse_from([
            "gfakit",
            "-v",
            "ids",
            "a.gfa",
            "b.gfa",
            "--start-ids",
            "10:0:0:0:3",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Ids {
                inputs, start_ids, ..
            } => {
                assert_eq!(inputs.len(), 2);
                assert_eq!(start_ids.segment, 10);
                assert_eq!(start_ids.group, 3);
            }
            _ => panic!("Expected Ids command"),
        }
    }

    #[test]
    fn test_cli_parse_index_defaults() {
        let cli = Cli::try_parse_from(["gfakit", "index", "-f", "ref.fa"]).unwrap();
        match cli.command {
            Commands::Index {
                fasta,
                output,
                binary,
            } => {
                assert_eq!(fasta, PathBuf::from("ref.fa"));
                assert!(output.is_none());
                assert!(!binary);
            }
            _ => panic!("Expected Index command"),
        }
    }

    #[test]
    fn test_cli_merge_requires_inputs() {
        assert!(Cli::try_parse_from(["gfakit", "merge"]).is_err());
    }

    #[test]
    fn test_convert_writes_v2() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "in.gfa", SIMPLE);
        let output = dir.path().join("out.gfa");

        cmd_convert(&input, Version::V2_0, OutputOrder::Block, Some(&output)).unwrap();

        let graph = GfaGraph::from_file(&output).unwrap();
        assert_eq!(graph.version, Version::V2_0);
        assert_eq!(graph.edges.len(), 1);
        assert!(graph.groups.contains_key("path1"));
    }

    #[test]
    fn test_ids_concatenation_is_disjoint() {
        let dir = TempDir::new().unwrap();
        let a = write_input(&dir, "a.gfa", SIMPLE);
        let b = write_input(&dir, "b.gfa", SIMPLE);
        let output = dir.path().join("out.gfa");

        cmd_ids(
            &[a, b],
            IdOffsets::default(),
            OutputOrder::Block,
            Some(&output),
        )
        .unwrap();

        let graph = GfaGraph::from_file(&output).unwrap();
        let mut names = graph.sorted_segment_names();
        names.dedup();
        assert_eq!(names, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_cli_parse_subset() {
        let cli =
            Cli::try_parse_from(["gfakit", "subset", "-i", "g.gfa", "-S", "5", "-E", "9"]).unwrap();
        match cli.command {
            Commands::Subset {
                input,
                start,
                end,
                block_order,
                output,
            } => {
                assert_eq!(input, PathBuf::from("g.gfa"));
                assert_eq!((start, end), (5, 9));
                assert!(!block_order);
                assert!(output.is_none());
            }
            _ => panic!("Expected Subset command"),
        }

        match Cli::try_parse_from(["gfakit", "subset", "-i", "g.gfa"]).unwrap().command {
            Commands::Subset { start, end, .. } => assert_eq!((start, end), (0, u64::MAX)),
            _ => panic!("Expected Subset command"),
        }
    }

    #[test]
    fn test_cli_diff_requires_two_files() {
        assert!(Cli::try_parse_from(["gfakit", "diff", "a.gfa"]).is_err());
        assert!(Cli::try_parse_from(["gfakit", "diff", "a.gfa", "b.gfa"]).is_ok());
    }

    #[test]
    fn test_subset_writes_v2() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "in.gfa", SIMPLE);
        let output = dir.path().join("sub.gfa");

        cmd_subset(&input, 2, 2, OutputOrder::Block, Some(&output)).unwrap();

        let graph = GfaGraph::from_file(&output).unwrap();
        assert_eq!(graph.version, Version::V2_0);
        assert_eq!(graph.sorted_segment_names(), vec!["2"]);
        assert!(graph.edges.is_empty());
        assert_eq!(graph.groups["path1"].steps.len(), 1);

        assert!(cmd_subset(&input, 3, 2, OutputOrder::Block, Some(&output)).is_err());
    }

    #[test]
    fn test_diff_report() {
        let dir = TempDir::new().unwrap();
        let a = write_input(&dir, "a.gfa", SIMPLE);
        let b = write_input(&dir, "b.gfa", "S\t1\tACGT\nS\t2\tGGTA\nP\tpath1\t1+,2+\t4M\n");
        let output = dir.path().join("diff.txt");

        cmd_diff(&a, &b, "text", Some(&output)).unwrap();

        let report = std::fs::read_to_string(&output).unwrap();
        assert!(report.contains("! segment 2\n"));
        assert!(report.contains("< edge 1+ 2+ 4$ 4$ 0 0 4M\n"));
        assert!(cmd_diff(&a, &b, "yaml", None).is_err());
    }

    #[test]
    fn test_extract_writes_fasta() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "in.gfa", "S\t2\tGGTT\nS\t1\tACGT\nS\t3\t*\n");
        let output = dir.path().join("out.fa");

        cmd_extract(&input, 0, Some(&output)).unwrap();

        let fasta = std::fs::read_to_string(&output).unwrap();
        assert_eq!(fasta, ">1\nACGT\n>2\nGGTT\n");
    }

    #[test]
    fn test_fillseq_from_fasta() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "in.gfa", "S\ts1\t*\nS\ts2\tAC\n");
        let fasta = write_input(&dir, "ref.fa", ">s1\nACGTA\nCG\n");
        let output = dir.path().join("out.gfa");

        cmd_fillseq(&input, &fasta, Some(&output)).unwrap();

        let graph = GfaGraph::from_file(&output).unwrap();
        assert_eq!(graph.segments["s1"].sequence, "ACGTACG");
        assert_eq!(graph.segments["s1"].length, 7);
        assert!(FastaIndex::fai_path(&fasta).exists());
    }

    #[test]
    fn test_validate_reports_dangling_reference() {
        let dir = TempDir::new().unwrap();
        let good = write_input(&dir, "good.gfa", SIMPLE);
        let bad = write_input(&dir, "bad.gfa", "S\t1\tACGT\nL\t1\t+\t9\t+\t0M\n");

        assert!(cmd_validate(&good, false).is_ok());
        assert!(cmd_validate(&bad, true).is_err());
    }
}
