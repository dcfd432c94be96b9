use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use contig_merge::parser::{LoadConfig, ParserTolerance};
use contig_merge::pipeline::{self, MergeConfig};
use contig_merge::stats::AssemblyStats;
use contig_merge::writer::{self, OutputConfig};

/// Merge overlapping contigs into super-contigs along an overlap graph
#[derive(Parser, Debug)]
#[command(name = "contig-merge", version)]
struct Cli {
    /// Overlap graph (V/E lines)
    #[arg(short, long, value_name = "FILE")]
    graph: PathBuf,

    /// Contig sequences in FASTA format
    #[arg(short, long, value_name = "FILE")]
    contigs: PathBuf,

    /// Directory the merged contigs and reports are written to
    #[arg(short, long, value_name = "DIR")]
    out_dir: PathBuf,

    /// How to treat malformed graph lines: ignore-all, safe or pedantic
    #[arg(short, long, default_value = "safe")]
    tolerance: ParserTolerance,

    /// Only output contigs that appear in the overlap graph
    #[arg(long)]
    graph_only: bool,

    /// Merge and select on a single thread
    #[arg(long)]
    serial: bool,

    /// Wrap FASTA sequence lines at this width
    #[arg(long, value_name = "N")]
    line_width: Option<usize>,

    /// Keep the losing candidates of every branch: they are listed in
    /// merged_paths.tsv and written to rejected.tsv. Without this flag
    /// merged_paths.tsv lists only the winners.
    #[arg(long)]
    rejected: bool,

    /// Also write a JSON summary
    #[arg(long)]
    json: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn load_config(&self) -> LoadConfig {
        LoadConfig {
            tolerance: self.tolerance,
            include_unlinked: !self.graph_only,
        }
    }

    fn merge_config(&self) -> MergeConfig {
        MergeConfig {
            parallel: !self.serial,
            keep_rejected: self.rejected,
        }
    }

    fn output_config(&self) -> OutputConfig {
        OutputConfig {
            out_dir: self.out_dir.clone(),
            line_width: self.line_width,
            write_rejected: self.rejected,
            json: self.json,
        }
    }
}

fn log_stats(label: &str, stats: &AssemblyStats) {
    info!(
        "{}: {} contigs, {} bp, N50 {}, longest {}",
        label, stats.count, stats.total_length, stats.n50, stats.max_length
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(log_level))
        .init();

    let load_config = cli.load_config();
    let merge_config = cli.merge_config();
    let output_config = cli.output_config();

    let (graph, store) = pipeline::load(&cli.graph, &cli.contigs, &load_config)
        .with_context(|| {
            format!(
                "Failed to load {} and {}",
                cli.graph.display(),
                cli.contigs.display()
            )
        })?;
    info!(
        "Loaded {} contigs, {} overlaps",
        graph.vertex_count(),
        graph.edge_count()
    );

    let output = pipeline::run(&graph, &store, &merge_config)
        .context("Merging failed")?;

    log_stats("Input", &AssemblyStats::from_lengths(store.lengths()));
    log_stats("Output", &output.output_stats(&store));

    let written = writer::write_reports(&output_config, &output, &store)
        .with_context(|| {
            format!(
                "Failed to write reports to {}",
                output_config.out_dir.display()
            )
        })?;
    for path in written {
        info!("Wrote {}", path.display());
    }

    Ok(())
}
