use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use bio::io::fasta;
use bstr::ByteSlice;

use crate::merge::MergedContig;
use crate::pipeline::FinalOutput;
use crate::select::{BranchSelection, Tiebreak};
use crate::sequence::SequenceStore;
use crate::stats::AssemblyStats;

pub const FASTA_FILE: &str = "merged_contigs.fa";
pub const MERGE_REPORT_FILE: &str = "merged_paths.tsv";
pub const BRANCH_REPORT_FILE: &str = "branches.tsv";
pub const REJECTED_REPORT_FILE: &str = "rejected.tsv";
pub const STATS_FILE: &str = "stats.tsv";
pub const JSON_SUMMARY_FILE: &str = "summary.json";

/// Where and how the reports are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub out_dir: PathBuf,
    /// Wrap FASTA sequence lines at this width; `None` writes each
    /// sequence on one line
    pub line_width: Option<usize>,
    pub write_rejected: bool,
    pub json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            out_dir: PathBuf::from("."),
            line_width: None,
            write_rejected: false,
            json: false,
        }
    }
}

/// `fasta::Writer` with optional line wrapping. The underlying writer
/// puts each sequence on a single line, so wrapped sequences are
/// handed to it with the line breaks already in place.
pub struct FastaWriter<W: Write> {
    inner: fasta::Writer<W>,
    line_width: Option<usize>,
}

impl<W: Write> FastaWriter<W> {
    pub fn new(out: W, line_width: Option<usize>) -> Self {
        FastaWriter {
            inner: fasta::Writer::new(out),
            line_width: line_width.filter(|&w| w > 0),
        }
    }

    pub fn write(&mut self, id: &str, sequence: &[u8]) -> io::Result<()> {
        match self.line_width {
            Some(width) if sequence.len() > width => {
                let lines: Vec<&[u8]> = sequence.chunks(width).collect();
                self.inner.write(id, None, &lines.join(&b'\n'))
            }
            _ => self.inner.write(id, None, sequence),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Write the final output set: winning merged contigs by ordinal, then
/// isolated contigs under their own names.
pub fn write_fasta<W: Write>(
    out: &mut W,
    output: &FinalOutput,
    store: &SequenceStore,
    line_width: Option<usize>,
) -> io::Result<()> {
    let mut writer = FastaWriter::new(out, line_width);

    for merged in output.winners() {
        writer.write(&merged.id(), merged.sequence())?;
    }

    for &ix in output.isolated() {
        let name = output.vertex_name(ix);
        if let Some(seq) = store.get(name) {
            writer.write(&name.to_str_lossy(), seq)?;
        }
    }
    writer.flush()
}

fn component_names(output: &FinalOutput, merged: &MergedContig) -> String {
    merged
        .components()
        .map(|v| output.vertex_name(v).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn component_lengths(output: &FinalOutput, merged: &MergedContig) -> String {
    merged
        .component_lengths()
        .iter()
        .map(|c| {
            format!(
                "{}:{}:{}",
                output.vertex_name(c.vertex),
                c.original,
                c.contributed
            )
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// One row per retained merged contig, by ordinal
pub fn write_merge_report<W: Write>(
    out: &mut W,
    output: &FinalOutput,
) -> io::Result<()> {
    writeln!(
        out,
        "id\tcomponents\tcomponent_lengths\ttotal_error\tmerged_length\tpath_score"
    )?;
    for merged in output.candidates() {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}",
            merged.id(),
            component_names(output, merged),
            component_lengths(output, merged),
            merged.total_error(),
            merged.merged_length(),
            merged.path_score()
        )?;
    }
    Ok(())
}

/// The reported fields of one branch selection
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct BranchSummary {
    pub root: String,
    pub candidates: usize,
    pub winner: String,
    pub winner_error: usize,
    pub winner_length: usize,
    pub winner_components: usize,
    pub winner_score: f64,
    pub ties: usize,
    pub tiebreak: Tiebreak,
}

impl BranchSummary {
    pub fn new(output: &FinalOutput, branch: &BranchSelection) -> Self {
        BranchSummary {
            root: output.vertex_name(branch.root).to_string(),
            candidates: branch.candidates,
            winner: branch.winner.id(),
            winner_error: branch.winner.total_error(),
            winner_length: branch.winner.merged_length(),
            winner_components: branch.winner.component_count(),
            winner_score: branch.winner.path_score(),
            ties: branch.ties,
            tiebreak: branch.tiebreak,
        }
    }
}

pub fn write_branch_report<W: Write>(
    out: &mut W,
    output: &FinalOutput,
) -> io::Result<()> {
    writeln!(
        out,
        "root\tcandidates\twinner\twinner_error\twinner_length\twinner_components\twinner_score\tties\ttiebreak"
    )?;
    for branch in output.branches() {
        let s = BranchSummary::new(output, branch);
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            s.root,
            s.candidates,
            s.winner,
            s.winner_error,
            s.winner_length,
            s.winner_components,
            s.winner_score,
            s.ties,
            s.tiebreak
        )?;
    }
    Ok(())
}

/// The losing candidates of every branch, with the root they lost under
pub fn write_rejected_report<W: Write>(
    out: &mut W,
    output: &FinalOutput,
) -> io::Result<()> {
    writeln!(
        out,
        "root\tid\tcomponents\ttotal_error\tmerged_length\tpath_score"
    )?;
    for branch in output.branches() {
        let root = output.vertex_name(branch.root);
        for merged in branch.rejected.iter() {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}",
                root,
                merged.id(),
                component_names(output, merged),
                merged.total_error(),
                merged.merged_length(),
                merged.path_score()
            )?;
        }
    }
    Ok(())
}

pub fn write_stats<W: Write>(
    out: &mut W,
    stats: &[(&str, AssemblyStats)],
) -> io::Result<()> {
    writeln!(out, "set\tcount\ttotal\tmin\tmax\tmean\tmedian\tn50")?;
    for (label, s) in stats {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{:.2}\t{:.1}\t{}",
            label,
            s.count,
            s.total_length,
            s.min_length,
            s.max_length,
            s.mean_length,
            s.median_length,
            s.n50
        )?;
    }
    Ok(())
}

#[cfg(feature = "serde1")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub paths: usize,
    pub isolated: Vec<String>,
    pub branches: Vec<BranchSummary>,
    pub input: AssemblyStats,
    pub output: AssemblyStats,
}

#[cfg(feature = "serde1")]
impl Summary {
    pub fn new(output: &FinalOutput, store: &SequenceStore) -> Self {
        Summary {
            paths: output.path_count(),
            isolated: output
                .isolated()
                .iter()
                .map(|&ix| output.vertex_name(ix).to_string())
                .collect(),
            branches: output
                .branches()
                .iter()
                .map(|b| BranchSummary::new(output, b))
                .collect(),
            input: AssemblyStats::from_lengths(store.lengths()),
            output: output.output_stats(store),
        }
    }
}

#[cfg(feature = "serde1")]
pub fn write_json_summary<W: Write>(
    out: &mut W,
    output: &FinalOutput,
    store: &SequenceStore,
) -> io::Result<()> {
    let summary = Summary::new(output, store);
    serde_json::to_writer_pretty(&mut *out, &summary)?;
    writeln!(out)
}

fn create(dir: &Path, name: &str) -> io::Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(dir.join(name))?))
}

/// Write every report into `config.out_dir`, creating it if needed.
/// Returns the paths written.
pub fn write_reports(
    config: &OutputConfig,
    output: &FinalOutput,
    store: &SequenceStore,
) -> io::Result<Vec<PathBuf>> {
    let dir = config.out_dir.as_path();
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let mut fasta = create(dir, FASTA_FILE)?;
    write_fasta(&mut fasta, output, store, config.line_width)?;
    fasta.flush()?;
    written.push(dir.join(FASTA_FILE));

    let mut merged = create(dir, MERGE_REPORT_FILE)?;
    write_merge_report(&mut merged, output)?;
    merged.flush()?;
    written.push(dir.join(MERGE_REPORT_FILE));

    let mut branches = create(dir, BRANCH_REPORT_FILE)?;
    write_branch_report(&mut branches, output)?;
    branches.flush()?;
    written.push(dir.join(BRANCH_REPORT_FILE));

    if config.write_rejected {
        let mut rejected = create(dir, REJECTED_REPORT_FILE)?;
        write_rejected_report(&mut rejected, output)?;
        rejected.flush()?;
        written.push(dir.join(REJECTED_REPORT_FILE));
    }

    let stats = [
        ("input", AssemblyStats::from_lengths(store.lengths())),
        ("output", output.output_stats(store)),
    ];
    let mut stats_out = create(dir, STATS_FILE)?;
    write_stats(&mut stats_out, &stats)?;
    stats_out.flush()?;
    written.push(dir.join(STATS_FILE));

    #[cfg(feature = "serde1")]
    {
        if config.json {
            let mut json = create(dir, JSON_SUMMARY_FILE)?;
            write_json_summary(&mut json, output, store)?;
            json.flush()?;
            written.push(dir.join(JSON_SUMMARY_FILE));
        }
    }
    #[cfg(not(feature = "serde1"))]
    {
        if config.json {
            tracing::warn!(
                "JSON summary requested but the serde1 feature is disabled"
            );
        }
    }

    Ok(written)
}
