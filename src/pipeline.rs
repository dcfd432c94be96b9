use std::path::Path as FsPath;

use bstr::BStr;
use tracing::{debug, info};

use crate::error::{MergeError, MergeResult};
use crate::graph::{orient_edges, OrientedGraph, OverlapGraph};
use crate::merge::{merge_paths, MergedContig};
use crate::parser::{LoadConfig, OverlapGraphParser, ParseResult};
use crate::paths::enumerate_paths;
use crate::select::{select_branches, BranchSelection};
use crate::sequence::SequenceStore;
use crate::stats::AssemblyStats;

/// Settings for the merge stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConfig {
    /// Merge paths and select branches on the rayon thread pool
    pub parallel: bool,
    /// Keep the losing candidates of each branch for reporting
    pub keep_rejected: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        MergeConfig {
            parallel: true,
            keep_rejected: true,
        }
    }
}

/// Read the overlap graph and the contig sequences from disk.
pub fn load<P, Q>(
    graph_path: P,
    contigs_path: Q,
    config: &LoadConfig,
) -> ParseResult<(OverlapGraph, SequenceStore)>
where
    P: AsRef<FsPath>,
    Q: AsRef<FsPath>,
{
    let parser = OverlapGraphParser::with_tolerance(config.tolerance);
    let mut graph = parser.parse_file(graph_path)?;
    let store = SequenceStore::from_fasta_file(contigs_path)?;

    if config.include_unlinked {
        add_unlinked_contigs(&mut graph, &store);
    }

    Ok((graph, store))
}

/// Add every contig of `store` that isn't a vertex of `graph` as an
/// isolated vertex, in store order. Returns the number added.
pub fn add_unlinked_contigs(
    graph: &mut OverlapGraph,
    store: &SequenceStore,
) -> usize {
    let before = graph.vertex_count();
    for name in store.names() {
        graph.add_vertex(name);
    }
    let added = graph.vertex_count() - before;
    if added > 0 {
        debug!("Added {} contigs without overlaps as isolated vertices", added);
    }
    added
}

/// Fail on the first graph vertex, in index order, without a sequence.
pub fn check_sequences(
    graph: &OverlapGraph,
    store: &SequenceStore,
) -> MergeResult<()> {
    match graph.vertices().find(|(_, name)| !store.contains(name)) {
        Some((_, name)) => Err(MergeError::missing_sequence(name)),
        None => Ok(()),
    }
}

/// Vertices that no winner or isolated entry accounts for, and vertices
/// that more than one winner contains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coverage {
    pub dropped: Vec<usize>,
    pub shared: Vec<usize>,
}

impl Coverage {
    /// Every vertex is in exactly one output entry
    pub fn is_exact(&self) -> bool {
        self.dropped.is_empty() && self.shared.is_empty()
    }
}

/// Everything a merge run produces.
#[derive(Debug, Clone)]
pub struct FinalOutput {
    graph: OrientedGraph,
    path_count: usize,
    branches: Vec<BranchSelection>,
    isolated: Vec<usize>,
}

impl FinalOutput {
    pub fn oriented(&self) -> &OrientedGraph {
        &self.graph
    }

    pub fn graph(&self) -> &OverlapGraph {
        self.graph.graph()
    }

    pub fn vertex_name(&self, ix: usize) -> &BStr {
        self.graph().vertex_name(ix)
    }

    /// Number of source-to-sink paths that were merged
    pub fn path_count(&self) -> usize {
        self.path_count
    }

    /// One selection per root, in order of the roots' first paths
    pub fn branches(&self) -> &[BranchSelection] {
        &self.branches
    }

    /// Vertices without any incident edge, in index order
    pub fn isolated(&self) -> &[usize] {
        &self.isolated
    }

    /// The winning merged contigs, by ordinal
    pub fn winners(&self) -> Vec<&MergedContig> {
        let mut winners: Vec<_> =
            self.branches.iter().map(|b| &b.winner).collect();
        winners.sort_by_key(|m| m.ordinal());
        winners
    }

    /// Winners and any kept rejected candidates, by ordinal
    pub fn candidates(&self) -> Vec<&MergedContig> {
        let mut all: Vec<_> = self
            .branches
            .iter()
            .flat_map(|b| std::iter::once(&b.winner).chain(b.rejected.iter()))
            .collect();
        all.sort_by_key(|m| m.ordinal());
        all
    }

    /// Lengths of every sequence in the final output set
    pub fn output_lengths(&self, store: &SequenceStore) -> Vec<usize> {
        let merged = self.branches.iter().map(|b| b.winner.merged_length());
        let isolated = self
            .isolated
            .iter()
            .filter_map(|&ix| store.get(self.vertex_name(ix)))
            .map(|seq| seq.len());
        merged.chain(isolated).collect()
    }

    pub fn output_stats(&self, store: &SequenceStore) -> AssemblyStats {
        AssemblyStats::from_lengths(self.output_lengths(store))
    }

    /// Count how often each vertex lands in the final output set.
    ///
    /// Chain-shaped components always cover exactly. Branching roots
    /// drop the vertices only reachable through losing paths, and
    /// converging paths can put one vertex into several winners.
    pub fn coverage(&self) -> Coverage {
        let mut counts = vec![0usize; self.graph().vertex_count()];
        for branch in self.branches.iter() {
            for v in branch.winner.components() {
                counts[v] += 1;
            }
        }
        for &v in self.isolated.iter() {
            counts[v] += 1;
        }

        let mut coverage = Coverage::default();
        for (v, &count) in counts.iter().enumerate() {
            match count {
                0 => coverage.dropped.push(v),
                1 => (),
                _ => coverage.shared.push(v),
            }
        }
        coverage
    }
}

/// Run the whole merge: orient the edges, enumerate every path, merge
/// each one and pick one winner per root.
///
/// Fails before any merging if a vertex has no sequence or the oriented
/// graph has a cycle.
pub fn run(
    graph: &OverlapGraph,
    store: &SequenceStore,
    config: &MergeConfig,
) -> MergeResult<FinalOutput> {
    check_sequences(graph, store)?;

    let oriented = orient_edges(graph);
    let paths = enumerate_paths(&oriented)?;
    let merged = merge_paths(&paths, &oriented, store, config.parallel)?;
    let branches =
        select_branches(merged, config.parallel, config.keep_rejected);
    let isolated = oriented.graph().isolated_vertices();

    info!(
        "Merged {} paths into {} contigs, kept {} isolated contigs",
        paths.len(),
        branches.len(),
        isolated.len()
    );

    Ok(FinalOutput {
        graph: oriented,
        path_count: paths.len(),
        branches,
        isolated,
    })
}
