use bstr::{BStr, BString, ByteSlice};
use rayon::prelude::*;
use tracing::{debug, warn};

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::error::{MergeError, MergeResult};
use crate::graph::OrientedGraph;
use crate::paths::Path;
use crate::sequence::SequenceStore;

/// Merged contigs are named `merged_contig_<ordinal>`
pub const MERGED_CONTIG_PREFIX: &str = "merged_contig_";

/// How much of one component contig ended up in a merged contig
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct ComponentLength {
    pub vertex: usize,
    pub original: usize,
    pub contributed: usize,
}

/// The super-contig built from one source-to-sink path.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedContig {
    ordinal: usize,
    components: Vec<ComponentLength>,
    sequence: BString,
    total_error: usize,
    path_score: f64,
}

/// total_error / (merged_length * components). A zero-length merge can
/// only come from empty sequences; it scores 0 when error-free and
/// infinitely bad otherwise.
fn path_score(
    total_error: usize,
    merged_length: usize,
    components: usize,
) -> f64 {
    let denom = merged_length * components;
    if denom == 0 {
        if total_error == 0 {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        total_error as f64 / denom as f64
    }
}

impl MergedContig {
    pub(crate) fn assemble(
        ordinal: usize,
        components: Vec<ComponentLength>,
        sequence: BString,
        total_error: usize,
    ) -> Self {
        let path_score =
            path_score(total_error, sequence.len(), components.len());
        MergedContig {
            ordinal,
            components,
            sequence,
            total_error,
            path_score,
        }
    }

    /// Sequential number assigned at creation, starting at 1
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// The generated identifier, `merged_contig_<ordinal>`
    pub fn id(&self) -> String {
        format!("{}{}", MERGED_CONTIG_PREFIX, self.ordinal)
    }

    /// Vertex indices of the defining path, root first
    pub fn components(&self) -> impl Iterator<Item = usize> + '_ {
        self.components.iter().map(|c| c.vertex)
    }

    pub fn component_lengths(&self) -> &[ComponentLength] {
        &self.components
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn root(&self) -> usize {
        self.components[0].vertex
    }

    pub fn sequence(&self) -> &BStr {
        self.sequence.as_bstr()
    }

    pub fn merged_length(&self) -> usize {
        self.sequence.len()
    }

    pub fn total_error(&self) -> usize {
        self.total_error
    }

    pub fn path_score(&self) -> f64 {
        self.path_score
    }

    /// No mismatches or edits across any junction
    pub fn is_perfect(&self) -> bool {
        self.path_score == 0.0
    }
}

/// Build the merged contig for one path.
///
/// The root contributes its whole sequence. Every following contig is
/// appended minus the first `overlap_length` bytes given by the edge
/// from its predecessor, and that edge's mismatches and edits are added
/// to the total error.
///
/// Paths from `enumerate_paths` always have an edge between consecutive
/// vertices. For a hand-built path that doesn't, the contig is appended
/// whole, contributes no error, and a warning is logged.
pub fn merge_path(
    path: &Path,
    oriented: &OrientedGraph,
    store: &SequenceStore,
    ordinal: usize,
) -> MergeResult<MergedContig> {
    let graph = oriented.graph();
    let lookup = move |v: usize| {
        let name = graph.vertex_name(v);
        store
            .get(name)
            .ok_or_else(|| MergeError::missing_sequence(name))
    };

    let root = path.root();
    let root_seq = lookup(root)?;

    let mut sequence = BString::from(root_seq.as_bytes());
    let mut components = Vec::with_capacity(path.len());
    let mut total_error = 0;

    components.push(ComponentLength {
        vertex: root,
        original: root_seq.len(),
        contributed: root_seq.len(),
    });

    for pair in path.vertices().windows(2) {
        let (prev, v) = (pair[0], pair[1]);
        let seq = lookup(v)?;

        let trim = match graph.edge(prev, v) {
            Some(info) => {
                total_error += info.error();
                if info.overlap_length > seq.len() {
                    warn!(
                        "Overlap of {} on {} -> {} exceeds contig length {}",
                        info.overlap_length,
                        graph.vertex_name(prev),
                        graph.vertex_name(v),
                        seq.len()
                    );
                }
                info.overlap_length.min(seq.len())
            }
            None => {
                warn!(
                    "No overlap edge {} -> {} on path, appending untrimmed",
                    graph.vertex_name(prev),
                    graph.vertex_name(v)
                );
                0
            }
        };

        sequence.extend_from_slice(&seq[trim..]);
        components.push(ComponentLength {
            vertex: v,
            original: seq.len(),
            contributed: seq.len() - trim,
        });
    }

    Ok(MergedContig::assemble(
        ordinal,
        components,
        sequence,
        total_error,
    ))
}

/// Merge every path, assigning ordinals 1, 2, ... in path order. The
/// result is in path order whether or not the work is spread across the
/// rayon thread pool.
pub fn merge_paths(
    paths: &[Path],
    oriented: &OrientedGraph,
    store: &SequenceStore,
    parallel: bool,
) -> MergeResult<Vec<MergedContig>> {
    let merge = |(ix, path): (usize, &Path)| {
        merge_path(path, oriented, store, ix + 1)
    };

    let merged: Vec<MergedContig> = if parallel {
        paths.par_iter().enumerate().map(merge).collect::<MergeResult<_>>()?
    } else {
        paths.iter().enumerate().map(merge).collect::<MergeResult<_>>()?
    };

    let perfect = merged.iter().filter(|m| m.is_perfect()).count();
    debug!("Merged {} paths, {} without errors", merged.len(), perfect);

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::tail_overlap;
    use crate::graph::{orient_edges, OverlapGraph};
    use crate::paths::enumerate_paths;

    fn seq(c: u8, len: usize) -> BString {
        BString::from(vec![c; len])
    }

    #[test]
    fn two_contig_merge() {
        let mut raw = OverlapGraph::new();
        raw.add_edge("A", "B", tail_overlap(100, 80, 20, 1, 0));
        let graph = orient_edges(&raw);

        let mut store = SequenceStore::new();
        store.insert("A", seq(b'A', 100));
        store.insert("B", seq(b'C', 80));

        let paths = enumerate_paths(&graph).unwrap();
        let merged = merge_path(&paths[0], &graph, &store, 1).unwrap();

        assert_eq!(merged.id(), "merged_contig_1");
        assert_eq!(merged.merged_length(), 160);
        assert_eq!(merged.total_error(), 1);
        assert_eq!(merged.path_score(), 0.003125);
        assert!(!merged.is_perfect());

        let mut expected = seq(b'A', 100);
        expected.extend_from_slice(&seq(b'C', 60));
        assert_eq!(merged.sequence(), expected.as_bstr());

        assert_eq!(
            merged.component_lengths(),
            &[
                ComponentLength {
                    vertex: 0,
                    original: 100,
                    contributed: 100
                },
                ComponentLength {
                    vertex: 1,
                    original: 80,
                    contributed: 60
                },
            ]
        );
    }

    #[test]
    fn trimming_drops_the_overlap_prefix() {
        let mut raw = OverlapGraph::new();
        raw.add_edge("x", "y", tail_overlap(8, 6, 3, 0, 0));
        raw.add_edge("y", "z", tail_overlap(6, 5, 2, 0, 1));
        let graph = orient_edges(&raw);

        let mut store = SequenceStore::new();
        store.insert("x", "AACCGTTT");
        store.insert("y", "TTTGGA");
        store.insert("z", "GAcat");

        let paths = enumerate_paths(&graph).unwrap();
        let merged = merge_path(&paths[0], &graph, &store, 4).unwrap();

        assert_eq!(merged.sequence(), "AACCGTTTGGAcat");
        assert_eq!(merged.merged_length(), 8 + (6 - 3) + (5 - 2));
        assert_eq!(merged.total_error(), 1);
        assert_eq!(merged.path_score(), 1.0 / (14.0 * 3.0));
        assert_eq!(merged.components().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(merged.root(), 0);
        assert_eq!(merged.ordinal(), 4);
    }

    #[test]
    fn perfect_merges_score_zero() {
        let mut raw = OverlapGraph::new();
        raw.add_edge("p", "q", tail_overlap(10, 10, 4, 0, 0));
        let graph = orient_edges(&raw);

        let mut store = SequenceStore::new();
        store.insert("p", seq(b'G', 10));
        store.insert("q", seq(b'G', 10));

        let paths = enumerate_paths(&graph).unwrap();
        let merged = merge_path(&paths[0], &graph, &store, 1).unwrap();
        assert_eq!(merged.path_score(), 0.0);
        assert!(merged.is_perfect());
        assert_eq!(merged.merged_length(), 16);
    }

    #[test]
    fn missing_edge_appends_untrimmed() {
        let mut raw = OverlapGraph::new();
        raw.add_vertex("a");
        raw.add_vertex("b");
        let graph = orient_edges(&raw);

        let mut store = SequenceStore::new();
        store.insert("a", "ACGT");
        store.insert("b", "TTGG");

        let path = Path::new(vec![0, 1]);
        let merged = merge_path(&path, &graph, &store, 1).unwrap();
        assert_eq!(merged.sequence(), "ACGTTTGG");
        assert_eq!(merged.total_error(), 0);
        assert_eq!(merged.component_lengths()[1].contributed, 4);
    }

    #[test]
    fn oversized_overlap_is_clamped() {
        let mut raw = OverlapGraph::new();
        raw.add_edge("a", "b", tail_overlap(10, 10, 8, 0, 0));
        let graph = orient_edges(&raw);

        let mut store = SequenceStore::new();
        store.insert("a", seq(b'A', 10));
        store.insert("b", "CCC");

        let paths = enumerate_paths(&graph).unwrap();
        let merged = merge_path(&paths[0], &graph, &store, 1).unwrap();
        assert_eq!(merged.merged_length(), 10);
        assert_eq!(merged.component_lengths()[1].contributed, 0);
    }

    #[test]
    fn missing_sequence_is_fatal() {
        let mut raw = OverlapGraph::new();
        raw.add_edge("a", "ghost", tail_overlap(10, 10, 2, 0, 0));
        let graph = orient_edges(&raw);

        let mut store = SequenceStore::new();
        store.insert("a", seq(b'A', 10));

        let paths = enumerate_paths(&graph).unwrap();
        assert_eq!(
            merge_paths(&paths, &graph, &store, false),
            Err(MergeError::MissingSequence {
                contig: "ghost".to_string()
            })
        );
    }

    #[test]
    fn parallel_and_serial_agree() {
        let mut raw = OverlapGraph::new();
        let mut store = SequenceStore::new();
        store.insert("root", seq(b'A', 50));
        for i in 0..64 {
            let name = format!("leaf{}", i);
            let info = tail_overlap(50, 30, 10, i % 3, 0);
            raw.add_edge("root".to_string(), name.clone(), info);
            store.insert(&name, seq(b'C', 30));
        }
        let graph = orient_edges(&raw);
        let paths = enumerate_paths(&graph).unwrap();

        let serial = merge_paths(&paths, &graph, &store, false).unwrap();
        let parallel = merge_paths(&paths, &graph, &store, true).unwrap();

        assert_eq!(serial.len(), 64);
        assert_eq!(serial, parallel);
        let ordinals: Vec<_> = parallel.iter().map(|m| m.ordinal()).collect();
        assert_eq!(ordinals, (1..=64).collect::<Vec<_>>());
    }
}
