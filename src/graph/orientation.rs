use tracing::{debug, warn};

use super::{OverlapGraph, OverlapInfo};

/// Direction of a raw edge relative to where its overlap lies on the
/// "from" contig. A `Forward` edge already reads "suffix of from
/// overlaps prefix of to"; a `Backward` edge must be reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    Forward,
    Backward,
}

impl EdgeDirection {
    /// An overlap starting at position 0 of the "from" contig lies at
    /// its head, so the edge points backward.
    #[inline]
    pub fn of(info: &OverlapInfo) -> Self {
        if info.starts_at_from_head() {
            EdgeDirection::Backward
        } else {
            EdgeDirection::Forward
        }
    }

    #[inline]
    pub fn is_reverse(&self) -> bool {
        *self == EdgeDirection::Backward
    }
}

/// An overlap graph whose every edge (u, v) has its overlap at the end
/// of u and the start of v. Only produced by `orient_edges`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientedGraph {
    graph: OverlapGraph,
    flipped: usize,
    collapsed: usize,
}

impl OrientedGraph {
    pub fn graph(&self) -> &OverlapGraph {
        &self.graph
    }

    pub fn into_inner(self) -> OverlapGraph {
        self.graph
    }

    /// Number of raw edges that were reversed
    pub fn flipped(&self) -> usize {
        self.flipped
    }

    /// Number of raw edges dropped because, once oriented, they landed
    /// on an ordered pair that was already taken
    pub fn collapsed(&self) -> usize {
        self.collapsed
    }
}

/// Rewrite every edge of `raw` so that it points from the contig with
/// the overlap at its tail to the contig with the overlap at its head.
///
/// Edges whose overlap starts at position 0 of the "from" contig are
/// replaced by the reverse edge, with the from/to halves of the
/// descriptor swapped. Edges are processed in insertion order; if two
/// of them end up on the same ordered pair, the first one is kept.
/// Every vertex keeps its index, isolated vertices included.
pub fn orient_edges(raw: &OverlapGraph) -> OrientedGraph {
    let mut graph = OverlapGraph::with_names(raw.names().clone());
    let mut flipped = 0;
    let mut collapsed = 0;

    for edge in raw.edges() {
        let direction = EdgeDirection::of(&edge.info);
        let (from, to, info) = if direction.is_reverse() {
            flipped += 1;
            (edge.to, edge.from, edge.info.swapped())
        } else {
            (edge.from, edge.to, edge.info.clone())
        };

        if !graph.add_edge_ix(from, to, info) {
            collapsed += 1;
            warn!(
                "Oriented edge {} -> {} already present, dropping duplicate",
                graph.vertex_name(from),
                graph.vertex_name(to)
            );
        }
    }

    debug!(
        "Oriented {} edges, flipped {}, collapsed {}",
        raw.edge_count(),
        flipped,
        collapsed
    );

    OrientedGraph {
        graph,
        flipped,
        collapsed,
    }
}
