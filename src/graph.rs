pub mod name_map;
pub mod orientation;
pub mod overlap;

pub use self::name_map::NameMap;
pub use self::orientation::*;
pub use self::overlap::OverlapInfo;

use bstr::BStr;
use fnv::FnvHashMap;

/// A directed edge between two vertex indices
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub info: OverlapInfo,
}

/// Adjacency-list directed graph keyed by contig name. At most one
/// edge is stored per ordered pair of vertices.
///
/// Vertices are iterated in the order they were added, and each
/// vertex's successors in the order their edges were added; path
/// enumeration relies on this to be deterministic.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct OverlapGraph {
    names: NameMap,
    edges: Vec<Edge>,
    edge_index: FnvHashMap<(usize, usize), usize>,
    successors: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
}

impl OverlapGraph {
    pub fn new() -> Self {
        Default::default()
    }

    /// Create a graph holding the vertices of `names` and no edges.
    pub(crate) fn with_names(names: NameMap) -> Self {
        let n = names.len();
        OverlapGraph {
            names,
            edges: Vec::new(),
            edge_index: FnvHashMap::default(),
            successors: vec![Vec::new(); n],
            in_degree: vec![0; n],
        }
    }

    /// Add a vertex if it isn't already present, returning its index.
    pub fn add_vertex<N: AsRef<[u8]>>(&mut self, name: N) -> usize {
        let ix = self.names.get_or_insert(name);
        if ix == self.successors.len() {
            self.successors.push(Vec::new());
            self.in_degree.push(0);
        }
        ix
    }

    /// Add an edge between two named vertices, creating the vertices
    /// as needed. Returns false, leaving the graph unchanged, if an
    /// edge between the same ordered pair already exists.
    pub fn add_edge<N: AsRef<[u8]>>(
        &mut self,
        from: N,
        to: N,
        info: OverlapInfo,
    ) -> bool {
        let from = self.add_vertex(from);
        let to = self.add_vertex(to);
        self.add_edge_ix(from, to, info)
    }

    /// Index-based version of `add_edge`; both indices must already be
    /// vertices of this graph.
    pub fn add_edge_ix(
        &mut self,
        from: usize,
        to: usize,
        info: OverlapInfo,
    ) -> bool {
        assert!(from < self.vertex_count() && to < self.vertex_count());
        if self.edge_index.contains_key(&(from, to)) {
            return false;
        }
        self.edge_index.insert((from, to), self.edges.len());
        self.edges.push(Edge { from, to, info });
        self.successors[from].push(to);
        self.in_degree[to] += 1;
        true
    }

    pub fn vertex_count(&self) -> usize {
        self.names.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn names(&self) -> &NameMap {
        &self.names
    }

    pub fn vertex_index<N: AsRef<[u8]>>(&self, name: N) -> Option<usize> {
        self.names.map_name(name)
    }

    /// Panics if `ix` is not a vertex of this graph
    pub fn vertex_name(&self, ix: usize) -> &BStr {
        self.names
            .inverse_map_name(ix)
            .unwrap_or_else(|| panic!("Vertex index {} out of bounds", ix))
    }

    /// Iterate over `(index, name)` of every vertex, in index order
    pub fn vertices(&self) -> impl Iterator<Item = (usize, &'_ BStr)> + '_ {
        self.names.iter()
    }

    /// All edges, in insertion order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, from: usize, to: usize) -> Option<&OverlapInfo> {
        self.edge_index.get(&(from, to)).map(|&e| &self.edges[e].info)
    }

    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.edge_index.contains_key(&(from, to))
    }

    pub fn successors(&self, ix: usize) -> &[usize] {
        &self.successors[ix]
    }

    pub fn out_degree(&self, ix: usize) -> usize {
        self.successors[ix].len()
    }

    pub fn in_degree(&self, ix: usize) -> usize {
        self.in_degree[ix]
    }

    /// True if the vertex has no incident edges in either direction
    pub fn is_isolated(&self, ix: usize) -> bool {
        self.in_degree(ix) == 0 && self.out_degree(ix) == 0
    }

    pub fn isolated_vertices(&self) -> Vec<usize> {
        (0..self.vertex_count())
            .filter(|&ix| self.is_isolated(ix))
            .collect()
    }

    /// Vertices with no incoming but at least one outgoing edge, in
    /// index order. Isolated vertices are not sources.
    pub fn sources(&self) -> Vec<usize> {
        (0..self.vertex_count())
            .filter(|&ix| self.in_degree(ix) == 0 && self.out_degree(ix) > 0)
            .collect()
    }
}
