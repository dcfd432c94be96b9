use std::collections::VecDeque;

use tracing::debug;

use crate::error::{MergeError, MergeResult};
use crate::graph::{OrientedGraph, OverlapGraph};

/// A chain of vertex indices running from a source to a sink of the
/// oriented graph. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path(Vec<usize>);

impl Path {
    /// Panics if `vertices` is empty
    pub fn new(vertices: Vec<usize>) -> Self {
        assert!(!vertices.is_empty(), "A path needs at least one vertex");
        Path(vertices)
    }

    pub fn root(&self) -> usize {
        self.0[0]
    }

    pub fn sink(&self) -> usize {
        self.0[self.0.len() - 1]
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn vertices(&self) -> &[usize] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

/// Verify that `graph` has no directed cycle, using Kahn's algorithm.
///
/// On failure the error names the lowest-indexed vertex that could not
/// be topologically ordered, which lies on a cycle or downstream of
/// one.
pub fn check_acyclic(graph: &OverlapGraph) -> MergeResult<()> {
    let n = graph.vertex_count();
    let mut in_degree: Vec<usize> = (0..n).map(|v| graph.in_degree(v)).collect();

    let mut queue: VecDeque<usize> =
        (0..n).filter(|&v| in_degree[v] == 0).collect();

    while let Some(v) = queue.pop_front() {
        for &next in graph.successors(v) {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    // anything left with incoming edges was never reached by the queue
    match (0..n).find(|&v| in_degree[v] > 0) {
        Some(stuck) => Err(MergeError::cycle(graph.vertex_name(stuck))),
        None => Ok(()),
    }
}

/// Enumerate every source-to-sink path of the oriented graph.
///
/// Fails with `MergeError::Cycle` before walking anything if the graph
/// is cyclic. Sources are visited in vertex index order and successors
/// in edge insertion order, so the output order is fixed for a given
/// graph. A vertex reachable along several routes shows up in each of
/// the corresponding paths.
pub fn enumerate_paths(oriented: &OrientedGraph) -> MergeResult<Vec<Path>> {
    let graph = oriented.graph();
    check_acyclic(graph)?;

    let mut paths = Vec::new();

    // path[i] is the vertex at depth i, cursors[i] the index of the
    // next successor of path[i] to descend into
    let mut path: Vec<usize> = Vec::new();
    let mut cursors: Vec<usize> = Vec::new();

    let sources = graph.sources();
    for &source in sources.iter() {
        path.push(source);
        cursors.push(0);

        while let Some(&cursor) = cursors.last() {
            let depth = cursors.len() - 1;
            let successors = graph.successors(path[depth]);

            if successors.is_empty() {
                paths.push(Path(path.clone()));
            }

            if cursor < successors.len() {
                cursors[depth] += 1;
                path.push(successors[cursor]);
                cursors.push(0);
            } else {
                cursors.pop();
                path.pop();
            }
        }
    }

    debug!(
        "Enumerated {} paths from {} sources",
        paths.len(),
        sources.len()
    );

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::orient_edges;
    use crate::graph::tests::tail_overlap;

    fn oriented(edges: &[(&str, &str)]) -> OrientedGraph {
        let mut graph = OverlapGraph::new();
        for (from, to) in edges {
            graph.add_edge(*from, *to, tail_overlap(10, 10, 2, 0, 0));
        }
        orient_edges(&graph)
    }

    fn named(graph: &OrientedGraph, paths: &[Path]) -> Vec<String> {
        paths
            .iter()
            .map(|p| {
                p.iter()
                    .map(|v| graph.graph().vertex_name(v).to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect()
    }

    #[test]
    fn single_chain() {
        let graph = oriented(&[("a", "b"), ("b", "c")]);
        let paths = enumerate_paths(&graph).unwrap();
        assert_eq!(named(&graph, &paths), vec!["a,b,c"]);
        assert_eq!(paths[0].root(), 0);
        assert_eq!(paths[0].sink(), 2);
        assert_eq!(paths[0].len(), 3);
    }

    #[test]
    fn branches_follow_edge_order() {
        let graph =
            oriented(&[("a", "b"), ("a", "c"), ("c", "d"), ("c", "e")]);
        let paths = enumerate_paths(&graph).unwrap();
        assert_eq!(named(&graph, &paths), vec!["a,b", "a,c,d", "a,c,e"]);
    }

    #[test]
    fn converging_paths_share_vertices() {
        let graph = oriented(&[
            ("a", "m"),
            ("b", "m"),
            ("m", "z"),
            ("a", "z"),
        ]);
        let paths = enumerate_paths(&graph).unwrap();
        assert_eq!(named(&graph, &paths), vec!["a,m,z", "a,z", "b,m,z"]);

        let m = graph.graph().vertex_index("m").unwrap();
        let uses = paths.iter().filter(|p| p.vertices().contains(&m)).count();
        assert_eq!(uses, 2);
    }

    #[test]
    fn isolated_vertices_yield_no_paths() {
        let mut raw = OverlapGraph::new();
        raw.add_vertex("alone");
        let graph = orient_edges(&raw);
        assert!(enumerate_paths(&graph).unwrap().is_empty());
    }

    #[test]
    fn cycles_are_fatal() {
        let graph = oriented(&[("s", "a"), ("a", "b"), ("b", "c"), ("c", "a")]);
        match enumerate_paths(&graph) {
            Err(MergeError::Cycle { vertex }) => {
                assert!(["a", "b", "c"].contains(&vertex.as_str()));
            }
            other => panic!("Expected a cycle error, got {:?}", other),
        }

        let self_loop = oriented(&[("x", "x")]);
        assert_eq!(
            check_acyclic(self_loop.graph()),
            Err(MergeError::Cycle {
                vertex: "x".to_string()
            })
        );
    }

    #[test]
    fn deep_chains_do_not_recurse() {
        let mut raw = OverlapGraph::new();
        let n = 50_000;
        for i in 0..n - 1 {
            let from = format!("c{}", i);
            let to = format!("c{}", i + 1);
            raw.add_edge(from, to, tail_overlap(10, 10, 2, 0, 0));
        }
        let graph = orient_edges(&raw);
        let paths = enumerate_paths(&graph).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].len(), n);
    }
}
