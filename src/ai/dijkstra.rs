//! Weighted shortest paths (Dijkstra) over any [`Graph`]
//!
//! Used for click-to-move planning. The open set is a binary heap keyed by
//! `(tentative distance, enumeration index)`, so among equally close nodes
//! the one listed first by [`Graph::all_nodes`] is finalized first. This is
//! the same choice a linear "first minimum wins" scan over `all_nodes()`
//! makes, only in `O((V + E) log V)`.
//!
//! Predecessors are only replaced on a strict improvement, so when two
//! equally short routes reach a node, the one relaxed first (earlier
//! finalized node, then earlier edge in [`Graph::neighbors`]) is kept.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use rustc_hash::FxHashMap;

use super::graph::Graph;

/// Tentative distance of a node nothing has reached yet.
const UNREACHED: i64 = i64::MAX;

/// Predecessor slot of a node with no recorded predecessor.
const NO_PREDECESSOR: usize = usize::MAX;

// ============================================================================
// Results and errors
// ============================================================================

/// Result of a shortest-path query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResult<N> {
    /// Nodes from start to end inclusive; empty if the end is unreachable
    pub nodes: Vec<N>,
    /// Sum of edge weights along `nodes`
    pub cost: i64,
}

impl<N> PathResult<N> {
    /// Check if no path was found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes on the path
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

impl<N> Default for PathResult<N> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            cost: 0,
        }
    }
}

/// Graph contract violations detected while solving.
///
/// An unreachable end node is not an error: it yields an empty path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// An edge with a negative weight was observed
    InvalidWeight {
        /// Source node of the edge
        from: String,
        /// Destination node of the edge
        to: String,
        /// The offending weight
        weight: i32,
    },
    /// A node was used that `all_nodes()` never listed
    UnknownNode(String),
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWeight { from, to, weight } => {
                write!(f, "Invalid edge weight {weight} on {from} -> {to}")
            }
            Self::UnknownNode(node) => write!(f, "Node {node} is not part of the graph"),
        }
    }
}

impl std::error::Error for PathError {}

// ============================================================================
// Solver
// ============================================================================

/// Compute the cheapest path from `start` to `end`.
///
/// Returns the single-node path when `start == end`, an empty path when
/// `end` cannot be reached, and an error when the graph breaks its contract
/// (negative weight, or a node missing from `all_nodes()`).
///
/// # Errors
///
/// Returns [`PathError::InvalidWeight`] on the first negative edge relaxed and
/// [`PathError::UnknownNode`] if `start`, `end` or a neighbor is not listed by
/// [`Graph::all_nodes`].
pub fn shortest_path<G>(
    graph: &G,
    start: &G::Node,
    end: &G::Node,
) -> Result<PathResult<G::Node>, PathError>
where
    G: Graph + ?Sized,
{
    if start == end {
        return Ok(PathResult {
            nodes: vec![start.clone()],
            cost: 0,
        });
    }

    let nodes = graph.all_nodes();
    let mut index: FxHashMap<G::Node, usize> = FxHashMap::default();
    index.reserve(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        index.entry(node.clone()).or_insert(i);
    }

    let start_idx = lookup(&index, start)?;
    let end_idx = lookup(&index, end)?;

    let mut dist = vec![UNREACHED; nodes.len()];
    let mut prev = vec![NO_PREDECESSOR; nodes.len()];
    let mut visited = vec![false; nodes.len()];

    dist[start_idx] = 0;
    let mut open = BinaryHeap::new();
    open.push(Reverse((0_i64, start_idx)));

    while let Some(Reverse((current_dist, ci))) = open.pop() {
        // Stale heap entry
        if visited[ci] || current_dist > dist[ci] {
            continue;
        }
        if ci == end_idx {
            break;
        }
        visited[ci] = true;

        for edge in graph.neighbors(&nodes[ci]) {
            if edge.weight < 0 {
                return Err(PathError::InvalidWeight {
                    from: format!("{:?}", nodes[ci]),
                    to: format!("{:?}", edge.to),
                    weight: edge.weight,
                });
            }

            let ni = lookup(&index, &edge.to)?;
            if visited[ni] {
                continue;
            }

            let tentative = current_dist + i64::from(edge.weight);
            if tentative < dist[ni] {
                dist[ni] = tentative;
                prev[ni] = ci;
                open.push(Reverse((tentative, ni)));
            }
        }
    }

    if prev[end_idx] == NO_PREDECESSOR {
        log::debug!("No path from {start:?} to {end:?}");
        return Ok(PathResult::default());
    }

    let mut path = vec![nodes[end_idx].clone()];
    let mut at = end_idx;
    while prev[at] != NO_PREDECESSOR {
        at = prev[at];
        path.push(nodes[at].clone());
    }
    path.reverse();

    Ok(PathResult {
        nodes: path,
        cost: dist[end_idx],
    })
}

/// Compute the node sequence of the cheapest path from `start` to `end`.
///
/// Shorthand for [`shortest_path`] when the total cost is not needed.
///
/// # Errors
///
/// Same as [`shortest_path`].
pub fn get_path<G>(graph: &G, start: &G::Node, end: &G::Node) -> Result<Vec<G::Node>, PathError>
where
    G: Graph + ?Sized,
{
    shortest_path(graph, start, end).map(|result| result.nodes)
}

fn lookup<N>(index: &FxHashMap<N, usize>, node: &N) -> Result<usize, PathError>
where
    N: Eq + std::hash::Hash + fmt::Debug,
{
    index
        .get(node)
        .copied()
        .ok_or_else(|| PathError::UnknownNode(format!("{node:?}")))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::graph::{Edge, Neighbors};

    /// Adjacency-list graph whose node order is the insertion order
    struct SimpleGraph {
        nodes: Vec<(&'static str, Vec<(&'static str, i32)>)>,
    }

    impl SimpleGraph {
        fn new(nodes: &[(&'static str, &[(&'static str, i32)])]) -> Self {
            Self {
                nodes: nodes
                    .iter()
                    .map(|(name, edges)| (*name, edges.to_vec()))
                    .collect(),
            }
        }

        fn weight(&self, from: &str, to: &str) -> i64 {
            self.nodes
                .iter()
                .find(|(name, _)| *name == from)
                .and_then(|(_, edges)| edges.iter().find(|(n, _)| *n == to))
                .map(|(_, w)| i64::from(*w))
                .expect("edge on returned path")
        }

        fn path_cost(&self, path: &[&'static str]) -> i64 {
            path.windows(2).map(|w| self.weight(w[0], w[1])).sum()
        }

        /// Cheapest simple path by exhaustive search
        fn brute_force(&self, from: &'static str, to: &'static str) -> Option<i64> {
            fn walk(
                g: &SimpleGraph,
                at: &'static str,
                to: &'static str,
                seen: &mut Vec<&'static str>,
                cost: i64,
                best: &mut Option<i64>,
            ) {
                if at == to {
                    *best = Some(best.map_or(cost, |b| b.min(cost)));
                    return;
                }
                for edge in g.neighbors(&at) {
                    if seen.contains(&edge.to) {
                        continue;
                    }
                    seen.push(edge.to);
                    walk(g, edge.to, to, seen, cost + i64::from(edge.weight), best);
                    seen.pop();
                }
            }

            let mut best = None;
            walk(self, from, to, &mut vec![from], 0, &mut best);
            best
        }
    }

    impl Graph for SimpleGraph {
        type Node = &'static str;

        fn all_nodes(&self) -> Vec<&'static str> {
            self.nodes.iter().map(|(name, _)| *name).collect()
        }

        fn neighbors(&self, node: &&'static str) -> Neighbors<&'static str> {
            self.nodes
                .iter()
                .find(|(name, _)| name == node)
                .map(|(_, edges)| edges.iter().map(|&(to, w)| Edge::new(to, w)).collect())
                .unwrap_or_default()
        }
    }

    fn sample_graph() -> SimpleGraph {
        SimpleGraph::new(&[
            ("A", &[("B", 1), ("C", 4)]),
            ("B", &[("C", 2), ("D", 5)]),
            ("C", &[("D", 1)]),
            ("D", &[]),
        ])
    }

    #[test]
    fn test_sample_graph_path() {
        let graph = sample_graph();
        let result = shortest_path(&graph, &"A", &"D").unwrap();

        assert_eq!(result.nodes, vec!["A", "B", "C", "D"]);
        assert_eq!(result.cost, 4);
        assert_eq!(graph.path_cost(&result.nodes), 4);
    }

    #[test]
    fn test_start_equals_end() {
        let graph = sample_graph();
        for node in graph.all_nodes() {
            assert_eq!(get_path(&graph, &node, &node).unwrap(), vec![node]);
        }
    }

    #[test]
    fn test_start_equals_end_needs_no_graph_lookup() {
        let graph = SimpleGraph::new(&[]);
        assert_eq!(get_path(&graph, &"X", &"X").unwrap(), vec!["X"]);
    }

    #[test]
    fn test_unreachable_is_empty() {
        let graph = SimpleGraph::new(&[
            ("A", &[("B", 1)]),
            ("B", &[]),
            ("C", &[("D", 1)]),
            ("D", &[]),
        ]);

        let result = shortest_path(&graph, &"A", &"D").unwrap();
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);

        // Edges are directed
        assert!(get_path(&graph, &"B", &"A").unwrap().is_empty());
    }

    #[test]
    fn test_zero_weight_edges() {
        let graph = SimpleGraph::new(&[
            ("A", &[("B", 0), ("D", 1)]),
            ("B", &[("C", 0)]),
            ("C", &[("D", 0)]),
            ("D", &[]),
        ]);

        let result = shortest_path(&graph, &"A", &"D").unwrap();
        assert_eq!(result.nodes, vec!["A", "B", "C", "D"]);
        assert_eq!(result.cost, 0);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let graph = SimpleGraph::new(&[
            ("A", &[("B", 2)]),
            ("B", &[("C", -1)]),
            ("C", &[]),
        ]);

        let err = shortest_path(&graph, &"A", &"C").unwrap_err();
        assert_eq!(
            err,
            PathError::InvalidWeight {
                from: "\"B\"".to_string(),
                to: "\"C\"".to_string(),
                weight: -1,
            }
        );
    }

    #[test]
    fn test_unknown_nodes_rejected() {
        let graph = sample_graph();
        assert!(matches!(
            shortest_path(&graph, &"A", &"Z"),
            Err(PathError::UnknownNode(_))
        ));
        assert!(matches!(
            shortest_path(&graph, &"Z", &"A"),
            Err(PathError::UnknownNode(_))
        ));

        let dangling = SimpleGraph::new(&[("A", &[("Q", 1)]), ("B", &[])]);
        assert!(matches!(
            shortest_path(&dangling, &"A", &"B"),
            Err(PathError::UnknownNode(_))
        ));
    }

    #[test]
    fn test_tie_break_follows_node_order() {
        let left_first = SimpleGraph::new(&[
            ("A", &[("B", 1), ("C", 1)]),
            ("B", &[("D", 1)]),
            ("C", &[("D", 1)]),
            ("D", &[]),
        ]);
        assert_eq!(
            get_path(&left_first, &"A", &"D").unwrap(),
            vec!["A", "B", "D"]
        );

        // Same edges, C enumerated before B
        let right_first = SimpleGraph::new(&[
            ("A", &[("B", 1), ("C", 1)]),
            ("C", &[("D", 1)]),
            ("B", &[("D", 1)]),
            ("D", &[]),
        ]);
        assert_eq!(
            get_path(&right_first, &"A", &"D").unwrap(),
            vec!["A", "C", "D"]
        );
    }

    #[test]
    fn test_repeated_solves_are_identical() {
        let graph = sample_graph();
        let first = shortest_path(&graph, &"A", &"D").unwrap();
        for _ in 0..10 {
            assert_eq!(shortest_path(&graph, &"A", &"D").unwrap(), first);
        }
    }

    #[test]
    fn test_optimal_against_brute_force() {
        let graph = SimpleGraph::new(&[
            ("A", &[("B", 7), ("C", 9), ("F", 14)]),
            ("B", &[("A", 7), ("C", 10), ("D", 15)]),
            ("C", &[("A", 9), ("B", 10), ("D", 11), ("F", 2)]),
            ("D", &[("B", 15), ("C", 11), ("E", 6)]),
            ("E", &[("D", 6), ("F", 9)]),
            ("F", &[("A", 14), ("C", 2), ("E", 9)]),
            ("G", &[("A", 1)]),
        ]);

        for from in graph.all_nodes() {
            for to in graph.all_nodes() {
                let result = shortest_path(&graph, &from, &to).unwrap();
                match graph.brute_force(from, to) {
                    Some(best) => {
                        assert_eq!(result.cost, best, "{from} -> {to}");
                        assert_eq!(graph.path_cost(&result.nodes), best);
                        assert_eq!(result.nodes.first(), Some(&from));
                        assert_eq!(result.nodes.last(), Some(&to));
                    }
                    None => assert!(result.is_empty(), "{from} -> {to}"),
                }
            }
        }
    }
}
