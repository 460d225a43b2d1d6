//! Graph capabilities consumed by the path solver and the chase planner
//!
//! The solver and planner never own a map. They read one through these
//! traits for the duration of a single call, so the implementor must not be
//! mutated while a query is in flight.

use std::fmt;
use std::hash::Hash;

use smallvec::SmallVec;

/// A weighted edge to a neighboring node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge<N> {
    /// Node reached by taking this edge
    pub to: N,
    /// Cost of traversing the edge (must be >= 0, zero is free passage)
    pub weight: i32,
}

impl<N> Edge<N> {
    /// Create an edge to `to` with the given weight.
    #[must_use]
    pub fn new(to: N, weight: i32) -> Self {
        Self { to, weight }
    }
}

/// Neighbor list returned by [`Graph::neighbors`].
///
/// Grid graphs have at most four neighbors, which stay inline.
pub type Neighbors<N> = SmallVec<[Edge<N>; 4]>;

/// Read-only view of a weighted graph.
pub trait Graph {
    /// Node identifier. Only equality and hashing are assumed.
    type Node: Clone + Eq + Hash + fmt::Debug;

    /// Every valid node, in a stable order.
    ///
    /// The order doubles as the solver's tie-break key: among equally close
    /// candidates, the node enumerated first is finalized first.
    fn all_nodes(&self) -> Vec<Self::Node>;

    /// Edges leaving `node`, in a stable order.
    ///
    /// Must terminate and must not list `node` itself unless a self-loop is
    /// intended.
    fn neighbors(&self, node: &Self::Node) -> Neighbors<Self::Node>;
}

/// Walkability predicate used by the unweighted chase planner.
pub trait Walkable<N> {
    /// Whether an agent may stand on `node`.
    fn is_walkable(&self, node: N) -> bool;
}

impl<N, F> Walkable<N> for F
where
    F: Fn(N) -> bool,
{
    fn is_walkable(&self, node: N) -> bool {
        self(node)
    }
}

/// Movement cost of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileCost {
    /// Entering the tile costs this much (never negative)
    Cost(i32),
    /// The tile cannot be entered
    Blocked,
}

impl TileCost {
    /// The cost, or `None` if blocked.
    #[must_use]
    pub fn value(self) -> Option<i32> {
        match self {
            Self::Cost(c) => Some(c),
            Self::Blocked => None,
        }
    }

    /// Check if the tile is blocked
    #[must_use]
    pub fn is_blocked(self) -> bool {
        matches!(self, Self::Blocked)
    }
}
