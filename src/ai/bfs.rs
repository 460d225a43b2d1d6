//! Incremental breadth-first chase planning
//!
//! Instead of keeping a full path to a target that keeps moving, the chase
//! planner reruns a BFS every tick and only returns the first step. Edges
//! are unweighted; a cell is either walkable or not.

use std::collections::VecDeque;

use glam::IVec2;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::graph::Walkable;

// ============================================================================
// Directions
// ============================================================================

/// A cardinal movement direction on the tile grid (+y is up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// +y
    Up,
    /// -y
    Down,
    /// -x
    Left,
    /// +x
    Right,
}

impl Direction {
    /// Grid offset of one step in this direction
    #[must_use]
    pub const fn offset(self) -> IVec2 {
        match self {
            Self::Up => IVec2::new(0, 1),
            Self::Down => IVec2::new(0, -1),
            Self::Left => IVec2::new(-1, 0),
            Self::Right => IVec2::new(1, 0),
        }
    }
}

/// Default expansion order. Among equally short paths, the one whose first
/// diverging step comes earlier in this list wins.
pub const DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

// ============================================================================
// Chase Planner
// ============================================================================

/// Per-agent BFS state, reused between ticks to avoid reallocating.
#[derive(Debug, Clone)]
pub struct ChasePlanner {
    directions: [Direction; 4],
    max_visited: Option<usize>,
    queue: VecDeque<IVec2>,
    came_from: FxHashMap<IVec2, IVec2>,
}

impl ChasePlanner {
    /// Create a planner using [`DIRECTIONS`] and no search budget.
    #[must_use]
    pub fn new() -> Self {
        Self {
            directions: DIRECTIONS,
            max_visited: None,
            queue: VecDeque::new(),
            came_from: FxHashMap::default(),
        }
    }

    /// Use a different expansion order.
    #[must_use]
    pub fn with_directions(mut self, directions: [Direction; 4]) -> Self {
        self.directions = directions;
        self
    }

    /// Give up (no step) once more than `limit` cells have been discovered.
    ///
    /// Bounds the per-tick cost on huge or unbounded walkable regions.
    #[must_use]
    pub fn with_max_visited(mut self, limit: Option<usize>) -> Self {
        self.max_visited = limit;
        self
    }

    /// Expansion order in use
    #[must_use]
    pub fn directions(&self) -> [Direction; 4] {
        self.directions
    }

    /// First cell of a shortest path from `current` to `target`.
    ///
    /// Returns `None` when already at the target, when the target cannot be
    /// reached through walkable cells, or when the search budget runs out.
    /// The start cell itself is never tested for walkability.
    pub fn next_step<W>(&mut self, current: IVec2, target: IVec2, walkable: &W) -> Option<IVec2>
    where
        W: Walkable<IVec2> + ?Sized,
    {
        if current == target {
            return None;
        }

        self.queue.clear();
        self.came_from.clear();

        self.queue.push_back(current);
        self.came_from.insert(current, current);

        while let Some(cell) = self.queue.pop_front() {
            for dir in self.directions {
                let next = cell + dir.offset();
                if self.came_from.contains_key(&next) || !walkable.is_walkable(next) {
                    continue;
                }

                self.came_from.insert(next, cell);
                if next == target {
                    return self.first_step(current, target);
                }

                if self
                    .max_visited
                    .is_some_and(|limit| self.came_from.len() > limit)
                {
                    log::debug!(
                        "Chase search from {current} gave up after {} cells",
                        self.came_from.len()
                    );
                    return None;
                }

                self.queue.push_back(next);
            }
        }

        None
    }

    /// Walk the parent chain back from `target` to the cell right after `start`.
    fn first_step(&self, start: IVec2, target: IVec2) -> Option<IVec2> {
        let mut cell = target;
        loop {
            let parent = *self.came_from.get(&cell)?;
            if parent == start {
                return Some(cell);
            }
            cell = parent;
        }
    }
}

impl Default for ChasePlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot version of [`ChasePlanner::next_step`] with the default order.
pub fn next_step<W>(current: IVec2, target: IVec2, walkable: &W) -> Option<IVec2>
where
    W: Walkable<IVec2> + ?Sized,
{
    ChasePlanner::new().next_step(current, target, walkable)
}

// ============================================================================
// Tests
// ============================================================================
