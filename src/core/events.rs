//! Simulation event queue
//!
//! Agents report what happened during a tick by pushing [`GameEvent`]s.
//! The queue is double-buffered: events written during a tick become
//! readable once the tick ends, and stay readable until the next one ends.
//!
//! # Example
//!
//! ```ignore
//! sim.tick(dt, &input)?;
//! for event in sim.events().iter() {
//!     if let GameEvent::PlayerCaught { enemy, .. } = event {
//!         log::info!("caught by {enemy}");
//!     }
//! }
//! ```

use std::collections::VecDeque;
use std::fmt;

use glam::IVec2;

// ============================================================================
// Agent Identity
// ============================================================================

/// Who an event is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentId {
    /// The player
    Player,
    /// Enemy by spawn order
    Enemy(usize),
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::Enemy(index) => write!(f, "enemy {index}"),
        }
    }
}

// ============================================================================
// Event Types
// ============================================================================

/// Things that happened in the level during a tick.
///
/// `#[non_exhaustive]` keeps wildcard matches in consumers valid when new
/// variants are added.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum GameEvent {
    // -------------------------------------------------------------------------
    // Behavior Events
    // -------------------------------------------------------------------------
    /// An agent's state machine switched behavior.
    StateChanged {
        /// Agent whose machine transitioned
        agent: AgentId,
        /// Name of the newly active behavior
        state: &'static str,
    },

    // -------------------------------------------------------------------------
    // Movement Events
    // -------------------------------------------------------------------------
    /// An agent entered a new cell.
    Moved {
        /// Agent that moved
        agent: AgentId,
        /// Previous cell
        from: IVec2,
        /// New cell
        to: IVec2,
    },

    /// An agent jumped to a patrol point.
    Teleported {
        /// Agent that teleported
        agent: AgentId,
        /// Destination cell
        to: IVec2,
    },

    /// A click-to-move route was planned.
    PathPlanned {
        /// Agent that will follow the route
        agent: AgentId,
        /// Clicked destination
        target: IVec2,
        /// Cells on the route, start included
        length: usize,
        /// Total route cost
        cost: i64,
    },

    /// A click-to-move route was followed to its end.
    PathCompleted {
        /// Agent that arrived
        agent: AgentId,
        /// Final cell
        at: IVec2,
    },

    // -------------------------------------------------------------------------
    // Boat Events
    // -------------------------------------------------------------------------
    /// The player boarded the boat.
    BoatMounted {
        /// Boat cell
        at: IVec2,
    },

    /// The player stepped off the boat.
    BoatDismounted {
        /// Where the boat was left
        boat: IVec2,
        /// Where the player landed
        at: IVec2,
    },

    // -------------------------------------------------------------------------
    // Outcome Events
    // -------------------------------------------------------------------------
    /// An enemy reached the player's cell.
    PlayerCaught {
        /// The catching enemy
        enemy: AgentId,
        /// Cell of the catch
        at: IVec2,
    },

    /// The player reached the goal.
    LevelComplete {
        /// Tick on which the goal was reached
        frame: u64,
    },
}

// ============================================================================
// Event Queue
// ============================================================================

/// Double-buffered event queue.
///
/// Events pushed before a `swap()` are visible to `iter()` after it.
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written this tick
    pending: VecDeque<GameEvent>,
    /// Events from the last finished tick
    processing: VecDeque<GameEvent>,
}

impl EventQueue {
    const DEFAULT_CAPACITY: usize = 32;

    /// Create a new event queue with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a new event queue with specified initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an event; it becomes visible after the next `swap()`.
    #[inline]
    pub fn push(&mut self, event: GameEvent) {
        self.pending.push_back(event);
    }

    /// Push several events in order.
    pub fn extend(&mut self, events: impl IntoIterator<Item = GameEvent>) {
        self.pending.extend(events);
    }

    /// Publish pending events and drop the previously published ones.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over published events.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.processing.iter()
    }

    /// Take ownership of published events.
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.processing.drain(..)
    }

    /// True if nothing is published
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    /// Number of published events
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Number of events waiting for the next `swap()`
    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Clear all events, pending and published.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn moved(x: i32) -> GameEvent {
        GameEvent::Moved {
            agent: AgentId::Player,
            from: IVec2::ZERO,
            to: IVec2::new(x, 0),
        }
    }

    #[test]
    fn test_event_queue_push_and_swap() {
        let mut queue = EventQueue::new();

        queue.push(moved(1));
        assert!(queue.is_empty(), "Events should not be visible before swap");

        queue.swap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.iter().next(), Some(&moved(1)));
    }

    #[test]
    fn test_event_queue_double_buffer_isolation() {
        let mut queue = EventQueue::new();

        queue.push(moved(1));
        queue.swap();
        queue.push(moved(2));

        let events: Vec<_> = queue.iter().collect();
        assert_eq!(events, vec![&moved(1)]);

        queue.swap();
        let events: Vec<_> = queue.iter().collect();
        assert_eq!(events, vec![&moved(2)]);
    }

    #[test]
    fn test_event_queue_extend_keeps_order() {
        let mut queue = EventQueue::new();
        queue.extend([moved(1), moved(2), moved(3)]);
        queue.swap();

        let events: Vec<_> = queue.drain().collect();
        assert_eq!(events, vec![moved(1), moved(2), moved(3)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_event_queue_clear() {
        let mut queue = EventQueue::new();

        queue.push(moved(1));
        queue.swap();
        queue.push(moved(2));

        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_agent_id_display() {
        assert_eq!(AgentId::Player.to_string(), "player");
        assert_eq!(AgentId::Enemy(3).to_string(), "enemy 3");
    }
}
