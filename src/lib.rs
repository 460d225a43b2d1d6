//! Tile map navigation and enemy AI
//!
//! This crate provides:
//! - Weighted shortest paths (Dijkstra) over any graph
//! - Incremental BFS chase planning on a tile grid
//! - A guarded finite state machine for agent behaviors
//! - A headless simulation of a tile level with a player, a boat and enemies

pub mod ai;
pub mod core;
pub mod input;
pub mod tiles;

// Re-exports for convenience
pub use glam;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{
        Behavior, ChasePlanner, Direction, Graph, PathResult, StateMachine, Walkable, get_path,
        next_step, shortest_path,
    };
    pub use crate::core::{GameEvent, Level, SimConfig, SimStatus, Simulation};
    pub use crate::input::{InputMapper, InputScript, PlayerInput};
    pub use crate::tiles::{TileDef, TileMap};
    pub use glam::IVec2;
}
