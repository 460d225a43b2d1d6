//! AI and navigation module
//!
//! Weighted shortest paths, incremental chase planning, the behavior state
//! machine, and the enemy and player controllers built on them.

mod agent;
mod behaviors;
mod bfs;
mod dijkstra;
mod fsm;
mod graph;

pub use agent::{
    AgentError, EnemyAgent, EnemyBuilder, EnemyContext, PatrolSpec, PlayerAgent, PlayerBuilder,
    PlayerContext,
};
pub use behaviors::{
    Boat, ChaseBehavior, Idle, Mover, PathFollower, TeleportPatrol, Walk, WaypointPatrol,
};
pub use bfs::{ChasePlanner, DIRECTIONS, Direction, next_step};
pub use dijkstra::{PathError, PathResult, get_path, shortest_path};
pub use fsm::{Behavior, FsmError, MachinePhase, Predicate, StateId, StateMachine, Transition};
pub use graph::{Edge, Graph, Neighbors, TileCost, Walkable};
