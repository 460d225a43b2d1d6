//! Core simulation module
//!
//! Contains the tick clock, tuning, level files, the event queue and the
//! simulation loop that drives the agents.

mod config;
mod events;
mod level;
mod sim;
mod time;

pub use config::{ConfigError, SimConfig};
pub use events::{AgentId, EventQueue, GameEvent};
pub use level::{EnemySpawn, LegendEntry, Level, LevelError};
pub use sim::{SimError, SimStatus, Simulation, SimulationBuilder};
pub use time::{Time, Timer};
