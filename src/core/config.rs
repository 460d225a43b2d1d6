//! Simulation tuning

use std::fmt;

use serde::{Deserialize, Serialize};

/// Simulation configuration
///
/// Speeds are in tiles per second, radii in tiles, times in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed ticks per second used by `Simulation::run`
    pub tick_rate: u32,
    /// Player speed on foot
    pub player_speed: f32,
    /// Player speed while mounted on the boat
    pub boat_speed: f32,
    /// Enemy speed while patrolling
    pub enemy_patrol_speed: f32,
    /// Enemy speed while chasing
    pub enemy_chase_speed: f32,
    /// Enemies start chasing within this distance of the player
    pub chase_radius: f32,
    /// Pause between teleport patrol jumps
    pub teleport_delay: f32,
    /// The player can board the boat within this distance
    pub boat_detect_radius: f32,
    /// Upper bound on cells a chase search may discover (None = unbounded)
    pub max_bfs_nodes: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            player_speed: 4.0,
            boat_speed: 3.0,
            enemy_patrol_speed: 2.0,
            enemy_chase_speed: 3.0,
            chase_radius: 2.0,
            teleport_delay: 2.0,
            boat_detect_radius: 1.2,
            max_bfs_nodes: None,
        }
    }
}

impl SimConfig {
    /// Set the fixed tick rate
    pub fn with_tick_rate(mut self, tick_rate: u32) -> Self {
        self.tick_rate = tick_rate.max(1);
        self
    }

    /// Set player speeds on foot and on the boat
    pub fn with_player_speed(mut self, walk: f32, boat: f32) -> Self {
        self.player_speed = walk;
        self.boat_speed = boat;
        self
    }

    /// Set enemy patrol and chase speeds
    pub fn with_enemy_speed(mut self, patrol: f32, chase: f32) -> Self {
        self.enemy_patrol_speed = patrol;
        self.enemy_chase_speed = chase;
        self
    }

    /// Set the chase trigger radius
    pub fn with_chase_radius(mut self, radius: f32) -> Self {
        self.chase_radius = radius;
        self
    }

    /// Set the teleport patrol delay
    pub fn with_teleport_delay(mut self, seconds: f32) -> Self {
        self.teleport_delay = seconds;
        self
    }

    /// Set the boat boarding radius
    pub fn with_boat_detect_radius(mut self, radius: f32) -> Self {
        self.boat_detect_radius = radius;
        self
    }

    /// Bound the chase search
    pub fn with_max_bfs_nodes(mut self, limit: Option<usize>) -> Self {
        self.max_bfs_nodes = limit;
        self
    }

    /// Seconds per fixed tick
    #[must_use]
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Check that speeds and delays are positive and radii are not negative.
    ///
    /// # Errors
    ///
    /// Returns the first field holding an unusable value (NaN and infinity
    /// included).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("player_speed", self.player_speed),
            ("boat_speed", self.boat_speed),
            ("enemy_patrol_speed", self.enemy_patrol_speed),
            ("enemy_chase_speed", self.enemy_chase_speed),
            ("teleport_delay", self.teleport_delay),
        ];
        if let Some(&(field, value)) = positive
            .iter()
            .find(|(_, v)| !v.is_finite() || *v <= 0.0)
        {
            return Err(ConfigError::NotPositive { field, value });
        }

        let non_negative = [
            ("chase_radius", self.chase_radius),
            ("boat_detect_radius", self.boat_detect_radius),
        ];
        if let Some(&(field, value)) = non_negative
            .iter()
            .find(|(_, v)| !v.is_finite() || *v < 0.0)
        {
            return Err(ConfigError::Negative { field, value });
        }

        Ok(())
    }
}

/// Tuning values that cannot drive a simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// A speed or delay that must be above zero
    NotPositive {
        /// Field name
        field: &'static str,
        /// The offending value
        value: f32,
    },
    /// A radius below zero
    Negative {
        /// Field name
        field: &'static str,
        /// The offending value
        value: f32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPositive { field, value } => {
                write!(f, "{field} must be a positive number, got {value}")
            }
            Self::Negative { field, value } => {
                write!(f, "{field} must not be negative, got {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
