//! Simulation loop
//!
//! Owns the map, the player and the enemies, and advances them in a fixed
//! order once per tick: the player first, then every enemy in spawn order,
//! then the win check. Nothing reads a wall clock; the caller passes each
//! tick's delta.

use std::fmt;
use std::sync::Arc;

use glam::IVec2;

use crate::ai::{AgentError, EnemyAgent, PatrolSpec, PlayerAgent};
use crate::core::{EventQueue, GameEvent, Level, LevelError, SimConfig, Time};
use crate::input::{InputScript, PlayerInput};
use crate::tiles::TileMap;

/// Where the level stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimStatus {
    /// Still playing
    Running,
    /// The player reached the goal
    Won,
    /// An enemy caught the player
    Lost,
}

/// Errors building or running a simulation
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// An agent could not be built or ticked
    Agent(AgentError),
    /// The level could not be turned into a map
    Level(LevelError),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agent(e) => write!(f, "Agent error: {e}"),
            Self::Level(e) => write!(f, "Level error: {e}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Agent(e) => Some(e),
            Self::Level(e) => Some(e),
        }
    }
}

impl From<AgentError> for SimError {
    fn from(e: AgentError) -> Self {
        Self::Agent(e)
    }
}

impl From<LevelError> for SimError {
    fn from(e: LevelError) -> Self {
        Self::Level(e)
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// A running level
pub struct Simulation {
    config: SimConfig,
    map: Arc<TileMap>,
    time: Time,
    events: EventQueue,
    player: PlayerAgent,
    enemies: Vec<EnemyAgent>,
    goal: Option<IVec2>,
    status: SimStatus,
}

impl Simulation {
    /// Start building a simulation on `map` with the player at `player`.
    #[must_use]
    pub fn builder(map: TileMap, player: IVec2) -> SimulationBuilder {
        SimulationBuilder {
            map,
            player,
            boat: None,
            goal: None,
            enemies: Vec::new(),
            config: SimConfig::default(),
        }
    }

    /// Build a simulation from a level file.
    ///
    /// # Errors
    ///
    /// Returns an error if the level is invalid or an agent cannot be built.
    pub fn from_level(level: &Level) -> Result<Self, SimError> {
        let map = level.build_map()?;
        let mut builder = Simulation::builder(map, level.player)
            .config(level.config.clone())
            .boat(level.boat)
            .goal(level.goal);
        for enemy in &level.enemies {
            builder = builder.enemy(enemy.spawn, enemy.patrol.clone(), enemy.chase);
        }

        log::info!(
            "Loaded level {:?}: {} enemies, goal {:?}",
            level.name,
            level.enemies.len(),
            level.goal
        );
        builder.build()
    }

    /// Advance one tick.
    ///
    /// Events produced during the tick are readable through [`events`]
    /// once this returns. A finished simulation no longer changes.
    ///
    /// [`events`]: Simulation::events
    ///
    /// # Errors
    ///
    /// Propagates agent errors.
    pub fn tick(&mut self, delta: f32, input: &PlayerInput) -> Result<SimStatus, SimError> {
        if self.status != SimStatus::Running {
            return Ok(self.status);
        }

        self.time.advance(delta);
        let delta = self.time.delta_seconds();

        self.player.tick(input, delta)?;
        self.events.extend(self.player.drain_events());

        let player = Some(self.player.cell());
        for enemy in &mut self.enemies {
            enemy.tick(player, delta)?;
            for event in enemy.drain_events() {
                if matches!(event, GameEvent::PlayerCaught { .. }) {
                    self.status = SimStatus::Lost;
                }
                self.events.push(event);
            }
        }

        if self.status == SimStatus::Running && self.goal == Some(self.player.cell()) {
            let frame = self.time.frame_count();
            log::info!("Level complete on frame {frame}");
            self.status = SimStatus::Won;
            self.events.push(GameEvent::LevelComplete { frame });
        }
        if self.status == SimStatus::Lost {
            log::info!("Game over on frame {}", self.time.frame_count());
        }

        self.events.swap();
        Ok(self.status)
    }

    /// Run up to `ticks` fixed ticks of `1 / tick_rate` seconds, feeding
    /// input from `script`. Stops early once the level is won or lost.
    ///
    /// # Errors
    ///
    /// Propagates agent errors.
    pub fn run(&mut self, ticks: u64, script: &InputScript) -> Result<SimStatus, SimError> {
        self.run_with(ticks, script, |_| {})
    }

    /// Like [`Simulation::run`], calling `on_tick` after every tick.
    ///
    /// # Errors
    ///
    /// Propagates agent errors.
    pub fn run_with<F>(
        &mut self,
        ticks: u64,
        script: &InputScript,
        mut on_tick: F,
    ) -> Result<SimStatus, SimError>
    where
        F: FnMut(&Simulation),
    {
        let delta = self.config.tick_seconds();
        for _ in 0..ticks {
            if self.status != SimStatus::Running {
                break;
            }
            let input = script.input_at(self.time.frame_count());
            self.tick(delta, &input)?;
            on_tick(self);
        }
        Ok(self.status)
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> SimStatus {
        self.status
    }

    /// Tick clock
    #[must_use]
    pub fn time(&self) -> &Time {
        &self.time
    }

    /// Events from the last tick
    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// The player
    #[must_use]
    pub fn player(&self) -> &PlayerAgent {
        &self.player
    }

    /// Enemies in spawn order
    #[must_use]
    pub fn enemies(&self) -> &[EnemyAgent] {
        &self.enemies
    }

    /// The level map
    #[must_use]
    pub fn map(&self) -> &TileMap {
        &self.map
    }

    /// Goal cell, if any
    #[must_use]
    pub fn goal(&self) -> Option<IVec2> {
        self.goal
    }

    /// Tuning in use
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("frame", &self.time.frame_count())
            .field("status", &self.status)
            .field("player", &self.player)
            .field("enemies", &self.enemies)
            .finish()
    }
}

/// Builder for [`Simulation`]
#[derive(Debug, Clone)]
pub struct SimulationBuilder {
    map: TileMap,
    player: IVec2,
    boat: Option<IVec2>,
    goal: Option<IVec2>,
    enemies: Vec<(IVec2, PatrolSpec, bool)>,
    config: SimConfig,
}

impl SimulationBuilder {
    /// Tuning
    #[must_use]
    pub fn config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    /// Boat position
    #[must_use]
    pub fn boat(mut self, boat: Option<IVec2>) -> Self {
        self.boat = boat;
        self
    }

    /// Goal cell
    #[must_use]
    pub fn goal(mut self, goal: Option<IVec2>) -> Self {
        self.goal = goal;
        self
    }

    /// Add an enemy; enemies update in the order they are added
    #[must_use]
    pub fn enemy(mut self, spawn: IVec2, patrol: PatrolSpec, chase: bool) -> Self {
        self.enemies.push((spawn, patrol, chase));
        self
    }

    /// Build the agents.
    ///
    /// # Errors
    ///
    /// Returns an error if an agent cannot be built.
    pub fn build(self) -> Result<Simulation, SimError> {
        let map = Arc::new(self.map);
        let config = self.config;

        let player = PlayerAgent::builder(self.player)
            .map(Arc::clone(&map))
            .boat(self.boat)
            .config(&config)
            .build()?;

        let enemies = self
            .enemies
            .into_iter()
            .enumerate()
            .map(|(index, (spawn, patrol, chase))| {
                EnemyAgent::builder(index, spawn)
                    .map(Arc::clone(&map))
                    .patrol(patrol)
                    .chase(chase)
                    .config(&config)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Simulation {
            config,
            map,
            time: Time::new(),
            events: EventQueue::new(),
            player,
            enemies,
            goal: self.goal,
            status: SimStatus::Running,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
