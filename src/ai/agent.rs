//! Agent controllers
//!
//! An agent is a state machine plus the context its behavior units act on.
//! The context carries everything a unit needs for one tick (the map, the
//! agent's cell, the frame delta, the player's position) and collects the
//! events the units produce.

use std::fmt;
use std::sync::Arc;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::behaviors::{
    Boat, ChaseBehavior, Idle, PathFollower, TeleportPatrol, Walk, WaypointPatrol,
};
use super::bfs::{ChasePlanner, DIRECTIONS};
use super::dijkstra::PathError;
use super::fsm::{FsmError, StateMachine};
use crate::core::{AgentId, ConfigError, GameEvent, SimConfig};
use crate::input::PlayerInput;
use crate::tiles::TileMap;

// ============================================================================
// Errors
// ============================================================================

/// Errors building or running an agent
#[derive(Debug, Clone, PartialEq)]
pub enum AgentError {
    /// The builder was not given something every agent needs
    MissingCapability(&'static str),
    /// A patrol was configured without any points
    EmptyPatrol,
    /// Speeds, delays or radii that cannot drive movement
    Config(ConfigError),
    /// The state machine was misused
    Fsm(FsmError),
    /// Click-to-move planning failed
    Path(PathError),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCapability(what) => write!(f, "Agent is missing required {what}"),
            Self::EmptyPatrol => write!(f, "Patrol needs at least one point"),
            Self::Config(e) => write!(f, "Invalid tuning: {e}"),
            Self::Fsm(e) => write!(f, "State machine error: {e}"),
            Self::Path(e) => write!(f, "Path planning error: {e}"),
        }
    }
}

impl std::error::Error for AgentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Fsm(e) => Some(e),
            Self::Path(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for AgentError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<FsmError> for AgentError {
    fn from(e: FsmError) -> Self {
        Self::Fsm(e)
    }
}

impl From<PathError> for AgentError {
    fn from(e: PathError) -> Self {
        Self::Path(e)
    }
}

// ============================================================================
// Enemy
// ============================================================================

/// What an enemy does while the player is out of reach.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatrolSpec {
    /// Stand still
    #[default]
    Stationary,
    /// Walk through the points in order, looping
    Waypoints(Vec<IVec2>),
    /// Jump to the next point every `teleport_delay` seconds, looping
    Teleport(Vec<IVec2>),
}

/// Per-tick view an enemy's behavior units work on.
#[derive(Debug, Clone)]
pub struct EnemyContext {
    /// Which enemy this is
    pub id: AgentId,
    /// The level
    pub map: Arc<TileMap>,
    /// Current cell
    pub cell: IVec2,
    /// The player's cell, if there is a player to chase
    pub player: Option<IVec2>,
    /// Chase trigger distance in tiles
    pub chase_radius: f32,
    /// Seconds covered by this tick
    pub delta: f32,
    /// Events produced this tick
    pub events: Vec<GameEvent>,
}

impl EnemyContext {
    /// Check if the player is within the chase radius.
    #[must_use]
    pub fn player_in_range(&self) -> bool {
        self.player.is_some_and(|player| {
            let d = (player - self.cell).as_vec2();
            d.length_squared() <= self.chase_radius * self.chase_radius
        })
    }

    /// Step into an adjacent cell.
    pub fn move_to(&mut self, cell: IVec2) {
        self.events.push(GameEvent::Moved {
            agent: self.id,
            from: self.cell,
            to: cell,
        });
        self.cell = cell;
    }

    /// Jump to any cell.
    pub fn teleport(&mut self, cell: IVec2) {
        self.cell = cell;
        self.events.push(GameEvent::Teleported { agent: self.id, to: cell });
    }
}

/// An enemy: patrol unit, optional chase unit, and the transitions between.
pub struct EnemyAgent {
    fsm: StateMachine<EnemyContext>,
    ctx: EnemyContext,
}

impl EnemyAgent {
    /// Start building the enemy with spawn index `index` at `spawn`.
    #[must_use]
    pub fn builder(index: usize, spawn: IVec2) -> EnemyBuilder {
        EnemyBuilder {
            index,
            spawn,
            map: None,
            patrol: PatrolSpec::Stationary,
            chase: true,
            config: SimConfig::default(),
        }
    }

    /// Advance one tick with the player at `player`.
    ///
    /// # Errors
    ///
    /// Propagates state machine errors.
    pub fn tick(&mut self, player: Option<IVec2>, delta: f32) -> Result<(), AgentError> {
        self.ctx.player = player;
        self.ctx.delta = delta;

        let switched = self.fsm.tick(&mut self.ctx)?;
        if let Some(state) = switched.and_then(|_| self.fsm.current_state_name()) {
            self.ctx.events.push(GameEvent::StateChanged {
                agent: self.ctx.id,
                state,
            });
        }
        self.fsm.update_active(&mut self.ctx)?;
        Ok(())
    }

    /// Take the events produced since the last call.
    pub fn drain_events(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.ctx.events.drain(..)
    }

    /// Current cell
    #[must_use]
    pub fn cell(&self) -> IVec2 {
        self.ctx.cell
    }

    /// Identity used in events
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.ctx.id
    }

    /// Name of the active behavior
    #[must_use]
    pub fn state_name(&self) -> Option<&'static str> {
        self.fsm.current_state_name()
    }

    /// Read-only access to the state machine
    #[must_use]
    pub fn fsm(&self) -> &StateMachine<EnemyContext> {
        &self.fsm
    }
}

impl fmt::Debug for EnemyAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnemyAgent")
            .field("id", &self.ctx.id)
            .field("cell", &self.ctx.cell)
            .field("state", &self.state_name())
            .finish()
    }
}

/// Builder for [`EnemyAgent`]
#[derive(Debug, Clone)]
pub struct EnemyBuilder {
    index: usize,
    spawn: IVec2,
    map: Option<Arc<TileMap>>,
    patrol: PatrolSpec,
    chase: bool,
    config: SimConfig,
}

impl EnemyBuilder {
    /// Map the enemy moves on (required)
    #[must_use]
    pub fn map(mut self, map: Arc<TileMap>) -> Self {
        self.map = Some(map);
        self
    }

    /// Patrol behavior
    #[must_use]
    pub fn patrol(mut self, patrol: PatrolSpec) -> Self {
        self.patrol = patrol;
        self
    }

    /// Whether the enemy chases the player (default true)
    #[must_use]
    pub fn chase(mut self, chase: bool) -> Self {
        self.chase = chase;
        self
    }

    /// Speeds, radii and search limits
    #[must_use]
    pub fn config(mut self, config: &SimConfig) -> Self {
        self.config = config.clone();
        self
    }

    /// Wire up and initialize the state machine.
    ///
    /// # Errors
    ///
    /// [`AgentError::MissingCapability`] without a map,
    /// [`AgentError::Config`] for unusable tuning and
    /// [`AgentError::EmptyPatrol`] for a patrol without points.
    pub fn build(self) -> Result<EnemyAgent, AgentError> {
        let map = self.map.ok_or(AgentError::MissingCapability("tile map"))?;
        let config = self.config;
        config.validate()?;

        let mut fsm = StateMachine::new();
        let patrol = match self.patrol {
            PatrolSpec::Stationary => fsm.add_state(Idle),
            PatrolSpec::Waypoints(points) | PatrolSpec::Teleport(points) if points.is_empty() => {
                return Err(AgentError::EmptyPatrol);
            }
            PatrolSpec::Waypoints(points) => fsm.add_state(
                WaypointPatrol::new(points, config.enemy_patrol_speed)
                    .with_planner(ChasePlanner::new().with_max_visited(config.max_bfs_nodes)),
            ),
            PatrolSpec::Teleport(points) => {
                fsm.add_state(TeleportPatrol::new(points, config.teleport_delay))
            }
        };

        if self.chase {
            let chase = fsm.add_state(
                ChaseBehavior::new(config.enemy_chase_speed)
                    .with_planner(ChasePlanner::new().with_max_visited(config.max_bfs_nodes)),
            );
            fsm.add_transition(patrol, EnemyContext::player_in_range, chase)?;
            fsm.add_transition(chase, |ctx: &EnemyContext| !ctx.player_in_range(), patrol)?;
        }

        let mut ctx = EnemyContext {
            id: AgentId::Enemy(self.index),
            map,
            cell: self.spawn,
            player: None,
            chase_radius: config.chase_radius,
            delta: 0.0,
            events: Vec::new(),
        };
        fsm.initialize(&mut ctx)?;

        Ok(EnemyAgent { fsm, ctx })
    }
}

// ============================================================================
// Player
// ============================================================================

/// Per-tick view the player's behavior units work on.
#[derive(Debug, Clone)]
pub struct PlayerContext {
    /// The level
    pub map: Arc<TileMap>,
    /// Current cell
    pub cell: IVec2,
    /// Where the boat is, if the level has one
    pub boat: Option<IVec2>,
    /// Whether the player is on the boat
    pub mounted: bool,
    /// Boarding distance in tiles
    pub boat_detect_radius: f32,
    /// This tick's input
    pub input: PlayerInput,
    /// Seconds covered by this tick
    pub delta: f32,
    /// Events produced this tick
    pub events: Vec<GameEvent>,
}

impl PlayerContext {
    /// Check if the boat is close enough to board.
    #[must_use]
    pub fn boat_in_reach(&self) -> bool {
        !self.mounted
            && self.boat.is_some_and(|boat| {
                (boat - self.cell).as_vec2().length() <= self.boat_detect_radius
            })
    }

    /// First walkable cell next to the player, in [`DIRECTIONS`] order.
    #[must_use]
    pub fn landing_cell(&self) -> Option<IVec2> {
        DIRECTIONS
            .iter()
            .map(|dir| self.cell + dir.offset())
            .find(|cell| self.map.is_walkable(*cell))
    }

    /// Interact pressed next to the boat
    #[must_use]
    pub fn wants_to_board(&self) -> bool {
        self.input.interact && self.boat_in_reach()
    }

    /// Interact pressed while mounted, with land to step onto
    #[must_use]
    pub fn wants_to_land(&self) -> bool {
        self.input.interact && self.mounted && self.landing_cell().is_some()
    }

    /// Step into an adjacent cell, taking the boat along when mounted.
    pub fn move_to(&mut self, cell: IVec2) {
        self.events.push(GameEvent::Moved {
            agent: AgentId::Player,
            from: self.cell,
            to: cell,
        });
        self.cell = cell;
        if self.mounted {
            self.boat = Some(cell);
        }
    }
}

/// The player: walk/boat state machine plus click-to-move.
pub struct PlayerAgent {
    fsm: StateMachine<PlayerContext>,
    ctx: PlayerContext,
    follower: PathFollower,
}

impl PlayerAgent {
    /// Start building the player at `spawn`.
    #[must_use]
    pub fn builder(spawn: IVec2) -> PlayerBuilder {
        PlayerBuilder {
            spawn,
            map: None,
            boat: None,
            config: SimConfig::default(),
        }
    }

    /// Advance one tick.
    ///
    /// A click plans a route on foot; clicks while on the boat are ignored.
    /// While a route is being followed, direction input is ignored.
    /// Boarding or landing drops the route.
    ///
    /// # Errors
    ///
    /// Propagates state machine and path planning errors.
    pub fn tick(&mut self, input: &PlayerInput, delta: f32) -> Result<(), AgentError> {
        self.ctx.input = *input;
        self.ctx.delta = delta;

        if let Some(target) = input.click {
            if self.ctx.mounted {
                log::debug!("Ignoring click on {target} while on the boat");
            } else {
                self.follower.plan(&mut self.ctx, target)?;
            }
        }

        let switched = self.fsm.tick(&mut self.ctx)?;
        if switched.is_some() {
            self.follower.cancel();
        }
        if let Some(state) = switched.and_then(|_| self.fsm.current_state_name()) {
            self.ctx.events.push(GameEvent::StateChanged {
                agent: AgentId::Player,
                state,
            });
        }

        if self.follower.is_active() {
            self.follower.update(&mut self.ctx);
        } else {
            self.fsm.update_active(&mut self.ctx)?;
        }
        Ok(())
    }

    /// Take the events produced since the last call.
    pub fn drain_events(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.ctx.events.drain(..)
    }

    /// Current cell
    #[must_use]
    pub fn cell(&self) -> IVec2 {
        self.ctx.cell
    }

    /// Boat cell, if the level has a boat
    #[must_use]
    pub fn boat(&self) -> Option<IVec2> {
        self.ctx.boat
    }

    /// Whether the player is on the boat
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.ctx.mounted
    }

    /// Whether a click-to-move route is being followed
    #[must_use]
    pub fn is_following_path(&self) -> bool {
        self.follower.is_active()
    }

    /// Name of the active behavior
    #[must_use]
    pub fn state_name(&self) -> Option<&'static str> {
        self.fsm.current_state_name()
    }
}

impl fmt::Debug for PlayerAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerAgent")
            .field("cell", &self.ctx.cell)
            .field("mounted", &self.ctx.mounted)
            .field("state", &self.state_name())
            .finish()
    }
}

/// Builder for [`PlayerAgent`]
#[derive(Debug, Clone)]
pub struct PlayerBuilder {
    spawn: IVec2,
    map: Option<Arc<TileMap>>,
    boat: Option<IVec2>,
    config: SimConfig,
}

impl PlayerBuilder {
    /// Map the player moves on (required)
    #[must_use]
    pub fn map(mut self, map: Arc<TileMap>) -> Self {
        self.map = Some(map);
        self
    }

    /// Boat position, if any
    #[must_use]
    pub fn boat(mut self, boat: Option<IVec2>) -> Self {
        self.boat = boat;
        self
    }

    /// Speeds and radii
    #[must_use]
    pub fn config(mut self, config: &SimConfig) -> Self {
        self.config = config.clone();
        self
    }

    /// Wire up and initialize the state machine.
    ///
    /// # Errors
    ///
    /// [`AgentError::MissingCapability`] without a map,
    /// [`AgentError::Config`] for unusable tuning.
    pub fn build(self) -> Result<PlayerAgent, AgentError> {
        let map = self.map.ok_or(AgentError::MissingCapability("tile map"))?;
        let config = self.config;
        config.validate()?;

        let mut fsm = StateMachine::new();
        let walk = fsm.add_state(Walk::new(config.player_speed));
        let boat = fsm.add_state(Boat::new(config.boat_speed));
        fsm.add_transition(walk, PlayerContext::wants_to_board, boat)?;
        fsm.add_transition(boat, PlayerContext::wants_to_land, walk)?;

        let mut ctx = PlayerContext {
            map,
            cell: self.spawn,
            boat: self.boat,
            mounted: false,
            boat_detect_radius: config.boat_detect_radius,
            input: PlayerInput::default(),
            delta: 0.0,
            events: Vec::new(),
        };
        fsm.initialize(&mut ctx)?;

        Ok(PlayerAgent {
            fsm,
            ctx,
            follower: PathFollower::new(config.player_speed),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
