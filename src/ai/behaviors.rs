//! Behavior units for enemies and the player
//!
//! Movement is tile by tile. A [`Mover`] accumulates the frame deltas and
//! lets the agent into the next cell once enough time has passed, where
//! "enough" grows with the cost of the cell being entered.

use glam::IVec2;

use super::agent::{EnemyContext, PlayerContext};
use super::bfs::ChasePlanner;
use super::dijkstra::{PathError, shortest_path};
use super::fsm::Behavior;
use super::graph::TileCost;
use crate::core::{AgentId, GameEvent, Timer};

// ============================================================================
// Mover
// ============================================================================

/// Step timer with tile-cost scaled speed.
///
/// Entering a cell of cost `c` at `speed` tiles per second takes
/// `max(1, c) / speed` seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Mover {
    progress: f32,
}

impl Mover {
    /// Create a mover at rest
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds needed to enter a cell of `cost` at `speed`.
    #[must_use]
    pub fn step_seconds(speed: f32, cost: i32) -> f32 {
        cost.max(1) as f32 / speed
    }

    /// Feed `delta` seconds toward entering a cell; true when the step completes.
    ///
    /// Blocked cells never complete and clear any progress. At most one step
    /// completes per call.
    pub fn advance(&mut self, delta: f32, speed: f32, cost: TileCost) -> bool {
        let Some(cost) = cost.value() else {
            self.reset();
            return false;
        };
        if speed <= 0.0 {
            return false;
        }

        self.progress += delta.max(0.0) * speed / cost.max(1) as f32;
        if self.progress < 1.0 {
            return false;
        }

        self.progress = (self.progress - 1.0) % 1.0;
        true
    }

    /// Drop partial progress
    pub fn reset(&mut self) {
        self.progress = 0.0;
    }

    /// Fraction of the current step already covered
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.progress
    }
}

// ============================================================================
// Enemy Behaviors
// ============================================================================

/// Stand still.
#[derive(Debug, Clone, Copy, Default)]
pub struct Idle;

impl Behavior<EnemyContext> for Idle {
    fn name(&self) -> &'static str {
        "idle"
    }
}

/// Walk through a loop of waypoints.
///
/// Routes to the current waypoint with the BFS planner, so walls are walked
/// around. Restarts from the first waypoint whenever it is re-enabled.
#[derive(Debug, Clone)]
pub struct WaypointPatrol {
    waypoints: Vec<IVec2>,
    index: usize,
    speed: f32,
    planner: ChasePlanner,
    mover: Mover,
}

impl WaypointPatrol {
    /// Create a patrol over `waypoints` at `speed` tiles per second.
    #[must_use]
    pub fn new(waypoints: Vec<IVec2>, speed: f32) -> Self {
        Self {
            waypoints,
            index: 0,
            speed,
            planner: ChasePlanner::new(),
            mover: Mover::new(),
        }
    }

    /// Use a configured planner
    #[must_use]
    pub fn with_planner(mut self, planner: ChasePlanner) -> Self {
        self.planner = planner;
        self
    }

    /// Waypoint currently headed for
    #[must_use]
    pub fn current_waypoint(&self) -> Option<IVec2> {
        self.waypoints.get(self.index).copied()
    }

    fn advance_waypoint(&mut self) {
        if !self.waypoints.is_empty() {
            self.index = (self.index + 1) % self.waypoints.len();
        }
    }
}

impl Behavior<EnemyContext> for WaypointPatrol {
    fn name(&self) -> &'static str {
        "patrol"
    }

    fn enable(&mut self, _ctx: &mut EnemyContext) {
        self.index = 0;
        self.mover.reset();
    }

    fn update(&mut self, ctx: &mut EnemyContext) {
        if self.current_waypoint() == Some(ctx.cell) {
            self.advance_waypoint();
        }
        let Some(target) = self.current_waypoint() else {
            return;
        };

        let Some(next) = self.planner.next_step(ctx.cell, target, &*ctx.map) else {
            self.mover.reset();
            return;
        };

        if self.mover.advance(ctx.delta, self.speed, ctx.map.get_cost(next)) {
            ctx.move_to(next);
            if next == target {
                self.advance_waypoint();
            }
        }
    }
}

/// Jump between points on a timer.
///
/// The timer restarts each time the unit is enabled; the point index does not.
#[derive(Debug, Clone)]
pub struct TeleportPatrol {
    points: Vec<IVec2>,
    index: usize,
    timer: Timer,
}

impl TeleportPatrol {
    /// Create a patrol jumping every `delay` seconds.
    #[must_use]
    pub fn new(points: Vec<IVec2>, delay: f32) -> Self {
        Self {
            points,
            index: 0,
            timer: Timer::new(delay),
        }
    }
}

impl Behavior<EnemyContext> for TeleportPatrol {
    fn name(&self) -> &'static str {
        "teleport"
    }

    fn enable(&mut self, _ctx: &mut EnemyContext) {
        self.timer.reset();
    }

    fn update(&mut self, ctx: &mut EnemyContext) {
        if self.points.is_empty() {
            return;
        }
        for _ in 0..self.timer.tick(ctx.delta) {
            ctx.teleport(self.points[self.index]);
            self.index = (self.index + 1) % self.points.len();
        }
    }
}

/// Follow the player one BFS step at a time.
#[derive(Debug, Clone)]
pub struct ChaseBehavior {
    speed: f32,
    planner: ChasePlanner,
    mover: Mover,
}

impl ChaseBehavior {
    /// Create a chase at `speed` tiles per second.
    #[must_use]
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            planner: ChasePlanner::new(),
            mover: Mover::new(),
        }
    }

    /// Use a configured planner
    #[must_use]
    pub fn with_planner(mut self, planner: ChasePlanner) -> Self {
        self.planner = planner;
        self
    }
}

impl Behavior<EnemyContext> for ChaseBehavior {
    fn name(&self) -> &'static str {
        "chase"
    }

    fn enable(&mut self, _ctx: &mut EnemyContext) {
        self.mover.reset();
    }

    fn update(&mut self, ctx: &mut EnemyContext) {
        let Some(player) = ctx.player else {
            return;
        };

        match self.planner.next_step(ctx.cell, player, &*ctx.map) {
            Some(next) => {
                if self.mover.advance(ctx.delta, self.speed, ctx.map.get_cost(next)) {
                    ctx.move_to(next);
                }
            }
            None => self.mover.reset(),
        }

        if ctx.cell == player {
            log::info!("Player caught by {} at {}", ctx.id, ctx.cell);
            ctx.events.push(GameEvent::PlayerCaught {
                enemy: ctx.id,
                at: ctx.cell,
            });
        }
    }
}

// ============================================================================
// Player Behaviors
// ============================================================================

/// Move on foot with direction input over walkable tiles.
#[derive(Debug, Clone)]
pub struct Walk {
    speed: f32,
    mover: Mover,
}

impl Walk {
    /// Create the unit with a base speed in tiles per second
    #[must_use]
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            mover: Mover::new(),
        }
    }
}

impl Behavior<PlayerContext> for Walk {
    fn name(&self) -> &'static str {
        "walk"
    }

    fn enable(&mut self, _ctx: &mut PlayerContext) {
        self.mover.reset();
    }

    fn update(&mut self, ctx: &mut PlayerContext) {
        let Some(direction) = ctx.input.direction else {
            self.mover.reset();
            return;
        };

        let next = ctx.cell + direction.offset();
        if !ctx.map.is_walkable(next) {
            self.mover.reset();
            return;
        }

        if self.mover.advance(ctx.delta, self.speed, ctx.map.get_cost(next)) {
            ctx.move_to(next);
        }
    }
}

/// Sail the boat with direction input over water tiles.
///
/// Enabling boards the boat, disabling steps off onto the first walkable
/// neighbor. Water cost does not slow the boat.
#[derive(Debug, Clone)]
pub struct Boat {
    speed: f32,
    mover: Mover,
}

impl Boat {
    /// Create the unit with a sailing speed in tiles per second
    #[must_use]
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            mover: Mover::new(),
        }
    }
}

impl Behavior<PlayerContext> for Boat {
    fn name(&self) -> &'static str {
        "boat"
    }

    fn enable(&mut self, ctx: &mut PlayerContext) {
        self.mover.reset();
        let Some(boat) = ctx.boat else {
            return;
        };

        ctx.mounted = true;
        ctx.cell = boat;
        log::debug!("Mounted boat at {boat}");
        ctx.events.push(GameEvent::BoatMounted { at: boat });
    }

    fn disable(&mut self, ctx: &mut PlayerContext) {
        if !ctx.mounted {
            return;
        }

        let boat = ctx.cell;
        ctx.mounted = false;
        ctx.boat = Some(boat);
        if let Some(land) = ctx.landing_cell() {
            ctx.cell = land;
        }
        log::debug!("Dismounted boat at {boat}");
        ctx.events.push(GameEvent::BoatDismounted { boat, at: ctx.cell });
    }

    fn update(&mut self, ctx: &mut PlayerContext) {
        let Some(direction) = ctx.input.direction else {
            self.mover.reset();
            return;
        };

        let next = ctx.cell + direction.offset();
        if !ctx.map.is_water(next) {
            self.mover.reset();
            return;
        }

        if self.mover.advance(ctx.delta, self.speed, TileCost::Cost(1)) {
            ctx.move_to(next);
        }
    }
}

// ============================================================================
// Click-to-move
// ============================================================================

/// Walks a Dijkstra route to a clicked cell.
///
/// Not a state machine unit: while a route is active it takes over movement
/// from whichever unit is active.
#[derive(Debug, Clone)]
pub struct PathFollower {
    path: Vec<IVec2>,
    next: usize,
    speed: f32,
    mover: Mover,
}

impl PathFollower {
    /// Create an idle follower with a base speed in tiles per second
    #[must_use]
    pub fn new(speed: f32) -> Self {
        Self {
            path: Vec::new(),
            next: 0,
            speed,
            mover: Mover::new(),
        }
    }

    /// Plan a route from the player's cell to `target`, replacing any
    /// route in progress.
    ///
    /// Clicks on cells without a tile, or with no route to them, are logged
    /// and leave the current route untouched.
    ///
    /// # Errors
    ///
    /// Propagates solver errors.
    pub fn plan(&mut self, ctx: &mut PlayerContext, target: IVec2) -> Result<(), PathError> {
        if !ctx.map.has_tile(target) {
            log::warn!("Clicked an invalid tile at {target}");
            return Ok(());
        }

        let result = shortest_path(&*ctx.map, &ctx.cell, &target)?;
        if result.is_empty() {
            log::warn!("No path from {} to {target}", ctx.cell);
            return Ok(());
        }

        log::debug!("Path found: {} cells, cost {}", result.len(), result.cost);
        ctx.events.push(GameEvent::PathPlanned {
            agent: AgentId::Player,
            target,
            length: result.len(),
            cost: result.cost,
        });

        self.path = result.nodes;
        self.next = 1;
        self.mover.reset();
        Ok(())
    }

    /// Advance along the route.
    pub fn update(&mut self, ctx: &mut PlayerContext) {
        if let Some(&next) = self.path.get(self.next)
            && self.mover.advance(ctx.delta, self.speed, ctx.map.get_cost(next))
        {
            ctx.move_to(next);
            self.next += 1;
        }

        if self.is_active() && self.next >= self.path.len() {
            ctx.events.push(GameEvent::PathCompleted {
                agent: AgentId::Player,
                at: ctx.cell,
            });
            self.cancel();
        }
    }

    /// Drop the current route
    pub fn cancel(&mut self) {
        self.path.clear();
        self.next = 0;
        self.mover.reset();
    }

    /// Whether a route is being followed
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.path.is_empty()
    }

    /// Cells still ahead on the route
    #[must_use]
    pub fn remaining(&self) -> &[IVec2] {
        self.path.get(self.next..).unwrap_or(&[])
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::input::PlayerInput;
    use crate::tiles::{TileDef, TileMap};

    fn map(rows: &[&str]) -> Arc<TileMap> {
        let legend = [
            ('.', TileDef::land("Grass", 1)),
            ('^', TileDef::land("Mountain", 3)),
            ('~', TileDef::water("Water", 2)),
            ('#', TileDef::blocked("Wall")),
        ];
        Arc::new(TileMap::from_rows(rows, &legend).unwrap())
    }

    fn enemy_ctx(map: Arc<TileMap>, cell: IVec2) -> EnemyContext {
        EnemyContext {
            id: AgentId::Enemy(0),
            map,
            cell,
            player: None,
            chase_radius: 2.0,
            delta: 0.25,
            events: Vec::new(),
        }
    }

    fn player_ctx(map: Arc<TileMap>, cell: IVec2) -> PlayerContext {
        PlayerContext {
            map,
            cell,
            boat: None,
            mounted: false,
            boat_detect_radius: 1.2,
            input: PlayerInput::default(),
            delta: 0.25,
            events: Vec::new(),
        }
    }

    #[test]
    fn test_mover_scales_with_cost() {
        assert!((Mover::step_seconds(4.0, 1) - 0.25).abs() < f32::EPSILON);
        assert!((Mover::step_seconds(4.0, 3) - 0.75).abs() < f32::EPSILON);
        // Zero cost moves at base speed
        assert!((Mover::step_seconds(4.0, 0) - 0.25).abs() < f32::EPSILON);

        let mut mover = Mover::new();
        let ticks_for = |mover: &mut Mover, cost| {
            mover.reset();
            (1..=100)
                .find(|_| mover.advance(0.25, 1.0, TileCost::Cost(cost)))
                .unwrap_or(0)
        };
        assert_eq!(ticks_for(&mut mover, 1), 4);
        assert_eq!(ticks_for(&mut mover, 2), 8);
    }

    #[test]
    fn test_mover_blocked_never_arrives() {
        let mut mover = Mover::new();
        mover.advance(0.5, 1.0, TileCost::Cost(1));
        assert!(!mover.advance(10.0, 1.0, TileCost::Blocked));
        assert_eq!(mover.progress(), 0.0);
    }

    #[test]
    fn test_waypoint_patrol_loops() {
        let map = map(&["...."]);
        let mut ctx = enemy_ctx(map, IVec2::new(0, 0));
        let mut patrol = WaypointPatrol::new(vec![IVec2::new(2, 0), IVec2::new(0, 0)], 1.0);
        patrol.enable(&mut ctx);

        let mut visited = Vec::new();
        for _ in 0..16 {
            patrol.update(&mut ctx);
            if visited.last() != Some(&ctx.cell) {
                visited.push(ctx.cell);
            }
        }

        let xs: Vec<i32> = visited.iter().map(|c| c.x).collect();
        assert_eq!(xs, vec![0, 1, 2, 1, 0]);
    }

    #[test]
    fn test_waypoint_patrol_walks_around_walls() {
        let map = map(&["...", ".#.", "..."]);
        let mut ctx = enemy_ctx(map.clone(), IVec2::new(0, 1));
        let mut patrol = WaypointPatrol::new(vec![IVec2::new(2, 1)], 4.0);

        for _ in 0..8 {
            patrol.update(&mut ctx);
            assert!(map.is_walkable(ctx.cell));
        }
        assert_eq!(ctx.cell, IVec2::new(2, 1));
    }

    #[test]
    fn test_teleport_patrol_timer() {
        let map = map(&["...."]);
        let mut ctx = enemy_ctx(map, IVec2::ZERO);
        ctx.delta = 0.5;
        let points = vec![IVec2::new(3, 0), IVec2::new(1, 0)];
        let mut patrol = TeleportPatrol::new(points, 1.0);
        patrol.enable(&mut ctx);

        patrol.update(&mut ctx);
        assert_eq!(ctx.cell, IVec2::ZERO);
        patrol.update(&mut ctx);
        assert_eq!(ctx.cell, IVec2::new(3, 0));

        // Re-enabling restarts the wait but keeps the point order
        patrol.update(&mut ctx);
        patrol.enable(&mut ctx);
        patrol.update(&mut ctx);
        assert_eq!(ctx.cell, IVec2::new(3, 0));
        patrol.update(&mut ctx);
        assert_eq!(ctx.cell, IVec2::new(1, 0));

        assert!(matches!(ctx.events[0], GameEvent::Teleported { .. }));
    }

    #[test]
    fn test_chase_catches_player() {
        let map = map(&["...."]);
        let mut ctx = enemy_ctx(map, IVec2::ZERO);
        ctx.player = Some(IVec2::new(2, 0));
        let mut chase = ChaseBehavior::new(4.0);

        chase.update(&mut ctx);
        assert_eq!(ctx.cell, IVec2::new(1, 0));
        chase.update(&mut ctx);
        assert_eq!(ctx.cell, IVec2::new(2, 0));

        assert_eq!(
            ctx.events.last(),
            Some(&GameEvent::PlayerCaught {
                enemy: AgentId::Enemy(0),
                at: IVec2::new(2, 0)
            })
        );
    }

    #[test]
    fn test_chase_holds_when_player_unreachable() {
        // Player out on the water
        let map = map(&["..~~"]);
        let mut ctx = enemy_ctx(map, IVec2::ZERO);
        ctx.player = Some(IVec2::new(3, 0));
        let mut chase = ChaseBehavior::new(4.0);

        for _ in 0..4 {
            chase.update(&mut ctx);
        }
        assert_eq!(ctx.cell, IVec2::ZERO);
        assert!(ctx.events.is_empty());
    }

    #[test]
    fn test_walk_slows_on_mountains() {
        let map = map(&[".^"]);
        let mut ctx = player_ctx(map, IVec2::ZERO);
        ctx.input = PlayerInput::moving(crate::ai::Direction::Right);
        ctx.delta = 0.75;
        let mut walk = Walk::new(1.0);

        // Cost 3 at one tile per second: three seconds
        for _ in 0..3 {
            walk.update(&mut ctx);
        }
        assert_eq!(ctx.cell, IVec2::ZERO);
        walk.update(&mut ctx);
        assert_eq!(ctx.cell, IVec2::new(1, 0));
    }

    #[test]
    fn test_walk_stays_off_water() {
        let map = map(&[".~"]);
        let mut ctx = player_ctx(map, IVec2::ZERO);
        ctx.input = PlayerInput::moving(crate::ai::Direction::Right);
        let mut walk = Walk::new(4.0);

        for _ in 0..8 {
            walk.update(&mut ctx);
        }
        assert_eq!(ctx.cell, IVec2::ZERO);
    }

    #[test]
    fn test_path_follower_takes_cheapest_route() {
        // Through the mountains costs 7, around them costs 5
        let map = map(&["....", ".^^."]);
        let mut ctx = player_ctx(map, IVec2::new(0, 0));
        let mut follower = PathFollower::new(4.0);

        follower.plan(&mut ctx, IVec2::new(3, 0)).unwrap();
        assert!(follower.is_active());
        assert!(matches!(
            ctx.events[0],
            GameEvent::PathPlanned { length: 6, cost: 5, .. }
        ));

        let mut guard = 0;
        while follower.is_active() {
            follower.update(&mut ctx);
            guard += 1;
            assert!(guard < 100);
        }
        assert_eq!(ctx.cell, IVec2::new(3, 0));
        assert_eq!(
            ctx.events.last(),
            Some(&GameEvent::PathCompleted {
                agent: AgentId::Player,
                at: IVec2::new(3, 0)
            })
        );
    }

    #[test]
    fn test_path_follower_ignores_empty_cells() {
        let map = map(&["..", "# "]);
        let mut ctx = player_ctx(map, IVec2::new(0, 1));
        let mut follower = PathFollower::new(4.0);

        follower.plan(&mut ctx, IVec2::new(1, 0)).unwrap();
        assert!(!follower.is_active());

        // Wall tile exists but cannot be entered
        follower.plan(&mut ctx, IVec2::new(0, 0)).unwrap();
        assert!(!follower.is_active());
        assert!(ctx.events.is_empty());
    }

    #[test]
    fn test_path_follower_click_on_self() {
        let map = map(&["..."]);
        let mut ctx = player_ctx(map, IVec2::new(1, 0));
        let mut follower = PathFollower::new(4.0);

        follower.plan(&mut ctx, IVec2::new(1, 0)).unwrap();
        assert!(follower.is_active());
        assert!(follower.remaining().is_empty());

        follower.update(&mut ctx);
        assert!(!follower.is_active());
        assert_eq!(ctx.cell, IVec2::new(1, 0));
    }
}
