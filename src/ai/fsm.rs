//! Finite State Machine for AI Behavior
//!
//! A machine owns a list of behavior units and a list of guarded
//! transitions. Exactly one unit is enabled at a time; every tick the
//! transitions are scanned in registration order and the first one that
//! leaves the active unit with a true predicate fires.
//!
//! # Lifecycle
//!
//! 1. Register units with `add_state()` (the first one is the initial unit)
//! 2. Register transitions with `add_transition()`
//! 3. `initialize()` disables every unit, then enables the first
//! 4. Call `tick()` (or `update()`) once per frame
//!
//! # Example
//!
//! ```ignore
//! let mut fsm = StateMachine::new();
//! let patrol = fsm.add_state(WaypointPatrol::new(points, 2.0));
//! let chase = fsm.add_state(ChaseBehavior::new(3.0));
//! fsm.add_transition(patrol, |ctx: &EnemyContext| ctx.player_in_range(), chase)?;
//! fsm.add_transition(chase, |ctx: &EnemyContext| !ctx.player_in_range(), patrol)?;
//! fsm.initialize(&mut ctx)?;
//!
//! // Every frame
//! fsm.update(&mut ctx)?;
//! ```

use std::fmt;

// ============================================================================
// Behavior Trait
// ============================================================================

/// A unit of behavior the machine switches on and off.
///
/// Only the active unit receives `update()`.
pub trait Behavior<Ctx = ()>: fmt::Debug {
    /// Unit name for debugging and logging.
    fn name(&self) -> &'static str;

    /// Called when this unit becomes the active one.
    fn enable(&mut self, _ctx: &mut Ctx) {}

    /// Called when this unit stops being the active one, and once for every
    /// unit during `initialize()`.
    fn disable(&mut self, _ctx: &mut Ctx) {}

    /// Called each frame while this unit is active.
    fn update(&mut self, _ctx: &mut Ctx) {}
}

// ============================================================================
// Identifiers, Phases, Errors
// ============================================================================

/// Handle to a unit registered in a [`StateMachine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(usize);

impl StateId {
    /// Registration index of the unit
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether the machine has an active unit yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachinePhase {
    /// No unit is active; `tick()` is not allowed
    Uninitialized,
    /// A unit is active
    Ready,
}

/// Wiring mistakes reported by the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsmError {
    /// `initialize()` was called with no registered units
    NoStates,
    /// `tick()` was called before any unit was active
    NotInitialized,
    /// A handle that does not belong to this machine
    UnknownState(StateId),
}

impl fmt::Display for FsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoStates => write!(f, "No states were added before initialize() was called"),
            Self::NotInitialized => write!(f, "State machine ticked before initialize()"),
            Self::UnknownState(id) => write!(f, "Unknown state {id}"),
        }
    }
}

impl std::error::Error for FsmError {}

// ============================================================================
// Transition
// ============================================================================

/// Guard evaluated against the machine context
pub type Predicate<Ctx> = Box<dyn Fn(&Ctx) -> bool>;

/// A guarded edge between two units.
pub struct Transition<Ctx = ()> {
    /// Unit that must be active for this transition to be considered
    pub from: StateId,
    /// Guard, evaluated at most once per tick
    pub predicate: Predicate<Ctx>,
    /// Unit to switch to when the guard holds
    pub to: StateId,
}

impl<Ctx> fmt::Debug for Transition<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transition({} -> {})", self.from, self.to)
    }
}

// ============================================================================
// State Machine
// ============================================================================

/// A finite state machine over opaque behavior units.
///
/// # Type Parameters
///
/// - `Ctx`: Context passed to units and predicates (agent data, world view)
pub struct StateMachine<Ctx = ()> {
    /// Registered units, in registration order
    states: Vec<Box<dyn Behavior<Ctx>>>,
    /// Registered transitions, in registration order
    transitions: Vec<Transition<Ctx>>,
    /// Currently enabled unit
    active: Option<StateId>,
}

impl<Ctx> StateMachine<Ctx> {
    /// Create an empty, uninitialized machine.
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            transitions: Vec::new(),
            active: None,
        }
    }

    /// Register a unit. The first unit registered is the initial one.
    ///
    /// Units are moved into the machine, so the same unit can never be
    /// registered twice.
    pub fn add_state<B: Behavior<Ctx> + 'static>(&mut self, state: B) -> StateId {
        let id = StateId(self.states.len());
        self.states.push(Box::new(state));
        id
    }

    /// Register a guarded transition. Order matters: earlier transitions win.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::UnknownState`] if either handle was not returned by
    /// this machine's `add_state()`.
    pub fn add_transition<F>(
        &mut self,
        from: StateId,
        predicate: F,
        to: StateId,
    ) -> Result<(), FsmError>
    where
        F: Fn(&Ctx) -> bool + 'static,
    {
        self.check(from)?;
        self.check(to)?;
        self.transitions.push(Transition {
            from,
            predicate: Box::new(predicate),
            to,
        });
        Ok(())
    }

    /// Disable every unit, then enable the first one registered.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::NoStates`] if nothing was registered. The machine
    /// stays uninitialized in that case.
    pub fn initialize(&mut self, ctx: &mut Ctx) -> Result<StateId, FsmError> {
        for state in &mut self.states {
            state.disable(ctx);
        }
        self.active = None;

        if self.states.is_empty() {
            log::error!("StateMachine: no states were added before initialize() was called");
            return Err(FsmError::NoStates);
        }

        let first = StateId(0);
        self.go_to_state(ctx, first)?;
        Ok(first)
    }

    /// Evaluate transitions and fire at most one.
    ///
    /// Transitions are scanned in registration order; the first whose `from`
    /// is the active unit and whose predicate holds switches units, and the
    /// scan stops there. A panicking predicate unwinds to the caller.
    ///
    /// Returns the unit switched to, if any.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::NotInitialized`] if no unit is active.
    pub fn tick(&mut self, ctx: &mut Ctx) -> Result<Option<StateId>, FsmError> {
        let active = self.active.ok_or(FsmError::NotInitialized)?;

        let fired = self
            .transitions
            .iter()
            .find(|t| t.from == active && (t.predicate)(&*ctx))
            .map(|t| t.to);

        if let Some(to) = fired {
            self.go_to_state(ctx, to)?;
        }
        Ok(fired)
    }

    /// Run `tick()`, then let the active unit do its per-frame work.
    ///
    /// # Errors
    ///
    /// Same as [`StateMachine::tick`].
    pub fn update(&mut self, ctx: &mut Ctx) -> Result<Option<StateId>, FsmError> {
        let fired = self.tick(ctx)?;
        self.update_active(ctx)?;
        Ok(fired)
    }

    /// Let the active unit do its per-frame work without evaluating
    /// transitions.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::NotInitialized`] if no unit is active.
    pub fn update_active(&mut self, ctx: &mut Ctx) -> Result<(), FsmError> {
        let active = self.active.ok_or(FsmError::NotInitialized)?;
        self.states[active.0].update(ctx);
        Ok(())
    }

    /// Make `target` the active unit.
    ///
    /// No-op when `target` is already active. Otherwise the previous unit (if
    /// any) is disabled before `target` is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::UnknownState`] for a foreign handle.
    pub fn go_to_state(&mut self, ctx: &mut Ctx, target: StateId) -> Result<(), FsmError> {
        self.check(target)?;
        if self.active == Some(target) {
            return Ok(());
        }

        if let Some(previous) = self.active {
            self.states[previous.0].disable(ctx);
        }

        self.active = Some(target);
        self.states[target.0].enable(ctx);
        log::debug!("Going to state {}", self.states[target.0].name());
        Ok(())
    }

    /// Current lifecycle phase
    #[must_use]
    pub fn phase(&self) -> MachinePhase {
        if self.active.is_some() {
            MachinePhase::Ready
        } else {
            MachinePhase::Uninitialized
        }
    }

    /// Handle of the active unit
    #[must_use]
    pub fn active_state(&self) -> Option<StateId> {
        self.active
    }

    /// Name of the active unit
    #[must_use]
    pub fn current_state_name(&self) -> Option<&'static str> {
        self.active.map(|id| self.states[id.0].name())
    }

    /// Check if the active unit has the given name.
    #[must_use]
    pub fn is_in_state(&self, name: &str) -> bool {
        self.current_state_name() == Some(name)
    }

    /// Look up a registered unit
    #[must_use]
    pub fn state(&self, id: StateId) -> Option<&dyn Behavior<Ctx>> {
        self.states.get(id.0).map(|s| s.as_ref())
    }

    /// Number of registered units
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Number of registered transitions
    #[must_use]
    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    fn check(&self, id: StateId) -> Result<(), FsmError> {
        if id.0 < self.states.len() {
            Ok(())
        } else {
            Err(FsmError::UnknownState(id))
        }
    }
}

impl<Ctx> Default for StateMachine<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx> fmt::Debug for StateMachine<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current_state_name())
            .field("states", &self.states.len())
            .field("transitions", &self.transitions)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
