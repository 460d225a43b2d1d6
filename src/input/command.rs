//! Key bindings for scripted input
//!
//! Maps key characters to logical player actions so that input sequences can
//! be written compactly (`"dddd e ww"`) and rebound without touching the
//! simulation.
//!
//! # Example
//!
//! ```ignore
//! let mut mapper = InputMapper::with_defaults();
//! mapper.bind('k', InputAction::MoveUp);
//!
//! let mut input = PlayerInput::default();
//! if let Some(action) = mapper.get_action('k') {
//!     action.apply(&mut input);
//! }
//! ```

use rustc_hash::FxHashMap;

use super::script::PlayerInput;
use crate::ai::Direction;

// ============================================================================
// Input Actions
// ============================================================================

/// Logical actions a player can take in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum InputAction {
    /// Step up
    MoveUp,
    /// Step down
    MoveDown,
    /// Step left
    MoveLeft,
    /// Step right
    MoveRight,
    /// Board or leave the boat
    Interact,
    /// Do nothing this frame
    Wait,
}

impl InputAction {
    /// Movement direction for move actions
    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::MoveUp => Some(Direction::Up),
            Self::MoveDown => Some(Direction::Down),
            Self::MoveLeft => Some(Direction::Left),
            Self::MoveRight => Some(Direction::Right),
            Self::Interact | Self::Wait => None,
        }
    }

    /// Write this action into a frame's input.
    pub fn apply(self, input: &mut PlayerInput) {
        match self {
            Self::Interact => input.interact = true,
            Self::Wait => {}
            _ => input.direction = self.direction(),
        }
    }
}

// ============================================================================
// Input Mapper
// ============================================================================

/// Maps key characters to actions, with reverse lookup.
#[derive(Debug, Clone)]
pub struct InputMapper {
    key_bindings: FxHashMap<char, InputAction>,
    action_keys: FxHashMap<InputAction, Vec<char>>,
}

impl InputMapper {
    /// Create an empty input mapper.
    #[must_use]
    pub fn new() -> Self {
        Self {
            key_bindings: FxHashMap::default(),
            action_keys: FxHashMap::default(),
        }
    }

    /// Create an input mapper with WASD movement, `e` to interact and `.`
    /// or space to wait.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut mapper = Self::new();

        mapper.bind('w', InputAction::MoveUp);
        mapper.bind('s', InputAction::MoveDown);
        mapper.bind('a', InputAction::MoveLeft);
        mapper.bind('d', InputAction::MoveRight);

        mapper.bind('e', InputAction::Interact);

        mapper.bind('.', InputAction::Wait);
        mapper.bind(' ', InputAction::Wait);

        mapper
    }

    /// Bind a key to an action, replacing any previous binding of the key.
    pub fn bind(&mut self, key: char, action: InputAction) {
        if let Some(old_action) = self.key_bindings.get(&key)
            && let Some(keys) = self.action_keys.get_mut(old_action)
        {
            keys.retain(|k| *k != key);
        }

        self.key_bindings.insert(key, action);
        self.action_keys.entry(action).or_default().push(key);
    }

    /// Unbind a key.
    pub fn unbind(&mut self, key: char) {
        if let Some(action) = self.key_bindings.remove(&key)
            && let Some(keys) = self.action_keys.get_mut(&action)
        {
            keys.retain(|k| *k != key);
        }
    }

    /// Get the action for a key.
    #[must_use]
    pub fn get_action(&self, key: char) -> Option<InputAction> {
        self.key_bindings.get(&key).copied()
    }

    /// Get all keys bound to an action.
    #[must_use]
    pub fn get_keys(&self, action: InputAction) -> &[char] {
        self.action_keys.get(&action).map_or(&[], Vec::as_slice)
    }

    /// Number of bound keys
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.key_bindings.len()
    }
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_mapper_defaults() {
        let mapper = InputMapper::with_defaults();

        assert_eq!(mapper.get_action('w'), Some(InputAction::MoveUp));
        assert_eq!(mapper.get_action('d'), Some(InputAction::MoveRight));
        assert_eq!(mapper.get_action('e'), Some(InputAction::Interact));
        assert_eq!(mapper.get_action('x'), None);
    }

    #[test]
    fn test_input_mapper_rebind() {
        let mut mapper = InputMapper::with_defaults();
        mapper.bind('w', InputAction::Interact);

        assert_eq!(mapper.get_action('w'), Some(InputAction::Interact));
        assert!(mapper.get_keys(InputAction::MoveUp).is_empty());
        assert_eq!(mapper.get_keys(InputAction::Interact), &['e', 'w']);
    }

    #[test]
    fn test_input_mapper_unbind() {
        let mut mapper = InputMapper::with_defaults();
        let before = mapper.binding_count();

        mapper.unbind('a');

        assert_eq!(mapper.get_action('a'), None);
        assert_eq!(mapper.binding_count(), before - 1);
        assert!(mapper.get_keys(InputAction::MoveLeft).is_empty());
    }

    #[test]
    fn test_action_apply() {
        let mut input = PlayerInput::default();

        InputAction::MoveLeft.apply(&mut input);
        InputAction::Interact.apply(&mut input);
        InputAction::Wait.apply(&mut input);

        assert_eq!(input.direction, Some(Direction::Left));
        assert!(input.interact);
        assert_eq!(input.click, None);
    }
}
