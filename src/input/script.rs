//! Per-frame player input and recorded input scripts

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::command::InputMapper;
use crate::ai::Direction;

/// What the player asked for during one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerInput {
    /// Held movement direction
    pub direction: Option<Direction>,
    /// Clicked cell, for click-to-move
    pub click: Option<IVec2>,
    /// Board or leave the boat
    pub interact: bool,
}

impl PlayerInput {
    /// Input holding a direction
    #[must_use]
    pub fn moving(direction: Direction) -> Self {
        Self {
            direction: Some(direction),
            ..Self::default()
        }
    }

    /// Input clicking a cell
    #[must_use]
    pub fn click(cell: IVec2) -> Self {
        Self {
            click: Some(cell),
            ..Self::default()
        }
    }

    /// Input pressing interact
    #[must_use]
    pub fn interact() -> Self {
        Self {
            interact: true,
            ..Self::default()
        }
    }

    /// True when nothing is pressed
    #[must_use]
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

fn one_frame() -> u64 {
    1
}

/// One entry of an input script.
///
/// `direction` is held for `hold` frames starting at `frame`. Clicks and
/// interact presses only happen on `frame` itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedInput {
    /// First frame of the entry
    pub frame: u64,
    /// How many frames the direction is held
    #[serde(default = "one_frame")]
    pub hold: u64,
    /// Held direction
    #[serde(default)]
    pub direction: Option<Direction>,
    /// Clicked cell
    #[serde(default)]
    pub click: Option<IVec2>,
    /// Interact press
    #[serde(default)]
    pub interact: bool,
}

impl ScriptedInput {
    /// Entry pressing `input` at `frame`, direction held for `hold` frames
    #[must_use]
    pub fn new(frame: u64, hold: u64, input: PlayerInput) -> Self {
        Self {
            frame,
            hold,
            direction: input.direction,
            click: input.click,
            interact: input.interact,
        }
    }
}

/// Recorded input, looked up by frame number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputScript {
    entries: Vec<ScriptedInput>,
}

impl InputScript {
    /// Empty script: no input on any frame
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&mut self, entry: ScriptedInput) {
        self.entries.push(entry);
    }

    /// Builder form of [`InputScript::push`]
    #[must_use]
    pub fn with(mut self, frame: u64, hold: u64, input: PlayerInput) -> Self {
        self.push(ScriptedInput::new(frame, hold, input));
        self
    }

    /// Build a script from key characters, each held for `frames_per_key`
    /// frames. Unbound keys are skipped with a warning but still take time.
    pub fn from_keys(keys: &str, mapper: &InputMapper, frames_per_key: u64) -> Self {
        let frames_per_key = frames_per_key.max(1);
        let mut script = Self::new();

        for (index, key) in keys.chars().enumerate() {
            let Some(action) = mapper.get_action(key) else {
                log::warn!("No binding for key {key:?}, skipping");
                continue;
            };

            let mut input = PlayerInput::default();
            action.apply(&mut input);
            if !input.is_idle() {
                script.push(ScriptedInput::new(
                    index as u64 * frames_per_key,
                    frames_per_key,
                    input,
                ));
            }
        }

        script
    }

    /// Input for `frame`. Later entries override earlier ones field by field.
    #[must_use]
    pub fn input_at(&self, frame: u64) -> PlayerInput {
        let mut input = PlayerInput::default();

        for entry in &self.entries {
            if frame == entry.frame {
                if entry.click.is_some() {
                    input.click = entry.click;
                }
                input.interact |= entry.interact;
            }

            let held = frame >= entry.frame && frame < entry.frame + entry.hold.max(1);
            if held && entry.direction.is_some() {
                input.direction = entry.direction;
            }
        }

        input
    }

    /// Frame after the last one with any input
    #[must_use]
    pub fn end_frame(&self) -> u64 {
        self.entries
            .iter()
            .map(|entry| entry.frame + entry.hold.max(1))
            .max()
            .unwrap_or(0)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the script has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
