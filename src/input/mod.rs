//! Player input
//!
//! Per-frame input values, recorded input scripts and key bindings for
//! writing scripts compactly.

mod command;
mod script;

pub use command::{InputAction, InputMapper};
pub use script::{InputScript, PlayerInput, ScriptedInput};
