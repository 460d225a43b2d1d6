//! Tile maps
//!
//! The concrete graph the game plans over: a grid of tiles whose palette
//! carries movement costs and walkability.

mod map;

pub use map::{TileDef, TileError, TileKind, TileMap};
