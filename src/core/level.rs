//! Level files
//!
//! A level is a text tile map plus a legend, spawn points, tuning overrides
//! and optionally a recorded input script. Levels load from RON or JSON.
//!
//! Rows are written top to bottom; the last row is `y = 0`. All other
//! positions use map cells with +y up.

use std::fs;
use std::path::Path;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::ai::PatrolSpec;
use crate::core::SimConfig;
use crate::input::InputScript;
use crate::tiles::{TileDef, TileMap};

/// One legend line: which glyph stands for which tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    /// Glyph used in `rows`
    pub glyph: char,
    /// Tile it stands for
    pub tile: TileDef,
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    1
}

/// An enemy placed in the level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemySpawn {
    /// Starting cell
    pub spawn: IVec2,
    /// What it does while not chasing
    #[serde(default)]
    pub patrol: PatrolSpec,
    /// Whether it chases the player
    #[serde(default = "default_true")]
    pub chase: bool,
}

/// A serializable level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Level name
    pub name: String,
    /// Level format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Map rows, top first
    pub rows: Vec<String>,
    /// Glyph meanings; a space is always "no tile"
    pub legend: Vec<LegendEntry>,
    /// Player spawn
    pub player: IVec2,
    /// Boat position
    #[serde(default)]
    pub boat: Option<IVec2>,
    /// Reaching this cell completes the level
    #[serde(default)]
    pub goal: Option<IVec2>,
    /// Enemies, in update order
    #[serde(default)]
    pub enemies: Vec<EnemySpawn>,
    /// Tuning for this level
    #[serde(default)]
    pub config: SimConfig,
    /// Recorded input to replay
    #[serde(default)]
    pub script: InputScript,
}

impl Level {
    /// Create a level with no legend, spawning the player at the origin
    #[must_use]
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        rows: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            version: 1,
            rows: rows.into_iter().map(Into::into).collect(),
            legend: Vec::new(),
            player: IVec2::ZERO,
            boat: None,
            goal: None,
            enemies: Vec::new(),
            config: SimConfig::default(),
            script: InputScript::default(),
        }
    }

    /// Add a legend entry
    #[must_use]
    pub fn with_tile(mut self, glyph: char, tile: TileDef) -> Self {
        self.legend.push(LegendEntry { glyph, tile });
        self
    }

    /// Set the player spawn
    #[must_use]
    pub fn with_player(mut self, spawn: IVec2) -> Self {
        self.player = spawn;
        self
    }

    /// Place the boat
    #[must_use]
    pub fn with_boat(mut self, boat: IVec2) -> Self {
        self.boat = Some(boat);
        self
    }

    /// Set the goal cell
    #[must_use]
    pub fn with_goal(mut self, goal: IVec2) -> Self {
        self.goal = Some(goal);
        self
    }

    /// Add an enemy
    #[must_use]
    pub fn with_enemy(mut self, spawn: IVec2, patrol: PatrolSpec, chase: bool) -> Self {
        self.enemies.push(EnemySpawn { spawn, patrol, chase });
        self
    }

    /// Override the tuning
    #[must_use]
    pub fn with_config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach an input script
    #[must_use]
    pub fn with_script(mut self, script: InputScript) -> Self {
        self.script = script;
        self
    }

    /// Build the tile map and check that every placed thing fits on it.
    ///
    /// # Errors
    ///
    /// Returns [`LevelError::InvalidLevel`] for malformed rows, unknown
    /// glyphs, negative costs, unusable tuning, or spawns on unsuitable cells.
    pub fn build_map(&self) -> Result<TileMap, LevelError> {
        self.config
            .validate()
            .map_err(|e| LevelError::InvalidLevel(e.to_string()))?;

        let legend: Vec<(char, TileDef)> = self
            .legend
            .iter()
            .map(|entry| (entry.glyph, entry.tile.clone()))
            .collect();
        let map = TileMap::from_rows(self.rows.as_slice(), &legend)
            .map_err(|e| LevelError::InvalidLevel(e.to_string()))?;

        if !map.is_walkable(self.player) {
            return Err(LevelError::InvalidLevel(format!(
                "Player spawn {} is not on a walkable tile",
                self.player
            )));
        }
        if let Some(boat) = self.boat
            && !map.is_water(boat)
        {
            return Err(LevelError::InvalidLevel(format!("Boat {boat} is not on water")));
        }
        if let Some(goal) = self.goal
            && !map.has_tile(goal)
        {
            return Err(LevelError::InvalidLevel(format!("Goal {goal} is off the map")));
        }

        for (index, enemy) in self.enemies.iter().enumerate() {
            if !map.is_walkable(enemy.spawn) {
                return Err(LevelError::InvalidLevel(format!(
                    "Enemy {index} spawn {} is not on a walkable tile",
                    enemy.spawn
                )));
            }
            let points = match &enemy.patrol {
                PatrolSpec::Stationary => &[][..],
                PatrolSpec::Waypoints(points) | PatrolSpec::Teleport(points) => points.as_slice(),
            };
            if let Some(point) = points.iter().find(|p| !map.is_walkable(**p)) {
                return Err(LevelError::InvalidLevel(format!(
                    "Enemy {index} patrol point {point} is not on a walkable tile"
                )));
            }
        }

        Ok(map)
    }

    /// Serialize to a RON string
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_ron_string(&self) -> Result<String, LevelError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| LevelError::SerializeError(e.to_string()))
    }

    /// Parse a RON string
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails
    pub fn from_ron_str(source: &str) -> Result<Self, LevelError> {
        ron::from_str(source).map_err(|e| LevelError::DeserializeError(e.to_string()))
    }

    /// Serialize to a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_json_string(&self) -> Result<String, LevelError> {
        serde_json::to_string_pretty(self).map_err(|e| LevelError::SerializeError(e.to_string()))
    }

    /// Parse a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails
    pub fn from_json_str(source: &str) -> Result<Self, LevelError> {
        serde_json::from_str(source).map_err(|e| LevelError::DeserializeError(e.to_string()))
    }

    /// Save the level to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), LevelError> {
        let ron_string = self.to_ron_string()?;
        fs::write(path, ron_string).map_err(|e| LevelError::IoError(e.to_string()))
    }

    /// Load a level from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let content = fs::read_to_string(path).map_err(|e| LevelError::IoError(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Save the level to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), LevelError> {
        let json_string = self.to_json_string()?;
        fs::write(path, json_string).map_err(|e| LevelError::IoError(e.to_string()))
    }

    /// Load a level from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let content = fs::read_to_string(path).map_err(|e| LevelError::IoError(e.to_string()))?;
        Self::from_json_str(&content)
    }

    /// Load a level, picking the format from the file extension (`.json`
    /// for JSON, anything else for RON).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::load_json(path)
        } else {
            Self::load_ron(path)
        }
    }
}

/// Errors that can occur during level operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    /// IO error
    IoError(String),
    /// Serialization error
    SerializeError(String),
    /// Deserialization error
    DeserializeError(String),
    /// The level parsed but does not describe a playable map
    InvalidLevel(String),
}

impl std::fmt::Display for LevelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::SerializeError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializeError(e) => write!(f, "Deserialization error: {e}"),
            Self::InvalidLevel(e) => write!(f, "Invalid level: {e}"),
        }
    }
}

impl std::error::Error for LevelError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PlayerInput;

    fn sample() -> Level {
        Level::new("Sample", ["..~", ".^~", "..."])
            .with_tile('.', TileDef::land("Grass", 1))
            .with_tile('^', TileDef::land("Mountain", 3))
            .with_tile('~', TileDef::water("Water", 2))
            .with_player(IVec2::new(0, 0))
            .with_boat(IVec2::new(2, 2))
            .with_goal(IVec2::new(2, 0))
            .with_enemy(
                IVec2::new(0, 2),
                PatrolSpec::Waypoints(vec![IVec2::new(1, 2), IVec2::new(0, 1)]),
                true,
            )
    }

    #[test]
    fn test_level_serialization_ron() {
        let level = sample().with_script(InputScript::new().with(3, 2, PlayerInput::interact()));

        let ron_str = level.to_ron_string().unwrap();
        assert!(ron_str.contains("Mountain"));

        let loaded = Level::from_ron_str(&ron_str).unwrap();
        assert_eq!(loaded, level);
    }

    #[test]
    fn test_level_serialization_json() {
        let level = sample();
        let json_str = level.to_json_string().unwrap();

        let loaded = Level::from_json_str(&json_str).unwrap();
        assert_eq!(loaded.name, "Sample");
        assert_eq!(loaded.enemies, level.enemies);
    }

    #[test]
    fn test_level_defaults_from_ron() {
        let level = Level::from_ron_str(
            r#"(
                name: "Tiny",
                rows: ["..", ".."],
                legend: [(glyph: '.', tile: (name: "Grass", cost: Some(1), walkable: true))],
                player: (0, 0),
                enemies: [(spawn: (1, 1))],
                config: (chase_radius: 4.0),
            )"#,
        )
        .unwrap();

        assert_eq!(level.version, 1);
        assert_eq!(level.boat, None);
        assert_eq!(level.enemies[0].patrol, PatrolSpec::Stationary);
        assert!(level.enemies[0].chase);
        assert_eq!(level.config.chase_radius, 4.0);
        assert_eq!(level.config.tick_rate, SimConfig::default().tick_rate);
        assert!(level.script.is_empty());
        assert!(level.build_map().is_ok());
    }

    #[test]
    fn test_build_map() {
        let map = sample().build_map().unwrap();
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 3);
        // Top row is y = 2
        assert!(map.is_water(IVec2::new(2, 2)));
        assert!(map.is_walkable(IVec2::new(0, 0)));
    }

    #[test]
    fn test_invalid_levels() {
        let unknown_glyph = Level::new("Bad", ["..x"]).with_tile('.', TileDef::land("Grass", 1));
        assert!(matches!(unknown_glyph.build_map(), Err(LevelError::InvalidLevel(_))));

        let negative = Level::new("Bad", [".."]).with_tile('.', TileDef::land("Grass", -2));
        assert!(matches!(negative.build_map(), Err(LevelError::InvalidLevel(_))));

        let player_on_water = sample().with_player(IVec2::new(2, 1));
        assert!(matches!(player_on_water.build_map(), Err(LevelError::InvalidLevel(_))));

        let boat_on_land = sample().with_boat(IVec2::new(0, 0));
        assert!(matches!(boat_on_land.build_map(), Err(LevelError::InvalidLevel(_))));

        let patrol_in_water = sample().with_enemy(
            IVec2::new(0, 0),
            PatrolSpec::Teleport(vec![IVec2::new(2, 2)]),
            false,
        );
        assert!(matches!(patrol_in_water.build_map(), Err(LevelError::InvalidLevel(_))));

        let instant_teleport =
            sample().with_config(SimConfig::default().with_teleport_delay(0.0));
        assert_eq!(
            instant_teleport.build_map(),
            Err(LevelError::InvalidLevel(
                "teleport_delay must be a positive number, got 0".to_string()
            ))
        );
    }

    #[test]
    fn test_zero_teleport_delay_from_ron_is_rejected() {
        let source = r#"(
            name: "Blink",
            rows: ["..."],
            legend: [(glyph: '.', tile: (name: "Grass", cost: Some(1), walkable: true))],
            player: (0, 0),
            enemies: [(spawn: (2, 0), patrol: Teleport([(1, 0), (2, 0)]), chase: false)],
            config: (teleport_delay: 0.0),
        )"#;
        let level = Level::from_ron_str(source).unwrap();
        assert!(matches!(level.build_map(), Err(LevelError::InvalidLevel(_))));
    }

    #[test]
    fn test_malformed_source() {
        assert!(matches!(
            Level::from_ron_str("(name: "),
            Err(LevelError::DeserializeError(_))
        ));
        assert!(matches!(
            Level::from_json_str("{}"),
            Err(LevelError::DeserializeError(_))
        ));
    }

    #[test]
    fn test_demo_level_parses() {
        let level = Level::from_ron_str(include_str!("../../levels/island.ron")).unwrap();
        assert!(level.build_map().is_ok());
        assert!(!level.script.is_empty());
    }
}
