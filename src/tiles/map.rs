//! Rectangular tile map with a per-kind palette
//!
//! Cells are addressed by `IVec2` with `(0, 0)` at the bottom-left and +y up.
//! A cell may hold no tile at all, which puts it outside the playable map.

use std::fmt;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::ai::{Edge, Graph, Neighbors, TileCost, Walkable};

/// Neighbor order used by the weighted graph view: right, left, up, down.
const GRAPH_DIRS: [IVec2; 4] = [
    IVec2::new(1, 0),
    IVec2::new(-1, 0),
    IVec2::new(0, 1),
    IVec2::new(0, -1),
];

/// Index of a tile definition in a map's palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileKind(pub u16);

/// What a kind of tile is and what it costs to enter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDef {
    /// Tile name (e.g. "Grass", "Mountain")
    pub name: String,
    /// Movement cost; `None` means the tile can never be entered
    #[serde(default)]
    pub cost: Option<i32>,
    /// Whether agents on foot may stand here
    #[serde(default)]
    pub walkable: bool,
    /// Whether a boat may float here
    #[serde(default)]
    pub water: bool,
}

impl TileDef {
    /// Create a walkable land tile with the given cost.
    #[must_use]
    pub fn land(name: impl Into<String>, cost: i32) -> Self {
        Self {
            name: name.into(),
            cost: Some(cost),
            walkable: true,
            water: false,
        }
    }

    /// Create a water tile with the given cost (not walkable on foot).
    #[must_use]
    pub fn water(name: impl Into<String>, cost: i32) -> Self {
        Self {
            name: name.into(),
            cost: Some(cost),
            walkable: false,
            water: true,
        }
    }

    /// Create a tile nothing may enter.
    #[must_use]
    pub fn blocked(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cost: None,
            walkable: false,
            water: false,
        }
    }
}

/// Errors building a tile map
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileError {
    /// A palette entry has a negative cost
    NegativeCost {
        /// Tile name
        name: String,
        /// The offending cost
        cost: i32,
    },
    /// A row's length differs from the first row's
    RaggedRows {
        /// Row index in the source (0 = top)
        row: usize,
        /// Expected width
        expected: usize,
        /// Actual width
        found: usize,
    },
    /// A glyph with no legend entry
    UnknownGlyph {
        /// The glyph
        glyph: char,
        /// Row index in the source (0 = top)
        row: usize,
        /// Column index
        column: usize,
    },
}

impl fmt::Display for TileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeCost { name, cost } => write!(f, "Tile {name} has negative cost {cost}"),
            Self::RaggedRows {
                row,
                expected,
                found,
            } => write!(f, "Row {row} has {found} cells, expected {expected}"),
            Self::UnknownGlyph { glyph, row, column } => {
                write!(f, "Unknown glyph {glyph:?} at row {row}, column {column}")
            }
        }
    }
}

impl std::error::Error for TileError {}

// ============================================================================
// Tile Map
// ============================================================================

/// A grid of optional tiles plus the palette describing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileMap {
    width: i32,
    height: i32,
    cells: Vec<Option<TileKind>>,
    palette: Vec<TileDef>,
}

impl TileMap {
    /// Glyph for a cell with no tile when parsing rows
    pub const EMPTY_GLYPH: char = ' ';

    /// Create an empty map (no tiles, empty palette).
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![None; (width * height) as usize],
            palette: Vec::new(),
        }
    }

    /// Parse a map from text rows; row 0 is the top of the map.
    ///
    /// [`TileMap::EMPTY_GLYPH`] marks a cell without a tile.
    ///
    /// # Errors
    ///
    /// Returns an error on ragged rows, unknown glyphs or negative costs.
    pub fn from_rows<S: AsRef<str>>(
        rows: &[S],
        legend: &[(char, TileDef)],
    ) -> Result<Self, TileError> {
        let width = rows.first().map_or(0, |r| r.as_ref().chars().count());
        let height = rows.len();
        let mut map = Self::new(width as i32, height as i32);

        let mut glyphs = Vec::with_capacity(legend.len());
        for (glyph, def) in legend {
            glyphs.push((*glyph, map.add_kind(def.clone())?));
        }

        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != width {
                return Err(TileError::RaggedRows {
                    row,
                    expected: width,
                    found,
                });
            }

            let y = (height - 1 - row) as i32;
            for (column, glyph) in line.chars().enumerate() {
                if glyph == Self::EMPTY_GLYPH {
                    continue;
                }
                let kind = glyphs
                    .iter()
                    .find(|(g, _)| *g == glyph)
                    .map(|(_, k)| *k)
                    .ok_or(TileError::UnknownGlyph { glyph, row, column })?;
                map.set_tile(IVec2::new(column as i32, y), Some(kind));
            }
        }

        Ok(map)
    }

    /// Add a tile definition to the palette.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::NegativeCost`] if the cost is below zero.
    pub fn add_kind(&mut self, def: TileDef) -> Result<TileKind, TileError> {
        if let Some(cost) = def.cost.filter(|c| *c < 0) {
            return Err(TileError::NegativeCost {
                name: def.name,
                cost,
            });
        }
        let kind = TileKind(self.palette.len() as u16);
        self.palette.push(def);
        Ok(kind)
    }

    /// Find a palette entry by name
    #[must_use]
    pub fn kind_by_name(&self, name: &str) -> Option<TileKind> {
        self.palette
            .iter()
            .position(|def| def.name == name)
            .map(|i| TileKind(i as u16))
    }

    /// Palette entry for a kind
    #[must_use]
    pub fn def(&self, kind: TileKind) -> Option<&TileDef> {
        self.palette.get(kind.0 as usize)
    }

    /// Place (or clear, with `None`) a tile. Out-of-bounds cells are ignored.
    pub fn set_tile(&mut self, cell: IVec2, kind: Option<TileKind>) {
        if let Some(i) = self.index(cell) {
            self.cells[i] = kind;
        }
    }

    /// Tile kind at a cell
    #[must_use]
    pub fn tile(&self, cell: IVec2) -> Option<TileKind> {
        self.index(cell).and_then(|i| self.cells[i])
    }

    /// Tile definition at a cell
    #[must_use]
    pub fn tile_def(&self, cell: IVec2) -> Option<&TileDef> {
        self.tile(cell).and_then(|kind| self.def(kind))
    }

    /// Check if a cell holds a tile
    #[must_use]
    pub fn has_tile(&self, cell: IVec2) -> bool {
        self.tile(cell).is_some()
    }

    /// Movement cost of entering a cell.
    ///
    /// Cells without a tile, and tiles without a cost, are blocked.
    #[must_use]
    pub fn get_cost(&self, cell: IVec2) -> TileCost {
        match self.tile_def(cell).and_then(|def| def.cost) {
            Some(cost) => TileCost::Cost(cost),
            None => TileCost::Blocked,
        }
    }

    /// Check if agents on foot may stand on a cell
    #[must_use]
    pub fn is_walkable(&self, cell: IVec2) -> bool {
        self.tile_def(cell).is_some_and(|def| def.walkable)
    }

    /// Check if a cell is water
    #[must_use]
    pub fn is_water(&self, cell: IVec2) -> bool {
        self.tile_def(cell).is_some_and(|def| def.water)
    }

    /// Check if a cell lies inside the map rectangle
    #[must_use]
    pub fn in_bounds(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    /// Map width in cells
    #[must_use]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Map height in cells
    #[must_use]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Every cell in the rectangle, row by row from the bottom-left.
    pub fn cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| IVec2::new(x, y)))
    }

    fn index(&self, cell: IVec2) -> Option<usize> {
        self.in_bounds(cell)
            .then(|| (cell.y * self.width + cell.x) as usize)
    }
}

impl Graph for TileMap {
    type Node = IVec2;

    fn all_nodes(&self) -> Vec<IVec2> {
        self.cells().filter(|c| self.has_tile(*c)).collect()
    }

    fn neighbors(&self, node: &IVec2) -> Neighbors<IVec2> {
        GRAPH_DIRS
            .iter()
            .map(|d| *node + *d)
            .filter_map(|next| self.get_cost(next).value().map(|w| Edge::new(next, w)))
            .collect()
    }
}

impl Walkable<IVec2> for TileMap {
    fn is_walkable(&self, node: IVec2) -> bool {
        TileMap::is_walkable(self, node)
    }
}

// ============================================================================
// Tests
// ============================================================================
