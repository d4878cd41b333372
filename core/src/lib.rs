//! Minesweeper-style grid engine plus a 2D camera for viewing large boards through a pannable, zoomable viewport.
//!
//! [`Grid`] owns the cells and implements mine placement, adjacency counting, cascading reveal, flagging and
//! chording. [`Camera`] is independent of the grid: it maps between world and screen space and culls the cell window
//! a renderer has to draw.

use serde::{Deserialize, Serialize};

pub use camera::*;
pub use cell::*;
pub use error::*;
pub use generator::*;
pub use grid::*;
pub use types::*;

mod camera;
mod cell;
mod error;
mod generator;
mod grid;
mod types;

/// Validated board shape, passed explicitly into board setup.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub width: Coord,
    pub height: Coord,
    pub mines: CellCount,
}

impl BoardConfig {
    pub(crate) const fn new_unchecked(width: Coord, height: Coord, mines: CellCount) -> Self {
        Self {
            width,
            height,
            mines,
        }
    }

    pub fn new(width: Coord, height: Coord, mines: CellCount) -> Result<Self> {
        let config = Self::new_unchecked(width, height, mines);
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants `new` enforces, for configs that came in through deserialization.
    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 || self.height <= 0 {
            return Err(GridError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let capacity = self.total_cells();
        if self.mines >= capacity {
            return Err(GridError::InvalidMineCount {
                mines: self.mines,
                capacity,
            });
        }

        Ok(())
    }

    pub const fn size(&self) -> Coord2 {
        (self.width, self.height)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.width, self.height)
    }

    pub const fn safe_cells(&self) -> CellCount {
        self.total_cells().saturating_sub(self.mines)
    }
}

impl From<Difficulty> for BoardConfig {
    fn from(difficulty: Difficulty) -> Self {
        difficulty.config()
    }
}

/// Classic board presets.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Beginner, Self::Intermediate, Self::Expert];

    pub const fn config(self) -> BoardConfig {
        match self {
            Self::Beginner => BoardConfig::new_unchecked(9, 9, 10),
            Self::Intermediate => BoardConfig::new_unchecked(16, 16, 40),
            Self::Expert => BoardConfig::new_unchecked(30, 16, 99),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Expert => "Expert",
        }
    }
}
