use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;
pub use random::*;

mod random;

/// Strategy for choosing which cells hold mines.
pub trait LayoutGenerator {
    fn generate(self, config: BoardConfig) -> MineLayout;
}

/// Mine positions for a board, before any adjacency numbers are derived.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "SerializedMineLayout")]
pub struct MineLayout {
    mine_mask: Array2<bool>,
    mine_count: CellCount,
}

/// Wire form of [`MineLayout`]. The stored count is only a hint, it is recounted from the mask.
#[derive(Deserialize)]
struct SerializedMineLayout {
    mine_mask: Array2<bool>,
    #[serde(default)]
    mine_count: Option<CellCount>,
}

impl From<SerializedMineLayout> for MineLayout {
    fn from(serialized: SerializedMineLayout) -> Self {
        let layout = Self::from_mine_mask(serialized.mine_mask);
        if let Some(stored) = serialized.mine_count.filter(|&stored| stored != layout.mine_count) {
            log::warn!(
                "Layout mine count {} does not match its mask, using {}",
                stored,
                layout.mine_count
            );
        }
        layout
    }
}

impl MineLayout {
    /// Builds a layout from a row-major mask, indexed `[y, x]`.
    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Self {
        let mine_count = mine_mask.iter().filter(|&&is_mine| is_mine).count() as CellCount;
        Self {
            mine_mask,
            mine_count,
        }
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let (width, height) = size;
        if width <= 0 || height <= 0 {
            return Err(GridError::InvalidDimensions { width, height });
        }

        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());
        for &coords in mine_coords {
            if !in_bounds(coords, size) {
                return Err(GridError::InvalidCoords {
                    x: coords.0,
                    y: coords.1,
                });
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        Ok(Self::from_mine_mask(mine_mask))
    }

    pub fn size(&self) -> Coord2 {
        let (rows, cols) = self.mine_mask.dim();
        (cols as Coord, rows as Coord)
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        in_bounds(coords, self.size()) && self[coords]
    }

    /// Shape and count of this layout as a board config, validated.
    pub fn board_config(&self) -> Result<BoardConfig> {
        let (width, height) = self.size();
        BoardConfig::new(width, height, self.mine_count)
    }

    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        NeighborIter::new(coords, self.size())
            .filter(|&pos| self[pos])
            .count() as u8
    }
}

impl Index<Coord2> for MineLayout {
    type Output = bool;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.mine_mask[coords.to_nd_index()]
    }
}
