use core::time::Duration;
use serde::{Deserialize, Serialize};

use crate::*;

/// Player-visible state of a single cell.
///
/// `Hidden <-> Flagged` toggles freely, `Hidden -> Revealed` is one-way. A flagged cell has to be unflagged before it
/// can be revealed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Hidden,
    Flagged,
    Revealed,
}

/// One square of the board. Owned by [`Grid`], handed out by reference or by copy.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub x: Coord,
    pub y: Coord,
    pub is_mine: bool,
    pub is_revealed: bool,
    pub is_flagged: bool,
    /// Adjacent mine count, fixed at generation. Always 0 on mines.
    pub number: u8,
    /// Time since board creation of the first reveal, for animations.
    pub revealed_at: Option<Duration>,
}

impl Cell {
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self {
            x,
            y,
            is_mine: false,
            is_revealed: false,
            is_flagged: false,
            number: 0,
            revealed_at: None,
        }
    }

    pub const fn coords(&self) -> Coord2 {
        (self.x, self.y)
    }

    pub const fn state(&self) -> CellState {
        if self.is_revealed {
            CellState::Revealed
        } else if self.is_flagged {
            CellState::Flagged
        } else {
            CellState::Hidden
        }
    }

    /// A revealed-able cell that opens its neighbours when revealed.
    pub const fn is_zero(&self) -> bool {
        !self.is_mine && self.number == 0
    }
}
