use thiserror::Error;

use crate::{CellCount, Coord};

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("Invalid board dimensions {width}x{height}, both sides must be positive")]
    InvalidDimensions { width: Coord, height: Coord },
    #[error("Invalid mine count {mines}, must be less than the {capacity} cells on the board")]
    InvalidMineCount { mines: CellCount, capacity: CellCount },
    #[error("Invalid coordinates ({x}, {y})")]
    InvalidCoords { x: Coord, y: Coord },
}

pub type Result<T> = core::result::Result<T, GridError>;
