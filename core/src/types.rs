/// Single coordinate axis used for board width, height, and positions.
///
/// Signed so that pointer-derived probes left of or above the board can be passed through unchanged.
pub type Coord = i32;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u32;

/// Two-dimensional coordinates `(x, y)`.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

/// Boards are stored row-major, so `(x, y)` maps to `[y, x]`.
impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.1 as usize, self.0 as usize]
    }
}

pub const fn in_bounds((x, y): Coord2, (width, height): Coord2) -> bool {
    x >= 0 && y >= 0 && x < width && y < height
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = if a < 0 { 0 } else { a as CellCount };
    let b = if b < 0 { 0 } else { b as CellCount };
    a.saturating_mul(b)
}

const DISPLACEMENTS: [Coord2; 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Iterates the in-bounds Moore neighbourhood of a cell, clipped at the board edges.
#[derive(Clone, Debug)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Coord2,
    index: u8,
}

impl NeighborIter {
    pub fn new(center: Coord2, bounds: Coord2) -> Self {
        Self {
            center,
            bounds,
            index: 0,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&(dx, dy)) = DISPLACEMENTS.get(usize::from(self.index)) {
            self.index += 1;
            let next = (self.center.0 + dx, self.center.1 + dy);
            if in_bounds(next, self.bounds) {
                return Some(next);
            }
        }
        None
    }
}
