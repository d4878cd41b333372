use core::num::Saturating;
use core::time::Duration;
use ndarray::Array2;
use rand::Rng;
use web_time::Instant;

use crate::*;

/// A single board: cells, mine placement, and the reveal/flag/chord rules.
///
/// Runtime operations never fail. Off-grid coordinates and moves that do not apply come back as `None`, `false` or an
/// empty `Vec`, so input handlers can call them speculatively.
#[derive(Clone, Debug)]
pub struct Grid {
    config: BoardConfig,
    cells: Array2<Cell>,
    revealed: Saturating<CellCount>,
    flagged: Saturating<CellCount>,
    created_at: Instant,
}

impl Grid {
    /// Generates a fresh random board.
    pub fn new(width: Coord, height: Coord, mine_count: CellCount) -> Result<Self> {
        let config = BoardConfig::new(width, height, mine_count)?;
        Self::with_seed(config, rand::rng().random())
    }

    pub fn with_seed(config: BoardConfig, seed: u64) -> Result<Self> {
        Self::with_generator(config, RandomLayoutGenerator::new(seed))
    }

    pub fn with_generator(config: BoardConfig, generator: impl LayoutGenerator) -> Result<Self> {
        config.validate()?;
        let layout = generator.generate(config);
        Self::from_layout(&layout)
    }

    /// Builds a board with mines exactly where `layout` has them.
    pub fn from_layout(layout: &MineLayout) -> Result<Self> {
        let config = layout.board_config()?;
        log::debug!(
            "Generating {}x{} board with {} mines",
            config.width,
            config.height,
            config.mines
        );

        let mut grid = Self {
            config,
            cells: Array2::from_shape_fn(config.size().to_nd_index(), |(y, x)| {
                Cell::new(x as Coord, y as Coord)
            }),
            revealed: Saturating(0),
            flagged: Saturating(0),
            created_at: Instant::now(),
        };
        grid.place_mines(layout);
        grid.calculate_numbers(layout);
        Ok(grid)
    }

    fn place_mines(&mut self, layout: &MineLayout) {
        for cell in self.cells.iter_mut() {
            cell.is_mine = layout[cell.coords()];
        }
    }

    fn calculate_numbers(&mut self, layout: &MineLayout) {
        for cell in self.cells.iter_mut().filter(|cell| !cell.is_mine) {
            cell.number = layout.adjacent_mine_count(cell.coords());
        }
    }

    pub fn config(&self) -> BoardConfig {
        self.config
    }

    pub fn width(&self) -> Coord {
        self.config.width
    }

    pub fn height(&self) -> Coord {
        self.config.height
    }

    pub fn size(&self) -> Coord2 {
        self.config.size()
    }

    pub fn mine_count(&self) -> CellCount {
        self.config.mines
    }

    /// Number of cells currently revealed.
    pub fn revealed(&self) -> CellCount {
        self.revealed.0
    }

    /// Number of cells currently flagged.
    pub fn flagged(&self) -> CellCount {
        self.flagged.0
    }

    /// Mines minus flags, for the counter display. Goes negative when over-flagged.
    pub fn mines_left(&self) -> i64 {
        i64::from(self.config.mines) - i64::from(self.flagged.0)
    }

    /// Read-only cell storage, indexed `[y, x]`.
    pub fn cells(&self) -> &Array2<Cell> {
        &self.cells
    }

    /// All cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn neighbors(&self, x: Coord, y: Coord) -> NeighborIter {
        NeighborIter::new((x, y), self.size())
    }

    pub fn get_cell(&self, x: Coord, y: Coord) -> Option<&Cell> {
        in_bounds((x, y), self.size()).then(|| &self.cells[(x, y).to_nd_index()])
    }

    /// Reveals a hidden, unflagged cell and cascades through any connected zero region.
    ///
    /// Returns the cell at `(x, y)`, or `None` when nothing happened. Revealing a mine is not an error here, the caller
    /// checks `is_mine` on the returned cell.
    pub fn reveal_cell(&mut self, x: Coord, y: Coord) -> Option<&Cell> {
        let now = self.created_at.elapsed();
        let mut opened = Vec::new();
        if self.reveal_from((x, y), now, &mut opened) {
            self.get_cell(x, y)
        } else {
            None
        }
    }

    pub fn toggle_flag(&mut self, x: Coord, y: Coord) -> bool {
        if !in_bounds((x, y), self.size()) {
            return false;
        }

        let cell = &mut self.cells[(x, y).to_nd_index()];
        if cell.is_revealed {
            return false;
        }

        cell.is_flagged = !cell.is_flagged;
        if cell.is_flagged {
            self.flagged += 1;
        } else {
            self.flagged -= 1;
        }
        true
    }

    /// Reveals every hidden, unflagged neighbour of a revealed number once exactly that many neighbours are flagged.
    ///
    /// Returns copies of all cells this call revealed, cascades included.
    pub fn chord(&mut self, x: Coord, y: Coord) -> Vec<Cell> {
        let Some(&cell) = self.get_cell(x, y) else {
            return Vec::new();
        };
        if !cell.is_revealed || cell.number == 0 {
            return Vec::new();
        }

        let flags = self.count_flagged_neighbors((x, y));
        if flags != cell.number {
            return Vec::new();
        }

        let now = self.created_at.elapsed();
        let mut opened = Vec::new();
        for neighbor in self.neighbors(x, y) {
            self.reveal_from(neighbor, now, &mut opened);
        }
        log::trace!("Chord at ({x}, {y}) revealed {} cells", opened.len());

        opened
            .into_iter()
            .map(|coords| self.cells[coords.to_nd_index()])
            .collect()
    }

    /// Won when every safe cell is revealed. Flags do not matter.
    pub fn is_complete(&self) -> bool {
        self.revealed.0 == self.config.safe_cells()
    }

    /// Discloses every mine for the end-of-game board.
    ///
    /// The revealed counter is not updated, only call this once the game is already decided.
    pub fn reveal_all_mines(&mut self) {
        let now = self.created_at.elapsed();
        let mut disclosed = 0;
        for cell in self.cells.iter_mut().filter(|cell| cell.is_mine) {
            if !cell.is_revealed {
                cell.is_revealed = true;
                cell.revealed_at = Some(now);
                disclosed += 1;
            }
        }
        log::debug!("Disclosed {disclosed} mines");
    }

    /// Worklist flood fill from `start`. Pushes every newly revealed coordinate to `opened`, returns whether `start`
    /// itself was revealed.
    fn reveal_from(&mut self, start: Coord2, now: Duration, opened: &mut Vec<Coord2>) -> bool {
        if !self.open_single(start, now) {
            return false;
        }

        let first = opened.len();
        opened.push(start);

        let mut pending = Vec::new();
        if self.cells[start.to_nd_index()].is_zero() {
            pending.push(start);
        }

        while let Some((x, y)) = pending.pop() {
            for neighbor in self.neighbors(x, y) {
                if self.open_single(neighbor, now) {
                    opened.push(neighbor);
                    if self.cells[neighbor.to_nd_index()].is_zero() {
                        pending.push(neighbor);
                    }
                }
            }
        }

        if opened.len() - first > 1 {
            log::trace!(
                "Cascade from {:?} revealed {} cells",
                start,
                opened.len() - first
            );
        }
        true
    }

    fn open_single(&mut self, coords: Coord2, now: Duration) -> bool {
        if !in_bounds(coords, self.size()) {
            return false;
        }

        let cell = &mut self.cells[coords.to_nd_index()];
        if cell.is_revealed || cell.is_flagged {
            return false;
        }

        cell.is_revealed = true;
        cell.revealed_at = Some(now);
        self.revealed += 1;
        true
    }

    fn count_flagged_neighbors(&self, coords: Coord2) -> u8 {
        self.neighbors(coords.0, coords.1)
            .filter(|&pos| self.cells[pos.to_nd_index()].is_flagged)
            .count() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(size: Coord2, mines: &[Coord2]) -> Grid {
        Grid::from_layout(&MineLayout::from_mine_coords(size, mines).unwrap()).unwrap()
    }

    fn revealed_cells(grid: &Grid) -> CellCount {
        grid.iter().filter(|cell| cell.is_revealed).count() as CellCount
    }

    fn flagged_cells(grid: &Grid) -> CellCount {
        grid.iter().filter(|cell| cell.is_flagged).count() as CellCount
    }

    #[test]
    fn new_rejects_bad_dimensions() {
        assert!(matches!(
            Grid::new(0, 3, 0),
            Err(GridError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Grid::new(3, -1, 0),
            Err(GridError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn new_rejects_bad_mine_count() {
        assert_eq!(
            Grid::new(2, 2, 4).unwrap_err(),
            GridError::InvalidMineCount {
                mines: 4,
                capacity: 4
            }
        );
    }

    #[test]
    fn generated_boards_have_exact_mines_and_numbers() {
        for seed in 0..10 {
            let config = BoardConfig::new(12, 7, 20).unwrap();
            let grid = Grid::with_seed(config, seed).unwrap();

            assert_eq!(grid.iter().filter(|cell| cell.is_mine).count(), 20);
            for cell in grid.iter() {
                if cell.is_mine {
                    assert_eq!(cell.number, 0);
                    continue;
                }
                let expected = grid
                    .neighbors(cell.x, cell.y)
                    .filter(|&(x, y)| grid.get_cell(x, y).unwrap().is_mine)
                    .count() as u8;
                assert_eq!(cell.number, expected, "cell {:?}", cell.coords());
            }
        }
    }

    #[test]
    fn rejection_generator_builds_valid_board() {
        let config = Difficulty::Beginner.config();
        let grid = Grid::with_generator(config, RejectionLayoutGenerator::new(3)).unwrap();
        assert_eq!(grid.iter().filter(|cell| cell.is_mine).count(), 10);
    }

    #[test]
    fn cells_are_row_major_with_matching_coords() {
        let grid = grid((3, 2), &[]);
        let coords: Vec<_> = grid.iter().map(Cell::coords).collect();
        assert_eq!(coords, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
        assert_eq!(grid.cells().dim(), (2, 3));
    }

    #[test]
    fn get_cell_out_of_bounds_is_none() {
        let grid = grid((3, 3), &[]);
        assert!(grid.get_cell(-1, 0).is_none());
        assert!(grid.get_cell(0, 3).is_none());
        assert_eq!(grid.get_cell(2, 1).map(Cell::coords), Some((2, 1)));
    }

    #[test]
    fn single_cell_board_completes_on_reveal() {
        let mut grid = Grid::new(1, 1, 0).unwrap();
        assert_eq!(grid.get_cell(0, 0).unwrap().number, 0);

        let cell = grid.reveal_cell(0, 0).unwrap();
        assert!(cell.is_revealed);
        assert!(cell.revealed_at.is_some());
        assert!(grid.is_complete());
    }

    #[test]
    fn zero_board_cascades_everywhere() {
        let mut grid = grid((3, 3), &[]);

        assert!(grid.reveal_cell(0, 0).is_some());

        assert_eq!(grid.revealed(), 9);
        assert_eq!(revealed_cells(&grid), 9);
        assert!(grid.is_complete());
    }

    #[test]
    fn cascade_stops_at_numbered_border() {
        let mut grid = grid((4, 4), &[(3, 3)]);

        grid.reveal_cell(0, 0);

        assert_eq!(grid.revealed(), 15);
        assert!(grid.get_cell(2, 2).unwrap().is_revealed);
        assert_eq!(grid.get_cell(2, 2).unwrap().number, 1);
        assert!(!grid.get_cell(3, 3).unwrap().is_revealed);
        assert!(grid.is_complete());
    }

    #[test]
    fn cascade_skips_flagged_cells() {
        let mut grid = grid((3, 3), &[]);
        assert!(grid.toggle_flag(2, 2));

        grid.reveal_cell(0, 0);

        assert_eq!(grid.revealed(), 8);
        assert!(!grid.get_cell(2, 2).unwrap().is_revealed);
        assert!(!grid.is_complete());
    }

    #[test]
    fn large_zero_region_does_not_recurse() {
        let mut grid = grid((600, 600), &[]);

        grid.reveal_cell(300, 300);

        assert_eq!(grid.revealed(), 600 * 600);
        assert!(grid.is_complete());
    }

    #[test]
    fn reveal_is_noop_on_revealed_or_invalid() {
        let mut grid = grid((3, 1), &[(2, 0)]);

        assert!(grid.reveal_cell(0, 0).is_some());
        assert!(grid.reveal_cell(0, 0).is_none());
        assert!(grid.reveal_cell(5, 0).is_none());
        assert!(grid.reveal_cell(-1, -1).is_none());
        // (0, 0) is a zero and opened (1, 0) too
        assert_eq!(grid.revealed(), 2);
    }

    #[test]
    fn revealing_a_mine_returns_it() {
        let mut grid = grid((2, 2), &[(1, 1)]);

        let cell = *grid.reveal_cell(1, 1).unwrap();

        assert!(cell.is_mine);
        assert!(cell.is_revealed);
        assert_eq!(grid.revealed(), 1);
    }

    #[test]
    fn flag_blocks_reveal_until_unflagged() {
        let mut grid = grid((3, 3), &[(0, 0)]);

        assert!(grid.toggle_flag(2, 2));
        assert_eq!(grid.get_cell(2, 2).unwrap().state(), CellState::Flagged);
        assert!(grid.reveal_cell(2, 2).is_none());
        assert_eq!(grid.revealed(), 0);

        assert!(grid.toggle_flag(2, 2));
        assert!(grid.reveal_cell(2, 2).is_some());
    }

    #[test]
    fn toggle_flag_is_self_inverse() {
        let mut grid = grid((3, 3), &[(1, 1)]);

        assert!(grid.toggle_flag(0, 1));
        assert_eq!(grid.flagged(), 1);
        assert_eq!(grid.mines_left(), 0);
        assert!(grid.toggle_flag(0, 1));

        assert_eq!(grid.flagged(), 0);
        assert!(!grid.get_cell(0, 1).unwrap().is_flagged);
    }

    #[test]
    fn toggle_flag_noop_on_revealed_or_invalid() {
        let mut grid = grid((3, 3), &[(1, 1)]);
        grid.reveal_cell(0, 0);

        assert!(!grid.toggle_flag(0, 0));
        assert!(!grid.toggle_flag(3, 0));
        assert_eq!(grid.flagged(), 0);
    }

    #[test]
    fn chord_reveals_remaining_neighbors() {
        // (1, 1) sees the mines at (0, 0) and (0, 1)
        let mut grid = grid((3, 3), &[(0, 0), (0, 1)]);
        grid.reveal_cell(1, 1);
        assert_eq!(grid.get_cell(1, 1).unwrap().number, 2);
        grid.toggle_flag(0, 0);
        grid.toggle_flag(0, 1);
        // already revealed before the chord
        grid.reveal_cell(1, 0);
        let flagged_before = grid.flagged();

        let opened = grid.chord(1, 1);

        let mut coords: Vec<_> = opened.iter().map(Cell::coords).collect();
        coords.sort();
        assert_eq!(coords, vec![(0, 2), (1, 2), (2, 0), (2, 1), (2, 2)]);
        assert!(opened.iter().all(|cell| cell.is_revealed));
        assert_eq!(grid.flagged(), flagged_before);
        assert!(grid.is_complete());
    }

    #[test]
    fn chord_requires_exact_flag_count() {
        let mut grid = grid((3, 3), &[(0, 0), (0, 1)]);
        grid.reveal_cell(1, 1);

        grid.toggle_flag(0, 0);
        assert!(grid.chord(1, 1).is_empty());

        grid.toggle_flag(0, 1);
        grid.toggle_flag(2, 2);
        assert!(grid.chord(1, 1).is_empty());
        assert_eq!(grid.revealed(), 1);
    }

    #[test]
    fn chord_never_reveals_flags_even_if_wrong() {
        // wrong flag on (2, 2), chord opens the real mine at (0, 0)
        let mut grid = grid((3, 3), &[(0, 0)]);
        grid.reveal_cell(1, 1);
        grid.toggle_flag(2, 2);

        let opened = grid.chord(1, 1);

        assert_eq!(opened.len(), 7);
        assert!(opened.iter().any(|cell| cell.is_mine));
        assert!(!grid.get_cell(2, 2).unwrap().is_revealed);
    }

    #[test]
    fn chord_cascades_through_zero_neighbors() {
        let mut grid = grid((5, 1), &[(0, 0)]);
        grid.reveal_cell(1, 0);
        grid.toggle_flag(0, 0);

        let opened = grid.chord(1, 0);

        assert_eq!(opened.len(), 3);
        assert!(grid.is_complete());
    }

    #[test]
    fn chord_noop_on_hidden_zero_or_invalid() {
        let mut grid = grid((3, 3), &[(2, 2)]);
        assert!(grid.chord(0, 0).is_empty());
        assert!(grid.chord(9, 9).is_empty());

        grid.reveal_cell(0, 0);
        assert_eq!(grid.get_cell(0, 0).unwrap().number, 0);
        assert!(grid.chord(0, 0).is_empty());
    }

    #[test]
    fn completion_ignores_flags() {
        let mut grid = grid((2, 1), &[(0, 0)]);
        assert!(!grid.is_complete());

        grid.reveal_cell(1, 0);

        assert!(grid.is_complete());
        assert_eq!(grid.flagged(), 0);
    }

    #[test]
    fn reveal_all_mines_leaves_counter() {
        let mut grid = grid((3, 3), &[(0, 0), (2, 2)]);
        grid.toggle_flag(0, 0);
        grid.reveal_cell(1, 0);

        grid.reveal_all_mines();

        assert!(grid.get_cell(0, 0).unwrap().is_revealed);
        assert!(grid.get_cell(2, 2).unwrap().is_revealed);
        assert_eq!(grid.revealed(), 1);
        assert_eq!(revealed_cells(&grid), 3);
    }

    #[test]
    fn counters_track_cells_through_random_play() {
        let config = BoardConfig::new(16, 16, 40).unwrap();
        let mut grid = Grid::with_seed(config, 99).unwrap();
        let total = config.total_cells();

        let mut state: u32 = 12345;
        for _ in 0..400 {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
            let x = ((state >> 8) % 16) as Coord;
            let y = ((state >> 16) % 16) as Coord;
            match state % 3 {
                0 => {
                    let safe = !grid.get_cell(x, y).unwrap().is_mine;
                    if safe {
                        grid.reveal_cell(x, y);
                    }
                }
                1 => {
                    grid.toggle_flag(x, y);
                }
                _ => {
                    let opened = grid.chord(x, y);
                    if opened.iter().any(|cell| cell.is_mine) {
                        break;
                    }
                }
            }
            assert_eq!(grid.revealed(), revealed_cells(&grid));
            assert_eq!(grid.flagged(), flagged_cells(&grid));
            assert!(grid.revealed() <= total);
        }
    }
}
