use rand::prelude::*;

use super::*;

/// Uniform placement by partial Fisher-Yates shuffle of the flattened cell indices. Linear in the board size no matter
/// how close the mine count gets to the cell count.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomLayoutGenerator {
    seed: u64,
}

impl RandomLayoutGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl LayoutGenerator for RandomLayoutGenerator {
    fn generate(self, config: BoardConfig) -> MineLayout {
        let (width, _) = config.size();
        let width = width as usize;
        let mut rng = SmallRng::seed_from_u64(self.seed);

        let mut indices: Vec<usize> = (0..config.total_cells() as usize).collect();
        let (chosen, _) = indices.partial_shuffle(&mut rng, config.mines as usize);

        let mut mine_mask: Array2<bool> = Array2::default(config.size().to_nd_index());
        for &index in chosen.iter() {
            mine_mask[[index / width, index % width]] = true;
        }

        checked_layout(mine_mask, config)
    }
}

/// Draws random coordinates until enough distinct ones have been hit. Expected iterations blow up as the mine count
/// approaches the cell count, prefer [`RandomLayoutGenerator`] for dense boards.
#[derive(Clone, Debug, PartialEq)]
pub struct RejectionLayoutGenerator {
    seed: u64,
}

impl RejectionLayoutGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl LayoutGenerator for RejectionLayoutGenerator {
    fn generate(self, config: BoardConfig) -> MineLayout {
        let (width, height) = config.size();
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut mine_mask: Array2<bool> = Array2::default(config.size().to_nd_index());

        // more mines than cells would never terminate
        let mines = config.mines.min(config.total_cells());
        let mut mines_placed = 0;
        while mines_placed < mines {
            let coords = (rng.random_range(0..width), rng.random_range(0..height));
            let tile = &mut mine_mask[coords.to_nd_index()];
            if !*tile {
                *tile = true;
                mines_placed += 1;
            }
        }

        checked_layout(mine_mask, config)
    }
}

fn checked_layout(mine_mask: Array2<bool>, config: BoardConfig) -> MineLayout {
    let layout = MineLayout::from_mine_mask(mine_mask);
    if layout.mine_count() != config.mines {
        log::warn!(
            "Generated layout count mismatch, actual: {}, requested: {}",
            layout.mine_count(),
            config.mines
        );
    }
    layout
}
