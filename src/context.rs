use log::info;

use crate::codec::{label_components, Config};
use crate::error::SolverError;
use crate::fieldset::FieldSet;
use crate::indexer::Indexer;
use crate::playfield::{Level, NO_FIELD};

/// Everything a search needs to know about a level, built once and shared by reference
/// between the codec, the search structures and all worker threads.
#[derive(Debug)]
pub struct SearchContext {
    level: Level,
    indexer: Indexer,
    box_configs: u64,
    solution_rank: u64,
    component_bound: u64,
    num_configs: u64,
}

fn log2(num: u64) -> u32 {
    u64::BITS - num.leading_zeros()
}

impl SearchContext {
    pub fn new(level: Level) -> Result<Self, SolverError> {
        info!(
            "#Boxes: {}, #Pos: {}, #Fields: {}",
            level.n_box(),
            level.n_pos(),
            level.n_fields()
        );

        let indexer = Indexer::new(level.n_pos(), level.n_box())?;
        let box_configs = indexer.num_subsets();
        let solution_rank = indexer.rank(level.goals());

        // Every box splits at most one component into four.
        let mut labels = Vec::new();
        let empty = FieldSet::with_fields(level.n_fields());
        let base_components = label_components(&level, &empty, &mut labels, NO_FIELD) as u64;
        let component_bound = (level.n_box() as u64)
            .checked_mul(3)
            .and_then(|c| c.checked_add(base_components))
            .ok_or(SolverError::ArithmeticOverflow("number of player components"))?;
        let num_configs = component_bound
            .checked_mul(box_configs)
            .ok_or(SolverError::ArithmeticOverflow("number of configurations"))?;

        info!(
            "#Configs: {} (2^{}) #BoxConfigs: {} (2^{})",
            num_configs,
            log2(num_configs),
            box_configs,
            log2(box_configs)
        );

        Ok(SearchContext { level, indexer, box_configs, solution_rank, component_bound, num_configs })
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn indexer(&self) -> &Indexer {
        &self.indexer
    }

    pub fn n_boxes(&self) -> usize {
        self.level.n_box()
    }

    /// Number of box placements, `C(n_pos, n_box)`.
    pub fn box_configs(&self) -> u64 {
        self.box_configs
    }

    /// Upper bound on player component ids.
    pub fn component_bound(&self) -> u64 {
        self.component_bound
    }

    /// Exclusive upper bound of all configuration numbers.
    pub fn num_configs(&self) -> u64 {
        self.num_configs
    }

    /// All boxes on goals; the player's component does not matter.
    #[inline]
    pub fn is_solution(&self, number: u64) -> bool {
        number % self.box_configs == self.solution_rank
    }

    pub fn initial_config(&self) -> Config<'_> {
        Config::initial(self)
    }

    pub fn config(&self, number: u64) -> Config<'_> {
        Config::from_number(self, number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_space_size() {
        let level = Level::parse("#####\n#m o:#\n#   #\n#####").unwrap();
        let ctx = SearchContext::new(level).unwrap();
        // 7 box positions, one box, one connected board.
        assert_eq!(ctx.box_configs(), 7);
        assert_eq!(ctx.component_bound(), 4);
        assert_eq!(ctx.num_configs(), 28);
        assert!(ctx.is_solution(0));
        assert!(ctx.is_solution(7 * 3));
        assert!(!ctx.is_solution(1));
    }

    #[test]
    fn separate_rooms_raise_component_bound() {
        let level = Level::parse("#####\n#mO##\n#####\n#  ##\n#####").unwrap();
        let ctx = SearchContext::new(level).unwrap();
        assert_eq!(ctx.component_bound(), 2 + 3);
    }

    #[test]
    fn log2_counts_bits() {
        assert_eq!(log2(0), 0);
        assert_eq!(log2(1), 1);
        assert_eq!(log2(28), 5);
    }
}
