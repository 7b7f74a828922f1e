use crate::genetic::Individual;
use crate::operators::{DuelResult, SelectionOperator};
use crate::random::RandomGenerator;

/// Binary tournament comparing first by rank (lower wins), then by
/// crowding distance (higher wins) — §4.4.
#[derive(Debug, Clone, Copy, Default)]
pub struct TournamentSelection;

impl SelectionOperator for TournamentSelection {
    fn tournament_duel(
        &self,
        p1: &Individual<'_>,
        p2: &Individual<'_>,
        _rng: &mut impl RandomGenerator,
    ) -> DuelResult {
        match (p1.is_feasible(), p2.is_feasible()) {
            (true, false) => return DuelResult::LeftWins,
            (false, true) => return DuelResult::RightWins,
            _ => {}
        }

        match p1.rank.cmp(&p2.rank) {
            std::cmp::Ordering::Less => return DuelResult::LeftWins,
            std::cmp::Ordering::Greater => return DuelResult::RightWins,
            std::cmp::Ordering::Equal => {}
        }

        match p1.crowding.partial_cmp(&p2.crowding) {
            Some(std::cmp::Ordering::Greater) => DuelResult::LeftWins,
            Some(std::cmp::Ordering::Less) => DuelResult::RightWins,
            _ => DuelResult::Tie,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetic::Population;
    use crate::random::{MOORandomGenerator, RandomGenerator};
    use ndarray::{Array1, array};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1, 10.0, 5.0, DuelResult::LeftWins)]
    #[case(1, 0, 5.0, 10.0, DuelResult::RightWins)]
    #[case(0, 0, 10.0, 5.0, DuelResult::LeftWins)]
    #[case(0, 0, 5.0, 10.0, DuelResult::RightWins)]
    #[case(0, 0, 7.0, 7.0, DuelResult::Tie)]
    fn duel_rank_then_crowding(
        #[case] rank_a: usize,
        #[case] rank_b: usize,
        #[case] crowding_a: f64,
        #[case] crowding_b: f64,
        #[case] expected: DuelResult,
    ) {
        let genes = Array1::zeros(48);
        let fitness = array![0.5, 0.5, 0.5];
        let mut p1 = Individual::new(genes.view(), fitness.view(), 0.0);
        p1.rank = Some(rank_a);
        p1.crowding = Some(crowding_a);
        let mut p2 = Individual::new(genes.view(), fitness.view(), 0.0);
        p2.rank = Some(rank_b);
        p2.crowding = Some(crowding_b);

        let selector = TournamentSelection;
        let mut rng = MOORandomGenerator::new(StdRng::seed_from_u64(1));
        assert_eq!(selector.tournament_duel(&p1, &p2, &mut rng), expected);
    }

    #[test]
    fn operate_splits_winners_into_two_equal_halves() {
        let n = 8;
        let genes = ndarray::Array2::zeros((n, 48));
        let fitness = ndarray::Array2::from_shape_fn((n, 3), |(i, _)| i as f64);
        let mut population = Population::new(genes, fitness, Array1::zeros(n));
        population.set_rank(Array1::from_iter((0..n).map(|i| i % 2)));
        population.set_crowding(Array1::from_elem(n, 1.0));

        let selector = TournamentSelection;
        let mut rng = MOORandomGenerator::new(StdRng::seed_from_u64(99));
        let (a, b) = selector.operate(&population, 3, &mut rng);
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 3);
    }
}
