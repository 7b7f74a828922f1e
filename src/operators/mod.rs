//! Genetic operator traits: sampling, crossover, mutation and selection all
//! follow the same shape as the rest of this crate — a single-individual
//! primitive method plus a default `operate` that lifts it to whole
//! populations, so a new operator only has to implement the primitive.

pub mod crossover;
pub mod evolve;
pub mod mutation;
pub mod sampling;
pub mod selection;

use ndarray::{Array1, Array2, ArrayViewMut1, Axis};

use crate::genetic::{Individual, Population};
use crate::random::RandomGenerator;

/// Produces one individual's genes from scratch (initialization).
pub trait SamplingOperator {
    fn sample_individual(&self, num_vars: usize, rng: &mut impl RandomGenerator) -> Array1<f64>;

    fn operate(
        &self,
        population_size: usize,
        num_vars: usize,
        rng: &mut impl RandomGenerator,
    ) -> Array2<f64> {
        let mut out = Array2::zeros((population_size, num_vars));
        for mut row in out.outer_iter_mut() {
            row.assign(&self.sample_individual(num_vars, rng));
        }
        out
    }
}

/// Produces two children from two parents.
pub trait CrossoverOperator {
    fn crossover(
        &self,
        parent_a: &Array1<f64>,
        parent_b: &Array1<f64>,
        rng: &mut impl RandomGenerator,
    ) -> (Array1<f64>, Array1<f64>);

    /// Applies crossover row-by-row with probability `crossover_rate`; below
    /// that probability both parents pass through unchanged. Returns a block
    /// with `2 * parents_a.nrows()` rows (two children per pair).
    fn operate(
        &self,
        parents_a: &Array2<f64>,
        parents_b: &Array2<f64>,
        crossover_rate: f64,
        rng: &mut impl RandomGenerator,
    ) -> Array2<f64> {
        let n = parents_a.nrows();
        let num_vars = parents_a.ncols();
        let mut out = Array2::zeros((2 * n, num_vars));
        for i in 0..n {
            let a = parents_a.row(i).to_owned();
            let b = parents_b.row(i).to_owned();
            let (c1, c2) = if rng.gen_probability() < crossover_rate {
                self.crossover(&a, &b, rng)
            } else {
                (a, b)
            };
            out.row_mut(2 * i).assign(&c1);
            out.row_mut(2 * i + 1).assign(&c2);
        }
        out
    }
}

/// Mutates one individual's genes in place.
pub trait MutationOperator {
    fn mutate<'a>(&self, individual: ArrayViewMut1<'a, f64>, rng: &mut impl RandomGenerator);

    /// Mutates each row with probability `mutation_rate` of being touched at
    /// all (the per-gene rate, if any, is the operator's own concern).
    fn operate(
        &self,
        population: &mut Array2<f64>,
        mutation_rate: f64,
        rng: &mut impl RandomGenerator,
    ) {
        for row in population.axis_iter_mut(Axis(0)) {
            if rng.gen_bool(mutation_rate) {
                self.mutate(row, rng);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuelResult {
    LeftWins,
    RightWins,
    Tie,
}

/// Binary tournament selection: feasibility beats rank beats crowding.
pub trait SelectionOperator {
    fn tournament_duel(
        &self,
        p1: &Individual<'_>,
        p2: &Individual<'_>,
        rng: &mut impl RandomGenerator,
    ) -> DuelResult;

    /// Runs `2 * n_crossovers` independent binary tournaments and splits the
    /// winners into two equal-sized populations of mating partners.
    fn operate(
        &self,
        population: &Population,
        n_crossovers: usize,
        rng: &mut impl RandomGenerator,
    ) -> (Population, Population) {
        let needed = 2 * n_crossovers;
        let len = population.len();
        let mut winners = Vec::with_capacity(needed);
        for _ in 0..needed {
            let i = rng.gen_range_usize(0, len);
            let mut j = rng.gen_range_usize(0, len);
            if len > 1 {
                while j == i {
                    j = rng.gen_range_usize(0, len);
                }
            }
            let p1 = population.get(i);
            let p2 = population.get(j);
            let winner = match self.tournament_duel(&p1, &p2, rng) {
                DuelResult::LeftWins => i,
                DuelResult::RightWins => j,
                DuelResult::Tie => {
                    if rng.gen_bool(0.5) {
                        i
                    } else {
                        j
                    }
                }
            };
            winners.push(winner);
        }
        let pop_a = population.selected(&winners[..n_crossovers]);
        let pop_b = population.selected(&winners[n_crossovers..]);
        (pop_a, pop_b)
    }
}
