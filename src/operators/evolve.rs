use ndarray::Array2;
use thiserror::Error;

use crate::genetic::Population;
use crate::operators::{CrossoverOperator, MutationOperator, SelectionOperator};
use crate::random::RandomGenerator;

#[derive(Debug, Error)]
pub enum EvolveError {
    #[error("no offspring were generated in the mating process")]
    EmptyMatingResult,
}

/// Wires selection, crossover and mutation into the per-generation offspring
/// builder (§4.5 step 1). Each stage clamps to `[xl, xu]` internally, so I2
/// holds on the result regardless of operator rounding.
#[derive(Debug, Clone)]
pub struct Evolve<Sel, Cross, Mut>
where
    Sel: SelectionOperator,
    Cross: CrossoverOperator,
    Mut: MutationOperator,
{
    pub selection: Sel,
    pub crossover: Cross,
    pub mutation: Mut,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
}

impl<Sel, Cross, Mut> Evolve<Sel, Cross, Mut>
where
    Sel: SelectionOperator,
    Cross: CrossoverOperator,
    Mut: MutationOperator,
{
    pub fn new(
        selection: Sel,
        crossover: Cross,
        mutation: Mut,
        crossover_rate: f64,
        mutation_rate: f64,
    ) -> Self {
        Self {
            selection,
            crossover,
            mutation,
            crossover_rate,
            mutation_rate,
        }
    }

    /// Builds exactly `num_offsprings` children's genes (rounding up to an
    /// even count internally, then truncating).
    pub fn evolve(
        &self,
        population: &Population,
        num_offsprings: usize,
        rng: &mut impl RandomGenerator,
    ) -> Result<Array2<f64>, EvolveError> {
        let n_crossovers = num_offsprings.div_ceil(2);
        let (parents_a, parents_b) = self.selection.operate(population, n_crossovers, rng);

        let mut offspring = self.crossover.operate(
            &parents_a.genes,
            &parents_b.genes,
            self.crossover_rate,
            rng,
        );
        self.mutation
            .operate(&mut offspring, self.mutation_rate, rng);

        if offspring.nrows() == 0 {
            return Err(EvolveError::EmptyMatingResult);
        }
        if offspring.nrows() > num_offsprings {
            offspring = offspring
                .slice(ndarray::s![0..num_offsprings, ..])
                .to_owned();
        }
        Ok(offspring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetic::NUM_GENES;
    use crate::operators::crossover::SBXCrossover;
    use crate::operators::mutation::PolynomialMutation;
    use crate::operators::selection::TournamentSelection;
    use crate::random::MOORandomGenerator;
    use ndarray::{Array1, Array2};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Arc;

    #[test]
    fn evolve_produces_requested_offspring_count() {
        let ranges = Arc::new(vec![(0.0, 1.0); NUM_GENES]);
        let n = 10;
        let genes = Array2::from_shape_fn((n, NUM_GENES), |(i, j)| (i + j) as f64 / 100.0);
        let fitness = Array2::from_shape_fn((n, 3), |(i, _)| i as f64);
        let mut population = Population::new(genes, fitness, Array1::zeros(n));
        population.set_rank(Array1::from_iter(0..n));
        population.set_crowding(Array1::from_elem(n, 1.0));

        let evolve = Evolve::new(
            TournamentSelection,
            SBXCrossover::new(20.0, ranges.clone()),
            PolynomialMutation::new(1.0 / NUM_GENES as f64, 20.0, ranges),
            0.9,
            0.2,
        );
        let mut rng = MOORandomGenerator::new(StdRng::seed_from_u64(123));
        let offspring = evolve.evolve(&population, n, &mut rng).unwrap();
        assert_eq!(offspring.nrows(), n);
        assert_eq!(offspring.ncols(), NUM_GENES);
    }
}
