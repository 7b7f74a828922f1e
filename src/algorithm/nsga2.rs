//! NSGA-II generational loop (§4.5): the MOEA Core shared by every run,
//! whether invoked directly or supplemented by the AdaVEA-MOO extension.

use std::time::Instant;

use std::sync::Arc;

use crate::algorithm::{GenerationRecord, RunControl, RunResult, indicators_for_front};
use crate::archive::Archive;
use crate::cache::EvaluationCache;
use crate::config::Config;
use crate::error::DvaError;
use crate::genetic::{NUM_GENES, Population};
use crate::operators::crossover::SBXCrossover;
use crate::operators::evolve::{Evolve, EvolveError};
use crate::operators::mutation::PolynomialMutation;
use crate::operators::sampling::UniformSampling;
use crate::operators::selection::TournamentSelection;
use crate::operators::SamplingOperator;
use crate::problem::{self, ProblemConfig};
use crate::random::{MOORandomGenerator, RandomGenerator};
use crate::sorting::environmental_selection;

/// Plain NSGA-II: population size, generation budget and operator rates are
/// fixed at construction from a [`Config`], matching this crate's one-shape
/// problem (48 genes, 3 objectives) rather than the teacher's generic,
/// builder-assembled engine.
#[derive(Debug, Clone)]
pub struct Nsga2 {
    pub population_size: usize,
    pub max_generations: usize,
    pub archive_max_size: usize,
    pub early_stop_hv_tolerance: Option<f64>,
    pub early_stop_window: usize,
    crossover: SBXCrossover,
    mutation: PolynomialMutation,
    sampling: UniformSampling,
    crossover_rate: f64,
    mutation_rate: f64,
    problem: ProblemConfig,
}

impl Nsga2 {
    pub fn new(config: &Config, problem: ProblemConfig) -> Self {
        let ranges = Arc::new(problem.bounds.as_pairs().to_vec());
        let crossover = SBXCrossover::new(config.nsga2.crossover_eta, ranges.clone());
        let mutation = PolynomialMutation::new(
            config.nsga2.resolved_mutation_prob(),
            config.nsga2.mutation_eta,
            ranges.clone(),
        );
        let sampling = UniformSampling::new(ranges);
        Self {
            population_size: config.population_size,
            max_generations: config.max_generations,
            archive_max_size: config.archive_max_size,
            early_stop_hv_tolerance: config.early_stop_hv_tolerance,
            early_stop_window: config.early_stop_window,
            crossover,
            mutation,
            sampling,
            crossover_rate: config.nsga2.crossover_prob,
            mutation_rate: config.nsga2.resolved_mutation_prob(),
            problem,
        }
    }

    /// Runs to completion or until `control` reports cancellation/timeout,
    /// in which case the current archive and partial per-generation log are
    /// returned rather than an error (§5: "a cancelled run returns its
    /// current archive and partial per-gen log").
    pub fn run(&self, seed: u64, control: &RunControl) -> Result<RunResult, DvaError> {
        let mut rng = MOORandomGenerator::new_from_seed(Some(seed));
        let mut cache = EvaluationCache::new();
        // `self.mutation_rate` is the per-gene `1/n_var` rate already baked
        // into `self.mutation` (PolynomialMutation); the Evolve-level rate
        // below is the per-individual gate and must stay at 1.0 so every
        // child is considered for mutation instead of double-gating it.
        let evolve = Evolve::new(
            TournamentSelection,
            self.crossover.clone(),
            self.mutation.clone(),
            self.crossover_rate,
            1.0,
        );

        let initial_genes = self
            .sampling
            .operate(self.population_size, NUM_GENES, &mut rng);
        let initial_fitness =
            problem::evaluate_population_cached(&self.problem, &initial_genes, &mut cache);
        let mut population = Population::new(
            initial_genes,
            initial_fitness,
            ndarray::Array1::zeros(self.population_size),
        );
        population = environmental_selection(&population, self.population_size);

        let mut archive = Archive::new(self.archive_max_size);
        archive.insert(&population.best());

        let mut per_generation = Vec::with_capacity(self.max_generations);
        let mut hv_history: Vec<f64> = Vec::new();

        for gen in 0..self.max_generations {
            if let Err(DvaError::Cancelled { generation }) = control.check(gen) {
                log::info!(
                    "run seed={} cancelled at generation {}, returning partial result",
                    seed,
                    generation
                );
                break;
            }

            let started = Instant::now();

            let offspring_genes = match evolve.evolve(&population, self.population_size, &mut rng)
            {
                Ok(genes) => genes,
                Err(EvolveError::EmptyMatingResult) => {
                    log::warn!(
                        "run seed={} generation {} produced no offspring, stopping early",
                        seed,
                        gen
                    );
                    break;
                }
            };
            let offspring_fitness =
                problem::evaluate_population_cached(&self.problem, &offspring_genes, &mut cache);
            let offspring = Population::new(
                offspring_genes,
                offspring_fitness,
                ndarray::Array1::zeros(self.population_size),
            );

            let merged = Population::merge(&population, &offspring);
            population = environmental_selection(&merged, self.population_size);

            archive.insert(&population.best());

            let best = population.best();
            let reference_front = archive.population.fitness.clone();
            let (hv, igd_plus, gd, spread, spacing) =
                indicators_for_front(&best.fitness, &reference_front);
            let diversity = crate::algorithm::diversity(&population.genes);
            let [best_f1, best_f2, best_f3] = crate::algorithm::best_objectives(&population.fitness);

            per_generation.push(GenerationRecord {
                gen,
                time_ms: started.elapsed().as_secs_f64() * 1000.0,
                hv,
                igd_plus,
                gd,
                spread,
                spacing,
                n_pareto: best.len(),
                diversity,
                p_m: self.mutation_rate,
                p_c: self.crossover_rate,
                best_f1,
                best_f2,
                best_f3,
            });
            hv_history.push(hv);

            if let Some(tolerance) = self.early_stop_hv_tolerance {
                if hv_history.len() > self.early_stop_window {
                    let window_start = hv_history.len() - self.early_stop_window - 1;
                    let baseline = hv_history[window_start];
                    let relative_change = if baseline.abs() > 1e-12 {
                        (hv - baseline).abs() / baseline.abs()
                    } else {
                        0.0
                    };
                    if relative_change < tolerance {
                        log::debug!(
                            "run seed={} early-stopping at generation {}: HV change {:.6} below tolerance {:.6}",
                            seed,
                            gen,
                            relative_change,
                            tolerance
                        );
                        break;
                    }
                }
            }
        }

        log::info!(
            "run seed={} completed with {} generations recorded, archive size {}",
            seed,
            per_generation.len(),
            archive.len()
        );

        Ok(RunResult {
            seed,
            final_population: population,
            archive,
            per_generation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::absorber::Bounds;
    use crate::frf::{MassTargets, NUM_DOF};
    use crate::primary::PrimaryParams;
    use ndarray::Array1;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.population_size = 8;
        config.max_generations = 3;
        config
    }

    fn problem_config() -> ProblemConfig {
        let bounds = Bounds(vec![(0.0, 1.0); NUM_GENES]);
        let omega = Array1::linspace(0.0, 12000.0, 50);
        let targets: [MassTargets; NUM_DOF] = std::array::from_fn(|_| Vec::new());
        ProblemConfig::new(
            PrimaryParams::scenario_s1(),
            bounds,
            omega,
            targets,
            0.01,
            vec![0.5; NUM_GENES],
        )
    }

    #[test]
    fn run_produces_one_record_per_generation() {
        let config = small_config();
        let nsga2 = Nsga2::new(&config, problem_config());
        let control = RunControl::new(None);
        let result = nsga2.run(42, &control).unwrap();
        assert_eq!(result.per_generation.len(), config.max_generations);
        assert_eq!(result.final_population.len(), config.population_size);
    }

    #[test]
    fn same_seed_yields_identical_final_populations() {
        let config = small_config();
        let nsga2 = Nsga2::new(&config, problem_config());
        let control = RunControl::new(None);
        let r1 = nsga2.run(7, &control).unwrap();
        let r2 = nsga2.run(7, &control).unwrap();
        assert_eq!(r1.final_population.genes, r2.final_population.genes);
        assert_eq!(r1.final_population.fitness, r2.final_population.fitness);
    }

    #[test]
    fn cancellation_yields_partial_result() {
        let config = small_config();
        let nsga2 = Nsga2::new(&config, problem_config());
        let control = RunControl::new(None);
        control.cancel();
        let result = nsga2.run(1, &control).unwrap();
        assert!(result.per_generation.is_empty());
        assert_eq!(result.final_population.len(), config.population_size);
    }
}
