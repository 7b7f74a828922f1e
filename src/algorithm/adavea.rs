//! AdaVEA-MOO extension (§4.6): heuristic-seeded initialization, ensemble
//! mutation, diversity-driven adaptive rates and scheduled hybrid local
//! refinement layered on top of the NSGA-II generational skeleton.

use std::sync::Arc;
use std::time::Instant;

use ndarray::{Array1, Array2};

use crate::algorithm::{GenerationRecord, RunControl, RunResult, diversity, indicators_for_front};
use crate::archive::Archive;
use crate::cache::EvaluationCache;
use crate::config::{Config, LamarckianSchedule};
use crate::error::DvaError;
use crate::genetic::{NUM_GENES, NUM_OBJECTIVES, Population};
use crate::operators::crossover::SBXCrossover;
use crate::operators::mutation::EnsembleMutation;
use crate::operators::sampling::{HEURISTIC_TEMPLATES, sample_heuristic};
use crate::operators::selection::TournamentSelection;
use crate::operators::{CrossoverOperator, SelectionOperator};
use crate::problem::{self, ProblemConfig};
use crate::random::{MOORandomGenerator, RandomGenerator};
use crate::sorting::environmental_selection;

/// True if `a` weakly dominates `b`: no objective is worse, and at least one
/// is strictly better.
fn weakly_dominates(a: &[f64; NUM_OBJECTIVES], b: &[f64; NUM_OBJECTIVES]) -> bool {
    let mut strictly_better = false;
    for k in 0..NUM_OBJECTIVES {
        if a[k] > b[k] {
            return false;
        }
        if a[k] < b[k] {
            strictly_better = true;
        }
    }
    strictly_better
}

/// AdaVEA-MOO: NSGA-II's survivor selection and sorting kernel, supplemented
/// with the adaptive operators of §4.6. Like [`super::nsga2::Nsga2`], this is
/// a plain concrete struct sized to this crate's one problem shape.
#[derive(Debug, Clone)]
pub struct AdaVea {
    pub population_size: usize,
    pub max_generations: usize,
    pub archive_max_size: usize,
    pub early_stop_hv_tolerance: Option<f64>,
    pub early_stop_window: usize,
    init_heuristic_ratio: f64,
    p_m_min: f64,
    p_m_max: f64,
    p_c_min: f64,
    p_c_max: f64,
    local_search_freq: usize,
    local_search_top_k: f64,
    local_search_budget: usize,
    lamarckian_schedule: LamarckianSchedule,
    crossover_prob: f64,
    mutation_prob: f64,
    crossover: SBXCrossover,
    mutation: EnsembleMutation,
    ranges: Arc<Vec<(f64, f64)>>,
    problem: ProblemConfig,
}

impl AdaVea {
    pub fn new(config: &Config, problem: ProblemConfig) -> Self {
        let ranges = Arc::new(problem.bounds.as_pairs().to_vec());
        let crossover = SBXCrossover::new(config.nsga2.crossover_eta, ranges.clone());
        let mutation = EnsembleMutation::new(
            ranges.clone(),
            Arc::new(problem.cost_coefficients.clone()),
        );
        Self {
            population_size: config.population_size,
            max_generations: config.max_generations,
            archive_max_size: config.archive_max_size,
            early_stop_hv_tolerance: config.early_stop_hv_tolerance,
            early_stop_window: config.early_stop_window,
            init_heuristic_ratio: config.adavea.init_heuristic_ratio,
            p_m_min: config.adavea.p_m_min,
            p_m_max: config.adavea.p_m_max,
            p_c_min: config.adavea.p_c_min,
            p_c_max: config.adavea.p_c_max,
            local_search_freq: config.adavea.local_search_freq,
            local_search_top_k: config.adavea.local_search_top_k,
            local_search_budget: config.adavea.local_search_budget,
            lamarckian_schedule: config.adavea.lamarckian_schedule,
            crossover_prob: config.nsga2.crossover_prob,
            mutation_prob: config.nsga2.resolved_mutation_prob(),
            crossover,
            mutation,
            ranges,
            problem,
        }
    }

    /// Heuristic-seeded initial population (§4.6): `floor(init_heuristic_ratio
    /// * N)` individuals split evenly across the four templates, the
    /// remainder uniform random.
    fn initial_genes(&self, rng: &mut impl RandomGenerator) -> Array2<f64> {
        let n = self.population_size;
        let heuristic_count = (self.init_heuristic_ratio * n as f64).floor() as usize;
        let per_template = heuristic_count / HEURISTIC_TEMPLATES.len();

        let mut genes = Array2::zeros((n, NUM_GENES));
        let mut row = 0;
        for template in HEURISTIC_TEMPLATES {
            for _ in 0..per_template {
                if row >= n {
                    break;
                }
                let sample = sample_heuristic(
                    template,
                    self.ranges.as_slice(),
                    &self.problem.cost_coefficients,
                    rng,
                );
                genes.row_mut(row).assign(&sample);
                row += 1;
            }
        }
        while row < n {
            for (j, &(lb, ub)) in self.ranges.iter().enumerate() {
                genes[[row, j]] = if lb >= ub {
                    lb
                } else {
                    rng.gen_range_f64(lb, ub)
                };
            }
            row += 1;
        }
        genes
    }

    /// Diversity-driven adaptive rate update (§4.6), plus the scheduled soft
    /// cap on crossover probability.
    fn adapt_rates(
        &self,
        p_m: f64,
        p_c: f64,
        sigma_div: f64,
        sigma_target: f64,
        generation: usize,
    ) -> (f64, f64) {
        let (mut next_p_m, mut next_p_c) = if sigma_div < sigma_target {
            ((p_m + 0.005).min(self.p_m_max), (p_c * 0.8).max(self.p_c_min))
        } else {
            ((p_m - 0.002).max(self.p_m_min), (p_c * 1.5).min(self.p_c_max))
        };
        next_p_m = next_p_m.clamp(self.p_m_min, self.p_m_max);

        let schedule_cap =
            0.5 + 0.5 * (-(generation as f64) / (self.max_generations as f64 / 4.0)).exp();
        next_p_c = next_p_c.min(schedule_cap).clamp(self.p_c_min, self.p_c_max);

        (next_p_m, next_p_c)
    }

    /// Builds `num_offsprings` children: tournament selection, SBX crossover
    /// at `p_c`, then ensemble mutation at `p_m` keyed by each offspring's
    /// inherited rank (the better-ranked parent's rank, since ensemble
    /// mutation is not a generic [`crate::operators::MutationOperator`]).
    fn make_offspring(
        &self,
        population: &Population,
        num_offsprings: usize,
        p_c: f64,
        p_m: f64,
        rng: &mut impl RandomGenerator,
    ) -> (Array2<f64>, Vec<usize>) {
        let n_crossovers = num_offsprings.div_ceil(2);
        let selector = TournamentSelection;
        let (parents_a, parents_b) = selector.operate(population, n_crossovers, rng);

        let mut offspring = Array2::zeros((2 * n_crossovers, NUM_GENES));
        let mut ranks = Vec::with_capacity(2 * n_crossovers);
        for i in 0..n_crossovers {
            let a = parents_a.genes.row(i).to_owned();
            let b = parents_b.genes.row(i).to_owned();
            let (c1, c2) = if rng.gen_probability() < p_c {
                self.crossover.crossover(&a, &b, rng)
            } else {
                (a, b)
            };
            offspring.row_mut(2 * i).assign(&c1);
            offspring.row_mut(2 * i + 1).assign(&c2);
            let inherited_rank = parents_a.get(i).rank.unwrap_or(0).min(parents_b.get(i).rank.unwrap_or(0));
            ranks.push(inherited_rank);
            ranks.push(inherited_rank);
        }
        self.mutation.operate(&mut offspring, &ranks, p_m, rng);

        if offspring.nrows() > num_offsprings {
            offspring = offspring.slice(ndarray::s![0..num_offsprings, ..]).to_owned();
            ranks.truncate(num_offsprings);
        }
        (offspring, ranks)
    }

    /// Greedy coordinate-descent local search for one individual (§4.6):
    /// `budget` variable trials, each perturbing one gene by `+/- 0.05 *
    /// range` and keeping the move only when it weakly dominates the
    /// incumbent (no objective worsens, at least one strictly improves).
    /// A scalar-sum acceptance test was tried first but rejected: a
    /// sum-improving move can still worsen one objective, which would let
    /// `refine_population`'s unconditional fitness overwrite regress that
    /// objective's population minimum and break elitism (I6/P3).
    fn local_search(
        &self,
        genes: &Array1<f64>,
        budget: usize,
        rng: &mut impl RandomGenerator,
    ) -> (Array1<f64>, [f64; NUM_OBJECTIVES]) {
        let mut best = genes.clone();
        let mut best_fitness = problem::evaluate_one(&self.problem, &best);

        for _ in 0..budget {
            let idx = rng.gen_range_usize(0, NUM_GENES);
            let (lb, ub) = self.ranges[idx];
            if lb >= ub {
                continue;
            }
            let delta = 0.05 * (ub - lb);
            for &sign in &[1.0, -1.0] {
                let mut candidate = best.clone();
                candidate[idx] = (candidate[idx] + sign * delta).clamp(lb, ub);
                let candidate_fitness = problem::evaluate_one(&self.problem, &candidate);
                if weakly_dominates(&candidate_fitness, &best_fitness) {
                    best = candidate;
                    best_fitness = candidate_fitness;
                }
            }
        }
        (best, best_fitness)
    }

    /// Applies hybrid local refinement to the top `ceil(top_k * N)`
    /// individuals by rank (ties by crowding), per §4.6's Δt schedule.
    fn refine_population(
        &self,
        population: &mut Population,
        generation: usize,
        rng: &mut impl RandomGenerator,
    ) {
        let n = population.len();
        let top_k = ((self.local_search_top_k * n as f64).ceil() as usize).max(1).min(n);

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            let ia = population.get(a);
            let ib = population.get(b);
            ia.rank
                .cmp(&ib.rank)
                .then(ib.crowding.partial_cmp(&ia.crowding).unwrap_or(std::cmp::Ordering::Equal))
        });

        let lambda = match self.lamarckian_schedule {
            LamarckianSchedule::Linear => generation as f64 / self.max_generations as f64,
            LamarckianSchedule::Constant => 0.5,
        };

        for &idx in order.iter().take(top_k) {
            let original = population.genes.row(idx).to_owned();
            let (refined, refined_fitness) = self.local_search(&original, self.local_search_budget, rng);

            if rng.gen_probability() < lambda {
                population.genes.row_mut(idx).assign(&refined);
            }
            for k in 0..NUM_OBJECTIVES {
                population.fitness[[idx, k]] = refined_fitness[k];
            }
        }
    }

    pub fn run(&self, seed: u64, control: &RunControl) -> Result<RunResult, DvaError> {
        let mut rng = MOORandomGenerator::new_from_seed(Some(seed));
        let mut cache = EvaluationCache::new();

        let initial_genes = self.initial_genes(&mut rng);
        let initial_fitness =
            problem::evaluate_population_cached(&self.problem, &initial_genes, &mut cache);
        let mut population = Population::new(
            initial_genes,
            initial_fitness,
            Array1::zeros(self.population_size),
        );
        population = environmental_selection(&population, self.population_size);

        let sigma_initial = diversity(&population.genes).max(1e-12);
        let sigma_target = 0.3 * sigma_initial;

        let mut archive = Archive::new(self.archive_max_size);
        archive.insert(&population.best());

        let mut p_m = self.mutation_prob;
        let mut p_c = self.crossover_prob;

        let mut per_generation = Vec::with_capacity(self.max_generations);
        let mut hv_history: Vec<f64> = Vec::new();

        for gen in 0..self.max_generations {
            if let Err(DvaError::Cancelled { generation }) = control.check(gen) {
                log::info!(
                    "adavea run seed={} cancelled at generation {}, returning partial result",
                    seed,
                    generation
                );
                break;
            }
            let started = Instant::now();

            let sigma_div = diversity(&population.genes);
            let (next_p_m, next_p_c) = self.adapt_rates(p_m, p_c, sigma_div, sigma_target, gen);
            p_m = next_p_m;
            p_c = next_p_c;

            let (offspring_genes, _ranks) =
                self.make_offspring(&population, self.population_size, p_c, p_m, &mut rng);
            if offspring_genes.nrows() == 0 {
                log::warn!(
                    "adavea run seed={} generation {} produced no offspring, stopping early",
                    seed,
                    gen
                );
                break;
            }
            let offspring_fitness =
                problem::evaluate_population_cached(&self.problem, &offspring_genes, &mut cache);
            let offspring = Population::new(
                offspring_genes,
                offspring_fitness,
                Array1::zeros(self.population_size),
            );

            let merged = Population::merge(&population, &offspring);
            population = environmental_selection(&merged, self.population_size);

            if self.local_search_freq > 0 && gen > 0 && gen % self.local_search_freq == 0 {
                self.refine_population(&mut population, gen, &mut rng);
            }

            archive.insert(&population.best());

            let best = population.best();
            let reference_front = archive.population.fitness.clone();
            let (hv, igd_plus, gd, spread, spacing) =
                indicators_for_front(&best.fitness, &reference_front);
            let pop_diversity = diversity(&population.genes);
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
                diversity: pop_diversity,
                p_m,
                p_c,
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
                            "adavea run seed={} early-stopping at generation {}",
                            seed,
                            gen
                        );
                        break;
                    }
                }
            }
        }

        log::info!(
            "adavea run seed={} completed with {} generations recorded, archive size {}",
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

    fn small_config() -> Config {
        let mut config = Config::default();
        config.population_size = 20;
        config.max_generations = 5;
        config.adavea.local_search_freq = 2;
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
    fn heuristic_seeded_init_produces_full_population() {
        let config = small_config();
        let adavea = AdaVea::new(&config, problem_config());
        let mut rng = MOORandomGenerator::new_from_seed(Some(1));
        let genes = adavea.initial_genes(&mut rng);
        assert_eq!(genes.nrows(), config.population_size);
        assert_eq!(genes.ncols(), NUM_GENES);
    }

    #[test]
    fn run_completes_with_dominance_free_archive() {
        let config = small_config();
        let adavea = AdaVea::new(&config, problem_config());
        let control = RunControl::new(None);
        let result = adavea.run(99, &control).unwrap();
        assert_eq!(result.per_generation.len(), config.max_generations);
        assert!(result.archive.is_dominance_free());
    }

    #[test]
    fn same_seed_yields_identical_results() {
        let config = small_config();
        let adavea = AdaVea::new(&config, problem_config());
        let control = RunControl::new(None);
        let r1 = adavea.run(5, &control).unwrap();
        let r2 = adavea.run(5, &control).unwrap();
        assert_eq!(r1.final_population.genes, r2.final_population.genes);
    }

    /// The literal heuristic-seeding scenario: N=100 at the default
    /// `init_heuristic_ratio=0.4` puts exactly 40 heuristic-templated rows
    /// first (10 per template, in `HEURISTIC_TEMPLATES` order) followed by
    /// 60 plain uniform rows.
    #[test]
    fn heuristic_seeding_contributes_exactly_forty_of_one_hundred() {
        let mut config = Config::default();
        config.population_size = 100;
        let adavea = AdaVea::new(&config, problem_config());
        let mut rng = MOORandomGenerator::new_from_seed(Some(3));
        let genes = adavea.initial_genes(&mut rng);
        assert_eq!(genes.nrows(), 100);

        // rows 10..20: FrfMinimizer boosts FRF_BOOST_INDICES to ~0.8 of
        // range, well clear of jitter sigma (0.02 * range).
        for row in 10..20 {
            for &idx in &[5usize, 12, 18, 27, 35, 41] {
                assert!(
                    genes[[row, idx]] > 0.6,
                    "row {row} col {idx} = {} expected near 0.8 (FrfMinimizer boost)",
                    genes[[row, idx]]
                );
            }
        }

        // rows 40..100: plain uniform samples, no template structure to
        // assert beyond staying within bounds.
        for row in 40..100 {
            for col in 0..NUM_GENES {
                assert!((0.0..=1.0).contains(&genes[[row, col]]));
            }
        }
    }

    #[test]
    fn weakly_dominates_rejects_a_mixed_improvement() {
        let incumbent = [1.0, 1.0, 1.0];
        let mixed = [0.5, 1.5, 1.0];
        assert!(!weakly_dominates(&mixed, &incumbent));
    }

    #[test]
    fn weakly_dominates_accepts_a_strict_improvement_on_one_objective() {
        let incumbent = [1.0, 1.0, 1.0];
        let improved = [0.5, 1.0, 1.0];
        assert!(weakly_dominates(&improved, &incumbent));
    }

    #[test]
    fn local_search_never_worsens_any_objective() {
        let config = small_config();
        let adavea = AdaVea::new(&config, problem_config());
        let mut rng = MOORandomGenerator::new_from_seed(Some(11));
        let genes = Array1::from_elem(NUM_GENES, 0.3);
        let original_fitness = problem::evaluate_one(&adavea.problem, &genes);
        let (_, refined_fitness) = adavea.local_search(&genes, 50, &mut rng);
        for k in 0..NUM_OBJECTIVES {
            assert!(
                refined_fitness[k] <= original_fitness[k] + 1e-12,
                "objective {k} worsened: {} -> {}",
                original_fitness[k],
                refined_fitness[k]
            );
        }
    }

    /// Regression for P3/I6 on the AdaVEA path specifically: local
    /// refinement touches every generation here (`local_search_freq = 1`),
    /// so if `refine_population`'s fitness overwrite could regress an
    /// objective this would catch it where `scenario_s4` (archive-level)
    /// and `scenario_s2_s3` (plain NSGA-II, no local search) do not.
    #[test]
    fn per_objective_minimum_is_monotone_with_local_search_every_generation() {
        let mut config = small_config();
        config.adavea.local_search_freq = 1;
        config.adavea.local_search_top_k = 1.0;
        let adavea = AdaVea::new(&config, problem_config());
        let control = RunControl::new(None);
        let result = adavea.run(17, &control).unwrap();

        let mut previous = [f64::INFINITY; NUM_OBJECTIVES];
        for row in result.final_population.fitness.outer_iter() {
            for k in 0..NUM_OBJECTIVES {
                previous[k] = previous[k].min(row[k]);
            }
        }
        // Re-derive per-generation minima is unavailable post-hoc from
        // `GenerationRecord` alone beyond `best_f1..best_f3`; check those
        // are non-increasing across the recorded generations instead.
        let mut last = [f64::INFINITY; NUM_OBJECTIVES];
        for record in &result.per_generation {
            let current = [record.best_f1, record.best_f2, record.best_f3];
            for k in 0..NUM_OBJECTIVES {
                assert!(
                    current[k] <= last[k] + 1e-9,
                    "objective {k} minimum regressed: {} -> {}",
                    last[k],
                    current[k]
                );
            }
            last = current;
        }
    }
}
