use std::sync::Arc;

use ndarray::{Array2, ArrayViewMut1, Axis};
use rand_distr::{Cauchy, Distribution, Normal};

use crate::random::RandomGenerator;

/// The four AdaVEA-MOO mutation strategies (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStrategy {
    Gaussian,
    Cauchy,
    CostAware,
    Sparsity,
}

/// Ensemble mutation operator used by the AdaVEA-MOO extension in place of
/// plain polynomial mutation. Unlike the other operators in this module,
/// the strategy draw depends on the individual's rank, so it is driven
/// directly by `algorithms::adavea` rather than through the generic
/// `MutationOperator` trait.
#[derive(Debug, Clone)]
pub struct EnsembleMutation {
    pub var_ranges: Arc<Vec<(f64, f64)>>,
    pub cost_coefficients: Arc<Vec<f64>>,
}

impl EnsembleMutation {
    pub fn new(var_ranges: Arc<Vec<(f64, f64)>>, cost_coefficients: Arc<Vec<f64>>) -> Self {
        Self {
            var_ranges,
            cost_coefficients,
        }
    }

    /// Weighted strategy draw for one individual. The Cauchy branch's share
    /// of probability mass grows with rank, so deeper (less fit) fronts get
    /// heavier-tailed, more exploratory perturbations; the remaining mass is
    /// split 4:3:3 among Gaussian, cost-aware and sparsity-aware.
    fn choose_strategy(&self, rank: usize, rng: &mut impl RandomGenerator) -> MutationStrategy {
        let cauchy_w = (0.1 + 0.02 * rank as f64).min(0.6);
        let remaining = 1.0 - cauchy_w;
        let gaussian_w = remaining * 0.4;
        let cost_w = remaining * 0.3;

        let u = rng.gen_probability();
        if u < gaussian_w {
            MutationStrategy::Gaussian
        } else if u < gaussian_w + cost_w {
            MutationStrategy::CostAware
        } else if u < gaussian_w + cost_w + cauchy_w {
            MutationStrategy::Cauchy
        } else {
            MutationStrategy::Sparsity
        }
    }

    pub fn mutate_individual(
        &self,
        mut genes: ArrayViewMut1<f64>,
        rank: usize,
        rng: &mut impl RandomGenerator,
    ) {
        let strategy = self.choose_strategy(rank, rng);
        let c_max = self
            .cost_coefficients
            .iter()
            .copied()
            .fold(f64::MIN, f64::max)
            .max(0.0);

        for (i, gene) in genes.iter_mut().enumerate() {
            let (lb, ub) = self.var_ranges[i];
            if lb >= ub {
                continue; // fixed entry (I3)
            }
            let range = ub - lb;
            let x = *gene;
            let new_x = match strategy {
                MutationStrategy::Gaussian => {
                    let normal = Normal::new(0.0, 0.1 * range).expect("sigma > 0");
                    x + normal.sample(rng.rng())
                }
                MutationStrategy::Cauchy => {
                    let cauchy = Cauchy::new(0.0, 1.0).expect("valid cauchy params");
                    x + 0.05 * cauchy.sample(rng.rng()) * range
                }
                MutationStrategy::CostAware => {
                    let c_i = self.cost_coefficients.get(i).copied().unwrap_or(0.0);
                    let sigma = if c_i > 0.7 * c_max {
                        0.02 * range
                    } else {
                        0.15 * range
                    };
                    let normal = Normal::new(0.0, sigma.max(1e-12)).expect("sigma > 0");
                    x + normal.sample(rng.rng())
                }
                MutationStrategy::Sparsity => {
                    let near_zero = x < 0.1 * range + lb;
                    if near_zero && rng.gen_probability() < 0.9 {
                        lb
                    } else {
                        let normal = Normal::new(0.0, 0.08 * range).expect("sigma > 0");
                        x + normal.sample(rng.rng())
                    }
                }
            };
            *gene = new_x.clamp(lb, ub);
        }
    }

    /// Applies mutation to the rows selected by `mutation_rate`, reading
    /// each row's rank from `ranks` (parallel to `population`'s rows).
    pub fn operate(
        &self,
        population: &mut Array2<f64>,
        ranks: &[usize],
        mutation_rate: f64,
        rng: &mut impl RandomGenerator,
    ) {
        for (row_idx, row) in population.axis_iter_mut(Axis(0)).enumerate() {
            if rng.gen_bool(mutation_rate) {
                let rank = ranks.get(row_idx).copied().unwrap_or(0);
                self.mutate_individual(row, rank, rng);
            }
        }
    }
}
