//! Problem Adapter (§4.2): maps a 48-gene absorber vector to the three
//! scalar objectives `(f_FRF, f_sparsity, f_cost)` via the FRF evaluator.

use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;

use crate::absorber::{AbsorberParams, Bounds};
use crate::cache::EvaluationCache;
use crate::frf::{self, MassTargets, NUM_DOF};
use crate::genetic::NUM_OBJECTIVES;
use crate::primary::PrimaryParams;
use crate::random::RandomGenerator;

/// Non-finite objective components are replaced with this penalty (§6, §7);
/// an `FrfUnsolvable`/`AllDofInactive` failure substitutes the full triple.
pub const PENALTY: f64 = 1e6;

#[derive(Debug, Clone)]
pub struct ProblemConfig {
    pub primary: PrimaryParams,
    pub bounds: Bounds,
    pub omega: Array1<f64>,
    pub targets: [MassTargets; NUM_DOF],
    pub alpha_sparsity: f64,
    /// Frozen at construction (§4.2): either supplied explicitly or drawn
    /// once from a seeded RNG, uniform in `[0.1, 1.0]`.
    pub cost_coefficients: Vec<f64>,
}

impl ProblemConfig {
    pub fn new(
        primary: PrimaryParams,
        bounds: Bounds,
        omega: Array1<f64>,
        targets: [MassTargets; NUM_DOF],
        alpha_sparsity: f64,
        cost_coefficients: Vec<f64>,
    ) -> Self {
        Self {
            primary,
            bounds,
            omega,
            targets,
            alpha_sparsity,
            cost_coefficients,
        }
    }

    /// Draws the default cost coefficient sequence, uniform in `[0.1, 1.0]`
    /// from the supplied RNG, frozen once at problem construction (§4.2).
    pub fn default_cost_coefficients(rng: &mut impl RandomGenerator) -> Vec<f64> {
        (0..crate::genetic::NUM_GENES)
            .map(|_| rng.gen_range_f64(0.1, 1.0))
            .collect()
    }
}

/// Evaluates the three objectives for one absorber vector (§4.2).
/// Constraint violation is always 0 for this problem (no feasibility
/// filtering occurs downstream).
pub fn evaluate_one(config: &ProblemConfig, x: &Array1<f64>) -> [f64; NUM_OBJECTIVES] {
    let absorber = AbsorberParams::from(x);
    let frf_term = match frf::evaluate_frf(&config.primary, &absorber, &config.omega, &config.targets) {
        Ok(result) => (result.singular_response - 1.0).abs(),
        Err(_) => PENALTY,
    };

    let sparsity = config.alpha_sparsity * x.iter().map(|v| v.abs()).sum::<f64>();
    let cost: f64 = x
        .iter()
        .zip(config.cost_coefficients.iter())
        .map(|(&xi, &ci)| ci * xi)
        .sum();

    [frf_term, sparsity, cost].map(|v| if v.is_finite() { v } else { PENALTY })
}

/// Evaluates a population block through the per-run evaluation cache (§5):
/// rows whose fingerprint was already computed this run are served from
/// `cache`; the rest are independent FRF solves, forked out across rayon's
/// worker threads (§5's data-parallel offspring evaluation) and joined
/// before the cache is updated, since `EvaluationCache` itself is not
/// shared-mutable across threads.
pub fn evaluate_population_cached(
    config: &ProblemConfig,
    genes: &Array2<f64>,
    cache: &mut EvaluationCache,
) -> Array2<f64> {
    let n = genes.nrows();
    let mut fitness = Array2::zeros((n, NUM_OBJECTIVES));
    let mut misses: Vec<(usize, Array1<f64>)> = Vec::new();

    for (i, row) in genes.axis_iter(Axis(0)).enumerate() {
        match cache.get(&row) {
            Some(cached) => {
                for k in 0..NUM_OBJECTIVES {
                    fitness[[i, k]] = cached[k];
                }
            }
            None => misses.push((i, row.to_owned())),
        }
    }

    let computed: Vec<(usize, [f64; NUM_OBJECTIVES])> = misses
        .into_par_iter()
        .map(|(i, x)| (i, evaluate_one(config, &x)))
        .collect();

    for (i, f) in computed {
        let x = genes.row(i).to_owned();
        cache.insert(&x.view(), f);
        for k in 0..NUM_OBJECTIVES {
            fitness[[i, k]] = f[k];
        }
    }

    fitness
}
