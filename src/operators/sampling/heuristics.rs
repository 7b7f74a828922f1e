use std::collections::HashSet;

use ndarray::Array1;
use rand_distr::{Distribution, Normal};

use crate::random::RandomGenerator;

/// The four heuristic seeding templates of §4.6, each followed by
/// `N(0, 0.02 * range)` jitter and clipping to bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeuristicTemplate {
    CostMinimizer,
    FrfMinimizer,
    SparsityMaximizer,
    Balanced,
}

pub const HEURISTIC_TEMPLATES: [HeuristicTemplate; 4] = [
    HeuristicTemplate::CostMinimizer,
    HeuristicTemplate::FrfMinimizer,
    HeuristicTemplate::SparsityMaximizer,
    HeuristicTemplate::Balanced,
];

/// Indices boosted by the FRF-minimizer template (§4.6, literal list).
const FRF_BOOST_INDICES: [usize; 6] = [5, 12, 18, 27, 35, 41];

pub fn sample_heuristic(
    template: HeuristicTemplate,
    ranges: &[(f64, f64)],
    cost_coefficients: &[f64],
    rng: &mut impl RandomGenerator,
) -> Array1<f64> {
    let raw = match template {
        HeuristicTemplate::CostMinimizer => cost_minimizer(ranges, cost_coefficients),
        HeuristicTemplate::FrfMinimizer => frf_minimizer(ranges, rng),
        HeuristicTemplate::SparsityMaximizer => sparsity_maximizer(ranges, rng),
        HeuristicTemplate::Balanced => balanced(ranges, cost_coefficients),
    };
    jitter_and_clip(raw, ranges, rng)
}

fn cost_minimizer(ranges: &[(f64, f64)], costs: &[f64]) -> Array1<f64> {
    let n = ranges.len();
    let mut by_cost: Vec<usize> = (0..n).collect();
    by_cost.sort_by(|&a, &b| costs[b].partial_cmp(&costs[a]).unwrap());
    let expensive: HashSet<usize> = by_cost.iter().take(20).copied().collect();
    let cheapest: HashSet<usize> = by_cost.iter().rev().take(10).copied().collect();

    Array1::from_iter((0..n).map(|i| {
        let (lb, ub) = ranges[i];
        let range = ub - lb;
        if expensive.contains(&i) {
            lb + 0.2 * range
        } else if cheapest.contains(&i) {
            lb + 0.8 * range
        } else {
            lb + 0.5 * range
        }
    }))
}

fn frf_minimizer(ranges: &[(f64, f64)], rng: &mut impl RandomGenerator) -> Array1<f64> {
    let n = ranges.len();
    let mut out = Array1::zeros(n);
    for i in 0..n {
        let (lb, ub) = ranges[i];
        let range = ub - lb;
        out[i] = if FRF_BOOST_INDICES.contains(&i) {
            lb + 0.8 * range
        } else {
            lb + rng.gen_range_f64(0.3, 0.7) * range
        };
    }
    out
}

fn sparsity_maximizer(ranges: &[(f64, f64)], rng: &mut impl RandomGenerator) -> Array1<f64> {
    let n = ranges.len();
    let mut out = Array1::zeros(n);
    for i in 0..n {
        let (lb, ub) = ranges[i];
        let range = ub - lb;
        out[i] = lb + rng.gen_range_f64(0.0, 0.1) * range;
    }
    let k = 10.min(n);
    let mut chosen = HashSet::new();
    while chosen.len() < k {
        chosen.insert(rng.gen_range_usize(0, n));
    }
    for i in chosen {
        let (lb, ub) = ranges[i];
        let range = ub - lb;
        out[i] = lb + rng.gen_range_f64(0.6, 1.0) * range;
    }
    out
}

fn balanced(ranges: &[(f64, f64)], costs: &[f64]) -> Array1<f64> {
    let weights: Vec<f64> = costs.iter().map(|&c| 1.0 / (c + 0.1)).collect();
    let max_w = weights.iter().copied().fold(f64::MIN, f64::max).max(1e-12);
    Array1::from_iter(ranges.iter().zip(weights.iter()).map(|(&(lb, ub), &w)| {
        let range = ub - lb;
        lb + (w / max_w) * 0.5 * range
    }))
}

fn jitter_and_clip(
    mut genes: Array1<f64>,
    ranges: &[(f64, f64)],
    rng: &mut impl RandomGenerator,
) -> Array1<f64> {
    for (g, &(lb, ub)) in genes.iter_mut().zip(ranges.iter()) {
        if lb >= ub {
            *g = lb;
            continue;
        }
        let range = ub - lb;
        let normal = Normal::new(0.0, 0.02 * range).expect("sigma > 0");
        *g = (*g + normal.sample(rng.rng())).clamp(lb, ub);
    }
    genes
}
