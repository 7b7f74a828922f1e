use std::sync::Arc;

use ndarray::ArrayViewMut1;

use crate::operators::MutationOperator;
use crate::random::RandomGenerator;

/// Polynomial mutation (Deb's PM) with per-gene bounds, distribution index
/// `eta_m` (§4.4; the MOEA core always configures `eta_m = 20`).
#[derive(Debug, Clone)]
pub struct PolynomialMutation {
    /// per-gene mutation chance, `p_m`
    pub gene_mutation_rate: f64,
    pub distribution_index: f64,
    pub var_ranges: Arc<Vec<(f64, f64)>>,
}

impl PolynomialMutation {
    pub fn new(
        gene_mutation_rate: f64,
        distribution_index: f64,
        var_ranges: Arc<Vec<(f64, f64)>>,
    ) -> Self {
        Self {
            gene_mutation_rate,
            distribution_index,
            var_ranges,
        }
    }
}

impl MutationOperator for PolynomialMutation {
    fn mutate<'a>(&self, mut individual: ArrayViewMut1<'a, f64>, rng: &mut impl RandomGenerator) {
        let eta = self.distribution_index;
        for (gene, &(lb, ub)) in individual.iter_mut().zip(self.var_ranges.iter()) {
            if lb >= ub {
                continue; // fixed entry (I3): never mutated
            }
            if !rng.gen_bool(self.gene_mutation_rate) {
                continue;
            }
            let dx = ub - lb;
            let u = rng.gen_range_f64(0.0, 1.0);
            let x = *gene;
            let delta = if u < 0.5 {
                let bl = (x - lb) / dx;
                let b = 2.0 * u + (1.0 - 2.0 * u) * (1.0 - bl).powf(eta + 1.0);
                b.powf(1.0 / (eta + 1.0)) - 1.0
            } else {
                let bu = (ub - x) / dx;
                let b = 2.0 * (1.0 - u) + 2.0 * (u - 0.5) * (1.0 - bu).powf(eta + 1.0);
                1.0 - b.powf(1.0 / (eta + 1.0))
            };
            *gene = (x + delta * dx).clamp(lb, ub);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::MOORandomGenerator;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn mutates_genes_within_bounds() {
        let ranges = Arc::new(vec![(-10.0, 0.0), (0.0, 1.0), (1.0, 10.0)]);
        let mut genes = array![-5.5, 0.5, 7.5];
        let before = genes.clone();
        let op = PolynomialMutation::new(1.0, 20.0, ranges);
        let mut rng = MOORandomGenerator::new(StdRng::seed_from_u64(42));
        op.mutate(genes.view_mut(), &mut rng);
        assert_ne!(genes, before);
        assert!(genes[0] >= -10.0 && genes[0] <= 0.0);
        assert!(genes[1] >= 0.0 && genes[1] <= 1.0);
        assert!(genes[2] >= 1.0 && genes[2] <= 10.0);
    }

    #[test]
    fn fixed_entries_never_mutate() {
        let ranges = Arc::new(vec![(3.0, 3.0)]);
        let mut genes = array![3.0];
        let op = PolynomialMutation::new(1.0, 20.0, ranges);
        let mut rng = MOORandomGenerator::new(StdRng::seed_from_u64(7));
        op.mutate(genes.view_mut(), &mut rng);
        assert_eq!(genes[0], 3.0);
    }
}
