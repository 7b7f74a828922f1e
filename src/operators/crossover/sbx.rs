use std::sync::Arc;

use ndarray::Array1;

use crate::operators::CrossoverOperator;
use crate::random::RandomGenerator;

/// Simulated Binary Crossover with distribution index `eta_c` (§4.4; the
/// MOEA core always configures `eta_c = 20`). Per variable, a 50% coin flip
/// decides whether SBX applies at all; identical parent values pass through
/// unchanged.
#[derive(Debug, Clone)]
pub struct SBXCrossover {
    pub distribution_index: f64,
    /// one `(lb, ub)` per gene, in absorber-parameter order
    pub ranges: Arc<Vec<(f64, f64)>>,
}

impl SBXCrossover {
    pub fn new(distribution_index: f64, ranges: Arc<Vec<(f64, f64)>>) -> Self {
        Self {
            distribution_index,
            ranges,
        }
    }
}

pub fn sbx_crossover_array(
    p1: &Array1<f64>,
    p2: &Array1<f64>,
    distribution_index: f64,
    rng: &mut impl RandomGenerator,
    ranges: &[(f64, f64)],
) -> (Array1<f64>, Array1<f64>) {
    let n = p1.len();
    assert_eq!(n, p2.len(), "parents must be same length");
    assert_eq!(n, ranges.len(), "ranges must match gene length");

    let mut off1 = p1.clone();
    let mut off2 = p2.clone();
    let eps = 1e-14;

    for i in 0..n {
        let x1 = p1[i];
        let x2 = p2[i];
        if (x1 - x2).abs() < eps {
            continue;
        }
        if rng.gen_probability() >= 0.5 {
            continue;
        }
        let (lb, ub) = ranges[i];
        let (y1, y2) = if x1 < x2 { (x1, x2) } else { (x2, x1) };
        let delta = y2 - y1;
        let rand = rng.gen_probability();

        let beta1 = 1.0 + 2.0 * (y1 - lb) / delta;
        let alpha1 = 2.0 - beta1.powf(-(distribution_index + 1.0));
        let betaq1 = if rand <= 1.0 / alpha1 {
            (rand * alpha1).powf(1.0 / (distribution_index + 1.0))
        } else {
            (1.0 / (2.0 - rand * alpha1)).powf(1.0 / (distribution_index + 1.0))
        };
        let mut c1 = 0.5 * ((y1 + y2) - betaq1 * delta);

        let beta2 = 1.0 + 2.0 * (ub - y2) / delta;
        let alpha2 = 2.0 - beta2.powf(-(distribution_index + 1.0));
        let betaq2 = if rand <= 1.0 / alpha2 {
            (rand * alpha2).powf(1.0 / (distribution_index + 1.0))
        } else {
            (1.0 / (2.0 - rand * alpha2)).powf(1.0 / (distribution_index + 1.0))
        };
        let mut c2 = 0.5 * ((y1 + y2) + betaq2 * delta);

        c1 = c1.clamp(lb, ub);
        c2 = c2.clamp(lb, ub);

        off1[i] = c1;
        off2[i] = c2;
    }

    (off1, off2)
}

impl CrossoverOperator for SBXCrossover {
    fn crossover(
        &self,
        parent_a: &Array1<f64>,
        parent_b: &Array1<f64>,
        rng: &mut impl RandomGenerator,
    ) -> (Array1<f64>, Array1<f64>) {
        sbx_crossover_array(
            parent_a,
            parent_b,
            self.distribution_index,
            rng,
            self.ranges.as_slice(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{MOORandomGenerator, RandomGenerator, TestDummyRng};
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct FakeRandom {
        values: Vec<f64>,
        idx: usize,
        dummy: TestDummyRng,
    }

    impl FakeRandom {
        fn new(values: Vec<f64>) -> Self {
            Self {
                values,
                idx: 0,
                dummy: TestDummyRng,
            }
        }
    }

    impl RandomGenerator for FakeRandom {
        type R = TestDummyRng;
        fn rng(&mut self) -> &mut TestDummyRng {
            &mut self.dummy
        }
        fn gen_probability(&mut self) -> f64 {
            let v = self.values[self.idx];
            self.idx += 1;
            v
        }
    }

    #[test]
    fn sbx_identical_parents_pass_through() {
        let ranges = Arc::new(vec![(0.0, 4.0)]);
        let a = array![2.0];
        let b = array![2.0];
        let op = SBXCrossover::new(20.0, ranges.clone());
        let mut rng = MOORandomGenerator::new(StdRng::seed_from_u64(1));
        let (c1, c2) = op.crossover(&a, &b, &mut rng);
        assert_eq!(c1[0], 2.0);
        assert_eq!(c2[0], 2.0);
    }

    #[test]
    fn sbx_children_stay_within_bounds() {
        let ranges = Arc::new(vec![(0.0, 4.0), (4.0, 6.0)]);
        let a = array![1.0, 5.0];
        let b = array![3.0, 5.0];
        let op = SBXCrossover::new(2.0, ranges.clone());
        let mut fake = FakeRandom::new(vec![0.1, 0.25]);
        let (c1, c2) = op.crossover(&a, &b, &mut fake);
        assert!(c1[0] >= 0.0 && c1[0] <= 4.0);
        assert!(c2[0] >= 0.0 && c2[0] <= 4.0);
        // gene 1 unaffected: identical parents.
        assert_eq!(c1[1], 5.0);
        assert_eq!(c2[1], 5.0);
    }
}
