use std::sync::Arc;

use ndarray::Array1;

use crate::operators::SamplingOperator;
use crate::random::RandomGenerator;

/// Uniform-random initial sampling, one `(lb, ub)` pair per gene. Fixed
/// entries (`lb == ub`, I3) are never drawn from — they take the fixed
/// value directly.
#[derive(Debug, Clone)]
pub struct UniformSampling {
    pub ranges: Arc<Vec<(f64, f64)>>,
}

impl UniformSampling {
    pub fn new(ranges: Arc<Vec<(f64, f64)>>) -> Self {
        Self { ranges }
    }
}

impl SamplingOperator for UniformSampling {
    fn sample_individual(&self, num_vars: usize, rng: &mut impl RandomGenerator) -> Array1<f64> {
        assert_eq!(
            num_vars,
            self.ranges.len(),
            "must provide {} ranges, got {}",
            num_vars,
            self.ranges.len()
        );
        let mut out = Array1::zeros(num_vars);
        for (j, &(lb, ub)) in self.ranges.iter().enumerate() {
            out[j] = if lb >= ub {
                lb
            } else {
                rng.gen_range_f64(lb, ub)
            };
        }
        out
    }
}
