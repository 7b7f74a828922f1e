//! `AbsorberParams` (§3): the ordered 48-tuple
//! `(beta_1..15, lambda_1..15, mu_1..3, nu_1..15)`, plus the per-entry
//! `Bounds` that define which entries are free vs fixed (I3).

use ndarray::Array1;

use crate::error::ConfigError;
use crate::genetic::NUM_GENES;

pub const N_BETA: usize = 15;
pub const N_LAMBDA: usize = 15;
pub const N_MU: usize = 3;
pub const N_NU: usize = 15;

/// A decision vector, grouped and accessed with the spec's 1-indexed names.
#[derive(Debug, Clone, PartialEq)]
pub struct AbsorberParams {
    values: [f64; NUM_GENES],
}

impl AbsorberParams {
    pub fn from_slice(x: &[f64]) -> Self {
        assert_eq!(x.len(), NUM_GENES, "absorber parameter vector must have 48 entries");
        let mut values = [0.0; NUM_GENES];
        values.copy_from_slice(x);
        Self { values }
    }

    pub fn zeros() -> Self {
        Self {
            values: [0.0; NUM_GENES],
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn beta(&self, i: usize) -> f64 {
        self.values[i - 1]
    }

    pub fn lambda(&self, i: usize) -> f64 {
        self.values[N_BETA + i - 1]
    }

    pub fn mu(&self, i: usize) -> f64 {
        self.values[N_BETA + N_LAMBDA + i - 1]
    }

    pub fn nu(&self, i: usize) -> f64 {
        self.values[N_BETA + N_LAMBDA + N_MU + i - 1]
    }
}

impl From<&Array1<f64>> for AbsorberParams {
    fn from(x: &Array1<f64>) -> Self {
        Self::from_slice(x.as_slice().expect("contiguous gene array"))
    }
}

/// Per-entry `(lower, upper)` bounds; an entry is fixed (I3) when
/// `lower == upper`.
#[derive(Debug, Clone)]
pub struct Bounds(pub Vec<(f64, f64)>);

impl Bounds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.0.len() != NUM_GENES {
            return Err(ConfigError::InvalidBounds {
                index: self.0.len(),
                lower: 0.0,
                upper: 0.0,
            });
        }
        for (i, &(lower, upper)) in self.0.iter().enumerate() {
            if lower > upper {
                return Err(ConfigError::InvalidBounds { index: i, lower, upper });
            }
        }
        Ok(())
    }

    pub fn is_fixed(&self, i: usize) -> bool {
        self.0[i].0 == self.0[i].1
    }

    pub fn clip(&self, genes: &mut Array1<f64>) {
        for (g, &(lower, upper)) in genes.iter_mut().zip(self.0.iter()) {
            *g = g.clamp(lower, upper);
        }
    }

    pub fn as_pairs(&self) -> &[(f64, f64)] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouped_accessors_map_to_expected_offsets() {
        let mut raw = [0.0; NUM_GENES];
        raw[0] = 1.0; // beta_1
        raw[N_BETA] = 2.0; // lambda_1
        raw[N_BETA + N_LAMBDA] = 3.0; // mu_1
        raw[N_BETA + N_LAMBDA + N_MU] = 4.0; // nu_1
        let p = AbsorberParams::from_slice(&raw);
        assert_eq!(p.beta(1), 1.0);
        assert_eq!(p.lambda(1), 2.0);
        assert_eq!(p.mu(1), 3.0);
        assert_eq!(p.nu(1), 4.0);
    }

    #[test]
    fn bounds_validate_rejects_inverted_range() {
        let mut pairs = vec![(0.0, 1.0); NUM_GENES];
        pairs[3] = (2.0, 1.0);
        let bounds = Bounds(pairs);
        assert!(bounds.validate().is_err());
    }

    #[test]
    fn fixed_entry_has_equal_bounds() {
        let mut pairs = vec![(0.0, 1.0); NUM_GENES];
        pairs[7] = (0.5, 0.5);
        let bounds = Bounds(pairs);
        assert!(bounds.is_fixed(7));
        assert!(!bounds.is_fixed(6));
    }
}
