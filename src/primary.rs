//! `PrimaryParams` (§3): the fixed 17-tuple describing the primary
//! mechanical structure and excitation. Immutable for the lifetime of a run.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrimaryParams {
    pub mu: f64,
    /// `LANDA_1..LANDA_5`, stored 0-indexed; use [`PrimaryParams::landa`] for
    /// the spec's 1-indexed accessor.
    pub landa: [f64; 5],
    /// `NU_1..NU_5`, see [`PrimaryParams::nu`].
    pub nu: [f64; 5],
    pub a_low: f64,
    pub a_upp: f64,
    pub f1: f64,
    pub f2: f64,
    pub omega_dc: f64,
    pub zeta_dc: f64,
}

impl PrimaryParams {
    /// 1-indexed accessor matching the spec's `LANDA_1..LANDA_5` naming.
    pub fn landa(&self, i: usize) -> f64 {
        self.landa[i - 1]
    }

    /// 1-indexed accessor matching the spec's `NU_1..NU_5` naming.
    pub fn nu(&self, i: usize) -> f64 {
        self.nu[i - 1]
    }

    /// The literal primary-structure parameters of scenario S1 (§8).
    pub fn scenario_s1() -> Self {
        Self {
            mu: 2.0,
            landa: [0.4, 0.6, 0.8, 1.0, 1.2],
            nu: [0.1, 0.1, 0.1, 0.1, 0.1],
            a_low: 0.02,
            a_upp: 0.02,
            f1: 150.0,
            f2: 150.0,
            omega_dc: 8000.0,
            zeta_dc: 0.02,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_indexed_accessors_match_array_order() {
        let p = PrimaryParams::scenario_s1();
        assert_eq!(p.landa(1), 0.4);
        assert_eq!(p.landa(5), 1.2);
        assert_eq!(p.nu(1), 0.1);
    }
}
