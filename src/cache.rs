//! Per-run evaluation cache (§5, §9): keyed by a fixed-precision fingerprint
//! of the decision vector rather than the raw floats, so bit-identical reuse
//! is cheap without depending on float `Hash`/`Eq`. Never shared across
//! runs — each run owns its own cache to avoid cross-contamination of
//! reproducibility.

use std::collections::HashMap;

use ndarray::ArrayView1;

use crate::genetic::NUM_OBJECTIVES;

const SIGNIFICANT_DIGITS: i32 = 12;

/// Rounds to `SIGNIFICANT_DIGITS` significant figures and keys by the
/// resulting fp64 bit pattern (§9: "canonicalize to a fixed-precision
/// fingerprint").
fn fingerprint(x: &ArrayView1<f64>) -> Vec<u64> {
    x.iter()
        .map(|&v| round_to_sig_figs(v, SIGNIFICANT_DIGITS).to_bits())
        .collect()
}

fn round_to_sig_figs(v: f64, digits: i32) -> f64 {
    if v == 0.0 || !v.is_finite() {
        return v;
    }
    let magnitude = v.abs().log10().floor() as i32;
    let shift = digits - magnitude - 1;
    let factor = 10f64.powi(shift);
    (v * factor).round() / factor
}

/// Per-run evaluation cache mapping a canonical gene fingerprint to the
/// previously computed objective triple.
#[derive(Debug, Clone, Default)]
pub struct EvaluationCache {
    entries: HashMap<Vec<u64>, [f64; NUM_OBJECTIVES]>,
}

impl EvaluationCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, x: &ArrayView1<f64>) -> Option<[f64; NUM_OBJECTIVES]> {
        self.entries.get(&fingerprint(x)).copied()
    }

    pub fn insert(&mut self, x: &ArrayView1<f64>, fitness: [f64; NUM_OBJECTIVES]) {
        self.entries.insert(fingerprint(x), fitness);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
