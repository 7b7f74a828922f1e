//! # `genetic` – Core Data Structures
//!
//! The fundamental types flowing through the MOEA core: `Individual` (a
//! borrowed view into one row of a population) and `Population` (the owned
//! backing storage). The problem this crate solves has a fixed shape — 48
//! genes, 3 objectives, no constraints beyond a scalar violation that is
//! always zero — so, unlike a general-purpose MOEA library, these types are
//! not generic over dimensionality.

use ndarray::{Array1, Array2, ArrayView1, Axis, concatenate};
use serde::{Deserialize, Serialize};

pub const NUM_GENES: usize = 48;
pub const NUM_OBJECTIVES: usize = 3;

/// A read-only view over one row of a `Population`.
#[derive(Debug, Clone)]
pub struct Individual<'a> {
    pub genes: ArrayView1<'a, f64>,
    pub fitness: ArrayView1<'a, f64>,
    pub rank: Option<usize>,
    pub crowding: Option<f64>,
    pub violation: f64,
}

impl<'a> Individual<'a> {
    pub fn new(genes: ArrayView1<'a, f64>, fitness: ArrayView1<'a, f64>, violation: f64) -> Self {
        Self {
            genes,
            fitness,
            rank: None,
            crowding: None,
            violation,
        }
    }

    /// This problem never produces a positive constraint violation (§4.2),
    /// but the field is kept so the dominance rule and survival operator
    /// read exactly as specified for a constrained problem.
    pub fn is_feasible(&self) -> bool {
        self.violation <= 0.0
    }
}

/// Owned storage for N solutions: genes (`N x 48`), fitness (`N x 3`),
/// plus the per-sort scratch fields (rank, crowding) that are recomputed by
/// each call to the sorting kernel and discarded between generations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Population {
    pub genes: Array2<f64>,
    pub fitness: Array2<f64>,
    pub violation: Array1<f64>,
    pub rank: Option<Array1<usize>>,
    pub crowding: Option<Array1<f64>>,
}

impl Population {
    /// Builds a population with fitness not yet assigned (all zero) and no
    /// violation; callers evaluate before using fitness-dependent methods.
    pub fn new_unevaluated(genes: Array2<f64>) -> Self {
        let n = genes.nrows();
        Self {
            genes,
            fitness: Array2::zeros((n, NUM_OBJECTIVES)),
            violation: Array1::zeros(n),
            rank: None,
            crowding: None,
        }
    }

    pub fn new(genes: Array2<f64>, fitness: Array2<f64>, violation: Array1<f64>) -> Self {
        Self {
            genes,
            fitness,
            violation,
            rank: None,
            crowding: None,
        }
    }

    pub fn get(&self, idx: usize) -> Individual<'_> {
        Individual {
            genes: self.genes.row(idx),
            fitness: self.fitness.row(idx),
            rank: self.rank.as_ref().map(|r| r[idx]),
            crowding: self.crowding.as_ref().map(|c| c[idx]),
            violation: self.violation[idx],
        }
    }

    pub fn len(&self) -> usize {
        self.genes.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn selected(&self, indices: &[usize]) -> Self {
        Self {
            genes: self.genes.select(Axis(0), indices),
            fitness: self.fitness.select(Axis(0), indices),
            violation: self.violation.select(Axis(0), indices),
            rank: self.rank.as_ref().map(|r| r.select(Axis(0), indices)),
            crowding: self.crowding.as_ref().map(|c| c.select(Axis(0), indices)),
        }
    }

    /// Individuals with rank 0 (the current non-dominated front); the whole
    /// population if no sort has been run yet.
    pub fn best(&self) -> Self {
        match &self.rank {
            Some(ranks) => {
                let indices: Vec<usize> = ranks
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &r)| if r == 0 { Some(i) } else { None })
                    .collect();
                self.selected(&indices)
            }
            None => self.clone(),
        }
    }

    pub fn set_rank(&mut self, rank: Array1<usize>) {
        self.rank = Some(rank);
    }

    pub fn set_crowding(&mut self, crowding: Array1<f64>) {
        self.crowding = Some(crowding);
    }

    pub fn merge(a: &Population, b: &Population) -> Population {
        let genes = concatenate(Axis(0), &[a.genes.view(), b.genes.view()])
            .expect("failed to merge genes");
        let fitness = concatenate(Axis(0), &[a.fitness.view(), b.fitness.view()])
            .expect("failed to merge fitness");
        let violation = concatenate(Axis(0), &[a.violation.view(), b.violation.view()])
            .expect("failed to merge violation");
        Population {
            genes,
            fitness,
            violation,
            rank: None,
            crowding: None,
        }
    }
}
