//! MOEA Core scaffolding (§3, §4.5, §5): the record types threaded through a
//! run, and the cancellation/deadline controls shared by the NSGA-II core
//! ([`nsga2`]) and the AdaVEA-MOO extension ([`adavea`]). This crate's
//! problem shape is fixed (48 genes, 3 objectives), so both loops are plain
//! concrete structs rather than the teacher's generic, macro-built engine.

pub mod adavea;
pub mod nsga2;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::archive::Archive;
use crate::error::DvaError;
use crate::genetic::Population;

/// One row of the per-generation log (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub gen: usize,
    pub time_ms: f64,
    pub hv: f64,
    pub igd_plus: f64,
    pub gd: f64,
    pub spread: f64,
    pub spacing: f64,
    pub n_pareto: usize,
    pub diversity: f64,
    pub p_m: f64,
    pub p_c: f64,
    pub best_f1: f64,
    pub best_f2: f64,
    pub best_f3: f64,
}

/// The sealed output of one independent run (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub seed: u64,
    pub final_population: Population,
    pub archive: Archive,
    pub per_generation: Vec<GenerationRecord>,
}

/// Cancellation/deadline controls (§5), checked only at generation
/// boundaries. A `None` deadline means "run to completion".
#[derive(Debug, Default)]
pub struct RunControl {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
}

impl RunControl {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            deadline: timeout.map(|d| Instant::now() + d),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn check(&self, generation: usize) -> Result<(), DvaError> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(DvaError::Cancelled { generation });
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(DvaError::Cancelled { generation });
            }
        }
        Ok(())
    }
}

/// Decision-space diversity `sigma_div` (§4.6): mean nearest-neighbour
/// Euclidean distance across the population's genes.
pub fn diversity(genes: &Array2<f64>) -> f64 {
    let n = genes.nrows();
    if n < 2 {
        return 0.0;
    }
    let rows: Vec<Vec<f64>> = genes.outer_iter().map(|r| r.to_vec()).collect();
    let sum: f64 = (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| j != i)
                .map(|j| {
                    rows[i]
                        .iter()
                        .zip(rows[j].iter())
                        .map(|(&a, &b)| (a - b).powi(2))
                        .sum::<f64>()
                        .sqrt()
                })
                .fold(f64::INFINITY, f64::min)
        })
        .sum();
    sum / n as f64
}

/// Computes the five quality indicators for one generation's rank-0 front
/// against the archive-derived reference front, reusing `metrics` (§4.7, §8).
pub(crate) fn indicators_for_front(
    front_fitness: &Array2<f64>,
    reference_front: &Array2<f64>,
) -> (f64, f64, f64, f64, f64) {
    if front_fitness.nrows() == 0 {
        return (0.0, f64::INFINITY, f64::INFINITY, 0.0, 0.0);
    }
    let reference_point = crate::metrics::reference_point(front_fitness);
    let hv = crate::metrics::hypervolume(front_fitness, &reference_point);
    let igd_plus = crate::metrics::igd_plus(front_fitness, reference_front);
    let gd = crate::metrics::generational_distance(front_fitness, reference_front);
    let spread = crate::metrics::spread(front_fitness);
    let spacing = crate::metrics::spacing(front_fitness);
    (hv, igd_plus, gd, spread, spacing)
}

/// Per-objective minima across the population's fitness block (§8's
/// `best_f1..best_f3` diagnostics), fixed here at 3 objectives matching this
/// crate's one problem shape.
pub(crate) fn best_objectives(fitness: &Array2<f64>) -> [f64; 3] {
    std::array::from_fn(|k| {
        fitness
            .column(k)
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min)
    })
}
