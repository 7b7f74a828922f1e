//! Archive (§3, §9): the growing set of non-dominated solutions observed
//! across all generations of one run, bounded by `A_MAX` with crowding-based
//! truncation identical to the environmental-selection rule.

use std::collections::HashSet;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::genetic::{Individual, NUM_GENES, NUM_OBJECTIVES, Population};
use crate::sorting::{crowding_distance, dominates};
use ndarray::{Array1, Array2};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Archive {
    pub population: Population,
    pub max_size: usize,
}

impl Archive {
    pub fn new(max_size: usize) -> Self {
        Self {
            population: Population::new(
                Array2::zeros((0, NUM_GENES)),
                Array2::zeros((0, NUM_OBJECTIVES)),
                Array1::zeros(0),
            ),
            max_size,
        }
    }

    pub fn len(&self) -> usize {
        self.population.len()
    }

    pub fn is_empty(&self) -> bool {
        self.population.is_empty()
    }

    /// Merges `candidates` into the archive, prunes dominated members
    /// (I4/P4), deduplicates exact-fitness repeats, and truncates to
    /// `max_size` using descending crowding distance when still oversize
    /// (R3: inserting an already-dominated candidate leaves the archive
    /// unchanged, since it is discarded by the dominance prune below).
    pub fn insert(&mut self, candidates: &Population) {
        if candidates.is_empty() {
            return;
        }
        let merged = if self.population.is_empty() {
            candidates.clone()
        } else {
            Population::merge(&self.population, candidates)
        };

        let n = merged.len();
        let individuals: Vec<Individual<'_>> = (0..n).map(|i| merged.get(i)).collect();
        let mut keep = vec![true; n];
        for i in 0..n {
            if !keep[i] {
                continue;
            }
            for j in 0..n {
                if i == j || !keep[j] {
                    continue;
                }
                if dominates(&individuals[i], &individuals[j]) {
                    keep[j] = false;
                }
            }
        }

        let mut seen: HashSet<Vec<OrderedFloat<f64>>> = HashSet::new();
        let mut indices: Vec<usize> = Vec::new();
        for i in 0..n {
            if !keep[i] {
                continue;
            }
            let key: Vec<OrderedFloat<f64>> = merged
                .fitness
                .row(i)
                .iter()
                .map(|&v| OrderedFloat(v))
                .collect();
            if seen.insert(key) {
                indices.push(i);
            }
        }

        let pruned = merged.selected(&indices);
        self.population = if pruned.len() > self.max_size {
            let front: Vec<usize> = (0..pruned.len()).collect();
            let cd = crowding_distance(&pruned, &front);
            let mut order: Vec<usize> = (0..pruned.len()).collect();
            order.sort_by(|&a, &b| cd[b].partial_cmp(&cd[a]).unwrap().then(a.cmp(&b)));
            let keep_indices: Vec<usize> = order.into_iter().take(self.max_size).collect();
            pruned.selected(&keep_indices)
        } else {
            pruned
        };
    }

    /// P4: no member dominates another.
    pub fn is_dominance_free(&self) -> bool {
        let n = self.population.len();
        let individuals: Vec<Individual<'_>> = (0..n).map(|i| self.population.get(i)).collect();
        for i in 0..n {
            for j in 0..n {
                if i != j && dominates(&individuals[i], &individuals[j]) {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn pop(fitness: Array2<f64>) -> Population {
        let n = fitness.nrows();
        Population::new(Array2::zeros((n, NUM_GENES)), fitness, Array1::zeros(n))
    }

    #[test]
    fn insert_prunes_dominated_members() {
        let mut archive = Archive::new(10);
        archive.insert(&pop(array![[2.0, 2.0, 0.0]]));
        assert_eq!(archive.len(), 1);
        // Dominates the existing member: should replace it.
        archive.insert(&pop(array![[1.0, 1.0, 0.0]]));
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.population.fitness.row(0), array![1.0, 1.0, 0.0]);
    }

    #[test]
    fn insert_of_dominated_candidate_leaves_archive_unchanged() {
        let mut archive = Archive::new(10);
        archive.insert(&pop(array![[1.0, 1.0, 0.0]]));
        archive.insert(&pop(array![[2.0, 2.0, 0.0]]));
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.population.fitness.row(0), array![1.0, 1.0, 0.0]);
    }

    #[test]
    fn archive_never_exceeds_max_size() {
        let mut archive = Archive::new(3);
        let fitness = array![
            [0.0, 3.0, 0.0],
            [1.0, 2.0, 0.0],
            [2.0, 1.0, 0.0],
            [3.0, 0.0, 0.0],
        ];
        archive.insert(&pop(fitness));
        assert_eq!(archive.len(), 3);
        assert!(archive.is_dominance_free());
    }
}
