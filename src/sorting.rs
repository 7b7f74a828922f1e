//! Fast non-dominated sorting, crowding distance and environmental
//! selection (§4.3), the kernel shared by NSGA-II and AdaVEA-MOO.

use ndarray::Array1;

use crate::genetic::{Individual, Population};

/// Minimization dominance with the constrained-comparison clause of §4.3.
/// In this crate constraint violation is always zero (§4.2), so this
/// reduces to ordinary Pareto dominance, but the clause is kept explicit so
/// the kernel matches the stated contract even if a future problem adapter
/// introduces a real violation.
pub fn dominates(a: &Individual<'_>, b: &Individual<'_>) -> bool {
    let violation_ok = if a.violation == 0.0 && b.violation == 0.0 {
        true
    } else {
        a.violation < b.violation
    };
    if !violation_ok {
        return false;
    }
    let mut strictly_better = false;
    for k in 0..a.fitness.len() {
        if a.fitness[k] > b.fitness[k] {
            return false;
        }
        if a.fitness[k] < b.fitness[k] {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Deb (2002) fast non-dominated sort. Returns fronts as vectors of row
/// indices into `population`, rank 0 first. Iteration is over ascending
/// original indices throughout, so results are deterministic regardless of
/// evaluation order (§5's ordering guarantee).
pub fn fast_non_dominated_sort(population: &Population) -> Vec<Vec<usize>> {
    let n = population.len();
    let individuals: Vec<Individual<'_>> = (0..n).map(|i| population.get(i)).collect();

    let mut domination_count = vec![0usize; n];
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut fronts: Vec<Vec<usize>> = vec![Vec::new()];

    for p in 0..n {
        for q in 0..n {
            if p == q {
                continue;
            }
            if dominates(&individuals[p], &individuals[q]) {
                dominated_by[p].push(q);
            } else if dominates(&individuals[q], &individuals[p]) {
                domination_count[p] += 1;
            }
        }
        if domination_count[p] == 0 {
            fronts[0].push(p);
        }
    }

    let mut i = 0;
    while !fronts[i].is_empty() {
        let mut next_front = Vec::new();
        for &p in &fronts[i] {
            for &q in &dominated_by[p] {
                domination_count[q] -= 1;
                if domination_count[q] == 0 {
                    next_front.push(q);
                }
            }
        }
        i += 1;
        fronts.push(next_front);
    }
    fronts.pop();
    fronts
}

/// Crowding distance for one front (§4.3): fronts of size <= 2 get all
/// `+infinity`; larger fronts get per-objective boundary `+infinity` and an
/// interior normalized neighbour-gap sum. An objective whose front is
/// constant (`max == min`) contributes 0, not NaN.
pub fn crowding_distance(population: &Population, front: &[usize]) -> Vec<f64> {
    let n = front.len();
    if n == 0 {
        return Vec::new();
    }
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }

    let m = population.fitness.ncols();
    let mut distances = vec![0.0f64; n];

    for k in 0..m {
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            let fa = population.fitness[[front[a], k]];
            let fb = population.fitness[[front[b], k]];
            fa.partial_cmp(&fb).unwrap()
        });
        let f_min = population.fitness[[front[order[0]], k]];
        let f_max = population.fitness[[front[order[n - 1]], k]];
        distances[order[0]] = f64::INFINITY;
        distances[order[n - 1]] = f64::INFINITY;

        let range = f_max - f_min;
        if range.abs() < 1e-12 {
            continue;
        }
        for w in 1..n - 1 {
            if distances[order[w]].is_infinite() {
                continue;
            }
            let prev = population.fitness[[front[order[w - 1]], k]];
            let next = population.fitness[[front[order[w + 1]], k]];
            distances[order[w]] += (next - prev) / range;
        }
    }
    distances
}

/// Environmental selection from a combined 2N set (§4.3): takes whole
/// fronts until the next would overflow `num_survive`, then fills the
/// remainder from the splitting front by descending crowding distance, ties
/// broken by original index.
pub fn environmental_selection(population: &Population, num_survive: usize) -> Population {
    let fronts = fast_non_dominated_sort(population);
    let n = population.len();
    let mut rank_of = vec![0usize; n];
    for (rank, front) in fronts.iter().enumerate() {
        for &i in front {
            rank_of[i] = rank;
        }
    }

    let mut survivors: Vec<usize> = Vec::with_capacity(num_survive.min(n));
    let mut crowding_of = vec![0.0f64; n];

    for front in &fronts {
        if survivors.len() + front.len() <= num_survive {
            let cd = crowding_distance(population, front);
            for (local, &i) in front.iter().enumerate() {
                crowding_of[i] = cd[local];
            }
            survivors.extend(front.iter().copied());
        } else {
            let remaining = num_survive - survivors.len();
            let cd = crowding_distance(population, front);
            for (local, &i) in front.iter().enumerate() {
                crowding_of[i] = cd[local];
            }
            let mut order: Vec<usize> = (0..front.len()).collect();
            order.sort_by(|&a, &b| cd[b].partial_cmp(&cd[a]).unwrap().then(a.cmp(&b)));
            survivors.extend(order.into_iter().take(remaining).map(|local| front[local]));
            break;
        }
    }

    let mut selected = population.selected(&survivors);
    let rank_arr = Array1::from_iter(survivors.iter().map(|&i| rank_of[i]));
    let crowd_arr = Array1::from_iter(survivors.iter().map(|&i| crowding_of[i]));
    selected.set_rank(rank_arr);
    selected.set_crowding(crowd_arr);
    selected
}
