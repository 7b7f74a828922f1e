//! Quality indicators captured per generation into `GenerationRecord` (§4.7):
//! hypervolume (WFG-style exact slicing, m=3), IGD+, spread, and spacing.
//! All four assume minimization and operate on `Array2<f64>` objective
//! blocks, consistent with the rest of the crate (§4.3).

use ndarray::{Array1, Array2, Axis};

/// Per-objective reference point `r_k = max_k(front) + 0.1 * range_k` (§4.7),
/// snapshot from the final archive and held fixed for the remainder of a run.
pub fn reference_point(front: &Array2<f64>) -> Array1<f64> {
    let m = front.ncols();
    Array1::from_iter((0..m).map(|k| {
        let column = front.column(k);
        let min = column.fold(f64::INFINITY, |a, &b| a.min(b));
        let max = column.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let range = max - min;
        max + 0.1 * range
    }))
}

/// Exact dominated hypervolume of a 3-objective minimization front against a
/// reference point, via the slicing algorithm (Fonseca et al. 2006): sort by
/// the third objective, sweep slabs of constant active set, and accumulate
/// each slab's 2D dominated area times its depth.
pub fn hypervolume(front: &Array2<f64>, reference: &Array1<f64>) -> f64 {
    assert_eq!(front.ncols(), 3, "hypervolume is implemented for m=3 only");
    assert_eq!(reference.len(), 3);

    let mut points: Vec<(f64, f64, f64)> = front
        .axis_iter(Axis(0))
        .filter_map(|row| {
            let (x, y, z) = (row[0], row[1], row[2]);
            if x < reference[0] && y < reference[1] && z < reference[2] {
                Some((x, y, z))
            } else {
                None
            }
        })
        .collect();
    if points.is_empty() {
        return 0.0;
    }
    points.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap());

    let mut active: Vec<(f64, f64)> = Vec::with_capacity(points.len());
    let mut volume = 0.0;
    for i in 0..points.len() {
        let (x, y, z) = points[i];
        active.push((x, y));
        let next_z = if i + 1 < points.len() { points[i + 1].2 } else { reference[2] };
        let depth = next_z - z;
        if depth <= 0.0 {
            continue;
        }
        volume += depth * area_2d_dominated(&active, reference[0], reference[1]);
    }
    volume
}

/// Area dominated by a set of 2D points anchored at a common corner
/// `(rx, ry)`, i.e. `union_i [x_i, rx] x [y_i, ry]`.
fn area_2d_dominated(points: &[(f64, f64)], rx: f64, ry: f64) -> f64 {
    let mut sorted: Vec<(f64, f64)> = points.to_vec();
    sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    let mut area = 0.0;
    let mut min_y = f64::INFINITY;
    for i in 0..sorted.len() {
        let (x, y) = sorted[i];
        min_y = min_y.min(y);
        let next_x = if i + 1 < sorted.len() { sorted[i + 1].0 } else { rx };
        let width = next_x - x;
        let height = ry - min_y;
        if width > 0.0 && height > 0.0 {
            area += width * height;
        }
    }
    area
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(&u, &v)| (u - v).powi(2)).sum::<f64>().sqrt()
}

fn manhattan(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(&u, &v)| (u - v).abs()).sum()
}

/// IGD+ (Ishibuchi et al. 2015): for minimization, the directed distance from
/// reference point `z` to solution `a` only penalizes coordinates where `a`
/// is worse than `z`. If no external reference front is supplied, the caller
/// passes the pseudo-front (union of all algorithms' archives across seeds,
/// §4.7) in its place.
pub fn igd_plus(front: &Array2<f64>, reference_front: &Array2<f64>) -> f64 {
    if reference_front.nrows() == 0 {
        return 0.0;
    }
    if front.nrows() == 0 {
        return f64::INFINITY;
    }
    let sum: f64 = reference_front
        .axis_iter(Axis(0))
        .map(|z| {
            front
                .axis_iter(Axis(0))
                .map(|a| {
                    z.iter()
                        .zip(a.iter())
                        .map(|(&zk, &ak)| (ak - zk).max(0.0).powi(2))
                        .sum::<f64>()
                        .sqrt()
                })
                .fold(f64::INFINITY, f64::min)
        })
        .sum();
    sum / reference_front.nrows() as f64
}

/// Generational distance (Van Veldhuizen & Lamont 1998): root-mean-square
/// Euclidean distance from each front member to its nearest reference-front
/// point. Unlike IGD+, this is undirected (no dominance clamp) since it
/// measures how far the front itself sits from the reference, not coverage.
pub fn generational_distance(front: &Array2<f64>, reference_front: &Array2<f64>) -> f64 {
    if front.nrows() == 0 {
        return f64::INFINITY;
    }
    if reference_front.nrows() == 0 {
        return 0.0;
    }
    let sum_sq: f64 = front
        .axis_iter(Axis(0))
        .map(|a| {
            reference_front
                .axis_iter(Axis(0))
                .map(|z| {
                    a.iter()
                        .zip(z.iter())
                        .map(|(&ak, &zk)| (ak - zk).powi(2))
                        .sum::<f64>()
                })
                .fold(f64::INFINITY, f64::min)
        })
        .sum();
    (sum_sq / front.nrows() as f64).sqrt()
}

/// Schott's spacing (SP): standard deviation of nearest-neighbor L1
/// distances across the front. Zero for a perfectly uniform front.
pub fn spacing(front: &Array2<f64>) -> f64 {
    let n = front.nrows();
    if n < 2 {
        return 0.0;
    }
    let rows: Vec<Vec<f64>> = front.axis_iter(Axis(0)).map(|r| r.to_vec()).collect();
    let distances: Vec<f64> = (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| j != i)
                .map(|j| manhattan(&rows[i], &rows[j]))
                .fold(f64::INFINITY, f64::min)
        })
        .collect();
    let mean = distances.iter().sum::<f64>() / n as f64;
    let variance = distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

/// Spread (Δ), generalized from Deb's two-objective diversity metric to `m`
/// objectives. In the absence of a true reference front, the per-objective
/// extreme points of the front itself stand in for the boundary anchors: the
/// two largest nearest-neighbor distances among those extremes play the role
/// of `d_f`/`d_l`, and the interior term is the mean-absolute-deviation of
/// nearest-neighbor distances over the whole front.
pub fn spread(front: &Array2<f64>) -> f64 {
    let n = front.nrows();
    if n < 2 {
        return 0.0;
    }
    let m = front.ncols();
    let rows: Vec<Vec<f64>> = front.axis_iter(Axis(0)).map(|r| r.to_vec()).collect();
    let nn_distances: Vec<f64> = (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| j != i)
                .map(|j| euclidean(&rows[i], &rows[j]))
                .fold(f64::INFINITY, f64::min)
        })
        .collect();
    let mean_nn = nn_distances.iter().sum::<f64>() / n as f64;
    let deviation_sum: f64 = nn_distances.iter().map(|d| (d - mean_nn).abs()).sum();

    let mut extreme_indices: Vec<usize> = (0..m)
        .map(|k| {
            (0..n)
                .min_by(|&a, &b| rows[a][k].partial_cmp(&rows[b][k]).unwrap())
                .unwrap()
        })
        .collect();
    extreme_indices.sort_unstable();
    extreme_indices.dedup();

    let mut boundary: Vec<f64> = extreme_indices.iter().map(|&i| nn_distances[i]).collect();
    boundary.sort_by(|a, b| b.partial_cmp(a).unwrap());
    let d_f = boundary.first().copied().unwrap_or(0.0);
    let d_l = boundary.get(1).copied().unwrap_or(d_f);

    let denominator = d_f + d_l + (n - 1) as f64 * mean_nn;
    if denominator == 0.0 {
        return 0.0;
    }
    (d_f + d_l + deviation_sum) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn reference_point_adds_ten_percent_margin() {
        let front = array![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];
        let r = reference_point(&front);
        assert!((r[0] - 1.1).abs() < 1e-12);
    }

    #[test]
    fn hypervolume_of_single_point_matches_box_volume() {
        let front = array![[0.0, 0.0, 0.0]];
        let reference = Array1::from(vec![1.0, 1.0, 1.0]);
        assert!((hypervolume(&front, &reference) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn hypervolume_of_two_non_dominated_points() {
        let front = array![[0.0, 1.0, 0.5], [1.0, 0.0, 0.5]];
        let reference = Array1::from(vec![2.0, 2.0, 2.0]);
        let hv = hypervolume(&front, &reference);
        // Each point alone covers 2*2*1.5 = 6; union is less than the sum (4+
        // overlap region) but strictly greater than either single box.
        assert!(hv > 6.0 && hv < 12.0);
    }

    #[test]
    fn hypervolume_ignores_points_outside_reference_box() {
        let front = array![[3.0, 3.0, 3.0]];
        let reference = Array1::from(vec![2.0, 2.0, 2.0]);
        assert_eq!(hypervolume(&front, &reference), 0.0);
    }

    #[test]
    fn igd_plus_is_zero_when_front_covers_reference_exactly() {
        let front = array![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];
        let reference = front.clone();
        assert!(igd_plus(&front, &reference) < 1e-12);
    }

    #[test]
    fn igd_plus_penalizes_missing_coverage() {
        let front = array![[5.0, 5.0, 5.0]];
        let reference = array![[0.0, 0.0, 0.0]];
        assert!(igd_plus(&front, &reference) > 0.0);
    }

    #[test]
    fn generational_distance_is_zero_when_front_matches_reference() {
        let front = array![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];
        let reference = front.clone();
        assert!(generational_distance(&front, &reference) < 1e-12);
    }

    #[test]
    fn generational_distance_is_positive_when_front_is_off_reference() {
        let front = array![[5.0, 5.0, 5.0]];
        let reference = array![[0.0, 0.0, 0.0]];
        assert!(generational_distance(&front, &reference) > 0.0);
    }

    #[test]
    fn spacing_is_zero_for_degenerate_front() {
        let front = array![[0.0, 0.0, 0.0]];
        assert_eq!(spacing(&front), 0.0);
    }

    #[test]
    fn spacing_is_zero_for_perfectly_uniform_front() {
        let front = array![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]];
        assert!(spacing(&front) < 1e-9);
    }

    #[test]
    fn spread_is_zero_for_degenerate_front() {
        let front = array![[0.0, 0.0, 0.0]];
        assert_eq!(spread(&front), 0.0);
    }

    #[test]
    fn spread_is_finite_for_irregular_front() {
        let front = array![[0.0, 1.0, 2.0], [1.0, 0.0, 3.0], [2.0, 2.0, 0.0], [5.0, 5.0, 5.0]];
        let value = spread(&front);
        assert!(value.is_finite() && value >= 0.0);
    }
}
