//! Batch Runner (§4.8): runs `R` independent seeded trials per algorithm and
//! aggregates the per-run quality indicators into a comparison table,
//! mirroring the teacher's coarse-grained `rayon` parallelism (no shared
//! mutable state across runs; each owns a private population, archive, RNG
//! and evaluation cache) but fanning out over whole runs rather than
//! offspring batches.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::algorithm::adavea::AdaVea;
use crate::algorithm::nsga2::Nsga2;
use crate::algorithm::{RunControl, RunResult};
use crate::error::DvaError;
use crate::genetic::Population;
use crate::sorting::fast_non_dominated_sort;

/// Default number of independent runs per (algorithm, problem) pair (§4.8).
pub const DEFAULT_NUM_RUNS: usize = 30;

/// Tagged-variant wrapper standing in for the teacher's generic, trait-object
/// algorithm handle: this crate only ever runs one of two concrete loops, so
/// an enum keeps dispatch static and exhaustive-matchable rather than paying
/// for dynamic dispatch over a single-method trait.
#[derive(Debug, Clone)]
pub enum Algorithm {
    Nsga2(Nsga2),
    AdaVea(AdaVea),
}

impl Algorithm {
    pub fn run(&self, seed: u64, control: &RunControl) -> Result<RunResult, DvaError> {
        match self {
            Algorithm::Nsga2(a) => a.run(seed, control),
            Algorithm::AdaVea(a) => a.run(seed, control),
        }
    }
}

/// A named algorithm configuration entered into a batch comparison.
#[derive(Debug, Clone)]
pub struct AlgorithmEntry {
    pub name: String,
    pub algorithm: Algorithm,
}

impl AlgorithmEntry {
    pub fn new(name: impl Into<String>, algorithm: Algorithm) -> Self {
        Self {
            name: name.into(),
            algorithm,
        }
    }
}

/// Hypervolume/IGD+/spread/spacing computed for one run's final rank-0 front
/// against the batch's pseudo-reference front.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunMetrics {
    pub hv: f64,
    pub igd_plus: f64,
    pub spread: f64,
    pub spacing: f64,
}

/// Mean/std/median/CI95 plus, when a baseline is designated, Cohen's d
/// against it (§3's `BatchResult.summary`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub std: f64,
    pub median: f64,
    pub ci95: (f64, f64),
    pub cohens_d_vs_baseline: Option<f64>,
}

/// One algorithm's batch outcome: its completed runs, the runs that errored
/// out and were excluded from aggregation (§7), and the per-metric summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    pub name: String,
    pub runs: Vec<RunResult>,
    pub failed_seeds: Vec<u64>,
    pub per_run_metrics: Vec<RunMetrics>,
    pub summary: HashMap<String, MetricSummary>,
}

/// A pairwise statistical comparison between two algorithms on one metric.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PairwiseComparison {
    pub metric_index: usize,
    pub wilcoxon_p: f64,
    pub wilcoxon_p_bonferroni: f64,
    pub cohens_d: f64,
}

/// The sealed output of a batch comparison across one or more algorithms
/// on a shared problem (§3's `BatchResult`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub algorithms: Vec<AlgorithmResult>,
    /// Keyed by `(algorithm_a, algorithm_b, metric_name)`. Note: this map has
    /// no `serde_json` representation (JSON object keys must be strings); it
    /// round-trips through any format with native non-string map keys
    /// (e.g. `bincode`), consistent with §6's "any columnar/key-value format
    /// accepted" persistence contract.
    pub pairwise: HashMap<(String, String, String), PairwiseComparison>,
}

const METRIC_NAMES: [&str; 4] = ["hv", "igd_plus", "spread", "spacing"];

/// Orchestrates `num_runs` independent seeded trials per algorithm. Runs
/// within a batch execute in parallel `rayon` tasks, bounded to
/// `parallel_workers` threads; each owns a private population, archive, RNG
/// and evaluation cache, so no run observes another's state (§4.8's "no
/// shared mutable state between runs").
#[derive(Debug, Clone)]
pub struct BatchRunner {
    pub num_runs: usize,
    pub base_seed: u64,
    pub parallel_workers: usize,
}

impl BatchRunner {
    pub fn new(num_runs: usize, base_seed: u64, parallel_workers: usize) -> Self {
        Self {
            num_runs,
            base_seed,
            parallel_workers,
        }
    }

    /// Runs one algorithm's `num_runs` trials and returns every
    /// `RunResult`, paired with the seed that produced each failure. Fans
    /// out inside a scoped pool capped at `parallel_workers` so the config
    /// knob actually bounds concurrency instead of using rayon's global pool.
    fn execute_runs(&self, algorithm: &Algorithm) -> (Vec<RunResult>, Vec<u64>) {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallel_workers)
            .build()
            .expect("failed to build bounded rayon thread pool");

        let outcomes: Vec<Result<RunResult, (u64, DvaError)>> = pool.install(|| {
            (0..self.num_runs)
                .into_par_iter()
                .map(|r| {
                    let seed = self.base_seed + r as u64;
                    let control = RunControl::new(None);
                    algorithm.run(seed, &control).map_err(|e| (seed, e))
                })
                .collect()
        });

        let mut runs = Vec::with_capacity(self.num_runs);
        let mut failed_seeds = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(run) => runs.push(run),
                Err((seed, err)) => {
                    log::warn!("batch run seed={} failed and was excluded: {}", seed, err);
                    failed_seeds.push(seed);
                }
            }
        }
        (runs, failed_seeds)
    }

    /// Builds the pseudo-reference front used for IGD+: the non-dominated
    /// union of every completed run's archive across the whole comparison.
    /// No analytical true Pareto front exists for this problem, so the
    /// best observed approximation stands in for it, following the common
    /// benchmarking convention when the true front is unknown.
    fn pseudo_front(algorithm_runs: &[&[RunResult]]) -> Population {
        let mut union: Option<Population> = None;
        for runs in algorithm_runs {
            for run in *runs {
                union = Some(match union {
                    None => run.archive.population.clone(),
                    Some(acc) => Population::merge(&acc, &run.archive.population),
                });
            }
        }
        let union = union.unwrap_or_else(|| {
            Population::new(
                ndarray::Array2::zeros((0, crate::genetic::NUM_GENES)),
                ndarray::Array2::zeros((0, crate::genetic::NUM_OBJECTIVES)),
                ndarray::Array1::zeros(0),
            )
        });
        if union.is_empty() {
            return union;
        }
        let fronts = fast_non_dominated_sort(&union);
        let rank0 = fronts.first().cloned().unwrap_or_default();
        union.selected(&rank0)
    }

    fn run_metrics(run: &RunResult, reference_front: &Population) -> RunMetrics {
        let front = run.final_population.best();
        if front.is_empty() {
            return RunMetrics {
                hv: 0.0,
                igd_plus: f64::INFINITY,
                spread: 0.0,
                spacing: 0.0,
            };
        }
        let reference_point = crate::metrics::reference_point(&front.fitness);
        RunMetrics {
            hv: crate::metrics::hypervolume(&front.fitness, &reference_point),
            igd_plus: crate::metrics::igd_plus(&front.fitness, &reference_front.fitness),
            spread: crate::metrics::spread(&front.fitness),
            spacing: crate::metrics::spacing(&front.fitness),
        }
    }

    fn metric_value(metrics: &RunMetrics, name: &str) -> f64 {
        match name {
            "hv" => metrics.hv,
            "igd_plus" => metrics.igd_plus,
            "spread" => metrics.spread,
            "spacing" => metrics.spacing,
            _ => unreachable!("unknown metric name {name}"),
        }
    }

    /// Runs every entry's batch of trials and, when more than one entry is
    /// given, computes the pairwise Wilcoxon/Cohen's-d/Bonferroni
    /// comparison table against `entries[0]` as the designated baseline
    /// (§4.8).
    pub fn compare(&self, entries: &[AlgorithmEntry]) -> BatchResult {
        let raw: Vec<(Vec<RunResult>, Vec<u64>)> = entries
            .iter()
            .map(|entry| {
                let (runs, failed) = self.execute_runs(&entry.algorithm);
                if !failed.is_empty() {
                    log::warn!(
                        "algorithm {} had {} failed run(s) out of {}",
                        entry.name,
                        failed.len(),
                        self.num_runs
                    );
                }
                (runs, failed)
            })
            .collect();

        let refs: Vec<&[RunResult]> = raw.iter().map(|(runs, _)| runs.as_slice()).collect();
        let reference_front = Self::pseudo_front(&refs);

        let mut algorithms: Vec<AlgorithmResult> = Vec::with_capacity(entries.len());
        for (entry, (runs, failed_seeds)) in entries.iter().zip(raw.into_iter()) {
            let per_run_metrics: Vec<RunMetrics> = runs
                .iter()
                .map(|r| Self::run_metrics(r, &reference_front))
                .collect();
            let summary = METRIC_NAMES
                .iter()
                .map(|&name| {
                    let values: Vec<f64> = per_run_metrics
                        .iter()
                        .map(|m| Self::metric_value(m, name))
                        .filter(|v| v.is_finite())
                        .collect();
                    (name.to_string(), summarize(&values, None))
                })
                .collect();
            algorithms.push(AlgorithmResult {
                name: entry.name.clone(),
                runs,
                failed_seeds,
                per_run_metrics,
                summary,
            });
        }

        let mut pairwise = HashMap::new();
        if let Some(baseline) = algorithms.first().cloned() {
            let num_pairs = if entries.len() >= 2 {
                entries.len() * (entries.len() - 1) / 2
            } else {
                1
            };
            for i in 0..algorithms.len() {
                for j in (i + 1)..algorithms.len() {
                    for &name in METRIC_NAMES.iter() {
                        let a_values: Vec<f64> = algorithms[i]
                            .per_run_metrics
                            .iter()
                            .map(|m| Self::metric_value(m, name))
                            .filter(|v| v.is_finite())
                            .collect();
                        let b_values: Vec<f64> = algorithms[j]
                            .per_run_metrics
                            .iter()
                            .map(|m| Self::metric_value(m, name))
                            .filter(|v| v.is_finite())
                            .collect();
                        let p = wilcoxon_rank_sum_p(&a_values, &b_values);
                        let d = cohens_d(&a_values, &b_values);
                        pairwise.insert(
                            (
                                algorithms[i].name.clone(),
                                algorithms[j].name.clone(),
                                name.to_string(),
                            ),
                            PairwiseComparison {
                                metric_index: METRIC_NAMES
                                    .iter()
                                    .position(|&n| n == name)
                                    .unwrap(),
                                wilcoxon_p: p,
                                wilcoxon_p_bonferroni: (p * num_pairs as f64).min(1.0),
                                cohens_d: d,
                            },
                        );
                    }
                }
            }
            for algo in algorithms.iter_mut() {
                if algo.name == baseline.name {
                    continue;
                }
                for &name in METRIC_NAMES.iter() {
                    let baseline_values: Vec<f64> = baseline
                        .per_run_metrics
                        .iter()
                        .map(|m| Self::metric_value(m, name))
                        .filter(|v| v.is_finite())
                        .collect();
                    let values: Vec<f64> = algo
                        .per_run_metrics
                        .iter()
                        .map(|m| Self::metric_value(m, name))
                        .filter(|v| v.is_finite())
                        .collect();
                    let d = cohens_d(&values, &baseline_values);
                    if let Some(s) = algo.summary.get_mut(name) {
                        s.cohens_d_vs_baseline = Some(d);
                    }
                }
            }
        }

        BatchResult {
            algorithms,
            pairwise,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Normal-approximation 95% confidence interval around the mean.
fn ci95(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let m = mean(values);
    let se = sample_std(values) / (values.len() as f64).sqrt();
    const Z_975: f64 = 1.959963984540054;
    (m - Z_975 * se, m + Z_975 * se)
}

fn summarize(values: &[f64], cohens_d_vs_baseline: Option<f64>) -> MetricSummary {
    MetricSummary {
        mean: mean(values),
        std: sample_std(values),
        median: median(values),
        ci95: ci95(values),
        cohens_d_vs_baseline,
    }
}

/// Cohen's d using the pooled standard deviation (§4.8: "Cohen's d (pooled
/// std)").
fn cohens_d(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let na = a.len() as f64;
    let nb = b.len() as f64;
    let sa = sample_std(a);
    let sb = sample_std(b);
    let pooled_var = ((na - 1.0) * sa.powi(2) + (nb - 1.0) * sb.powi(2)) / (na + nb - 2.0).max(1.0);
    let pooled_std = pooled_var.sqrt();
    if pooled_std < 1e-12 {
        return 0.0;
    }
    (mean(a) - mean(b)) / pooled_std
}

/// Standard normal CDF via Abramowitz & Stegun 7.1.26, accurate to ~1.5e-7.
fn standard_normal_cdf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs() / std::f64::consts::SQRT_2;
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;
    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    0.5 * (1.0 + sign * y)
}

/// Wilcoxon rank-sum (Mann-Whitney) two-sided p-value, normal approximation
/// with a tie correction, computed from ranks rather than means (§4.8, §8's
/// S6 scenario explicitly tests this).
fn wilcoxon_rank_sum_p(a: &[f64], b: &[f64]) -> f64 {
    let na = a.len();
    let nb = b.len();
    if na == 0 || nb == 0 {
        return 1.0;
    }
    let mut combined: Vec<(f64, usize)> = a
        .iter()
        .map(|&v| (v, 0usize))
        .chain(b.iter().map(|&v| (v, 1usize)))
        .collect();
    combined.sort_by(|x, y| x.0.partial_cmp(&y.0).unwrap());

    let n = combined.len();
    let mut ranks = vec![0.0; n];
    let mut i = 0;
    let mut tie_correction = 0.0;
    while i < n {
        let mut j = i;
        while j + 1 < n && (combined[j + 1].0 - combined[i].0).abs() < 1e-12 {
            j += 1;
        }
        let tie_count = (j - i + 1) as f64;
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for rank in ranks.iter_mut().take(j + 1).skip(i) {
            *rank = avg_rank;
        }
        if tie_count > 1.0 {
            tie_correction += tie_count.powi(3) - tie_count;
        }
        i = j + 1;
    }

    let rank_sum_a: f64 = combined
        .iter()
        .zip(ranks.iter())
        .filter(|((_, group), _)| *group == 0)
        .map(|(_, &r)| r)
        .sum();

    let na_f = na as f64;
    let nb_f = nb as f64;
    let u_a = rank_sum_a - na_f * (na_f + 1.0) / 2.0;
    let mean_u = na_f * nb_f / 2.0;
    let n_total = na_f + nb_f;
    let variance_u = (na_f * nb_f / 12.0)
        * ((n_total + 1.0) - tie_correction / (n_total * (n_total - 1.0)).max(1.0));
    if variance_u <= 0.0 {
        return 1.0;
    }
    let std_u = variance_u.sqrt();

    let continuity = if u_a > mean_u {
        -0.5
    } else if u_a < mean_u {
        0.5
    } else {
        0.0
    };
    let z = (u_a - mean_u + continuity) / std_u;
    let p = 2.0 * (1.0 - standard_normal_cdf(z.abs()));
    p.clamp(0.0, 1.0)
}
