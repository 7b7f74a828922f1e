//! Configuration surface (§6, SPEC_FULL §4.9): a serializable `Config` tree
//! covering every knob of the run, validated once at construction following
//! the teacher's `AlgorithmBuilder::validate()` pattern — small `validate_*`
//! helpers called from a single `validate()` method rather than scattered
//! checks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::absorber::Bounds;
use crate::error::ConfigError;
use crate::frf::{CriterionTarget, MassTargets, NUM_DOF};
use crate::genetic::NUM_GENES;
use crate::primary::PrimaryParams;
use crate::problem::ProblemConfig;
use crate::random::RandomGenerator;
use ndarray::Array1;

fn validate_probability(value: f64, name: &'static str) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidProbability { name, value });
    }
    Ok(())
}

fn validate_positive_usize(value: usize, on_zero: ConfigError) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(on_zero);
    }
    Ok(())
}

fn validate_bounds_pair(lower: f64, upper: f64, index: usize) -> Result<(), ConfigError> {
    if lower > upper {
        return Err(ConfigError::InvalidBounds { index, lower, upper });
    }
    Ok(())
}

/// NSGA-II operator knobs (§6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nsga2Config {
    pub crossover_prob: f64,
    pub crossover_eta: f64,
    /// `None` means "1/n_var", resolved at run start.
    pub mutation_prob: Option<f64>,
    pub mutation_eta: f64,
}

impl Default for Nsga2Config {
    fn default() -> Self {
        Self {
            crossover_prob: 0.9,
            crossover_eta: 20.0,
            mutation_prob: None,
            mutation_eta: 20.0,
        }
    }
}

impl Nsga2Config {
    fn validate(&self) -> Result<(), ConfigError> {
        validate_probability(self.crossover_prob, "crossover_prob")?;
        if let Some(p) = self.mutation_prob {
            validate_probability(p, "mutation_prob")?;
        }
        Ok(())
    }

    /// Resolves `mutation_prob`, defaulting to `1/NUM_GENES` (§6).
    pub fn resolved_mutation_prob(&self) -> f64 {
        self.mutation_prob.unwrap_or(1.0 / NUM_GENES as f64)
    }
}

/// Ensemble mutation strategy identifiers (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationStrategyKind {
    Gaussian,
    Cauchy,
    CostAware,
    Sparsity,
}

/// Lamarckian/Baldwinian schedule selector for local refinement (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LamarckianSchedule {
    Linear,
    Constant,
}

/// AdaVEA-MOO extension knobs (§6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaveaConfig {
    pub init_heuristic_ratio: f64,
    pub mutation_strategies: Vec<MutationStrategyKind>,
    pub p_m_min: f64,
    pub p_m_max: f64,
    pub p_c_min: f64,
    pub p_c_max: f64,
    pub local_search_freq: usize,
    pub local_search_top_k: f64,
    pub local_search_budget: usize,
    pub lamarckian_schedule: LamarckianSchedule,
}

impl Default for AdaveaConfig {
    fn default() -> Self {
        Self {
            init_heuristic_ratio: 0.4,
            mutation_strategies: vec![
                MutationStrategyKind::Gaussian,
                MutationStrategyKind::Cauchy,
                MutationStrategyKind::CostAware,
                MutationStrategyKind::Sparsity,
            ],
            p_m_min: 0.01,
            p_m_max: 0.1,
            p_c_min: 0.5,
            p_c_max: 1.0,
            local_search_freq: 10,
            local_search_top_k: 0.1,
            local_search_budget: 10,
            lamarckian_schedule: LamarckianSchedule::Linear,
        }
    }
}

impl AdaveaConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.init_heuristic_ratio) {
            return Err(ConfigError::InvalidHeuristicRatio {
                ratio: self.init_heuristic_ratio,
            });
        }
        validate_probability(self.p_m_min, "p_m_min")?;
        validate_probability(self.p_m_max, "p_m_max")?;
        validate_probability(self.p_c_min, "p_c_min")?;
        validate_probability(self.p_c_max, "p_c_max")?;
        validate_bounds_pair(self.p_m_min, self.p_m_max, 0)?;
        validate_bounds_pair(self.p_c_min, self.p_c_max, 1)?;
        validate_probability(self.local_search_top_k, "local_search_top_k")?;
        validate_positive_usize(
            self.local_search_freq,
            ConfigError::NoGenerations {
                max_generations: self.local_search_freq,
            },
        )?;
        Ok(())
    }
}

/// A named per-mass criterion target with its weight, mirroring
/// `frf::CriterionTarget` in a serializable form (§6: "per-mass
/// target/weight dictionaries").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionTargetConfig {
    pub name: String,
    pub target: f64,
    pub weight: f64,
}

/// Problem adapter knobs (§6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemSettings {
    pub omega_start: f64,
    pub omega_end: f64,
    pub omega_points: usize,
    pub alpha_sparsity: f64,
    /// The fixed primary-structure/excitation parameters (§3). Defaults to
    /// the literal scenario S1 tuple (§8).
    pub primary: PrimaryParams,
    /// Per-gene `(lower, upper)` bounds; an entry is fixed (I3) when
    /// `lower == upper`. Must have exactly `NUM_GENES` entries.
    pub bounds: Vec<(f64, f64)>,
    /// Per-mass (1..5) criterion targets, keyed by mass index as a string so
    /// the map round-trips through `serde_json`.
    pub mass_targets: HashMap<String, Vec<CriterionTargetConfig>>,
    /// `None` means "draw once from the seeded RNG at construction" (§4.2).
    pub cost_coefficients: Option<Vec<f64>>,
}

impl Default for ProblemSettings {
    fn default() -> Self {
        Self {
            omega_start: 0.0,
            omega_end: 12000.0,
            omega_points: 1500,
            alpha_sparsity: 0.01,
            primary: PrimaryParams::scenario_s1(),
            bounds: vec![(0.0, 1.0); NUM_GENES],
            mass_targets: HashMap::new(),
            cost_coefficients: None,
        }
    }
}

impl ProblemSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        validate_bounds_pair(self.omega_start, self.omega_end, 0)?;
        validate_positive_usize(
            self.omega_points,
            ConfigError::NoGenerations {
                max_generations: self.omega_points,
            },
        )?;
        Bounds(self.bounds.clone()).validate()?;
        if let Some(costs) = &self.cost_coefficients {
            if costs.len() != NUM_GENES {
                return Err(ConfigError::InvalidBounds {
                    index: costs.len(),
                    lower: 0.0,
                    upper: NUM_GENES as f64,
                });
            }
        }
        Ok(())
    }

    /// Converts the serializable per-mass target map into the fixed-size
    /// array the FRF evaluator expects (§4.2); masses absent from the map
    /// get an empty target list (no criteria scored for that mass).
    pub fn mass_targets_array(&self) -> [MassTargets; NUM_DOF] {
        std::array::from_fn(|i| {
            let mass = i + 1;
            self.mass_targets
                .get(&mass.to_string())
                .map(|targets| {
                    targets
                        .iter()
                        .map(|t| CriterionTarget::new(t.name.clone(), t.target, t.weight))
                        .collect()
                })
                .unwrap_or_default()
        })
    }
}

/// The full run configuration (§6). Construction-time invariants are
/// enforced exclusively by [`Config::validate`]; nested structs expose no
/// public constructor other than their `Default` impl plus direct field
/// assignment, matching the teacher's builder-then-validate flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub population_size: usize,
    pub max_generations: usize,
    pub n_runs: usize,
    pub random_seed: Option<u64>,
    pub parallel_workers: usize,
    /// `A_MAX` (§3): the archive's maximum retained size, typ. 200. Not
    /// itself enumerated in §6 but required by the Archive invariant.
    pub archive_max_size: usize,
    /// Early-stop threshold on relative HV change over the trailing window
    /// (§4.5: "below 0.1% over last 50 gens", optional).
    pub early_stop_hv_tolerance: Option<f64>,
    pub early_stop_window: usize,
    pub nsga2: Nsga2Config,
    pub adavea: AdaveaConfig,
    pub problem: ProblemSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 2000,
            n_runs: 30,
            random_seed: None,
            parallel_workers: 1,
            archive_max_size: 200,
            early_stop_hv_tolerance: None,
            early_stop_window: 50,
            nsga2: Nsga2Config::default(),
            adavea: AdaveaConfig::default(),
            problem: ProblemSettings::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size < 4 {
            return Err(ConfigError::PopulationTooSmall {
                population_size: self.population_size,
            });
        }
        if self.max_generations == 0 {
            return Err(ConfigError::NoGenerations {
                max_generations: self.max_generations,
            });
        }
        validate_positive_usize(
            self.n_runs,
            ConfigError::NoGenerations {
                max_generations: self.n_runs,
            },
        )?;
        validate_positive_usize(
            self.parallel_workers,
            ConfigError::NoGenerations {
                max_generations: self.parallel_workers,
            },
        )?;
        validate_positive_usize(
            self.archive_max_size,
            ConfigError::NoGenerations {
                max_generations: self.archive_max_size,
            },
        )?;
        validate_positive_usize(
            self.early_stop_window,
            ConfigError::NoGenerations {
                max_generations: self.early_stop_window,
            },
        )?;
        if let Some(tol) = self.early_stop_hv_tolerance {
            validate_probability(tol, "early_stop_hv_tolerance")?;
        }
        self.nsga2.validate()?;
        self.adavea.validate()?;
        self.problem.validate()?;
        Ok(())
    }

    /// The per-gene bounds `(lower, upper)` pairs (§3, I3), as configured.
    pub fn bounds(&self) -> Bounds {
        Bounds(self.problem.bounds.clone())
    }

    /// Builds the frozen `ProblemConfig` the FRF evaluator runs against,
    /// drawing `cost_coefficients` from `rng` once when not explicitly
    /// configured (§4.2).
    pub fn build_problem_config(&self, rng: &mut impl RandomGenerator) -> ProblemConfig {
        let omega = Array1::linspace(
            self.problem.omega_start,
            self.problem.omega_end,
            self.problem.omega_points,
        );
        let cost_coefficients = self
            .problem
            .cost_coefficients
            .clone()
            .unwrap_or_else(|| ProblemConfig::default_cost_coefficients(rng));
        ProblemConfig::new(
            self.problem.primary,
            self.bounds(),
            omega,
            self.problem.mass_targets_array(),
            self.problem.alpha_sparsity,
            cost_coefficients,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_population_below_four() {
        let mut config = Config::default();
        config.population_size = 2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PopulationTooSmall { population_size: 2 })
        ));
    }

    #[test]
    fn rejects_zero_generations() {
        let mut config = Config::default();
        config.max_generations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_crossover_prob() {
        let mut config = Config::default();
        config.nsga2.crossover_prob = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProbability { name: "crossover_prob", .. })
        ));
    }

    #[test]
    fn rejects_inverted_p_m_range() {
        let mut config = Config::default();
        config.adavea.p_m_min = 0.2;
        config.adavea.p_m_max = 0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_heuristic_ratio_outside_unit_interval() {
        let mut config = Config::default();
        config.adavea.init_heuristic_ratio = 1.2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidHeuristicRatio { .. })
        ));
    }

    #[test]
    fn rejects_inverted_omega_range() {
        let mut config = Config::default();
        config.problem.omega_start = 100.0;
        config.problem.omega_end = 50.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn mutation_prob_defaults_to_inverse_gene_count() {
        let config = Nsga2Config::default();
        assert!((config.resolved_mutation_prob() - 1.0 / NUM_GENES as f64).abs() < 1e-12);
    }

    #[test]
    fn round_trips_through_json() {
        let config = Config::default();
        let json = serde_json::to_string(&config).expect("serialize");
        let parsed: Config = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(config, parsed);
    }
}
