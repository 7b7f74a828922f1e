//! Crate-wide error types (§7). `DvaError` follows the teacher's
//! `thiserror`-derived style; `ConfigError` follows its manual
//! `Display`/`Error`/`From` style, matching the mixed texture observed
//! across its own error modules.

use std::fmt;

use thiserror::Error;

/// Runtime errors raised while evaluating or running the search. Of these,
/// only `FrfUnsolvable` and `EvaluationTimeout` are local-recovery
/// (substituted with a fitness penalty inside the evaluator, §7); the rest
/// propagate to the batch runner, which marks the affected run as failed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DvaError {
    #[error("FRF operator singular at frequency index {freq_index} (omega = {omega})")]
    FrfUnsolvable { freq_index: usize, omega: f64 },

    #[error("all degrees of freedom were inactive after DOF reduction")]
    AllDofInactive,

    #[error("FRF evaluation at omega = {omega} exceeded its per-call time budget")]
    EvaluationTimeout { omega: f64 },

    #[error("run cancelled at generation {generation}")]
    Cancelled { generation: usize },
}

/// Configuration-validation errors, fatal at construction time (§7).
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidBounds { index: usize, lower: f64, upper: f64 },
    PopulationTooSmall { population_size: usize },
    NoGenerations { max_generations: usize },
    InvalidHeuristicRatio { ratio: f64 },
    InvalidProbability { name: &'static str, value: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidBounds {
                index,
                lower,
                upper,
            } => write!(
                f,
                "bound {index} is inconsistent: lower ({lower}) > upper ({upper})"
            ),
            ConfigError::PopulationTooSmall { population_size } => write!(
                f,
                "population_size must be >= 4, got {population_size}"
            ),
            ConfigError::NoGenerations { max_generations } => {
                write!(f, "max_generations must be >= 1, got {max_generations}")
            }
            ConfigError::InvalidHeuristicRatio { ratio } => write!(
                f,
                "init_heuristic_ratio must be within [0, 1], got {ratio}"
            ),
            ConfigError::InvalidProbability { name, value } => {
                write!(f, "{name} must be within [0, 1], got {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
