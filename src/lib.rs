//! DVA-MOO: a multi-objective optimization engine for tuning a Dynamic
//! Vibration Absorber's 48 real-valued parameters against simultaneous
//! FRF-shaping, sparsity and cost objectives (see `SPEC_FULL.md`).
//!
//! [`frf`] assembles and solves the per-frequency operator and extracts
//! the scalar criteria; [`problem`] adapts a 48-gene decision vector to the
//! three-objective fitness triple; [`sorting`] and [`archive`] are the
//! dominance kernel shared by every algorithm. [`algorithm::nsga2`] is the
//! plain generational loop; [`algorithm::adavea`] layers adaptive rates,
//! ensemble mutation and scheduled local refinement on top of it.
//! [`batch`] runs many independent seeded trials per algorithm and
//! aggregates the quality indicators in [`metrics`] into a comparison
//! table.

pub mod absorber;
pub mod algorithm;
pub mod archive;
pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod frf;
pub mod genetic;
pub mod metrics;
pub mod operators;
pub mod primary;
pub mod problem;
pub mod random;
pub mod sorting;

pub use algorithm::adavea::AdaVea;
pub use algorithm::nsga2::Nsga2;
pub use algorithm::{GenerationRecord, RunControl, RunResult};
pub use batch::{Algorithm, AlgorithmEntry, BatchResult, BatchRunner};
pub use config::Config;
pub use error::{ConfigError, DvaError};
