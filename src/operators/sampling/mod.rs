mod heuristics;
mod uniform;

pub use heuristics::{HEURISTIC_TEMPLATES, HeuristicTemplate, sample_heuristic};
pub use uniform::UniformSampling;
