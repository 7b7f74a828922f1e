mod ensemble;
mod polynomial;

pub use ensemble::{EnsembleMutation, MutationStrategy};
pub use polynomial::PolynomialMutation;
