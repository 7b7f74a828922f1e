mod tournament;

pub use tournament::TournamentSelection;
