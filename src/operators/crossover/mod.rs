mod sbx;

pub use sbx::SBXCrossover;
