pub mod environment;
pub mod scoring;

pub use environment::{ConnectionStatus, EnvironmentalDataService};
pub use scoring::recommend_crops;
