pub mod assembler;
pub mod limits;
pub mod query_engine;
pub mod recommendations;

pub use limits::{RecommendationLimits, DEFAULT_TOP_N};
pub use recommendations::RecommendationService;
