// Model exports
pub mod domain;
pub mod requests;

pub use domain::{
    CatalogError, CatalogItem, CostAssumptions, PerformanceSample, RecommendationLevel,
    ScoredCandidate, ScoringWeights, SelectionFilters, SubScores, MAX_CURVE_SAMPLES,
};
pub use requests::SelectionRequest;
