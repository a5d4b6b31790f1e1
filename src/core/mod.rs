// Core algorithm exports
pub mod curve;
pub mod filters;
pub mod ranking;
pub mod scoring;
pub mod selector;

pub use curve::{generate_curve, operating_point, OperatingPoint, FLOW_STEP};
pub use filters::{matches_candidate, matches_item_filters, meets_duty_point, DEFAULT_CANDIDATE_LIMIT};
pub use ranking::rank;
pub use scoring::score_candidate;
pub use selector::{SelectionResult, Selector};
