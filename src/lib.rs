//! Pump Select - duty-point matching and ranking for pump catalogs
//!
//! This library synthesizes performance curves from a pump's rated point,
//! finds curve samples that cover a required flow and head, scores each
//! operating point on five weighted factors and returns the best operating
//! point per pump, best pump first.

pub mod config;
pub mod core;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use crate::core::{generate_curve, rank, score_candidate, Selector};
pub use crate::models::{CatalogItem, PerformanceSample, ScoredCandidate, SelectionFilters, SelectionRequest};
pub use crate::services::{CurveStore, MemoryCurveStore, SelectionError, SelectionService};
