use std::collections::HashMap;

use crate::core::{ranking::rank, scoring::score_candidate};
use crate::models::{
    CatalogItem, CostAssumptions, PerformanceSample, ScoredCandidate, ScoringWeights,
    SelectionRequest,
};

/// Result of scoring a candidate snapshot
#[derive(Debug)]
pub struct SelectionResult {
    pub candidates: Vec<ScoredCandidate>,
    pub total_samples: usize,
    /// Samples whose owning item was not in the snapshot
    pub skipped_samples: usize,
}

/// Scoring and ranking orchestrator
///
/// # Pipeline Stages
/// 1. Join each candidate sample to its catalog item
/// 2. Score every sample against the duty point
/// 3. Keep the best sample per item and rank by composite score
///
/// Runs synchronously over data already fetched from the curve store.
#[derive(Debug, Clone)]
pub struct Selector {
    weights: ScoringWeights,
    cost: CostAssumptions,
}

impl Selector {
    pub fn new(weights: ScoringWeights, cost: CostAssumptions) -> Self {
        Self { weights, cost }
    }

    pub fn with_defaults() -> Self {
        Self {
            weights: ScoringWeights::default(),
            cost: CostAssumptions::default(),
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score and rank candidate samples for a request
    ///
    /// # Arguments
    /// * `request` - The validated duty point
    /// * `items` - Catalog items owning the samples, keyed by item id
    /// * `samples` - Samples that already satisfy the duty point and filters
    ///
    /// # Returns
    /// SelectionResult with at most one candidate per item, best first
    pub fn select(
        &self,
        request: &SelectionRequest,
        items: &HashMap<String, CatalogItem>,
        samples: Vec<PerformanceSample>,
    ) -> SelectionResult {
        let total_samples = samples.len();
        let mut skipped_samples = 0;

        let scored: Vec<ScoredCandidate> = samples
            .iter()
            .filter_map(|sample| match items.get(&sample.item_id) {
                Some(item) => Some(score_candidate(
                    item,
                    sample,
                    request,
                    &self.weights,
                    &self.cost,
                )),
                None => {
                    skipped_samples += 1;
                    None
                }
            })
            .collect();

        SelectionResult {
            candidates: rank(scored),
            total_samples,
            skipped_samples,
        }
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::with_defaults()
    }
}
