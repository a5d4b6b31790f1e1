use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use validator::Validate;

use crate::core::{generate_curve, Selector, DEFAULT_CANDIDATE_LIMIT};
use crate::models::{CatalogError, CatalogItem, PerformanceSample, ScoredCandidate, SelectionRequest};
use crate::services::cache::{CacheError, CacheKey, CacheManager};
use crate::services::store::{CurveStore, StoreError};

/// Default deadline for the curve store read
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors surfaced by pump selection and curve maintenance
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] CatalogError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Curve store did not respond within {0:?}")]
    Timeout(Duration),
}

/// Pump selection entry point for calling layers
///
/// Validates the duty point, reads a bounded candidate snapshot from the
/// curve store, then scores and ranks it. Ranked results are cached when a
/// cache is attached; any curve replacement through this service drops them.
pub struct SelectionService<S> {
    store: Arc<S>,
    selector: Selector,
    cache: Option<Arc<CacheManager>>,
    candidate_limit: usize,
    store_timeout: Duration,
}

impl<S: CurveStore> SelectionService<S> {
    pub fn new(store: Arc<S>, selector: Selector) -> Self {
        Self {
            store,
            selector,
            cache: None,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = limit;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Rank catalog pumps for a duty point
    ///
    /// An empty result means nothing in the catalog covers the duty point;
    /// it is not an error.
    pub async fn select_items(
        &self,
        request: &SelectionRequest,
    ) -> Result<Vec<ScoredCandidate>, SelectionError> {
        request
            .validate()
            .map_err(|e| SelectionError::InvalidInput(e.to_string()))?;

        tracing::info!(
            "Selecting pumps for flow {} and head {}",
            request.required_flow,
            request.required_head
        );

        let cache_key = CacheKey::selection(request);
        if let Some(cached) = self.cached_selection(&cache_key).await {
            return Ok(cached);
        }

        let (items, samples) = tokio::time::timeout(self.store_timeout, self.fetch_snapshot(request))
            .await
            .map_err(|_| SelectionError::Timeout(self.store_timeout))??;

        if samples.is_empty() {
            tracing::info!(
                "No pump covers flow {} and head {}",
                request.required_flow,
                request.required_head
            );
            return Ok(Vec::new());
        }

        let result = self.selector.select(request, &items, samples);

        if result.skipped_samples > 0 {
            tracing::warn!(
                "Skipped {} samples whose catalog item has disappeared",
                result.skipped_samples
            );
        }

        tracing::info!(
            "Returning {} pumps (from {} samples)",
            result.candidates.len(),
            result.total_samples
        );

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(&cache_key, &result.candidates).await {
                tracing::warn!("Failed to cache selection: {}", e);
            }
        }

        Ok(result.candidates)
    }

    /// Store read: candidate samples plus the items that own them
    async fn fetch_snapshot(
        &self,
        request: &SelectionRequest,
    ) -> Result<(HashMap<String, CatalogItem>, Vec<PerformanceSample>), SelectionError> {
        let samples = self
            .store
            .list_samples_satisfying(
                request.required_flow,
                request.required_head,
                &request.filters,
                self.candidate_limit,
            )
            .await?;

        tracing::debug!("Curve store returned {} candidate samples", samples.len());

        let item_ids: Vec<String> = {
            let mut seen: HashSet<&str> = HashSet::new();
            samples
                .iter()
                .filter(|sample| seen.insert(sample.item_id.as_str()))
                .map(|sample| sample.item_id.clone())
                .collect()
        };

        // Items deleted between the two reads are absent; their samples get skipped
        let mut items: HashMap<String, CatalogItem> = HashMap::with_capacity(item_ids.len());
        for item in self.store.get_items(&item_ids).await? {
            item.validate()?;
            items.insert(item.item_id.clone(), item);
        }

        Ok((items, samples))
    }

    async fn cached_selection(&self, key: &str) -> Option<Vec<ScoredCandidate>> {
        let cache = self.cache.as_ref()?;
        match cache.get::<Vec<ScoredCandidate>>(key).await {
            Ok(hit) => {
                tracing::debug!("Serving selection from cache: {}", key);
                Some(hit)
            }
            Err(CacheError::CacheMiss(_)) => None,
            Err(e) => {
                tracing::warn!("Cache lookup failed, selecting without cache: {}", e);
                None
            }
        }
    }

    /// Bring derived state in line with an updated catalog item
    ///
    /// `previous` is the item as stored before the update, `None` on create.
    /// The curve is regenerated only when the rated point changed, but cached
    /// selections are always dropped since filterable attributes may have
    /// moved. Returns the number of samples written, or `None` when the stored
    /// curve is still valid.
    pub async fn sync_curve(
        &self,
        previous: Option<&CatalogItem>,
        item: &CatalogItem,
    ) -> Result<Option<usize>, SelectionError> {
        if let Some(previous) = previous {
            if !previous.curve_inputs_changed(item) {
                tracing::debug!("Curve inputs unchanged for {}, keeping curve", item.item_id);
                self.invalidate_selections().await;
                return Ok(None);
            }
        }

        self.write_curve(item).await.map(Some)
    }

    /// Regenerate the curve of a stored item unconditionally
    pub async fn regenerate_curve(&self, item_id: &str) -> Result<usize, SelectionError> {
        let item = self.store.get_item(item_id).await?;
        self.write_curve(&item).await
    }

    async fn write_curve(&self, item: &CatalogItem) -> Result<usize, SelectionError> {
        item.validate()?;

        let curve = generate_curve(item);
        let count = curve.len();
        self.store.replace_samples(&item.item_id, curve).await?;

        tracing::info!("Generated {} curve samples for {}", count, item.item_id);

        self.invalidate_selections().await;
        Ok(count)
    }

    async fn invalidate_selections(&self) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.invalidate_pattern(CacheKey::SELECTION_PATTERN).await {
                tracing::warn!("Failed to invalidate cached selections: {}", e);
            }
        }
    }
}
