use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::core::filters::{matches_item_filters, meets_duty_point};
use crate::models::{CatalogItem, PerformanceSample, SelectionFilters};

/// Errors raised by a curve store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Persistence contract the selection engine consumes
///
/// Implementations own catalog items and their performance curves. Readers
/// must never observe a partially replaced curve.
pub trait CurveStore: Send + Sync {
    /// Fetch a catalog item by id
    fn get_item(
        &self,
        item_id: &str,
    ) -> impl Future<Output = Result<CatalogItem, StoreError>> + Send;

    /// Fetch every listed item that exists, in one round trip
    ///
    /// Unknown ids are left out rather than reported.
    fn get_items(
        &self,
        item_ids: &[String],
    ) -> impl Future<Output = Result<Vec<CatalogItem>, StoreError>> + Send;

    /// Samples covering the duty point whose items pass every filter
    ///
    /// At most `limit` rows; no ordering guarantee.
    fn list_samples_satisfying(
        &self,
        required_flow: f64,
        required_head: f64,
        filters: &SelectionFilters,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<PerformanceSample>, StoreError>> + Send;

    /// Atomically swap an item's curve for a new one
    fn replace_samples(
        &self,
        item_id: &str,
        samples: Vec<PerformanceSample>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Reject samples that don't belong to the item or lack positive head and power
pub(crate) fn check_samples(item_id: &str, samples: &[PerformanceSample]) -> Result<(), StoreError> {
    for sample in samples {
        if sample.item_id != item_id {
            return Err(StoreError::InvalidInput(format!(
                "sample for {} passed while replacing curve of {}",
                sample.item_id, item_id
            )));
        }
        if !(sample.head > 0.0) || !(sample.flow_rate >= 0.0) {
            return Err(StoreError::InvalidInput(format!(
                "sample at flow {} with head {} for {}",
                sample.flow_rate, sample.head, item_id
            )));
        }
        if let Some(power) = sample.power {
            if !(power > 0.0) {
                return Err(StoreError::InvalidInput(format!(
                    "sample at flow {} with power {} for {}",
                    sample.flow_rate, power, item_id
                )));
            }
        }
    }
    Ok(())
}

struct StoredItem {
    item: CatalogItem,
    curve: Arc<Vec<PerformanceSample>>,
}

/// In-process curve store
///
/// Curves are held behind `Arc` and swapped whole under the write lock, so a
/// reader sees either the old curve or the new one. Items iterate in id order,
/// which keeps capped queries deterministic.
#[derive(Default)]
pub struct MemoryCurveStore {
    entries: RwLock<BTreeMap<String, StoredItem>>,
}

impl MemoryCurveStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a catalog item, keeping any existing curve
    ///
    /// Items the curve generator can't handle are rejected and the stored
    /// item stays as it was.
    pub async fn upsert_item(&self, item: CatalogItem) -> Result<(), StoreError> {
        item.validate().map_err(|e| StoreError::InvalidInput(e.to_string()))?;

        let mut entries = self.entries.write().await;
        match entries.get_mut(&item.item_id) {
            Some(stored) => stored.item = item,
            None => {
                entries.insert(
                    item.item_id.clone(),
                    StoredItem {
                        item,
                        curve: Arc::new(Vec::new()),
                    },
                );
            }
        }
        Ok(())
    }

    /// Snapshot of an item's current curve
    pub async fn curve(&self, item_id: &str) -> Option<Arc<Vec<PerformanceSample>>> {
        self.entries
            .read()
            .await
            .get(item_id)
            .map(|stored| Arc::clone(&stored.curve))
    }
}

impl CurveStore for MemoryCurveStore {
    async fn get_item(&self, item_id: &str) -> Result<CatalogItem, StoreError> {
        self.entries
            .read()
            .await
            .get(item_id)
            .map(|stored| stored.item.clone())
            .ok_or_else(|| StoreError::NotFound(format!("catalog item {}", item_id)))
    }

    async fn get_items(&self, item_ids: &[String]) -> Result<Vec<CatalogItem>, StoreError> {
        let entries = self.entries.read().await;
        Ok(item_ids
            .iter()
            .filter_map(|id| entries.get(id))
            .map(|stored| stored.item.clone())
            .collect())
    }

    async fn list_samples_satisfying(
        &self,
        required_flow: f64,
        required_head: f64,
        filters: &SelectionFilters,
        limit: usize,
    ) -> Result<Vec<PerformanceSample>, StoreError> {
        let entries = self.entries.read().await;

        let samples = entries
            .values()
            .filter(|stored| matches_item_filters(&stored.item, filters))
            .flat_map(|stored| stored.curve.iter())
            .filter(|sample| meets_duty_point(sample, required_flow, required_head))
            .take(limit)
            .cloned()
            .collect();

        Ok(samples)
    }

    async fn replace_samples(
        &self,
        item_id: &str,
        samples: Vec<PerformanceSample>,
    ) -> Result<(), StoreError> {
        check_samples(item_id, &samples)?;
        let curve = Arc::new(samples);

        let mut entries = self.entries.write().await;
        let stored = entries
            .get_mut(item_id)
            .ok_or_else(|| StoreError::NotFound(format!("catalog item {}", item_id)))?;
        stored.curve = curve;

        tracing::debug!("Replaced curve for {} ({} samples)", item_id, stored.curve.len());
        Ok(())
    }
}
