// Service exports
pub mod cache;
pub mod postgres;
pub mod selection;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheManager, CacheStats};
pub use postgres::PostgresClient;
pub use selection::{SelectionError, SelectionService, DEFAULT_STORE_TIMEOUT};
pub use store::{CurveStore, MemoryCurveStore, StoreError};
