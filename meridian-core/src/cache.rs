use async_trait::async_trait;
use std::time::Duration;

use crate::CoreResult;

/// Key/value store shared by every tenant. Failures map to `CoreError::CacheUnavailable`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> CoreResult<Option<String>>;

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CoreResult<()>;

    /// Removes every key starting with `prefix`, returns how many were removed.
    async fn delete_by_prefix(&self, prefix: &str) -> CoreResult<u64>;
}
