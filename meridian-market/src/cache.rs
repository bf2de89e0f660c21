use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use meridian_core::{CacheStore, CoreError, CoreResult};

pub const CACHE_NAMESPACE: &str = "marketplace-price";
const DELIMITER: &str = ":";

/// `marketplace-price:{tenant}:{article}:{qty}:{customer|anonymous}:{group|default}:{promo|none}`
pub fn price_cache_key(
    tenant_id: &str,
    article_id: &str,
    quantity: i32,
    customer_id: Option<&str>,
    customer_group: Option<&str>,
    promotion_code: Option<&str>,
) -> String {
    let quantity = quantity.to_string();
    [
        CACHE_NAMESPACE,
        tenant_id,
        article_id,
        quantity.as_str(),
        customer_id.unwrap_or("anonymous"),
        customer_group.unwrap_or("default"),
        promotion_code.unwrap_or("none"),
    ]
    .join(DELIMITER)
}

/// Prefix covering every cached price of one tenant. The trailing delimiter
/// keeps `t1` from matching `t10`.
pub fn tenant_prefix(tenant_id: &str) -> String {
    format!("{}{d}{}{d}", CACHE_NAMESPACE, tenant_id, d = DELIMITER)
}

pub fn article_prefix(tenant_id: &str, article_id: &str) -> String {
    format!("{}{}{}", tenant_prefix(tenant_id), article_id, DELIMITER)
}

/// Display-price cache over an injected store, with bounded waits
#[derive(Clone)]
pub struct PricingCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    op_timeout: Duration,
}

impl PricingCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration, op_timeout: Duration) -> Self {
        Self { store, ttl, op_timeout }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn bounded<T>(&self, op: &str, fut: impl Future<Output = CoreResult<T>>) -> CoreResult<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CoreError::cache(format!("{} timed out after {:?}", op, self.op_timeout))),
        }
    }

    pub async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        self.bounded("cache read", self.store.get(key)).await
    }

    pub async fn put(&self, key: &str, value: &str) -> CoreResult<()> {
        self.bounded("cache write", self.store.set_with_ttl(key, value, self.ttl)).await
    }

    pub async fn invalidate_article(&self, tenant_id: &str, article_id: &str) -> CoreResult<u64> {
        let prefix = article_prefix(tenant_id, article_id);
        let removed = self.bounded("cache invalidation", self.store.delete_by_prefix(&prefix)).await?;
        tracing::info!(tenant_id, article_id, removed, "Invalidated article price cache");
        Ok(removed)
    }

    pub async fn invalidate_tenant(&self, tenant_id: &str) -> CoreResult<u64> {
        let prefix = tenant_prefix(tenant_id);
        let removed = self.bounded("cache invalidation", self.store.delete_by_prefix(&prefix)).await?;
        tracing::info!(tenant_id, removed, "Invalidated tenant price cache");
        Ok(removed)
    }
}
