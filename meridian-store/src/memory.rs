//! Process-local implementations of the pricing ports.
//!
//! Used for development setups without Redis/Postgres and throughout the tests.

use async_trait::async_trait;
use meridian_catalog::{CustomerSectorAssignment, SectorCoefficient};
use meridian_core::{
    BasePriceProvider, BasePriceQuote, BasePriceRequest, CacheStore, CoefficientAdminStore,
    CoefficientStore, CoreError, CoreResult, Promotion, PromotionTable,
};
use meridian_shared::Sector;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

/// TTL-aware map. Expired entries are dropped on read and swept on every write.
#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((value, expires_at)) if *expires_at > now => return Ok(Some(value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // A write may have refreshed the entry since the read lock was released
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|(_, expires_at)| *expires_at <= now) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CoreResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        entries.insert(key.to_string(), (value.to_string(), now + ttl));
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> CoreResult<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }
}

/// Coefficients and assignments held in insertion order
#[derive(Default)]
pub struct InMemoryCoefficientStore {
    coefficients: RwLock<Vec<SectorCoefficient>>,
    assignments: RwLock<Vec<CustomerSectorAssignment>>,
}

impl InMemoryCoefficientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(coefficients: Vec<SectorCoefficient>, assignments: Vec<CustomerSectorAssignment>) -> Self {
        Self {
            coefficients: RwLock::new(coefficients),
            assignments: RwLock::new(assignments),
        }
    }
}

#[async_trait]
impl CoefficientStore for InMemoryCoefficientStore {
    async fn active_coefficients(&self, tenant_id: &str) -> CoreResult<Vec<SectorCoefficient>> {
        Ok(self
            .coefficients
            .read()
            .await
            .iter()
            .filter(|c| c.tenant_id == tenant_id && c.is_active)
            .cloned()
            .collect())
    }

    async fn active_assignments(
        &self,
        tenant_id: &str,
        customer_id: &str,
    ) -> CoreResult<Vec<CustomerSectorAssignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .iter()
            .filter(|a| a.tenant_id == tenant_id && a.customer_id == customer_id && a.is_active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CoefficientAdminStore for InMemoryCoefficientStore {
    async fn insert_coefficient(&self, coefficient: &SectorCoefficient) -> CoreResult<()> {
        self.coefficients.write().await.push(coefficient.clone());
        Ok(())
    }

    async fn coefficient(&self, tenant_id: &str, id: Uuid) -> CoreResult<Option<SectorCoefficient>> {
        Ok(self
            .coefficients
            .read()
            .await
            .iter()
            .find(|c| c.id == id && c.tenant_id == tenant_id)
            .cloned())
    }

    async fn list_coefficients(
        &self,
        tenant_id: &str,
        sector: Option<Sector>,
        include_inactive: bool,
    ) -> CoreResult<Vec<SectorCoefficient>> {
        let mut listed: Vec<SectorCoefficient> = self
            .coefficients
            .read()
            .await
            .iter()
            .filter(|c| c.tenant_id == tenant_id && (include_inactive || c.is_active))
            .filter(|c| sector.is_none() || c.sector == sector)
            .cloned()
            .collect();
        listed.sort_by(|a, b| {
            a.sector
                .map(|s| s.as_str())
                .cmp(&b.sector.map(|s| s.as_str()))
                .then(b.priority.cmp(&a.priority))
        });
        Ok(listed)
    }

    async fn update_coefficient(&self, coefficient: &SectorCoefficient) -> CoreResult<bool> {
        let mut coefficients = self.coefficients.write().await;
        match coefficients
            .iter_mut()
            .find(|c| c.id == coefficient.id && c.tenant_id == coefficient.tenant_id)
        {
            Some(existing) => {
                *existing = coefficient.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_coefficient_active(&self, tenant_id: &str, id: Uuid, active: bool) -> CoreResult<bool> {
        let mut coefficients = self.coefficients.write().await;
        match coefficients
            .iter_mut()
            .find(|c| c.id == id && c.tenant_id == tenant_id)
        {
            Some(coefficient) => {
                coefficient.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn replace_assignment(&self, assignment: &CustomerSectorAssignment) -> CoreResult<()> {
        let mut assignments = self.assignments.write().await;
        for existing in assignments.iter_mut().filter(|a| {
            a.tenant_id == assignment.tenant_id && a.customer_id == assignment.customer_id && a.is_active
        }) {
            existing.is_active = false;
        }
        assignments.push(assignment.clone());
        Ok(())
    }

    async fn list_assignments(
        &self,
        tenant_id: &str,
        include_inactive: bool,
    ) -> CoreResult<Vec<CustomerSectorAssignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .iter()
            .filter(|a| a.tenant_id == tenant_id && (include_inactive || a.is_active))
            .cloned()
            .collect())
    }
}

/// Base prices from a fixed `(tenant, article) -> unit price` list
#[derive(Default)]
pub struct ListPriceProvider {
    prices: RwLock<HashMap<(String, String), f64>>,
}

impl ListPriceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_price(&self, tenant_id: &str, article_id: &str, price: f64) {
        self.prices
            .write()
            .await
            .insert((tenant_id.to_string(), article_id.to_string()), price);
    }
}

#[async_trait]
impl BasePriceProvider for ListPriceProvider {
    async fn compute_base_price(&self, request: &BasePriceRequest) -> CoreResult<BasePriceQuote> {
        let key = (request.tenant_id.clone(), request.article_id.clone());
        match self.prices.read().await.get(&key) {
            Some(price) => Ok(BasePriceQuote {
                base_price: *price,
                applied_base_rules: Vec::new(),
            }),
            None => Err(CoreError::NotFound(format!("article {}", request.article_id))),
        }
    }
}

/// Promotion codes loaded once, typically from configuration
pub struct StaticPromotionTable {
    promotions: Vec<Promotion>,
}

impl StaticPromotionTable {
    pub fn new(promotions: Vec<Promotion>) -> Self {
        Self { promotions }
    }
}

#[async_trait]
impl PromotionTable for StaticPromotionTable {
    async fn lookup(&self, tenant_id: &str, code: &str) -> CoreResult<Option<Promotion>> {
        Ok(self
            .promotions
            .iter()
            .find(|p| {
                p.code.eq_ignore_ascii_case(code)
                    && p.tenant_id.as_deref().map_or(true, |t| t == tenant_id)
            })
            .cloned())
    }
}
