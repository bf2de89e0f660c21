//! Write side of sector pricing: customer classification and coefficient management.
//!
//! Every write drops the tenant's cached prices, since any of them may now be stale.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use meridian_catalog::{
    validate_id, AssignmentDetails, CalculationMethod, CoefficientConditions, CoefficientParameters,
    CoefficientType, CustomerSectorAssignment, SectorCoefficient,
};
use meridian_core::{CoefficientAdminStore, CoreError, CoreResult};
use meridian_shared::Sector;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::PricingCache;

#[derive(Debug, Clone, Deserialize)]
pub struct AssignSectorRequest {
    pub customer_id: String,
    pub sector: Sector,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_code: Option<String>,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub details: AssignmentDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCoefficient {
    #[serde(default)]
    pub sector: Option<Sector>,
    pub coefficient_type: CoefficientType,
    pub coefficient: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub conditions: CoefficientConditions,
    #[serde(default)]
    pub parameters: CoefficientParameters,
}

/// Fields left out keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoefficientPatch {
    #[serde(default)]
    pub sector: Option<Sector>,
    #[serde(default)]
    pub coefficient_type: Option<CoefficientType>,
    #[serde(default)]
    pub coefficient: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub conditions: Option<CoefficientConditions>,
    #[serde(default)]
    pub parameters: Option<CoefficientParameters>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl CoefficientPatch {
    fn apply(self, coefficient: &mut SectorCoefficient) {
        if let Some(sector) = self.sector {
            coefficient.sector = Some(sector);
        }
        if let Some(coefficient_type) = self.coefficient_type {
            coefficient.coefficient_type = coefficient_type;
        }
        if let Some(value) = self.coefficient {
            coefficient.coefficient = value;
        }
        if let Some(description) = self.description {
            coefficient.description = Some(description);
        }
        if let Some(priority) = self.priority {
            coefficient.priority = priority;
        }
        if let Some(conditions) = self.conditions {
            coefficient.conditions = conditions;
        }
        if let Some(parameters) = self.parameters {
            coefficient.parameters = parameters;
        }
        if let Some(is_active) = self.is_active {
            coefficient.is_active = is_active;
        }
    }
}

fn validate_coefficient(value: f64) -> CoreResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::invalid(
            "coefficient",
            format!("must be a non-negative number, got {}", value),
        ));
    }
    Ok(())
}

const CONSTRUCTION_FAMILIES: [&str; 4] = ["POUTRELLES", "PROFILES", "TUBES", "PLATS"];

/// Default coefficient set for construction customers (steel distribution)
pub fn default_construction_coefficients(tenant_id: &str) -> Vec<SectorCoefficient> {
    let sector = Some(Sector::Construction);
    vec![
        SectorCoefficient::new(tenant_id, sector, CoefficientType::BasePrice, 1.10, 10)
            .with_description("Construction uplift on structural steel")
            .with_conditions(CoefficientConditions {
                min_quantity: Some(1),
                article_families: CONSTRUCTION_FAMILIES.iter().map(|f| f.to_string()).collect(),
                ..Default::default()
            }),
        SectorCoefficient::new(tenant_id, sector, CoefficientType::Discount, 5.0, 5)
            .with_description("Construction volume discount")
            .with_conditions(CoefficientConditions {
                min_quantity: Some(100),
                min_amount: Some(5000.0),
                ..Default::default()
            }),
        SectorCoefficient::new(tenant_id, sector, CoefficientType::Transport, 150.0, 1)
            .with_description("Site delivery")
            .with_parameters(CoefficientParameters {
                calculation_method: CalculationMethod::Fixed,
                free_threshold: Some(2000.0),
                ..Default::default()
            }),
    ]
}

pub struct SectorAdmin {
    store: Arc<dyn CoefficientAdminStore>,
    cache: PricingCache,
}

impl SectorAdmin {
    pub fn new(store: Arc<dyn CoefficientAdminStore>, cache: PricingCache) -> Self {
        Self { store, cache }
    }

    async fn drop_cached_prices(&self, tenant_id: &str) {
        if let Err(e) = self.cache.invalidate_tenant(tenant_id).await {
            warn!(tenant_id, error = %e, "Could not invalidate prices after a sector pricing change");
        }
    }

    /// Replaces the customer's active assignment.
    pub async fn assign_customer_sector(
        &self,
        tenant_id: &str,
        request: AssignSectorRequest,
    ) -> CoreResult<CustomerSectorAssignment> {
        validate_id("tenant_id", tenant_id)?;
        validate_id("customer_id", &request.customer_id)?;
        if let (Some(from), Some(until)) = (request.valid_from, request.valid_until) {
            if from > until {
                return Err(CoreError::invalid("valid_until", "must not be before valid_from"));
            }
        }

        let mut assignment = CustomerSectorAssignment::new(tenant_id, request.customer_id, request.sector);
        assignment.customer_name = request.customer_name;
        assignment.customer_code = request.customer_code;
        assignment.valid_from = request.valid_from;
        assignment.valid_until = request.valid_until;
        assignment.details = request.details;

        self.store.replace_assignment(&assignment).await?;
        info!(
            tenant_id,
            customer_id = %assignment.customer_id,
            sector = %assignment.sector,
            "Assigned customer sector"
        );
        self.drop_cached_prices(tenant_id).await;
        Ok(assignment)
    }

    pub async fn create_coefficient(&self, tenant_id: &str, new: NewCoefficient) -> CoreResult<SectorCoefficient> {
        validate_id("tenant_id", tenant_id)?;
        validate_coefficient(new.coefficient)?;

        let mut coefficient = SectorCoefficient::new(
            tenant_id,
            new.sector,
            new.coefficient_type,
            new.coefficient,
            new.priority,
        )
        .with_conditions(new.conditions)
        .with_parameters(new.parameters);
        coefficient.description = new.description;

        self.store.insert_coefficient(&coefficient).await?;
        info!(tenant_id, id = %coefficient.id, rule = %coefficient.rule_label(), "Created sector coefficient");
        self.drop_cached_prices(tenant_id).await;
        Ok(coefficient)
    }

    pub async fn update_coefficient(
        &self,
        tenant_id: &str,
        id: Uuid,
        patch: CoefficientPatch,
    ) -> CoreResult<SectorCoefficient> {
        validate_id("tenant_id", tenant_id)?;
        if let Some(value) = patch.coefficient {
            validate_coefficient(value)?;
        }

        let mut coefficient = self
            .store
            .coefficient(tenant_id, id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("coefficient {}", id)))?;
        patch.apply(&mut coefficient);

        if !self.store.update_coefficient(&coefficient).await? {
            return Err(CoreError::NotFound(format!("coefficient {}", id)));
        }
        info!(tenant_id, %id, rule = %coefficient.rule_label(), "Updated sector coefficient");
        self.drop_cached_prices(tenant_id).await;
        Ok(coefficient)
    }

    /// Ordered by sector, then priority descending
    pub async fn list_coefficients(
        &self,
        tenant_id: &str,
        sector: Option<Sector>,
        include_inactive: bool,
    ) -> CoreResult<Vec<SectorCoefficient>> {
        validate_id("tenant_id", tenant_id)?;
        self.store.list_coefficients(tenant_id, sector, include_inactive).await
    }

    pub async fn deactivate_coefficient(&self, tenant_id: &str, id: Uuid) -> CoreResult<()> {
        validate_id("tenant_id", tenant_id)?;
        if !self.store.set_coefficient_active(tenant_id, id, false).await? {
            return Err(CoreError::NotFound(format!("coefficient {}", id)));
        }

        info!(tenant_id, %id, "Deactivated sector coefficient");
        self.drop_cached_prices(tenant_id).await;
        Ok(())
    }

    pub async fn seed_default_construction_coefficients(&self, tenant_id: &str) -> CoreResult<Vec<SectorCoefficient>> {
        validate_id("tenant_id", tenant_id)?;
        let coefficients = default_construction_coefficients(tenant_id);
        for coefficient in &coefficients {
            self.store.insert_coefficient(coefficient).await?;
        }

        info!(tenant_id, count = coefficients.len(), "Seeded default construction coefficients");
        self.drop_cached_prices(tenant_id).await;
        Ok(coefficients)
    }

    pub async fn list_assignments(
        &self,
        tenant_id: &str,
        include_inactive: bool,
    ) -> CoreResult<Vec<CustomerSectorAssignment>> {
        validate_id("tenant_id", tenant_id)?;
        self.store.list_assignments(tenant_id, include_inactive).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::price_cache_key;
    use meridian_catalog::PricingContext;
    use meridian_core::CoefficientStore;
    use meridian_engine::SectorPricingEngine;
    use meridian_store::{InMemoryCacheStore, InMemoryCoefficientStore};
    use std::time::Duration;

    fn admin() -> (SectorAdmin, Arc<InMemoryCoefficientStore>, PricingCache) {
        let store = Arc::new(InMemoryCoefficientStore::new());
        let cache = PricingCache::new(
            Arc::new(InMemoryCacheStore::new()),
            Duration::from_secs(300),
            Duration::from_secs(1),
        );
        (SectorAdmin::new(store.clone(), cache.clone()), store, cache)
    }

    fn assign(customer_id: &str, sector: Sector) -> AssignSectorRequest {
        AssignSectorRequest {
            customer_id: customer_id.to_string(),
            sector,
            customer_name: None,
            customer_code: None,
            valid_from: None,
            valid_until: None,
            details: AssignmentDetails::default(),
        }
    }

    #[tokio::test]
    async fn test_reassignment_supersedes_and_invalidates() {
        let (admin, store, cache) = admin();
        let key = price_cache_key("t1", "beam", 1, Some("c1"), None, None);
        cache.put(&key, "{}").await.unwrap();

        admin.assign_customer_sector("t1", assign("c1", Sector::Naval)).await.unwrap();
        assert!(cache.get(&key).await.unwrap().is_none());

        admin.assign_customer_sector("t1", assign("c1", Sector::Railway)).await.unwrap();
        let active = store.active_assignments("t1", "c1").await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].sector, Sector::Railway);
        assert_eq!(admin.list_assignments("t1", true).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_inverted_validity_window_rejected() {
        let (admin, _, _) = admin();
        let now = Utc::now();
        let mut request = assign("c1", Sector::Energy);
        request.valid_from = Some(now);
        request.valid_until = Some(now - chrono::Duration::days(1));

        let err = admin.assign_customer_sector("t1", request).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidContext { field: "valid_until", .. }));
    }

    #[tokio::test]
    async fn test_deactivate_coefficient() {
        let (admin, store, _) = admin();
        let created = admin
            .create_coefficient(
                "t1",
                NewCoefficient {
                    sector: None,
                    coefficient_type: CoefficientType::Margin,
                    coefficient: 1.2,
                    description: None,
                    priority: 1,
                    conditions: CoefficientConditions::default(),
                    parameters: CoefficientParameters::default(),
                },
            )
            .await
            .unwrap();
        assert_eq!(store.active_coefficients("t1").await.unwrap().len(), 1);

        admin.deactivate_coefficient("t1", created.id).await.unwrap();
        assert!(store.active_coefficients("t1").await.unwrap().is_empty());

        let err = admin.deactivate_coefficient("t2", created.id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_coefficient_applies_patch_and_invalidates() {
        let (admin, store, cache) = admin();
        let created = admin
            .create_coefficient(
                "t1",
                NewCoefficient {
                    sector: Some(Sector::Naval),
                    coefficient_type: CoefficientType::Discount,
                    coefficient: 5.0,
                    description: Some("Dockyard discount".to_string()),
                    priority: 1,
                    conditions: CoefficientConditions::default(),
                    parameters: CoefficientParameters::default(),
                },
            )
            .await
            .unwrap();
        let key = price_cache_key("t1", "hull-plate", 1, None, None, None);
        cache.put(&key, "{}").await.unwrap();

        let patch = CoefficientPatch {
            coefficient: Some(8.0),
            priority: Some(4),
            ..Default::default()
        };
        let updated = admin.update_coefficient("t1", created.id, patch).await.unwrap();
        assert_eq!(updated.coefficient, 8.0);
        assert_eq!(updated.priority, 4);
        assert_eq!(updated.description.as_deref(), Some("Dockyard discount"));
        assert_eq!(updated.sector, Some(Sector::Naval));
        assert!(cache.get(&key).await.unwrap().is_none());
        assert_eq!(store.active_coefficients("t1").await.unwrap()[0].coefficient, 8.0);

        let negative = CoefficientPatch { coefficient: Some(-1.0), ..Default::default() };
        let err = admin.update_coefficient("t1", created.id, negative).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidContext { field: "coefficient", .. }));

        let err = admin
            .update_coefficient("t2", created.id, CoefficientPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_coefficients_by_sector() {
        let (admin, _, _) = admin();
        admin.seed_default_construction_coefficients("t1").await.unwrap();
        let listed = admin.list_coefficients("t1", Some(Sector::Construction), false).await.unwrap();
        let priorities: Vec<i32> = listed.iter().map(|c| c.priority).collect();
        assert_eq!(priorities, vec![10, 5, 1]);

        admin.deactivate_coefficient("t1", listed[0].id).await.unwrap();
        assert_eq!(admin.list_coefficients("t1", None, false).await.unwrap().len(), 2);
        assert_eq!(admin.list_coefficients("t1", None, true).await.unwrap().len(), 3);
        assert!(admin.list_coefficients("t1", Some(Sector::Naval), true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seeded_construction_pricing() {
        let (admin, store, _) = admin();
        admin.assign_customer_sector("t1", assign("builder", Sector::Construction)).await.unwrap();
        assert_eq!(admin.seed_default_construction_coefficients("t1").await.unwrap().len(), 3);

        let engine = SectorPricingEngine::new(store);
        let mut ctx = PricingContext::new("t1", "ipe-200", 1).with_customer("builder");
        ctx.article_family = Some("poutrelles".to_string());

        // 100 * 1.10, then 150 of transport below the free threshold
        let result = engine.price_single("t1", &ctx, 100.0).await.unwrap();
        assert!((result.final_price - 260.0).abs() < 1e-9);
        assert_eq!(result.metadata.applied_rules, vec!["CONSTRUCTION_BASE_PRICE", "CONSTRUCTION_TRANSPORT"]);
    }
}
