use std::sync::Arc;

use meridian_catalog::{ConditionInput, PricingContext, SectorCoefficient};
use meridian_core::{CoefficientStore, CoreResult};
use meridian_shared::Sector;

/// Picks the coefficients that apply to a pricing context, in application order
pub struct CoefficientSelector {
    store: Arc<dyn CoefficientStore>,
}

impl CoefficientSelector {
    pub fn new(store: Arc<dyn CoefficientStore>) -> Self {
        Self { store }
    }

    /// Active, in-scope coefficients of the tenant, sorted but not yet condition-filtered.
    pub async fn candidates(&self, tenant_id: &str, sector: Option<Sector>) -> CoreResult<Vec<SectorCoefficient>> {
        let coefficients = self.store.active_coefficients(tenant_id).await?;
        Ok(order_coefficients(scope_coefficients(coefficients, tenant_id, sector)))
    }

    pub async fn select_coefficients(
        &self,
        tenant_id: &str,
        sector: Option<Sector>,
        context: &PricingContext,
        base_price: f64,
    ) -> CoreResult<Vec<SectorCoefficient>> {
        let candidates = self.candidates(tenant_id, sector).await?;
        let selected = filter_applicable(candidates, context, base_price);
        tracing::debug!(
            tenant_id,
            article_id = %context.article_id,
            sector = ?sector,
            count = selected.len(),
            "Selected sector coefficients"
        );
        Ok(selected)
    }
}

/// Drops inactive rows, rows of other tenants and rows scoped to another sector.
pub fn scope_coefficients(
    coefficients: Vec<SectorCoefficient>,
    tenant_id: &str,
    sector: Option<Sector>,
) -> Vec<SectorCoefficient> {
    coefficients
        .into_iter()
        .filter(|c| c.is_active && c.tenant_id == tenant_id && c.applies_to_sector(sector))
        .collect()
}

/// Priority descending, then creation ascending, then id for full determinism.
pub fn order_coefficients(mut coefficients: Vec<SectorCoefficient>) -> Vec<SectorCoefficient> {
    coefficients.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    coefficients
}

/// Keeps the coefficients whose conditions all hold for `context`. Order is preserved.
pub fn filter_applicable(
    coefficients: Vec<SectorCoefficient>,
    context: &PricingContext,
    base_price: f64,
) -> Vec<SectorCoefficient> {
    let input = ConditionInput {
        quantity: context.quantity,
        amount: context.condition_amount(base_price),
        customer_type: context.customer_type.as_deref(),
        product_category: context.product_category.as_deref(),
        article_family: context.article_family.as_deref(),
        region: context.region.as_deref(),
        date: context.date,
    };

    coefficients
        .into_iter()
        .filter(|c| c.conditions.matches(&input))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use meridian_catalog::{CoefficientConditions, CoefficientType};
    use meridian_store::memory::InMemoryCoefficientStore;

    fn coefficient(priority: i32, sector: Option<Sector>) -> SectorCoefficient {
        SectorCoefficient::new("t1", sector, CoefficientType::Margin, 1.1, priority)
    }

    #[test]
    fn test_order_priority_then_creation() {
        let now = Utc::now();
        let mut older = coefficient(5, None);
        older.created_at = now - Duration::hours(1);
        let mut newer = coefficient(5, None);
        newer.created_at = now;
        let top = coefficient(9, None);

        let ordered = order_coefficients(vec![newer.clone(), top.clone(), older.clone()]);
        let ids: Vec<_> = ordered.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![top.id, older.id, newer.id]);
    }

    #[test]
    fn test_scope_by_sector() {
        let shared = coefficient(1, None);
        let construction = coefficient(1, Some(Sector::Construction));
        let naval = coefficient(1, Some(Sector::Naval));
        let mut inactive = coefficient(1, None);
        inactive.is_active = false;
        let mut foreign = coefficient(1, None);
        foreign.tenant_id = "t2".to_string();

        let all = vec![shared.clone(), construction.clone(), naval, inactive, foreign];

        let scoped = scope_coefficients(all.clone(), "t1", Some(Sector::Construction));
        let ids: Vec<_> = scoped.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![shared.id, construction.id]);

        let unclassified = scope_coefficients(all, "t1", None);
        assert_eq!(unclassified.len(), 1);
        assert_eq!(unclassified[0].id, shared.id);
    }

    #[test]
    fn test_amount_condition_uses_declared_amount() {
        let big_orders = coefficient(1, None).with_conditions(CoefficientConditions {
            min_amount: Some(1000.0),
            ..Default::default()
        });

        let ctx = PricingContext::new("t1", "a1", 5);
        assert!(filter_applicable(vec![big_orders.clone()], &ctx, 100.0).is_empty());
        assert_eq!(filter_applicable(vec![big_orders.clone()], &ctx, 200.0).len(), 1);

        let mut in_cart = PricingContext::new("t1", "a1", 1);
        in_cart.order_total = Some(5000.0);
        assert_eq!(filter_applicable(vec![big_orders], &in_cart, 10.0).len(), 1);
    }

    #[tokio::test]
    async fn test_select_from_store() {
        let low = coefficient(1, Some(Sector::Energy));
        let high = coefficient(10, Some(Sector::Energy));
        let gated = coefficient(20, Some(Sector::Energy)).with_conditions(CoefficientConditions {
            min_quantity: Some(10),
            ..Default::default()
        });
        let store = Arc::new(InMemoryCoefficientStore::seeded(
            vec![low.clone(), gated.clone(), high.clone()],
            vec![],
        ));
        let selector = CoefficientSelector::new(store);

        let ctx = PricingContext::new("t1", "a1", 9);
        let selected = selector
            .select_coefficients("t1", Some(Sector::Energy), &ctx, 10.0)
            .await
            .unwrap();
        let ids: Vec<_> = selected.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![high.id, low.id]);

        let ctx = PricingContext::new("t1", "a1", 10);
        let selected = selector
            .select_coefficients("t1", Some(Sector::Energy), &ctx, 10.0)
            .await
            .unwrap();
        assert_eq!(selected[0].id, gated.id);
    }
}
