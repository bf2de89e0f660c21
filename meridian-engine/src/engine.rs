use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use meridian_catalog::{validate_id, validate_quantity, PricingContext};
use meridian_core::{CoefficientStore, CoreError, CoreResult};
use serde::{Deserialize, Serialize};

use crate::resolver::SectorResolver;
use crate::selector::{filter_applicable, CoefficientSelector};
use crate::transformer::{apply_coefficients, PricingResult};

/// One cart line, priced from an externally supplied base price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub item_id: String,
    pub base_price: f64,
    pub quantity: i32,
    pub product_category: Option<String>,
    pub article_family: Option<String>,
}

/// Context shared by every line of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchContext {
    pub customer_id: Option<String>,
    pub customer_type: Option<String>,
    pub region: Option<String>,
    pub date: DateTime<Utc>,
}

impl Default for BatchContext {
    fn default() -> Self {
        Self {
            customer_id: None,
            customer_type: None,
            region: None,
            date: Utc::now(),
        }
    }
}

/// Cart total from base prices alone, before any sector coefficient.
pub fn provisional_total(items: &[BatchItem]) -> f64 {
    items
        .iter()
        .map(|item| item.base_price * f64::from(item.quantity))
        .sum()
}

/// Resolver -> selector -> transformer
pub struct SectorPricingEngine {
    resolver: SectorResolver,
    selector: CoefficientSelector,
}

impl SectorPricingEngine {
    pub fn new(store: Arc<dyn CoefficientStore>) -> Self {
        Self {
            resolver: SectorResolver::new(store.clone()),
            selector: CoefficientSelector::new(store),
        }
    }

    pub async fn price_single(&self, tenant_id: &str, context: &PricingContext, base_price: f64) -> CoreResult<PricingResult> {
        context.validate()?;
        if context.tenant_id != tenant_id {
            return Err(CoreError::invalid("tenant_id", "does not match the pricing context"));
        }

        let sector = self
            .resolver
            .resolve_sector(tenant_id, context.customer_id.as_deref(), context.date)
            .await?;
        let coefficients = self
            .selector
            .select_coefficients(tenant_id, sector, context, base_price)
            .await?;

        let mut result = apply_coefficients(base_price, context.quantity, &coefficients);
        result.metadata.customer_sector = sector;
        result.metadata.calculation_date = Some(context.date);
        Ok(result)
    }

    /// Prices every line against the provisional cart total.
    ///
    /// The total ignores sector adjustments on sibling lines, so amount
    /// conditions see an approximation of the final cart value. Duplicate
    /// item ids are rejected.
    pub async fn price_batch(
        &self,
        tenant_id: &str,
        items: &[BatchItem],
        context: &BatchContext,
    ) -> CoreResult<HashMap<String, PricingResult>> {
        validate_id("tenant_id", tenant_id)?;
        for item in items {
            validate_id("item_id", &item.item_id)?;
            validate_quantity(item.quantity)?;
        }

        let total = provisional_total(items);
        let sector = self
            .resolver
            .resolve_sector(tenant_id, context.customer_id.as_deref(), context.date)
            .await?;
        let candidates = self.selector.candidates(tenant_id, sector).await?;

        let mut results = HashMap::with_capacity(items.len());
        for item in items {
            let line_context = PricingContext {
                tenant_id: tenant_id.to_string(),
                article_id: item.item_id.clone(),
                quantity: item.quantity,
                customer_id: context.customer_id.clone(),
                customer_type: context.customer_type.clone(),
                product_category: item.product_category.clone(),
                article_family: item.article_family.clone(),
                region: context.region.clone(),
                date: context.date,
                promotion_code: None,
                order_total: Some(total),
            };

            let coefficients = filter_applicable(candidates.clone(), &line_context, item.base_price);
            let mut result = apply_coefficients(item.base_price, item.quantity, &coefficients);
            result.metadata.customer_sector = sector;
            result.metadata.calculation_date = Some(context.date);

            if results.insert(item.item_id.clone(), result).is_some() {
                return Err(CoreError::invalid(
                    "item_id",
                    format!("duplicate item {} in batch", item.item_id),
                ));
            }
        }

        tracing::debug!(tenant_id, lines = items.len(), provisional_total = total, "Priced batch");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_catalog::{
        CoefficientConditions, CoefficientParameters, CoefficientType, CustomerSectorAssignment,
        DiscountTier, DiscountType, SectorCoefficient,
    };
    use meridian_shared::Sector;
    use meridian_store::memory::InMemoryCoefficientStore;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn engine(coefficients: Vec<SectorCoefficient>) -> SectorPricingEngine {
        let assignment = CustomerSectorAssignment::new("t1", "builder", Sector::Construction);
        SectorPricingEngine::new(Arc::new(InMemoryCoefficientStore::seeded(coefficients, vec![assignment])))
    }

    fn construction(kind: CoefficientType, value: f64, priority: i32) -> SectorCoefficient {
        SectorCoefficient::new("t1", Some(Sector::Construction), kind, value, priority)
    }

    #[tokio::test]
    async fn test_discount_scenario() {
        let engine = engine(vec![construction(CoefficientType::Discount, 10.0, 1)]);
        let ctx = PricingContext::new("t1", "beam-1", 1).with_customer("builder");

        let result = engine.price_single("t1", &ctx, 100.0).await.unwrap();
        assert!(close(result.final_price, 90.0));
        assert!(close(result.total_discount, 10.0));
        assert!(close(result.total_discount_percentage, 10.0));
        assert_eq!(result.metadata.customer_sector, Some(Sector::Construction));
        assert_eq!(result.metadata.calculation_date, Some(ctx.date));
    }

    #[tokio::test]
    async fn test_sector_coefficients_skip_unclassified_customers() {
        let mut everyone = SectorCoefficient::new("t1", None, CoefficientType::Margin, 1.2, 1);
        everyone.description = Some("Marketplace margin".to_string());
        let engine = engine(vec![construction(CoefficientType::Discount, 10.0, 5), everyone]);

        let anonymous = PricingContext::new("t1", "beam-1", 1);
        let result = engine.price_single("t1", &anonymous, 100.0).await.unwrap();
        assert!(close(result.final_price, 120.0));
        assert_eq!(result.applied_coefficients.len(), 1);

        let classified = PricingContext::new("t1", "beam-1", 1).with_customer("builder");
        let result = engine.price_single("t1", &classified, 100.0).await.unwrap();
        assert!(close(result.final_price, 108.0));
    }

    #[tokio::test]
    async fn test_deterministic_replay() {
        let engine = engine(vec![
            construction(CoefficientType::BasePrice, 1.1, 3),
            construction(CoefficientType::Discount, 5.0, 3),
            construction(CoefficientType::Transport, 20.0, 1),
        ]);
        let ctx = PricingContext::new("t1", "beam-1", 7).with_customer("builder");

        let first = engine.price_single("t1", &ctx, 42.5).await.unwrap();
        let second = engine.price_single("t1", &ctx, 42.5).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_reversed_priority_changes_result() {
        let fixed_margin = CoefficientParameters {
            margin_type: meridian_catalog::MarginType::Fixed,
            ..Default::default()
        };
        let ctx = PricingContext::new("t1", "beam-1", 1).with_customer("builder");

        let margin_first = engine(vec![
            construction(CoefficientType::Margin, 10.0, 2).with_parameters(fixed_margin.clone()),
            construction(CoefficientType::Discount, 10.0, 1),
        ]);
        let discount_first = engine(vec![
            construction(CoefficientType::Margin, 10.0, 1).with_parameters(fixed_margin),
            construction(CoefficientType::Discount, 10.0, 2),
        ]);

        let a = margin_first.price_single("t1", &ctx, 100.0).await.unwrap();
        let b = discount_first.price_single("t1", &ctx, 100.0).await.unwrap();
        assert!(close(a.final_price, 99.0));
        assert!(close(b.final_price, 100.0));
    }

    #[tokio::test]
    async fn test_progressive_tiers_through_engine() {
        let progressive = construction(CoefficientType::Discount, 0.0, 1).with_parameters(CoefficientParameters {
            discount_type: DiscountType::Progressive,
            progressive_tiers: vec![
                DiscountTier { min_quantity: 10, rate: 5.0 },
                DiscountTier { min_quantity: 50, rate: 10.0 },
            ],
            ..Default::default()
        });
        let engine = engine(vec![progressive]);

        for (quantity, expected) in [(5, 100.0), (20, 95.0), (60, 90.0)] {
            let ctx = PricingContext::new("t1", "beam-1", quantity).with_customer("builder");
            let result = engine.price_single("t1", &ctx, 100.0).await.unwrap();
            assert!(close(result.final_price, expected), "quantity {}", quantity);
        }
    }

    #[tokio::test]
    async fn test_invalid_context_rejected() {
        let engine = engine(vec![]);
        let ctx = PricingContext::new("t1", "beam-1", 0);
        let err = engine.price_single("t1", &ctx, 10.0).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidContext { field: "quantity", .. }));

        let ctx = PricingContext::new("t1", "beam-1", 1);
        let err = engine.price_single("t2", &ctx, 10.0).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidContext { field: "tenant_id", .. }));
    }

    #[tokio::test]
    async fn test_batch_uses_provisional_total() {
        let volume = construction(CoefficientType::Discount, 5.0, 1).with_conditions(CoefficientConditions {
            min_amount: Some(5000.0),
            ..Default::default()
        });
        let engine = engine(vec![volume]);
        let context = BatchContext {
            customer_id: Some("builder".to_string()),
            ..Default::default()
        };
        let items = vec![
            BatchItem {
                item_id: "beam".to_string(),
                base_price: 100.0,
                quantity: 40,
                product_category: None,
                article_family: None,
            },
            BatchItem {
                item_id: "bolt".to_string(),
                base_price: 2.0,
                quantity: 10,
                product_category: None,
                article_family: None,
            },
        ];

        // 4000 + 20: below the threshold
        let results = engine.price_batch("t1", &items, &context).await.unwrap();
        assert!(close(results["bolt"].final_price, 2.0));

        let mut bigger = items.clone();
        bigger[0].quantity = 50;
        let results = engine.price_batch("t1", &bigger, &context).await.unwrap();
        // The bolt line alone is 20, it reacts to the cart value
        assert!(close(results["bolt"].final_price, 1.9));
        assert!(close(results["beam"].final_price, 95.0));
    }

    #[tokio::test]
    async fn test_batch_rejects_duplicates() {
        let engine = engine(vec![]);
        let item = BatchItem {
            item_id: "beam".to_string(),
            base_price: 1.0,
            quantity: 1,
            product_category: None,
            article_family: None,
        };
        let err = engine
            .price_batch("t1", &[item.clone(), item], &BatchContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidContext { field: "item_id", .. }));
    }
}
