use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::try_join_all;
use meridian_catalog::{validate_id, validate_quantity, PricingContext};
use meridian_core::{
    BasePriceProvider, BasePriceQuote, BasePriceRequest, CoefficientStore, CoreError, CoreResult, PromotionTable,
};
use meridian_engine::{BatchContext, BatchItem, SectorPricingEngine};
use meridian_store::app_config::{PricingRules, ShippingRules};
use tracing::{debug, warn};

use crate::cache::{price_cache_key, PricingCache};
use crate::display::{enrich, BulkLine, BulkPriceResult, DisplayPriceResult, PriceOptions};
use crate::promotion::{evaluate, PromotionOutcome};
use crate::shipping::{quote, total_weight, ShippingLine, ShippingQuote};

/// Buyer-facing pricing: base price, sector coefficients, tax, promotions and shipping
pub struct MarketplacePricing {
    base_prices: Arc<dyn BasePriceProvider>,
    engine: SectorPricingEngine,
    cache: PricingCache,
    promotions: Arc<dyn PromotionTable>,
    pricing: PricingRules,
    shipping: ShippingRules,
}

impl MarketplacePricing {
    pub fn new(
        base_prices: Arc<dyn BasePriceProvider>,
        coefficients: Arc<dyn CoefficientStore>,
        cache: PricingCache,
        promotions: Arc<dyn PromotionTable>,
        pricing: PricingRules,
        shipping: ShippingRules,
    ) -> Self {
        Self {
            base_prices,
            engine: SectorPricingEngine::new(coefficients),
            cache,
            promotions,
            pricing,
            shipping,
        }
    }

    pub fn cache(&self) -> &PricingCache {
        &self.cache
    }

    async fn quote_base_price(&self, request: &BasePriceRequest) -> CoreResult<BasePriceQuote> {
        let limit = Duration::from_millis(self.pricing.upstream_timeout_ms);
        match tokio::time::timeout(limit, self.base_prices.compute_base_price(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(article_id = %request.article_id, ?limit, "Base pricing timed out");
                Err(CoreError::upstream(format!("base pricing timed out after {:?}", limit)))
            }
        }
    }

    /// Tax-inclusive price of one article, served from the cache when possible.
    pub async fn get_price(
        &self,
        article_id: &str,
        tenant_id: &str,
        options: &PriceOptions,
    ) -> CoreResult<DisplayPriceResult> {
        validate_id("tenant_id", tenant_id)?;
        validate_id("article_id", article_id)?;
        validate_quantity(options.quantity)?;
        if let Some(customer_id) = options.customer_id.as_deref() {
            validate_id("customer_id", customer_id)?;
        }
        if let Some(group) = options.customer_group.as_deref() {
            validate_id("customer_group", group)?;
        }
        if let Some(code) = options.promotion_code.as_deref() {
            validate_id("promotion_code", code)?;
        }

        if !options.is_cacheable() {
            debug!(article_id, tenant_id, "Pricing context outside the cache key, bypassing cache");
            return self.compute_price(article_id, tenant_id, options).await;
        }

        let key = price_cache_key(
            tenant_id,
            article_id,
            options.quantity,
            options.customer_id.as_deref(),
            options.customer_group.as_deref(),
            options.promotion_code.as_deref(),
        );

        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<DisplayPriceResult>(&raw) {
                Ok(cached) => {
                    debug!(key = %key, "Price cache hit");
                    return Ok(cached);
                }
                Err(e) => warn!(key = %key, error = %e, "Discarding unreadable cached price"),
            },
            Ok(None) => {}
            Err(e) => warn!(key = %key, error = %e, "Price cache read failed, computing directly"),
        }

        let result = self.compute_price(article_id, tenant_id, options).await?;

        match serde_json::to_string(&result) {
            Ok(raw) => {
                if let Err(e) = self.cache.put(&key, &raw).await {
                    warn!(key = %key, error = %e, "Price cache write failed");
                }
            }
            Err(e) => warn!(key = %key, error = %e, "Could not serialize price for caching"),
        }

        Ok(result)
    }

    async fn compute_price(
        &self,
        article_id: &str,
        tenant_id: &str,
        options: &PriceOptions,
    ) -> CoreResult<DisplayPriceResult> {
        let mut request = BasePriceRequest::new(tenant_id, article_id, options.quantity);
        request.customer_id = options.customer_id.clone();
        request.customer_group = options.customer_group.clone();
        request.promotion_code = options.promotion_code.clone();
        let base = self.quote_base_price(&request).await?;

        let context = PricingContext {
            tenant_id: tenant_id.to_string(),
            article_id: article_id.to_string(),
            quantity: options.quantity,
            customer_id: options.customer_id.clone(),
            customer_type: options.customer_type.clone(),
            product_category: options.product_category.clone(),
            article_family: options.article_family.clone(),
            region: options.region.clone(),
            date: options.date.unwrap_or_else(Utc::now),
            promotion_code: options.promotion_code.clone(),
            order_total: None,
        };
        let priced = self.engine.price_single(tenant_id, &context, base.base_price).await?;

        Ok(enrich(article_id, options.quantity, base, priced, self.pricing.tax_rate))
    }

    /// Prices a cart in one pass. Not cached: results depend on the whole cart.
    pub async fn bulk_price(
        &self,
        tenant_id: &str,
        lines: &[BulkLine],
        customer_id: Option<&str>,
    ) -> CoreResult<BulkPriceResult> {
        validate_id("tenant_id", tenant_id)?;
        if let Some(customer_id) = customer_id {
            validate_id("customer_id", customer_id)?;
        }
        let mut seen = HashSet::with_capacity(lines.len());
        for line in lines {
            validate_id("article_id", &line.article_id)?;
            validate_quantity(line.quantity)?;
            if !seen.insert(line.article_id.as_str()) {
                return Err(CoreError::invalid(
                    "article_id",
                    format!("duplicate article {} in bulk request", line.article_id),
                ));
            }
        }

        let quotes = try_join_all(lines.iter().map(|line| async move {
            let mut request = BasePriceRequest::new(tenant_id, line.article_id.as_str(), line.quantity);
            request.customer_id = customer_id.map(str::to_string);
            self.quote_base_price(&request).await
        }))
        .await?;

        let items: Vec<BatchItem> = lines
            .iter()
            .zip(&quotes)
            .map(|(line, base)| BatchItem {
                item_id: line.article_id.clone(),
                base_price: base.base_price,
                quantity: line.quantity,
                product_category: line.product_category.clone(),
                article_family: line.article_family.clone(),
            })
            .collect();
        let context = BatchContext {
            customer_id: customer_id.map(str::to_string),
            ..BatchContext::default()
        };
        let mut priced = self.engine.price_batch(tenant_id, &items, &context).await?;

        let mut results = Vec::with_capacity(lines.len());
        for (line, base) in lines.iter().zip(quotes) {
            let result = priced.remove(&line.article_id).ok_or_else(|| {
                CoreError::invalid("article_id", format!("no price computed for {}", line.article_id))
            })?;
            results.push(enrich(&line.article_id, line.quantity, base, result, self.pricing.tax_rate));
        }

        Ok(BulkPriceResult::from_items(results))
    }

    pub async fn shipping_cost(
        &self,
        tenant_id: &str,
        lines: &[ShippingLine],
        postal_code: &str,
        customer_id: Option<&str>,
    ) -> CoreResult<ShippingQuote> {
        validate_id("tenant_id", tenant_id)?;
        if lines.is_empty() {
            return Err(CoreError::invalid("items", "must not be empty"));
        }
        if postal_code.trim().is_empty() {
            return Err(CoreError::invalid("destination_postal_code", "must not be empty"));
        }
        for line in lines {
            validate_quantity(line.quantity)?;
            if !line.weight_kg.is_finite() || line.weight_kg < 0.0 {
                return Err(CoreError::invalid(
                    "weight_kg",
                    format!("must be a non-negative number, got {}", line.weight_kg),
                ));
            }
        }

        let prices = try_join_all(lines.iter().map(|line| async move {
            let mut options = PriceOptions::quantity(line.quantity);
            options.customer_id = customer_id.map(str::to_string);
            self.get_price(&line.article_id, tenant_id, &options).await
        }))
        .await?;

        let order_value: f64 = prices
            .iter()
            .map(|price| price.display_price * f64::from(price.quantity))
            .sum();
        let weight = total_weight(lines);

        debug!(tenant_id, order_value, weight, "Computed shipping quote");
        Ok(quote(&self.shipping, order_value, weight, postal_code))
    }

    /// Invalid codes come back as `success = false`; only lookup failures are errors.
    pub async fn apply_promotion(
        &self,
        tenant_id: &str,
        code: &str,
        current_price: f64,
        article_id: &str,
    ) -> CoreResult<PromotionOutcome> {
        validate_id("tenant_id", tenant_id)?;
        validate_id("article_id", article_id)?;
        if !current_price.is_finite() || current_price < 0.0 {
            return Err(CoreError::invalid(
                "current_price",
                format!("must be a non-negative number, got {}", current_price),
            ));
        }
        let code = code.trim();
        if code.is_empty() {
            return Ok(PromotionOutcome::rejected("Promotion code is empty"));
        }

        let promotion = self.promotions.lookup(tenant_id, code).await?;
        Ok(evaluate(promotion.as_ref(), code, article_id, current_price, Utc::now()))
    }

    pub async fn invalidate_cache(&self, tenant_id: &str, article_id: &str) -> CoreResult<u64> {
        validate_id("tenant_id", tenant_id)?;
        validate_id("article_id", article_id)?;
        self.cache.invalidate_article(tenant_id, article_id).await
    }

    pub async fn invalidate_tenant_cache(&self, tenant_id: &str) -> CoreResult<u64> {
        validate_id("tenant_id", tenant_id)?;
        self.cache.invalidate_tenant(tenant_id).await
    }
}
