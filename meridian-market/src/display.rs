use chrono::{DateTime, Utc};
use meridian_core::{AppliedBaseRule, BasePriceQuote};
use meridian_engine::{AppliedCoefficient, PricingResult};
use meridian_shared::{round_cents, Sector};
use serde::{Deserialize, Serialize};

/// Optional inputs of a single-article price lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceOptions {
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub customer_group: Option<String>,
    #[serde(default)]
    pub promotion_code: Option<String>,
    #[serde(default)]
    pub customer_type: Option<String>,
    #[serde(default)]
    pub product_category: Option<String>,
    #[serde(default)]
    pub article_family: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Defaults to now
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

fn default_quantity() -> i32 {
    1
}

impl Default for PriceOptions {
    fn default() -> Self {
        Self {
            quantity: default_quantity(),
            customer_id: None,
            customer_group: None,
            promotion_code: None,
            customer_type: None,
            product_category: None,
            article_family: None,
            region: None,
            date: None,
        }
    }
}

impl PriceOptions {
    pub fn quantity(quantity: i32) -> Self {
        Self {
            quantity,
            ..Self::default()
        }
    }

    pub fn for_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Only lookups fully described by the cache key may be served from or stored in the cache.
    pub fn is_cacheable(&self) -> bool {
        self.customer_type.is_none()
            && self.product_category.is_none()
            && self.article_family.is_none()
            && self.region.is_none()
            && self.date.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayPriceResult {
    pub article_id: String,
    pub quantity: i32,
    /// Unit price from the base-price provider
    pub base_price: f64,
    /// Unit price after sector coefficients, tax excluded
    pub final_price: f64,
    /// Tax-inclusive unit price shown to buyers
    pub display_price: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    /// Tax-inclusive base price, set only when coefficients changed the price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings: Option<f64>,
    pub applied_base_rules: Vec<AppliedBaseRule>,
    pub applied_adjustments: Vec<AppliedCoefficient>,
    pub applied_rules: Vec<String>,
    pub customer_sector: Option<Sector>,
    pub calculation_date: Option<DateTime<Utc>>,
}

/// Turns an engine result into buyer-facing, cent-rounded amounts.
pub fn enrich(
    article_id: &str,
    quantity: i32,
    quote: BasePriceQuote,
    result: PricingResult,
    tax_rate: f64,
) -> DisplayPriceResult {
    let final_price = round_cents(result.final_price);
    let tax_amount = round_cents(final_price * tax_rate);
    let display_price = round_cents(final_price + tax_amount);

    let (original_price, savings) = if result.has_adjustments() {
        let original = round_cents(result.base_price * (1.0 + tax_rate));
        (Some(original), Some(round_cents((original - display_price).max(0.0))))
    } else {
        (None, None)
    };

    DisplayPriceResult {
        article_id: article_id.to_string(),
        quantity,
        base_price: round_cents(result.base_price),
        final_price,
        display_price,
        tax_rate,
        tax_amount,
        original_price,
        savings,
        applied_base_rules: quote.applied_base_rules,
        applied_adjustments: result.applied_coefficients,
        applied_rules: result.metadata.applied_rules,
        customer_sector: result.metadata.customer_sector,
        calculation_date: result.metadata.calculation_date,
    }
}

/// Cart line input of a bulk price lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkLine {
    pub article_id: String,
    pub quantity: i32,
    #[serde(default)]
    pub product_category: Option<String>,
    #[serde(default)]
    pub article_family: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BulkSummary {
    /// Sum of `final_price * quantity`, tax excluded
    pub subtotal: f64,
    pub total_tax: f64,
    pub total: f64,
    pub total_savings: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BulkPriceResult {
    /// Same order as the request lines
    pub items: Vec<DisplayPriceResult>,
    pub summary: BulkSummary,
}

impl BulkPriceResult {
    pub fn from_items(items: Vec<DisplayPriceResult>) -> Self {
        let mut summary = BulkSummary::default();
        for item in &items {
            let quantity = f64::from(item.quantity);
            summary.subtotal += item.final_price * quantity;
            summary.total_tax += item.tax_amount * quantity;
            summary.total_savings += item.savings.unwrap_or(0.0) * quantity;
        }
        summary.subtotal = round_cents(summary.subtotal);
        summary.total_tax = round_cents(summary.total_tax);
        summary.total_savings = round_cents(summary.total_savings);
        summary.total = round_cents(summary.subtotal + summary.total_tax);

        Self { items, summary }
    }
}
