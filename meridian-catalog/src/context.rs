use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Separator used in cache keys; ids containing it are rejected
pub const KEY_DELIMITER: char = ':';

/// Everything a price computation depends on besides the base price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingContext {
    pub tenant_id: String,
    pub article_id: String,
    pub quantity: i32,
    pub customer_id: Option<String>,
    pub customer_type: Option<String>,
    pub product_category: Option<String>,
    pub article_family: Option<String>,
    pub region: Option<String>,
    /// Evaluation date for validity windows and weekday conditions
    pub date: DateTime<Utc>,
    pub promotion_code: Option<String>,
    /// Running or provisional cart total. Amount conditions use it instead of
    /// `base_price * quantity` when present.
    pub order_total: Option<f64>,
}

impl PricingContext {
    pub fn new(tenant_id: impl Into<String>, article_id: impl Into<String>, quantity: i32) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            article_id: article_id.into(),
            quantity,
            customer_id: None,
            customer_type: None,
            product_category: None,
            article_family: None,
            region: None,
            date: Utc::now(),
            promotion_code: None,
            order_total: None,
        }
    }

    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn at(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    /// Amount compared against `min_amount`/`max_amount`
    pub fn condition_amount(&self, base_price: f64) -> f64 {
        self.order_total
            .unwrap_or(base_price * f64::from(self.quantity))
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        validate_id("tenant_id", &self.tenant_id)?;
        validate_id("article_id", &self.article_id)?;
        validate_quantity(self.quantity)
    }
}

pub fn validate_id(field: &'static str, value: &str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::InvalidContext {
            field,
            message: "must not be empty".to_string(),
        });
    }
    if value.contains(KEY_DELIMITER) {
        return Err(CatalogError::InvalidContext {
            field,
            message: format!("must not contain '{}'", KEY_DELIMITER),
        });
    }
    Ok(())
}

pub fn validate_quantity(quantity: i32) -> Result<(), CatalogError> {
    if quantity <= 0 {
        return Err(CatalogError::InvalidContext {
            field: "quantity",
            message: format!("must be greater than 0, got {}", quantity),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Invalid pricing context: {field} {message}")]
    InvalidContext {
        field: &'static str,
        message: String,
    },
}
