use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::CoreResult;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalesChannel {
    #[default]
    Marketplace,
    Erp,
    Api,
}

/// Input of the generic rule engine that produces base prices
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BasePriceRequest {
    pub tenant_id: String,
    pub article_id: String,
    pub quantity: i32,
    pub customer_id: Option<String>,
    pub customer_group: Option<String>,
    pub channel: SalesChannel,
    pub promotion_code: Option<String>,
    pub is_first_order: Option<bool>,
    pub order_total: Option<f64>,
}

impl BasePriceRequest {
    pub fn new(tenant_id: impl Into<String>, article_id: impl Into<String>, quantity: i32) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            article_id: article_id.into(),
            quantity,
            customer_id: None,
            customer_group: None,
            channel: SalesChannel::Marketplace,
            promotion_code: None,
            is_first_order: None,
            order_total: None,
        }
    }
}

/// A rule of the generic engine that contributed to the base price
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppliedBaseRule {
    pub rule_id: String,
    pub rule_name: String,
    pub adjustment: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BasePriceQuote {
    /// Unit price before sector coefficients
    pub base_price: f64,
    #[serde(default)]
    pub applied_base_rules: Vec<AppliedBaseRule>,
}

#[async_trait]
pub trait BasePriceProvider: Send + Sync {
    /// `CoreError::NotFound` for unknown articles, `UpstreamUnavailable` for transport failures.
    async fn compute_base_price(&self, request: &BasePriceRequest) -> CoreResult<BasePriceQuote>;
}
