use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionKind {
    /// Percentage of the current price
    Percentage(f64),
    /// Amount off, capped at the current price
    FixedAmount(f64),
}

/// Promotion-code entry as supplied by the external promotion table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Promotion {
    pub code: String,
    /// `None` makes the code valid for every tenant
    #[serde(default)]
    pub tenant_id: Option<String>,
    pub kind: PromotionKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
    /// Eligible articles; empty means all
    #[serde(default)]
    pub article_ids: Vec<String>,
}

impl Promotion {
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.valid_from.map_or(true, |from| at >= from)
            && self.valid_until.map_or(true, |until| at <= until)
    }

    pub fn covers_article(&self, article_id: &str) -> bool {
        self.article_ids.is_empty() || self.article_ids.iter().any(|a| a == article_id)
    }
}

#[async_trait]
pub trait PromotionTable: Send + Sync {
    async fn lookup(&self, tenant_id: &str, code: &str) -> CoreResult<Option<Promotion>>;
}
