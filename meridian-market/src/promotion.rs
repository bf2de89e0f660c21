use chrono::{DateTime, Utc};
use meridian_core::{Promotion, PromotionKind};
use meridian_shared::round_cents;
use serde::{Deserialize, Serialize};

/// Result of applying a promotion code. Rejections are reported here, not as errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromotionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    pub message: String,
}

impl PromotionOutcome {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            new_price: None,
            discount: None,
            message: message.into(),
        }
    }
}

pub fn discount_for(kind: PromotionKind, current_price: f64) -> f64 {
    let price = current_price.max(0.0);
    match kind {
        PromotionKind::Percentage(rate) => (price * rate / 100.0).clamp(0.0, price),
        PromotionKind::FixedAmount(amount) => amount.max(0.0).min(price),
    }
}

pub fn evaluate(
    promotion: Option<&Promotion>,
    code: &str,
    article_id: &str,
    current_price: f64,
    at: DateTime<Utc>,
) -> PromotionOutcome {
    let Some(promotion) = promotion else {
        return PromotionOutcome::rejected(format!("Unknown promotion code {}", code));
    };

    if promotion.valid_from.is_some_and(|from| at < from) {
        return PromotionOutcome::rejected(format!("Promotion code {} is not active yet", code));
    }
    if promotion.valid_until.is_some_and(|until| at > until) {
        return PromotionOutcome::rejected(format!("Promotion code {} has expired", code));
    }
    if !promotion.covers_article(article_id) {
        return PromotionOutcome::rejected(format!(
            "Promotion code {} does not apply to article {}",
            code, article_id
        ));
    }

    let discount = round_cents(discount_for(promotion.kind, current_price));
    PromotionOutcome {
        success: true,
        new_price: Some(round_cents((current_price - discount).max(0.0))),
        discount: Some(discount),
        message: promotion
            .description
            .clone()
            .unwrap_or_else(|| format!("Promotion code {} applied", promotion.code)),
    }
}
