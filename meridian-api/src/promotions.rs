use axum::{extract::State, routing::post, Json, Router};
use meridian_market::PromotionOutcome;
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::tenant::TenantId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ApplyPromotionRequest {
    pub code: String,
    pub current_price: f64,
    pub article_id: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/promotions/apply", post(apply_promotion))
}

/// Rejected codes answer 200 with `success: false`.
async fn apply_promotion(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Json(req): Json<ApplyPromotionRequest>,
) -> Result<Json<PromotionOutcome>, AppError> {
    let outcome = state
        .pricing
        .apply_promotion(&tenant_id, &req.code, req.current_price, &req.article_id)
        .await?;
    Ok(Json(outcome))
}
