use axum::{extract::State, routing::post, Json, Router};
use meridian_market::{ShippingLine, ShippingQuote};
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::tenant::TenantId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ShippingCostRequest {
    pub items: Vec<ShippingLine>,
    pub destination_postal_code: String,
    #[serde(default)]
    pub customer_id: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/shipping/cost", post(shipping_cost))
}

async fn shipping_cost(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Json(req): Json<ShippingCostRequest>,
) -> Result<Json<ShippingQuote>, AppError> {
    let quote = state
        .pricing
        .shipping_cost(
            &tenant_id,
            &req.items,
            &req.destination_postal_code,
            req.customer_id.as_deref(),
        )
        .await?;
    Ok(Json(quote))
}
