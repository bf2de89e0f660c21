use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use meridian_market::{BulkLine, BulkPriceResult, DisplayPriceResult, PriceOptions};
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::tenant::TenantId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub quantity: Option<i32>,
    pub customer_id: Option<String>,
    pub customer_group: Option<String>,
    pub promotion_code: Option<String>,
    pub customer_type: Option<String>,
    pub product_category: Option<String>,
    pub article_family: Option<String>,
    pub region: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl From<PriceQuery> for PriceOptions {
    fn from(query: PriceQuery) -> Self {
        Self {
            quantity: query.quantity.unwrap_or(1),
            customer_id: query.customer_id,
            customer_group: query.customer_group,
            promotion_code: query.promotion_code,
            customer_type: query.customer_type,
            product_category: query.product_category,
            article_family: query.article_family,
            region: query.region,
            date: query.date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkPriceRequest {
    pub items: Vec<BulkLine>,
    #[serde(default)]
    pub customer_id: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/prices/bulk", post(bulk_price))
        .route("/v1/prices/{article_id}", get(get_price))
}

/// GET /v1/prices/{article_id}
async fn get_price(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Path(article_id): Path<String>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<DisplayPriceResult>, AppError> {
    let options = PriceOptions::from(query);
    let price = state.pricing.get_price(&article_id, &tenant_id, &options).await?;
    Ok(Json(price))
}

/// POST /v1/prices/bulk
async fn bulk_price(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Json(req): Json<BulkPriceRequest>,
) -> Result<Json<BulkPriceResult>, AppError> {
    let result = state
        .pricing
        .bulk_price(&tenant_id, &req.items, req.customer_id.as_deref())
        .await?;
    Ok(Json(result))
}
