use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::tenant::TenantId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InvalidateArticleRequest {
    pub article_id: String,
}

#[derive(Debug, Serialize)]
pub struct InvalidationResponse {
    pub invalidated: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/cache/invalidate", post(invalidate_article))
        .route("/v1/cache/invalidate-tenant", post(invalidate_tenant))
}

async fn invalidate_article(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Json(req): Json<InvalidateArticleRequest>,
) -> Result<Json<InvalidationResponse>, AppError> {
    let invalidated = state.pricing.invalidate_cache(&tenant_id, &req.article_id).await?;
    Ok(Json(InvalidationResponse { invalidated }))
}

async fn invalidate_tenant(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
) -> Result<Json<InvalidationResponse>, AppError> {
    let invalidated = state.pricing.invalidate_tenant_cache(&tenant_id).await?;
    Ok(Json(InvalidationResponse { invalidated }))
}
