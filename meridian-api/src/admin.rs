use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use meridian_catalog::{CustomerSectorAssignment, SectorCoefficient};
use meridian_market::{AssignSectorRequest, CoefficientPatch, NewCoefficient};
use meridian_shared::Sector;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::tenant::TenantId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListAssignmentsQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListCoefficientsQuery {
    #[serde(default)]
    pub sector: Option<Sector>,
    #[serde(default)]
    pub include_inactive: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/sectors/assign", post(assign_sector))
        .route("/v1/admin/sectors/assignments", get(list_assignments))
        .route("/v1/admin/coefficients", get(list_coefficients).post(create_coefficient))
        .route("/v1/admin/coefficients/defaults", post(seed_defaults))
        .route(
            "/v1/admin/coefficients/{id}",
            patch(update_coefficient).delete(deactivate_coefficient),
        )
}

/// POST /v1/admin/sectors/assign
async fn assign_sector(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Json(req): Json<AssignSectorRequest>,
) -> Result<(StatusCode, Json<CustomerSectorAssignment>), AppError> {
    let assignment = state.admin.assign_customer_sector(&tenant_id, req).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// GET /v1/admin/sectors/assignments
async fn list_assignments(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Query(query): Query<ListAssignmentsQuery>,
) -> Result<Json<Vec<CustomerSectorAssignment>>, AppError> {
    let assignments = state
        .admin
        .list_assignments(&tenant_id, query.include_inactive)
        .await?;
    Ok(Json(assignments))
}

/// POST /v1/admin/coefficients
async fn create_coefficient(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Json(req): Json<NewCoefficient>,
) -> Result<(StatusCode, Json<SectorCoefficient>), AppError> {
    let coefficient = state.admin.create_coefficient(&tenant_id, req).await?;
    Ok((StatusCode::CREATED, Json(coefficient)))
}

/// GET /v1/admin/coefficients
async fn list_coefficients(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Query(query): Query<ListCoefficientsQuery>,
) -> Result<Json<Vec<SectorCoefficient>>, AppError> {
    let coefficients = state
        .admin
        .list_coefficients(&tenant_id, query.sector, query.include_inactive)
        .await?;
    Ok(Json(coefficients))
}

/// PATCH /v1/admin/coefficients/{id}
async fn update_coefficient(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Path(id): Path<Uuid>,
    Json(changes): Json<CoefficientPatch>,
) -> Result<Json<SectorCoefficient>, AppError> {
    let coefficient = state.admin.update_coefficient(&tenant_id, id, changes).await?;
    Ok(Json(coefficient))
}

/// DELETE /v1/admin/coefficients/{id}
async fn deactivate_coefficient(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.admin.deactivate_coefficient(&tenant_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/admin/coefficients/defaults
async fn seed_defaults(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
) -> Result<(StatusCode, Json<Vec<SectorCoefficient>>), AppError> {
    let coefficients = state
        .admin
        .seed_default_construction_coefficients(&tenant_id)
        .await?;
    Ok((StatusCode::CREATED, Json(coefficients)))
}
