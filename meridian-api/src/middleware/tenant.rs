use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

pub const TENANT_HEADER: &str = "x-tenant-id";

/// Tenant taken from the `x-tenant-id` header
#[derive(Debug, Clone)]
pub struct TenantId(pub String);

impl<S> FromRequestParts<S> for TenantId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tenant = parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::validation("tenant_id", format!("missing {} header", TENANT_HEADER)))?;

        Ok(TenantId(tenant.to_string()))
    }
}
