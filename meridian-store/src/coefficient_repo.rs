use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meridian_catalog::{CoefficientType, CustomerSectorAssignment, SectorCoefficient};
use meridian_core::{CoefficientAdminStore, CoefficientStore, CoreError, CoreResult};
use meridian_shared::Sector;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

/// Postgres-backed coefficient and assignment store
pub struct PgCoefficientStore {
    pool: PgPool,
}

impl PgCoefficientStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CoefficientRow {
    id: Uuid,
    tenant_id: String,
    sector: Option<String>,
    coefficient_type: String,
    coefficient: f64,
    description: Option<String>,
    is_active: bool,
    priority: i32,
    conditions: Value,
    parameters: Value,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct AssignmentRow {
    id: Uuid,
    tenant_id: String,
    customer_id: String,
    sector: String,
    is_active: bool,
    valid_from: Option<DateTime<Utc>>,
    valid_until: Option<DateTime<Utc>>,
    customer_name: Option<String>,
    customer_code: Option<String>,
    details: Value,
    created_at: DateTime<Utc>,
}

fn db_error(err: sqlx::Error) -> CoreError {
    CoreError::upstream(format!("coefficient store: {}", err))
}

fn corrupt(id: Uuid, what: impl std::fmt::Display) -> CoreError {
    CoreError::upstream(format!("coefficient store row {}: {}", id, what))
}

impl TryFrom<CoefficientRow> for SectorCoefficient {
    type Error = CoreError;

    fn try_from(row: CoefficientRow) -> Result<Self, Self::Error> {
        let sector = row
            .sector
            .as_deref()
            .map(str::parse::<Sector>)
            .transpose()
            .map_err(|e| corrupt(row.id, e))?;
        let coefficient_type = row
            .coefficient_type
            .parse::<CoefficientType>()
            .map_err(|e| corrupt(row.id, e))?;

        Ok(SectorCoefficient {
            id: row.id,
            tenant_id: row.tenant_id,
            sector,
            coefficient_type,
            coefficient: row.coefficient,
            description: row.description,
            is_active: row.is_active,
            priority: row.priority,
            conditions: serde_json::from_value(row.conditions).map_err(|e| corrupt(row.id, e))?,
            parameters: serde_json::from_value(row.parameters).map_err(|e| corrupt(row.id, e))?,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<AssignmentRow> for CustomerSectorAssignment {
    type Error = CoreError;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        Ok(CustomerSectorAssignment {
            id: row.id,
            tenant_id: row.tenant_id,
            customer_id: row.customer_id,
            sector: row.sector.parse().map_err(|e| corrupt(row.id, e))?,
            is_active: row.is_active,
            valid_from: row.valid_from,
            valid_until: row.valid_until,
            customer_name: row.customer_name,
            customer_code: row.customer_code,
            details: serde_json::from_value(row.details).map_err(|e| corrupt(row.id, e))?,
            created_at: row.created_at,
        })
    }
}

const COEFFICIENT_COLUMNS: &str = "id, tenant_id, sector, coefficient_type, coefficient, description, is_active, \
     priority, conditions, parameters, created_at";

const ASSIGNMENT_COLUMNS: &str = "id, tenant_id, customer_id, sector, is_active, valid_from, valid_until, \
     customer_name, customer_code, details, created_at";

#[async_trait]
impl CoefficientStore for PgCoefficientStore {
    async fn active_coefficients(&self, tenant_id: &str) -> CoreResult<Vec<SectorCoefficient>> {
        let sql = format!(
            "SELECT {} FROM sector_coefficients \
             WHERE tenant_id = $1 AND is_active = TRUE \
             ORDER BY priority DESC, created_at ASC",
            COEFFICIENT_COLUMNS
        );
        let rows: Vec<CoefficientRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.into_iter().map(SectorCoefficient::try_from).collect()
    }

    async fn active_assignments(
        &self,
        tenant_id: &str,
        customer_id: &str,
    ) -> CoreResult<Vec<CustomerSectorAssignment>> {
        let sql = format!(
            "SELECT {} FROM customer_sector_assignments \
             WHERE tenant_id = $1 AND customer_id = $2 AND is_active = TRUE \
             ORDER BY created_at ASC",
            ASSIGNMENT_COLUMNS
        );
        let rows: Vec<AssignmentRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.into_iter().map(CustomerSectorAssignment::try_from).collect()
    }
}

#[async_trait]
impl CoefficientAdminStore for PgCoefficientStore {
    async fn insert_coefficient(&self, coefficient: &SectorCoefficient) -> CoreResult<()> {
        let conditions = serde_json::to_value(&coefficient.conditions).map_err(|e| corrupt(coefficient.id, e))?;
        let parameters = serde_json::to_value(&coefficient.parameters).map_err(|e| corrupt(coefficient.id, e))?;

        sqlx::query(
            r#"
            INSERT INTO sector_coefficients
                (id, tenant_id, sector, coefficient_type, coefficient, description, is_active,
                 priority, conditions, parameters, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(coefficient.id)
        .bind(&coefficient.tenant_id)
        .bind(coefficient.sector.map(|s| s.as_str()))
        .bind(coefficient.coefficient_type.as_str())
        .bind(coefficient.coefficient)
        .bind(&coefficient.description)
        .bind(coefficient.is_active)
        .bind(coefficient.priority)
        .bind(conditions)
        .bind(parameters)
        .bind(coefficient.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn coefficient(&self, tenant_id: &str, id: Uuid) -> CoreResult<Option<SectorCoefficient>> {
        let sql = format!(
            "SELECT {} FROM sector_coefficients WHERE tenant_id = $1 AND id = $2",
            COEFFICIENT_COLUMNS
        );
        let row: Option<CoefficientRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(SectorCoefficient::try_from).transpose()
    }

    async fn list_coefficients(
        &self,
        tenant_id: &str,
        sector: Option<Sector>,
        include_inactive: bool,
    ) -> CoreResult<Vec<SectorCoefficient>> {
        let sql = format!(
            "SELECT {} FROM sector_coefficients \
             WHERE tenant_id = $1 AND ($2::TEXT IS NULL OR sector = $2) AND (is_active = TRUE OR $3) \
             ORDER BY sector ASC NULLS FIRST, priority DESC, created_at ASC",
            COEFFICIENT_COLUMNS
        );
        let rows: Vec<CoefficientRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(sector.map(|s| s.as_str()))
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.into_iter().map(SectorCoefficient::try_from).collect()
    }

    async fn update_coefficient(&self, coefficient: &SectorCoefficient) -> CoreResult<bool> {
        let conditions = serde_json::to_value(&coefficient.conditions).map_err(|e| corrupt(coefficient.id, e))?;
        let parameters = serde_json::to_value(&coefficient.parameters).map_err(|e| corrupt(coefficient.id, e))?;

        let result = sqlx::query(
            r#"
            UPDATE sector_coefficients
            SET sector = $3, coefficient_type = $4, coefficient = $5, description = $6, is_active = $7,
                priority = $8, conditions = $9, parameters = $10, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(coefficient.id)
        .bind(&coefficient.tenant_id)
        .bind(coefficient.sector.map(|s| s.as_str()))
        .bind(coefficient.coefficient_type.as_str())
        .bind(coefficient.coefficient)
        .bind(&coefficient.description)
        .bind(coefficient.is_active)
        .bind(coefficient.priority)
        .bind(conditions)
        .bind(parameters)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_coefficient_active(&self, tenant_id: &str, id: Uuid, active: bool) -> CoreResult<bool> {
        let result = sqlx::query(
            "UPDATE sector_coefficients SET is_active = $3, updated_at = NOW() WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(active)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn replace_assignment(&self, assignment: &CustomerSectorAssignment) -> CoreResult<()> {
        let details = serde_json::to_value(&assignment.details).map_err(|e| corrupt(assignment.id, e))?;
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query(
            "UPDATE customer_sector_assignments SET is_active = FALSE \
             WHERE tenant_id = $1 AND customer_id = $2 AND is_active = TRUE",
        )
        .bind(&assignment.tenant_id)
        .bind(&assignment.customer_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        sqlx::query(
            r#"
            INSERT INTO customer_sector_assignments
                (id, tenant_id, customer_id, sector, is_active, valid_from, valid_until,
                 customer_name, customer_code, details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(assignment.id)
        .bind(&assignment.tenant_id)
        .bind(&assignment.customer_id)
        .bind(assignment.sector.as_str())
        .bind(assignment.is_active)
        .bind(assignment.valid_from)
        .bind(assignment.valid_until)
        .bind(&assignment.customer_name)
        .bind(&assignment.customer_code)
        .bind(details)
        .bind(assignment.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)
    }

    async fn list_assignments(
        &self,
        tenant_id: &str,
        include_inactive: bool,
    ) -> CoreResult<Vec<CustomerSectorAssignment>> {
        let sql = format!(
            "SELECT {} FROM customer_sector_assignments \
             WHERE tenant_id = $1 AND (is_active = TRUE OR $2) \
             ORDER BY sector ASC, customer_name ASC",
            ASSIGNMENT_COLUMNS
        );
        let rows: Vec<AssignmentRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.into_iter().map(CustomerSectorAssignment::try_from).collect()
    }
}
