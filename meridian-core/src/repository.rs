use async_trait::async_trait;
use meridian_catalog::{CustomerSectorAssignment, SectorCoefficient};
use meridian_shared::Sector;
use uuid::Uuid;

use crate::CoreResult;

/// Read side of the coefficient/assignment persistence
#[async_trait]
pub trait CoefficientStore: Send + Sync {
    /// Active coefficients of a tenant, any sector, in storage order
    async fn active_coefficients(&self, tenant_id: &str) -> CoreResult<Vec<SectorCoefficient>>;

    /// Active assignments of one customer within a tenant
    async fn active_assignments(
        &self,
        tenant_id: &str,
        customer_id: &str,
    ) -> CoreResult<Vec<CustomerSectorAssignment>>;
}

/// Write side used by sector administration
#[async_trait]
pub trait CoefficientAdminStore: CoefficientStore {
    async fn insert_coefficient(&self, coefficient: &SectorCoefficient) -> CoreResult<()>;

    /// One coefficient of the tenant, active or not
    async fn coefficient(&self, tenant_id: &str, id: Uuid) -> CoreResult<Option<SectorCoefficient>>;

    /// Coefficients ordered by sector (unscoped first), then priority descending.
    /// `sector` restricts the listing to coefficients scoped to that sector.
    async fn list_coefficients(
        &self,
        tenant_id: &str,
        sector: Option<Sector>,
        include_inactive: bool,
    ) -> CoreResult<Vec<SectorCoefficient>>;

    /// Overwrites the stored coefficient with the same id and tenant. Returns false when there is none.
    async fn update_coefficient(&self, coefficient: &SectorCoefficient) -> CoreResult<bool>;

    /// Returns false when no coefficient with this id exists in the tenant.
    async fn set_coefficient_active(&self, tenant_id: &str, id: Uuid, active: bool) -> CoreResult<bool>;

    /// Deactivates the customer's current active assignments, then stores `assignment`.
    async fn replace_assignment(&self, assignment: &CustomerSectorAssignment) -> CoreResult<()>;

    /// All assignments of a tenant, optionally including deactivated ones
    async fn list_assignments(
        &self,
        tenant_id: &str,
        include_inactive: bool,
    ) -> CoreResult<Vec<CustomerSectorAssignment>>;
}
