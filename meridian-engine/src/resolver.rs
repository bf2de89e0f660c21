use std::sync::Arc;

use chrono::{DateTime, Utc};
use meridian_catalog::CustomerSectorAssignment;
use meridian_core::{CoefficientStore, CoreResult};
use meridian_shared::Sector;

/// Finds the sector a customer is currently classified into
pub struct SectorResolver {
    store: Arc<dyn CoefficientStore>,
}

impl SectorResolver {
    pub fn new(store: Arc<dyn CoefficientStore>) -> Self {
        Self { store }
    }

    /// `None` for anonymous or unclassified customers; that is not an error.
    pub async fn resolve_sector(
        &self,
        tenant_id: &str,
        customer_id: Option<&str>,
        at: DateTime<Utc>,
    ) -> CoreResult<Option<Sector>> {
        let Some(customer_id) = customer_id else {
            return Ok(None);
        };

        let assignments = self.store.active_assignments(tenant_id, customer_id).await?;
        let sector = authoritative_assignment(&assignments, at).map(|a| a.sector);

        tracing::debug!(tenant_id, customer_id, sector = ?sector, "Resolved customer sector");
        Ok(sector)
    }
}

/// Most recently created assignment that is active and valid at `at`.
/// On equal creation times the later entry in the slice wins.
pub fn authoritative_assignment(
    assignments: &[CustomerSectorAssignment],
    at: DateTime<Utc>,
) -> Option<&CustomerSectorAssignment> {
    assignments
        .iter()
        .filter(|a| a.is_valid_at(at))
        .max_by_key(|a| a.created_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use meridian_store::memory::InMemoryCoefficientStore;

    #[test]
    fn test_latest_active_assignment_wins() {
        let now = Utc::now();
        let mut old = CustomerSectorAssignment::new("t1", "c1", Sector::Naval);
        old.created_at = now - Duration::days(10);
        let mut recent = CustomerSectorAssignment::new("t1", "c1", Sector::Railway);
        recent.created_at = now - Duration::days(1);
        let mut future = CustomerSectorAssignment::new("t1", "c1", Sector::Energy);
        future.created_at = now;
        future.valid_from = Some(now + Duration::days(5));

        let assignments = vec![recent, old, future];
        let chosen = authoritative_assignment(&assignments, now).unwrap();
        assert_eq!(chosen.sector, Sector::Railway);
    }

    #[tokio::test]
    async fn test_resolve_without_customer_or_assignment() {
        let store = Arc::new(InMemoryCoefficientStore::seeded(
            vec![],
            vec![CustomerSectorAssignment::new("t1", "c1", Sector::Agriculture)],
        ));
        let resolver = SectorResolver::new(store);
        let now = Utc::now();

        assert_eq!(resolver.resolve_sector("t1", None, now).await.unwrap(), None);
        assert_eq!(resolver.resolve_sector("t1", Some("c2"), now).await.unwrap(), None);
        assert_eq!(resolver.resolve_sector("t2", Some("c1"), now).await.unwrap(), None);
        assert_eq!(
            resolver.resolve_sector("t1", Some("c1"), now).await.unwrap(),
            Some(Sector::Agriculture)
        );
    }
}
