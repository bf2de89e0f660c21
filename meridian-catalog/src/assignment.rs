use chrono::{DateTime, Utc};
use meridian_shared::Sector;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalState {
    Pending,
    #[default]
    Approved,
    Rejected,
}

/// Who classified the customer, and why
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssignmentDetails {
    pub assigned_by: Option<String>,
    pub reason: Option<String>,
    pub automatic: bool,
    pub approval: ApprovalState,
    pub source_document: Option<String>,
}

/// Binds a customer to a sector within a tenant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerSectorAssignment {
    pub id: Uuid,
    pub tenant_id: String,
    pub customer_id: String,
    pub sector: Sector,
    pub is_active: bool,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub customer_name: Option<String>,
    pub customer_code: Option<String>,
    #[serde(default)]
    pub details: AssignmentDetails,
    pub created_at: DateTime<Utc>,
}

impl CustomerSectorAssignment {
    pub fn new(tenant_id: impl Into<String>, customer_id: impl Into<String>, sector: Sector) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.into(),
            customer_id: customer_id.into(),
            sector,
            is_active: true,
            valid_from: None,
            valid_until: None,
            customer_name: None,
            customer_code: None,
            details: AssignmentDetails {
                source_document: Some("manual_assignment".to_string()),
                ..Default::default()
            },
            created_at: Utc::now(),
        }
    }

    /// Active and inside its validity window at `at`
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.is_active
            && self.valid_from.map_or(true, |from| at >= from)
            && self.valid_until.map_or(true, |until| at <= until)
    }
}
