pub mod repository;
pub mod cache;
pub mod base_price;
pub mod promotion;

use meridian_catalog::CatalogError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid pricing context: {field} {message}")]
    InvalidContext { field: &'static str, message: String },
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl CoreError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidContext {
            field,
            message: message.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(message.into())
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::CacheUnavailable(message.into())
    }

    /// Whether the caller may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable(_) | Self::CacheUnavailable(_))
    }
}

impl From<CatalogError> for CoreError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::InvalidContext { field, message } => Self::InvalidContext { field, message },
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

pub use base_price::{AppliedBaseRule, BasePriceProvider, BasePriceQuote, BasePriceRequest, SalesChannel};
pub use cache::CacheStore;
pub use promotion::{Promotion, PromotionKind, PromotionTable};
pub use repository::{CoefficientAdminStore, CoefficientStore};
