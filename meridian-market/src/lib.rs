pub mod cache;
pub mod display;
pub mod promotion;
pub mod shipping;
pub mod facade;
pub mod admin;

pub use cache::{price_cache_key, PricingCache, CACHE_NAMESPACE};
pub use display::{BulkLine, BulkPriceResult, BulkSummary, DisplayPriceResult, PriceOptions};
pub use promotion::PromotionOutcome;
pub use shipping::{ShippingLine, ShippingQuote};
pub use facade::MarketplacePricing;
pub use admin::{
    default_construction_coefficients, AssignSectorRequest, CoefficientPatch, NewCoefficient, SectorAdmin,
};
