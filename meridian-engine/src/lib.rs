pub mod resolver;
pub mod selector;
pub mod transformer;
pub mod engine;

pub use resolver::SectorResolver;
pub use selector::CoefficientSelector;
pub use transformer::{apply_coefficients, AppliedCoefficient, PriceBreakdown, PricingMetadata, PricingResult};
pub use engine::{provisional_total, BatchContext, BatchItem, SectorPricingEngine};
