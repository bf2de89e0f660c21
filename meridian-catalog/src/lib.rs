pub mod coefficient;
pub mod assignment;
pub mod context;

pub use coefficient::{
    CalculationMethod, CoefficientConditions, CoefficientParameters, CoefficientType,
    ConditionInput, DiscountTier, DiscountType, MarginType, SectorCoefficient,
};
pub use assignment::{ApprovalState, AssignmentDetails, CustomerSectorAssignment};
pub use context::{validate_id, validate_quantity, CatalogError, PricingContext, KEY_DELIMITER};
