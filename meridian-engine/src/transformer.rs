use chrono::{DateTime, Utc};
use meridian_catalog::{CoefficientType, SectorCoefficient};
use meridian_shared::{percentage_of, Sector};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One step of the fold, as applied
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppliedCoefficient {
    pub id: Uuid,
    pub coefficient_type: CoefficientType,
    pub sector: Option<Sector>,
    pub coefficient: f64,
    /// Signed price delta produced by this step
    pub adjustment: f64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PriceBreakdown {
    pub base_price: f64,
    pub sector_adjustments: f64,
    pub transport_costs: f64,
    pub handling_costs: f64,
    pub final_price: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PricingMetadata {
    pub customer_sector: Option<Sector>,
    /// Evaluation date of the context, not wall-clock time
    pub calculation_date: Option<DateTime<Utc>>,
    pub applied_rules: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingResult {
    pub base_price: f64,
    pub final_price: f64,
    pub applied_coefficients: Vec<AppliedCoefficient>,
    pub total_discount: f64,
    pub total_discount_percentage: f64,
    pub breakdown: PriceBreakdown,
    pub metadata: PricingMetadata,
}

impl PricingResult {
    pub fn has_adjustments(&self) -> bool {
        !self.applied_coefficients.is_empty()
    }
}

/// Folds `coefficients`, in the given order, over `base_price`.
///
/// Each step sees the price produced by the previous one. Transport and
/// handling deltas are reported apart from the sector adjustments.
pub fn apply_coefficients(base_price: f64, quantity: i32, coefficients: &[SectorCoefficient]) -> PricingResult {
    let base_price = base_price.max(0.0);
    let mut current = base_price;
    let mut applied = Vec::with_capacity(coefficients.len());
    let mut applied_rules = Vec::with_capacity(coefficients.len());
    let mut sector_adjustments = 0.0;
    let mut transport_costs = 0.0;
    let mut handling_costs = 0.0;

    for coefficient in coefficients {
        let previous = current;
        current = coefficient.adjusted_price(current, quantity);
        let adjustment = current - previous;

        match coefficient.coefficient_type {
            CoefficientType::Transport => transport_costs += adjustment,
            CoefficientType::Handling => handling_costs += adjustment,
            _ => sector_adjustments += adjustment,
        }

        applied.push(AppliedCoefficient {
            id: coefficient.id,
            coefficient_type: coefficient.coefficient_type,
            sector: coefficient.sector,
            coefficient: coefficient.coefficient,
            adjustment,
            description: coefficient.description.clone(),
        });
        applied_rules.push(coefficient.rule_label());
    }

    let total_discount = (base_price - current).max(0.0);

    PricingResult {
        base_price,
        final_price: current,
        applied_coefficients: applied,
        total_discount,
        total_discount_percentage: percentage_of(total_discount, base_price),
        breakdown: PriceBreakdown {
            base_price,
            sector_adjustments,
            transport_costs,
            handling_costs,
            final_price: current,
        },
        metadata: PricingMetadata {
            customer_sector: None,
            calculation_date: None,
            applied_rules,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_catalog::{CalculationMethod, CoefficientParameters, DiscountType};

    fn coefficient(kind: CoefficientType, value: f64, priority: i32) -> SectorCoefficient {
        SectorCoefficient::new("t1", Some(Sector::Construction), kind, value, priority)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_single_percentage_discount() {
        let result = apply_coefficients(100.0, 1, &[coefficient(CoefficientType::Discount, 10.0, 1)]);

        assert!(close(result.final_price, 90.0));
        assert!(close(result.total_discount, 10.0));
        assert!(close(result.total_discount_percentage, 10.0));
        assert!(close(result.applied_coefficients[0].adjustment, -10.0));
        assert_eq!(result.metadata.applied_rules, vec!["CONSTRUCTION_DISCOUNT".to_string()]);
    }

    #[test]
    fn test_order_matters() {
        let margin = coefficient(CoefficientType::Margin, 5.0, 1).with_parameters(CoefficientParameters {
            margin_type: meridian_catalog::MarginType::Fixed,
            ..Default::default()
        });
        let discount = coefficient(CoefficientType::Discount, 10.0, 1);

        let margin_first = apply_coefficients(100.0, 1, &[margin.clone(), discount.clone()]);
        let discount_first = apply_coefficients(100.0, 1, &[discount, margin]);

        assert!(close(margin_first.final_price, 94.5));
        assert!(close(discount_first.final_price, 95.0));
    }

    #[test]
    fn test_breakdown_separates_logistics() {
        let transport = coefficient(CoefficientType::Transport, 150.0, 1);
        let handling = coefficient(CoefficientType::Handling, 2.0, 1).with_parameters(CoefficientParameters {
            calculation_method: CalculationMethod::PerUnit,
            ..Default::default()
        });
        let base = coefficient(CoefficientType::BasePrice, 1.1, 1);

        let result = apply_coefficients(1000.0, 5, &[base, transport, handling]);

        assert!(close(result.breakdown.sector_adjustments, 100.0));
        assert!(close(result.breakdown.transport_costs, 150.0));
        assert!(close(result.breakdown.handling_costs, 10.0));
        assert!(close(result.final_price, 1260.0));
        assert_eq!(result.total_discount, 0.0);
    }

    #[test]
    fn test_never_negative() {
        let huge = coefficient(CoefficientType::Discount, 1000.0, 1).with_parameters(CoefficientParameters {
            discount_type: DiscountType::Fixed,
            ..Default::default()
        });
        let over_hundred = coefficient(CoefficientType::Discount, 150.0, 1);
        let negative_multiplier = coefficient(CoefficientType::BasePrice, -2.0, 1);

        for c in [huge, over_hundred, negative_multiplier] {
            let result = apply_coefficients(50.0, 1, &[c]);
            assert!(result.final_price >= 0.0);
            assert!(result.total_discount >= 0.0);
        }
    }

    #[test]
    fn test_zero_base_price() {
        let result = apply_coefficients(0.0, 1, &[coefficient(CoefficientType::Discount, 10.0, 1)]);
        assert_eq!(result.final_price, 0.0);
        assert_eq!(result.total_discount_percentage, 0.0);
    }

    #[test]
    fn test_no_coefficients_is_identity() {
        let result = apply_coefficients(42.0, 3, &[]);
        assert_eq!(result.final_price, 42.0);
        assert!(!result.has_adjustments());
    }
}
