use chrono::{DateTime, Datelike, Utc, Weekday};
use meridian_shared::{ParseEnumError, Sector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of adjustment a coefficient performs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoefficientType {
    BasePrice,
    Margin,
    Discount,
    Transport,
    Handling,
}

impl CoefficientType {
    pub const ALL: [CoefficientType; 5] = [
        CoefficientType::BasePrice,
        CoefficientType::Margin,
        CoefficientType::Discount,
        CoefficientType::Transport,
        CoefficientType::Handling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CoefficientType::BasePrice => "BASE_PRICE",
            CoefficientType::Margin => "MARGIN",
            CoefficientType::Discount => "DISCOUNT",
            CoefficientType::Transport => "TRANSPORT",
            CoefficientType::Handling => "HANDLING",
        }
    }
}

impl fmt::Display for CoefficientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoefficientType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CoefficientType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseEnumError {
                kind: "coefficient type",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarginType {
    /// Multiplier on the running price (1.15 = +15%)
    #[default]
    Percentage,
    /// Amount added to the running price
    Fixed,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    #[default]
    Percentage,
    Fixed,
    Progressive,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalculationMethod {
    #[default]
    Fixed,
    PerUnit,
}

/// Quantity break for progressive discounts; `rate` is a percentage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscountTier {
    pub min_quantity: i32,
    pub rate: f64,
}

/// Type-specific knobs. Only the fields relevant to the coefficient's type are read.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoefficientParameters {
    pub margin_type: MarginType,
    pub discount_type: DiscountType,
    pub progressive_tiers: Vec<DiscountTier>,
    pub calculation_method: CalculationMethod,
    pub free_threshold: Option<f64>,
}

/// Applicability conditions.
///
/// Every populated field must match; `None` and empty lists impose nothing.
/// A populated list fails when the evaluated context has no value for it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoefficientConditions {
    pub min_quantity: Option<i32>,
    pub max_quantity: Option<i32>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub customer_types: Vec<String>,
    pub product_categories: Vec<String>,
    pub article_families: Vec<String>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub weekdays: Vec<Weekday>,
    pub regions: Vec<String>,
}

/// Values a coefficient's conditions are evaluated against
#[derive(Debug, Clone)]
pub struct ConditionInput<'a> {
    pub quantity: i32,
    pub amount: f64,
    pub customer_type: Option<&'a str>,
    pub product_category: Option<&'a str>,
    pub article_family: Option<&'a str>,
    pub region: Option<&'a str>,
    pub date: DateTime<Utc>,
}

impl CoefficientConditions {
    pub fn matches(&self, input: &ConditionInput<'_>) -> bool {
        if self.min_quantity.is_some_and(|min| input.quantity < min) {
            return false;
        }
        if self.max_quantity.is_some_and(|max| input.quantity > max) {
            return false;
        }
        if self.min_amount.is_some_and(|min| input.amount < min) {
            return false;
        }
        if self.max_amount.is_some_and(|max| input.amount > max) {
            return false;
        }
        if self.valid_from.is_some_and(|from| input.date < from) {
            return false;
        }
        if self.valid_until.is_some_and(|until| input.date > until) {
            return false;
        }
        if !self.weekdays.is_empty() && !self.weekdays.contains(&input.date.weekday()) {
            return false;
        }

        list_allows(&self.customer_types, input.customer_type)
            && list_allows(&self.product_categories, input.product_category)
            && list_allows(&self.article_families, input.article_family)
            && list_allows(&self.regions, input.region)
    }
}

fn list_allows(allowed: &[String], value: Option<&str>) -> bool {
    if allowed.is_empty() {
        return true;
    }
    match value {
        Some(v) => allowed.iter().any(|a| a.eq_ignore_ascii_case(v)),
        None => false,
    }
}

/// Tenant-scoped pricing adjustment rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectorCoefficient {
    pub id: Uuid,
    pub tenant_id: String,
    /// `None` applies to every customer, classified or not
    pub sector: Option<Sector>,
    pub coefficient_type: CoefficientType,
    pub coefficient: f64,
    pub description: Option<String>,
    pub is_active: bool,
    pub priority: i32,
    #[serde(default)]
    pub conditions: CoefficientConditions,
    #[serde(default)]
    pub parameters: CoefficientParameters,
    pub created_at: DateTime<Utc>,
}

impl SectorCoefficient {
    pub fn new(
        tenant_id: impl Into<String>,
        sector: Option<Sector>,
        coefficient_type: CoefficientType,
        coefficient: f64,
        priority: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.into(),
            sector,
            coefficient_type,
            coefficient,
            description: None,
            is_active: true,
            priority,
            conditions: CoefficientConditions::default(),
            parameters: CoefficientParameters::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_conditions(mut self, conditions: CoefficientConditions) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_parameters(mut self, parameters: CoefficientParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Whether this coefficient is in scope for a customer resolved to `sector`.
    pub fn applies_to_sector(&self, sector: Option<Sector>) -> bool {
        match self.sector {
            None => true,
            Some(own) => sector == Some(own),
        }
    }

    /// Label used in `applied_rules`, e.g. `CONSTRUCTION_DISCOUNT`
    pub fn rule_label(&self) -> String {
        let scope = self.sector.map(|s| s.as_str()).unwrap_or("ALL");
        format!("{}_{}", scope, self.coefficient_type)
    }

    /// Price after applying this coefficient to `current`. Never negative.
    pub fn adjusted_price(&self, current: f64, quantity: i32) -> f64 {
        let c = self.coefficient;
        let adjusted = match self.coefficient_type {
            CoefficientType::BasePrice => current * c,
            CoefficientType::Margin => match self.parameters.margin_type {
                MarginType::Percentage => current * c,
                MarginType::Fixed => current + c,
            },
            CoefficientType::Discount => match self.parameters.discount_type {
                DiscountType::Percentage => current * (1.0 - c / 100.0),
                DiscountType::Fixed => current - c,
                DiscountType::Progressive => match self.progressive_rate(quantity) {
                    Some(rate) => current * (1.0 - rate / 100.0),
                    None => current,
                },
            },
            CoefficientType::Transport | CoefficientType::Handling => {
                match self.parameters.calculation_method {
                    CalculationMethod::PerUnit => current + c * f64::from(quantity),
                    CalculationMethod::Fixed => match self.parameters.free_threshold {
                        Some(threshold) if current >= threshold => current,
                        _ => current + c,
                    },
                }
            }
        };

        adjusted.max(0.0)
    }

    /// Rate of the highest tier whose `min_quantity` is reached
    pub fn progressive_rate(&self, quantity: i32) -> Option<f64> {
        self.parameters
            .progressive_tiers
            .iter()
            .filter(|tier| tier.min_quantity <= quantity)
            .max_by_key(|tier| tier.min_quantity)
            .map(|tier| tier.rate)
    }
}
