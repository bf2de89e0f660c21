use meridian_shared::round_cents;
use meridian_store::app_config::ShippingRules;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingLine {
    pub article_id: String,
    pub quantity: i32,
    /// Unit weight
    pub weight_kg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShippingQuote {
    pub shipping_cost: f64,
    pub estimated_delivery_days: u32,
    pub total_weight: f64,
    /// Tax-inclusive value of the shipped goods
    pub order_value: f64,
    pub free_shipping: bool,
}

pub fn total_weight(lines: &[ShippingLine]) -> f64 {
    lines
        .iter()
        .map(|line| line.weight_kg.max(0.0) * f64::from(line.quantity))
        .sum()
}

fn heavy(rules: &ShippingRules, weight_kg: f64) -> bool {
    rules
        .brackets
        .last()
        .map_or(true, |top| weight_kg > top.up_to_kg)
}

/// Bracket cost for `weight_kg`, ignoring the free-shipping threshold.
pub fn tiered_cost(rules: &ShippingRules, weight_kg: f64) -> f64 {
    if let Some(bracket) = rules.brackets.iter().find(|b| weight_kg <= b.up_to_kg) {
        return round_cents(bracket.cost);
    }

    let floor = rules.brackets.last().map_or(0.0, |top| top.up_to_kg);
    round_cents(rules.heavy_base_fee + (weight_kg - floor).max(0.0) * rules.heavy_per_kg)
}

pub fn delivery_days(rules: &ShippingRules, postal_code: &str, weight_kg: f64) -> u32 {
    let postal_code = postal_code.trim();
    let remote = rules
        .remote_postal_prefixes
        .iter()
        .any(|prefix| postal_code.starts_with(prefix.as_str()));
    let days = if remote {
        rules.remote_delivery_days
    } else {
        rules.standard_delivery_days
    };

    if heavy(rules, weight_kg) {
        days + 1
    } else {
        days
    }
}

pub fn quote(rules: &ShippingRules, order_value: f64, weight_kg: f64, postal_code: &str) -> ShippingQuote {
    let free_shipping = order_value >= rules.free_shipping_threshold;
    ShippingQuote {
        shipping_cost: if free_shipping { 0.0 } else { tiered_cost(rules, weight_kg) },
        estimated_delivery_days: delivery_days(rules, postal_code, weight_kg),
        total_weight: weight_kg,
        order_value: round_cents(order_value),
        free_shipping,
    }
}
