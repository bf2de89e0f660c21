use meridian_core::Promotion;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    pub base_pricing: BasePricingConfig,
    #[serde(default)]
    pub pricing: PricingRules,
    #[serde(default)]
    pub shipping: ShippingRules,
    #[serde(default)]
    pub promotions: Vec<Promotion>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// Coefficients live in memory when no URL is configured
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    #[serde(default)]
    pub run_migrations: bool,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            run_migrations: false,
            max_connections: default_max_connections(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
        }
    }
}

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout_ms() -> u64 { 3000 }

/// Prices are cached in process memory when no URL is configured
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RedisConfig {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BasePricingConfig {
    pub url: String,
    #[serde(default = "default_upstream_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingRules {
    /// Applied to final prices to get display prices (0.20 = 20%)
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
    #[serde(default = "default_cache_timeout_ms")]
    pub cache_timeout_ms: u64,
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            tax_rate: default_tax_rate(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
            cache_timeout_ms: default_cache_timeout_ms(),
            upstream_timeout_ms: default_upstream_timeout_ms(),
        }
    }
}

fn default_tax_rate() -> f64 { 0.20 }
fn default_cache_ttl_seconds() -> u64 { 300 }
fn default_cache_timeout_ms() -> u64 { 250 }
fn default_upstream_timeout_ms() -> u64 { 2000 }

/// Upper weight bound (inclusive) and the flat cost of a shipping bracket
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct WeightBracket {
    pub up_to_kg: f64,
    pub cost: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ShippingRules {
    pub free_shipping_threshold: f64,
    /// Sorted by `up_to_kg`
    pub brackets: Vec<WeightBracket>,
    /// Charged above the last bracket, plus `heavy_per_kg` for each kg beyond it
    pub heavy_base_fee: f64,
    pub heavy_per_kg: f64,
    pub standard_delivery_days: u32,
    pub remote_delivery_days: u32,
    #[serde(default)]
    pub remote_postal_prefixes: Vec<String>,
}

impl Default for ShippingRules {
    fn default() -> Self {
        Self {
            free_shipping_threshold: 500.0,
            brackets: vec![
                WeightBracket { up_to_kg: 5.0, cost: 9.90 },
                WeightBracket { up_to_kg: 20.0, cost: 19.90 },
                WeightBracket { up_to_kg: 50.0, cost: 39.90 },
            ],
            heavy_base_fee: 59.90,
            heavy_per_kg: 1.0,
            standard_delivery_days: 3,
            remote_delivery_days: 7,
            remote_postal_prefixes: vec!["971".into(), "972".into(), "973".into(), "974".into(), "976".into(), "20".into()],
        }
    }
}

impl ShippingRules {
    /// Orders brackets by ascending `up_to_kg`, as bracket lookup expects.
    pub fn sort_brackets(&mut self) {
        self.brackets.sort_by(|a, b| a.up_to_kg.total_cmp(&b.up_to_kg));
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // MERIDIAN__PRICING__TAX_RATE=0.055 overrides pricing.tax_rate
            .add_source(config::Environment::with_prefix("MERIDIAN").separator("__"))
            .build()?;

        let mut cfg: Config = s.try_deserialize()?;
        cfg.shipping.sort_brackets();
        Ok(cfg)
    }
}
