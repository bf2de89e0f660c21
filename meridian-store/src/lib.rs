pub mod app_config;
pub mod memory;
pub mod redis_repo;
pub mod database;
pub mod coefficient_repo;
pub mod base_price_client;

pub use redis_repo::RedisClient;
pub use database::DbClient;
pub use coefficient_repo::PgCoefficientStore;
pub use base_price_client::HttpBasePriceClient;
pub use memory::{InMemoryCacheStore, InMemoryCoefficientStore, ListPriceProvider, StaticPromotionTable};
