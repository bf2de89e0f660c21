use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use meridian_api::{app, AppState};
use meridian_core::{CacheStore, CoefficientAdminStore, CoefficientStore};
use meridian_market::{MarketplacePricing, PricingCache, SectorAdmin};
use meridian_store::app_config::Config;
use meridian_store::{
    DbClient, HttpBasePriceClient, InMemoryCacheStore, InMemoryCoefficientStore, PgCoefficientStore,
    RedisClient, StaticPromotionTable,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meridian_api=debug,meridian_market=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Meridian pricing API on port {}", config.server.port);

    let cache_store: Arc<dyn CacheStore> = match &config.redis.url {
        Some(url) => {
            let redis = RedisClient::new(url).await.context("Invalid Redis URL")?;
            // Unreachable Redis only degrades caching
            if let Err(e) = redis.ping().await {
                tracing::warn!("Redis not reachable yet: {}", e);
            }
            Arc::new(redis)
        }
        None => {
            tracing::info!("No Redis configured, caching prices in process memory");
            Arc::new(InMemoryCacheStore::new())
        }
    };

    let (coefficients, coefficient_admin): (Arc<dyn CoefficientStore>, Arc<dyn CoefficientAdminStore>) =
        match &config.database.url {
            Some(url) => {
                let db = DbClient::connect(url, &config.database)
                    .await
                    .context("Failed to connect to Postgres")?;
                if config.database.run_migrations {
                    db.migrate().await.context("Failed to run migrations")?;
                }
                let store = Arc::new(PgCoefficientStore::new(db.pool.clone()));
                (store.clone() as Arc<dyn CoefficientStore>, store as Arc<dyn CoefficientAdminStore>)
            }
            None => {
                tracing::warn!("No database configured, sector coefficients are kept in memory");
                let store = Arc::new(InMemoryCoefficientStore::new());
                (store.clone() as Arc<dyn CoefficientStore>, store as Arc<dyn CoefficientAdminStore>)
            }
        };

    let base_prices = HttpBasePriceClient::new(
        &config.base_pricing.url,
        Duration::from_millis(config.base_pricing.timeout_ms),
    )
    .context("Failed to build base pricing client")?;

    let cache = PricingCache::new(
        cache_store,
        Duration::from_secs(config.pricing.cache_ttl_seconds),
        Duration::from_millis(config.pricing.cache_timeout_ms),
    );

    let pricing = MarketplacePricing::new(
        Arc::new(base_prices),
        coefficients,
        cache.clone(),
        Arc::new(StaticPromotionTable::new(config.promotions.clone())),
        config.pricing.clone(),
        config.shipping.clone(),
    );

    let app_state = AppState {
        pricing: Arc::new(pricing),
        admin: Arc::new(SectorAdmin::new(coefficient_admin, cache)),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
