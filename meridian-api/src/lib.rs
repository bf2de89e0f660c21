use axum::{http::{HeaderName, Method}, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod cache;
pub mod error;
pub mod health;
pub mod middleware;
pub mod prices;
pub mod promotions;
pub mod shipping;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
            HeaderName::from_static(middleware::tenant::TENANT_HEADER),
        ]);

    Router::new()
        .merge(health::routes())
        .merge(prices::routes())
        .merge(shipping::routes())
        .merge(promotions::routes())
        .merge(cache::routes())
        .merge(admin::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
