//! 应用入口：共享状态、`/api` 路由与健康检查

pub mod product;

use axum::{http::StatusCode, middleware, routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::core::middleware::request_logging_middleware;
use product::{ProductService, ProductStore};

/// State shared by every handler. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub product_service: ProductService,
}

impl AppState {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self {
            product_service: ProductService::new(store),
        }
    }
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health-check", get(health_check))
        .merge(product::routes())
}

/// Builds the full router with all routes mounted under `/api`.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(middleware::from_fn(request_logging_middleware)),
        )
        .with_state(state)
}
