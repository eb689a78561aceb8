//! 商品资源：id、校验、存储、服务与处理器

pub mod handler;
pub mod id;
pub mod model;
pub mod service;
pub mod store;
pub mod validation;

use axum::{routing::get, Router};

use crate::app::AppState;

pub use id::{IdError, ProductId};
pub use model::{CreateProductInput, Product, UpdateProductInput};
pub use service::ProductService;
pub use store::{InMemoryProductStore, ProductStore, StoreError};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(handler::list_products).post(handler::create_product),
        )
        .route(
            "/products/:id",
            get(handler::get_product)
                .put(handler::update_product)
                .delete(handler::delete_product),
        )
}
