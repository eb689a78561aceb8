//! 商品服务：每个操作对应一次存储调用

use std::sync::Arc;
use tracing::info;

use super::{
    id::ProductId,
    model::{CreateProductInput, Product, UpdateProductInput},
    store::{ProductStore, StoreError},
};

/// Gateway between handlers and the injected store. Exactly one store call
/// per operation, no retries.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn ProductStore>,
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    pub async fn create_product(&self, input: CreateProductInput) -> Result<Product, StoreError> {
        let product = self.store.insert(input).await?;
        info!("Created product: {} ({})", product.name, product.id);
        Ok(product)
    }

    pub async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        self.store.find_by_id(id).await
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        self.store.find_all().await
    }

    pub async fn update_product(
        &self,
        id: &ProductId,
        patch: UpdateProductInput,
    ) -> Result<Option<Product>, StoreError> {
        let product = self.store.update_by_id(id, patch).await?;
        if let Some(product) = &product {
            info!("Updated product: {} ({})", product.name, product.id);
        }
        Ok(product)
    }

    pub async fn delete_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let product = self.store.delete_by_id(id).await?;
        if product.is_some() {
            info!("Deleted product: {}", id);
        }
        Ok(product)
    }
}
