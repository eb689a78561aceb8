//! 商品存储抽象
//!
//! 持久化只经由 [`ProductStore`]。未配置数据库时使用内存实现，
//! Postgres 实现见 `infrastructure::database`。

use async_trait::async_trait;
use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::RwLock;

use super::{
    id::ProductId,
    model::{CreateProductInput, Product, UpdateProductInput},
};

/// Infrastructure failures. Absent records are `Ok(None)`, not errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store backend error: {0}")]
    Backend(String),
    #[error("corrupt record {id}: {reason}")]
    CorruptRecord { id: String, reason: String },
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Persists a validated input with a generated id and timestamps.
    async fn insert(&self, input: CreateProductInput) -> Result<Product, StoreError>;

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;

    async fn find_all(&self) -> Result<Vec<Product>, StoreError>;

    /// Applies the patch and refreshes `updated_at`.
    async fn update_by_id(
        &self,
        id: &ProductId,
        patch: UpdateProductInput,
    ) -> Result<Option<Product>, StoreError>;

    /// Removes the product and returns it.
    async fn delete_by_id(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;
}

/// Products kept in insertion order behind a tokio `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    products: RwLock<IndexMap<ProductId, Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn insert(&self, input: CreateProductInput) -> Result<Product, StoreError> {
        let product = Product::create(ProductId::generate(), input, chrono::Utc::now());
        let mut products = self.products.write().await;
        products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let products = self.products.read().await;
        Ok(products.get(id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().await;
        Ok(products.values().cloned().collect())
    }

    async fn update_by_id(
        &self,
        id: &ProductId,
        patch: UpdateProductInput,
    ) -> Result<Option<Product>, StoreError> {
        let mut products = self.products.write().await;
        Ok(products.get_mut(id).map(|product| {
            product.apply(patch, chrono::Utc::now());
            product.clone()
        }))
    }

    async fn delete_by_id(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let mut products = self.products.write().await;
        Ok(products.shift_remove(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> CreateProductInput {
        CreateProductInput {
            name: name.to_string(),
            description: format!("{name} description"),
        }
    }

    #[tokio::test]
    async fn test_insert_then_find() {
        let store = InMemoryProductStore::new();
        let created = store.insert(input("Test product")).await.unwrap();

        let found = store.find_by_id(&created.id).await.unwrap();
        assert_eq!(found, Some(created.clone()));
        assert_eq!(created.created_at, created.updated_at);
    }

    #[tokio::test]
    async fn test_find_unknown_id_is_none() {
        let store = InMemoryProductStore::new();
        let id = ProductId::parse("63786439be8ca060c32d1c48").unwrap();
        assert_eq!(store.find_by_id(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_all_keeps_insertion_order_after_delete() {
        let store = InMemoryProductStore::new();
        let first = store.insert(input("first")).await.unwrap();
        let second = store.insert(input("second")).await.unwrap();
        let third = store.insert(input("third")).await.unwrap();

        store.delete_by_id(&second.id).await.unwrap();

        let ids: Vec<_> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![first.id, third.id]);
    }

    #[tokio::test]
    async fn test_update_refreshes_updated_at() {
        let store = InMemoryProductStore::new();
        let created = store.insert(input("Test product")).await.unwrap();

        let updated = store
            .update_by_id(
                &created.id,
                UpdateProductInput {
                    name: None,
                    description: Some("changed".to_string()),
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Test product");
        assert_eq!(updated.description, "changed");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_none() {
        let store = InMemoryProductStore::new();
        let id = ProductId::generate();
        let result = store
            .update_by_id(&id, UpdateProductInput::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let store = InMemoryProductStore::new();
        let created = store.insert(input("Test product")).await.unwrap();

        assert!(store.delete_by_id(&created.id).await.unwrap().is_some());
        assert!(store.delete_by_id(&created.id).await.unwrap().is_none());
        assert!(store.find_by_id(&created.id).await.unwrap().is_none());
    }
}
