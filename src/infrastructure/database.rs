//! Postgres 商品存储
//!
//! 每个操作都是一条带 `RETURNING` 的语句，不需要事务。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

use crate::app::product::{
    CreateProductInput, Product, ProductId, ProductStore, StoreError, UpdateProductInput,
};
use crate::config::DatabaseConfig;

const PRODUCT_COLUMNS: &str = "id, name, description, created_at, updated_at";

pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    pub async fn new(database_url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(database_url)
            .await?;

        info!("Connected to database");
        Ok(Self { pool })
    }

    /// Creates the products table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id TEXT PRIMARY KEY CHECK (char_length(id) = 24),
                name TEXT NOT NULL CHECK (name <> ''),
                description TEXT NOT NULL CHECK (description <> ''),
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL CHECK (updated_at >= created_at)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub fn product_store(&self) -> PgProductStore {
        PgProductStore::new(self.pool.clone())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Disconnected from database");
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let id = ProductId::parse(&row.id).map_err(|e| StoreError::CorruptRecord {
            id: row.id.clone(),
            reason: e.to_string(),
        })?;

        Ok(Product {
            id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_product(row: Option<ProductRow>) -> Result<Option<Product>, StoreError> {
    row.map(Product::try_from).transpose()
}

#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn insert(&self, input: CreateProductInput) -> Result<Product, StoreError> {
        let product = Product::create(ProductId::generate(), input, Utc::now());

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) VALUES ($1, $2, $3, $4, $4) RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(product.id.to_string())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.created_at)
        .fetch_one(&self.pool)
        .await?;

        Product::try_from(row)
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        into_product(row)
    }

    async fn find_all(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    async fn update_by_id(
        &self,
        id: &ProductId,
        patch: UpdateProductInput,
    ) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET \
                name = COALESCE($1, name), \
                description = COALESCE($2, description), \
                updated_at = GREATEST($3, created_at) \
             WHERE id = $4 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(patch.name)
        .bind(patch.description)
        .bind(Utc::now())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        into_product(row)
    }

    async fn delete_by_id(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "DELETE FROM products WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        into_product(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str) -> ProductRow {
        let now = Utc::now();
        ProductRow {
            id: id.to_string(),
            name: "Test product".to_string(),
            description: "Testing product's description".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_converts_to_product() {
        let product = Product::try_from(row("63786439be8ca060c32d1c48")).unwrap();
        assert_eq!(product.id.to_string(), "63786439be8ca060c32d1c48");
        assert_eq!(product.name, "Test product");
    }

    #[test]
    fn test_corrupt_row_is_reported() {
        let err = Product::try_from(row("not-an-id")).unwrap_err();
        assert!(matches!(err, StoreError::CorruptRecord { .. }));
    }

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::Backend(_)
        ));
    }

    #[tokio::test]
    #[ignore = "needs a Postgres instance at DATABASE_URL"]
    async fn test_pg_store_statements() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL is not set");
        let manager = DatabaseManager::new(&url, &DatabaseConfig::default())
            .await
            .unwrap();
        manager.ensure_schema().await.unwrap();
        let store = manager.product_store();

        let created = store
            .insert(CreateProductInput {
                name: "Test product".to_string(),
                description: "Testing product's description".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(store.find_by_id(&created.id).await.unwrap(), Some(created.clone()));
        assert!(store
            .find_all()
            .await
            .unwrap()
            .iter()
            .any(|product| product.id == created.id));

        // COALESCE keeps the description, GREATEST keeps updated_at >= created_at
        let renamed = store
            .update_by_id(
                &created.id,
                UpdateProductInput {
                    name: Some("Renamed".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.name, "Renamed");
        assert_eq!(renamed.description, created.description);
        assert_eq!(renamed.created_at, created.created_at);
        assert!(renamed.updated_at >= renamed.created_at);

        let touched = store
            .update_by_id(&created.id, UpdateProductInput::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(touched.name, "Renamed");
        assert!(touched.updated_at >= renamed.updated_at);

        let unknown = ProductId::parse("63786439be8ca060c32d1c48").unwrap();
        assert!(store
            .update_by_id(&unknown, UpdateProductInput::default())
            .await
            .unwrap()
            .is_none());

        let deleted = store.delete_by_id(&created.id).await.unwrap();
        assert_eq!(deleted.map(|product| product.id), Some(created.id));
        assert!(store.delete_by_id(&created.id).await.unwrap().is_none());
        assert!(store.find_by_id(&created.id).await.unwrap().is_none());

        manager.close().await;
    }
}
