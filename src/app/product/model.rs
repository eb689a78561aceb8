//! 商品数据模型与响应体

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Builds a freshly created product; creation counts as the first update.
    pub fn create(id: ProductId, input: CreateProductInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the supplied fields and refreshes `updated_at`, never moving
    /// it before `created_at`.
    pub fn apply(&mut self, patch: UpdateProductInput, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        self.updated_at = now.max(self.created_at);
    }
}

/// A create body that passed validation: both fields present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateProductInput {
    pub name: String,
    pub description: String,
}

/// An update body that passed validation. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductResponse {
    pub product: Product,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductUpdatedResponse {
    pub message: String,
    pub product: Product,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> Product {
        Product::create(
            ProductId::generate(),
            CreateProductInput {
                name: "Test product".to_string(),
                description: "Testing product's description".to_string(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_create_sets_equal_timestamps() {
        let product = sample();
        assert_eq!(product.created_at, product.updated_at);
    }

    #[test]
    fn test_apply_patches_only_given_fields() {
        let mut product = sample();
        let later = product.created_at + Duration::seconds(5);
        product.apply(
            UpdateProductInput {
                name: Some("Renamed".to_string()),
                description: None,
            },
            later,
        );

        assert_eq!(product.name, "Renamed");
        assert_eq!(product.description, "Testing product's description");
        assert_eq!(product.updated_at, later);
    }

    #[test]
    fn test_apply_never_moves_updated_at_before_created_at() {
        let mut product = sample();
        let earlier = product.created_at - Duration::seconds(30);
        product.apply(UpdateProductInput::default(), earlier);
        assert_eq!(product.updated_at, product.created_at);
    }

    #[test]
    fn test_product_serializes_camel_case() {
        let value = serde_json::to_value(sample()).unwrap();
        assert!(value.get("id").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert!(value.get("created_at").is_none());
    }
}
