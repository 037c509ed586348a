use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use shopfront_core::pagination::deserialize_optional_i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub category: Option<String>,
    pub description: Option<String>,
    /// Stored image file name, if any.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Listing projection: only the fields the catalogue page shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub category: Option<String>,
}

impl From<&Product> for ProductSummary {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            price: p.price,
            category: p.category.clone(),
        }
    }
}

fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(s.trim().to_string())
}

fn trimmed_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.map(|s| s.trim().to_string()))
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductDto {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    pub name: String,
    #[validate(range(min = 0.0, message = "Price must be a non-negative number"))]
    pub price: f64,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Partial update. At least one field must be present.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductDto {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    pub name: Option<String>,
    #[validate(range(min = 0.0, message = "Price must be a non-negative number"))]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl UpdateProductDto {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.image.is_none()
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive substring of the product name
    pub name: Option<String>,
    /// Page number (1-indexed, default: 1)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
    /// Items per page (1-100, default: 10)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
}

/// Raw price bounds. Parsed by the handler so that bad input is a 400
/// with a stable message rather than an extractor rejection.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct PriceRangeQuery {
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchResult {
    pub products: Vec<Product>,
    /// Number of matches across all pages
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PriceFilterResponse {
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub category: Option<String>,
    pub count: i64,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_dto_trims_before_validation() {
        let dto: CreateProductDto =
            serde_json::from_value(json!({"name": "   ab   ", "price": 1.0})).unwrap();
        assert_eq!(dto.name, "ab");
        assert!(dto.validate().is_err());

        let dto: CreateProductDto =
            serde_json::from_value(json!({"name": " Widget ", "price": 10, "category": " tools "}))
                .unwrap();
        assert_eq!(dto.name, "Widget");
        assert_eq!(dto.category.as_deref(), Some("tools"));
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_create_dto_rejects_negative_price() {
        let dto: CreateProductDto =
            serde_json::from_value(json!({"name": "Widget", "price": -1})).unwrap();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_update_dto_emptiness() {
        let dto: UpdateProductDto = serde_json::from_value(json!({})).unwrap();
        assert!(dto.is_empty());

        let dto: UpdateProductDto = serde_json::from_value(json!({"price": 20})).unwrap();
        assert!(!dto.is_empty());
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_product_serializes_camel_case() {
        let product = Product {
            id: Uuid::nil(),
            name: "Widget".into(),
            price: 10.0,
            category: None,
            description: None,
            image: None,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&product).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("created_at").is_none());
    }
}
