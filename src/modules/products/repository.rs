//! Product persistence.
//!
//! The service talks to a [`ProductRepository`] so that cache behaviour can
//! be exercised against an in-memory store in tests.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use shopfront_core::AppError;

use super::model::{CategoryStats, CreateProductDto, Product, ProductSummary, UpdateProductDto};

const PRODUCT_COLUMNS: &str = "id, name, price, category, description, image, created_at";

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products projected to id/name/price/category, oldest first.
    async fn list_summaries(&self) -> Result<Vec<ProductSummary>, AppError>;

    /// One page of case-insensitive name matches plus the full match count.
    async fn search(
        &self,
        name: &str,
        skip: i64,
        limit: i64,
    ) -> Result<(Vec<Product>, i64), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError>;

    async fn insert(&self, dto: CreateProductDto) -> Result<Product, AppError>;

    async fn insert_many(&self, dtos: Vec<CreateProductDto>) -> Result<Vec<Product>, AppError>;

    /// Applies the present fields of `patch`. `None` if the id does not exist.
    async fn update(&self, id: Uuid, patch: UpdateProductDto)
    -> Result<Option<Product>, AppError>;

    /// Returns false if nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// Products priced within `[min, max]`, cheapest first.
    async fn filter_by_price(&self, min: f64, max: f64) -> Result<Vec<Product>, AppError>;

    /// Count and price aggregates per category, ordered by category.
    async fn stats(&self) -> Result<Vec<CategoryStats>, AppError>;
}

/// Escapes `LIKE` wildcards so user input only matches literally.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone)]
pub struct PgProductRepository {
    db: PgPool,
}

impl PgProductRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn list_summaries(&self) -> Result<Vec<ProductSummary>, AppError> {
        sqlx::query_as::<_, ProductSummary>(
            "SELECT id, name, price, category FROM products ORDER BY created_at, id",
        )
        .fetch_all(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error listing products");
            AppError::from(e)
        })
    }

    async fn search(
        &self,
        name: &str,
        skip: i64,
        limit: i64,
    ) -> Result<(Vec<Product>, i64), AppError> {
        let pattern = format!("%{}%", escape_like(name));

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE name ILIKE $1")
            .bind(&pattern)
            .fetch_one(&self.db)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error counting product matches");
                AppError::from(e)
            })?;

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE name ILIKE $1
             ORDER BY created_at, id LIMIT $2 OFFSET $3"
        ))
        .bind(&pattern)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error searching products");
            AppError::from(e)
        })?;

        Ok((products, total))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            error!(product.id = %id, error = %e, "Database error fetching product");
            AppError::from(e)
        })
    }

    async fn insert(&self, dto: CreateProductDto) -> Result<Product, AppError> {
        sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (name, price, category, description, image)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&dto.name)
        .bind(dto.price)
        .bind(&dto.category)
        .bind(&dto.description)
        .bind(&dto.image)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            error!(product.name = %dto.name, error = %e, "Database error creating product");
            AppError::from(e)
        })
    }

    async fn insert_many(&self, dtos: Vec<CreateProductDto>) -> Result<Vec<Product>, AppError> {
        let mut tx = self.db.begin().await?;
        let mut products = Vec::with_capacity(dtos.len());

        for dto in dtos {
            let product = sqlx::query_as::<_, Product>(&format!(
                "INSERT INTO products (name, price, category, description, image)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING {PRODUCT_COLUMNS}"
            ))
            .bind(&dto.name)
            .bind(dto.price)
            .bind(&dto.category)
            .bind(&dto.description)
            .bind(&dto.image)
            .fetch_one(&mut *tx)
            .await?;
            products.push(product);
        }

        tx.commit().await?;
        Ok(products)
    }

    async fn update(
        &self,
        id: Uuid,
        patch: UpdateProductDto,
    ) -> Result<Option<Product>, AppError> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET
                name = COALESCE($2, name),
                price = COALESCE($3, price),
                category = COALESCE($4, category),
                description = COALESCE($5, description),
                image = COALESCE($6, image)
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&patch.name)
        .bind(patch.price)
        .bind(&patch.category)
        .bind(&patch.description)
        .bind(&patch.image)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            error!(product.id = %id, error = %e, "Database error updating product");
            AppError::from(e)
        })
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| {
                error!(product.id = %id, error = %e, "Database error deleting product");
                AppError::from(e)
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn filter_by_price(&self, min: f64, max: f64) -> Result<Vec<Product>, AppError> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE price >= $1 AND price <= $2
             ORDER BY price, id"
        ))
        .bind(min)
        .bind(max)
        .fetch_all(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error filtering products by price");
            AppError::from(e)
        })
    }

    async fn stats(&self) -> Result<Vec<CategoryStats>, AppError> {
        sqlx::query_as::<_, CategoryStats>(
            "SELECT category,
                    COUNT(*) AS count,
                    AVG(price) AS avg_price,
                    MIN(price) AS min_price,
                    MAX(price) AS max_price
             FROM products
             GROUP BY category
             ORDER BY category NULLS LAST",
        )
        .fetch_all(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error aggregating product stats");
            AppError::from(e)
        })
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryProductRepository;

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use tokio::sync::RwLock;

    use super::*;

    /// Vec-backed repository that counts reads of the cacheable queries.
    #[derive(Debug, Default)]
    pub struct MemoryProductRepository {
        products: RwLock<Vec<Product>>,
        cacheable_reads: AtomicUsize,
    }

    impl MemoryProductRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of `list_summaries` and `search` calls that reached the store.
        pub fn cacheable_reads(&self) -> usize {
            self.cacheable_reads.load(Ordering::SeqCst)
        }

        fn build(dto: CreateProductDto) -> Product {
            Product {
                id: Uuid::new_v4(),
                name: dto.name,
                price: dto.price,
                category: dto.category,
                description: dto.description,
                image: dto.image,
                created_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl ProductRepository for MemoryProductRepository {
        async fn list_summaries(&self) -> Result<Vec<ProductSummary>, AppError> {
            self.cacheable_reads.fetch_add(1, Ordering::SeqCst);
            let products = self.products.read().await;
            Ok(products.iter().map(ProductSummary::from).collect())
        }

        async fn search(
            &self,
            name: &str,
            skip: i64,
            limit: i64,
        ) -> Result<(Vec<Product>, i64), AppError> {
            self.cacheable_reads.fetch_add(1, Ordering::SeqCst);
            let needle = name.to_lowercase();
            let products = self.products.read().await;
            let matches: Vec<&Product> = products
                .iter()
                .filter(|p| p.name.to_lowercase().contains(&needle))
                .collect();

            let total = matches.len() as i64;
            let page = matches
                .into_iter()
                .skip(skip.max(0) as usize)
                .take(limit.max(0) as usize)
                .cloned()
                .collect();

            Ok((page, total))
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
            let products = self.products.read().await;
            Ok(products.iter().find(|p| p.id == id).cloned())
        }

        async fn insert(&self, dto: CreateProductDto) -> Result<Product, AppError> {
            let product = Self::build(dto);
            self.products.write().await.push(product.clone());
            Ok(product)
        }

        async fn insert_many(
            &self,
            dtos: Vec<CreateProductDto>,
        ) -> Result<Vec<Product>, AppError> {
            let created: Vec<Product> = dtos.into_iter().map(Self::build).collect();
            self.products.write().await.extend(created.iter().cloned());
            Ok(created)
        }

        async fn update(
            &self,
            id: Uuid,
            patch: UpdateProductDto,
        ) -> Result<Option<Product>, AppError> {
            let mut products = self.products.write().await;
            let Some(product) = products.iter_mut().find(|p| p.id == id) else {
                return Ok(None);
            };

            if let Some(name) = patch.name {
                product.name = name;
            }
            if let Some(price) = patch.price {
                product.price = price;
            }
            if patch.category.is_some() {
                product.category = patch.category;
            }
            if patch.description.is_some() {
                product.description = patch.description;
            }
            if patch.image.is_some() {
                product.image = patch.image;
            }

            Ok(Some(product.clone()))
        }

        async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
            let mut products = self.products.write().await;
            let before = products.len();
            products.retain(|p| p.id != id);
            Ok(products.len() < before)
        }

        async fn filter_by_price(&self, min: f64, max: f64) -> Result<Vec<Product>, AppError> {
            let products = self.products.read().await;
            let mut matches: Vec<Product> = products
                .iter()
                .filter(|p| p.price >= min && p.price <= max)
                .cloned()
                .collect();
            matches.sort_by(|a, b| a.price.total_cmp(&b.price));
            Ok(matches)
        }

        async fn stats(&self) -> Result<Vec<CategoryStats>, AppError> {
            let products = self.products.read().await;
            let mut groups: BTreeMap<Option<String>, Vec<f64>> = BTreeMap::new();
            for p in products.iter() {
                groups.entry(p.category.clone()).or_default().push(p.price);
            }

            let mut stats: Vec<CategoryStats> = groups
                .into_iter()
                .map(|(category, prices)| {
                    let count = prices.len() as i64;
                    let sum: f64 = prices.iter().sum();
                    CategoryStats {
                        category,
                        count,
                        avg_price: sum / count as f64,
                        min_price: prices.iter().copied().fold(f64::INFINITY, f64::min),
                        max_price: prices.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                    }
                })
                .collect();

            // BTreeMap orders None first; the SQL version puts it last.
            stats.sort_by(|a, b| match (&a.category, &b.category) {
                (None, None) => std::cmp::Ordering::Equal,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (Some(_), None) => std::cmp::Ordering::Less,
                (Some(x), Some(y)) => x.cmp(y),
            });

            Ok(stats)
        }
    }
}
