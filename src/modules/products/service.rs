use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shopfront_cache::{Cache, invalidate, keys};
use shopfront_core::{AppError, PageParams};

use crate::metrics;
use crate::modules::products::model::{
    CategoryStats, CreateProductDto, Product, ProductSummary, SearchResult, UpdateProductDto,
};
use crate::modules::products::repository::ProductRepository;

/// Products inserted by the import endpoint.
pub fn sample_imports() -> Vec<CreateProductDto> {
    [("Imported A", 120.0), ("Imported B", 180.0), ("Imported C", 95.0)]
        .into_iter()
        .map(|(name, price)| CreateProductDto {
            name: name.to_string(),
            price,
            category: Some("imported".to_string()),
            description: None,
            image: None,
        })
        .collect()
}

/// Parses both price bounds. Either missing, or not a finite number, is a
/// client error.
pub fn parse_price_range(min: Option<&str>, max: Option<&str>) -> Result<(f64, f64), AppError> {
    let parse = |raw: Option<&str>| {
        raw.and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    };

    match (parse(min), parse(max)) {
        (Some(min), Some(max)) => Ok((min, max)),
        _ => Err(AppError::bad_request(anyhow::anyhow!("Invalid price range"))),
    }
}

pub struct ProductService;

impl ProductService {
    /// Lists every product as a summary, served from `products_all` when cached.
    #[instrument(skip(repo, cache), fields(db.operation = "SELECT", db.table = "products"))]
    pub async fn list_all(
        repo: &dyn ProductRepository,
        cache: Option<&Cache>,
    ) -> Result<Vec<ProductSummary>, AppError> {
        if let Some(cache) = cache
            && let Some(products) = cache.get::<Vec<ProductSummary>>(keys::products::ALL).await
        {
            debug!(count = products.len(), "Product list found in cache");
            return Ok(products);
        }

        let products = repo.list_summaries().await?;

        if let Some(cache) = cache
            && let Err(e) = cache.set(keys::products::ALL, &products).await
        {
            warn!(error = %e, "Failed to cache product list");
        }

        Ok(products)
    }

    /// Case-insensitive name search. The whole envelope is cached per
    /// `(name, page, limit)`.
    #[instrument(skip(repo, cache), fields(db.operation = "SELECT", db.table = "products"))]
    pub async fn search(
        repo: &dyn ProductRepository,
        cache: Option<&Cache>,
        name: &str,
        params: PageParams,
    ) -> Result<SearchResult, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Name query is required"
            )));
        }

        let page = params.page();
        let limit = params.limit();
        let cache_key = keys::products::search(name, page, limit);

        if let Some(cache) = cache
            && let Some(result) = cache.get::<SearchResult>(&cache_key).await
        {
            debug!(cache.key = %cache_key, "Search result found in cache");
            return Ok(result);
        }

        let (products, total) = repo.search(name, params.skip(), limit).await?;
        let result = SearchResult {
            products,
            total,
            page,
            limit,
        };

        if let Some(cache) = cache
            && let Err(e) = cache.set(&cache_key, &result).await
        {
            warn!(cache.key = %cache_key, error = %e, "Failed to cache search result");
        }

        Ok(result)
    }

    #[instrument(skip(repo), fields(product.id = %id, db.operation = "SELECT", db.table = "products"))]
    pub async fn get_by_id(repo: &dyn ProductRepository, id: Uuid) -> Result<Product, AppError> {
        repo.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Product not found")))
    }

    #[instrument(skip(repo, cache, dto), fields(product.name = %dto.name, db.operation = "INSERT", db.table = "products"))]
    pub async fn create(
        repo: &dyn ProductRepository,
        cache: Option<&Cache>,
        dto: CreateProductDto,
    ) -> Result<Product, AppError> {
        let product = repo.insert(dto).await?;

        invalidate::products(cache).await;
        metrics::track_product_write("create");

        info!(product.id = %product.id, product.name = %product.name, "Product created");

        Ok(product)
    }

    /// Applies a partial update.
    ///
    /// Fails with 400 when the patch is empty and 404 when the id is unknown.
    #[instrument(skip(repo, cache, patch), fields(product.id = %id, db.operation = "UPDATE", db.table = "products"))]
    pub async fn update(
        repo: &dyn ProductRepository,
        cache: Option<&Cache>,
        id: Uuid,
        patch: UpdateProductDto,
    ) -> Result<Product, AppError> {
        if patch.is_empty() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "At least one field is required"
            )));
        }

        let product = repo
            .update(id, patch)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Product not found")))?;

        invalidate::products(cache).await;
        metrics::track_product_write("update");

        info!(product.id = %product.id, "Product updated");

        Ok(product)
    }

    #[instrument(skip(repo, cache), fields(product.id = %id, db.operation = "DELETE", db.table = "products"))]
    pub async fn delete(
        repo: &dyn ProductRepository,
        cache: Option<&Cache>,
        id: Uuid,
    ) -> Result<(), AppError> {
        if !repo.delete(id).await? {
            debug!(product.id = %id, "Product not found for deletion");
            return Err(AppError::not_found(anyhow::anyhow!("Product not found")));
        }

        invalidate::products(cache).await;
        metrics::track_product_write("delete");

        info!(product.id = %id, "Product deleted");

        Ok(())
    }

    /// Always reads the store; price ranges are not cached.
    #[instrument(skip(repo), fields(db.operation = "SELECT", db.table = "products"))]
    pub async fn filter_by_price_range(
        repo: &dyn ProductRepository,
        min: f64,
        max: f64,
    ) -> Result<Vec<Product>, AppError> {
        repo.filter_by_price(min, max).await
    }

    /// Per-category aggregates, always read live.
    #[instrument(skip(repo), fields(db.operation = "SELECT", db.table = "products"))]
    pub async fn stats(repo: &dyn ProductRepository) -> Result<Vec<CategoryStats>, AppError> {
        repo.stats().await
    }

    #[instrument(skip(repo, cache), fields(db.operation = "INSERT", db.table = "products"))]
    pub async fn import_samples(
        repo: &dyn ProductRepository,
        cache: Option<&Cache>,
    ) -> Result<Vec<Product>, AppError> {
        let products = repo.insert_many(sample_imports()).await?;

        invalidate::products(cache).await;
        metrics::track_product_write("import");

        info!(count = products.len(), "Sample products imported");

        Ok(products)
    }
}
