use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use shopfront_core::{AppError, PageParams};

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdmin;
use crate::modules::products::model::{
    CategoryStats, CreateProductDto, PriceFilterResponse, PriceRangeQuery, Product,
    ProductSummary, SearchQuery, SearchResult, UpdateProductDto,
};
use crate::modules::products::service::{ProductService, parse_price_range};
use crate::state::AppState;
use crate::validator::ValidatedJson;

fn parse_product_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::bad_request(anyhow::anyhow!("Invalid ID")))
}

#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "All products (id, name, price, category)", body = Vec<ProductSummary>)
    ),
    tag = "Products"
)]
#[instrument(skip(state))]
pub async fn get_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductSummary>>, AppError> {
    let products =
        ProductService::list_all(state.products.as_ref(), state.cache.as_ref()).await?;
    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/api/products/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "One page of matching products", body = SearchResult),
        (status = 400, description = "Missing name or invalid paging")
    ),
    tag = "Products"
)]
#[instrument(skip(state))]
pub async fn search_products(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchResult>, AppError> {
    let Query(query) = query
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;

    let name = query.name.unwrap_or_default();
    let params = PageParams {
        page: query.page,
        limit: query.limit,
    };

    let result =
        ProductService::search(state.products.as_ref(), state.cache.as_ref(), &name, params)
            .await?;
    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/api/products/filter",
    params(PriceRangeQuery),
    responses(
        (status = 200, description = "Products within the price range", body = PriceFilterResponse),
        (status = 400, description = "Missing or non-numeric bound")
    ),
    tag = "Products"
)]
#[instrument(skip(state))]
pub async fn filter_products(
    State(state): State<AppState>,
    Query(query): Query<PriceRangeQuery>,
) -> Result<Json<PriceFilterResponse>, AppError> {
    let (min, max) = parse_price_range(query.min_price.as_deref(), query.max_price.as_deref())?;
    let products = ProductService::filter_by_price_range(state.products.as_ref(), min, max).await?;
    Ok(Json(PriceFilterResponse { products }))
}

#[utoipa::path(
    get,
    path = "/api/products/stats",
    responses(
        (status = 200, description = "Price aggregates per category", body = Vec<CategoryStats>)
    ),
    tag = "Products"
)]
#[instrument(skip(state))]
pub async fn product_stats(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryStats>>, AppError> {
    let stats = ProductService::stats(state.products.as_ref()).await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/products/import",
    responses(
        (status = 200, description = "Sample products inserted", body = Vec<Product>)
    ),
    tag = "Products"
)]
#[instrument(skip(state))]
pub async fn import_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products =
        ProductService::import_samples(state.products.as_ref(), state.cache.as_ref()).await?;
    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product details", body = Product),
        (status = 400, description = "Invalid ID"),
        (status = 404, description = "Product not found")
    ),
    tag = "Products"
)]
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let id = parse_product_id(&id)?;
    let product = ProductService::get_by_id(state.products.as_ref(), id).await?;
    Ok(Json(product))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductDto,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Products",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto), fields(user.id = %auth_user.id))]
pub async fn create_product(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateProductDto>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let product =
        ProductService::create(state.products.as_ref(), state.cache.as_ref(), dto).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProductDto,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, description = "Invalid ID, empty patch, invalid input or product not found")
    ),
    tag = "Products"
)]
#[instrument(skip(state, dto))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpdateProductDto>,
) -> Result<Json<Product>, AppError> {
    let id = parse_product_id(&id)?;

    // This route reports an unknown id as 400, unlike get and delete.
    let product = ProductService::update(state.products.as_ref(), state.cache.as_ref(), id, dto)
        .await
        .map_err(|e| {
            if e.status == StatusCode::NOT_FOUND {
                AppError::bad_request(e.error)
            } else {
                e
            }
        })?;

    Ok(Json(product))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 400, description = "Invalid ID"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Product not found")
    ),
    tag = "Products",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_product(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_product_id(&id)?;
    ProductService::delete(state.products.as_ref(), state.cache.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
