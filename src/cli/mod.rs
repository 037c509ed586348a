//! Operations behind `shopfront-cli`.
//!
//! Commands talk to PostgreSQL and the cache directly, through the same
//! services the HTTP handlers use, so a product created here invalidates the
//! cached listing exactly as an API write would.

pub mod export;

use std::path::{Path, PathBuf};

use anyhow::Context;
use validator::Validate;

use shopfront_cache::Cache;
use shopfront_core::AppError;

use crate::config::database::{PgPool, init_db_pool};
use crate::config::{CacheConfig, JwtConfig};
use crate::modules::auth::service::AuthService;
use crate::modules::products::repository::{PgProductRepository, ProductRepository};
use crate::modules::products::{CategoryStats, CreateProductDto};
use crate::state::connect_cache;

use export::ExportFormat;

/// Connections shared by every CLI command.
pub struct CliContext {
    pub db: PgPool,
    pub products: PgProductRepository,
    pub cache: Option<Cache>,
    pub jwt_config: JwtConfig,
}

impl CliContext {
    pub async fn connect() -> anyhow::Result<Self> {
        let db = init_db_pool().await?;
        let cache = connect_cache(&CacheConfig::from_env()).await;

        Ok(Self {
            products: PgProductRepository::new(db.clone()),
            db,
            cache,
            jwt_config: JwtConfig::from_env(),
        })
    }

    pub fn repo(&self) -> &dyn ProductRepository {
        &self.products
    }

    pub fn cache(&self) -> Option<&Cache> {
        self.cache.as_ref()
    }
}

/// Applies the same rules as `POST /api/products`.
pub fn validate_new_product(dto: &CreateProductDto) -> Result<(), AppError> {
    dto.validate().map_err(AppError::bad_request)
}

/// Turns optional CLI bounds into a closed range; a missing bound is open.
pub fn open_price_range(min: Option<f64>, max: Option<f64>) -> (f64, f64) {
    (
        min.unwrap_or(f64::NEG_INFINITY),
        max.unwrap_or(f64::INFINITY),
    )
}

/// Per-category stats, most populated category first.
pub fn stats_by_count(mut stats: Vec<CategoryStats>) -> Vec<CategoryStats> {
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}

/// What `clear-cache` removed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CacheClearReport {
    pub key_deleted: Option<String>,
    pub prefix_deleted: Option<(String, u64)>,
}

pub async fn clear_cache(
    cache: &Cache,
    key: Option<&str>,
    prefix: Option<&str>,
) -> anyhow::Result<CacheClearReport> {
    if key.is_none() && prefix.is_none() {
        anyhow::bail!("Provide --key or --prefix");
    }

    let mut report = CacheClearReport::default();

    if let Some(key) = key {
        cache.delete(key).await?;
        report.key_deleted = Some(key.to_string());
    }

    if let Some(prefix) = prefix {
        let count = cache.delete_by_prefix(prefix).await?;
        report.prefix_deleted = Some((prefix.to_string(), count));
    }

    Ok(report)
}

/// Logs a user in and returns only the access token.
pub async fn login_access_token(
    db: &PgPool,
    username: &str,
    password: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    AuthService::login(db, username, password, jwt_config)
        .await
        .map(|tokens| tokens.access_token)
}

/// Writes every product to `output` (or the format's default file) and
/// returns the path written and the row count.
pub async fn export_products(
    repo: &dyn ProductRepository,
    format: ExportFormat,
    output: Option<&Path>,
) -> anyhow::Result<(PathBuf, usize)> {
    let products = repo.list_summaries().await.map_err(|e| e.error)?;
    let body = export::render(&products, format)?;

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| format.default_path());
    tokio::fs::write(&path, body)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok((path, products.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::products::repository::MemoryProductRepository;

    fn stat(category: &str, count: i64) -> CategoryStats {
        CategoryStats {
            category: Some(category.to_string()),
            count,
            avg_price: 1.0,
            min_price: 1.0,
            max_price: 1.0,
        }
    }

    #[test]
    fn test_open_price_range() {
        assert_eq!(open_price_range(Some(10.0), Some(20.0)), (10.0, 20.0));

        let (min, max) = open_price_range(None, None);
        assert!(min.is_infinite() && min < 0.0);
        assert!(max.is_infinite() && max > 0.0);
    }

    #[test]
    fn test_stats_sorted_by_count_descending() {
        let sorted = stats_by_count(vec![stat("a", 1), stat("b", 5), stat("c", 3)]);
        let counts: Vec<i64> = sorted.iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![5, 3, 1]);
    }

    #[test]
    fn test_validate_new_product() {
        let dto = CreateProductDto {
            name: "ab".into(),
            price: 1.0,
            category: None,
            description: None,
            image: None,
        };
        assert_eq!(validate_new_product(&dto).unwrap_err().status.as_u16(), 400);
    }

    #[tokio::test]
    async fn test_clear_cache_requires_a_target() {
        let cache = Cache::in_memory(std::time::Duration::from_secs(60));
        assert!(clear_cache(&cache, None, None).await.is_err());
    }

    #[tokio::test]
    async fn test_clear_cache_key_and_prefix() {
        let cache = Cache::in_memory(std::time::Duration::from_secs(60));
        cache.set("products_all", &vec![1]).await.unwrap();
        cache.set("search:a:1:5", &vec![1]).await.unwrap();
        cache.set("search:b:1:5", &vec![1]).await.unwrap();

        let report = clear_cache(&cache, Some("products_all"), Some("search:"))
            .await
            .unwrap();

        assert_eq!(report.key_deleted.as_deref(), Some("products_all"));
        assert_eq!(report.prefix_deleted, Some(("search:".to_string(), 2)));
        assert_eq!(cache.get::<Vec<i32>>("search:a:1:5").await, None);
    }

    #[tokio::test]
    async fn test_export_products_writes_csv_file() {
        let repo = MemoryProductRepository::new();
        repo.insert(CreateProductDto {
            name: "Lamp".into(),
            price: 10.0,
            category: Some("home".into()),
            description: None,
            image: None,
        })
        .await
        .unwrap();

        let dir = std::env::temp_dir().join(format!("shopfront-export-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.csv");

        let (written, count) = export_products(&repo, ExportFormat::Csv, Some(&path))
            .await
            .unwrap();

        assert_eq!(written, path);
        assert_eq!(count, 1);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "name,price,category\nLamp,10.0,home\n"
        );
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_export_products_writes_json_from_repository() {
        let repo = MemoryProductRepository::new();
        for (name, price) in [("Desk", 120.0), ("Chair", 45.5)] {
            repo.insert(CreateProductDto {
                name: name.into(),
                price,
                category: None,
                description: Some("not exported".into()),
                image: None,
            })
            .await
            .unwrap();
        }

        let dir = std::env::temp_dir().join(format!("shopfront-export-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.json");

        let (_, count) = export_products(&repo, ExportFormat::Json, Some(&path))
            .await
            .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            written,
            serde_json::json!([
                {"name": "Desk", "price": 120.0, "category": null},
                {"name": "Chair", "price": 45.5, "category": null}
            ])
        );
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_export_products_reports_unwritable_path() {
        let repo = MemoryProductRepository::new();
        let path = std::env::temp_dir()
            .join(format!("shopfront-missing-{}", uuid::Uuid::new_v4()))
            .join("out.csv");

        let err = export_products(&repo, ExportFormat::Csv, Some(&path))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to write"));
    }
}
