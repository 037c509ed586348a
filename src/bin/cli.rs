use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dialoguer::Password;
use dotenvy::dotenv;
use uuid::Uuid;

use shopfront::cli::export::ExportFormat;
use shopfront::cli::{
    CliContext, clear_cache, export_products, login_access_token, open_price_range,
    stats_by_count, validate_new_product,
};
use shopfront::modules::auth::service::AuthService;
use shopfront::modules::products::service::ProductService;
use shopfront::modules::products::{CreateProductDto, UpdateProductDto};
use shopfront::shopfront_core::{AppError, PageParams};

#[derive(Parser)]
#[command(name = "shopfront-cli")]
#[command(about = "Shopfront CLI - Catalog, user and cache administration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a product
    CreateProduct {
        #[arg(short = 'n', long)]
        name: String,

        #[arg(short = 'p', long)]
        price: f64,

        #[arg(short = 'c', long)]
        category: Option<String>,

        #[arg(short = 'd', long)]
        description: Option<String>,
    },
    /// List every product
    ListProducts,
    /// Update fields of a product
    UpdateProduct {
        id: Uuid,

        #[arg(short = 'n', long)]
        name: Option<String>,

        #[arg(short = 'p', long)]
        price: Option<f64>,

        #[arg(short = 'c', long)]
        category: Option<String>,

        #[arg(short = 'd', long)]
        description: Option<String>,
    },
    /// Delete a product
    DeleteProduct { id: Uuid },
    /// Search products by name
    SearchProducts {
        name: String,

        #[arg(long, default_value = "1")]
        page: i64,

        #[arg(long, default_value = "5")]
        limit: i64,
    },
    /// Insert the three sample products
    ImportProducts,
    /// Product counts and prices per category
    StatsProducts,
    /// List products within a price range
    FilterProducts {
        #[arg(long)]
        min: Option<f64>,

        #[arg(long)]
        max: Option<f64>,
    },
    /// Create a user account
    CreateUser {
        #[arg(short = 'u', long)]
        username: String,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,

        #[arg(short = 'r', long, default_value = "user")]
        role: String,
    },
    /// Log in and print an access token
    Login {
        #[arg(short = 'u', long)]
        username: String,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Delete cache entries by key or prefix
    ClearCache {
        #[arg(short = 'k', long)]
        key: Option<String>,

        #[arg(long)]
        prefix: Option<String>,
    },
    /// Write all products to a JSON or CSV file
    ExportProducts {
        #[arg(short = 'f', long, value_enum, default_value = "json")]
        format: ExportFormat,

        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

fn read_password(password: Option<String>, confirm: bool) -> anyhow::Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    let prompt = Password::new().with_prompt("Password");
    let prompt = if confirm {
        prompt.with_confirmation("Confirm password", "Passwords don't match")
    } else {
        prompt
    };

    Ok(prompt.interact()?)
}

async fn run(command: Commands) -> Result<(), AppError> {
    let ctx = CliContext::connect().await?;

    match command {
        Commands::CreateProduct {
            name,
            price,
            category,
            description,
        } => {
            let dto = CreateProductDto {
                name: name.trim().to_string(),
                price,
                category: trimmed(category),
                description: trimmed(description),
                image: None,
            };
            validate_new_product(&dto)?;

            let product = ProductService::create(ctx.repo(), ctx.cache(), dto).await?;
            println!("✅ Product created: {} ({})", product.name, product.id);
        }
        Commands::ListProducts => {
            let products = ProductService::list_all(ctx.repo(), ctx.cache()).await?;
            println!("{}", serde_json::to_string_pretty(&products)?);
        }
        Commands::UpdateProduct {
            id,
            name,
            price,
            category,
            description,
        } => {
            let patch = UpdateProductDto {
                name: trimmed(name),
                price,
                category: trimmed(category),
                description: trimmed(description),
                image: None,
            };

            let product = ProductService::update(ctx.repo(), ctx.cache(), id, patch).await?;
            println!("✅ Product updated: {}", serde_json::to_string_pretty(&product)?);
        }
        Commands::DeleteProduct { id } => {
            ProductService::delete(ctx.repo(), ctx.cache(), id).await?;
            println!("✅ Product deleted: {}", id);
        }
        Commands::SearchProducts { name, page, limit } => {
            let params = PageParams::new(page, limit);
            let result = ProductService::search(ctx.repo(), ctx.cache(), &name, params).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::ImportProducts => {
            let products = ProductService::import_samples(ctx.repo(), ctx.cache()).await?;
            println!("✅ Imported {} products", products.len());
        }
        Commands::StatsProducts => {
            let stats = stats_by_count(ProductService::stats(ctx.repo()).await?);
            for stat in stats {
                println!(
                    "{:<20} {:>5}  avg {:.2}  min {:.2}  max {:.2}",
                    stat.category.as_deref().unwrap_or("(none)"),
                    stat.count,
                    stat.avg_price,
                    stat.min_price,
                    stat.max_price
                );
            }
        }
        Commands::FilterProducts { min, max } => {
            let (min, max) = open_price_range(min, max);
            let products = ProductService::filter_by_price_range(ctx.repo(), min, max).await?;
            println!("{}", serde_json::to_string_pretty(&products)?);
        }
        Commands::CreateUser {
            username,
            password,
            role,
        } => {
            let password = read_password(password, true)?;
            let user = AuthService::create_user(&ctx.db, username.trim(), &password, &role).await?;
            println!("✅ User created: {} ({}, role {})", user.username, user.id, user.role);
        }
        Commands::Login { username, password } => {
            let password = read_password(password, false)?;
            let token =
                login_access_token(&ctx.db, username.trim(), &password, &ctx.jwt_config).await?;
            println!("{}", token);
        }
        Commands::ClearCache { key, prefix } => {
            let Some(cache) = ctx.cache() else {
                return Err(AppError::internal(anyhow::anyhow!(
                    "Cache is disabled or unreachable"
                )));
            };
            let report = clear_cache(cache, key.as_deref(), prefix.as_deref()).await?;
            if let Some(key) = report.key_deleted {
                println!("✅ Deleted key {}", key);
            }
            if let Some((prefix, count)) = report.prefix_deleted {
                println!("✅ Deleted {} keys with prefix {}", count, prefix);
            }
        }
        Commands::ExportProducts { format, output } => {
            let (path, count) = export_products(ctx.repo(), format, output.as_deref()).await?;
            println!("✅ Exported {} products to {}", count, path.display());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        eprintln!("\n❌ Error: {:#}", e.error);
        std::process::exit(1);
    }
}
