use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{
    AccessTokenResponse, CredentialsRequest, MessageResponse, RefreshRequest, TokenPairResponse,
    User,
};
use crate::modules::chat::model::{ChatMessage, OutgoingMessage};
use crate::modules::products::model::{
    CategoryStats, CreateProductDto, PriceFilterResponse, Product, ProductSummary, SearchResult,
    UpdateProductDto,
};
use crate::modules::sessions::model::{CurrentUserResponse, SessionLoginResponse, SessionUser};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::router::health,
        crate::modules::auth::controller::register_user,
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::refresh_token,
        crate::modules::auth::controller::logout_user,
        crate::modules::products::controller::get_products,
        crate::modules::products::controller::search_products,
        crate::modules::products::controller::filter_products,
        crate::modules::products::controller::product_stats,
        crate::modules::products::controller::import_products,
        crate::modules::products::controller::get_product,
        crate::modules::products::controller::create_product,
        crate::modules::products::controller::update_product,
        crate::modules::products::controller::delete_product,
        crate::modules::sessions::controller::session_login,
        crate::modules::sessions::controller::session_logout,
        crate::modules::sessions::controller::session_me,
        crate::modules::chat::controller::chat_socket,
    ),
    components(
        schemas(
            User,
            CredentialsRequest,
            TokenPairResponse,
            RefreshRequest,
            AccessTokenResponse,
            MessageResponse,
            ErrorResponse,
            Product,
            ProductSummary,
            CreateProductDto,
            UpdateProductDto,
            SearchResult,
            PriceFilterResponse,
            CategoryStats,
            SessionUser,
            SessionLoginResponse,
            CurrentUserResponse,
            ChatMessage,
            OutgoingMessage,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "JWT registration, login and token refresh"),
        (name = "Products", description = "Product catalog with cached reads"),
        (name = "Sessions", description = "Cookie-based server-side sessions"),
        (name = "Chat", description = "Real-time chat websocket"),
        (name = "Health", description = "Service health")
    ),
    info(
        title = "Shopfront API",
        version = "0.1.0",
        description = "Product catalog, authentication and chat API built with Rust, Axum, PostgreSQL and Redis.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_surface() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/api/products",
            "/api/products/search",
            "/api/products/{id}",
            "/api/auth/login",
            "/session/login",
            "/chat/ws",
            "/health",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }
}
