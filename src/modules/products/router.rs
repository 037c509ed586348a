use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    create_product, delete_product, filter_products, get_product, get_products, import_products,
    product_stats, search_products, update_product,
};

pub fn init_products_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_products).post(create_product))
        .route("/search", get(search_products))
        .route("/filter", get(filter_products))
        .route("/stats", get(product_stats))
        .route("/import", get(import_products))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}
