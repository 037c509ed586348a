pub mod auth;
pub mod chat;
pub mod products;
pub mod sessions;

pub use self::auth::model::User;
pub use self::products::model::Product;
