//! # Larder Client
//!
//! Resource gateway for the Larder pantry service.
//!
//! ## Example
//!
//! ```no_run
//! use larder_client::{AuthToken, ClientConfig, Gateway, HttpGateway};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let token = AuthToken::new();
//!     let gateway = HttpGateway::new(&ClientConfig::default(), token.clone())?;
//!
//!     token.set(Some("session-token".to_string()));
//!     for recipe in gateway.list_recipes().await? {
//!         println!("{} serves {}", recipe.name, recipe.serves);
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod types;

// Re-export main types for convenience
pub use auth::AuthToken;
pub use config::ClientConfig;
pub use error::GatewayError;
pub use gateway::{Gateway, GatewayFuture};
pub use http::HttpGateway;
pub use types::{
    AuthResponse, CapacityMeasure, Category, Container, Credentials, Id, Ingredient, IngredientPantryItem,
    IngredientPayload, NewPantryItem, PantryItem, PantryItemUpdate, Recipe, RecipePayload, ServingsRequest,
    ShoppingListItem,
};
