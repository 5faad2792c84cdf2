//! The resource gateway contract
//!
//! Every screen talks to the pantry service through [`Gateway`]. The HTTP
//! implementation lives in [`crate::http`]; tests use an in-memory one.

use crate::error::GatewayError;
use crate::types::{
    AuthResponse, Category, Credentials, Id, Ingredient, IngredientPayload, NewPantryItem, PantryItem,
    PantryItemUpdate, Recipe, RecipePayload, ServingsRequest, ShoppingListItem,
};
use std::future::Future;
use std::pin::Pin;

/// Future returned by [`Gateway`] operations
pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send + 'a>>;

/// Remote pantry service operations
///
/// Every call made while logged in carries the session token current at
/// call time.
///
/// # Dyn Compatibility
///
/// Methods return `Pin<Box<dyn Future>>` instead of using `async fn` so
/// reducers can hold an `Arc<dyn Gateway>` and move clones of it into effects.
///
/// # Errors
///
/// Every operation fails with [`GatewayError::Request`] when the service is
/// unreachable, [`GatewayError::Status`] on a non-2xx response and
/// [`GatewayError::Decode`] when a response body has an unexpected shape.
pub trait Gateway: Send + Sync {
    /// `POST api-token-auth/`
    fn authenticate<'a>(&'a self, credentials: &'a Credentials) -> GatewayFuture<'a, AuthResponse>;

    /// `GET api/pantryItemCategories/`
    fn list_categories(&self) -> GatewayFuture<'_, Vec<Category>>;

    /// `GET api/pantryItemsByCategory/{category}`
    fn list_pantry_items_by_category<'a>(&'a self, category: &'a Id) -> GatewayFuture<'a, Vec<PantryItem>>;

    /// `GET api/pantryItems/`
    fn list_pantry_items(&self) -> GatewayFuture<'_, Vec<PantryItem>>;

    /// `GET api/pantryItem/{id}`
    fn get_pantry_item<'a>(&'a self, id: &'a Id) -> GatewayFuture<'a, PantryItem>;

    /// `POST api/newPantryItem/`
    fn create_pantry_item<'a>(&'a self, item: &'a NewPantryItem) -> GatewayFuture<'a, PantryItem>;

    /// `PUT api/pantryItem/{id}`
    fn update_pantry_item<'a>(&'a self, id: &'a Id, item: &'a PantryItemUpdate) -> GatewayFuture<'a, PantryItem>;

    /// `DELETE api/pantryItem/{id}`
    fn delete_pantry_item<'a>(&'a self, id: &'a Id) -> GatewayFuture<'a, ()>;

    /// `GET api/recipes/`
    fn list_recipes(&self) -> GatewayFuture<'_, Vec<Recipe>>;

    /// `GET api/recipe/{id}`
    fn get_recipe<'a>(&'a self, id: &'a Id) -> GatewayFuture<'a, Recipe>;

    /// `POST api/newRecipe/`
    fn create_recipe<'a>(&'a self, recipe: &'a RecipePayload) -> GatewayFuture<'a, Recipe>;

    /// `PUT api/recipe/{id}`
    fn update_recipe<'a>(&'a self, id: &'a Id, recipe: &'a RecipePayload) -> GatewayFuture<'a, Recipe>;

    /// `DELETE api/recipe/{id}`
    fn delete_recipe<'a>(&'a self, id: &'a Id) -> GatewayFuture<'a, ()>;

    /// `GET api/ingredientsByRecipe/{recipe}`
    fn list_ingredients_by_recipe<'a>(&'a self, recipe: &'a Id) -> GatewayFuture<'a, Vec<Ingredient>>;

    /// `GET api/ingredient/{id}`
    fn get_ingredient<'a>(&'a self, id: &'a Id) -> GatewayFuture<'a, Ingredient>;

    /// `POST api/newIngredient/`
    fn create_ingredient<'a>(&'a self, ingredient: &'a IngredientPayload) -> GatewayFuture<'a, Ingredient>;

    /// `PUT api/ingredient/{id}`
    fn update_ingredient<'a>(
        &'a self,
        id: &'a Id,
        ingredient: &'a IngredientPayload,
    ) -> GatewayFuture<'a, Ingredient>;

    /// `DELETE api/ingredient/{id}`
    fn delete_ingredient<'a>(&'a self, id: &'a Id) -> GatewayFuture<'a, ()>;

    /// `GET api/shoppingListItems/`
    fn list_shopping_list_items(&self) -> GatewayFuture<'_, Vec<ShoppingListItem>>;

    /// `POST api/generateShoppingList/`
    fn generate_shopping_list<'a>(&'a self, requests: &'a [ServingsRequest]) -> GatewayFuture<'a, ()>;

    /// `POST api/consumeRecipes/`
    fn consume_recipes<'a>(&'a self, requests: &'a [ServingsRequest]) -> GatewayFuture<'a, ()>;

    /// `POST api/addShoppingListItemsToPantry/`
    fn add_shopping_list_items_to_pantry<'a>(&'a self, items: &'a [ShoppingListItem]) -> GatewayFuture<'a, ()>;
}
