//! reqwest-backed gateway

use crate::auth::AuthToken;
use crate::config::ClientConfig;
use crate::error::GatewayError;
use crate::gateway::{Gateway, GatewayFuture};
use crate::types::{
    AuthResponse, Category, Credentials, Id, Ingredient, IngredientPayload, NewPantryItem, PantryItem,
    PantryItemUpdate, Recipe, RecipePayload, ServingsRequest, ShoppingListItem,
};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

/// Gateway that talks JSON over HTTP to the pantry service
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: AuthToken,
}

impl HttpGateway {
    /// Create a gateway for `config`, reading the session token from `token`
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Request`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, token: AuthToken) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.normalized_base_url(),
            token,
        })
    }

    /// Service root this gateway sends to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Build a request carrying the token current right now
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!(method = method.as_str(), path, "Gateway request");
        let builder = self.client.request(method, self.url(path));
        match self.token.current() {
            Some(token) => builder.header(AUTHORIZATION, format!("Token {token}")),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> Result<Response, GatewayError> {
        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Gateway request rejected");
            Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn fetch<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, GatewayError> {
        Self::send(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn execute(builder: RequestBuilder) -> Result<(), GatewayError> {
        Self::send(builder).await.map(|_| ())
    }
}

impl Gateway for HttpGateway {
    fn authenticate<'a>(&'a self, credentials: &'a Credentials) -> GatewayFuture<'a, AuthResponse> {
        tracing::debug!(username = %credentials.username, "Authenticating");
        // Login never carries a previous token.
        let builder = self.client.post(self.url("api-token-auth/")).json(credentials);
        Box::pin(Self::fetch(builder))
    }

    fn list_categories(&self) -> GatewayFuture<'_, Vec<Category>> {
        Box::pin(Self::fetch(self.request(Method::GET, "api/pantryItemCategories/")))
    }

    fn list_pantry_items_by_category<'a>(&'a self, category: &'a Id) -> GatewayFuture<'a, Vec<PantryItem>> {
        let path = format!("api/pantryItemsByCategory/{category}");
        Box::pin(Self::fetch(self.request(Method::GET, &path)))
    }

    fn list_pantry_items(&self) -> GatewayFuture<'_, Vec<PantryItem>> {
        Box::pin(Self::fetch(self.request(Method::GET, "api/pantryItems/")))
    }

    fn get_pantry_item<'a>(&'a self, id: &'a Id) -> GatewayFuture<'a, PantryItem> {
        Box::pin(Self::fetch(self.request(Method::GET, &format!("api/pantryItem/{id}"))))
    }

    fn create_pantry_item<'a>(&'a self, item: &'a NewPantryItem) -> GatewayFuture<'a, PantryItem> {
        Box::pin(Self::fetch(self.request(Method::POST, "api/newPantryItem/").json(item)))
    }

    fn update_pantry_item<'a>(&'a self, id: &'a Id, item: &'a PantryItemUpdate) -> GatewayFuture<'a, PantryItem> {
        let builder = self.request(Method::PUT, &format!("api/pantryItem/{id}")).json(item);
        Box::pin(Self::fetch(builder))
    }

    fn delete_pantry_item<'a>(&'a self, id: &'a Id) -> GatewayFuture<'a, ()> {
        Box::pin(Self::execute(self.request(Method::DELETE, &format!("api/pantryItem/{id}"))))
    }

    fn list_recipes(&self) -> GatewayFuture<'_, Vec<Recipe>> {
        Box::pin(Self::fetch(self.request(Method::GET, "api/recipes/")))
    }

    fn get_recipe<'a>(&'a self, id: &'a Id) -> GatewayFuture<'a, Recipe> {
        Box::pin(Self::fetch(self.request(Method::GET, &format!("api/recipe/{id}"))))
    }

    fn create_recipe<'a>(&'a self, recipe: &'a RecipePayload) -> GatewayFuture<'a, Recipe> {
        Box::pin(Self::fetch(self.request(Method::POST, "api/newRecipe/").json(recipe)))
    }

    fn update_recipe<'a>(&'a self, id: &'a Id, recipe: &'a RecipePayload) -> GatewayFuture<'a, Recipe> {
        let builder = self.request(Method::PUT, &format!("api/recipe/{id}")).json(recipe);
        Box::pin(Self::fetch(builder))
    }

    fn delete_recipe<'a>(&'a self, id: &'a Id) -> GatewayFuture<'a, ()> {
        Box::pin(Self::execute(self.request(Method::DELETE, &format!("api/recipe/{id}"))))
    }

    fn list_ingredients_by_recipe<'a>(&'a self, recipe: &'a Id) -> GatewayFuture<'a, Vec<Ingredient>> {
        let path = format!("api/ingredientsByRecipe/{recipe}");
        Box::pin(Self::fetch(self.request(Method::GET, &path)))
    }

    fn get_ingredient<'a>(&'a self, id: &'a Id) -> GatewayFuture<'a, Ingredient> {
        Box::pin(Self::fetch(self.request(Method::GET, &format!("api/ingredient/{id}"))))
    }

    fn create_ingredient<'a>(&'a self, ingredient: &'a IngredientPayload) -> GatewayFuture<'a, Ingredient> {
        Box::pin(Self::fetch(self.request(Method::POST, "api/newIngredient/").json(ingredient)))
    }

    fn update_ingredient<'a>(
        &'a self,
        id: &'a Id,
        ingredient: &'a IngredientPayload,
    ) -> GatewayFuture<'a, Ingredient> {
        let builder = self.request(Method::PUT, &format!("api/ingredient/{id}")).json(ingredient);
        Box::pin(Self::fetch(builder))
    }

    fn delete_ingredient<'a>(&'a self, id: &'a Id) -> GatewayFuture<'a, ()> {
        Box::pin(Self::execute(self.request(Method::DELETE, &format!("api/ingredient/{id}"))))
    }

    fn list_shopping_list_items(&self) -> GatewayFuture<'_, Vec<ShoppingListItem>> {
        Box::pin(Self::fetch(self.request(Method::GET, "api/shoppingListItems/")))
    }

    fn generate_shopping_list<'a>(&'a self, requests: &'a [ServingsRequest]) -> GatewayFuture<'a, ()> {
        Box::pin(Self::execute(self.request(Method::POST, "api/generateShoppingList/").json(requests)))
    }

    fn consume_recipes<'a>(&'a self, requests: &'a [ServingsRequest]) -> GatewayFuture<'a, ()> {
        Box::pin(Self::execute(self.request(Method::POST, "api/consumeRecipes/").json(requests)))
    }

    fn add_shopping_list_items_to_pantry<'a>(&'a self, items: &'a [ShoppingListItem]) -> GatewayFuture<'a, ()> {
        let builder = self.request(Method::POST, "api/addShoppingListItemsToPantry/").json(items);
        Box::pin(Self::execute(builder))
    }
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.base_url)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn paths_append_to_normalized_base() {
        let gateway = HttpGateway::new(
            &ClientConfig::with_base_url("http://pantry.local:8000"),
            AuthToken::new(),
        )
        .unwrap();

        assert_eq!(gateway.base_url(), "http://pantry.local:8000/");
        assert_eq!(gateway.url("api/recipes/"), "http://pantry.local:8000/api/recipes/");
    }
}
