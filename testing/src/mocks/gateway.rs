//! In-memory pantry service.

use larder_client::{
    AuthResponse, AuthToken, Category, Credentials, Gateway, GatewayError, GatewayFuture, Id, Ingredient,
    IngredientPantryItem, IngredientPayload, NewPantryItem, PantryItem, PantryItemUpdate, Recipe, RecipePayload,
    ServingsRequest, ShoppingListItem,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Gateway method name, e.g. `"create_recipe"`
    pub operation: &'static str,
    /// Id in the request path, if any
    pub id: Option<Id>,
    /// JSON request body, if any
    pub body: Option<Value>,
    /// Session token current when the call was issued
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredIngredient {
    id: Id,
    recipe: Id,
    pantry_item: Id,
    quantity: f64,
}

#[derive(Debug, Default)]
struct Server {
    accounts: Vec<(String, String, String)>,
    categories: Vec<Category>,
    pantry_items: Vec<PantryItem>,
    recipes: Vec<Recipe>,
    ingredients: Vec<StoredIngredient>,
    shopping_list: Vec<ShoppingListItem>,
    next_id: i64,
}

impl Server {
    fn allocate_id(&mut self) -> Id {
        self.next_id += 1;
        Id::Int(1000 + self.next_id)
    }

    fn pantry_item(&self, id: &Id) -> Option<&PantryItem> {
        self.pantry_items.iter().find(|item| &item.id == id)
    }

    fn resolve(&self, stored: &StoredIngredient) -> Ingredient {
        let pantry_item = self
            .pantry_item(&stored.pantry_item)
            .map_or_else(
                || IngredientPantryItem::Shallow(stored.pantry_item.clone()),
                |item| IngredientPantryItem::Full(item.clone()),
            );
        Ingredient {
            id: stored.id.clone(),
            recipe: stored.recipe.clone(),
            pantry_item,
            quantity: stored.quantity,
        }
    }

    /// Write responses carry only the pantry item id, like the real service.
    fn shallow(stored: &StoredIngredient) -> Ingredient {
        Ingredient {
            id: stored.id.clone(),
            recipe: stored.recipe.clone(),
            pantry_item: IngredientPantryItem::Shallow(stored.pantry_item.clone()),
            quantity: stored.quantity,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    server: Server,
    calls: Vec<Call>,
    failing: HashSet<&'static str>,
    latency: Option<Duration>,
}

fn not_found(id: &Id) -> GatewayError {
    GatewayError::Status {
        status: 404,
        body: format!("{{\"detail\":\"{id} not found\"}}"),
    }
}

fn remove_by_id<T>(items: &mut Vec<T>, id: &Id, key: impl Fn(&T) -> &Id) -> Result<(), GatewayError> {
    let before = items.len();
    items.retain(|item| key(item) != id);
    if items.len() == before { Err(not_found(id)) } else { Ok(()) }
}

/// In-memory [`Gateway`] with a call log, failure injection and latency.
///
/// Behaves like the pantry service for the calls the client makes:
/// ingredient writes answer with a bare pantry item id, and marking
/// shopping items purchased moves their quantity into the pantry.
///
/// # Example
///
/// ```
/// use larder_testing::mocks::MockGateway;
/// use larder_client::Gateway;
///
/// # tokio_test::block_on(async {
/// let gateway = MockGateway::new();
/// gateway.fail("list_recipes");
/// assert!(gateway.list_recipes().await.is_err());
/// assert_eq!(gateway.calls_to("list_recipes").len(), 1);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<MockState>>,
    token: Option<AuthToken>,
}

impl MockGateway {
    /// Create an empty service with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the token current at each call.
    #[must_use]
    pub fn with_token(mut self, token: AuthToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Delay every response by `latency`.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(Some(latency));
        self
    }

    /// Change the response delay.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.lock().latency = latency;
    }

    /// Accept `username`/`password` and answer with `token`.
    pub fn add_account(&self, username: &str, password: &str, token: &str) {
        self.lock()
            .server
            .accounts
            .push((username.to_string(), password.to_string(), token.to_string()));
    }

    /// Seed a category.
    pub fn add_category(&self, category: Category) {
        self.lock().server.categories.push(category);
    }

    /// Seed a pantry item.
    pub fn add_pantry_item(&self, item: PantryItem) {
        self.lock().server.pantry_items.push(item);
    }

    /// Seed a recipe.
    pub fn add_recipe(&self, recipe: Recipe) {
        self.lock().server.recipes.push(recipe);
    }

    /// Seed an ingredient, in either shape.
    pub fn add_ingredient(&self, ingredient: Ingredient) {
        self.lock().server.ingredients.push(StoredIngredient {
            pantry_item: ingredient.pantry_item.id().clone(),
            id: ingredient.id,
            recipe: ingredient.recipe,
            quantity: ingredient.quantity,
        });
    }

    /// Seed a shopping list entry.
    pub fn add_shopping_item(&self, item: ShoppingListItem) {
        self.lock().server.shopping_list.push(item);
    }

    /// Make `operation` fail with a 500 until [`MockGateway::recover`].
    pub fn fail(&self, operation: &'static str) {
        self.lock().failing.insert(operation);
    }

    /// Let `operation` succeed again.
    pub fn recover(&self, operation: &'static str) {
        self.lock().failing.remove(operation);
    }

    /// Every call issued so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Calls to one operation.
    #[must_use]
    pub fn calls_to(&self, operation: &str) -> Vec<Call> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .cloned()
            .collect()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Server-side pantry item (for assertions).
    #[must_use]
    pub fn pantry_item(&self, id: &Id) -> Option<PantryItem> {
        self.lock().server.pantry_item(id).cloned()
    }

    /// Server-side recipe (for assertions).
    #[must_use]
    pub fn recipe(&self, id: &Id) -> Option<Recipe> {
        self.lock().server.recipes.iter().find(|recipe| &recipe.id == id).cloned()
    }

    /// Server-side shopping list (for assertions).
    #[must_use]
    pub fn shopping_list(&self) -> Vec<ShoppingListItem> {
        self.lock().server.shopping_list.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn serve<'a, T, F>(
        &'a self,
        operation: &'static str,
        id: Option<&Id>,
        body: Option<Value>,
        respond: F,
    ) -> GatewayFuture<'a, T>
    where
        T: Send + 'a,
        F: FnOnce(&mut Server) -> Result<T, GatewayError> + Send + 'a,
    {
        let token = self.token.as_ref().and_then(AuthToken::current);
        tracing::trace!(operation, ?id, "Mock gateway call");
        let latency = {
            let mut state = self.lock();
            state.calls.push(Call {
                operation,
                id: id.cloned(),
                body,
                token,
            });
            state.latency
        };

        Box::pin(async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }

            let mut state = self.lock();
            if state.failing.contains(operation) {
                return Err(GatewayError::Status {
                    status: 500,
                    body: format!("injected failure in {operation}"),
                });
            }
            respond(&mut state.server)
        })
    }
}

fn json<T: Serialize + ?Sized>(body: &T) -> Option<Value> {
    serde_json::to_value(body).ok()
}

impl Gateway for MockGateway {
    fn authenticate<'a>(&'a self, credentials: &'a Credentials) -> GatewayFuture<'a, AuthResponse> {
        let body = Some(serde_json::json!({ "username": credentials.username }));
        self.serve("authenticate", None, body, move |server| {
            server
                .accounts
                .iter()
                .find(|(user, pass, _)| *user == credentials.username && *pass == credentials.password)
                .map(|(_, _, token)| AuthResponse { token: token.clone() })
                .ok_or_else(|| GatewayError::Status {
                    status: 400,
                    body: "{\"non_field_errors\":[\"Unable to log in with provided credentials.\"]}".to_string(),
                })
        })
    }

    fn list_categories(&self) -> GatewayFuture<'_, Vec<Category>> {
        self.serve("list_categories", None, None, |server| Ok(server.categories.clone()))
    }

    fn list_pantry_items_by_category<'a>(&'a self, category: &'a Id) -> GatewayFuture<'a, Vec<PantryItem>> {
        self.serve("list_pantry_items_by_category", Some(category), None, move |server| {
            Ok(server
                .pantry_items
                .iter()
                .filter(|item| &item.category == category)
                .cloned()
                .collect())
        })
    }

    fn list_pantry_items(&self) -> GatewayFuture<'_, Vec<PantryItem>> {
        self.serve("list_pantry_items", None, None, |server| Ok(server.pantry_items.clone()))
    }

    fn get_pantry_item<'a>(&'a self, id: &'a Id) -> GatewayFuture<'a, PantryItem> {
        self.serve("get_pantry_item", Some(id), None, move |server| {
            server.pantry_item(id).cloned().ok_or_else(|| not_found(id))
        })
    }

    fn create_pantry_item<'a>(&'a self, item: &'a NewPantryItem) -> GatewayFuture<'a, PantryItem> {
        self.serve("create_pantry_item", None, json(item), move |server| {
            let created = PantryItem {
                id: server.allocate_id(),
                name: item.name.clone(),
                category: item.category.clone(),
                capacity: item.capacity,
                capacity_measure: item.capacity_measure,
                container: item.container,
                on_hand: item.on_hand,
            };
            server.pantry_items.push(created.clone());
            Ok(created)
        })
    }

    fn update_pantry_item<'a>(&'a self, id: &'a Id, item: &'a PantryItemUpdate) -> GatewayFuture<'a, PantryItem> {
        self.serve("update_pantry_item", Some(id), json(item), move |server| {
            let stored = server
                .pantry_items
                .iter_mut()
                .find(|existing| &existing.id == id)
                .ok_or_else(|| not_found(id))?;
            stored.name.clone_from(&item.name);
            stored.capacity = item.capacity;
            stored.capacity_measure = item.capacity_measure;
            stored.container = item.container;
            stored.on_hand = item.on_hand;
            Ok(stored.clone())
        })
    }

    fn delete_pantry_item<'a>(&'a self, id: &'a Id) -> GatewayFuture<'a, ()> {
        self.serve("delete_pantry_item", Some(id), None, move |server| {
            remove_by_id(&mut server.pantry_items, id, |item| &item.id)
        })
    }

    fn list_recipes(&self) -> GatewayFuture<'_, Vec<Recipe>> {
        self.serve("list_recipes", None, None, |server| Ok(server.recipes.clone()))
    }

    fn get_recipe<'a>(&'a self, id: &'a Id) -> GatewayFuture<'a, Recipe> {
        self.serve("get_recipe", Some(id), None, move |server| {
            server
                .recipes
                .iter()
                .find(|recipe| &recipe.id == id)
                .cloned()
                .ok_or_else(|| not_found(id))
        })
    }

    fn create_recipe<'a>(&'a self, recipe: &'a RecipePayload) -> GatewayFuture<'a, Recipe> {
        self.serve("create_recipe", None, json(recipe), move |server| {
            let created = Recipe {
                id: server.allocate_id(),
                name: recipe.name.clone(),
                serves: recipe.serves,
                image_src: recipe.image_src.clone(),
                servings: 0,
            };
            server.recipes.push(created.clone());
            Ok(created)
        })
    }

    fn update_recipe<'a>(&'a self, id: &'a Id, recipe: &'a RecipePayload) -> GatewayFuture<'a, Recipe> {
        self.serve("update_recipe", Some(id), json(recipe), move |server| {
            let stored = server
                .recipes
                .iter_mut()
                .find(|existing| &existing.id == id)
                .ok_or_else(|| not_found(id))?;
            stored.name.clone_from(&recipe.name);
            stored.serves = recipe.serves;
            stored.image_src.clone_from(&recipe.image_src);
            Ok(stored.clone())
        })
    }

    fn delete_recipe<'a>(&'a self, id: &'a Id) -> GatewayFuture<'a, ()> {
        self.serve("delete_recipe", Some(id), None, move |server| {
            remove_by_id(&mut server.recipes, id, |recipe| &recipe.id)?;
            server.ingredients.retain(|ingredient| &ingredient.recipe != id);
            Ok(())
        })
    }

    fn list_ingredients_by_recipe<'a>(&'a self, recipe: &'a Id) -> GatewayFuture<'a, Vec<Ingredient>> {
        self.serve("list_ingredients_by_recipe", Some(recipe), None, move |server| {
            Ok(server
                .ingredients
                .iter()
                .filter(|ingredient| &ingredient.recipe == recipe)
                .map(|ingredient| server.resolve(ingredient))
                .collect())
        })
    }

    fn get_ingredient<'a>(&'a self, id: &'a Id) -> GatewayFuture<'a, Ingredient> {
        self.serve("get_ingredient", Some(id), None, move |server| {
            server
                .ingredients
                .iter()
                .find(|ingredient| &ingredient.id == id)
                .map(|ingredient| server.resolve(ingredient))
                .ok_or_else(|| not_found(id))
        })
    }

    fn create_ingredient<'a>(&'a self, ingredient: &'a IngredientPayload) -> GatewayFuture<'a, Ingredient> {
        self.serve("create_ingredient", None, json(ingredient), move |server| {
            let stored = StoredIngredient {
                id: server.allocate_id(),
                recipe: ingredient.recipe.clone(),
                pantry_item: ingredient.pantry_item.clone(),
                quantity: ingredient.quantity,
            };
            server.ingredients.push(stored.clone());
            Ok(Server::shallow(&stored))
        })
    }

    fn update_ingredient<'a>(
        &'a self,
        id: &'a Id,
        ingredient: &'a IngredientPayload,
    ) -> GatewayFuture<'a, Ingredient> {
        self.serve("update_ingredient", Some(id), json(ingredient), move |server| {
            let stored = server
                .ingredients
                .iter_mut()
                .find(|existing| &existing.id == id)
                .ok_or_else(|| not_found(id))?;
            stored.recipe.clone_from(&ingredient.recipe);
            stored.pantry_item.clone_from(&ingredient.pantry_item);
            stored.quantity = ingredient.quantity;
            Ok(Server::shallow(stored))
        })
    }

    fn delete_ingredient<'a>(&'a self, id: &'a Id) -> GatewayFuture<'a, ()> {
        self.serve("delete_ingredient", Some(id), None, move |server| {
            remove_by_id(&mut server.ingredients, id, |ingredient| &ingredient.id)
        })
    }

    fn list_shopping_list_items(&self) -> GatewayFuture<'_, Vec<ShoppingListItem>> {
        self.serve("list_shopping_list_items", None, None, |server| Ok(server.shopping_list.clone()))
    }

    fn generate_shopping_list<'a>(&'a self, requests: &'a [ServingsRequest]) -> GatewayFuture<'a, ()> {
        self.serve("generate_shopping_list", None, json(requests), |_| Ok(()))
    }

    fn consume_recipes<'a>(&'a self, requests: &'a [ServingsRequest]) -> GatewayFuture<'a, ()> {
        self.serve("consume_recipes", None, json(requests), |_| Ok(()))
    }

    fn add_shopping_list_items_to_pantry<'a>(&'a self, items: &'a [ShoppingListItem]) -> GatewayFuture<'a, ()> {
        self.serve("add_shopping_list_items_to_pantry", None, json(items), move |server| {
            for purchased in items {
                server.shopping_list.retain(|entry| entry.id != purchased.id);
                if let Some(stock) = server
                    .pantry_items
                    .iter_mut()
                    .find(|item| item.id == purchased.pantry_item.id)
                {
                    stock.on_hand += purchased.quantity;
                }
            }
            Ok(())
        })
    }
}
