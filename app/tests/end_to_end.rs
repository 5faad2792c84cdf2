//! Screens, the bus and the session driven together against the in-memory service.

#![allow(clippy::unwrap_used)]

use larder_app::screens::{PantryReducer, PantryState, ShoppingListAction, ShoppingListReducer, ShoppingListState};
use larder_app::session::LOGIN_FAILED;
use larder_app::{
    App, AppBus, AppConfig, AppEnvironment, AppError, Entity, EntityKey, ListPhase, LoginError, Mounted, ResourceKind,
    View,
};
use larder_client::{AuthToken, Id, PantryItem};
use larder_testing::fixtures::{self, SAMPLE_PASSWORD, SAMPLE_TOKEN, SAMPLE_USER};
use larder_testing::{MemoryTokenStore, MockGateway};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

fn env(gateway: &MockGateway) -> AppEnvironment {
    AppEnvironment::new(Arc::new(gateway.clone()), AppBus::new(), Duration::from_millis(20))
}

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.ui.notice_ttl_ms = 500;
    config
}

/// Poll `check` until it holds or `WAIT` elapses.
async fn eventually<F>(mut check: F)
where
    F: AsyncFnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + WAIT;
    while !check().await {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

async fn pantry_ids(pantry: &Mounted<PantryReducer>, category: &Id) -> Vec<Id> {
    pantry
        .state(|state| {
            state
                .section(category)
                .map(|section| section.items.items.iter().map(|item| item.id.clone()).collect())
                .unwrap_or_default()
        })
        .await
}

#[tokio::test]
async fn pantry_section_follows_updates_and_deletes() {
    let gateway = MockGateway::new();
    gateway.add_category(fixtures::category("c1", "Fridge"));
    let milk = fixtures::pantry_item("p1", "c1", "Milk", 2.0);
    gateway.add_pantry_item(milk.clone());
    let env = env(&gateway);
    let fridge = Id::from("c1");

    let pantry = Mounted::mount(PantryReducer, PantryState::default(), env.clone()).await.unwrap();
    pantry.settle(WAIT).await.unwrap();

    assert_eq!(pantry.state(|state| state.phase).await, ListPhase::Ready);
    assert_eq!(pantry_ids(&pantry, &fridge).await, vec![Id::from("p1")]);

    env.bus.publish_updated(Entity::PantryItem(PantryItem { on_hand: 1.0, ..milk.clone() }));
    eventually(async || {
        pantry
            .state(|state| state.items().next().map(|item| item.on_hand) == Some(1.0))
            .await
    })
    .await;
    let held: Vec<PantryItem> = pantry.state(|state| state.items().cloned().collect()).await;
    assert_eq!(held, vec![PantryItem { on_hand: 1.0, ..milk }]);

    env.bus.publish_deleted(EntityKey::new(ResourceKind::PantryItem, Id::from("p1")));
    eventually(async || pantry_ids(&pantry, &fridge).await.is_empty()).await;

    // A second delete of the same id is tolerated.
    env.bus.publish_deleted(EntityKey::new(ResourceKind::PantryItem, Id::from("p1")));
    pantry.settle(WAIT).await.unwrap();
    assert!(pantry_ids(&pantry, &fridge).await.is_empty());
}

#[tokio::test]
async fn repeated_create_announcements_add_one_entry() {
    let gateway = MockGateway::new();
    gateway.add_category(fixtures::category("c1", "Fridge"));
    let env = env(&gateway);
    let pantry = Mounted::mount(PantryReducer, PantryState::default(), env.clone()).await.unwrap();
    pantry.settle(WAIT).await.unwrap();

    let yoghurt = fixtures::pantry_item("p7", "c1", "Yoghurt", 4.0);
    env.bus.publish_created(Entity::PantryItem(yoghurt.clone()));
    env.bus.publish_created(Entity::PantryItem(yoghurt));
    // Bus events are applied in order, so once cream shows up both yoghurt events have been seen.
    env.bus
        .publish_created(Entity::PantryItem(fixtures::pantry_item("p8", "c1", "Cream", 1.0)));
    eventually(async || pantry_ids(&pantry, &Id::from("c1")).await.len() >= 2).await;

    assert_eq!(
        pantry_ids(&pantry, &Id::from("c1")).await,
        vec![Id::from("p7"), Id::from("p8")]
    );
}

#[tokio::test]
async fn purchased_entries_move_to_the_pantry() {
    let gateway = MockGateway::new();
    let milk = fixtures::pantry_item("p1", "c1", "Milk", 2.0);
    gateway.add_pantry_item(milk.clone());
    gateway.add_shopping_item(fixtures::shopping_item("s1", milk, 3.0));

    let list = Mounted::mount(ShoppingListReducer, ShoppingListState::default(), env(&gateway))
        .await
        .unwrap();
    list.settle(WAIT).await.unwrap();
    assert_eq!(list.state(|state| state.items.items.len()).await, 1);

    list.send(ShoppingListAction::Toggle(0)).await.unwrap();
    assert!(list.state(|state| state.items.items[0].is_checked).await);

    list.send(ShoppingListAction::MarkPurchased).await.unwrap();
    list.settle(WAIT).await.unwrap();

    let calls = gateway.calls_to("add_shopping_list_items_to_pantry");
    assert_eq!(calls.len(), 1);
    let body = calls[0].body.clone().unwrap();
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["id"], json!("s1"));
    assert_eq!(body[0]["isChecked"], json!(true));

    assert!(list.state(|state| state.items.items.is_empty()).await);
    assert!(gateway.shopping_list().is_empty());
}

fn app(gateway: &MockGateway, tokens: &MemoryTokenStore, auth: &AuthToken) -> App {
    larder_testing::init_tracing();
    App::new(Arc::new(gateway.clone()), auth.clone(), Arc::new(tokens.clone()), &config())
}

#[tokio::test]
async fn login_stores_the_token_and_unlocks_the_views() {
    let auth = AuthToken::new();
    let gateway = fixtures::sample_gateway().with_token(auth.clone());
    let tokens = MemoryTokenStore::new();
    let mut app = app(&gateway, &tokens, &auth);

    assert!(!app.restore().await.unwrap());
    assert!(matches!(app.navigate(View::Pantry).await, Err(AppError::LoggedOut)));

    app.login(SAMPLE_USER, SAMPLE_PASSWORD).await.unwrap();

    assert!(app.is_logged_in().await);
    assert_eq!(auth.current().as_deref(), Some(SAMPLE_TOKEN));
    assert_eq!(tokens.value(&config().storage.token_key).as_deref(), Some(SAMPLE_TOKEN));

    app.navigate(View::Pantry).await.unwrap();
    let pantry = app.pantry().unwrap();
    pantry.settle(WAIT).await.unwrap();
    assert_eq!(pantry.state(|state| state.sections.len()).await, 2);
    assert!(
        gateway
            .calls_to("list_categories")
            .iter()
            .all(|call| call.token.as_deref() == Some(SAMPLE_TOKEN))
    );
}

#[tokio::test]
async fn rejected_login_keeps_the_views_locked() {
    let auth = AuthToken::new();
    let gateway = fixtures::sample_gateway().with_token(auth.clone());
    let tokens = MemoryTokenStore::new();
    let mut app = app(&gateway, &tokens, &auth);

    let result = app.login(SAMPLE_USER, "wrong password").await;

    assert!(matches!(result, Err(AppError::Login(LoginError::Rejected(_)))));
    assert!(!app.is_logged_in().await);
    assert_eq!(tokens.value(&config().storage.token_key), None);
    assert_eq!(
        app.session().state(|state| state.notice.message().map(str::to_string)).await.as_deref(),
        Some(LOGIN_FAILED)
    );
    assert!(app.screen().is_none());
    assert!(matches!(app.navigate(View::Recipes).await, Err(AppError::LoggedOut)));
}

#[tokio::test]
async fn invalid_email_never_reaches_the_service() {
    let auth = AuthToken::new();
    let gateway = fixtures::sample_gateway();
    let tokens = MemoryTokenStore::new();
    let mut app = app(&gateway, &tokens, &auth);

    let result = app.login("not an email", SAMPLE_PASSWORD).await;

    assert!(matches!(result, Err(AppError::Login(LoginError::InvalidEmail))));
    assert!(gateway.calls_to("authenticate").is_empty());
}

#[tokio::test]
async fn logout_unmounts_screens_and_forgets_the_token() {
    let auth = AuthToken::new();
    let gateway = fixtures::sample_gateway().with_token(auth.clone());
    let key = config().storage.token_key;
    let tokens = MemoryTokenStore::with_value(&key, SAMPLE_TOKEN);
    let mut app = app(&gateway, &tokens, &auth);

    assert!(app.restore().await.unwrap());
    gateway.set_latency(Some(Duration::from_millis(100)));
    app.navigate(View::ShoppingList).await.unwrap();
    let store = app.shopping_list().unwrap().store().clone();

    app.logout().await.unwrap();

    assert!(app.screen().is_none());
    assert_eq!(app.router().active, View::Home);
    assert!(store.is_cancelled());
    assert_eq!(auth.current(), None);
    assert_eq!(tokens.value(&key), None);

    // The list request issued before logout still completes, but nothing applies it.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(store.state(|state| state.items.items.is_empty()).await);
}

#[tokio::test]
async fn planner_view_mounts_recipes_for_list_generation() {
    let auth = AuthToken::new();
    let gateway = fixtures::sample_gateway().with_token(auth.clone());
    let tokens = MemoryTokenStore::with_value(&config().storage.token_key, SAMPLE_TOKEN);
    let mut app = app(&gateway, &tokens, &auth);
    app.restore().await.unwrap();

    app.navigate(View::Planner).await.unwrap();
    let recipes = app.recipes().unwrap();
    recipes.settle(WAIT).await.unwrap();

    assert_eq!(
        recipes.state(|state| state.mode).await,
        larder_app::screens::PlanMode::GeneratingList
    );
    assert_eq!(recipes.state(|state| state.recipes.items.len()).await, 2);

    app.open_recipe(Id::from("r1")).await.unwrap();
    let detail = app.recipe_detail().unwrap();
    detail.settle(WAIT).await.unwrap();
    assert_eq!(detail.state(|state| state.ingredients.items.len()).await, 2);

    app.navigate(View::Home).await.unwrap();
    assert!(app.recipe_detail().is_none());
    assert!(app.screen().is_none());
}
