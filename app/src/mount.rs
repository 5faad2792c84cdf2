//! Mounting a screen: its store, its bus subscription, and teardown.
//!
//! While mounted, every bus announcement is forwarded into the screen's
//! store through a channel drained by a pump task. Dropping the [`Mounted`]
//! handle unsubscribes, stops the pump, and cancels the store, so replies to
//! requests the screen issued are dropped instead of applied.

use crate::environment::AppEnvironment;
use crate::reconciler::ListAction;
use crate::resource::AppMutation;
use crate::screens::{
    PantryAction, PantryReducer, RecipeDetailAction, RecipeDetailReducer, RecipesAction, RecipesReducer,
    ShoppingListAction, ShoppingListReducer,
};
use larder_core::bus::Subscription;
use larder_core::reducer::Reducer;
use larder_runtime::{EffectHandle, Store, StoreError};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A reducer that can be mounted as a screen.
pub trait Screen:
    Reducer<Environment = AppEnvironment, State: Send + Sync + 'static, Action: Send + Clone + 'static>
    + Clone
    + Send
    + Sync
    + 'static
{
    /// Wrap a bus announcement as input
    fn on_bus(mutation: AppMutation) -> Self::Action;

    /// First action after mounting
    fn on_mount() -> Self::Action;
}

impl Screen for PantryReducer {
    fn on_bus(mutation: AppMutation) -> PantryAction {
        PantryAction::Bus(mutation)
    }

    fn on_mount() -> PantryAction {
        PantryAction::Load
    }
}

impl Screen for RecipesReducer {
    fn on_bus(mutation: AppMutation) -> RecipesAction {
        RecipesAction::Bus(mutation)
    }

    fn on_mount() -> RecipesAction {
        RecipesAction::Recipes(ListAction::Load)
    }
}

impl Screen for RecipeDetailReducer {
    fn on_bus(mutation: AppMutation) -> RecipeDetailAction {
        RecipeDetailAction::Bus(mutation)
    }

    fn on_mount() -> RecipeDetailAction {
        RecipeDetailAction::Load
    }
}

impl Screen for ShoppingListReducer {
    fn on_bus(mutation: AppMutation) -> ShoppingListAction {
        ShoppingListAction::Bus(mutation)
    }

    fn on_mount() -> ShoppingListAction {
        ShoppingListAction::Items(ListAction::Load)
    }
}

/// Store type for a mounted screen.
pub type ScreenStore<S> = Store<<S as Reducer>::State, <S as Reducer>::Action, AppEnvironment, S>;

/// A screen with a live store and bus subscription.
pub struct Mounted<S: Screen> {
    store: ScreenStore<S>,
    subscription: Option<Subscription>,
    pump: JoinHandle<()>,
}

impl<S: Screen> Mounted<S> {
    /// Subscribe to the bus, start the pump, and send the first action.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cancelled`] only if the store is cancelled
    /// before the first action, which cannot happen for a fresh mount.
    pub async fn mount(reducer: S, initial: S::State, env: AppEnvironment) -> Result<Self, StoreError> {
        let bus = env.bus.clone();
        let store = Store::new(initial, reducer, env);

        let (sender, mut receiver) = mpsc::unbounded_channel::<S::Action>();
        let subscription = bus.subscribe(move |mutation| {
            // A closed channel means the screen is being torn down.
            let _ = sender.send(S::on_bus(mutation.clone()));
        });

        let pump_store = store.clone();
        let pump = tokio::spawn(async move {
            while let Some(action) = receiver.recv().await {
                if pump_store.send(action).await.is_err() {
                    break;
                }
            }
        });

        let mounted = Self {
            store,
            subscription: Some(subscription),
            pump,
        };
        mounted.store.send(S::on_mount()).await?;
        tracing::debug!(screen = std::any::type_name::<S>(), "Mounted");
        Ok(mounted)
    }

    /// Send user input to the screen
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cancelled`] if the screen has been torn down.
    pub async fn send(&self, action: S::Action) -> Result<EffectHandle, StoreError> {
        self.store.send(action).await
    }

    /// Read the screen state
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S::State) -> T,
    {
        self.store.state(f).await
    }

    /// Wait until no effects are running
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running after `timeout`.
    pub async fn settle(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.settle(timeout).await
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &ScreenStore<S> {
        &self.store
    }
}

impl<S: Screen> Drop for Mounted<S> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.pump.abort();
        self.store.cancel();
        tracing::debug!(screen = std::any::type_name::<S>(), "Unmounted");
    }
}

impl<S: Screen> fmt::Debug for Mounted<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mounted")
            .field("screen", &std::any::type_name::<S>())
            .field("pending_effects", &self.store.pending_effects())
            .finish_non_exhaustive()
    }
}
