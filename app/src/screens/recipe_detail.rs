//! Recipe detail: one recipe and its ingredients.
//!
//! The recipe and the ingredient list are fetched in parallel. The recipe
//! follows bus updates for its own id; if it is deleted elsewhere the screen
//! shows it as gone.

use crate::environment::AppEnvironment;
use crate::notice::{NoticeLevel, NoticeSlot};
use crate::reconciler::{ListAction, ListPhase, ListReducer, ListState};
use crate::resource::{AppMutation, Entity, ResourceKind};
use crate::workflow::{WorkflowAction, WorkflowReducer, WorkflowState};
use larder_client::{GatewayError, Id, Ingredient, Recipe};
use larder_core::bus::Mutation;
use larder_core::composition::scope;
use larder_core::effect::Effect;
use larder_core::reducer::Reducer;
use larder_core::{async_call, smallvec, SmallVec};
use std::sync::Arc;

/// Recipe detail state.
#[derive(Debug, Clone)]
pub struct RecipeDetailState {
    /// Recipe shown
    pub recipe_id: Id,
    /// Its current value, once fetched
    pub recipe: Option<Recipe>,
    /// Progress of the recipe fetch
    pub phase: ListPhase,
    /// The recipe was deleted while open
    pub deleted: bool,
    /// Ingredients of this recipe
    pub ingredients: ListState<Ingredient>,
    /// Ingredient create/edit/delete panel
    pub workflow: WorkflowState<Ingredient>,
    /// Recipe fetch notices
    pub notice: NoticeSlot,
    ticket: u64,
}

impl RecipeDetailState {
    /// Detail for `recipe_id`, nothing fetched yet
    #[must_use]
    pub fn new(recipe_id: Id) -> Self {
        Self {
            ingredients: ListState::new(recipe_id.clone()),
            workflow: WorkflowState::new(recipe_id.clone()),
            recipe_id,
            recipe: None,
            phase: ListPhase::Loading,
            deleted: false,
            notice: NoticeSlot::default(),
            ticket: 0,
        }
    }
}

/// Recipe detail input.
#[derive(Debug, Clone)]
pub enum RecipeDetailAction {
    /// Fetch the recipe and its ingredients
    Load,
    /// Recipe arrived
    RecipeLoaded {
        /// Request this reply belongs to
        ticket: u64,
        /// The recipe
        recipe: Recipe,
    },
    /// Recipe fetch failed
    RecipeFailed {
        /// Request this reply belongs to
        ticket: u64,
        /// What went wrong
        error: GatewayError,
    },
    /// Ingredient list input
    Ingredients(ListAction<Ingredient>),
    /// Bus announcement
    Bus(AppMutation),
    /// Panel input
    Workflow(WorkflowAction<Ingredient>),
    /// Notice timer expired
    DismissNotice(u64),
}

/// Reducer for [`RecipeDetailState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RecipeDetailReducer;

impl RecipeDetailReducer {
    fn ingredients(
        state: &mut RecipeDetailState,
        action: ListAction<Ingredient>,
        env: &AppEnvironment,
    ) -> SmallVec<[Effect<RecipeDetailAction>; 4]> {
        scope(
            &ListReducer::<Ingredient>::new(),
            &mut state.ingredients,
            action,
            env,
            RecipeDetailAction::Ingredients,
        )
    }

    fn follow(state: &mut RecipeDetailState, mutation: &AppMutation) {
        match mutation {
            Mutation::Updated(Entity::Recipe(recipe)) if recipe.id == state.recipe_id => {
                state.recipe = Some(recipe.clone());
            },
            Mutation::Deleted(key) if key.kind == ResourceKind::Recipe && key.id == state.recipe_id => {
                tracing::debug!(recipe = %state.recipe_id, "Open recipe deleted");
                state.recipe = None;
                state.deleted = true;
            },
            _ => {},
        }
    }
}

impl Reducer for RecipeDetailReducer {
    type State = RecipeDetailState;
    type Action = RecipeDetailAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut RecipeDetailState,
        action: RecipeDetailAction,
        env: &AppEnvironment,
    ) -> SmallVec<[Effect<RecipeDetailAction>; 4]> {
        match action {
            RecipeDetailAction::Load => {
                state.ticket += 1;
                state.phase = ListPhase::Loading;
                let ticket = state.ticket;
                let gateway = Arc::clone(&env.gateway);
                let id = state.recipe_id.clone();
                let recipe = async_call! {
                    call: gateway.get_recipe(&id),
                    on_success: |recipe| Some(RecipeDetailAction::RecipeLoaded { ticket, recipe }),
                    on_error: |error| Some(RecipeDetailAction::RecipeFailed { ticket, error })
                };

                let mut parallel = vec![recipe];
                parallel.extend(Self::ingredients(state, ListAction::Load, env));
                smallvec![Effect::merge(parallel)]
            },

            RecipeDetailAction::RecipeLoaded { ticket, recipe } => {
                if ticket == state.ticket && !state.deleted {
                    state.recipe = Some(recipe);
                    state.phase = ListPhase::Ready;
                }
                smallvec![Effect::None]
            },

            RecipeDetailAction::RecipeFailed { ticket, error } => {
                if ticket != state.ticket {
                    return smallvec![Effect::None];
                }
                tracing::warn!(recipe = %state.recipe_id, %error, "Recipe fetch failed");
                state.phase = ListPhase::Failed;
                smallvec![state.notice.show(
                    NoticeLevel::Failure,
                    "Failed to retrieve recipe",
                    env.notice_ttl,
                    RecipeDetailAction::DismissNotice
                )]
            },

            RecipeDetailAction::Ingredients(action) => Self::ingredients(state, action, env),

            RecipeDetailAction::Bus(mutation) => {
                Self::follow(state, &mutation);
                Self::ingredients(state, ListAction::Bus(mutation), env)
            },

            RecipeDetailAction::Workflow(action) => scope(
                &WorkflowReducer::<Ingredient>::new(),
                &mut state.workflow,
                action,
                env,
                RecipeDetailAction::Workflow,
            ),

            RecipeDetailAction::DismissNotice(id) => {
                state.notice.dismiss(id);
                smallvec![Effect::None]
            },
        }
    }
}
