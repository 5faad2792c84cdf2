//! Recipes screen and the meal planner.
//!
//! In a planning mode each recipe row takes a servings count. Submitting
//! sends every recipe with servings above zero to the service, either to
//! generate a shopping list or to mark the recipes as consumed. Servings are
//! reset and planning ends as soon as the request is sent.

use crate::environment::AppEnvironment;
use crate::notice::{NoticeLevel, NoticeSlot};
use crate::reconciler::{ListAction, ListReducer, ListState};
use crate::resource::AppMutation;
use crate::workflow::{WorkflowAction, WorkflowReducer, WorkflowState};
use larder_client::{GatewayError, Id, Recipe, ServingsRequest};
use larder_core::composition::scope;
use larder_core::effect::Effect;
use larder_core::reducer::Reducer;
use larder_core::{async_call, smallvec, SmallVec};
use std::sync::Arc;

/// What servings are being collected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMode {
    /// Not planning
    Browsing,
    /// Servings become a shopping list
    GeneratingList,
    /// Servings are deducted from the pantry
    Consuming,
}

impl PlanMode {
    const fn success(self) -> &'static str {
        match self {
            PlanMode::GeneratingList => "Shopping list generated - go to your shopping list.",
            PlanMode::Consuming | PlanMode::Browsing => "Recipe consumption successful.",
        }
    }

    const fn failure(self) -> &'static str {
        match self {
            PlanMode::GeneratingList => "Failed to generate shopping list",
            PlanMode::Consuming | PlanMode::Browsing => "Failed to consume recipes",
        }
    }
}

/// Recipes screen state.
#[derive(Debug, Clone)]
pub struct RecipesState {
    /// Recipes, each carrying its planned servings
    pub recipes: ListState<Recipe>,
    /// Create/edit/delete panel
    pub workflow: WorkflowState<Recipe>,
    /// Planning mode
    pub mode: PlanMode,
    /// A plan request is in flight
    pub planning: bool,
    /// Planner notices
    pub notice: NoticeSlot,
}

impl RecipesState {
    /// Screen in `mode`, recipes not yet loaded
    #[must_use]
    pub fn new(mode: PlanMode) -> Self {
        Self {
            recipes: ListState::new(()),
            workflow: WorkflowState::new(()),
            mode,
            planning: false,
            notice: NoticeSlot::default(),
        }
    }

    /// Recipes with servings above zero, as a request
    #[must_use]
    pub fn plan(&self) -> Vec<ServingsRequest> {
        self.recipes
            .items
            .iter()
            .filter(|recipe| recipe.servings > 0)
            .map(|recipe| ServingsRequest {
                id: recipe.id.clone(),
                servings: recipe.servings,
            })
            .collect()
    }

    fn reset(&mut self) {
        self.mode = PlanMode::Browsing;
        for recipe in &mut self.recipes.items {
            recipe.servings = 0;
        }
    }
}

impl Default for RecipesState {
    fn default() -> Self {
        Self::new(PlanMode::Browsing)
    }
}

/// Recipes screen input.
#[derive(Debug, Clone)]
pub enum RecipesAction {
    /// Recipe list input
    Recipes(ListAction<Recipe>),
    /// Bus announcement
    Bus(AppMutation),
    /// Panel input
    Workflow(WorkflowAction<Recipe>),
    /// Enter a planning mode
    StartPlan(PlanMode),
    /// Servings text typed for a recipe; unparseable counts as zero
    SetServings {
        /// Recipe row
        id: Id,
        /// Raw input
        servings: String,
    },
    /// Send the plan
    SubmitPlan,
    /// Leave planning without sending anything
    CancelPlan,
    /// Plan accepted
    PlanSent(PlanMode),
    /// Plan rejected
    PlanFailed {
        /// Mode the plan was sent in
        mode: PlanMode,
        /// What went wrong
        error: GatewayError,
    },
    /// Notice timer expired
    DismissNotice(u64),
}

/// Reducer for the recipes screen.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecipesReducer;

impl RecipesReducer {
    fn submit_plan(state: &mut RecipesState, env: &AppEnvironment) -> Effect<RecipesAction> {
        let mode = state.mode;
        if mode == PlanMode::Browsing || state.planning {
            return Effect::None;
        }

        let plan = state.plan();
        state.reset();
        if plan.is_empty() {
            return Effect::None;
        }

        tracing::info!(?mode, recipes = plan.len(), "Submitting plan");
        state.planning = true;
        let gateway = Arc::clone(&env.gateway);
        async_call! {
            call: async {
                match mode {
                    PlanMode::GeneratingList => gateway.generate_shopping_list(&plan).await,
                    PlanMode::Consuming | PlanMode::Browsing => gateway.consume_recipes(&plan).await,
                }
            },
            on_success: |_sent| Some(RecipesAction::PlanSent(mode)),
            on_error: |error| Some(RecipesAction::PlanFailed { mode, error })
        }
    }
}

impl Reducer for RecipesReducer {
    type State = RecipesState;
    type Action = RecipesAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut RecipesState,
        action: RecipesAction,
        env: &AppEnvironment,
    ) -> SmallVec<[Effect<RecipesAction>; 4]> {
        match action {
            RecipesAction::Recipes(action) => {
                scope(&ListReducer::<Recipe>::new(), &mut state.recipes, action, env, RecipesAction::Recipes)
            },

            RecipesAction::Bus(mutation) => scope(
                &ListReducer::<Recipe>::new(),
                &mut state.recipes,
                ListAction::Bus(mutation),
                env,
                RecipesAction::Recipes,
            ),

            RecipesAction::Workflow(action) => {
                scope(&WorkflowReducer::<Recipe>::new(), &mut state.workflow, action, env, RecipesAction::Workflow)
            },

            RecipesAction::StartPlan(mode) => {
                if !state.planning {
                    state.reset();
                    state.mode = mode;
                }
                smallvec![Effect::None]
            },

            RecipesAction::SetServings { id, servings } => {
                if state.mode != PlanMode::Browsing {
                    if let Some(recipe) = state.recipes.items.iter_mut().find(|recipe| recipe.id == id) {
                        recipe.servings = servings.trim().parse().unwrap_or(0);
                    }
                }
                smallvec![Effect::None]
            },

            RecipesAction::SubmitPlan => smallvec![Self::submit_plan(state, env)],

            RecipesAction::CancelPlan => {
                state.reset();
                smallvec![Effect::None]
            },

            RecipesAction::PlanSent(mode) => {
                state.planning = false;
                smallvec![state.notice.show(
                    NoticeLevel::Success,
                    mode.success(),
                    env.notice_ttl,
                    RecipesAction::DismissNotice
                )]
            },

            RecipesAction::PlanFailed { mode, error } => {
                state.planning = false;
                tracing::warn!(?mode, %error, "Plan failed");
                smallvec![state.notice.show(
                    NoticeLevel::Failure,
                    mode.failure(),
                    env.notice_ttl,
                    RecipesAction::DismissNotice
                )]
            },

            RecipesAction::DismissNotice(id) => {
                state.notice.dismiss(id);
                smallvec![Effect::None]
            },
        }
    }
}
