//! Pantry screen: categories, each with its own list of pantry items.

use crate::environment::AppEnvironment;
use crate::notice::{NoticeLevel, NoticeSlot};
use crate::reconciler::{ListAction, ListPhase, ListReducer, ListState};
use crate::resource::AppMutation;
use crate::workflow::{WorkflowAction, WorkflowReducer, WorkflowState};
use larder_client::{Category, GatewayError, Id, PantryItem};
use larder_core::composition::scope;
use larder_core::effect::Effect;
use larder_core::reducer::Reducer;
use larder_core::{async_call, smallvec, SmallVec};
use std::sync::Arc;

/// One category and the items filed under it.
#[derive(Debug, Clone)]
pub struct PantrySection {
    /// The category
    pub category: Category,
    /// Its items
    pub items: ListState<PantryItem>,
}

/// Pantry screen state.
#[derive(Debug, Clone)]
pub struct PantryState {
    /// Progress of the category fetch
    pub phase: ListPhase,
    /// One section per category, in server order
    pub sections: Vec<PantrySection>,
    /// Create/edit/delete panel
    pub workflow: WorkflowState<PantryItem>,
    /// Category fetch notices
    pub notice: NoticeSlot,
    ticket: u64,
}

impl Default for PantryState {
    fn default() -> Self {
        Self {
            phase: ListPhase::Loading,
            sections: Vec::new(),
            workflow: WorkflowState::new(()),
            notice: NoticeSlot::default(),
            ticket: 0,
        }
    }
}

impl PantryState {
    /// Section for `category`
    #[must_use]
    pub fn section(&self, category: &Id) -> Option<&PantrySection> {
        self.sections.iter().find(|section| &section.category.id == category)
    }

    /// Every item across sections, in display order
    pub fn items(&self) -> impl Iterator<Item = &PantryItem> {
        self.sections.iter().flat_map(|section| section.items.items.iter())
    }
}

/// Pantry screen input.
#[derive(Debug, Clone)]
pub enum PantryAction {
    /// Fetch categories, then every section
    Load,
    /// Categories arrived
    CategoriesLoaded {
        /// Request this reply belongs to
        ticket: u64,
        /// Categories in server order
        categories: Vec<Category>,
    },
    /// Category fetch failed
    CategoriesFailed {
        /// Request this reply belongs to
        ticket: u64,
        /// What went wrong
        error: GatewayError,
    },
    /// Input for one section's list
    Section {
        /// Category of the section
        category: Id,
        /// List input
        action: ListAction<PantryItem>,
    },
    /// Bus announcement
    Bus(AppMutation),
    /// Panel input
    Workflow(WorkflowAction<PantryItem>),
    /// Notice timer expired
    DismissNotice(u64),
}

/// Reducer for the pantry screen.
#[derive(Debug, Clone, Copy, Default)]
pub struct PantryReducer;

impl PantryReducer {
    fn section(
        section: &mut PantrySection,
        action: ListAction<PantryItem>,
        env: &AppEnvironment,
    ) -> SmallVec<[Effect<PantryAction>; 4]> {
        let category = section.category.id.clone();
        scope(&ListReducer::<PantryItem>::new(), &mut section.items, action, env, move |action| {
            PantryAction::Section {
                category: category.clone(),
                action,
            }
        })
    }
}

impl Reducer for PantryReducer {
    type State = PantryState;
    type Action = PantryAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut PantryState,
        action: PantryAction,
        env: &AppEnvironment,
    ) -> SmallVec<[Effect<PantryAction>; 4]> {
        match action {
            PantryAction::Load => {
                state.ticket += 1;
                state.phase = ListPhase::Loading;
                let ticket = state.ticket;
                let gateway = Arc::clone(&env.gateway);
                smallvec![async_call! {
                    call: gateway.list_categories(),
                    on_success: |categories| Some(PantryAction::CategoriesLoaded { ticket, categories }),
                    on_error: |error| Some(PantryAction::CategoriesFailed { ticket, error })
                }]
            },

            PantryAction::CategoriesLoaded { ticket, categories } => {
                if ticket != state.ticket {
                    return smallvec![Effect::None];
                }
                tracing::debug!(categories = categories.len(), "Categories loaded");
                state.phase = ListPhase::Ready;
                state.sections = categories
                    .into_iter()
                    .map(|category| PantrySection {
                        items: ListState::new(category.id.clone()),
                        category,
                    })
                    .collect();

                let mut effects = SmallVec::new();
                for section in &mut state.sections {
                    effects.extend(Self::section(section, ListAction::Load, env));
                }
                effects
            },

            PantryAction::CategoriesFailed { ticket, error } => {
                if ticket != state.ticket {
                    return smallvec![Effect::None];
                }
                tracing::warn!(%error, "Category fetch failed");
                state.phase = ListPhase::Failed;
                smallvec![state.notice.show(
                    NoticeLevel::Failure,
                    "Failed to retrieve Pantry Item Categories",
                    env.notice_ttl,
                    PantryAction::DismissNotice
                )]
            },

            PantryAction::Section { category, action } => {
                match state.sections.iter_mut().find(|section| section.category.id == category) {
                    Some(section) => Self::section(section, action, env),
                    None => smallvec![Effect::None],
                }
            },

            PantryAction::Bus(mutation) => {
                let mut effects = SmallVec::new();
                for section in &mut state.sections {
                    effects.extend(Self::section(section, ListAction::Bus(mutation.clone()), env));
                }
                effects
            },

            PantryAction::Workflow(action) => {
                scope(&WorkflowReducer::<PantryItem>::new(), &mut state.workflow, action, env, PantryAction::Workflow)
            },

            PantryAction::DismissNotice(id) => {
                state.notice.dismiss(id);
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resource::{AppBus, Entity, EntityKey, ResourceKind};
    use larder_core::bus::Mutation;
    use larder_testing::{MockGateway, ReducerTest, effects, fixtures};
    use std::time::Duration;

    fn env(gateway: MockGateway) -> AppEnvironment {
        AppEnvironment::new(Arc::new(gateway), AppBus::new(), Duration::from_millis(50))
    }

    async fn settle(state: &mut PantryState, first: PantryAction, env: &AppEnvironment) {
        let mut pending: Vec<_> = PantryReducer.reduce(state, first, env).into_vec();
        while !pending.is_empty() {
            for action in effects::run_effects(std::mem::take(&mut pending)).await {
                pending.extend(PantryReducer.reduce(state, action, env));
            }
        }
    }

    #[tokio::test]
    async fn load_fills_one_section_per_category() {
        let gateway = fixtures::sample_gateway();
        let env = env(gateway.clone());
        let mut state = PantryState::default();

        settle(&mut state, PantryAction::Load, &env).await;

        assert_eq!(state.phase, ListPhase::Ready);
        let dairy = state.section(&Id::from("c1")).unwrap();
        let names: Vec<_> = dairy.items.items.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, ["Milk", "Butter"]);
        assert_eq!(state.section(&Id::from("c2")).unwrap().items.items.len(), 1);
        assert_eq!(gateway.calls_to("list_pantry_items_by_category").len(), 2);
    }

    #[tokio::test]
    async fn bus_events_reach_only_the_matching_section() {
        let env = env(fixtures::sample_gateway());
        let mut state = PantryState::default();
        settle(&mut state, PantryAction::Load, &env).await;

        let flour = fixtures::pantry_item("p9", "c2", "Flour", 1.0);
        settle(
            &mut state,
            PantryAction::Bus(Mutation::Created(Entity::PantryItem(flour))),
            &env,
        )
        .await;
        settle(
            &mut state,
            PantryAction::Bus(Mutation::Deleted(EntityKey::new(ResourceKind::PantryItem, Id::from("p1")))),
            &env,
        )
        .await;

        assert_eq!(state.section(&Id::from("c1")).unwrap().items.items.len(), 1);
        let dry: Vec<_> = state
            .section(&Id::from("c2"))
            .unwrap()
            .items
            .items
            .iter()
            .map(|item| item.name.as_str())
            .collect();
        assert_eq!(dry, ["Rice", "Flour"]);
    }

    #[test]
    fn category_failure_is_reported() {
        ReducerTest::new(PantryReducer)
            .with_env(env(MockGateway::new()))
            .given_state(PantryState::default())
            .when_actions([
                PantryAction::Load,
                PantryAction::CategoriesFailed {
                    ticket: 1,
                    error: GatewayError::Request("offline".to_string()),
                },
            ])
            .then_state(|state| {
                assert_eq!(state.phase, ListPhase::Failed);
                assert_eq!(state.notice.message(), Some("Failed to retrieve Pantry Item Categories"));
            })
            .run();
    }
}
