//! Resource Edit Workflow: the slide-up panel shared by every editable kind.
//!
//! ```text
//!            ToggleMenu(id)              ChooseEdit
//!   Closed ─────────────────▶ Menu ─────────────────▶ Editing ──┐
//!     ▲  │                     │                        ▲        │ Saved
//!     │  │ OpenCreate          │ ChooseDelete           │        │
//!     │  └─────────────────────┼────────────────────────┘        │
//!     │                        ▼                                 │
//!     │◀──────────────── ConfirmDelete ◀─────────────────────────┘
//!     │      Deleted                                    (Close from anywhere)
//! ```
//!
//! A successful save or delete is announced on the bus by the effect that
//! performed it, so other screens learn about it even if this panel was
//! closed in the meantime. Gateway failures leave the panel where it was.

use crate::environment::AppEnvironment;
use crate::error::FormError;
use crate::notice::{FORM_INVALID, NoticeLevel, NoticeSlot};
use crate::resource::{EntityKey, Resource};
use larder_client::{Gateway, GatewayError, GatewayFuture, Id};
use larder_core::effect::Effect;
use larder_core::reducer::Reducer;
use larder_core::{async_call, smallvec, SmallVec};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Whether the form creates a new entity or edits an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// No existing id
    Create,
    /// Editing the entity with this id
    Edit(Id),
}

impl Mode {
    /// Id being edited, if any
    #[must_use]
    pub const fn existing(&self) -> Option<&Id> {
        match self {
            Mode::Create => None,
            Mode::Edit(id) => Some(id),
        }
    }

    /// Whether this is create mode
    #[must_use]
    pub const fn is_create(&self) -> bool {
        matches!(self, Mode::Create)
    }
}

/// Form data and dropdown choices fetched before a form becomes interactive.
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared<K: Editable> {
    /// Initial field values
    pub form: K::Form,
    /// Reference lists for dropdowns
    pub choices: K::Choices,
}

/// A resource kind the workflow can create, edit and delete.
pub trait Editable: Resource {
    /// Fixed data the panel is opened with (the owning recipe for ingredients)
    type Context: Clone + fmt::Debug + PartialEq + Send + Sync + 'static;
    /// Raw, unvalidated field values
    type Form: Clone + fmt::Debug + Default + PartialEq + Send + Sync + 'static;
    /// One field edit
    type Field: Clone + fmt::Debug + Send + Sync + 'static;
    /// Reference lists for dropdowns
    type Choices: Clone + fmt::Debug + Default + PartialEq + Send + Sync + 'static;
    /// Validated request, ready to send
    type Draft: Clone + fmt::Debug + Send + Sync + 'static;

    /// Fetch everything the form needs for `mode`
    fn prepare<'a>(
        gateway: &'a dyn Gateway,
        context: &'a Self::Context,
        mode: &'a Mode,
    ) -> GatewayFuture<'a, Prepared<Self>>;

    /// Notice text when [`Editable::prepare`] fails
    fn prepare_failure(_mode: &Mode) -> String {
        format!("Failed to retrieve {}", Self::KIND.plural())
    }

    /// Apply one field edit
    fn apply(form: &mut Self::Form, field: Self::Field);

    /// Check required fields and parse numbers
    ///
    /// # Errors
    ///
    /// Returns a [`FormError`] for an empty required field or an unparseable number.
    fn validate(form: &Self::Form, context: &Self::Context, mode: &Mode) -> Result<Self::Draft, FormError>;

    /// Send a validated draft
    fn save<'a>(gateway: &'a dyn Gateway, draft: &'a Self::Draft) -> GatewayFuture<'a, Self>;

    /// Delete by id
    fn delete<'a>(gateway: &'a dyn Gateway, id: &'a Id) -> GatewayFuture<'a, ()>;

    /// How the saved entity is named in the success notice
    fn saved_label(&self) -> String;
}

/// Progress of the fetches behind an edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPhase {
    /// Not interactive yet
    Loading,
    /// Interactive
    Ready,
    /// A fetch failed; `Reload` retries
    Failed(String),
}

/// An open create/edit form.
#[derive(Debug, Clone)]
pub struct EditSession<K: Editable> {
    /// Create or edit
    pub mode: Mode,
    /// Fetch progress
    pub phase: FormPhase,
    /// Current field values
    pub form: K::Form,
    /// Dropdown choices
    pub choices: K::Choices,
    /// A save is in flight; further submits are ignored
    pub submitting: bool,
    ticket: u64,
}

/// What the panel shows.
#[derive(Debug, Clone)]
pub enum Panel<K: Editable> {
    /// No panel
    Closed,
    /// Edit/delete picker for an existing item
    Menu {
        /// Item the menu was opened on
        target: Id,
    },
    /// Create or edit form
    Editing(EditSession<K>),
    /// Delete confirmation
    ConfirmDelete {
        /// Item to delete
        target: Id,
        /// The delete call is in flight
        deleting: bool,
        /// Request the in-flight delete belongs to
        ticket: u64,
    },
}

/// Workflow state for one resource kind.
#[derive(Debug, Clone)]
pub struct WorkflowState<K: Editable> {
    /// Fixed data the panel works within
    pub context: K::Context,
    /// Current panel
    pub panel: Panel<K>,
    /// Notices raised by the panel
    pub notice: NoticeSlot,
    next_ticket: u64,
}

impl<K: Editable> WorkflowState<K> {
    /// Closed panel
    #[must_use]
    pub fn new(context: K::Context) -> Self {
        Self {
            context,
            panel: Panel::Closed,
            notice: NoticeSlot::default(),
            next_ticket: 0,
        }
    }

    /// Whether any panel is showing
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self.panel, Panel::Closed)
    }

    /// The open form, if any
    #[must_use]
    pub const fn session(&self) -> Option<&EditSession<K>> {
        match &self.panel {
            Panel::Editing(session) => Some(session),
            _ => None,
        }
    }

    /// A save or delete is in flight
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        match &self.panel {
            Panel::Editing(session) => session.submitting,
            Panel::ConfirmDelete { deleting, .. } => *deleting,
            Panel::Closed | Panel::Menu { .. } => false,
        }
    }

    fn issue_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }
}

/// Inputs to a [`WorkflowReducer`].
#[derive(Debug, Clone)]
pub enum WorkflowAction<K: Editable> {
    /// Open the menu on `id`, or close it if already open on `id`
    ToggleMenu(Id),
    /// Open an empty form
    OpenCreate,
    /// Menu: edit the target
    ChooseEdit,
    /// Menu: delete the target
    ChooseDelete,
    /// Close the panel
    Close,
    /// Form fetches finished
    Prepared {
        /// Request this reply belongs to
        ticket: u64,
        /// Loaded form and choices
        prepared: Prepared<K>,
    },
    /// Form fetches failed
    PrepareFailed {
        /// Request this reply belongs to
        ticket: u64,
        /// What went wrong
        error: GatewayError,
    },
    /// Retry the form fetches after a failure
    Reload,
    /// Change one field
    Edit(K::Field),
    /// Validate and save
    Submit,
    /// Save succeeded and was announced
    Saved {
        /// Request this reply belongs to
        ticket: u64,
        /// Entity as returned by the service
        entity: K,
        /// Whether it was a create
        created: bool,
    },
    /// Save failed
    SaveFailed {
        /// Request this reply belongs to
        ticket: u64,
        /// Whether it was a create
        created: bool,
        /// What went wrong
        error: GatewayError,
    },
    /// Confirmation: delete the target
    ConfirmDelete,
    /// Delete succeeded and was announced
    Deleted {
        /// Request this reply belongs to
        ticket: u64,
        /// Deleted id
        id: Id,
    },
    /// Delete failed
    DeleteFailed {
        /// Request this reply belongs to
        ticket: u64,
        /// What went wrong
        error: GatewayError,
    },
    /// Notice timer expired, or the user acknowledged a blocking notice
    DismissNotice(u64),
}

/// Reducer for [`WorkflowState`], generic over the resource kind.
pub struct WorkflowReducer<K> {
    _kind: PhantomData<fn() -> K>,
}

impl<K> WorkflowReducer<K> {
    /// Create a reducer
    #[must_use]
    pub const fn new() -> Self {
        Self { _kind: PhantomData }
    }
}

impl<K> Default for WorkflowReducer<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Clone for WorkflowReducer<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for WorkflowReducer<K> {}

impl<K> fmt::Debug for WorkflowReducer<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowReducer").finish()
    }
}

impl<K: Editable> WorkflowReducer<K> {
    fn open_form(state: &mut WorkflowState<K>, mode: Mode, env: &AppEnvironment) -> Effect<WorkflowAction<K>> {
        let ticket = state.issue_ticket();
        tracing::debug!(kind = %K::KIND, ?mode, ticket, "Opening form");
        state.panel = Panel::Editing(EditSession {
            mode: mode.clone(),
            phase: FormPhase::Loading,
            form: K::Form::default(),
            choices: K::Choices::default(),
            submitting: false,
            ticket,
        });

        let gateway = Arc::clone(&env.gateway);
        let context = state.context.clone();
        async_call! {
            call: K::prepare(gateway.as_ref(), &context, &mode),
            on_success: |prepared| Some(WorkflowAction::Prepared { ticket, prepared }),
            on_error: |error| Some(WorkflowAction::PrepareFailed { ticket, error })
        }
    }

    fn submit(state: &mut WorkflowState<K>, env: &AppEnvironment) -> Effect<WorkflowAction<K>> {
        let Panel::Editing(session) = &mut state.panel else {
            return Effect::None;
        };
        if session.phase != FormPhase::Ready || session.submitting {
            return Effect::None;
        }

        let draft = match K::validate(&session.form, &state.context, &session.mode) {
            Ok(draft) => draft,
            Err(error) => {
                tracing::debug!(kind = %K::KIND, %error, "Form rejected");
                return state
                    .notice
                    .show(NoticeLevel::Blocking, FORM_INVALID, env.notice_ttl, WorkflowAction::DismissNotice);
            },
        };

        session.submitting = true;
        let ticket = session.ticket;
        let created = session.mode.is_create();
        let gateway = Arc::clone(&env.gateway);
        let bus = env.bus.clone();

        async_call! {
            call: K::save(gateway.as_ref(), &draft),
            on_success: |entity| {
                let announced = entity.clone().into_entity();
                if created {
                    bus.publish_created(announced);
                } else {
                    bus.publish_updated(announced);
                }
                Some(WorkflowAction::Saved { ticket, entity, created })
            },
            on_error: |error| Some(WorkflowAction::SaveFailed { ticket, created, error })
        }
    }

    fn confirm_delete(state: &mut WorkflowState<K>, env: &AppEnvironment) -> Effect<WorkflowAction<K>> {
        let issued = state.next_ticket + 1;
        let Panel::ConfirmDelete { target, deleting, ticket } = &mut state.panel else {
            return Effect::None;
        };
        if *deleting {
            return Effect::None;
        }

        *deleting = true;
        *ticket = issued;
        let id = target.clone();
        state.next_ticket = issued;

        let request = id.clone();
        let gateway = Arc::clone(&env.gateway);
        let bus = env.bus.clone();
        async_call! {
            call: K::delete(gateway.as_ref(), &request),
            on_success: |_deleted| {
                bus.publish_deleted(EntityKey::new(K::KIND, id.clone()));
                Some(WorkflowAction::Deleted { ticket: issued, id })
            },
            on_error: |error| Some(WorkflowAction::DeleteFailed { ticket: issued, error })
        }
    }

    fn session_mut(state: &mut WorkflowState<K>, ticket: u64) -> Option<&mut EditSession<K>> {
        match &mut state.panel {
            Panel::Editing(session) if session.ticket == ticket => Some(session),
            _ => None,
        }
    }
}

impl<K: Editable> Reducer for WorkflowReducer<K> {
    type State = WorkflowState<K>;
    type Action = WorkflowAction<K>;
    type Environment = AppEnvironment;

    #[allow(clippy::too_many_lines)]
    fn reduce(
        &self,
        state: &mut WorkflowState<K>,
        action: WorkflowAction<K>,
        env: &AppEnvironment,
    ) -> SmallVec<[Effect<WorkflowAction<K>>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════
            // Navigation within the panel
            // ═══════════════════════════════════════════════════════════
            WorkflowAction::ToggleMenu(id) => {
                match &state.panel {
                    Panel::Closed => state.panel = Panel::Menu { target: id },
                    Panel::Menu { target } if *target == id => state.panel = Panel::Closed,
                    _ => {},
                }
                smallvec![Effect::None]
            },

            WorkflowAction::OpenCreate => {
                if state.is_busy() {
                    return smallvec![Effect::None];
                }
                smallvec![Self::open_form(state, Mode::Create, env)]
            },

            WorkflowAction::ChooseEdit => {
                let Panel::Menu { target } = &state.panel else {
                    return smallvec![Effect::None];
                };
                let mode = Mode::Edit(target.clone());
                smallvec![Self::open_form(state, mode, env)]
            },

            WorkflowAction::ChooseDelete => {
                if let Panel::Menu { target } = &state.panel {
                    state.panel = Panel::ConfirmDelete {
                        target: target.clone(),
                        deleting: false,
                        ticket: 0,
                    };
                }
                smallvec![Effect::None]
            },

            WorkflowAction::Close => {
                state.panel = Panel::Closed;
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════
            // Form loading
            // ═══════════════════════════════════════════════════════════
            WorkflowAction::Prepared { ticket, prepared } => {
                if let Some(session) = Self::session_mut(state, ticket) {
                    session.form = prepared.form;
                    session.choices = prepared.choices;
                    session.phase = FormPhase::Ready;
                }
                smallvec![Effect::None]
            },

            WorkflowAction::PrepareFailed { ticket, error } => {
                let Some(session) = Self::session_mut(state, ticket) else {
                    return smallvec![Effect::None];
                };
                let message = K::prepare_failure(&session.mode);
                tracing::warn!(kind = %K::KIND, %error, "Form fetch failed");
                session.phase = FormPhase::Failed(message.clone());
                smallvec![state.notice.show(
                    NoticeLevel::Failure,
                    message,
                    env.notice_ttl,
                    WorkflowAction::DismissNotice
                )]
            },

            WorkflowAction::Reload => {
                let mode = match &state.panel {
                    Panel::Editing(session) if matches!(session.phase, FormPhase::Failed(_)) => {
                        session.mode.clone()
                    },
                    _ => return smallvec![Effect::None],
                };
                smallvec![Self::open_form(state, mode, env)]
            },

            WorkflowAction::Edit(field) => {
                if let Panel::Editing(session) = &mut state.panel {
                    if session.phase == FormPhase::Ready && !session.submitting {
                        K::apply(&mut session.form, field);
                    }
                }
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════
            // Saving
            // ═══════════════════════════════════════════════════════════
            WorkflowAction::Submit => smallvec![Self::submit(state, env)],

            WorkflowAction::Saved { ticket, entity, created } => {
                if Self::session_mut(state, ticket).is_some() {
                    state.panel = Panel::Closed;
                }
                let verb = if created { "created" } else { "updated" };
                smallvec![state.notice.show(
                    NoticeLevel::Success,
                    format!("Successfully {verb} {}", entity.saved_label()),
                    env.notice_ttl,
                    WorkflowAction::DismissNotice
                )]
            },

            WorkflowAction::SaveFailed { ticket, created, error } => {
                if let Some(session) = Self::session_mut(state, ticket) {
                    session.submitting = false;
                }
                tracing::warn!(kind = %K::KIND, %error, "Save failed");
                let verb = if created { "create" } else { "update" };
                smallvec![state.notice.show(
                    NoticeLevel::Failure,
                    format!("Failed to {verb} {}", K::KIND.label()),
                    env.notice_ttl,
                    WorkflowAction::DismissNotice
                )]
            },

            // ═══════════════════════════════════════════════════════════
            // Deleting
            // ═══════════════════════════════════════════════════════════
            WorkflowAction::ConfirmDelete => smallvec![Self::confirm_delete(state, env)],

            WorkflowAction::Deleted { ticket, id } => {
                if matches!(&state.panel, Panel::ConfirmDelete { ticket: current, .. } if *current == ticket) {
                    state.panel = Panel::Closed;
                }
                tracing::debug!(kind = %K::KIND, %id, "Deleted");
                smallvec![state.notice.show(
                    NoticeLevel::Success,
                    format!("Successfully deleted {}", K::KIND.label()),
                    env.notice_ttl,
                    WorkflowAction::DismissNotice
                )]
            },

            WorkflowAction::DeleteFailed { ticket, error } => {
                if let Panel::ConfirmDelete { deleting, ticket: current, .. } = &mut state.panel {
                    if *current == ticket {
                        *deleting = false;
                    }
                }
                tracing::warn!(kind = %K::KIND, %error, "Delete failed");
                smallvec![state.notice.show(
                    NoticeLevel::Failure,
                    format!("Failed to delete {}", K::KIND.label()),
                    env.notice_ttl,
                    WorkflowAction::DismissNotice
                )]
            },

            WorkflowAction::DismissNotice(id) => {
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
    use crate::forms::{PantryItemField, RecipeField, RecipeForm};
    use crate::resource::{AppBus, AppMutation, ResourceKind};
    use larder_client::{CapacityMeasure, Container, PantryItem, Recipe};
    use larder_core::bus::{Mutation, Subscription};
    use larder_testing::{MockGateway, ReducerTest, assertions, effects, fixtures};
    use std::sync::Mutex;
    use std::time::Duration;

    fn env(gateway: MockGateway) -> AppEnvironment {
        AppEnvironment::new(Arc::new(gateway), AppBus::new(), Duration::from_millis(50))
    }

    fn record(bus: &AppBus) -> (Arc<Mutex<Vec<AppMutation>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = bus.subscribe(move |mutation| sink.lock().unwrap().push(mutation.clone()));
        (seen, subscription)
    }

    /// Feed every action produced by `pending` back in until nothing is left.
    async fn settle<K: Editable>(
        state: &mut WorkflowState<K>,
        pending: impl IntoIterator<Item = Effect<WorkflowAction<K>>>,
        env: &AppEnvironment,
    ) {
        let reducer = WorkflowReducer::<K>::new();
        let mut pending: Vec<_> = pending.into_iter().collect();
        while !pending.is_empty() {
            for action in effects::run_effects(std::mem::take(&mut pending)).await {
                pending.extend(reducer.reduce(state, action, env));
            }
        }
    }

    fn ready_recipe_form(form: RecipeForm) -> WorkflowState<Recipe> {
        let mut state = WorkflowState::new(());
        state.panel = Panel::Editing(EditSession {
            mode: Mode::Create,
            phase: FormPhase::Ready,
            form,
            choices: (),
            submitting: false,
            ticket: 1,
        });
        state.next_ticket = 1;
        state
    }

    #[test]
    fn menu_toggles_on_the_same_row_only() {
        ReducerTest::new(WorkflowReducer::<Recipe>::new())
            .with_env(env(MockGateway::new()))
            .given_state(WorkflowState::new(()))
            .when_actions([
                WorkflowAction::ToggleMenu(Id::from("r1")),
                WorkflowAction::ToggleMenu(Id::from("r2")),
            ])
            .then_state(|state| assert!(matches!(&state.panel, Panel::Menu { target } if *target == Id::from("r1"))))
            .run();

        ReducerTest::new(WorkflowReducer::<Recipe>::new())
            .with_env(env(MockGateway::new()))
            .given_state(WorkflowState::new(()))
            .when_actions([
                WorkflowAction::ToggleMenu(Id::from("r1")),
                WorkflowAction::ToggleMenu(Id::from("r1")),
            ])
            .then_state(|state| assert!(!state.is_open()))
            .run();
    }

    #[test]
    fn close_is_always_available() {
        ReducerTest::new(WorkflowReducer::<Recipe>::new())
            .with_env(env(MockGateway::new()))
            .given_state(WorkflowState::new(()))
            .when_actions([
                WorkflowAction::ToggleMenu(Id::from("r1")),
                WorkflowAction::ChooseDelete,
                WorkflowAction::Close,
            ])
            .then_state(|state| assert!(!state.is_open()))
            .run();
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_the_gateway() {
        let gateway = MockGateway::new();
        let env = env(gateway.clone());
        let (seen, _subscription) = record(&env.bus);
        let reducer = WorkflowReducer::<Recipe>::new();

        for form in [
            RecipeForm {
                name: String::new(),
                serves: "2".to_string(),
                image_src: String::new(),
            },
            RecipeForm {
                name: "Soup".to_string(),
                serves: "lots".to_string(),
                image_src: String::new(),
            },
        ] {
            let mut state = ready_recipe_form(form);
            let produced = reducer.reduce(&mut state, WorkflowAction::Submit, &env);
            settle(&mut state, produced, &env).await;

            assert!(matches!(&state.panel, Panel::Editing(session) if !session.submitting));
            assert_eq!(state.notice.message(), Some(FORM_INVALID));
            assert_eq!(state.notice.current().map(|n| n.level), Some(NoticeLevel::Blocking));
        }

        assert!(gateway.calls().is_empty());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn valid_create_writes_once_publishes_once_and_closes() {
        let gateway = fixtures::sample_gateway();
        let env = env(gateway.clone());
        let (seen, _subscription) = record(&env.bus);
        let reducer = WorkflowReducer::<PantryItem>::new();
        let mut state = WorkflowState::new(());

        let produced = reducer.reduce(&mut state, WorkflowAction::OpenCreate, &env);
        settle(&mut state, produced, &env).await;
        let session = state.session().unwrap();
        assert_eq!(session.phase, FormPhase::Ready);
        assert_eq!(session.choices.categories.len(), 2);

        for field in [
            PantryItemField::Name("Yoghurt".to_string()),
            PantryItemField::Category(Id::from("c1")),
            PantryItemField::Capacity("500".to_string()),
            PantryItemField::CapacityMeasure(CapacityMeasure::G),
            PantryItemField::Container(Container::Jar),
            PantryItemField::OnHand("2".to_string()),
        ] {
            let _ = reducer.reduce(&mut state, WorkflowAction::Edit(field), &env);
        }

        let first = reducer.reduce(&mut state, WorkflowAction::Submit, &env);
        let second = reducer.reduce(&mut state, WorkflowAction::Submit, &env);
        assertions::assert_no_effects(&second);
        settle(&mut state, first, &env).await;

        assert_eq!(gateway.calls_to("create_pantry_item").len(), 1);
        assert!(!state.is_open());
        assert_eq!(state.notice.message(), Some("Successfully created Yoghurt"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(matches!(&seen[0], Mutation::Created(entity) if entity.kind() == ResourceKind::PantryItem));
    }

    #[tokio::test]
    async fn edit_loads_current_values_and_publishes_update() {
        let gateway = fixtures::sample_gateway();
        let env = env(gateway.clone());
        let (seen, _subscription) = record(&env.bus);
        let reducer = WorkflowReducer::<Recipe>::new();
        let mut state = WorkflowState::new(());

        let _ = reducer.reduce(&mut state, WorkflowAction::ToggleMenu(Id::from("r2")), &env);
        let produced = reducer.reduce(&mut state, WorkflowAction::ChooseEdit, &env);
        settle(&mut state, produced, &env).await;
        assert_eq!(state.session().unwrap().form.name, "Pancakes");

        let _ = reducer.reduce(&mut state, WorkflowAction::Edit(RecipeField::Serves("6".to_string())), &env);
        let produced = reducer.reduce(&mut state, WorkflowAction::Submit, &env);
        settle(&mut state, produced, &env).await;

        assert_eq!(gateway.recipe(&Id::from("r2")).unwrap().serves, 6);
        assert_eq!(state.notice.message(), Some("Successfully updated Pancakes"));
        assert!(matches!(&seen.lock().unwrap()[..], [Mutation::Updated(_)]));
    }

    #[tokio::test]
    async fn failed_save_keeps_the_form_open() {
        let gateway = fixtures::sample_gateway();
        gateway.fail("create_recipe");
        let env = env(gateway.clone());
        let (seen, _subscription) = record(&env.bus);
        let reducer = WorkflowReducer::<Recipe>::new();
        let mut state = ready_recipe_form(RecipeForm {
            name: "Stew".to_string(),
            serves: "4".to_string(),
            image_src: String::new(),
        });

        let produced = reducer.reduce(&mut state, WorkflowAction::Submit, &env);
        settle(&mut state, produced, &env).await;

        let session = state.session().unwrap();
        assert!(!session.submitting);
        assert_eq!(session.form.name, "Stew");
        assert_eq!(state.notice.message(), Some("Failed to create recipe"));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_prepare_is_recoverable_with_reload() {
        let gateway = fixtures::sample_gateway();
        gateway.fail("list_categories");
        let env = env(gateway.clone());
        let reducer = WorkflowReducer::<PantryItem>::new();
        let mut state = WorkflowState::new(());

        let produced = reducer.reduce(&mut state, WorkflowAction::OpenCreate, &env);
        settle(&mut state, produced, &env).await;
        assert!(matches!(state.session().unwrap().phase, FormPhase::Failed(_)));
        assert_eq!(state.notice.message(), Some("Failed to retrieve Pantry Item Categories"));

        gateway.recover("list_categories");
        let produced = reducer.reduce(&mut state, WorkflowAction::Reload, &env);
        settle(&mut state, produced, &env).await;
        assert_eq!(state.session().unwrap().phase, FormPhase::Ready);
    }

    #[tokio::test]
    async fn confirmed_delete_announces_the_kind_qualified_key() {
        let gateway = fixtures::sample_gateway();
        let env = env(gateway.clone());
        let (seen, _subscription) = record(&env.bus);
        let reducer = WorkflowReducer::<PantryItem>::new();
        let mut state = WorkflowState::new(());

        let _ = reducer.reduce(&mut state, WorkflowAction::ToggleMenu(Id::from("p2")), &env);
        let _ = reducer.reduce(&mut state, WorkflowAction::ChooseDelete, &env);
        let first = reducer.reduce(&mut state, WorkflowAction::ConfirmDelete, &env);
        assert!(state.is_busy());
        assertions::assert_no_effects(&reducer.reduce(&mut state, WorkflowAction::ConfirmDelete, &env));
        settle(&mut state, first, &env).await;

        assert!(!state.is_open());
        assert!(gateway.pantry_item(&Id::from("p2")).is_none());
        assert_eq!(gateway.calls_to("delete_pantry_item").len(), 1);
        assert_eq!(state.notice.message(), Some("Successfully deleted pantry item"));
        assert!(matches!(
            &seen.lock().unwrap()[..],
            [Mutation::Deleted(key)] if *key == EntityKey::new(ResourceKind::PantryItem, Id::from("p2"))
        ));
    }

    #[test]
    fn late_save_reply_after_close_only_notifies() {
        let recipe = fixtures::recipe("r1", "Risotto", 4);
        let mut state = ready_recipe_form(RecipeForm::default());
        state.panel = Panel::Closed;

        ReducerTest::new(WorkflowReducer::<Recipe>::new())
            .with_env(env(MockGateway::new()))
            .given_state(state)
            .when_action(WorkflowAction::Saved {
                ticket: 1,
                entity: recipe,
                created: true,
            })
            .then_state(|state| {
                assert!(!state.is_open());
                assert_eq!(state.notice.message(), Some("Successfully created Risotto"));
            })
            .then_effects(assertions::assert_has_delay_effect)
            .run();
    }
}
