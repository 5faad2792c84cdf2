//! List Reconciler: one screen's local copy of a collection, kept in step
//! with bus announcements without re-fetching.
//!
//! # Rules
//!
//! - `Load` fetches the collection for the list's scope. Only the reply to
//!   the most recent `Load` is applied.
//! - `created`: appended if in scope and not already present. An entity
//!   missing embedded relations (an ingredient carrying only a pantry item
//!   id) is fetched in full first and appended when the fetch returns.
//! - `updated`: replaced in place if present. If it has left the scope it is
//!   removed. Absent ids are ignored.
//! - `deleted`: removed if present; a pending fetch for it is abandoned.
//! - Order is load order followed by creation order.
//! - Items appended before the load reply arrives survive it when the reply
//!   does not already contain them.
//!
//! Irrelevant announcements (other kinds, other scopes, unknown ids) are
//! silent no-ops.

use crate::environment::AppEnvironment;
use crate::notice::{NoticeLevel, NoticeSlot};
use crate::resource::{AppMutation, Resource};
use larder_client::{GatewayError, Id};
use larder_core::bus::Mutation;
use larder_core::effect::Effect;
use larder_core::reducer::Reducer;
use larder_core::{async_call, smallvec, SmallVec};
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Where a list is in its initial load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPhase {
    /// Waiting for the collection
    Loading,
    /// Collection loaded
    Ready,
    /// Last load failed; `Load` retries
    Failed,
}

/// Local collection of one resource kind, restricted to a scope.
#[derive(Debug, Clone)]
pub struct ListState<R: Resource> {
    /// Filter key this list is restricted to
    pub scope: R::Scope,
    /// Items in display order
    pub items: Vec<R>,
    /// Load progress
    pub phase: ListPhase,
    /// Failure notices for this list
    pub notice: NoticeSlot,
    ticket: u64,
    hydrating: HashSet<Id>,
    arrived: Vec<Id>,
}

impl<R: Resource> ListState<R> {
    /// Empty list for `scope`, not yet loading
    #[must_use]
    pub fn new(scope: R::Scope) -> Self {
        Self {
            scope,
            items: Vec::new(),
            phase: ListPhase::Loading,
            notice: NoticeSlot::default(),
            ticket: 0,
            hydrating: HashSet::new(),
            arrived: Vec::new(),
        }
    }

    /// Item with `id`, if held
    #[must_use]
    pub fn get(&self, id: &Id) -> Option<&R> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Whether the list has finished loading
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.phase == ListPhase::Ready
    }

    /// Whether a full fetch of `id` is outstanding
    #[must_use]
    pub fn is_hydrating(&self, id: &Id) -> bool {
        self.hydrating.contains(id)
    }

    fn position(&self, id: &Id) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    fn append(&mut self, item: R) {
        if self.phase != ListPhase::Ready {
            self.arrived.push(item.id().clone());
        }
        self.items.push(item);
    }

    fn apply_load(&mut self, items: Vec<R>) {
        let mut previous = std::mem::replace(&mut self.items, items);
        for id in std::mem::take(&mut self.arrived) {
            if self.position(&id).is_some() {
                continue;
            }
            if let Some(index) = previous.iter().position(|item| item.id() == &id) {
                self.items.push(previous.remove(index));
            }
        }
        self.phase = ListPhase::Ready;
    }
}

/// Inputs to a [`ListReducer`].
#[derive(Debug, Clone)]
pub enum ListAction<R: Resource> {
    /// Fetch the collection for the list's scope
    Load,
    /// Collection fetched
    Loaded {
        /// Load this reply belongs to
        ticket: u64,
        /// Collection in server order
        items: Vec<R>,
    },
    /// Collection fetch failed
    LoadFailed {
        /// Load this reply belongs to
        ticket: u64,
        /// What went wrong
        error: GatewayError,
    },
    /// Announcement from the bus
    Bus(AppMutation),
    /// Full entity fetched for a shallow announcement
    Hydrated(R),
    /// Full entity fetch failed
    HydrationFailed {
        /// Entity that could not be fetched
        id: Id,
        /// What went wrong
        error: GatewayError,
    },
    /// Notice timer expired
    DismissNotice(u64),
}

/// Reducer for [`ListState`], generic over the resource kind.
pub struct ListReducer<R> {
    _resource: PhantomData<fn() -> R>,
}

impl<R> ListReducer<R> {
    /// Create a reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _resource: PhantomData,
        }
    }
}

impl<R> Default for ListReducer<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for ListReducer<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for ListReducer<R> {}

impl<R> fmt::Debug for ListReducer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListReducer").finish()
    }
}

impl<R: Resource> ListReducer<R> {
    fn fetch_full(env: &AppEnvironment, id: Id) -> Effect<ListAction<R>> {
        let request = id.clone();
        let gateway = Arc::clone(&env.gateway);
        async_call! {
            call: R::fetch(gateway.as_ref(), &request),
            on_success: |entity| Some(ListAction::Hydrated(entity)),
            on_error: |error| Some(ListAction::HydrationFailed { id, error })
        }
    }

    fn failure(state: &mut ListState<R>, env: &AppEnvironment) -> Effect<ListAction<R>> {
        state.notice.show(
            NoticeLevel::Failure,
            format!("Failed to retrieve {}", R::KIND.plural()),
            env.notice_ttl,
            ListAction::DismissNotice,
        )
    }

    fn on_created(state: &mut ListState<R>, entity: &R, env: &AppEnvironment) -> Effect<ListAction<R>> {
        let id = entity.id();
        if !entity.in_scope(&state.scope) || state.position(id).is_some() || state.hydrating.contains(id) {
            return Effect::None;
        }

        if entity.is_complete() {
            tracing::debug!(kind = %R::KIND, %id, "Appending created entity");
            state.append(entity.clone());
            Effect::None
        } else {
            tracing::debug!(kind = %R::KIND, %id, "Fetching full entity before append");
            state.hydrating.insert(id.clone());
            Self::fetch_full(env, id.clone())
        }
    }

    fn on_updated(state: &mut ListState<R>, entity: &R, env: &AppEnvironment) -> Effect<ListAction<R>> {
        let id = entity.id();
        let Some(index) = state.position(id) else {
            return Effect::None;
        };

        if !entity.in_scope(&state.scope) {
            tracing::debug!(kind = %R::KIND, %id, "Updated entity left scope");
            state.items.remove(index);
            return Effect::None;
        }

        if entity.is_complete() {
            state.items[index] = entity.clone();
            Effect::None
        } else if state.hydrating.insert(id.clone()) {
            Self::fetch_full(env, id.clone())
        } else {
            Effect::None
        }
    }

    fn on_hydrated(state: &mut ListState<R>, entity: R) {
        if !state.hydrating.remove(entity.id()) {
            // Deleted while the fetch was in flight.
            return;
        }

        match (state.position(entity.id()), entity.in_scope(&state.scope)) {
            (Some(index), true) => state.items[index] = entity,
            (Some(index), false) => {
                state.items.remove(index);
            },
            (None, true) => state.append(entity),
            (None, false) => {},
        }
    }
}

impl<R: Resource> Reducer for ListReducer<R> {
    type State = ListState<R>;
    type Action = ListAction<R>;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut ListState<R>,
        action: ListAction<R>,
        env: &AppEnvironment,
    ) -> SmallVec<[Effect<ListAction<R>>; 4]> {
        match action {
            ListAction::Load => {
                state.ticket += 1;
                state.phase = ListPhase::Loading;
                let ticket = state.ticket;
                let scope = state.scope.clone();
                let gateway = Arc::clone(&env.gateway);
                tracing::debug!(kind = %R::KIND, ticket, "Loading list");

                smallvec![async_call! {
                    call: R::list(gateway.as_ref(), &scope),
                    on_success: |items| Some(ListAction::Loaded { ticket, items }),
                    on_error: |error| Some(ListAction::LoadFailed { ticket, error })
                }]
            },

            ListAction::Loaded { ticket, items } => {
                if ticket != state.ticket {
                    tracing::trace!(kind = %R::KIND, ticket, "Ignoring stale load");
                    return smallvec![Effect::None];
                }
                state.apply_load(items);
                smallvec![Effect::None]
            },

            ListAction::LoadFailed { ticket, error } => {
                if ticket != state.ticket {
                    return smallvec![Effect::None];
                }
                tracing::warn!(kind = %R::KIND, %error, "List load failed");
                state.phase = ListPhase::Failed;
                smallvec![Self::failure(state, env)]
            },

            ListAction::Bus(mutation) => {
                let effect = match &mutation {
                    Mutation::Created(entity) => match R::from_entity(entity) {
                        Some(entity) => Self::on_created(state, entity, env),
                        None => Effect::None,
                    },
                    Mutation::Updated(entity) => match R::from_entity(entity) {
                        Some(entity) => Self::on_updated(state, entity, env),
                        None => Effect::None,
                    },
                    Mutation::Deleted(key) => {
                        if key.kind == R::KIND {
                            state.items.retain(|item| item.id() != &key.id);
                            state.hydrating.remove(&key.id);
                        }
                        Effect::None
                    },
                };
                smallvec![effect]
            },

            ListAction::Hydrated(entity) => {
                Self::on_hydrated(state, entity);
                smallvec![Effect::None]
            },

            ListAction::HydrationFailed { id, error } => {
                if !state.hydrating.remove(&id) {
                    return smallvec![Effect::None];
                }
                tracing::warn!(kind = %R::KIND, %id, %error, "Could not fetch full entity");
                smallvec![Self::failure(state, env)]
            },

            ListAction::DismissNotice(id) => {
                state.notice.dismiss(id);
                smallvec![Effect::None]
            },
        }
    }
}
