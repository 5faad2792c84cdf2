//! # Larder Core
//!
//! Core traits and types for the Larder pantry client.
//!
//! The client is a presentation and state-synchronization layer over a remote
//! pantry service. Every screen is modelled as a reducer over its own state,
//! and screens learn about each other's writes through a [`bus::MutationBus`]
//! instead of a shared central store.
//!
//! ## Core Concepts
//!
//! - **State**: Local, possibly stale copy of what a screen displays
//! - **Action**: Every input a screen reacts to (user intent, gateway replies, bus events)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (gateway calls, delayed notice dismissal)
//! - **Environment**: Injected dependencies (gateway, bus, token storage)
//!
//! ## Example
//!
//! ```
//! use larder_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct DrawerState {
//!     open: bool,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum DrawerAction {
//!     Toggle,
//! }
//!
//! struct DrawerReducer;
//!
//! impl Reducer for DrawerReducer {
//!     type State = DrawerState;
//!     type Action = DrawerAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut DrawerState,
//!         action: DrawerAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<DrawerAction>; 4]> {
//!         match action {
//!             DrawerAction::Toggle => state.open = !state.open,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = DrawerState::default();
//! let _ = DrawerReducer.reduce(&mut state, DrawerAction::Toggle, &());
//! assert!(state.open);
//! ```

pub use smallvec::{smallvec, SmallVec};

/// Publish/subscribe channel for create/update/delete outcomes
pub mod bus;

/// Embedding child reducers in screens
pub mod composition;

/// Declarative macros for building effects
mod effect_macros;

/// The [`Reducer`](reducer::Reducer) trait every screen, list and panel implements.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// Screen logic as a function of state, input and dependencies.
    ///
    /// A reducer never performs I/O. Gateway calls, token storage and timers
    /// are returned as [`Effect`] values for the store to run.
    pub trait Reducer {
        /// What the screen holds
        type State;

        /// Everything the screen reacts to
        type Action;

        /// Gateway, bus and settings
        type Environment;

        /// Apply `action` to `state` and describe the follow-up work.
        ///
        /// Ignored or stale input returns `Effect::None`. Most actions need at
        /// most a few effects, so they are collected inline.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Descriptions of work for the store to run on a reducer's behalf.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Deferred work returned by a reducer.
    ///
    /// Nothing runs until the store executes it. Any action an effect yields
    /// goes back through the same reducer.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// All at once
        Parallel(Vec<Effect<Action>>),

        /// One after another, each finishing before the next starts
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (notice auto-dismissal)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Delivered when the wait is over
            action: Box<Action>,
        },

        /// An async call, usually to the gateway; `Some` is fed back
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Run `effects` concurrently
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Run `effects` in order
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Wrap a future as an effect
        pub fn future<F>(future: F) -> Effect<Action>
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(future))
        }

        /// Whether this effect does nothing
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }

        /// Lift an effect producing child actions into one producing parent actions
        ///
        /// Screens embed generic reducers (a list reconciler inside the
        /// shopping list screen, say) and use this to route the child's
        /// feedback actions back through the parent's action type.
        #[must_use]
        pub fn map<Parent, F>(self, f: F) -> Effect<Parent>
        where
            Action: Send + 'static,
            Parent: Send + 'static,
            F: Fn(Action) -> Parent + Clone + Send + Sync + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Parallel(effects) => Effect::Parallel(
                    effects.into_iter().map(|effect| effect.map(f.clone())).collect(),
                ),
                Effect::Sequential(effects) => Effect::Sequential(
                    effects.into_iter().map(|effect| effect.map(f.clone())).collect(),
                ),
                Effect::Delay { duration, action } => Effect::Delay {
                    duration,
                    action: Box::new(f(*action)),
                },
                Effect::Future(future) => {
                    Effect::Future(Box::pin(async move { future.await.map(f) }))
                },
            }
        }
    }
}

/// Injected dependencies.
///
/// External dependencies that are not the remote API itself are abstracted
/// behind traits here, with production implementations in the app crate and
/// in-memory ones in the testing crate.
pub mod environment {
    use std::future::Future;
    use std::pin::Pin;
    use thiserror::Error;

    /// Errors raised by durable token storage
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum TokenStoreError {
        /// The backing storage could not be read
        #[error("Token storage read failed: {0}")]
        ReadFailed(String),

        /// The backing storage could not be written
        #[error("Token storage write failed: {0}")]
        WriteFailed(String),
    }

    /// Future returned by [`TokenStore`] operations
    pub type TokenFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TokenStoreError>> + Send + 'a>>;

    /// Durable key/value storage for the session token
    ///
    /// Only one key is ever used in practice, but the contract stays
    /// key-scoped so that platform keychains can back it directly.
    ///
    /// # Dyn Compatibility
    ///
    /// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn`
    /// so the session can hold an `Arc<dyn TokenStore>`.
    pub trait TokenStore: Send + Sync {
        /// Read the value stored under `key`, if any
        ///
        /// # Errors
        ///
        /// Returns [`TokenStoreError::ReadFailed`] if the storage cannot be read.
        fn get<'a>(&'a self, key: &'a str) -> TokenFuture<'a, Option<String>>;

        /// Store `value` under `key`, replacing any previous value
        ///
        /// # Errors
        ///
        /// Returns [`TokenStoreError::WriteFailed`] if the storage cannot be written.
        fn set<'a>(&'a self, key: &'a str, value: &'a str) -> TokenFuture<'a, ()>;

        /// Remove `key`. Removing an absent key succeeds.
        ///
        /// # Errors
        ///
        /// Returns [`TokenStoreError::WriteFailed`] if the storage cannot be written.
        fn delete<'a>(&'a self, key: &'a str) -> TokenFuture<'a, ()>;
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::effect::Effect;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Child {
        Loaded(u32),
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Parent {
        Child(Child),
    }

    #[test]
    fn map_lifts_delayed_action() {
        let effect = Effect::Delay {
            duration: Duration::from_millis(5),
            action: Box::new(Child::Loaded(1)),
        };

        match effect.map(Parent::Child) {
            Effect::Delay { action, .. } => assert_eq!(*action, Parent::Child(Child::Loaded(1))),
            other => panic!("unexpected effect: {other:?}"),
        }
    }

    #[test]
    fn map_lifts_future_output() {
        let effect = Effect::future(async { Some(Child::Loaded(7)) });

        let Effect::Future(future) = effect.map(Parent::Child) else {
            panic!("expected a future effect");
        };
        let produced = tokio_test::block_on(future);
        assert_eq!(produced, Some(Parent::Child(Child::Loaded(7))));
    }

    #[test]
    fn map_preserves_nesting() {
        let effect: Effect<Child> = Effect::merge(vec![
            Effect::None,
            Effect::chain(vec![Effect::None, Effect::None]),
        ]);

        match effect.map(Parent::Child) {
            Effect::Parallel(children) => {
                assert_eq!(children.len(), 2);
                assert!(children[0].is_none());
                assert!(matches!(&children[1], Effect::Sequential(inner) if inner.len() == 2));
            },
            other => panic!("unexpected effect: {other:?}"),
        }
    }
}
