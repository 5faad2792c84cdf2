//! Embedding child reducers in a parent screen.
//!
//! A screen owns the state of the generic reducers it is built from (a list
//! reconciler, an edit workflow) and wraps their actions in its own action
//! enum. [`scope`] runs a child on its slice of state and lifts the effects
//! it returns so their feedback actions come back wrapped.
//!
//! ```
//! use larder_core::composition::scope;
//! use larder_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug)]
//! enum Counter {
//!     Bump,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum Screen {
//!     Counter(Counter),
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = u32;
//!     type Action = Counter;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut u32, _action: Counter, _env: &()) -> SmallVec<[Effect<Counter>; 4]> {
//!         *state += 1;
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut count = 0;
//! let effects = scope(&CounterReducer, &mut count, Counter::Bump, &(), Screen::Counter);
//! assert_eq!(count, 1);
//! assert!(effects.iter().all(Effect::is_none));
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// Lift child effects into the parent's action type.
#[must_use]
pub fn lift<C, P, F>(effects: SmallVec<[Effect<C>; 4]>, embed: F) -> SmallVec<[Effect<P>; 4]>
where
    C: Send + 'static,
    P: Send + 'static,
    F: Fn(C) -> P + Clone + Send + Sync + 'static,
{
    effects.into_iter().map(|effect| effect.map(embed.clone())).collect()
}

/// Run `reducer` on a slice of the parent's state and lift its effects.
pub fn scope<R, P, F>(
    reducer: &R,
    state: &mut R::State,
    action: R::Action,
    env: &R::Environment,
    embed: F,
) -> SmallVec<[Effect<P>; 4]>
where
    R: Reducer,
    R::Action: Send + 'static,
    P: Send + 'static,
    F: Fn(R::Action) -> P + Clone + Send + Sync + 'static,
{
    lift(reducer.reduce(state, action, env), embed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smallvec;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Child {
        Dismiss(u64),
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Parent {
        Child(Child),
    }

    #[test]
    fn lift_wraps_every_effect() {
        let effects: SmallVec<[Effect<Child>; 4]> = smallvec![
            Effect::None,
            Effect::Delay {
                duration: Duration::from_millis(1),
                action: Box::new(Child::Dismiss(3)),
            },
        ];

        let lifted = lift(effects, Parent::Child);

        assert_eq!(lifted.len(), 2);
        assert!(matches!(
            &lifted[1],
            Effect::Delay { action, .. } if **action == Parent::Child(Child::Dismiss(3))
        ));
    }
}
