//! Given/When/Then harness for screen reducers.
//!
//! Reducers are pure, so most screen behaviour is tested here without a
//! store or a tokio runtime. [`effects::run_effects`] resolves the futures a
//! reducer returned when a test needs the gateway replies.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use larder_core::{effect::Effect, reducer::Reducer};

type StateAssertion<S> = Box<dyn FnOnce(&S)>;

type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Builder that applies actions to a reducer and checks the outcome.
///
/// Several actions may be queued with [`ReducerTest::when_action`]; they are
/// applied in order and effect assertions see the effects of the last one.
///
/// # Example
///
/// ```ignore
/// use larder_testing::ReducerTest;
///
/// ReducerTest::new(RouterReducer)
///     .with_env(())
///     .given_state(RouterState::default())
///     .when_action(RouterAction::ToggleDrawer)
///     .when_action(RouterAction::DrawerSelect(View::Pantry))
///     .then_state(|state| {
///         assert_eq!(state.active, View::Pantry);
///         assert!(!state.drawer_open);
///     })
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Start a test for `reducer`
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Environment passed to every action
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Starting state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Queue an action to apply (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Queue several actions to apply in order (When)
    #[must_use]
    pub fn when_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Check the state after the last action (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the effects of the last action (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Apply the queued actions, then run every assertion
    ///
    /// # Panics
    ///
    /// Panics if the state, the environment or every action is missing, and
    /// whenever an assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        assert!(!self.actions.is_empty(), "At least one action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let mut effects = Vec::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Checks over the effects a reducer returned
pub mod assertions {
    use larder_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if any effect other than `Effect::None` is present.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain at least one Future effect, at any depth
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            count_futures(effects) > 0,
            "Expected at least one Future effect, but none found"
        );
    }

    /// Assert that effects contain at least one Delay effect, at any depth
    ///
    /// # Panics
    ///
    /// Panics if no Delay effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_delay_effect<A>(effects: &[Effect<A>]) {
        fn has_delay<A>(effects: &[Effect<A>]) -> bool {
            effects.iter().any(|effect| match effect {
                Effect::Delay { .. } => true,
                Effect::Parallel(inner) | Effect::Sequential(inner) => has_delay(inner),
                Effect::None | Effect::Future(_) => false,
            })
        }

        assert!(has_delay(effects), "Expected at least one Delay effect, but none found");
    }

    /// Count Future effects, looking inside Parallel and Sequential
    #[must_use]
    pub fn count_futures<A>(effects: &[Effect<A>]) -> usize {
        effects
            .iter()
            .map(|effect| match effect {
                Effect::Future(_) => 1,
                Effect::Parallel(inner) | Effect::Sequential(inner) => count_futures(inner),
                Effect::None | Effect::Delay { .. } => 0,
            })
            .sum()
    }
}

/// Run effects without a Store
///
/// Reducer tests that care about what an effect *produces* (the action a
/// gateway reply turns into) use these to drive futures to completion.
pub mod effects {
    use larder_core::effect::Effect;
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    type EffectFuture<A> = Pin<Box<dyn Future<Output = Option<A>> + Send>>;

    fn flatten<A>(effects: Vec<Effect<A>>, futures: &mut Vec<EffectFuture<A>>, delays: &mut Vec<(Duration, A)>) {
        for effect in effects {
            match effect {
                Effect::None => {},
                Effect::Parallel(inner) | Effect::Sequential(inner) => flatten(inner, futures, delays),
                Effect::Delay { duration, action } => delays.push((duration, *action)),
                Effect::Future(future) => futures.push(future),
            }
        }
    }

    /// Await every Future effect in order and collect the actions they produce
    ///
    /// Delay effects are skipped; see [`delayed_actions`].
    pub async fn run_effects<A>(effects: impl IntoIterator<Item = Effect<A>>) -> Vec<A> {
        let mut futures = Vec::new();
        let mut delays = Vec::new();
        flatten(effects.into_iter().collect(), &mut futures, &mut delays);

        let mut produced = Vec::new();
        for future in futures {
            if let Some(action) = future.await {
                produced.push(action);
            }
        }
        produced
    }

    /// Delay effects with their scheduled actions, without waiting
    #[must_use]
    pub fn delayed_actions<A>(effects: impl IntoIterator<Item = Effect<A>>) -> Vec<(Duration, A)> {
        let mut futures = Vec::new();
        let mut delays = Vec::new();
        flatten(effects.into_iter().collect(), &mut futures, &mut delays);
        delays
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use larder_core::{SmallVec, smallvec};
    use std::time::Duration;

    #[derive(Clone, Debug, Default)]
    struct TestState {
        checked: Vec<bool>,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Toggle(usize),
        Submit,
        Submitted,
        DismissNotice,
    }

    struct TestReducer;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut TestState,
            action: TestAction,
            _env: &(),
        ) -> SmallVec<[Effect<TestAction>; 4]> {
            match action {
                TestAction::Toggle(index) => {
                    if let Some(flag) = state.checked.get_mut(index) {
                        *flag = !*flag;
                    }
                    smallvec![Effect::None]
                },
                TestAction::Submit => smallvec![Effect::merge(vec![
                    Effect::future(async { Some(TestAction::Submitted) }),
                    Effect::Delay {
                        duration: Duration::from_millis(2000),
                        action: Box::new(TestAction::DismissNotice),
                    },
                ])],
                TestAction::Submitted | TestAction::DismissNotice => smallvec![Effect::None],
            }
        }
    }

    #[test]
    fn applies_actions_in_order() {
        ReducerTest::new(TestReducer)
            .with_env(())
            .given_state(TestState {
                checked: vec![false, false],
            })
            .when_action(TestAction::Toggle(0))
            .when_action(TestAction::Toggle(1))
            .when_action(TestAction::Toggle(0))
            .then_state(|state| assert_eq!(state.checked, vec![false, true]))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn effect_assertions_see_last_action() {
        ReducerTest::new(TestReducer)
            .with_env(())
            .given_state(TestState::default())
            .when_actions([TestAction::Toggle(0), TestAction::Submit])
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
                assertions::assert_has_delay_effect(effects);
                assert_eq!(assertions::count_futures(effects), 1);
            })
            .run();
    }

    #[tokio::test]
    async fn run_effects_collects_future_actions() {
        let mut state = TestState::default();
        let effects = TestReducer.reduce(&mut state, TestAction::Submit, &());

        let produced = effects::run_effects(effects).await;
        assert_eq!(produced, vec![TestAction::Submitted]);
    }

    #[test]
    fn delayed_actions_are_reported_without_waiting() {
        let mut state = TestState::default();
        let effects = TestReducer.reduce(&mut state, TestAction::Submit, &());

        let delayed = effects::delayed_actions(effects);
        assert_eq!(delayed, vec![(Duration::from_millis(2000), TestAction::DismissNotice)]);
    }
}
