//! Declarative macros for building effects
//!
//! Most reducers in the client issue a single gateway call and map its
//! outcome to one of two actions. [`async_call!`] captures that shape.

/// Create an `Effect::Future` that awaits a fallible call and maps both outcomes
///
/// The call expression is evaluated inside the future, so anything it borrows
/// must be moved in beforehand (typically a cloned `Arc<dyn Gateway>`).
///
/// # Example
///
/// ```rust,ignore
/// use larder_core::async_call;
///
/// let gateway = Arc::clone(&env.gateway);
/// async_call! {
///     call: gateway.list_recipes(),
///     on_success: |recipes| Some(RecipesAction::Loaded { ticket, recipes }),
///     on_error: |error| Some(RecipesAction::LoadFailed { ticket, error })
/// }
/// ```
#[macro_export]
macro_rules! async_call {
    (
        call: $call:expr,
        on_success: |$success_param:ident| $success_body:expr,
        on_error: |$error_param:ident| $error_body:expr
    ) => {
        $crate::effect::Effect::Future(::std::boxed::Box::pin(async move {
            match $call.await {
                ::std::result::Result::Ok($success_param) => $success_body,
                ::std::result::Result::Err($error_param) => $error_body,
            }
        }))
    };
}

/// Create an `Effect::Delay` for scheduling a follow-up action
///
/// # Example
///
/// ```rust,ignore
/// use larder_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(2),
///     action: PantryAction::DismissNotice { id }
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::Effect;
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Fetched(u32),
        FetchFailed(String),
        NoticeExpired,
    }

    async fn fetch(ok: bool) -> Result<u32, String> {
        if ok { Ok(3) } else { Err("offline".to_string()) }
    }

    #[test]
    fn async_call_maps_success() {
        let effect: Effect<TestAction> = async_call! {
            call: fetch(true),
            on_success: |count| Some(TestAction::Fetched(count)),
            on_error: |error| Some(TestAction::FetchFailed(error))
        };

        let Effect::Future(future) = effect else {
            panic!("expected future effect");
        };
        assert_eq!(tokio_test::block_on(future), Some(TestAction::Fetched(3)));
    }

    #[test]
    fn async_call_maps_error() {
        let effect: Effect<TestAction> = async_call! {
            call: fetch(false),
            on_success: |count| Some(TestAction::Fetched(count)),
            on_error: |error| Some(TestAction::FetchFailed(error))
        };

        let Effect::Future(future) = effect else {
            panic!("expected future effect");
        };
        assert_eq!(
            tokio_test::block_on(future),
            Some(TestAction::FetchFailed("offline".to_string()))
        );
    }

    #[test]
    fn delay_boxes_action() {
        let effect = delay! {
            duration: Duration::from_millis(2000),
            action: TestAction::NoticeExpired
        };

        match effect {
            Effect::Delay { duration, action } => {
                assert_eq!(duration, Duration::from_millis(2000));
                assert_eq!(*action, TestAction::NoticeExpired);
            },
            other => panic!("unexpected effect: {other:?}"),
        }
    }
}
