//! Session Store: the login form, the current token, and its durable copy.
//!
//! The token lives in three places that move together:
//! - [`SessionState::token`], which the shell watches to decide whether
//!   authenticated screens are mounted
//! - the shared [`AuthToken`] the gateway reads on every request
//! - the durable [`TokenStore`], so the next start can skip the login form
//!
//! A failed durable write is logged and otherwise ignored: the session still
//! proceeds for the current run.

use crate::error::LoginError;
use crate::notice::{NoticeLevel, NoticeSlot};
use larder_client::{AuthToken, Credentials, Gateway};
use larder_core::effect::Effect;
use larder_core::environment::{TokenFuture, TokenStore, TokenStoreError};
use larder_core::reducer::Reducer;
use larder_core::{smallvec, SmallVec};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

/// Notice shown when the service refuses a login.
pub const LOGIN_FAILED: &str = "Login Failed - email address or password are incorrect. Please try again.";

// ASCII word characters only.
const EMAIL_PATTERN: &str =
    r"^[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*@[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*(\.[A-Za-z0-9_]{2,3})+$";

static EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).ok());

/// Whether `username` looks like an email address
#[must_use]
pub fn is_email(username: &str) -> bool {
    EMAIL.as_ref().is_some_and(|pattern| pattern.is_match(username))
}

/// Dependencies of the session reducer.
#[derive(Clone)]
pub struct SessionEnvironment {
    /// Used for `authenticate` only
    pub gateway: Arc<dyn Gateway>,
    /// Durable token storage
    pub tokens: Arc<dyn TokenStore>,
    /// Token handle shared with the gateway
    pub auth: AuthToken,
    /// Key the token is stored under
    pub token_key: String,
    /// Lifetime of the login failure notice
    pub notice_ttl: Duration,
}

impl fmt::Debug for SessionEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEnvironment")
            .field("token_key", &self.token_key)
            .field("authenticated", &self.auth.is_authenticated())
            .finish_non_exhaustive()
    }
}

/// Session state.
#[derive(Clone, Default)]
pub struct SessionState {
    /// Current token; `None` means logged out
    pub token: Option<String>,
    /// Login form: email address
    pub username: String,
    /// Login form: password
    pub password: String,
    /// A login request is waiting for the service
    pub in_flight: bool,
    /// Why the last attempt failed
    pub last_error: Option<LoginError>,
    /// Login failure notice
    pub notice: NoticeSlot,
}

impl SessionState {
    /// Whether a session is active
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// Why the login button would be disabled, if it would be
    ///
    /// # Errors
    ///
    /// Returns the [`LoginError`] a submit would fail validation with.
    pub fn check(&self) -> Result<(), LoginError> {
        self.validate().map(|_| ())
    }

    fn validate(&self) -> Result<Credentials, LoginError> {
        if self.in_flight {
            return Err(LoginError::InFlight);
        }
        if !is_email(&self.username) {
            return Err(LoginError::InvalidEmail);
        }
        if self.password.is_empty() {
            return Err(LoginError::MissingPassword);
        }
        Ok(Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        })
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("logged_in", &self.is_logged_in())
            .field("username", &self.username)
            .field("in_flight", &self.in_flight)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

/// Session input.
#[derive(Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Read the durable token at start
    Restore,
    /// Durable token read finished
    Restored(Option<String>),
    /// Login form: email typed
    SetUsername(String),
    /// Login form: password typed
    SetPassword(String),
    /// Log in with the form's credentials
    Submit,
    /// The service issued a token, already shared and persisted
    LoggedIn(String),
    /// Login did not succeed
    LoginFailed(LoginError),
    /// End the session
    Logout,
    /// Token cleared everywhere
    LoggedOut,
    /// Notice timer expired
    DismissNotice(u64),
}

impl fmt::Debug for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionAction::Restore => f.write_str("Restore"),
            SessionAction::Restored(token) => write!(f, "Restored(found: {})", token.is_some()),
            SessionAction::SetUsername(username) => f.debug_tuple("SetUsername").field(username).finish(),
            SessionAction::SetPassword(_) => f.write_str("SetPassword(<redacted>)"),
            SessionAction::Submit => f.write_str("Submit"),
            SessionAction::LoggedIn(_) => f.write_str("LoggedIn(<redacted>)"),
            SessionAction::LoginFailed(error) => f.debug_tuple("LoginFailed").field(error).finish(),
            SessionAction::Logout => f.write_str("Logout"),
            SessionAction::LoggedOut => f.write_str("LoggedOut"),
            SessionAction::DismissNotice(id) => f.debug_tuple("DismissNotice").field(id).finish(),
        }
    }
}

/// Reducer for [`SessionState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionReducer;

impl Reducer for SessionReducer {
    type State = SessionState;
    type Action = SessionAction;
    type Environment = SessionEnvironment;

    fn reduce(
        &self,
        state: &mut SessionState,
        action: SessionAction,
        env: &SessionEnvironment,
    ) -> SmallVec<[Effect<SessionAction>; 4]> {
        match action {
            SessionAction::Restore => {
                let tokens = Arc::clone(&env.tokens);
                let key = env.token_key.clone();
                smallvec![Effect::future(async move {
                    match tokens.get(&key).await {
                        Ok(token) => Some(SessionAction::Restored(token)),
                        Err(error) => {
                            tracing::warn!(%error, "Could not read stored token, starting logged out");
                            Some(SessionAction::Restored(None))
                        },
                    }
                })]
            },

            SessionAction::Restored(token) => {
                tracing::info!(found = token.is_some(), "Session restored");
                env.auth.set(token.clone());
                state.token = token;
                smallvec![Effect::None]
            },

            SessionAction::SetUsername(username) => {
                state.username = username;
                smallvec![Effect::None]
            },

            SessionAction::SetPassword(password) => {
                state.password = password;
                smallvec![Effect::None]
            },

            SessionAction::Submit => {
                let credentials = match state.validate() {
                    Ok(credentials) => credentials,
                    Err(error) => {
                        tracing::debug!(%error, "Login not attempted");
                        state.last_error = Some(error);
                        return smallvec![Effect::None];
                    },
                };

                state.in_flight = true;
                state.last_error = None;
                let gateway = Arc::clone(&env.gateway);
                let tokens = Arc::clone(&env.tokens);
                let auth = env.auth.clone();
                let key = env.token_key.clone();
                smallvec![Effect::future(async move {
                    match gateway.authenticate(&credentials).await {
                        Ok(response) => {
                            auth.set(Some(response.token.clone()));
                            if let Err(error) = tokens.set(&key, &response.token).await {
                                tracing::warn!(%error, "Could not persist token, session lasts for this run only");
                            }
                            Some(SessionAction::LoggedIn(response.token))
                        },
                        Err(error) => Some(SessionAction::LoginFailed(LoginError::Rejected(error))),
                    }
                })]
            },

            SessionAction::LoggedIn(token) => {
                tracing::info!(username = %state.username, "Logged in");
                state.in_flight = false;
                state.password.clear();
                state.token = Some(token);
                smallvec![Effect::None]
            },

            SessionAction::LoginFailed(error) => {
                state.in_flight = false;
                tracing::warn!(%error, "Login failed");
                state.last_error = Some(error);
                smallvec![state.notice.show(
                    NoticeLevel::Failure,
                    LOGIN_FAILED,
                    env.notice_ttl,
                    SessionAction::DismissNotice
                )]
            },

            SessionAction::Logout => {
                state.token = None;
                env.auth.set(None);
                let tokens = Arc::clone(&env.tokens);
                let key = env.token_key.clone();
                smallvec![Effect::future(async move {
                    if let Err(error) = tokens.delete(&key).await {
                        tracing::warn!(%error, "Could not clear stored token");
                    }
                    Some(SessionAction::LoggedOut)
                })]
            },

            SessionAction::LoggedOut => {
                tracing::info!("Logged out");
                smallvec![Effect::None]
            },

            SessionAction::DismissNotice(id) => {
                state.notice.dismiss(id);
                smallvec![Effect::None]
            },
        }
    }
}

/// [`TokenStore`] backed by a JSON object in a file.
///
/// The file is created on first write, readable by its owner only on Unix.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

impl FileTokenStore {
    /// Store at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<BTreeMap<String, String>, TokenStoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| TokenStoreError::ReadFailed(e.to_string())),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(error) => Err(TokenStoreError::ReadFailed(error.to_string())),
        }
    }

    async fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), TokenStoreError> {
        let write_failed = |e: &dyn fmt::Display| TokenStoreError::WriteFailed(e.to_string());
        let bytes = serde_json::to_vec_pretty(map).map_err(|e| write_failed(&e))?;
        tokio::fs::write(&self.path, bytes).await.map_err(|e| write_failed(&e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| write_failed(&e))?;
        }
        Ok(())
    }

    async fn update<F>(&self, change: F) -> Result<(), TokenStoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) + Send,
    {
        let _guard = self.lock.lock().await;
        let mut map = self
            .read_map()
            .await
            .map_err(|error| TokenStoreError::WriteFailed(error.to_string()))?;
        change(&mut map);
        self.write_map(&map).await
    }
}

impl TokenStore for FileTokenStore {
    fn get<'a>(&'a self, key: &'a str) -> TokenFuture<'a, Option<String>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            Ok(self.read_map().await?.remove(key))
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> TokenFuture<'a, ()> {
        Box::pin(self.update(move |map| {
            map.insert(key.to_string(), value.to_string());
        }))
    }

    fn delete<'a>(&'a self, key: &'a str) -> TokenFuture<'a, ()> {
        Box::pin(self.update(move |map| {
            map.remove(key);
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use larder_testing::{MemoryTokenStore, MockGateway, ReducerTest, effects, fixtures};

    const KEY: &str = "secure_token";

    fn env(gateway: MockGateway, tokens: MemoryTokenStore) -> SessionEnvironment {
        SessionEnvironment {
            gateway: Arc::new(gateway),
            tokens: Arc::new(tokens),
            auth: AuthToken::new(),
            token_key: KEY.to_string(),
            notice_ttl: Duration::from_millis(50),
        }
    }

    async fn drive(state: &mut SessionState, first: SessionAction, env: &SessionEnvironment) {
        let mut pending: Vec<_> = SessionReducer.reduce(state, first, env).into_vec();
        while !pending.is_empty() {
            for action in effects::run_effects(std::mem::take(&mut pending)).await {
                pending.extend(SessionReducer.reduce(state, action, env));
            }
        }
    }

    fn filled(username: &str, password: &str) -> SessionState {
        SessionState {
            username: username.to_string(),
            password: password.to_string(),
            ..SessionState::default()
        }
    }

    #[test]
    fn email_pattern() {
        assert!(is_email("cook@example.com"));
        assert!(is_email("first.last@mail.example.co"));
        assert!(!is_email("cook"));
        assert!(!is_email("cook@example"));
        assert!(!is_email(""));
    }

    #[test]
    fn email_pattern_is_ascii_only() {
        assert!(!is_email("é@example.com"));
        assert!(!is_email("cook@exämple.com"));
        assert!(!is_email("cook@example.сom"));
        assert!(is_email("cook_2@example.org"));
    }

    #[test]
    fn invalid_form_is_not_sent() {
        ReducerTest::new(SessionReducer)
            .with_env(env(MockGateway::new(), MemoryTokenStore::new()))
            .given_state(filled("not-an-email", "secret"))
            .when_action(SessionAction::Submit)
            .then_state(|state| {
                assert!(!state.in_flight);
                assert_eq!(state.last_error, Some(LoginError::InvalidEmail));
            })
            .then_effects(larder_testing::assertions::assert_no_effects)
            .run();

        ReducerTest::new(SessionReducer)
            .with_env(env(MockGateway::new(), MemoryTokenStore::new()))
            .given_state(filled(fixtures::SAMPLE_USER, ""))
            .when_action(SessionAction::Submit)
            .then_state(|state| assert_eq!(state.last_error, Some(LoginError::MissingPassword)))
            .run();
    }

    #[test]
    fn second_submit_while_in_flight_is_refused() {
        ReducerTest::new(SessionReducer)
            .with_env(env(MockGateway::new(), MemoryTokenStore::new()))
            .given_state(filled(fixtures::SAMPLE_USER, fixtures::SAMPLE_PASSWORD))
            .when_actions([SessionAction::Submit, SessionAction::Submit])
            .then_state(|state| {
                assert!(state.in_flight);
                assert_eq!(state.last_error, Some(LoginError::InFlight));
            })
            .then_effects(larder_testing::assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn successful_login_shares_and_persists_the_token() {
        let tokens = MemoryTokenStore::new();
        let env = env(fixtures::sample_gateway(), tokens.clone());
        let mut state = filled(fixtures::SAMPLE_USER, fixtures::SAMPLE_PASSWORD);

        drive(&mut state, SessionAction::Submit, &env).await;

        assert_eq!(state.token.as_deref(), Some(fixtures::SAMPLE_TOKEN));
        assert_eq!(env.auth.current().as_deref(), Some(fixtures::SAMPLE_TOKEN));
        assert_eq!(tokens.value(KEY).as_deref(), Some(fixtures::SAMPLE_TOKEN));
        assert!(state.password.is_empty());
    }

    #[tokio::test]
    async fn persist_failure_still_logs_in() {
        let tokens = MemoryTokenStore::new();
        tokens.fail_writes(true);
        let env = env(fixtures::sample_gateway(), tokens.clone());
        let mut state = filled(fixtures::SAMPLE_USER, fixtures::SAMPLE_PASSWORD);

        drive(&mut state, SessionAction::Submit, &env).await;

        assert!(state.is_logged_in());
        assert_eq!(tokens.value(KEY), None);
    }

    #[tokio::test]
    async fn unreadable_storage_restores_as_logged_out() {
        let tokens = MemoryTokenStore::with_value(KEY, "stale");
        tokens.fail_reads(true);
        let env = env(MockGateway::new(), tokens);
        let mut state = SessionState::default();

        drive(&mut state, SessionAction::Restore, &env).await;

        assert!(!state.is_logged_in());
        assert!(!env.auth.is_authenticated());
    }

    #[tokio::test]
    async fn logout_clears_memory_and_storage() {
        let tokens = MemoryTokenStore::with_value(KEY, "abc");
        let env = env(MockGateway::new(), tokens.clone());
        let mut state = SessionState::default();
        drive(&mut state, SessionAction::Restore, &env).await;
        assert!(env.auth.is_authenticated());

        drive(&mut state, SessionAction::Logout, &env).await;

        assert!(!state.is_logged_in());
        assert!(!env.auth.is_authenticated());
        assert_eq!(tokens.value(KEY), None);
    }

    #[tokio::test]
    async fn file_store_round_trips_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));

        assert_eq!(store.get(KEY).await.unwrap(), None);
        store.set(KEY, "abc").await.unwrap();
        store.set("other", "xyz").await.unwrap();
        assert_eq!(store.get(KEY).await.unwrap().as_deref(), Some("abc"));

        store.delete(KEY).await.unwrap();
        assert_eq!(store.get(KEY).await.unwrap(), None);
        assert_eq!(store.get("other").await.unwrap().as_deref(), Some("xyz"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));
        store.set(KEY, "abc").await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileTokenStore::new(path);
        assert!(matches!(store.get(KEY).await, Err(TokenStoreError::ReadFailed(_))));
    }
}
