//! The application shell.
//!
//! [`App`] owns the session, the router, and whichever screens are mounted.
//! Authenticated screens exist only while the session holds a token; the
//! active view decides which one is mounted. Logging out unmounts every
//! screen before the token is cleared.

use crate::config::AppConfig;
use crate::environment::AppEnvironment;
use crate::error::{AppError, LoginError, Result};
use crate::mount::Mounted;
use crate::resource::AppBus;
use crate::router::{RouterAction, RouterReducer, RouterState, View};
use crate::screens::{
    PantryReducer, PantryState, PlanMode, RecipeDetailReducer, RecipeDetailState, RecipesReducer, RecipesState,
    ShoppingListReducer, ShoppingListState,
};
use crate::session::{FileTokenStore, SessionAction, SessionEnvironment, SessionReducer, SessionState};
use larder_client::{AuthToken, Gateway, HttpGateway, Id};
use larder_core::environment::TokenStore;
use larder_core::reducer::Reducer;
use larder_runtime::Store;
use std::sync::Arc;
use std::time::Duration;

type SessionStore = Store<SessionState, SessionAction, SessionEnvironment, SessionReducer>;

/// The screen mounted for the active view.
#[derive(Debug)]
pub enum ActiveScreen {
    /// Pantry
    Pantry(Mounted<PantryReducer>),
    /// Recipes or planner
    Recipes(Mounted<RecipesReducer>),
    /// Shopping list
    ShoppingList(Mounted<ShoppingListReducer>),
}

/// Session, router, and mounted screens.
pub struct App {
    env: AppEnvironment,
    session: SessionStore,
    router: RouterState,
    screen: Option<ActiveScreen>,
    detail: Option<Mounted<RecipeDetailReducer>>,
    wait: Duration,
}

impl App {
    /// Wire an app from its collaborators.
    ///
    /// `auth` must be the handle `gateway` reads its token from.
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>, auth: AuthToken, tokens: Arc<dyn TokenStore>, config: &AppConfig) -> Self {
        let env = AppEnvironment::new(Arc::clone(&gateway), AppBus::new(), config.ui.notice_ttl());
        let session = Store::new(
            SessionState::default(),
            SessionReducer,
            SessionEnvironment {
                gateway,
                tokens,
                auth,
                token_key: config.storage.token_key.clone(),
                notice_ttl: config.ui.notice_ttl(),
            },
        );

        Self {
            env,
            session,
            router: RouterState::default(),
            screen: None,
            detail: None,
            wait: config.api.timeout() + Duration::from_secs(1),
        }
    }

    /// Production wiring: HTTP gateway and file-backed token storage.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Gateway`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let auth = AuthToken::new();
        let gateway = HttpGateway::new(&config.api, auth.clone())?;
        let tokens = FileTokenStore::new(config.storage.token_path.clone());
        Ok(Self::new(Arc::new(gateway), auth, Arc::new(tokens), config))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Session
    // ═══════════════════════════════════════════════════════════════════

    /// Pick up a token stored by a previous run. Returns whether one was found.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the session store does not answer in time.
    pub async fn restore(&mut self) -> Result<bool> {
        self.session
            .send_and_wait_for(
                SessionAction::Restore,
                |action| matches!(action, SessionAction::Restored(_)),
                self.wait,
            )
            .await?;
        let logged_in = self.is_logged_in().await;
        if logged_in {
            self.remount().await?;
        }
        Ok(logged_in)
    }

    /// Log in with an email address and password.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Login`] if the form is invalid or the service
    /// refuses the credentials; the authenticated view is not shown.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.session.send(SessionAction::SetUsername(username.to_string())).await?;
        self.session.send(SessionAction::SetPassword(password.to_string())).await?;
        self.session.state(SessionState::check).await?;

        let outcome = self
            .session
            .send_and_wait_for(
                SessionAction::Submit,
                |action| matches!(action, SessionAction::LoggedIn(_) | SessionAction::LoginFailed(_)),
                self.wait,
            )
            .await?;

        match outcome {
            SessionAction::LoggedIn(_) => {
                self.router = RouterState::default();
                self.remount().await
            },
            SessionAction::LoginFailed(error) => Err(AppError::Login(error)),
            _ => Err(AppError::Login(LoginError::InFlight)),
        }
    }

    /// End the session: unmount every screen, then clear the token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the session store does not answer in time.
    pub async fn logout(&mut self) -> Result<()> {
        self.detail = None;
        self.screen = None;
        let _ = RouterReducer.reduce(&mut self.router, RouterAction::Reset, &());
        self.session
            .send_and_wait_for(
                SessionAction::Logout,
                |action| matches!(action, SessionAction::LoggedOut),
                self.wait,
            )
            .await?;
        Ok(())
    }

    /// Whether a session is active
    pub async fn is_logged_in(&self) -> bool {
        self.session.state(SessionState::is_logged_in).await
    }

    /// The session store, for the login form
    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    // ═══════════════════════════════════════════════════════════════════
    // Navigation
    // ═══════════════════════════════════════════════════════════════════

    /// Apply a router action and remount if the view changed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::LoggedOut`] if there is no session.
    pub async fn route(&mut self, action: RouterAction) -> Result<()> {
        if !self.is_logged_in().await {
            return Err(AppError::LoggedOut);
        }
        let before = self.router.active;
        let _ = RouterReducer.reduce(&mut self.router, action, &());
        if self.router.active != before {
            self.remount().await?;
        }
        Ok(())
    }

    /// Switch to `view`
    ///
    /// # Errors
    ///
    /// See [`App::route`].
    pub async fn navigate(&mut self, view: View) -> Result<()> {
        self.route(RouterAction::Navigate(view)).await
    }

    /// Router state
    #[must_use]
    pub const fn router(&self) -> RouterState {
        self.router
    }

    /// Open a recipe's detail over the recipes screen.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::LoggedOut`] if there is no session.
    pub async fn open_recipe(&mut self, id: Id) -> Result<()> {
        if !self.is_logged_in().await {
            return Err(AppError::LoggedOut);
        }
        self.detail = None;
        let detail = Mounted::mount(RecipeDetailReducer, RecipeDetailState::new(id), self.env.clone()).await?;
        self.detail = Some(detail);
        Ok(())
    }

    /// Close the recipe detail
    pub fn close_recipe(&mut self) {
        self.detail = None;
    }

    async fn remount(&mut self) -> Result<()> {
        self.detail = None;
        self.screen = None;
        let env = self.env.clone();
        self.screen = match self.router.active {
            View::Home => None,
            View::Pantry => Some(ActiveScreen::Pantry(
                Mounted::mount(PantryReducer, PantryState::default(), env).await?,
            )),
            View::Recipes => Some(ActiveScreen::Recipes(
                Mounted::mount(RecipesReducer, RecipesState::new(PlanMode::Browsing), env).await?,
            )),
            View::Planner => Some(ActiveScreen::Recipes(
                Mounted::mount(RecipesReducer, RecipesState::new(PlanMode::GeneratingList), env).await?,
            )),
            View::ShoppingList => Some(ActiveScreen::ShoppingList(
                Mounted::mount(ShoppingListReducer, ShoppingListState::default(), env).await?,
            )),
        };
        tracing::info!(view = %self.router.active, "View mounted");
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Mounted screens
    // ═══════════════════════════════════════════════════════════════════

    /// The mounted screen, if the active view has one
    #[must_use]
    pub const fn screen(&self) -> Option<&ActiveScreen> {
        self.screen.as_ref()
    }

    /// The pantry screen, if mounted
    #[must_use]
    pub const fn pantry(&self) -> Option<&Mounted<PantryReducer>> {
        match &self.screen {
            Some(ActiveScreen::Pantry(screen)) => Some(screen),
            _ => None,
        }
    }

    /// The recipes screen, if mounted
    #[must_use]
    pub const fn recipes(&self) -> Option<&Mounted<RecipesReducer>> {
        match &self.screen {
            Some(ActiveScreen::Recipes(screen)) => Some(screen),
            _ => None,
        }
    }

    /// The shopping list screen, if mounted
    #[must_use]
    pub const fn shopping_list(&self) -> Option<&Mounted<ShoppingListReducer>> {
        match &self.screen {
            Some(ActiveScreen::ShoppingList(screen)) => Some(screen),
            _ => None,
        }
    }

    /// The recipe detail, if open
    #[must_use]
    pub const fn recipe_detail(&self) -> Option<&Mounted<RecipeDetailReducer>> {
        self.detail.as_ref()
    }

    /// The shared mutation bus
    #[must_use]
    pub const fn bus(&self) -> &AppBus {
        &self.env.bus
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("router", &self.router)
            .field("screen", &self.screen)
            .field("detail", &self.detail)
            .finish_non_exhaustive()
    }
}
