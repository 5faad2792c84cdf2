//! Screen Router: which view is active and whether the drawer is open.
//!
//! Navigation is unconditional. Leaving a screen with an open edit form
//! discards the form.

use larder_core::effect::Effect;
use larder_core::reducer::Reducer;
use larder_core::{smallvec, SmallVec};
use std::fmt;

/// Top-level views, numbered as the navigation menus address them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum View {
    /// Main menu
    #[default]
    Home = 0,
    /// Pantry by category
    Pantry = 1,
    /// Recipes
    Recipes = 2,
    /// Recipes in shopping-list planning mode
    Planner = 3,
    /// Shopping list
    ShoppingList = 4,
}

impl View {
    /// Destinations offered by the home menu
    pub const HOME_MENU: [View; 4] = [View::Pantry, View::Recipes, View::Planner, View::ShoppingList];

    /// Destinations offered by the drawer
    pub const DRAWER: [View; 3] = [View::Pantry, View::Recipes, View::ShoppingList];

    /// Heading shown for the view
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            View::Home => "Home",
            View::Pantry => "My Pantry",
            View::Recipes => "My Recipes",
            View::Planner => "My Planner",
            View::ShoppingList => "My Shopping List",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A view code outside `0..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Unknown view code {0}")]
pub struct UnknownView(pub u8);

impl TryFrom<u8> for View {
    type Error = UnknownView;

    fn try_from(code: u8) -> Result<Self, UnknownView> {
        match code {
            0 => Ok(View::Home),
            1 => Ok(View::Pantry),
            2 => Ok(View::Recipes),
            3 => Ok(View::Planner),
            4 => Ok(View::ShoppingList),
            other => Err(UnknownView(other)),
        }
    }
}

/// Router state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterState {
    /// Active view
    pub active: View,
    /// Navigation drawer visibility
    pub drawer_open: bool,
}

/// Router input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterAction {
    /// Switch views
    Navigate(View),
    /// Open or close the drawer
    ToggleDrawer,
    /// Pick a drawer entry: navigate and close the drawer
    DrawerSelect(View),
    /// Back to Home with the drawer closed
    Reset,
}

/// Reducer for [`RouterState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterReducer;

impl Reducer for RouterReducer {
    type State = RouterState;
    type Action = RouterAction;
    type Environment = ();

    fn reduce(&self, state: &mut RouterState, action: RouterAction, _env: &()) -> SmallVec<[Effect<RouterAction>; 4]> {
        match action {
            RouterAction::Navigate(view) => state.active = view,
            RouterAction::ToggleDrawer => state.drawer_open = !state.drawer_open,
            RouterAction::DrawerSelect(view) => {
                state.active = view;
                state.drawer_open = false;
            },
            RouterAction::Reset => *state = RouterState::default(),
        }
        tracing::debug!(view = %state.active, drawer_open = state.drawer_open, "Router");
        smallvec![Effect::None]
    }
}
