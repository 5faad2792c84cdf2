//! The four authenticated screens.
//!
//! Each screen is a reducer built from a [`crate::reconciler::ListReducer`]
//! and, where the screen edits, a [`crate::workflow::WorkflowReducer`].

mod pantry;
mod recipe_detail;
mod recipes;
mod shopping_list;

pub use pantry::{PantryAction, PantryReducer, PantrySection, PantryState};
pub use recipe_detail::{RecipeDetailAction, RecipeDetailReducer, RecipeDetailState};
pub use recipes::{PlanMode, RecipesAction, RecipesReducer, RecipesState};
pub use shopping_list::{ShoppingListAction, ShoppingListReducer, ShoppingListState};
