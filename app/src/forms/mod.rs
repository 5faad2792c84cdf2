//! Edit forms for each editable resource kind.
//!
//! Every form keeps raw text while the user types and parses at submit
//! time. An empty required field and an unparseable number are both
//! rejected before any gateway call.

mod ingredient;
mod pantry_item;
mod recipe;

pub use ingredient::{IngredientChoices, IngredientDraft, IngredientField, IngredientForm};
pub use pantry_item::{PantryItemChoices, PantryItemDraft, PantryItemField, PantryItemForm};
pub use recipe::{RecipeDraft, RecipeField, RecipeForm};

use crate::error::FormError;

/// Trimmed value of a required text field.
fn required(raw: &str) -> Result<&str, FormError> {
    let value = raw.trim();
    if value.is_empty() { Err(FormError::Incomplete) } else { Ok(value) }
}

/// Required whole number.
fn parse_int(raw: &str, field: &'static str) -> Result<i64, FormError> {
    required(raw)?
        .parse()
        .map_err(|_| FormError::InvalidNumber { field })
}

/// Required non-negative decimal.
fn parse_quantity(raw: &str, field: &'static str) -> Result<f64, FormError> {
    let value: f64 = required(raw)?
        .parse()
        .map_err(|_| FormError::InvalidNumber { field })?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(FormError::InvalidNumber { field })
    }
}

/// Render a stored quantity back into a text field.
fn quantity_text(value: f64) -> String {
    format!("{value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_parse_after_trimming() {
        assert_eq!(parse_int(" 12 ", "capacity"), Ok(12));
        assert_eq!(parse_quantity("0.5", "quantity"), Ok(0.5));
        assert_eq!(quantity_text(2.0), "2");
    }

    #[test]
    fn empty_is_incomplete_and_garbage_is_invalid() {
        assert_eq!(parse_int("   ", "capacity"), Err(FormError::Incomplete));
        assert_eq!(
            parse_int("1.5", "capacity"),
            Err(FormError::InvalidNumber { field: "capacity" })
        );
        assert_eq!(
            parse_quantity("-1", "on_hand"),
            Err(FormError::InvalidNumber { field: "on_hand" })
        );
        assert_eq!(
            parse_quantity("NaN", "on_hand"),
            Err(FormError::InvalidNumber { field: "on_hand" })
        );
    }
}
