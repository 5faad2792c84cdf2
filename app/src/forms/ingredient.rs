//! Ingredient form, opened within one recipe.

use super::{parse_quantity, quantity_text};
use crate::error::FormError;
use crate::workflow::{Editable, Mode, Prepared};
use larder_client::{Gateway, GatewayFuture, Id, Ingredient, IngredientPayload, PantryItem};

/// Raw ingredient fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientForm {
    /// Chosen pantry item
    pub pantry_item: Option<Id>,
    /// Quantity text
    pub quantity: String,
}

/// One ingredient field edit.
#[derive(Debug, Clone, PartialEq)]
pub enum IngredientField {
    /// Pick a pantry item
    PantryItem(Id),
    /// Set the quantity text
    Quantity(String),
}

/// Pantry items an ingredient may refer to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientChoices {
    /// Flat pantry list
    pub pantry_items: Vec<PantryItem>,
}

/// Validated ingredient request.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientDraft {
    /// Set when updating
    pub id: Option<Id>,
    /// Request body
    pub payload: IngredientPayload,
}

impl Editable for Ingredient {
    /// Owning recipe
    type Context = Id;
    type Form = IngredientForm;
    type Field = IngredientField;
    type Choices = IngredientChoices;
    type Draft = IngredientDraft;

    fn prepare<'a>(gateway: &'a dyn Gateway, _recipe: &'a Id, mode: &'a Mode) -> GatewayFuture<'a, Prepared<Self>> {
        Box::pin(async move {
            match mode {
                Mode::Create => {
                    let pantry_items = gateway.list_pantry_items().await?;
                    Ok(Prepared {
                        form: IngredientForm::default(),
                        choices: IngredientChoices { pantry_items },
                    })
                },
                Mode::Edit(id) => {
                    let (ingredient, pantry_items) =
                        futures::try_join!(gateway.get_ingredient(id), gateway.list_pantry_items())?;
                    Ok(Prepared {
                        form: IngredientForm {
                            pantry_item: Some(ingredient.pantry_item.id().clone()),
                            quantity: quantity_text(ingredient.quantity),
                        },
                        choices: IngredientChoices { pantry_items },
                    })
                },
            }
        })
    }

    fn apply(form: &mut IngredientForm, field: IngredientField) {
        match field {
            IngredientField::PantryItem(id) => form.pantry_item = Some(id),
            IngredientField::Quantity(quantity) => form.quantity = quantity,
        }
    }

    fn validate(form: &IngredientForm, recipe: &Id, mode: &Mode) -> Result<IngredientDraft, FormError> {
        let pantry_item = form.pantry_item.clone().ok_or(FormError::Incomplete)?;
        let quantity = parse_quantity(&form.quantity, "quantity")?;

        Ok(IngredientDraft {
            id: mode.existing().cloned(),
            payload: IngredientPayload {
                recipe: recipe.clone(),
                pantry_item,
                quantity,
            },
        })
    }

    fn save<'a>(gateway: &'a dyn Gateway, draft: &'a IngredientDraft) -> GatewayFuture<'a, Self> {
        match &draft.id {
            None => gateway.create_ingredient(&draft.payload),
            Some(id) => gateway.update_ingredient(id, &draft.payload),
        }
    }

    fn delete<'a>(gateway: &'a dyn Gateway, id: &'a Id) -> GatewayFuture<'a, ()> {
        gateway.delete_ingredient(id)
    }

    fn saved_label(&self) -> String {
        "ingredient".to_string()
    }
}
