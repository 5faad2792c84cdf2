//! Recipe form.

use super::{parse_int, required};
use crate::error::FormError;
use crate::workflow::{Editable, Mode, Prepared};
use larder_client::{Gateway, GatewayFuture, Id, Recipe, RecipePayload};

/// Raw recipe fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeForm {
    /// Display name
    pub name: String,
    /// Portions, whole number
    pub serves: String,
    /// Blank means no image
    pub image_src: String,
}

/// One recipe field edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeField {
    /// Set the name
    Name(String),
    /// Set the portions text
    Serves(String),
    /// Set the image URI
    ImageSrc(String),
}

/// Validated recipe request; `id` is set when updating.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    /// Recipe being changed
    pub id: Option<Id>,
    /// Request body
    pub payload: RecipePayload,
}

impl Editable for Recipe {
    type Context = ();
    type Form = RecipeForm;
    type Field = RecipeField;
    type Choices = ();
    type Draft = RecipeDraft;

    fn prepare<'a>(gateway: &'a dyn Gateway, _: &'a (), mode: &'a Mode) -> GatewayFuture<'a, Prepared<Self>> {
        Box::pin(async move {
            let form = match mode {
                Mode::Create => RecipeForm::default(),
                Mode::Edit(id) => {
                    let recipe = gateway.get_recipe(id).await?;
                    RecipeForm {
                        name: recipe.name,
                        serves: recipe.serves.to_string(),
                        image_src: recipe.image_src.unwrap_or_default(),
                    }
                },
            };
            Ok(Prepared { form, choices: () })
        })
    }

    fn prepare_failure(_mode: &Mode) -> String {
        "Failed to retrieve recipe".to_string()
    }

    fn apply(form: &mut RecipeForm, field: RecipeField) {
        match field {
            RecipeField::Name(name) => form.name = name,
            RecipeField::Serves(serves) => form.serves = serves,
            RecipeField::ImageSrc(image_src) => form.image_src = image_src,
        }
    }

    fn validate(form: &RecipeForm, _: &(), mode: &Mode) -> Result<RecipeDraft, FormError> {
        let name = required(&form.name)?.to_string();
        let serves = parse_int(&form.serves, "serves")?;
        if serves <= 0 {
            return Err(FormError::InvalidNumber { field: "serves" });
        }
        let image_src = Some(form.image_src.trim())
            .filter(|src| !src.is_empty())
            .map(str::to_string);

        Ok(RecipeDraft {
            id: mode.existing().cloned(),
            payload: RecipePayload { name, serves, image_src },
        })
    }

    fn save<'a>(gateway: &'a dyn Gateway, draft: &'a RecipeDraft) -> GatewayFuture<'a, Self> {
        match &draft.id {
            None => gateway.create_recipe(&draft.payload),
            Some(id) => gateway.update_recipe(id, &draft.payload),
        }
    }

    fn delete<'a>(gateway: &'a dyn Gateway, id: &'a Id) -> GatewayFuture<'a, ()> {
        gateway.delete_recipe(id)
    }

    fn saved_label(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, serves: &str, image_src: &str) -> RecipeForm {
        RecipeForm {
            name: name.to_string(),
            serves: serves.to_string(),
            image_src: image_src.to_string(),
        }
    }

    #[test]
    fn blank_image_is_sent_as_null() {
        let draft = Recipe::validate(&form("Soup", "4", "  "), &(), &Mode::Create).unwrap();

        assert_eq!(draft.id, None);
        assert_eq!(draft.payload.image_src, None);
        assert_eq!(draft.payload.serves, 4);
    }

    #[test]
    fn edit_draft_targets_the_recipe() {
        let draft = Recipe::validate(&form("Soup", "2", "soup.png"), &(), &Mode::Edit(Id::from(9))).unwrap();

        assert_eq!(draft.id, Some(Id::from(9)));
        assert_eq!(draft.payload.image_src.as_deref(), Some("soup.png"));
    }

    #[test]
    fn serves_must_be_a_positive_whole_number() {
        for serves in ["0", "-2", "two", "1.5"] {
            assert_eq!(
                Recipe::validate(&form("Soup", serves, ""), &(), &Mode::Create),
                Err(FormError::InvalidNumber { field: "serves" }),
                "serves = {serves}"
            );
        }
        assert_eq!(
            Recipe::validate(&form("", "2", ""), &(), &Mode::Create),
            Err(FormError::Incomplete)
        );
    }
}
