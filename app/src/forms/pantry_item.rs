//! Pantry item form.

use super::{parse_int, parse_quantity, quantity_text, required};
use crate::error::FormError;
use crate::resource::ResourceKind;
use crate::workflow::{Editable, Mode, Prepared};
use larder_client::{
    CapacityMeasure, Category, Container, Gateway, GatewayFuture, Id, NewPantryItem, PantryItem, PantryItemUpdate,
};

/// Raw pantry item fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PantryItemForm {
    /// Display name
    pub name: String,
    /// Chosen category; only editable on create
    pub category: Option<Id>,
    /// Container size, whole number
    pub capacity: String,
    /// Unit of the capacity
    pub capacity_measure: Option<CapacityMeasure>,
    /// Kind of container
    pub container: Option<Container>,
    /// Containers on hand
    pub on_hand: String,
}

/// One pantry item field edit.
#[derive(Debug, Clone, PartialEq)]
pub enum PantryItemField {
    /// Set the name
    Name(String),
    /// Pick a category
    Category(Id),
    /// Set the capacity text
    Capacity(String),
    /// Pick a unit
    CapacityMeasure(CapacityMeasure),
    /// Pick a container
    Container(Container),
    /// Set the on-hand text
    OnHand(String),
}

/// Dropdown choices for the pantry item form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PantryItemChoices {
    /// Categories a new item can be filed under
    pub categories: Vec<Category>,
}

/// Validated pantry item request.
#[derive(Debug, Clone, PartialEq)]
pub enum PantryItemDraft {
    /// `POST api/newPantryItem/`
    Create(NewPantryItem),
    /// `PUT api/pantryItem/{id}`
    Update {
        /// Item being changed
        id: Id,
        /// New field values
        item: PantryItemUpdate,
    },
}

impl PantryItemForm {
    fn from_item(item: &PantryItem) -> Self {
        Self {
            name: item.name.clone(),
            category: Some(item.category.clone()),
            capacity: item.capacity.to_string(),
            capacity_measure: Some(item.capacity_measure),
            container: Some(item.container),
            on_hand: quantity_text(item.on_hand),
        }
    }
}

impl Editable for PantryItem {
    type Context = ();
    type Form = PantryItemForm;
    type Field = PantryItemField;
    type Choices = PantryItemChoices;
    type Draft = PantryItemDraft;

    fn prepare<'a>(gateway: &'a dyn Gateway, _: &'a (), mode: &'a Mode) -> GatewayFuture<'a, Prepared<Self>> {
        Box::pin(async move {
            match mode {
                Mode::Create => {
                    let categories = gateway.list_categories().await?;
                    Ok(Prepared {
                        form: PantryItemForm::default(),
                        choices: PantryItemChoices { categories },
                    })
                },
                Mode::Edit(id) => {
                    let item = gateway.get_pantry_item(id).await?;
                    Ok(Prepared {
                        form: PantryItemForm::from_item(&item),
                        choices: PantryItemChoices::default(),
                    })
                },
            }
        })
    }

    fn prepare_failure(mode: &Mode) -> String {
        match mode {
            Mode::Create => "Failed to retrieve Pantry Item Categories".to_string(),
            Mode::Edit(_) => format!("Failed to retrieve {}", ResourceKind::PantryItem.label()),
        }
    }

    fn apply(form: &mut PantryItemForm, field: PantryItemField) {
        match field {
            PantryItemField::Name(name) => form.name = name,
            PantryItemField::Category(category) => form.category = Some(category),
            PantryItemField::Capacity(capacity) => form.capacity = capacity,
            PantryItemField::CapacityMeasure(measure) => form.capacity_measure = Some(measure),
            PantryItemField::Container(container) => form.container = Some(container),
            PantryItemField::OnHand(on_hand) => form.on_hand = on_hand,
        }
    }

    fn validate(form: &PantryItemForm, _: &(), mode: &Mode) -> Result<PantryItemDraft, FormError> {
        let name = required(&form.name)?.to_string();
        let capacity = parse_int(&form.capacity, "capacity")?;
        let capacity_measure = form.capacity_measure.ok_or(FormError::Incomplete)?;
        let container = form.container.ok_or(FormError::Incomplete)?;
        let on_hand = parse_quantity(&form.on_hand, "on_hand")?;

        match mode {
            Mode::Create => Ok(PantryItemDraft::Create(NewPantryItem {
                name,
                capacity,
                capacity_measure,
                container,
                category: form.category.clone().ok_or(FormError::Incomplete)?,
                on_hand,
            })),
            Mode::Edit(id) => Ok(PantryItemDraft::Update {
                id: id.clone(),
                item: PantryItemUpdate {
                    name,
                    capacity,
                    capacity_measure,
                    container,
                    on_hand,
                },
            }),
        }
    }

    fn save<'a>(gateway: &'a dyn Gateway, draft: &'a PantryItemDraft) -> GatewayFuture<'a, Self> {
        match draft {
            PantryItemDraft::Create(item) => gateway.create_pantry_item(item),
            PantryItemDraft::Update { id, item } => gateway.update_pantry_item(id, item),
        }
    }

    fn delete<'a>(gateway: &'a dyn Gateway, id: &'a Id) -> GatewayFuture<'a, ()> {
        gateway.delete_pantry_item(id)
    }

    fn saved_label(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filled() -> PantryItemForm {
        PantryItemForm {
            name: " Oat milk ".to_string(),
            category: Some(Id::from("c1")),
            capacity: "1000".to_string(),
            capacity_measure: Some(CapacityMeasure::Ml),
            container: Some(Container::Bottle),
            on_hand: "1.5".to_string(),
        }
    }

    #[test]
    fn create_requires_a_category() {
        let mut form = filled();
        form.category = None;

        assert_eq!(
            PantryItem::validate(&form, &(), &Mode::Create),
            Err(FormError::Incomplete)
        );
        assert!(PantryItem::validate(&form, &(), &Mode::Edit(Id::from(4))).is_ok());
    }

    #[test]
    fn create_draft_carries_parsed_fields() {
        let draft = PantryItem::validate(&filled(), &(), &Mode::Create).unwrap();

        assert_eq!(
            draft,
            PantryItemDraft::Create(NewPantryItem {
                name: "Oat milk".to_string(),
                capacity: 1000,
                capacity_measure: CapacityMeasure::Ml,
                container: Container::Bottle,
                category: Id::from("c1"),
                on_hand: 1.5,
            })
        );
    }

    #[test]
    fn fractional_capacity_is_rejected() {
        let mut form = filled();
        PantryItem::apply(&mut form, PantryItemField::Capacity("2.5".to_string()));

        assert_eq!(
            PantryItem::validate(&form, &(), &Mode::Create),
            Err(FormError::InvalidNumber { field: "capacity" })
        );
    }

    #[test]
    fn missing_container_is_incomplete() {
        let mut form = filled();
        form.container = None;

        assert_eq!(
            PantryItem::validate(&form, &(), &Mode::Create),
            Err(FormError::Incomplete)
        );
    }
}
