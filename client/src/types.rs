//! Wire types for the pantry service
//!
//! Field names follow the service's JSON, which mixes camelCase with a
//! single snake_case field (`on_hand`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned identifier
///
/// The service hands out integers today, but nothing on the client depends
/// on that: ids are compared by equality and rendered verbatim into paths.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// Numeric id
    Int(i64),
    /// Textual id
    Text(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Int(value) => write!(f, "{value}"),
            Id::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Id::Int(value)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::Text(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id::Text(value)
    }
}

/// Unit a pantry item's capacity is measured in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityMeasure {
    /// Millilitres
    Ml,
    /// Grams
    G,
    /// Individual items
    Item,
}

impl CapacityMeasure {
    /// Every variant, in dropdown order
    pub const ALL: [CapacityMeasure; 3] = [CapacityMeasure::Ml, CapacityMeasure::G, CapacityMeasure::Item];

    /// Wire spelling
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CapacityMeasure::Ml => "ml",
            CapacityMeasure::G => "g",
            CapacityMeasure::Item => "item",
        }
    }

    /// Parse the wire spelling
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|measure| measure.as_str() == raw.trim())
    }
}

/// Container a pantry item is stored in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// Can
    Can,
    /// Tube
    Tube,
    /// Jar
    Jar,
    /// Pack
    Pack,
    /// Block
    Block,
    /// Bottle
    Bottle,
    /// Loose item
    Item,
}

impl Container {
    /// Every variant, in dropdown order
    pub const ALL: [Container; 7] = [
        Container::Can,
        Container::Tube,
        Container::Jar,
        Container::Pack,
        Container::Block,
        Container::Bottle,
        Container::Item,
    ];

    /// Wire spelling
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Container::Can => "can",
            Container::Tube => "tube",
            Container::Jar => "jar",
            Container::Pack => "pack",
            Container::Block => "block",
            Container::Bottle => "bottle",
            Container::Item => "item",
        }
    }

    /// Parse the wire spelling
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|container| container.as_str() == raw.trim())
    }
}

/// A stocked product in the pantry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PantryItem {
    /// Server id
    pub id: Id,
    /// Display name
    pub name: String,
    /// Owning category id
    pub category: Id,
    /// Size of one container
    pub capacity: i64,
    /// Unit of `capacity`
    pub capacity_measure: CapacityMeasure,
    /// Kind of container
    pub container: Container,
    /// Number of containers on hand
    #[serde(rename = "on_hand")]
    pub on_hand: f64,
}

/// Pantry item category, read-only on the client
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Server id
    pub id: Id,
    /// Display name
    pub name: String,
    /// Icon name
    #[serde(default)]
    pub icon: String,
}

/// A recipe
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Server id
    pub id: Id,
    /// Display name
    pub name: String,
    /// Portions the recipe makes
    pub serves: i64,
    /// Optional image URI
    #[serde(default)]
    pub image_src: Option<String>,
    /// Planned servings multiplier; client-only, never serialized
    #[serde(skip)]
    pub servings: u32,
}

/// The `pantryItem` field of an ingredient
///
/// Reads embed the full pantry item; create and update responses may carry
/// only its id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IngredientPantryItem {
    /// Embedded pantry item
    Full(PantryItem),
    /// Bare pantry item id
    Shallow(Id),
}

impl IngredientPantryItem {
    /// Id of the referenced pantry item, in either shape
    #[must_use]
    pub const fn id(&self) -> &Id {
        match self {
            IngredientPantryItem::Full(item) => &item.id,
            IngredientPantryItem::Shallow(id) => id,
        }
    }

    /// The embedded pantry item, if present
    #[must_use]
    pub const fn full(&self) -> Option<&PantryItem> {
        match self {
            IngredientPantryItem::Full(item) => Some(item),
            IngredientPantryItem::Shallow(_) => None,
        }
    }
}

/// A recipe ingredient
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    /// Server id
    pub id: Id,
    /// Owning recipe id
    pub recipe: Id,
    /// Referenced pantry item
    pub pantry_item: IngredientPantryItem,
    /// Quantity used by the recipe
    pub quantity: f64,
}

/// A pending purchase
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListItem {
    /// Server id
    pub id: Id,
    /// Embedded pantry item
    pub pantry_item: PantryItem,
    /// Quantity to buy
    pub quantity: f64,
    /// Ticked off in the list; client-side, sent only with a purchase
    #[serde(default)]
    pub is_checked: bool,
}

/// Login request body
#[derive(Clone, Serialize)]
pub struct Credentials {
    /// Account email address
    pub username: String,
    /// Account password
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login response body
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    /// Session token
    pub token: String,
}

/// Body for creating a pantry item
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPantryItem {
    /// Display name
    pub name: String,
    /// Size of one container
    pub capacity: i64,
    /// Unit of `capacity`
    pub capacity_measure: CapacityMeasure,
    /// Kind of container
    pub container: Container,
    /// Owning category id
    pub category: Id,
    /// Containers on hand
    #[serde(rename = "on_hand")]
    pub on_hand: f64,
}

/// Body for updating a pantry item; the category is fixed after creation
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PantryItemUpdate {
    /// Display name
    pub name: String,
    /// Size of one container
    pub capacity: i64,
    /// Unit of `capacity`
    pub capacity_measure: CapacityMeasure,
    /// Kind of container
    pub container: Container,
    /// Containers on hand
    #[serde(rename = "on_hand")]
    pub on_hand: f64,
}

/// Body for creating or updating a recipe
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipePayload {
    /// Display name
    pub name: String,
    /// Portions the recipe makes
    pub serves: i64,
    /// Optional image URI, sent as `null` when absent
    pub image_src: Option<String>,
}

/// Body for creating or updating an ingredient
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientPayload {
    /// Owning recipe id
    pub recipe: Id,
    /// Referenced pantry item id
    pub pantry_item: Id,
    /// Quantity used by the recipe
    pub quantity: f64,
}

/// One recipe and how many times to make it
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServingsRequest {
    /// Recipe id
    pub id: Id,
    /// Number of servings
    pub servings: u32,
}
