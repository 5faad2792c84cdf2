//! Resource kinds, the bus payloads, and the per-kind gateway bindings.

use larder_client::{
    Gateway, GatewayError, GatewayFuture, Id, Ingredient, PantryItem, Recipe, ShoppingListItem,
};
use larder_core::bus::{Mutation, MutationBus};
use std::fmt;

/// The four kinds of list-held entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// [`PantryItem`]
    PantryItem,
    /// [`Recipe`]
    Recipe,
    /// [`Ingredient`]
    Ingredient,
    /// [`ShoppingListItem`]
    ShoppingListItem,
}

impl ResourceKind {
    /// Lower-case singular, as used in notices
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ResourceKind::PantryItem => "pantry item",
            ResourceKind::Recipe => "recipe",
            ResourceKind::Ingredient => "ingredient",
            ResourceKind::ShoppingListItem => "shopping list item",
        }
    }

    /// Title-case plural, as used in "Failed to retrieve ..." notices
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            ResourceKind::PantryItem => "Pantry Items",
            ResourceKind::Recipe => "Recipes",
            ResourceKind::Ingredient => "Ingredients",
            ResourceKind::ShoppingListItem => "Shopping List Items",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An entity announced as created or updated.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    /// Pantry item
    PantryItem(PantryItem),
    /// Recipe
    Recipe(Recipe),
    /// Ingredient, possibly with a bare pantry item id
    Ingredient(Ingredient),
    /// Shopping list entry
    ShoppingListItem(ShoppingListItem),
}

impl Entity {
    /// Kind of the wrapped entity
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Entity::PantryItem(_) => ResourceKind::PantryItem,
            Entity::Recipe(_) => ResourceKind::Recipe,
            Entity::Ingredient(_) => ResourceKind::Ingredient,
            Entity::ShoppingListItem(_) => ResourceKind::ShoppingListItem,
        }
    }

    /// Server id of the wrapped entity
    #[must_use]
    pub const fn id(&self) -> &Id {
        match self {
            Entity::PantryItem(item) => &item.id,
            Entity::Recipe(recipe) => &recipe.id,
            Entity::Ingredient(ingredient) => &ingredient.id,
            Entity::ShoppingListItem(item) => &item.id,
        }
    }

    /// Key identifying the wrapped entity
    #[must_use]
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.kind(), self.id().clone())
    }
}

/// Kind-qualified id, carried by `deleted` announcements.
///
/// Ids are only unique within a kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    /// Kind of the deleted entity
    pub kind: ResourceKind,
    /// Its server id
    pub id: Id,
}

impl EntityKey {
    /// Key for `id` of `kind`
    #[must_use]
    pub const fn new(kind: ResourceKind, id: Id) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// The application's mutation bus.
pub type AppBus = MutationBus<Entity, EntityKey>;

/// One announcement on [`AppBus`].
pub type AppMutation = Mutation<Entity, EntityKey>;

/// A list-held entity kind and how to fetch it.
///
/// `Scope` is the filter key a list is restricted to: the category for
/// pantry items, the recipe for ingredients, `()` for global lists.
pub trait Resource: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Filter key for lists of this kind
    type Scope: Clone + fmt::Debug + PartialEq + Send + Sync + 'static;

    /// Kind tag
    const KIND: ResourceKind;

    /// Server id
    fn id(&self) -> &Id;

    /// Whether this entity belongs in a list scoped to `scope`
    fn in_scope(&self, scope: &Self::Scope) -> bool;

    /// Whether every embedded relation the list renders is present
    fn is_complete(&self) -> bool {
        true
    }

    /// Borrow the entity out of a bus payload of the matching kind
    fn from_entity(entity: &Entity) -> Option<&Self>;

    /// Wrap for publishing on the bus
    fn into_entity(self) -> Entity;

    /// Fetch the collection for `scope`
    fn list<'a>(gateway: &'a dyn Gateway, scope: &'a Self::Scope) -> GatewayFuture<'a, Vec<Self>>;

    /// Fetch one entity by id, with its embedded relations
    fn fetch<'a>(gateway: &'a dyn Gateway, id: &'a Id) -> GatewayFuture<'a, Self>;

    /// Key for this entity
    fn key(&self) -> EntityKey {
        EntityKey::new(Self::KIND, self.id().clone())
    }
}

impl Resource for PantryItem {
    type Scope = Id;

    const KIND: ResourceKind = ResourceKind::PantryItem;

    fn id(&self) -> &Id {
        &self.id
    }

    fn in_scope(&self, category: &Id) -> bool {
        &self.category == category
    }

    fn from_entity(entity: &Entity) -> Option<&Self> {
        match entity {
            Entity::PantryItem(item) => Some(item),
            _ => None,
        }
    }

    fn into_entity(self) -> Entity {
        Entity::PantryItem(self)
    }

    fn list<'a>(gateway: &'a dyn Gateway, category: &'a Id) -> GatewayFuture<'a, Vec<Self>> {
        gateway.list_pantry_items_by_category(category)
    }

    fn fetch<'a>(gateway: &'a dyn Gateway, id: &'a Id) -> GatewayFuture<'a, Self> {
        gateway.get_pantry_item(id)
    }
}

impl Resource for Recipe {
    type Scope = ();

    const KIND: ResourceKind = ResourceKind::Recipe;

    fn id(&self) -> &Id {
        &self.id
    }

    fn in_scope(&self, _: &()) -> bool {
        true
    }

    fn from_entity(entity: &Entity) -> Option<&Self> {
        match entity {
            Entity::Recipe(recipe) => Some(recipe),
            _ => None,
        }
    }

    fn into_entity(self) -> Entity {
        Entity::Recipe(self)
    }

    fn list<'a>(gateway: &'a dyn Gateway, _: &'a ()) -> GatewayFuture<'a, Vec<Self>> {
        gateway.list_recipes()
    }

    fn fetch<'a>(gateway: &'a dyn Gateway, id: &'a Id) -> GatewayFuture<'a, Self> {
        gateway.get_recipe(id)
    }
}

impl Resource for Ingredient {
    type Scope = Id;

    const KIND: ResourceKind = ResourceKind::Ingredient;

    fn id(&self) -> &Id {
        &self.id
    }

    fn in_scope(&self, recipe: &Id) -> bool {
        &self.recipe == recipe
    }

    fn is_complete(&self) -> bool {
        self.pantry_item.full().is_some()
    }

    fn from_entity(entity: &Entity) -> Option<&Self> {
        match entity {
            Entity::Ingredient(ingredient) => Some(ingredient),
            _ => None,
        }
    }

    fn into_entity(self) -> Entity {
        Entity::Ingredient(self)
    }

    fn list<'a>(gateway: &'a dyn Gateway, recipe: &'a Id) -> GatewayFuture<'a, Vec<Self>> {
        gateway.list_ingredients_by_recipe(recipe)
    }

    fn fetch<'a>(gateway: &'a dyn Gateway, id: &'a Id) -> GatewayFuture<'a, Self> {
        gateway.get_ingredient(id)
    }
}

impl Resource for ShoppingListItem {
    type Scope = ();

    const KIND: ResourceKind = ResourceKind::ShoppingListItem;

    fn id(&self) -> &Id {
        &self.id
    }

    fn in_scope(&self, _: &()) -> bool {
        true
    }

    fn from_entity(entity: &Entity) -> Option<&Self> {
        match entity {
            Entity::ShoppingListItem(item) => Some(item),
            _ => None,
        }
    }

    fn into_entity(self) -> Entity {
        Entity::ShoppingListItem(self)
    }

    fn list<'a>(gateway: &'a dyn Gateway, _: &'a ()) -> GatewayFuture<'a, Vec<Self>> {
        gateway.list_shopping_list_items()
    }

    // Shopping list entries always arrive with their pantry item embedded.
    fn fetch<'a>(_gateway: &'a dyn Gateway, _id: &'a Id) -> GatewayFuture<'a, Self> {
        Box::pin(async { Err(GatewayError::Unsupported("fetch shopping list item")) })
    }
}
