//! Builders for wire types and a seeded service

use crate::mocks::MockGateway;
use larder_client::{
    CapacityMeasure, Category, Container, Id, Ingredient, IngredientPantryItem, PantryItem, Recipe,
    ShoppingListItem,
};

/// Category with a default icon.
#[must_use]
pub fn category(id: impl Into<Id>, name: &str) -> Category {
    Category {
        id: id.into(),
        name: name.to_string(),
        icon: "kitchen".to_string(),
    }
}

/// Pantry item sold by the one-litre bottle.
#[must_use]
pub fn pantry_item(id: impl Into<Id>, category: impl Into<Id>, name: &str, on_hand: f64) -> PantryItem {
    PantryItem {
        id: id.into(),
        name: name.to_string(),
        category: category.into(),
        capacity: 1000,
        capacity_measure: CapacityMeasure::Ml,
        container: Container::Bottle,
        on_hand,
    }
}

/// Recipe without an image, nothing planned.
#[must_use]
pub fn recipe(id: impl Into<Id>, name: &str, serves: i64) -> Recipe {
    Recipe {
        id: id.into(),
        name: name.to_string(),
        serves,
        image_src: None,
        servings: 0,
    }
}

/// Ingredient embedding its pantry item.
#[must_use]
pub fn ingredient(id: impl Into<Id>, recipe: impl Into<Id>, pantry_item: PantryItem, quantity: f64) -> Ingredient {
    Ingredient {
        id: id.into(),
        recipe: recipe.into(),
        pantry_item: IngredientPantryItem::Full(pantry_item),
        quantity,
    }
}

/// Ingredient carrying only the pantry item id.
#[must_use]
pub fn shallow_ingredient(
    id: impl Into<Id>,
    recipe: impl Into<Id>,
    pantry_item: impl Into<Id>,
    quantity: f64,
) -> Ingredient {
    Ingredient {
        id: id.into(),
        recipe: recipe.into(),
        pantry_item: IngredientPantryItem::Shallow(pantry_item.into()),
        quantity,
    }
}

/// Unchecked shopping list entry.
#[must_use]
pub fn shopping_item(id: impl Into<Id>, pantry_item: PantryItem, quantity: f64) -> ShoppingListItem {
    ShoppingListItem {
        id: id.into(),
        pantry_item,
        quantity,
        is_checked: false,
    }
}

/// Account accepted by [`sample_gateway`].
pub const SAMPLE_USER: &str = "cook@example.com";
/// Password for [`SAMPLE_USER`].
pub const SAMPLE_PASSWORD: &str = "correct horse";
/// Token issued to [`SAMPLE_USER`].
pub const SAMPLE_TOKEN: &str = "sample-token";

/// Service seeded with a small kitchen.
///
/// Categories `c1` (Dairy) and `c2` (Dry goods); pantry items `p1` Milk and
/// `p2` Butter in `c1`, `p3` Rice in `c2`; recipes `r1` Risotto (ingredients
/// `i1` Rice, `i2` Butter) and `r2` Pancakes (ingredient `i3` Milk); one
/// shopping list entry `s1` for Milk.
#[must_use]
pub fn sample_gateway() -> MockGateway {
    let gateway = MockGateway::new();
    gateway.add_account(SAMPLE_USER, SAMPLE_PASSWORD, SAMPLE_TOKEN);

    gateway.add_category(category("c1", "Dairy"));
    gateway.add_category(category("c2", "Dry goods"));

    let milk = pantry_item("p1", "c1", "Milk", 2.0);
    let butter = pantry_item("p2", "c1", "Butter", 1.0);
    let rice = pantry_item("p3", "c2", "Rice", 3.0);
    for item in [&milk, &butter, &rice] {
        gateway.add_pantry_item(item.clone());
    }

    gateway.add_recipe(recipe("r1", "Risotto", 4));
    gateway.add_recipe(recipe("r2", "Pancakes", 2));
    gateway.add_ingredient(ingredient("i1", "r1", rice, 0.5));
    gateway.add_ingredient(ingredient("i2", "r1", butter, 0.25));
    gateway.add_ingredient(ingredient("i3", "r2", milk.clone(), 0.5));

    gateway.add_shopping_item(shopping_item("s1", milk, 2.0));
    gateway
}
