//! proptest strategies for wire types

use larder_client::{CapacityMeasure, Container, Id, PantryItem, Recipe};
use proptest::prelude::*;
use proptest::sample::select;

/// Ids in either shape.
pub fn arb_id() -> impl Strategy<Value = Id> {
    prop_oneof![
        (1_i64..10_000).prop_map(Id::Int),
        "[a-z][a-z0-9]{0,6}".prop_map(Id::Text),
    ]
}

/// Ids drawn from a small pool, so collisions are common.
pub fn arb_small_id() -> impl Strategy<Value = Id> {
    (0_i64..6).prop_map(Id::Int)
}

/// Display names.
pub fn arb_name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{1,10}( [a-z]{1,8})?"
}

/// Capacity measures.
pub fn arb_capacity_measure() -> impl Strategy<Value = CapacityMeasure> {
    select(CapacityMeasure::ALL.to_vec())
}

/// Containers.
pub fn arb_container() -> impl Strategy<Value = Container> {
    select(Container::ALL.to_vec())
}

/// Pantry items in `category`.
pub fn arb_pantry_item(category: Id) -> impl Strategy<Value = PantryItem> {
    (
        arb_small_id(),
        arb_name(),
        1_i64..5000,
        arb_capacity_measure(),
        arb_container(),
        0_u32..20,
    )
        .prop_map(move |(id, name, capacity, capacity_measure, container, on_hand)| PantryItem {
            id,
            name,
            category: category.clone(),
            capacity,
            capacity_measure,
            container,
            on_hand: f64::from(on_hand),
        })
}

/// Recipes with nothing planned.
pub fn arb_recipe() -> impl Strategy<Value = Recipe> {
    (arb_small_id(), arb_name(), 1_i64..12).prop_map(|(id, name, serves)| Recipe {
        id,
        name,
        serves,
        image_src: None,
        servings: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn ids_render_without_quotes(id in arb_id()) {
            let rendered = id.to_string();
            prop_assert!(!rendered.contains('"'));
            prop_assert!(!rendered.is_empty());
        }

        #[test]
        fn pantry_items_keep_requested_category(item in arb_pantry_item(Id::from("c1"))) {
            prop_assert_eq!(item.category, Id::from("c1"));
            prop_assert!(item.capacity > 0);
        }
    }
}
