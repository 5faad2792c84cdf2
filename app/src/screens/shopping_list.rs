//! Shopping list screen.

use crate::environment::AppEnvironment;
use crate::notice::{NoticeLevel, NoticeSlot};
use crate::reconciler::{ListAction, ListReducer, ListState};
use crate::resource::AppMutation;
use larder_client::{GatewayError, Id, ShoppingListItem};
use larder_core::composition::scope;
use larder_core::effect::Effect;
use larder_core::reducer::Reducer;
use larder_core::{async_call, smallvec, SmallVec};
use std::sync::Arc;

/// Shopping list state.
#[derive(Debug, Clone)]
pub struct ShoppingListState {
    /// Pending purchases
    pub items: ListState<ShoppingListItem>,
    /// A purchase is being recorded
    pub purchasing: bool,
    /// Purchase notices
    pub notice: NoticeSlot,
}

impl Default for ShoppingListState {
    fn default() -> Self {
        Self {
            items: ListState::new(()),
            purchasing: false,
            notice: NoticeSlot::default(),
        }
    }
}

impl ShoppingListState {
    /// Entries ticked off
    #[must_use]
    pub fn checked(&self) -> Vec<ShoppingListItem> {
        self.items.items.iter().filter(|item| item.is_checked).cloned().collect()
    }
}

/// Shopping list input.
#[derive(Debug, Clone)]
pub enum ShoppingListAction {
    /// List input
    Items(ListAction<ShoppingListItem>),
    /// Bus announcement
    Bus(AppMutation),
    /// Flip the checkbox of the row at this index
    Toggle(usize),
    /// Move every checked entry into the pantry
    MarkPurchased,
    /// The service recorded the purchase of these entries
    Purchased(Vec<Id>),
    /// Purchase failed
    PurchaseFailed(GatewayError),
    /// Notice timer expired
    DismissNotice(u64),
}

/// Reducer for [`ShoppingListState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ShoppingListReducer;

impl Reducer for ShoppingListReducer {
    type State = ShoppingListState;
    type Action = ShoppingListAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut ShoppingListState,
        action: ShoppingListAction,
        env: &AppEnvironment,
    ) -> SmallVec<[Effect<ShoppingListAction>; 4]> {
        match action {
            ShoppingListAction::Items(action) => scope(
                &ListReducer::<ShoppingListItem>::new(),
                &mut state.items,
                action,
                env,
                ShoppingListAction::Items,
            ),

            ShoppingListAction::Bus(mutation) => scope(
                &ListReducer::<ShoppingListItem>::new(),
                &mut state.items,
                ListAction::Bus(mutation),
                env,
                ShoppingListAction::Items,
            ),

            ShoppingListAction::Toggle(index) => {
                if let Some(item) = state.items.items.get_mut(index) {
                    item.is_checked = !item.is_checked;
                }
                smallvec![Effect::None]
            },

            ShoppingListAction::MarkPurchased => {
                let checked = state.checked();
                if checked.is_empty() || state.purchasing {
                    return smallvec![Effect::None];
                }

                state.purchasing = true;
                let ids: Vec<Id> = checked.iter().map(|item| item.id.clone()).collect();
                tracing::info!(entries = ids.len(), "Recording purchase");
                let gateway = Arc::clone(&env.gateway);
                smallvec![async_call! {
                    call: gateway.add_shopping_list_items_to_pantry(&checked),
                    on_success: |_recorded| Some(ShoppingListAction::Purchased(ids)),
                    on_error: |error| Some(ShoppingListAction::PurchaseFailed(error))
                }]
            },

            ShoppingListAction::Purchased(ids) => {
                state.purchasing = false;
                state.items.items.retain(|item| !ids.contains(&item.id));
                smallvec![state.notice.show(
                    NoticeLevel::Success,
                    "Items added to pantry",
                    env.notice_ttl,
                    ShoppingListAction::DismissNotice
                )]
            },

            ShoppingListAction::PurchaseFailed(error) => {
                state.purchasing = false;
                tracing::warn!(%error, "Purchase failed");
                smallvec![state.notice.show(
                    NoticeLevel::Failure,
                    "Failed to add items to pantry",
                    env.notice_ttl,
                    ShoppingListAction::DismissNotice
                )]
            },

            ShoppingListAction::DismissNotice(id) => {
                state.notice.dismiss(id);
                smallvec![Effect::None]
            },
        }
    }
}
