//! Mutation bus for cross-screen change notification.
//!
//! Screens never share a central store. When one screen creates, updates, or
//! deletes a resource on the server, it publishes the outcome here and every
//! mounted screen decides for itself whether its local copy is affected.
//!
//! ```text
//! ┌──────────────┐  publish_created   ┌─────────────┐
//! │  Edit form   │ ─────────────────► │ MutationBus │
//! └──────────────┘                    └──────┬──────┘
//!                                  ┌─────────┴─────────┐
//!                                  ▼                   ▼
//!                           ┌────────────┐      ┌────────────┐
//!                           │ Pantry     │      │ Shopping   │
//!                           │ section    │      │ list       │
//!                           └────────────┘      └────────────┘
//! ```
//!
//! # Delivery
//!
//! - Every publish overwrites the matching "last" slot, even when the value
//!   is equal to the previous one, and every publish notifies subscribers.
//! - Subscribers run synchronously on the publishing thread, in registration
//!   order, after the internal lock is released. Handlers may therefore
//!   publish or subscribe themselves.
//! - A subscriber registered after a publish does not see that publish; the
//!   slots from [`MutationBus::snapshot`] still hold it.
//!
//! # Example
//!
//! ```
//! use larder_core::bus::{Mutation, MutationBus};
//! use std::sync::{Arc, Mutex};
//!
//! let bus: MutationBus<String, u32> = MutationBus::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! let subscription = bus.subscribe(move |mutation: &Mutation<String, u32>| {
//!     if let Ok(mut seen) = sink.lock() {
//!         seen.push(mutation.clone());
//!     }
//! });
//!
//! bus.publish_created("Rice".to_string());
//! bus.publish_deleted(7);
//! subscription.unsubscribe();
//! bus.publish_deleted(8);
//!
//! assert_eq!(seen.lock().map(|s| s.len()).unwrap_or(0), 2);
//! assert_eq!(bus.snapshot().last_deleted, Some(8));
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// A single outcome announced on the bus.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation<T, K> {
    /// An entity was created on the server (possibly in shallow form)
    Created(T),
    /// An entity was updated on the server
    Updated(T),
    /// The entity with this key was deleted on the server
    Deleted(K),
}

impl<T, K> Mutation<T, K> {
    /// Short label used in logs
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Mutation::Created(_) => "created",
            Mutation::Updated(_) => "updated",
            Mutation::Deleted(_) => "deleted",
        }
    }
}

/// The most recent value published in each category.
#[derive(Clone, Debug, PartialEq)]
pub struct MutationSlots<T, K> {
    /// Last created entity
    pub last_created: Option<T>,
    /// Last updated entity
    pub last_updated: Option<T>,
    /// Key of the last deleted entity
    pub last_deleted: Option<K>,
}

impl<T, K> Default for MutationSlots<T, K> {
    fn default() -> Self {
        Self {
            last_created: None,
            last_updated: None,
            last_deleted: None,
        }
    }
}

type Handler<T, K> = Arc<dyn Fn(&Mutation<T, K>) + Send + Sync>;

struct Inner<T, K> {
    slots: MutationSlots<T, K>,
    subscribers: Vec<(u64, Handler<T, K>)>,
    next_id: u64,
}

/// Process-wide publish/subscribe channel for mutation outcomes.
///
/// Cloning the bus yields another handle to the same channel.
pub struct MutationBus<T, K> {
    inner: Arc<Mutex<Inner<T, K>>>,
}

impl<T, K> Clone for MutationBus<T, K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, K> Default for MutationBus<T, K> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                slots: MutationSlots::default(),
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }
}

impl<T, K> fmt::Debug for MutationBus<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationBus")
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Handlers run outside the lock, so a poisoned lock only means a panic
    // while updating slots; the data is still usable.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T, K> MutationBus<T, K> {
    /// Create an empty bus with no subscribers and empty slots
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }
}

impl<T, K> MutationBus<T, K>
where
    T: Clone + Send + 'static,
    K: Clone + Send + 'static,
{
    /// Announce a mutation: overwrite its slot, then notify every subscriber.
    pub fn publish(&self, mutation: Mutation<T, K>) {
        let handlers: Vec<Handler<T, K>> = {
            let mut inner = lock(&self.inner);
            match &mutation {
                Mutation::Created(entity) => inner.slots.last_created = Some(entity.clone()),
                Mutation::Updated(entity) => inner.slots.last_updated = Some(entity.clone()),
                Mutation::Deleted(key) => inner.slots.last_deleted = Some(key.clone()),
            }
            inner.subscribers.iter().map(|(_, handler)| Arc::clone(handler)).collect()
        };

        tracing::trace!(kind = mutation.label(), subscribers = handlers.len(), "Publishing mutation");

        for handler in handlers {
            handler(&mutation);
        }
    }

    /// Announce a created entity
    pub fn publish_created(&self, entity: T) {
        self.publish(Mutation::Created(entity));
    }

    /// Announce an updated entity
    pub fn publish_updated(&self, entity: T) {
        self.publish(Mutation::Updated(entity));
    }

    /// Announce a deleted key
    pub fn publish_deleted(&self, key: K) {
        self.publish(Mutation::Deleted(key));
    }

    /// Register a handler for all future publishes.
    ///
    /// The handler stays registered until the returned [`Subscription`] is
    /// dropped or explicitly unsubscribed.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Mutation<T, K>) + Send + Sync + 'static,
    {
        let mut inner = lock(&self.inner);
        self.register(&mut inner, Arc::new(handler))
    }

    /// Current value of the three "last" slots
    #[must_use]
    pub fn snapshot(&self) -> MutationSlots<T, K> {
        lock(&self.inner).slots.clone()
    }

    fn register(&self, inner: &mut Inner<T, K>, handler: Handler<T, K>) -> Subscription {
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, handler));

        let weak: Weak<Mutex<Inner<T, K>>> = Arc::downgrade(&self.inner);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    lock(&inner).subscribers.retain(|(existing, _)| *existing != id);
                }
            })),
        }
    }
}

/// Handle that keeps a bus handler registered.
///
/// Dropping it (or calling [`Subscription::unsubscribe`]) removes the handler.
/// A publish already in progress may still deliver to it once.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Remove the handler now
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    type Bus = MutationBus<&'static str, u32>;

    fn recorder(bus: &Bus) -> (Arc<Mutex<Vec<Mutation<&'static str, u32>>>>, Subscription) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let subscription = bus.subscribe(move |mutation| sink.lock().unwrap().push(mutation.clone()));
        (log, subscription)
    }

    #[test]
    fn publish_overwrites_slots_even_with_equal_values() {
        let bus = Bus::new();
        let (log, _subscription) = recorder(&bus);

        bus.publish_updated("rice");
        bus.publish_updated("rice");

        assert_eq!(log.lock().unwrap().len(), 2);
        assert_eq!(bus.snapshot().last_updated, Some("rice"));
        assert_eq!(bus.snapshot().last_created, None);
    }

    #[test]
    fn subscribers_run_in_registration_order() {
        let bus = Bus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&order);
        let _a = bus.subscribe(move |_| first.lock().unwrap().push("a"));
        let second = Arc::clone(&order);
        let _b = bus.subscribe(move |_| second.lock().unwrap().push("b"));

        bus.publish_deleted(1);

        assert_eq!(*order.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn dropping_subscription_stops_delivery() {
        let bus = Bus::new();
        let (log, subscription) = recorder(&bus);

        bus.publish_created("oats");
        drop(subscription);
        bus.publish_created("flour");

        assert_eq!(*log.lock().unwrap(), vec![Mutation::Created("oats")]);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn late_subscriber_misses_earlier_publish_but_sees_snapshot() {
        let bus = Bus::new();
        bus.publish_created("salt");

        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let _subscription = bus.subscribe(move |mutation| sink.lock().unwrap().push(mutation.clone()));

        assert_eq!(bus.snapshot().last_created, Some("salt"));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn handler_may_publish_reentrantly() {
        let bus = Bus::new();
        let inner_bus = bus.clone();
        let _echo = bus.subscribe(move |mutation| {
            if let Mutation::Created(_) = mutation {
                inner_bus.publish_deleted(99);
            }
        });

        bus.publish_created("sugar");

        assert_eq!(bus.snapshot().last_deleted, Some(99));
    }

    #[test]
    fn subscription_outliving_bus_is_harmless() {
        let bus = Bus::new();
        let (_log, subscription) = recorder(&bus);
        drop(bus);
        subscription.unsubscribe();
    }

    proptest! {
        #[test]
        fn every_live_subscriber_sees_every_publish(
            subscribers in 1usize..6,
            keys in proptest::collection::vec(0u32..50, 0..20),
        ) {
            let bus = Bus::new();
            let recorders: Vec<_> = (0..subscribers).map(|_| recorder(&bus)).collect();

            for key in &keys {
                bus.publish_deleted(*key);
            }

            for (log, _subscription) in &recorders {
                let seen: Vec<u32> = log
                    .lock()
                    .unwrap()
                    .iter()
                    .filter_map(|m| match m { Mutation::Deleted(k) => Some(*k), _ => None })
                    .collect();
                prop_assert_eq!(&seen, &keys);
            }
            prop_assert_eq!(bus.snapshot().last_deleted, keys.last().copied());
        }
    }
}
