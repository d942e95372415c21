//! Field-change subscriptions.
//!
//! Callers register interest in settled changes of a field and receive the old
//! and new value once per change. Assignment done by a pull bypasses watchers.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::document::{Field, FieldValue};

/// A unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback for a settled field change: `(field, old, new)`.
pub type FieldCallback = Arc<dyn Fn(Field, &FieldValue, &FieldValue) + Send + Sync>;

/// Thread-safe registry of per-field watchers.
///
/// Callbacks run synchronously in registration order. A panicking callback does
/// not prevent the others from running.
pub struct FieldWatchers {
    callbacks: RwLock<BTreeMap<SubscriptionId, (Field, FieldCallback)>>,
    next_id: AtomicU64,
}

impl FieldWatchers {
    pub fn new() -> Self {
        Self {
            callbacks: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Watch settled changes of `field`.
    pub fn on_field_settled(&self, field: Field, callback: FieldCallback) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, (field, callback));
        id
    }

    /// Returns `true` if the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// Notify every watcher of `field`.
    pub fn emit(&self, field: Field, old: &FieldValue, new: &FieldValue) {
        let callbacks = self
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for (watched, callback) in callbacks.values() {
            if *watched != field {
                continue;
            }
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                callback(field, old, new);
            }));
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for FieldWatchers {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FieldWatchers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldWatchers")
            .field("subscriber_count", &self.subscriber_count())
            .field("next_id", &self.next_id.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_only_matching_field_is_notified() {
        let watchers = FieldWatchers::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        watchers.on_field_settled(
            Field::Title,
            Arc::new(move |field, old, new| {
                sink.lock().unwrap().push((field, old.clone(), new.clone()));
            }),
        );

        watchers.emit(Field::Content, &"a".into(), &"b".into());
        watchers.emit(Field::Title, &"old".into(), &"new".into());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], (Field::Title, "old".into(), "new".into()));
    }

    #[test]
    fn test_registration_order_and_unsubscribe() {
        let watchers = FieldWatchers::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut ids = Vec::new();
        for n in 0..3 {
            let order = Arc::clone(&order);
            ids.push(watchers.on_field_settled(
                Field::Status,
                Arc::new(move |_, _, _| order.lock().unwrap().push(n)),
            ));
        }
        assert!(watchers.unsubscribe(ids[1]));
        assert!(!watchers.unsubscribe(ids[1]));

        watchers.emit(Field::Status, &FieldValue::Status(0), &FieldValue::Status(2));
        assert_eq!(*order.lock().unwrap(), vec![0, 2]);
        assert_eq!(watchers.subscriber_count(), 2);
    }

    #[test]
    fn test_callback_panic_isolation() {
        let watchers = FieldWatchers::new();
        let reached = Arc::new(Mutex::new(false));

        watchers.on_field_settled(Field::Link, Arc::new(|_, _, _| panic!("watcher failed")));
        let flag = Arc::clone(&reached);
        watchers.on_field_settled(
            Field::Link,
            Arc::new(move |_, _, _| *flag.lock().unwrap() = true),
        );

        watchers.emit(Field::Link, &"".into(), &"https://example.com".into());
        assert!(*reached.lock().unwrap());
    }
}
