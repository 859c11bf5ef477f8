use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::models::ProjectsSnapshot;

type Observer = Arc<dyn Fn(ProjectsSnapshot) + Send + Sync>;

/// Token returned by [`ObserverRegistry::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    observers: Vec<(SubscriptionId, Observer)>,
}

/// Listener list owned by the project store.
///
/// Delivery is synchronous and in subscription order. Each observer gets
/// its own clone of the snapshot. The registry lock is released before
/// any callback runs, so callbacks may read the store or (un)subscribe.
#[derive(Default)]
pub struct ObserverRegistry {
    inner: Mutex<Registry>,
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.len())
            .finish()
    }
}

impl ObserverRegistry {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(ProjectsSnapshot) + Send + Sync + 'static,
    {
        let mut registry = self.registry();
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry.observers.push((id, Arc::new(observer)));
        id
    }

    /// Returns `false` when the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry();
        let before = registry.observers.len();
        registry.observers.retain(|(sub, _)| *sub != id);
        registry.observers.len() != before
    }

    pub fn notify(&self, snapshot: &ProjectsSnapshot) {
        let observers: Vec<Observer> = self
            .registry()
            .observers
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer(snapshot.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.registry().observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
