//! Auth-state observer registry.
//!
//! The registry owns the last published auth state. Registration and
//! publication both read or replace it under the registry lock and stamp it
//! with a version, so a new observer's initial state and a concurrent change
//! are ordered. Each observer drops any delivery older than the last one it
//! received, so a stale initial state never overwrites a newer change.
//!
//! Callbacks are invoked outside the registry lock so an observer may
//! subscribe or drop another subscription from inside its own callback.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use uuid::Uuid;

use super::{AuthCallback, AuthChange};

struct Observer {
    callback: AuthCallback,
    /// Version of the last change delivered to `callback`.
    delivered: Mutex<u64>,
}

impl Observer {
    fn deliver(&self, version: u64, change: &AuthChange) {
        let mut delivered = self.delivered.lock().unwrap_or_else(PoisonError::into_inner);
        if version <= *delivered {
            return;
        }
        *delivered = version;
        (self.callback)(change.clone());
    }
}

struct Registry {
    observers: HashMap<Uuid, Arc<Observer>>,
    current: AuthChange,
    version: u64,
}

impl Default for Registry {
    fn default() -> Self {
        Self { observers: HashMap::new(), current: Ok(None), version: 1 }
    }
}

/// Set of registered auth-state observers plus the last published state. Cheap to clone.
#[derive(Clone, Default)]
pub struct AuthObservers {
    inner: Arc<Mutex<Registry>>,
}

impl AuthObservers {
    /// Empty registry whose current state is signed out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback`, deliver the current state to it, and return its handle.
    pub fn register(&self, callback: AuthCallback) -> AuthSubscription {
        let id = Uuid::new_v4();
        let observer = Arc::new(Observer { callback, delivered: Mutex::new(0) });
        let (version, current) = {
            let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            registry.observers.insert(id, Arc::clone(&observer));
            (registry.version, registry.current.clone())
        };
        observer.deliver(version, &current);
        AuthSubscription { id, registry: Arc::downgrade(&self.inner) }
    }

    /// Replace the current state and deliver it to every registered observer.
    pub fn notify(&self, change: &AuthChange) {
        let (version, observers) = {
            let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            registry.current = change.clone();
            registry.version += 1;
            let observers: Vec<Arc<Observer>> = registry.observers.values().cloned().collect();
            (registry.version, observers)
        };
        for observer in observers {
            observer.deliver(version, change);
        }
    }

    /// Last published state.
    #[must_use]
    pub fn current(&self) -> AuthChange {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .clone()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observers
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle for one registered observer. Dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct AuthSubscription {
    id: Uuid,
    registry: Weak<Mutex<Registry>>,
}

impl AuthSubscription {
    /// Unsubscribe now. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// `true` while the callback is still registered with a live provider.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.registry.upgrade().is_some_and(|registry| {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .observers
                .contains_key(&self.id)
        })
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .observers
                .remove(&self.id);
        }
    }
}

impl std::fmt::Debug for AuthSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSubscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
#[path = "observers_test.rs"]
mod tests;
