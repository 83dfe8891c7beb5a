//! Session-scoped state used by repositories.
//!
//! # Responsibility
//! - Provide a string-keyed session store (`SessionStore`).
//! - Expose the content-collection absence flag as an injectable
//!   `AbsenceCache` instead of ambient global state.
//!
//! # Invariants
//! - The absence flag is monotonic: once set it is never cleared in a session.
//! - Flag value is `"1"` under `CONTENT_UNAVAILABLE_SESSION_KEY`; absence of
//!   the key means "not yet known to be unavailable".

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Session key recording that the site content collection does not exist.
pub const CONTENT_UNAVAILABLE_SESSION_KEY: &str = "cf:site_content_unavailable";
const FLAG_SET_VALUE: &str = "1";

/// String-keyed key/value store whose lifetime is one session.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value);
    }
}

/// In-process session store. One process run is one session.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }
}

/// Remembers that a backing collection is known to be absent.
pub trait AbsenceCache: Send + Sync {
    fn is_known_absent(&self) -> bool;
    fn mark_absent(&self);
}

/// `AbsenceCache` persisted in a `SessionStore` under a sentinel key.
#[derive(Debug)]
pub struct SessionAbsenceCache<S: SessionStore> {
    store: S,
    key: &'static str,
}

impl<S: SessionStore> SessionAbsenceCache<S> {
    /// Cache for the site content collection.
    pub fn for_site_content(store: S) -> Self {
        Self::with_key(store, CONTENT_UNAVAILABLE_SESSION_KEY)
    }

    pub fn with_key(store: S, key: &'static str) -> Self {
        Self { store, key }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: SessionStore> AbsenceCache for SessionAbsenceCache<S> {
    fn is_known_absent(&self) -> bool {
        self.store.get(self.key).as_deref() == Some(FLAG_SET_VALUE)
    }

    fn mark_absent(&self) {
        self.store.set(self.key, FLAG_SET_VALUE);
    }
}
