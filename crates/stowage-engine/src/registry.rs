//! In-flight upload registry
//!
//! Maps an upload's original identity to the destination keys dispatched for it, in
//! dispatch order. Entries survive a failed session so the removal path can delete
//! whatever was written.
//!
//! Only the engine writes to the registry; callers get read access.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Process-scoped registry of in-flight destination keys.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    entries: Mutex<HashMap<String, Vec<String>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Vec<String>>> {
        // No operation leaves the map half-updated, so poisoning is ignored
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start an entry with no keys, replacing any previous entry for `identity`.
    pub(crate) fn register(&self, identity: &str) {
        self.entries().insert(identity.to_string(), Vec::new());
    }

    /// Append a dispatched key to `identity`'s entry.
    pub(crate) fn append(&self, identity: &str, key: impl Into<String>) {
        self.entries()
            .entry(identity.to_string())
            .or_default()
            .push(key.into());
    }

    /// Snapshot of the keys registered for `identity`.
    pub fn keys(&self, identity: &str) -> Option<Vec<String>> {
        self.entries().get(identity).cloned()
    }

    /// Remove `identity`'s entry and return its keys.
    pub(crate) fn take(&self, identity: &str) -> Option<Vec<String>> {
        self.entries().remove(identity)
    }

    /// Drop `identity`'s entry. Returns whether one existed.
    pub(crate) fn deregister(&self, identity: &str) -> bool {
        self.entries().remove(identity).is_some()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.entries().contains_key(identity)
    }

    /// Number of identities with an entry
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_register_append_take() {
        let registry = InFlightRegistry::new();
        registry.register("photo.jpg");
        assert_eq!(registry.keys("photo.jpg"), Some(vec![]));

        registry.append("photo.jpg", "u/a.jpg");
        registry.append("photo.jpg", "u/a.webp");
        assert_eq!(
            registry.keys("photo.jpg"),
            Some(vec!["u/a.jpg".to_string(), "u/a.webp".to_string()])
        );

        assert_eq!(
            registry.take("photo.jpg"),
            Some(vec!["u/a.jpg".to_string(), "u/a.webp".to_string()])
        );
        assert!(!registry.contains("photo.jpg"));
        assert_eq!(registry.take("photo.jpg"), None);
    }

    #[test]
    fn test_register_replaces_entry() {
        let registry = InFlightRegistry::new();
        registry.append("photo.jpg", "stale.jpg");
        registry.register("photo.jpg");
        assert_eq!(registry.keys("photo.jpg"), Some(vec![]));
    }

    #[test]
    fn test_deregister() {
        let registry = InFlightRegistry::new();
        registry.register("a");
        assert!(registry.deregister("a"));
        assert!(!registry.deregister("a"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_appends_keep_per_identity_lists() {
        let registry = Arc::new(InFlightRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let identity = format!("file-{}", i);
                    registry.register(&identity);
                    for n in 0..100 {
                        registry.append(&identity, format!("{}-{}", identity, n));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.len(), 8);
        for i in 0..8 {
            let identity = format!("file-{}", i);
            let keys = registry.keys(&identity).unwrap();
            let expected: Vec<String> = (0..100).map(|n| format!("{}-{}", identity, n)).collect();
            assert_eq!(keys, expected);
        }
    }
}
