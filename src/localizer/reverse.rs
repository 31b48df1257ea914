//! Reverse lookup indexes: localized string → canonical key, per UI culture.
//!
//! Indexes are built lazily the first time a culture is unlocalized and kept
//! until [`ReverseLookupCache::clear`] is called. At most one build runs per
//! culture; concurrent callers block on the in-flight build and share its
//! result.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Localized value → canonical key.
///
/// When two keys share the same localized value, the last pair wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseIndex {
    entries: HashMap<String, String>,
}

impl ReverseIndex {
    /// Invert `(key, value)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let entries = pairs.into_iter().map(|(key, value)| (value, key)).collect();
        Self { entries }
    }

    /// Canonical key for a localized value.
    pub fn get(&self, localized: &str) -> Option<&str> {
        self.entries.get(localized).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

type IndexCell = Arc<OnceLock<Arc<ReverseIndex>>>;

/// Process-lifetime cache of reverse indexes keyed by culture name.
#[derive(Debug, Default)]
pub struct ReverseLookupCache {
    cells: Mutex<HashMap<String, IndexCell>>,
}

impl ReverseLookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index for `culture`, running `build` if no index exists yet.
    ///
    /// Returns the index and whether this call built it.
    pub fn get_or_build<F>(&self, culture: &str, build: F) -> (Arc<ReverseIndex>, bool)
    where
        F: FnOnce() -> ReverseIndex,
    {
        let cell = {
            let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(cells.entry(culture.to_ascii_lowercase()).or_default())
        };

        let mut built = false;
        let index = cell.get_or_init(|| {
            built = true;
            Arc::new(build())
        });
        (Arc::clone(index), built)
    }

    /// Drop every cached index; the next lookup per culture rebuilds it.
    pub fn clear(&self) {
        self.cells
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of cultures with a cached (or in-flight) index.
    pub fn len(&self) -> usize {
        self.cells
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // ==================== ReverseIndex Tests ====================

    #[test]
    fn test_index_inverts_pairs() {
        let index = ReverseIndex::from_pairs(pairs(&[("About", "Acerca"), ("Privacy", "Privacidad")]));
        assert_eq!(index.get("Acerca"), Some("About"));
        assert_eq!(index.get("Privacidad"), Some("Privacy"));
        assert_eq!(index.get("About"), None);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_index_duplicate_values_last_wins() {
        let index = ReverseIndex::from_pairs(pairs(&[("Contact", "Contacto"), ("Contacts", "Contacto")]));
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("Contacto"), Some("Contacts"));
    }

    // ==================== Cache Tests ====================

    #[test]
    fn test_cache_builds_once_per_culture() {
        let cache = ReverseLookupCache::new();
        let builds = AtomicUsize::new(0);
        let build = || {
            builds.fetch_add(1, Ordering::SeqCst);
            ReverseIndex::from_pairs(pairs(&[("About", "Acerca")]))
        };

        let (first, built_first) = cache.get_or_build("es", build);
        let (second, built_second) = cache.get_or_build("ES", build);

        assert!(built_first);
        assert!(!built_second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_separates_cultures() {
        let cache = ReverseLookupCache::new();
        let (es, _) = cache.get_or_build("es", || ReverseIndex::from_pairs(pairs(&[("About", "Acerca")])));
        let (fr, _) = cache.get_or_build("fr", || ReverseIndex::from_pairs(pairs(&[("About", "Apropos")])));

        assert_eq!(es.get("Acerca"), Some("About"));
        assert_eq!(fr.get("Acerca"), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_cache_clear_forces_rebuild() {
        let cache = ReverseLookupCache::new();
        cache.get_or_build("es", ReverseIndex::default);
        cache.clear();
        assert!(cache.is_empty());

        let (_, built) = cache.get_or_build("es", ReverseIndex::default);
        assert!(built);
    }

    #[test]
    fn test_concurrent_first_access_builds_once() {
        let cache = Arc::new(ReverseLookupCache::new());
        let builds = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let builds = Arc::clone(&builds);
                thread::spawn(move || {
                    let (index, _) = cache.get_or_build("es", || {
                        builds.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(10));
                        ReverseIndex::from_pairs(vec![("About".to_string(), "Acerca".to_string())])
                    });
                    index.get("Acerca").map(str::to_string)
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().as_deref(), Some("About"));
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }
}
