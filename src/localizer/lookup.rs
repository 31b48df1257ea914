//! Key → localized string lookup.
//!
//! The engine only needs two things from a string source: a single lookup and
//! the full list of strings for a culture (to build reverse indexes). The
//! bundled [`ResourceSet`] keeps JSON resource files in memory; any other
//! backend can implement [`StringLookup`].

use crate::culture::parent_culture;
use crate::error::{LocalizationError, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

/// Source of localized strings keyed by canonical name.
pub trait StringLookup: Send + Sync {
    /// Localized value of `key` for `culture`, falling back to parent cultures.
    fn get(&self, culture: &str, key: &str) -> Option<String>;

    /// Every `(key, value)` pair visible to `culture`, including parent cultures.
    fn all_strings(&self, culture: &str) -> Result<Vec<(String, String)>>;
}

/// In-memory resource bundles for one resource name (e.g. `Url`).
///
/// Bundles are stored per culture. The neutral bundle (culture `""`) is the
/// last fallback for every culture.
#[derive(Debug, Clone, Default)]
pub struct ResourceSet {
    name: String,
    bundles: HashMap<String, BTreeMap<String, String>>,
}

impl ResourceSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bundles: HashMap::new(),
        }
    }

    /// Add (or extend) the bundle for `culture`.
    pub fn with_bundle<K, V>(mut self, culture: &str, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let bundle = self.bundles.entry(culture.to_ascii_lowercase()).or_default();
        bundle.extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Load `{name}.json` and `{name}.{culture}.json` files from `dir`.
    ///
    /// Each file holds a flat JSON object of `"Key": "Localized"` pairs.
    pub fn load_dir(dir: &Path, name: &str) -> Result<Self> {
        let mut set = ResourceSet::new(name);
        let prefix = format!("{}.", name);

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(file_name) = path.file_name().and_then(|f| f.to_str()) else {
                continue;
            };
            let Some(stem) = file_name.strip_suffix(".json") else {
                continue;
            };
            let culture = if stem == name {
                ""
            } else {
                match stem.strip_prefix(&prefix) {
                    Some(culture) => culture,
                    None => continue,
                }
            };

            let raw = std::fs::read_to_string(&path)?;
            let entries: BTreeMap<String, String> = serde_json::from_str(&raw)?;
            debug!(
                "Loaded {} '{}' strings for culture '{}'",
                entries.len(),
                name,
                culture
            );
            set = set.with_bundle(culture, entries);
        }

        info!(
            "Loaded '{}' resources for {} culture(s) from {}",
            name,
            set.bundles.len(),
            dir.display()
        );
        Ok(set)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cultures with a bundle, lowercased; the neutral bundle is `""`.
    pub fn cultures(&self) -> Vec<&str> {
        let mut cultures: Vec<&str> = self.bundles.keys().map(String::as_str).collect();
        cultures.sort_unstable();
        cultures
    }

    /// Bundles visible to `culture`, most specific first.
    fn chain(&self, culture: &str) -> Vec<&BTreeMap<String, String>> {
        let culture = culture.to_ascii_lowercase();
        let mut names = Vec::new();
        let mut current = Some(culture.as_str());
        while let Some(name) = current {
            if !name.is_empty() {
                names.push(name.to_string());
            }
            current = parent_culture(name);
        }
        names.push(String::new());

        names
            .iter()
            .filter_map(|name| self.bundles.get(name))
            .collect()
    }
}

impl StringLookup for ResourceSet {
    fn get(&self, culture: &str, key: &str) -> Option<String> {
        self.chain(culture)
            .into_iter()
            .find_map(|bundle| bundle.get(key).cloned())
    }

    fn all_strings(&self, culture: &str) -> Result<Vec<(String, String)>> {
        let chain = self.chain(culture);
        if chain.is_empty() {
            return Err(LocalizationError::MissingResources {
                resource: self.name.clone(),
                culture: culture.to_string(),
            });
        }

        let mut seen = HashSet::new();
        let mut strings = Vec::new();
        for bundle in chain {
            for (key, value) in bundle {
                if seen.insert(key.as_str()) {
                    strings.push((key.clone(), value.clone()));
                }
            }
        }
        Ok(strings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resources() -> ResourceSet {
        ResourceSet::new("Url")
            .with_bundle("es", [("About", "Acerca"), ("Privacy", "Privacidad")])
            .with_bundle("es-MX", [("About", "Nosotros")])
            .with_bundle("", [("Home", "Home")])
    }

    // ==================== Lookup Tests ====================

    #[test]
    fn test_get_exact_culture() {
        assert_eq!(resources().get("es", "About").as_deref(), Some("Acerca"));
    }

    #[test]
    fn test_get_specific_culture_wins() {
        assert_eq!(resources().get("es-MX", "About").as_deref(), Some("Nosotros"));
    }

    #[test]
    fn test_get_falls_back_to_parent() {
        assert_eq!(
            resources().get("es-MX", "Privacy").as_deref(),
            Some("Privacidad")
        );
    }

    #[test]
    fn test_get_culture_is_case_insensitive() {
        assert_eq!(resources().get("ES-mx", "About").as_deref(), Some("Nosotros"));
    }

    #[test]
    fn test_get_keys_are_case_sensitive() {
        assert!(resources().get("es", "about").is_none());
    }

    #[test]
    fn test_get_neutral_fallback() {
        assert_eq!(resources().get("fr", "Home").as_deref(), Some("Home"));
        assert!(resources().get("fr", "About").is_none());
    }

    // ==================== all_strings Tests ====================

    #[test]
    fn test_all_strings_includes_parents_once() {
        let strings = resources().all_strings("es-MX").unwrap();
        let about: Vec<_> = strings.iter().filter(|(k, _)| k == "About").collect();
        assert_eq!(about.len(), 1);
        assert_eq!(about[0].1, "Nosotros");
        assert!(strings.iter().any(|(k, v)| k == "Privacy" && v == "Privacidad"));
        assert!(strings.iter().any(|(k, _)| k == "Home"));
    }

    #[test]
    fn test_all_strings_missing_resources() {
        let set = ResourceSet::new("Url").with_bundle("es", [("About", "Acerca")]);
        let err = set.all_strings("fr").unwrap_err();
        assert!(matches!(err, LocalizationError::MissingResources { .. }));
    }

    // ==================== Loading Tests ====================

    #[test]
    fn test_load_dir_reads_culture_files() {
        let dir = TempDir::new().expect("temp dir");
        std::fs::write(dir.path().join("Url.es.json"), r#"{"About": "Acerca"}"#).unwrap();
        std::fs::write(dir.path().join("Url.fr-CA.json"), r#"{"About": "Apropos"}"#).unwrap();
        std::fs::write(dir.path().join("Url.json"), r#"{"Home": "Home"}"#).unwrap();
        std::fs::write(dir.path().join("Other.es.json"), r#"{"About": "X"}"#).unwrap();

        let set = ResourceSet::load_dir(dir.path(), "Url").unwrap();
        assert_eq!(set.name(), "Url");
        assert_eq!(set.cultures(), vec!["", "es", "fr-ca"]);
        assert_eq!(set.get("es", "About").as_deref(), Some("Acerca"));
        assert_eq!(set.get("fr-CA", "About").as_deref(), Some("Apropos"));
    }

    #[test]
    fn test_load_dir_rejects_invalid_json() {
        let dir = TempDir::new().expect("temp dir");
        std::fs::write(dir.path().join("Url.es.json"), "not json").unwrap();

        let err = ResourceSet::load_dir(dir.path(), "Url").unwrap_err();
        assert!(matches!(err, LocalizationError::Json(_)));
    }

    #[test]
    fn test_load_dir_missing_directory() {
        let err = ResourceSet::load_dir(Path::new("/nonexistent/resources"), "Url").unwrap_err();
        assert!(matches!(err, LocalizationError::Io(_)));
    }
}
