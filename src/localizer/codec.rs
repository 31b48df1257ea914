use super::lookup::StringLookup;
use super::reverse::{ReverseIndex, ReverseLookupCache};
use super::text::title_case;
use crate::metrics::LocalizationMetrics;
use std::sync::Arc;
use tracing::{debug, warn};

/// Translates URL paths between canonical route values and localized segments.
///
/// `localize` maps `/es/about` to `/es/acerca`; `unlocalize` maps it back.
/// Paths are split on `/` and rejoined, so the number and position of
/// separators never changes.
pub struct UrlLocalizer {
    lookup: Arc<dyn StringLookup>,
    reverse: Arc<ReverseLookupCache>,
    metrics: Arc<LocalizationMetrics>,
    lowercase_urls: bool,
}

impl UrlLocalizer {
    pub fn new(lookup: Arc<dyn StringLookup>, reverse: Arc<ReverseLookupCache>) -> Self {
        Self {
            lookup,
            reverse,
            metrics: Arc::new(LocalizationMetrics::new()),
            lowercase_urls: false,
        }
    }

    /// Lowercase unlocalized segments, matching lowercase route generation.
    pub fn with_lowercase_urls(mut self, lowercase_urls: bool) -> Self {
        self.lowercase_urls = lowercase_urls;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<LocalizationMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn reverse_cache(&self) -> &Arc<ReverseLookupCache> {
        &self.reverse
    }

    /// Translate every segment of `path` into `culture`.
    ///
    /// A segment is looked up as-is first; when that finds nothing it is
    /// looked up title-cased and the translation is lowercased.
    pub fn localize(&self, path: &str, culture: &str) -> String {
        path.split('/')
            .map(|segment| self.localize_segment(segment, culture))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Localize a generated link that may be absent. Only the path part is
    /// translated; a query string or fragment is carried over untouched.
    pub fn localize_link(&self, link: Option<String>, culture: &str) -> Option<String> {
        link.map(|link| match link.find(['?', '#']) {
            Some(index) => {
                let (path, rest) = link.split_at(index);
                format!("{}{}", self.localize(path, culture), rest)
            }
            None => self.localize(&link, culture),
        })
    }

    fn localize_segment(&self, segment: &str, culture: &str) -> String {
        if let Some(translated) = self.lookup.get(culture, segment) {
            if !translated.eq_ignore_ascii_case(segment) {
                return translated;
            }
        }

        let titled = title_case(segment);
        match self.lookup.get(culture, &titled) {
            Some(translated) if !translated.eq_ignore_ascii_case(&titled) => translated.to_lowercase(),
            _ => segment.to_string(),
        }
    }

    /// Map every localized segment of `path` back to its canonical key.
    pub fn unlocalize(&self, path: &str, culture: &str) -> String {
        let index = self.reverse_index(culture);

        path.split('/')
            .map(|segment| {
                let canonical = index
                    .get(segment)
                    .or_else(|| index.get(&title_case(segment)))
                    .unwrap_or(segment);
                if self.lowercase_urls {
                    canonical.to_lowercase()
                } else {
                    canonical.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    fn reverse_index(&self, culture: &str) -> Arc<ReverseIndex> {
        let (index, built) = self.reverse.get_or_build(culture, || {
            match self.lookup.all_strings(culture) {
                Ok(strings) => ReverseIndex::from_pairs(strings),
                Err(e) => {
                    warn!("Failed to build reverse lookup for '{}': {}", culture, e);
                    self.metrics.record_index_build_failure();
                    ReverseIndex::default()
                }
            }
        });

        if built {
            debug!(
                "Built reverse lookup for '{}' with {} entries",
                culture,
                index.len()
            );
            self.metrics.record_index_build();
        } else {
            self.metrics.record_index_cache_hit();
        }
        index
    }
}
