//! Localization metrics and observability module.
//!
//! Tracks how often reverse indexes are built and reused, and how many
//! requests were redirected or rewritten by the middleware.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters shared by the localizer and the middleware.
#[derive(Debug, Default)]
pub struct LocalizationMetrics {
    /// Reverse indexes built (one per UI culture until the cache is cleared)
    index_builds: AtomicUsize,

    /// Reverse index builds that failed and fell back to an empty index
    index_build_failures: AtomicUsize,

    /// Reverse index lookups served from the cache
    index_cache_hits: AtomicUsize,

    /// Requests redirected to a corrected culture path
    culture_redirects: AtomicUsize,

    /// Requests redirected to (or rejected for lacking) a localized path
    localized_redirects: AtomicUsize,

    /// Request paths rewritten to their canonical form
    path_rewrites: AtomicUsize,
}

impl LocalizationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_index_build(&self) {
        self.index_builds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_index_build_failure(&self) {
        self.index_build_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_index_cache_hit(&self) {
        self.index_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_culture_redirect(&self) {
        self.culture_redirects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_localized_redirect(&self) {
        self.localized_redirects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_path_rewrite(&self) {
        self.path_rewrites.fetch_add(1, Ordering::Relaxed);
    }

    pub fn index_builds(&self) -> usize {
        self.index_builds.load(Ordering::Relaxed)
    }

    pub fn index_build_failures(&self) -> usize {
        self.index_build_failures.load(Ordering::Relaxed)
    }

    pub fn index_cache_hits(&self) -> usize {
        self.index_cache_hits.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let builds = self.index_builds();
        let hits = self.index_cache_hits();
        let total_lookups = builds + hits;
        let index_hit_rate = if total_lookups > 0 {
            (hits as f64 / total_lookups as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            index_builds: builds,
            index_build_failures: self.index_build_failures(),
            index_cache_hits: hits,
            index_hit_rate,
            culture_redirects: self.culture_redirects.load(Ordering::Relaxed),
            localized_redirects: self.localized_redirects.load(Ordering::Relaxed),
            path_rewrites: self.path_rewrites.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`LocalizationMetrics`], serialized by the metrics endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub index_builds: usize,
    pub index_build_failures: usize,
    pub index_cache_hits: usize,
    /// Percentage of reverse index lookups served from the cache
    pub index_hit_rate: f64,
    pub culture_redirects: usize,
    pub localized_redirects: usize,
    pub path_rewrites: usize,
}
