//! Request culture resolution.
//!
//! A [`CultureResolver`] runs an ordered chain of [`RequestCultureProvider`]s
//! and settles on the first culture that is supported, falling back to parent
//! cultures (`es-MX` → `es`) and finally to the default culture.

use super::{parent_culture, CultureConstraint};
use std::sync::Arc;
use tracing::debug;

/// The parts of an incoming request providers may inspect.
#[derive(Debug, Clone, Copy)]
pub struct RequestView<'a> {
    /// Request path, always starting with `/`
    pub path: &'a str,
    /// Raw query string without the leading `?`
    pub query: Option<&'a str>,
}

/// Culture names a provider extracted from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCultureResult {
    pub culture: String,
    pub ui_culture: String,
}

impl ProviderCultureResult {
    /// Same culture for formatting and UI strings.
    pub fn new(culture: impl Into<String>) -> Self {
        let culture = culture.into();
        Self {
            ui_culture: culture.clone(),
            culture,
        }
    }
}

/// One link of the culture resolution chain.
pub trait RequestCultureProvider: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    fn determine(&self, request: &RequestView<'_>) -> Option<ProviderCultureResult>;
}

/// Reads the culture from the first path segment, e.g. `/fr/about`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlCultureProvider;

impl RequestCultureProvider for UrlCultureProvider {
    fn name(&self) -> &'static str {
        "url"
    }

    fn determine(&self, request: &RequestView<'_>) -> Option<ProviderCultureResult> {
        // Shortest culture path is "/xx"
        if request.path.len() < 3 {
            return None;
        }

        let segment = request.path.split('/').nth(1)?;
        CultureConstraint::matches(segment).then(|| ProviderCultureResult::new(segment))
    }
}

/// Culture settled on for a request, stored in the request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestCulture {
    /// Culture used for formatting and for culture redirects
    pub culture: String,
    /// Culture used for string lookups (path segment translation)
    pub ui_culture: String,
    /// Name of the provider that produced the culture, `None` for the default
    pub provider: Option<&'static str>,
}

/// Ordered provider chain restricted to a set of supported cultures.
pub struct CultureResolver {
    default_culture: String,
    supported_cultures: Vec<String>,
    providers: Vec<Arc<dyn RequestCultureProvider>>,
}

impl CultureResolver {
    pub fn new(default_culture: impl Into<String>, supported_cultures: Vec<String>) -> Self {
        Self {
            default_culture: default_culture.into(),
            supported_cultures,
            providers: Vec::new(),
        }
    }

    /// Append a provider to the end of the chain.
    pub fn with_provider(mut self, provider: Arc<dyn RequestCultureProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn default_culture(&self) -> &str {
        &self.default_culture
    }

    pub fn supported_cultures(&self) -> &[String] {
        &self.supported_cultures
    }

    /// Find the supported spelling of `culture`, trying parent cultures.
    ///
    /// # Example
    /// ```
    /// use url_localization::culture::CultureResolver;
    ///
    /// let resolver = CultureResolver::new("en-US", vec!["en-US".into(), "es".into()]);
    /// assert_eq!(resolver.supported("ES-mx"), Some("es"));
    /// assert_eq!(resolver.supported("fr"), None);
    /// ```
    pub fn supported(&self, culture: &str) -> Option<&str> {
        let mut candidate = Some(culture);
        while let Some(name) = candidate {
            if let Some(found) = self
                .supported_cultures
                .iter()
                .find(|supported| supported.eq_ignore_ascii_case(name))
            {
                return Some(found.as_str());
            }
            candidate = parent_culture(name);
        }
        None
    }

    /// Run the provider chain for a request.
    pub fn resolve(&self, request: &RequestView<'_>) -> RequestCulture {
        for provider in &self.providers {
            let Some(result) = provider.determine(request) else {
                continue;
            };

            let culture = self.supported(&result.culture);
            let ui_culture = self.supported(&result.ui_culture);
            if culture.is_none() && ui_culture.is_none() {
                debug!(
                    "Provider '{}' found unsupported culture '{}' for {}",
                    provider.name(),
                    result.culture,
                    request.path
                );
                continue;
            }

            return RequestCulture {
                culture: culture.unwrap_or(self.default_culture.as_str()).to_string(),
                ui_culture: ui_culture.unwrap_or(self.default_culture.as_str()).to_string(),
                provider: Some(provider.name()),
            };
        }

        RequestCulture {
            culture: self.default_culture.clone(),
            ui_culture: self.default_culture.clone(),
            provider: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(path: &str) -> RequestView<'_> {
        RequestView { path, query: None }
    }

    fn resolver() -> CultureResolver {
        CultureResolver::new(
            "en-US",
            vec!["en-US".to_string(), "es".to_string(), "fr".to_string()],
        )
        .with_provider(Arc::new(UrlCultureProvider))
    }

    struct FixedProvider(&'static str);

    impl RequestCultureProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn determine(&self, _request: &RequestView<'_>) -> Option<ProviderCultureResult> {
            Some(ProviderCultureResult::new(self.0))
        }
    }

    // ==================== UrlCultureProvider Tests ====================

    #[test]
    fn test_url_provider_reads_first_segment() {
        let result = UrlCultureProvider.determine(&view("/fr/about"));
        assert_eq!(result, Some(ProviderCultureResult::new("fr")));
    }

    #[test]
    fn test_url_provider_culture_only_path() {
        let result = UrlCultureProvider.determine(&view("/es"));
        assert_eq!(result, Some(ProviderCultureResult::new("es")));
    }

    #[test]
    fn test_url_provider_ignores_short_paths() {
        assert!(UrlCultureProvider.determine(&view("/")).is_none());
        assert!(UrlCultureProvider.determine(&view("/e")).is_none());
    }

    #[test]
    fn test_url_provider_ignores_non_culture_segment() {
        assert!(UrlCultureProvider.determine(&view("/about/fr")).is_none());
    }

    // ==================== CultureResolver Tests ====================

    #[test]
    fn test_resolve_supported_url_culture() {
        let culture = resolver().resolve(&view("/fr/about"));
        assert_eq!(culture.culture, "fr");
        assert_eq!(culture.ui_culture, "fr");
        assert_eq!(culture.provider, Some("url"));
    }

    #[test]
    fn test_resolve_uses_supported_spelling() {
        let culture = resolver().resolve(&view("/EN-us/about"));
        assert_eq!(culture.culture, "en-US");
    }

    #[test]
    fn test_resolve_falls_back_to_parent_culture() {
        let culture = resolver().resolve(&view("/es-MX/about"));
        assert_eq!(culture.culture, "es");
    }

    #[test]
    fn test_resolve_unsupported_falls_to_default() {
        let culture = resolver().resolve(&view("/de/about"));
        assert_eq!(culture.culture, "en-US");
        assert_eq!(culture.provider, None);
    }

    #[test]
    fn test_resolve_without_culture_segment() {
        let culture = resolver().resolve(&view("/about"));
        assert_eq!(culture.culture, "en-US");
    }

    #[test]
    fn test_resolve_tries_next_provider() {
        let resolver = resolver().with_provider(Arc::new(FixedProvider("es")));
        let culture = resolver.resolve(&view("/de/about"));
        assert_eq!(culture.culture, "es");
        assert_eq!(culture.provider, Some("fixed"));
    }

    #[test]
    fn test_first_provider_wins() {
        let resolver = resolver().with_provider(Arc::new(FixedProvider("es")));
        let culture = resolver.resolve(&view("/fr"));
        assert_eq!(culture.culture, "fr");
    }
}
