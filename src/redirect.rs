//! Culture mismatch redirects.
//!
//! When the culture named in the URL is not the culture the request resolved
//! to (because it is unsupported, or only its parent is), the request is
//! redirected to the same path with the culture segment corrected.

use crate::culture::CultureConstraint;
use crate::routing::RouteValues;
use tracing::debug;

/// Redirect behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectOptions {
    /// Keep the default culture in redirect targets instead of dropping it
    pub redirect_culture_less_to_default: bool,
    /// Redirect when the URL culture differs from the resolved culture
    pub redirect_unsupported_cultures: bool,
}

impl Default for RedirectOptions {
    fn default() -> Self {
        Self {
            redirect_culture_less_to_default: false,
            redirect_unsupported_cultures: true,
        }
    }
}

/// Outcome of checking a request's URL culture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectDecision {
    Pass,
    Redirect(String),
}

/// The request state a redirect decision depends on.
#[derive(Debug, Clone, Copy)]
pub struct CultureRequest<'a> {
    pub path_base: &'a str,
    pub path: &'a str,
    /// Raw query string without the leading `?`
    pub query: Option<&'a str>,
    /// Culture the request resolved to, if resolution ran
    pub resolved_culture: Option<&'a str>,
    /// Route values, when routing already ran
    pub route_values: Option<&'a RouteValues>,
}

/// Culture named by the first path segment, ignoring any query string.
pub fn requested_culture_from_path(path: &str) -> Option<&str> {
    let path = path.split('?').next().unwrap_or_default();
    path.split('/')
        .nth(1)
        .filter(|segment| CultureConstraint::matches(segment))
}

/// Decides culture redirects and computes corrected paths.
#[derive(Debug, Clone)]
pub struct CultureRedirector {
    options: RedirectOptions,
    default_culture: Option<String>,
    lowercase_urls: bool,
    route_culture_key: Option<String>,
}

impl CultureRedirector {
    pub fn new(options: RedirectOptions) -> Self {
        Self {
            options,
            default_culture: None,
            lowercase_urls: false,
            route_culture_key: None,
        }
    }

    pub fn with_default_culture(mut self, culture: impl Into<String>) -> Self {
        self.default_culture = Some(culture.into());
        self
    }

    pub fn with_lowercase_urls(mut self, lowercase_urls: bool) -> Self {
        self.lowercase_urls = lowercase_urls;
        self
    }

    /// Read the requested culture from this route value when the request
    /// matched a route, instead of scanning the path.
    pub fn with_route_culture_key(mut self, key: impl Into<String>) -> Self {
        self.route_culture_key = Some(key.into());
        self
    }

    pub fn options(&self) -> RedirectOptions {
        self.options
    }

    /// Culture the URL asks for.
    pub fn requested_culture<'a>(
        &self,
        path: &'a str,
        route_values: Option<&'a RouteValues>,
    ) -> Option<&'a str> {
        match (self.route_culture_key.as_deref(), route_values) {
            (Some(key), Some(values)) => values.get(key),
            _ => requested_culture_from_path(path),
        }
    }

    pub fn decide(&self, request: &CultureRequest<'_>) -> RedirectDecision {
        if !self.options.redirect_unsupported_cultures {
            return RedirectDecision::Pass;
        }

        let Some(requested) = self
            .requested_culture(request.path, request.route_values)
            .filter(|culture| !culture.is_empty())
        else {
            return RedirectDecision::Pass;
        };
        let Some(resolved) = request.resolved_culture else {
            return RedirectDecision::Pass;
        };
        if requested.eq_ignore_ascii_case(resolved) {
            return RedirectDecision::Pass;
        }

        let path_and_query = match request.query {
            Some(query) => format!("{}?{}", request.path, query),
            None => request.path.to_string(),
        };
        let target =
            self.compute_new_path(request.path_base, &path_and_query, Some(requested), resolved);
        debug!(
            "URL culture '{}' resolved to '{}', redirecting to {}",
            requested, resolved, target
        );
        RedirectDecision::Redirect(target)
    }

    /// Rewrite `path_and_query` so its culture segment names `new_culture`.
    ///
    /// The default culture is dropped from the path unless culture-less paths
    /// redirect to the default culture. Only the first occurrence of the
    /// requested culture is replaced.
    pub fn compute_new_path(
        &self,
        path_base: &str,
        path_and_query: &str,
        requested_culture: Option<&str>,
        new_culture: &str,
    ) -> String {
        let mut new_culture = if self.lowercase_urls {
            new_culture.to_lowercase()
        } else {
            new_culture.to_string()
        };

        let suppressed = !self.options.redirect_culture_less_to_default
            && self
                .default_culture
                .as_deref()
                .is_some_and(|default| default.eq_ignore_ascii_case(&new_culture));
        let culture_path = if suppressed {
            new_culture.clear();
            String::new()
        } else {
            format!("/{}", new_culture)
        };

        match requested_culture.filter(|culture| !culture.is_empty()) {
            None => {
                let mut remaining = path_and_query;
                if !culture_path.is_empty() && (remaining == "/" || remaining.starts_with("/?")) {
                    remaining = &remaining[1..];
                }
                format!("{}{}{}", path_base, culture_path, remaining)
            }
            Some(requested) => {
                let replaced = replace_first_ignore_case(path_and_query, requested, &new_culture);
                format!("{}{}", path_base, replaced.replace("//", "/"))
            }
        }
    }

    /// Target for switching the culture of `return_url`, e.g. from a
    /// "change language" action.
    pub fn cultured_redirect_url(&self, path_base: &str, return_url: &str, culture: &str) -> String {
        let requested = requested_culture_from_path(return_url);
        self.compute_new_path(path_base, return_url, requested, culture)
    }
}

fn replace_first_ignore_case(source: &str, find: &str, replacement: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `source`
    let index = source
        .to_ascii_lowercase()
        .find(&find.to_ascii_lowercase());
    match index {
        Some(index) => format!(
            "{}{}{}",
            &source[..index],
            replacement,
            &source[index + find.len()..]
        ),
        None => source.to_string(),
    }
}
