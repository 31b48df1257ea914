//! HTTP pipeline stages.
//!
//! Layer order matters: `request_localization` must run first since the other
//! stages read the [`RequestCulture`] it stores in the request extensions.
//! `route_values` then stores the matched [`RouteValues`] for the redirect
//! stage.
//!
//! ```text
//! request_localization → route_values → redirect_unsupported_cultures
//!     → url_unlocalization → router
//! ```

use crate::config::NonLocalizedUrlHandling;
use crate::culture::{CultureConstraint, CultureResolver, RequestCulture, RequestView};
use crate::localizer::UrlLocalizer;
use crate::metrics::LocalizationMetrics;
use crate::redirect::{CultureRedirector, CultureRequest, RedirectDecision};
use crate::routing::{RouteTable, RouteValues};
use axum::{
    extract::{Request, State},
    http::{header, uri::PathAndQuery, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, warn};

/// Characters escaped when a localized path goes back into a URI.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Marks a request whose path already went through [`url_unlocalization`].
#[derive(Debug, Clone, Copy)]
pub struct UrlUnlocalized;

/// Everything the pipeline stages share.
pub struct LocalizationState {
    pub resolver: CultureResolver,
    pub redirector: CultureRedirector,
    pub localizer: Arc<UrlLocalizer>,
    pub non_localized_url_handling: NonLocalizedUrlHandling,
    pub metrics: Arc<LocalizationMetrics>,
    /// Prefix the app is mounted under, prepended to redirect targets
    pub path_base: String,
    pub lowercase_urls: bool,
}

impl LocalizationState {
    fn request_culture(&self, request: &Request) -> RequestCulture {
        match request.extensions().get::<RequestCulture>() {
            Some(culture) => culture.clone(),
            None => RequestCulture {
                culture: self.resolver.default_culture().to_string(),
                ui_culture: self.resolver.default_culture().to_string(),
                provider: None,
            },
        }
    }
}

/// Resolve the request culture and store it in the request extensions.
pub async fn request_localization(
    State(state): State<Arc<LocalizationState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let culture = {
        let uri = request.uri();
        state.resolver.resolve(&RequestView {
            path: uri.path(),
            query: uri.query(),
        })
    };
    debug!(
        "Resolved culture '{}' (ui '{}') for {} via {}",
        culture.culture,
        culture.ui_culture,
        request.uri().path(),
        culture.provider.unwrap_or("default")
    );

    request.extensions_mut().insert(culture);
    next.run(request).await
}

/// Route table lookup for [`route_values`].
pub struct RouteData {
    pub table: Arc<RouteTable>,
    pub localizer: Arc<UrlLocalizer>,
}

/// Match the request path against the route table and store the route
/// values in the request extensions.
///
/// A path with localized segments is matched in its canonical form under the
/// request UI culture. Nothing is stored when no route matches.
pub async fn route_values(
    State(routes): State<Arc<RouteData>>,
    mut request: Request,
    next: Next,
) -> Response {
    let values = {
        let path = decode_path(request.uri().path()).into_owned();
        let method = request.method();
        routes
            .table
            .match_route(method, &path)
            .map(|route| route.values)
            .or_else(|| {
                let ui_culture = &request.extensions().get::<RequestCulture>()?.ui_culture;
                let canonical = routes.localizer.unlocalize(&path, ui_culture);
                routes
                    .table
                    .match_route(method, &canonical)
                    .map(|route| route.values)
            })
    };

    if let Some(values) = values {
        debug!("Matched route values {:?} for {}", values, request.uri().path());
        request.extensions_mut().insert(values);
    }
    next.run(request).await
}

/// Redirect when the culture in the URL is not the culture the request
/// resolved to.
pub async fn redirect_unsupported_cultures(
    State(state): State<Arc<LocalizationState>>,
    request: Request,
    next: Next,
) -> Response {
    let decision = {
        let uri = request.uri();
        let resolved = request.extensions().get::<RequestCulture>();
        state.redirector.decide(&CultureRequest {
            path_base: &state.path_base,
            path: uri.path(),
            query: uri.query(),
            resolved_culture: resolved.map(|culture| culture.culture.as_str()),
            route_values: request.extensions().get::<RouteValues>(),
        })
    };

    match decision {
        RedirectDecision::Pass => next.run(request).await,
        RedirectDecision::Redirect(target) => {
            state.metrics.record_culture_redirect();
            found(&target)
        }
    }
}

/// Map a localized request path back to its canonical form.
///
/// Depending on [`NonLocalizedUrlHandling`], a canonical path that has a
/// localized form is first redirected to it or rejected with 404. Runs at
/// most once per request.
pub async fn url_unlocalization(
    State(state): State<Arc<LocalizationState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.extensions().get::<UrlUnlocalized>().is_some() {
        return next.run(request).await;
    }
    request.extensions_mut().insert(UrlUnlocalized);

    let ui_culture = state.request_culture(&request).ui_culture;
    let path = decode_path(request.uri().path()).into_owned();

    if state.non_localized_url_handling != NonLocalizedUrlHandling::ContinueProcessing {
        let localized = state.localizer.localize(&path, &ui_culture);
        if !eq_ignore_case(&localized, &path) {
            state.metrics.record_localized_redirect();
            if state.non_localized_url_handling == NonLocalizedUrlHandling::NotFound {
                debug!("{} is not localized for '{}'", path, ui_culture);
                return StatusCode::NOT_FOUND.into_response();
            }

            let query = request
                .uri()
                .query()
                .map(|query| format!("?{}", query))
                .unwrap_or_default();
            let target = format!("{}{}{}", state.path_base, encode_path(&localized), query);
            debug!("Redirecting {} to localized {}", path, target);
            return found(&target);
        }
    }

    let unlocalized = state.localizer.unlocalize(&path, &ui_culture);
    if !eq_ignore_case(&unlocalized, &path) {
        match with_path(request.uri(), &encode_path(&unlocalized)) {
            Some(uri) => {
                debug!("Rewrote {} to {}", path, unlocalized);
                state.metrics.record_path_rewrite();
                *request.uri_mut() = uri;
            }
            None => warn!("Could not rewrite {} to {}", path, unlocalized),
        }
    }

    next.run(request).await
}

/// Response for a request no route matched when every route requires a
/// culture prefix.
///
/// Paths that already start with a culture get 404; anything else is
/// redirected under the request culture.
pub fn culture_less_response(state: &LocalizationState, request: &Request) -> Response {
    let path = request.uri().path();
    let first = path.trim_start_matches('/').split('/').next().unwrap_or_default();
    if CultureConstraint::matches(first) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let mut culture = state.request_culture(request).culture;
    if state.lowercase_urls {
        culture = culture.to_lowercase();
    }
    let rest = path.trim_start_matches('/');
    let rest = if rest.is_empty() {
        String::new()
    } else {
        format!("/{}", rest)
    };
    let query = request
        .uri()
        .query()
        .map(|query| format!("?{}", query))
        .unwrap_or_default();

    let target = format!("{}/{}{}{}", state.path_base, culture, rest, query);
    debug!("Redirecting culture-less {} to {}", path, target);
    state.metrics.record_culture_redirect();
    found(&target)
}

/// Router fallback form of [`culture_less_response`].
pub async fn culture_less_fallback(
    State(state): State<Arc<LocalizationState>>,
    request: Request,
) -> Response {
    culture_less_response(&state, &request)
}

/// 302 to `location`.
pub fn found(location: &str) -> Response {
    let location = if location.is_empty() { "/" } else { location };
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn decode_path(path: &str) -> Cow<'_, str> {
    percent_decode_str(path).decode_utf8_lossy()
}

fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_SEGMENT).to_string()
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

fn with_path(uri: &Uri, path: &str) -> Option<Uri> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);
    Uri::from_parts(parts).ok()
}
