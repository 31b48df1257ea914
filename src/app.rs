//! Demo site wiring the engine into an axum router.
//!
//! A `Home` controller (index, about, privacy, faq, culture, language switch) and a
//! `Products` controller, routed through the culture-prefixed route table and
//! rendered with localized links.

use crate::ambient::AmbientLinkGenerator;
use crate::config::Config;
use crate::convention::{ActionModel, ApplicationModel, ControllerModel, CultureRouteConvention, Selector};
use crate::culture::{CultureConstraint, CultureResolver, RequestCulture, UrlCultureProvider};
use crate::links::UrlHelper;
use crate::localizer::{ResourceSet, ReverseLookupCache, UrlLocalizer};
use crate::metrics::{LocalizationMetrics, MetricsReport};
use crate::middleware::{
    culture_less_response, found, redirect_unsupported_cultures, request_localization,
    route_values, url_unlocalization, LocalizationState, RouteData,
};
use crate::redirect::CultureRedirector;
use crate::routing::{ConstraintMap, LinkContext, RouteLinkGenerator, RouteTable, RouteValues};
use anyhow::{Context, Result};
use axum::{
    extract::{FromRequest, Request, State},
    http::{Method, StatusCode},
    middleware::from_fn_with_state,
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use url::form_urlencoded;

/// Shared handler state.
pub struct Site {
    localization: Arc<LocalizationState>,
    table: Arc<RouteTable>,
    links: UrlHelper<AmbientLinkGenerator<RouteLinkGenerator>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetLanguage {
    culture: String,
    return_url: String,
}

/// Controllers and actions served by the demo site.
pub fn application_model() -> ApplicationModel {
    ApplicationModel::new(vec![
        ControllerModel::new("Home", vec![Selector::attribute("")])
            .with_action(ActionModel::new("Index", vec![Selector::attribute("")]))
            .with_action(ActionModel::new("About", vec![Selector::attribute("about")]))
            .with_action(ActionModel::new("Privacy", vec![Selector::attribute("privacy")]))
            .with_action(ActionModel::new("Faq", vec![Selector::attribute("faq")]))
            .with_action(ActionModel::new(
                "Culture",
                vec![Selector::attribute("culture").with_methods([Method::GET])],
            ))
            .with_action(ActionModel::new(
                "SetLanguageUrl",
                vec![Selector::attribute("set-language-url").with_methods([Method::POST])],
            )),
        ControllerModel::new("Products", vec![Selector::attribute("products")])
            .with_action(ActionModel::new("Index", vec![Selector::attribute("")]))
            .with_action(ActionModel::new("Details", vec![Selector::attribute("{id}")])),
    ])
}

/// Build the site router, mounted under the configured path base.
pub fn build_router(config: &Config, resources: ResourceSet) -> Result<Router> {
    let metrics = Arc::new(LocalizationMetrics::new());
    let localizer = UrlLocalizer::new(Arc::new(resources), Arc::new(ReverseLookupCache::new()))
        .with_lowercase_urls(config.lowercase_urls)
        .with_metrics(Arc::clone(&metrics));
    let localizer = Arc::new(localizer);

    let mut application = application_model();
    let convention = CultureRouteConvention::new(
        config.prefix_mode,
        &config.culture_route_key,
        config.culture_constraint_key.as_deref(),
    );
    convention.apply(&mut application);

    let mut constraints = ConstraintMap::new();
    if let Some(key) = &config.culture_constraint_key {
        constraints = constraints.with(key.clone(), Arc::new(CultureConstraint));
    }
    let table = Arc::new(
        RouteTable::build(&application, constraints).context("Failed to build route table")?,
    );

    let localization = Arc::new(LocalizationState {
        resolver: CultureResolver::new(
            config.default_culture.clone(),
            config.supported_cultures.clone(),
        )
        .with_provider(Arc::new(UrlCultureProvider)),
        redirector: CultureRedirector::new(config.redirect)
            .with_default_culture(config.default_culture.clone())
            .with_lowercase_urls(config.lowercase_urls)
            .with_route_culture_key(config.culture_route_key.clone()),
        localizer: Arc::clone(&localizer),
        non_localized_url_handling: config.non_localized_url_handling,
        metrics,
        path_base: config.path_base.clone(),
        lowercase_urls: config.lowercase_urls,
    });

    let routes = Arc::new(RouteData {
        table: Arc::clone(&table),
        localizer: Arc::clone(&localizer),
    });

    let generator = RouteLinkGenerator::new(Arc::clone(&table))
        .with_path_base(config.path_base.clone())
        .with_lowercase_urls(config.lowercase_urls);
    let site = Arc::new(Site {
        localization: Arc::clone(&localization),
        links: UrlHelper::new(
            AmbientLinkGenerator::new(generator, config.ambient_route_keys.clone()),
            localizer,
        ),
        table,
    });

    info!(
        "Routing {} endpoints with prefix '{}' ({:?})",
        site.table.endpoints().len(),
        convention.culture_prefix(),
        convention.mode()
    );

    let router = Router::new()
        .route("/_metrics", get(metrics_report))
        .fallback(dispatch)
        .with_state(site)
        .layer(from_fn_with_state(Arc::clone(&localization), url_unlocalization))
        .layer(from_fn_with_state(
            Arc::clone(&localization),
            redirect_unsupported_cultures,
        ))
        .layer(from_fn_with_state(routes, route_values))
        .layer(from_fn_with_state(localization, request_localization));

    if config.path_base.is_empty() {
        Ok(router)
    } else {
        Ok(Router::new().nest(&config.path_base, router))
    }
}

async fn metrics_report(State(site): State<Arc<Site>>) -> Json<MetricsReport> {
    Json(site.localization.metrics.report())
}

async fn dispatch(State(site): State<Arc<Site>>, request: Request) -> Response {
    let Some(route) = site.table.match_route(request.method(), request.uri().path()) else {
        if site
            .localization
            .redirector
            .options()
            .redirect_culture_less_to_default
        {
            return culture_less_response(&site.localization, &request);
        }
        return StatusCode::NOT_FOUND.into_response();
    };

    let culture = request
        .extensions()
        .get::<RequestCulture>()
        .cloned()
        .unwrap_or_else(|| {
            let default = site.localization.resolver.default_culture().to_string();
            RequestCulture {
                culture: default.clone(),
                ui_culture: default,
                provider: None,
            }
        });
    let controller = route.endpoint.controller.as_str();
    let action = route.endpoint.action.as_str();

    match (controller, action) {
        ("Home", "Culture") => format!(
            "CurrentCulture:{}, CurrentUICulture:{}",
            culture.culture, culture.ui_culture
        )
        .into_response(),
        ("Home", "SetLanguageUrl") => set_language_url(&site, &culture, request).await,
        _ => {
            let query: Vec<(String, String)> = request
                .uri()
                .query()
                .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
                .unwrap_or_default();
            let context = LinkContext {
                ambient: &route.values,
                query: &query,
            };
            let current = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            Html(render_page(&site, &culture, &route.values, &context, current)).into_response()
        }
    }
}

async fn set_language_url(site: &Site, culture: &RequestCulture, request: Request) -> Response {
    let form = match Form::<SetLanguage>::from_request(request, &()).await {
        Ok(Form(form)) => form,
        Err(rejection) => return rejection.into_response(),
    };
    if !site.links.is_local_url(&form.return_url) {
        return (StatusCode::BAD_REQUEST, "returnUrl must be a local URL").into_response();
    }

    // Translate back to canonical segments before switching cultures
    let return_url = form.return_url.trim_start_matches('~');
    let (path, rest) = match return_url.find(['?', '#']) {
        Some(index) => return_url.split_at(index),
        None => (return_url, ""),
    };
    let canonical = format!(
        "{}{}",
        site.localization.localizer.unlocalize(path, &culture.ui_culture),
        rest
    );

    let target = site.localization.redirector.cultured_redirect_url(
        &site.localization.path_base,
        &canonical,
        &form.culture,
    );
    found(&target)
}

fn render_page(
    site: &Site,
    culture: &RequestCulture,
    values: &RouteValues,
    context: &LinkContext<'_>,
    current: &str,
) -> String {
    let path_base = site.localization.path_base.as_str();
    let mut html = format!(
        "<link rel=\"stylesheet\" href=\"{}\">\n",
        site.links.content(path_base, "~/css/site.css")
    );
    let canonical: RouteValues = [
        ("controller", values.get("controller").unwrap_or_default()),
        ("action", values.get("action").unwrap_or_default()),
    ]
    .into_iter()
    .chain(values.get("id").map(|id| ("id", id)))
    .collect();
    let no_ambient = RouteValues::new();
    let canonical_context = LinkContext {
        ambient: &no_ambient,
        query: &[],
    };
    if let Some(href) = site.links.route_url(&canonical, &canonical_context) {
        html.push_str(&format!("<link rel=\"canonical\" href=\"{}\">\n", href));
    }
    html.push_str(&format!(
        "<h1>{} {}</h1>\n<p>Culture: {} / UI culture: {}</p>\n",
        values.get("controller").unwrap_or_default(),
        values.get("action").unwrap_or_default(),
        culture.culture,
        culture.ui_culture
    ));
    if let Some(id) = values.get("id") {
        html.push_str(&format!("<p>Product {}</p>\n", id));
    }

    html.push_str("<nav>\n");
    for (controller, action) in [
        ("Home", "Index"),
        ("Home", "About"),
        ("Home", "Privacy"),
        ("Products", "Index"),
    ] {
        let link_values: RouteValues = [("controller", controller), ("action", action)]
            .into_iter()
            .collect();
        if let Some(href) = site.links.action(&link_values, context, &culture.ui_culture) {
            html.push_str(&format!("<a href=\"{}\">{}</a>\n", href, action));
        }
    }
    html.push_str("</nav>\n<ul class=\"languages\">\n");

    let redirector = &site.localization.redirector;
    for supported in site.localization.resolver.supported_cultures() {
        let href = redirector.cultured_redirect_url(path_base, current, supported);
        let href = site
            .localization
            .localizer
            .localize_link(Some(href), supported)
            .unwrap_or_default();
        html.push_str(&format!("<li><a href=\"{}\">{}</a></li>\n", href, supported));
    }
    html.push_str("</ul>\n");
    html
}
