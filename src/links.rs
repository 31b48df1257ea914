//! Localized outbound links.

use crate::localizer::UrlLocalizer;
use crate::routing::{LinkContext, LinkGenerator, RouteValues};
use std::sync::Arc;

/// Generates links and translates them into the request's UI culture.
///
/// Pair it with [`AmbientLinkGenerator`](crate::ambient::AmbientLinkGenerator)
/// so the culture of the current request flows into every link:
///
/// ```
/// use std::sync::Arc;
/// use url_localization::ambient::{AmbientLinkGenerator, AmbientRouteDataKey};
/// use url_localization::convention::*;
/// use url_localization::culture::CultureConstraint;
/// use url_localization::links::UrlHelper;
/// use url_localization::localizer::{ResourceSet, ReverseLookupCache, UrlLocalizer};
/// use url_localization::routing::*;
///
/// let mut app = ApplicationModel::new(vec![ControllerModel::new("Home", vec![Selector::attribute("")])
///     .with_action(ActionModel::new("About", vec![Selector::attribute("about")]))]);
/// CultureRouteConvention::new(PrefixMode::Optional, "culture", Some("cultureCheck")).apply(&mut app);
/// let constraints = ConstraintMap::new().with("cultureCheck", Arc::new(CultureConstraint));
/// let table = Arc::new(RouteTable::build(&app, constraints).unwrap());
///
/// let generator = AmbientLinkGenerator::new(
///     RouteLinkGenerator::new(table).with_lowercase_urls(true),
///     vec![AmbientRouteDataKey::new("culture", true)],
/// );
/// let resources = ResourceSet::new("Url").with_bundle("es", [("About", "Acerca")]);
/// let localizer = UrlLocalizer::new(Arc::new(resources), Arc::new(ReverseLookupCache::new()));
/// let helper = UrlHelper::new(generator, Arc::new(localizer));
///
/// let ambient: RouteValues = [("controller", "Home"), ("action", "Index"), ("culture", "es")]
///     .into_iter()
///     .collect();
/// let context = LinkContext { ambient: &ambient, query: &[] };
/// let values: RouteValues = [("action", "About")].into_iter().collect();
/// assert_eq!(helper.action(&values, &context, "es").as_deref(), Some("/es/acerca"));
/// ```
pub struct UrlHelper<G> {
    generator: G,
    localizer: Arc<UrlLocalizer>,
}

impl<G: LinkGenerator> UrlHelper<G> {
    pub fn new(generator: G, localizer: Arc<UrlLocalizer>) -> Self {
        Self {
            generator,
            localizer,
        }
    }

    /// Link to an action, localized into `ui_culture`.
    pub fn action(
        &self,
        values: &RouteValues,
        context: &LinkContext<'_>,
        ui_culture: &str,
    ) -> Option<String> {
        let link = self.generator.path_by_values(values, context);
        self.localizer.localize_link(link, ui_culture)
    }

    /// Link to an action without translation.
    pub fn route_url(&self, values: &RouteValues, context: &LinkContext<'_>) -> Option<String> {
        self.generator.path_by_values(values, context)
    }

    /// Resolve an app-relative `~/` path against the path base.
    pub fn content(&self, path_base: &str, content_path: &str) -> String {
        match content_path.strip_prefix('~') {
            Some(rest) if rest.starts_with('/') => format!("{}{}", path_base, rest),
            _ => content_path.to_string(),
        }
    }

    pub fn is_local_url(&self, url: &str) -> bool {
        is_local_url(url)
    }
}

/// Whether `url` stays on this site: `/path` or `~/path`, never `//host`
/// or `/\host`.
pub fn is_local_url(url: &str) -> bool {
    let path = match url.strip_prefix('~') {
        Some(rest) => rest,
        None => url,
    };
    let mut chars = path.chars();
    match (chars.next(), chars.next()) {
        (Some('/'), None) => true,
        (Some('/'), Some(second)) => second != '/' && second != '\\',
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localizer::{ResourceSet, ReverseLookupCache};

    /// Returns a fixed link for any values.
    struct FixedGenerator(Option<&'static str>);

    impl LinkGenerator for FixedGenerator {
        fn path_by_values(&self, _values: &RouteValues, _context: &LinkContext<'_>) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn helper(link: Option<&'static str>) -> UrlHelper<FixedGenerator> {
        let resources = ResourceSet::new("Url")
            .with_bundle("es", [("About", "Acerca"), ("Privacy", "Privacidad")]);
        let localizer = UrlLocalizer::new(Arc::new(resources), Arc::new(ReverseLookupCache::new()));
        UrlHelper::new(FixedGenerator(link), Arc::new(localizer))
    }

    fn context(ambient: &RouteValues) -> LinkContext<'_> {
        LinkContext {
            ambient,
            query: &[],
        }
    }

    // ==================== Action Tests ====================

    #[test]
    fn test_action_localizes_generated_link() {
        let ambient = RouteValues::new();
        let link = helper(Some("/es/privacy?ui-culture=es")).action(&RouteValues::new(), &context(&ambient), "es");
        assert_eq!(link.as_deref(), Some("/es/privacidad?ui-culture=es"));
    }

    #[test]
    fn test_action_without_translation_unchanged() {
        let ambient = RouteValues::new();
        let link = helper(Some("/fr/about")).action(&RouteValues::new(), &context(&ambient), "fr");
        assert_eq!(link.as_deref(), Some("/fr/about"));
    }

    #[test]
    fn test_action_absent_link() {
        let ambient = RouteValues::new();
        assert_eq!(helper(None).action(&RouteValues::new(), &context(&ambient), "es"), None);
    }

    #[test]
    fn test_route_url_not_localized() {
        let ambient = RouteValues::new();
        let link = helper(Some("/es/about")).route_url(&RouteValues::new(), &context(&ambient));
        assert_eq!(link.as_deref(), Some("/es/about"));
    }

    // ==================== Content and Local URL Tests ====================

    #[test]
    fn test_content_resolves_tilde() {
        let helper = helper(None);
        assert_eq!(helper.content("/app", "~/css/site.css"), "/app/css/site.css");
        assert_eq!(helper.content("", "~/"), "/");
        assert_eq!(helper.content("/app", "/css/site.css"), "/css/site.css");
    }

    #[test]
    fn test_is_local_url() {
        assert!(is_local_url("/"));
        assert!(is_local_url("/es/about?x=1"));
        assert!(is_local_url("~/about"));
        assert!(!is_local_url("//evil.example"));
        assert!(!is_local_url("/\\evil.example"));
        assert!(!is_local_url("https://evil.example"));
        assert!(!is_local_url(""));
    }
}
