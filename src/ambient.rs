//! Ambient route value propagation for outbound links.
//!
//! Some route values (an area, the culture, a UI culture) should follow the
//! user from page to page even when a link does not mention them. The
//! [`AmbientLinkGenerator`] fills them in from the current request before
//! delegating to the real generator.

use crate::routing::{query_pairs, LinkContext, LinkGenerator, RouteValues};
use tracing::debug;

/// A route key carried from the current request into generated links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbientRouteDataKey {
    pub key: String,
    /// Whether the value may end up in the query string when no route
    /// segment consumes it
    pub round_trip_via_query_string: bool,
}

impl AmbientRouteDataKey {
    pub fn new(key: impl Into<String>, round_trip_via_query_string: bool) -> Self {
        Self {
            key: key.into(),
            round_trip_via_query_string,
        }
    }
}

/// Link generator decorator that propagates ambient route values.
pub struct AmbientLinkGenerator<G> {
    inner: G,
    keys: Vec<AmbientRouteDataKey>,
}

impl<G: LinkGenerator> AmbientLinkGenerator<G> {
    pub fn new(inner: G, keys: Vec<AmbientRouteDataKey>) -> Self {
        Self { inner, keys }
    }

    pub fn keys(&self) -> &[AmbientRouteDataKey] {
        &self.keys
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Caller values plus ambient values, and the filled keys that must not
    /// round-trip through the query string.
    fn merge(&self, values: &RouteValues, context: &LinkContext<'_>) -> (RouteValues, Vec<String>) {
        let mut merged = values.clone();
        let mut no_round_trip = Vec::new();

        for ambient_key in &self.keys {
            let key = ambient_key.key.as_str();
            if merged.contains_key(key) {
                continue;
            }

            let value = context.ambient.get(key).map(str::to_string).or_else(|| {
                context
                    .query
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(key))
                    .map(|(_, value)| value.clone())
            });

            if let Some(value) = value {
                if !ambient_key.round_trip_via_query_string {
                    no_round_trip.push(key.to_string());
                }
                merged.insert(key, value);
            }
        }

        (merged, no_round_trip)
    }
}

impl<G: LinkGenerator> LinkGenerator for AmbientLinkGenerator<G> {
    fn path_by_values(&self, values: &RouteValues, context: &LinkContext<'_>) -> Option<String> {
        let (mut merged, no_round_trip) = self.merge(values, context);
        let link = self.inner.path_by_values(&merged, context)?;

        if no_round_trip.is_empty() {
            return Some(link);
        }

        let leaked: Vec<String> = query_pairs(&link)
            .into_iter()
            .map(|(key, _)| key)
            .filter(|key| no_round_trip.iter().any(|k| k.eq_ignore_ascii_case(key)))
            .collect();
        if leaked.is_empty() {
            return Some(link);
        }

        debug!("Regenerating link without leaked ambient values {:?}", leaked);
        for key in &leaked {
            merged.remove(key);
        }
        self.inner.path_by_values(&merged, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Puts every value except `consumed` keys into the query string.
    struct QueryEchoGenerator {
        consumed: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl QueryEchoGenerator {
        fn new(consumed: &[&'static str]) -> Self {
            Self {
                consumed: consumed.to_vec(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl LinkGenerator for QueryEchoGenerator {
        fn path_by_values(&self, values: &RouteValues, _context: &LinkContext<'_>) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut path = String::new();
            let mut query = Vec::new();
            for (key, value) in values.iter() {
                if self.consumed.iter().any(|c| c.eq_ignore_ascii_case(key)) {
                    path.push('/');
                    path.push_str(value);
                } else {
                    query.push(format!("{}={}", key, value));
                }
            }
            if path.is_empty() {
                path.push('/');
            }
            if !query.is_empty() {
                path.push('?');
                path.push_str(&query.join("&"));
            }
            Some(path)
        }
    }

    fn keys() -> Vec<AmbientRouteDataKey> {
        vec![
            AmbientRouteDataKey::new("area", false),
            AmbientRouteDataKey::new("culture", true),
            AmbientRouteDataKey::new("ui-culture", true),
        ]
    }

    fn values(pairs: &[(&str, &str)]) -> RouteValues {
        pairs.iter().copied().collect()
    }

    // ==================== Merge Tests ====================

    #[test]
    fn test_fills_from_ambient_route_values() {
        let generator = AmbientLinkGenerator::new(QueryEchoGenerator::new(&["culture", "action"]), keys());
        let ambient = values(&[("culture", "es")]);
        let context = LinkContext {
            ambient: &ambient,
            query: &[],
        };

        let link = generator.path_by_values(&values(&[("action", "about")]), &context);
        assert_eq!(link.as_deref(), Some("/about/es"));
    }

    #[test]
    fn test_caller_value_wins_over_ambient() {
        let generator = AmbientLinkGenerator::new(QueryEchoGenerator::new(&["culture"]), keys());
        let ambient = values(&[("culture", "es")]);
        let context = LinkContext {
            ambient: &ambient,
            query: &[],
        };

        let link = generator.path_by_values(&values(&[("CULTURE", "fr")]), &context);
        assert_eq!(link.as_deref(), Some("/fr"));
    }

    #[test]
    fn test_fills_from_query_string_first_value() {
        let generator = AmbientLinkGenerator::new(QueryEchoGenerator::new(&[]), keys());
        let ambient = RouteValues::new();
        let query = vec![
            ("ui-culture".to_string(), "fr".to_string()),
            ("ui-culture".to_string(), "de".to_string()),
        ];
        let context = LinkContext {
            ambient: &ambient,
            query: &query,
        };

        let link = generator.path_by_values(&RouteValues::new(), &context);
        assert_eq!(link.as_deref(), Some("/?ui-culture=fr"));
    }

    #[test]
    fn test_ambient_route_value_preferred_over_query() {
        let generator = AmbientLinkGenerator::new(QueryEchoGenerator::new(&["culture"]), keys());
        let ambient = values(&[("culture", "es")]);
        let query = vec![("culture".to_string(), "fr".to_string())];
        let context = LinkContext {
            ambient: &ambient,
            query: &query,
        };

        let link = generator.path_by_values(&RouteValues::new(), &context);
        assert_eq!(link.as_deref(), Some("/es"));
    }

    // ==================== Round-trip Policy Tests ====================

    #[test]
    fn test_non_round_trip_value_removed_and_regenerated() {
        let inner = QueryEchoGenerator::new(&["action"]);
        let generator = AmbientLinkGenerator::new(inner, keys());
        let ambient = values(&[("area", "admin")]);
        let context = LinkContext {
            ambient: &ambient,
            query: &[],
        };

        let link = generator.path_by_values(&values(&[("action", "about")]), &context);
        assert_eq!(link.as_deref(), Some("/about"));
        assert_eq!(generator.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_non_round_trip_value_kept_when_consumed_by_route() {
        let generator = AmbientLinkGenerator::new(QueryEchoGenerator::new(&["area"]), keys());
        let ambient = values(&[("area", "admin")]);
        let context = LinkContext {
            ambient: &ambient,
            query: &[],
        };

        let link = generator.path_by_values(&RouteValues::new(), &context);
        assert_eq!(link.as_deref(), Some("/admin"));
        assert_eq!(generator.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_round_trip_value_may_stay_in_query() {
        let generator = AmbientLinkGenerator::new(QueryEchoGenerator::new(&[]), keys());
        let ambient = values(&[("culture", "es")]);
        let context = LinkContext {
            ambient: &ambient,
            query: &[],
        };

        let link = generator.path_by_values(&RouteValues::new(), &context);
        assert_eq!(link.as_deref(), Some("/?culture=es"));
        assert_eq!(generator.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_caller_supplied_non_round_trip_key_not_removed() {
        let generator = AmbientLinkGenerator::new(QueryEchoGenerator::new(&[]), keys());
        let ambient = values(&[("area", "admin")]);
        let context = LinkContext {
            ambient: &ambient,
            query: &[],
        };

        let link = generator.path_by_values(&values(&[("area", "shop")]), &context);
        assert_eq!(link.as_deref(), Some("/?area=shop"));
    }
}
