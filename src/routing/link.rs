use super::table::{RouteTable, TemplateSegment};
use super::RouteValues;
use std::cmp::Reverse;
use std::sync::Arc;
use url::form_urlencoded;

/// Request state available while generating a link.
#[derive(Debug, Clone, Copy)]
pub struct LinkContext<'a> {
    /// Route values of the current request
    pub ambient: &'a RouteValues,
    /// Decoded query pairs of the current request
    pub query: &'a [(String, String)],
}

/// Produces a path (with query string) for a set of route values.
pub trait LinkGenerator: Send + Sync {
    fn path_by_values(&self, values: &RouteValues, context: &LinkContext<'_>) -> Option<String>;
}

/// Generates links from a [`RouteTable`].
///
/// `controller` and `action` select the endpoints (falling back to the
/// ambient values). Among the endpoints whose required parameters are all
/// supplied, the one consuming the most values wins, ties going to table
/// order. Values no template segment consumed go to the query string.
pub struct RouteLinkGenerator {
    table: Arc<RouteTable>,
    path_base: String,
    lowercase_urls: bool,
}

impl RouteLinkGenerator {
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self {
            table,
            path_base: String::new(),
            lowercase_urls: false,
        }
    }

    pub fn with_path_base(mut self, path_base: impl Into<String>) -> Self {
        self.path_base = path_base.into();
        self
    }

    pub fn with_lowercase_urls(mut self, lowercase_urls: bool) -> Self {
        self.lowercase_urls = lowercase_urls;
        self
    }

    fn fill(&self, segments: &[TemplateSegment], values: &RouteValues) -> Option<(String, Vec<String>)> {
        let mut parts = Vec::with_capacity(segments.len());
        let mut consumed = Vec::new();

        for segment in segments {
            match segment {
                TemplateSegment::Literal(literal) => parts.push(literal.clone()),
                TemplateSegment::Parameter {
                    name,
                    constraint,
                    optional,
                    catch_all,
                } => match values.get(name).filter(|value| !value.is_empty()) {
                    Some(value) => {
                        if let Some(key) = constraint {
                            if !self.table.constraint_matches(key, value) {
                                return None;
                            }
                        }
                        parts.push(value.to_string());
                        consumed.push(name.clone());
                    }
                    None if *optional || *catch_all => break,
                    None => return None,
                },
            }
        }

        let mut path = format!("/{}", parts.join("/"));
        if self.lowercase_urls {
            path = path.to_lowercase();
        }
        Some((path, consumed))
    }
}

impl LinkGenerator for RouteLinkGenerator {
    fn path_by_values(&self, values: &RouteValues, context: &LinkContext<'_>) -> Option<String> {
        let controller = values
            .get("controller")
            .or_else(|| context.ambient.get("controller"))?;
        let action = values.get("action").or_else(|| context.ambient.get("action"))?;

        let (path, consumed) = self
            .table
            .endpoints()
            .iter()
            .filter(|endpoint| {
                endpoint.controller.eq_ignore_ascii_case(controller)
                    && endpoint.action.eq_ignore_ascii_case(action)
            })
            .filter_map(|endpoint| self.fill(&endpoint.segments, values))
            .min_by_key(|(_, consumed)| Reverse(consumed.len()))?;

        let query: Vec<(&str, &str)> = values
            .iter()
            .filter(|(key, _)| {
                !key.eq_ignore_ascii_case("controller")
                    && !key.eq_ignore_ascii_case("action")
                    && !consumed.iter().any(|name| name.eq_ignore_ascii_case(key))
            })
            .collect();

        let mut link = format!("{}{}", self.path_base, path);
        if !query.is_empty() {
            let encoded = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query)
                .finish();
            link.push('?');
            link.push_str(&encoded);
        }
        Some(link)
    }
}

/// Decoded `(key, value)` pairs of a link's query string.
pub fn query_pairs(link: &str) -> Vec<(String, String)> {
    let without_fragment = link.split('#').next().unwrap_or_default();
    match without_fragment.split_once('?') {
        Some((_, query)) => form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect(),
        None => Vec::new(),
    }
}
