//! Route table built from the (rewritten) application model.
//!
//! Only whole-segment parameters are understood: `literal`, `{name}`,
//! `{name:constraint}`, `{name?}` and a trailing `{*name}` catch-all.

use super::RouteValues;
use crate::convention::{combine_templates, ApplicationModel, Selector};
use crate::error::{LocalizationError, Result};
use axum::http::Method;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Inline constraint referenced as `{name:key}` in a template.
pub trait RouteConstraint: Send + Sync {
    fn matches(&self, value: &str) -> bool;
}

/// Constraint implementations by key.
#[derive(Clone, Default)]
pub struct ConstraintMap {
    constraints: HashMap<String, Arc<dyn RouteConstraint>>,
}

impl ConstraintMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constraint; an existing key keeps its first registration.
    pub fn with(mut self, key: impl Into<String>, constraint: Arc<dyn RouteConstraint>) -> Self {
        self.constraints.entry(key.into()).or_insert(constraint);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Arc<dyn RouteConstraint>> {
        self.constraints.get(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TemplateSegment {
    Literal(String),
    Parameter {
        name: String,
        constraint: Option<String>,
        optional: bool,
        catch_all: bool,
    },
}

impl TemplateSegment {
    /// Lower ranks are more specific and matched first.
    fn rank(&self) -> u8 {
        match self {
            TemplateSegment::Literal(_) => 0,
            TemplateSegment::Parameter { catch_all: true, .. } => 4,
            TemplateSegment::Parameter { optional: true, .. } => 3,
            TemplateSegment::Parameter {
                constraint: Some(_),
                ..
            } => 1,
            TemplateSegment::Parameter { .. } => 2,
        }
    }
}

pub(crate) fn parse_template(template: &str) -> Result<Vec<TemplateSegment>> {
    let invalid = |reason: &str| LocalizationError::InvalidTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    };

    if template.is_empty() {
        return Ok(Vec::new());
    }

    let parts: Vec<&str> = template.split('/').collect();
    let mut segments = Vec::with_capacity(parts.len());
    for (index, part) in parts.iter().enumerate() {
        if part.is_empty() {
            return Err(invalid("empty segment"));
        }

        let Some(inner) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) else {
            if part.contains('{') || part.contains('}') {
                return Err(invalid("parameters must span a whole segment"));
            }
            segments.push(TemplateSegment::Literal(part.to_string()));
            continue;
        };

        let (inner, catch_all) = match inner.strip_prefix("**").or_else(|| inner.strip_prefix('*')) {
            Some(rest) => (rest, true),
            None => (inner, false),
        };
        if catch_all && index != parts.len() - 1 {
            return Err(invalid("catch-all parameter must be the last segment"));
        }
        let (inner, optional) = match inner.strip_suffix('?') {
            Some(rest) => (rest, true),
            None => (inner, false),
        };
        if inner.contains('=') {
            return Err(invalid("default values are not supported"));
        }
        let (name, constraint) = match inner.split_once(':') {
            Some((name, constraint)) => (name, Some(constraint.to_string())),
            None => (inner, None),
        };
        if name.is_empty() || name.contains(['{', '}']) {
            return Err(invalid("parameter name is empty or malformed"));
        }

        segments.push(TemplateSegment::Parameter {
            name: name.to_string(),
            constraint,
            optional,
            catch_all,
        });
    }
    Ok(segments)
}

/// A routable action template.
#[derive(Debug, Clone)]
pub struct RouteEndpoint {
    pub controller: String,
    pub action: String,
    /// Combined template without leading `/` or `~/`
    pub template: String,
    pub order: i32,
    pub methods: Vec<Method>,
    pub(crate) segments: Vec<TemplateSegment>,
}

impl RouteEndpoint {
    fn precedence(&self) -> Vec<u8> {
        self.segments.iter().map(TemplateSegment::rank).collect()
    }

    fn allows(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }
}

/// Result of matching a request path.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub endpoint: &'a RouteEndpoint,
    /// `controller`, `action` and every captured parameter
    pub values: RouteValues,
}

/// Attribute-routed endpoints in match order.
pub struct RouteTable {
    endpoints: Vec<RouteEndpoint>,
    constraints: ConstraintMap,
}

impl RouteTable {
    /// Build endpoints for every controller × action selector pair.
    ///
    /// Actions without any template (conventional routing) are skipped.
    /// Unknown constraint keys and malformed templates are startup errors.
    pub fn build(application: &ApplicationModel, constraints: ConstraintMap) -> Result<Self> {
        let conventional = [Selector::conventional()];
        let mut endpoints = Vec::new();

        for controller in &application.controllers {
            let controller_selectors: &[Selector] = if controller.selectors.is_empty() {
                &conventional
            } else {
                &controller.selectors
            };

            for action in &controller.actions {
                for controller_selector in controller_selectors {
                    for action_selector in &action.selectors {
                        let Some(template) =
                            combine_templates(controller_selector.template(), action_selector.template())
                        else {
                            continue;
                        };

                        let segments = parse_template(&template)?;
                        for segment in &segments {
                            if let TemplateSegment::Parameter {
                                constraint: Some(key),
                                ..
                            } = segment
                            {
                                if constraints.get(key).is_none() {
                                    return Err(LocalizationError::UnknownConstraint {
                                        template: template.clone(),
                                        constraint: key.clone(),
                                    });
                                }
                            }
                        }

                        let order = action_selector
                            .attribute_route
                            .as_ref()
                            .and_then(|route| route.order)
                            .or_else(|| {
                                controller_selector
                                    .attribute_route
                                    .as_ref()
                                    .and_then(|route| route.order)
                            })
                            .unwrap_or(0);
                        let methods = if action_selector.http_methods.is_empty() {
                            controller_selector.http_methods.clone()
                        } else {
                            action_selector.http_methods.clone()
                        };

                        endpoints.push(RouteEndpoint {
                            controller: controller.name.clone(),
                            action: action.name.clone(),
                            template,
                            order,
                            methods,
                            segments,
                        });
                    }
                }
            }
        }

        endpoints.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then_with(|| a.precedence().cmp(&b.precedence()))
        });
        debug!("Built route table with {} endpoints", endpoints.len());

        Ok(Self {
            endpoints,
            constraints,
        })
    }

    pub fn endpoints(&self) -> &[RouteEndpoint] {
        &self.endpoints
    }

    pub(crate) fn constraint_matches(&self, key: &str, value: &str) -> bool {
        self.constraints
            .get(key)
            .map(|constraint| constraint.matches(value))
            .unwrap_or(false)
    }

    /// First endpoint matching `path` and `method`.
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let trimmed = path.trim_start_matches('/').trim_end_matches('/');
        let parts: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').collect()
        };

        self.endpoints
            .iter()
            .filter(|endpoint| endpoint.allows(method))
            .find_map(|endpoint| {
                self.match_endpoint(endpoint, &parts)
                    .map(|values| RouteMatch { endpoint, values })
            })
    }

    fn match_endpoint(&self, endpoint: &RouteEndpoint, parts: &[&str]) -> Option<RouteValues> {
        let mut values = RouteValues::new();
        values.insert("controller", endpoint.controller.as_str());
        values.insert("action", endpoint.action.as_str());

        let mut index = 0;
        for segment in &endpoint.segments {
            match segment {
                TemplateSegment::Literal(literal) => {
                    let part = parts.get(index)?;
                    if !part.eq_ignore_ascii_case(literal) {
                        return None;
                    }
                    index += 1;
                }
                TemplateSegment::Parameter {
                    catch_all: true,
                    name,
                    ..
                } => {
                    let rest = parts.get(index..).unwrap_or_default().join("/");
                    if !rest.is_empty() {
                        values.insert(name.as_str(), rest);
                    }
                    index = parts.len();
                }
                TemplateSegment::Parameter {
                    name,
                    constraint,
                    optional,
                    ..
                } => match parts.get(index) {
                    Some(part) => {
                        if let Some(key) = constraint {
                            if !self.constraint_matches(key, part) {
                                return None;
                            }
                        }
                        values.insert(name.as_str(), *part);
                        index += 1;
                    }
                    None if *optional => {}
                    None => return None,
                },
            }
        }

        (index == parts.len()).then_some(values)
    }
}
