//! Application model the route convention rewrites at startup.
//!
//! Controllers and actions each own selectors; a selector with an attribute
//! route carries a template, one without is reached through conventional
//! routing.

use axum::http::Method;

/// Route template plus ordering metadata attached to a selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeRoute {
    pub template: Option<String>,
    /// Lower orders are matched and generated first; `None` means 0
    pub order: Option<i32>,
    pub name: Option<String>,
}

impl AttributeRoute {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: Some(template.into()),
            order: None,
            name: None,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    pub attribute_route: Option<AttributeRoute>,
    /// Allowed methods; empty allows every method
    pub http_methods: Vec<Method>,
}

impl Selector {
    /// Selector with an attribute route template.
    pub fn attribute(template: impl Into<String>) -> Self {
        Self::from_route(AttributeRoute::new(template))
    }

    pub fn from_route(route: AttributeRoute) -> Self {
        Self {
            attribute_route: Some(route),
            http_methods: Vec::new(),
        }
    }

    /// Selector reached through conventional routing.
    pub fn conventional() -> Self {
        Self::default()
    }

    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.http_methods = methods.into_iter().collect();
        self
    }

    pub fn template(&self) -> Option<&str> {
        self.attribute_route
            .as_ref()
            .and_then(|route| route.template.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionModel {
    pub name: String,
    pub selectors: Vec<Selector>,
}

impl ActionModel {
    pub fn new(name: impl Into<String>, selectors: Vec<Selector>) -> Self {
        Self {
            name: name.into(),
            selectors,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerModel {
    pub name: String,
    pub selectors: Vec<Selector>,
    pub actions: Vec<ActionModel>,
}

impl ControllerModel {
    pub fn new(name: impl Into<String>, selectors: Vec<Selector>) -> Self {
        Self {
            name: name.into(),
            selectors,
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: ActionModel) -> Self {
        self.actions.push(action);
        self
    }

    /// True when at least one selector has no attribute route.
    pub fn is_conventionally_routed(&self) -> bool {
        self.selectors
            .iter()
            .any(|selector| selector.attribute_route.is_none())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationModel {
    pub controllers: Vec<ControllerModel>,
}

impl ApplicationModel {
    pub fn new(controllers: Vec<ControllerModel>) -> Self {
        Self { controllers }
    }
}
