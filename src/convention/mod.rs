//! Startup rewrite of attribute routes so every route carries a culture segment.
//!
//! [`CultureRouteConvention`] prepends `{culture}` (or `{culture:constraint}`)
//! to controller and action templates. In [`PrefixMode::Mandatory`] the
//! templates are rewritten in place; in [`PrefixMode::Optional`] each selector
//! is forked into a culture-prefixed copy so the original route stays
//! reachable.

mod model;
mod template;

pub use model::{ActionModel, ApplicationModel, AttributeRoute, ControllerModel, Selector};
pub use template::{combine_templates, RouteTemplate};

use tracing::debug;

/// Order given to culture-prefixed forks in optional mode. Forks match after
/// every plain route, so a literal segment is never captured as a culture.
pub const CULTURE_ROUTE_ORDER: i32 = i32::MAX;

/// Whether routes require the culture segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrefixMode {
    /// Every route is rewritten to start with the culture segment
    Mandatory,
    /// Culture-prefixed copies are added next to the original routes
    #[default]
    Optional,
}

pub struct CultureRouteConvention {
    mode: PrefixMode,
    culture_prefix: String,
}

impl CultureRouteConvention {
    /// Build the convention for a culture route key and optional constraint key.
    pub fn new(mode: PrefixMode, culture_key: &str, constraint_key: Option<&str>) -> Self {
        let culture_prefix = match constraint_key.filter(|key| !key.is_empty()) {
            Some(constraint) => format!("{{{}:{}}}", culture_key, constraint),
            None => format!("{{{}}}", culture_key),
        };
        Self {
            mode,
            culture_prefix,
        }
    }

    pub fn mode(&self) -> PrefixMode {
        self.mode
    }

    /// The template segment prepended to routes, e.g. `{culture:cultureCheck}`.
    pub fn culture_prefix(&self) -> &str {
        &self.culture_prefix
    }

    pub fn apply(&self, application: &mut ApplicationModel) {
        for controller in &mut application.controllers {
            self.apply_controller(controller);
        }
    }

    pub fn apply_controller(&self, controller: &mut ControllerModel) {
        let prefix = self.culture_prefix.as_str();
        self.rewrite(&mut controller.selectors, |template| {
            combine_templates(Some(prefix), template)
        });

        let conventional = controller.is_conventionally_routed();
        for action in &mut controller.actions {
            self.apply_action(action, conventional);
        }
        debug!(
            "Applied culture prefix to controller '{}' ({} selectors)",
            controller.name,
            controller.selectors.len()
        );
    }

    /// Rewrite an action's templates.
    ///
    /// Relative templates only get the prefix when the owning controller is
    /// conventionally routed; otherwise the controller's own prefix covers them.
    pub fn apply_action(&self, action: &mut ActionModel, controller_is_conventional: bool) {
        let prefix = self.culture_prefix.as_str();
        self.rewrite(&mut action.selectors, |template| {
            match RouteTemplate::parse(template) {
                RouteTemplate::AppRootAbsolute(rest) => {
                    Some(format!("~/{}{}", prefix, sub_path(rest)))
                }
                RouteTemplate::RootAbsolute(rest) => Some(format!("/{}{}", prefix, sub_path(rest))),
                RouteTemplate::Relative(template) if controller_is_conventional => {
                    combine_templates(Some(prefix), template)
                }
                RouteTemplate::Relative(_) => None,
            }
        });
    }

    /// Apply `prefixed` to every attribute-routed selector, mutating or
    /// forking according to the mode.
    fn rewrite<F>(&self, selectors: &mut Vec<Selector>, mut prefixed: F)
    where
        F: FnMut(Option<&str>) -> Option<String>,
    {
        let mut forks = Vec::new();

        for selector in selectors.iter_mut() {
            let Some(route) = selector.attribute_route.as_mut() else {
                continue;
            };
            let Some(template) = prefixed(route.template.as_deref()) else {
                continue;
            };

            match self.mode {
                PrefixMode::Mandatory => route.template = Some(template),
                PrefixMode::Optional => forks.push(Selector {
                    attribute_route: Some(AttributeRoute {
                        template: Some(template),
                        order: Some(CULTURE_ROUTE_ORDER),
                        name: None,
                    }),
                    http_methods: selector.http_methods.clone(),
                }),
            }
        }

        selectors.splice(0..0, forks);
    }
}

fn sub_path(rest: &str) -> String {
    if rest.is_empty() {
        String::new()
    } else {
        format!("/{}", rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn optional() -> CultureRouteConvention {
        CultureRouteConvention::new(PrefixMode::Optional, "culture", Some("cultureCheck"))
    }

    fn mandatory() -> CultureRouteConvention {
        CultureRouteConvention::new(PrefixMode::Mandatory, "culture", Some("cultureCheck"))
    }

    fn templates(selectors: &[Selector]) -> Vec<Option<&str>> {
        selectors.iter().map(Selector::template).collect()
    }

    // ==================== Prefix Tests ====================

    #[test]
    fn test_prefix_with_constraint() {
        assert_eq!(optional().culture_prefix(), "{culture:cultureCheck}");
    }

    #[test]
    fn test_prefix_without_constraint() {
        let convention = CultureRouteConvention::new(PrefixMode::Optional, "lang", None);
        assert_eq!(convention.culture_prefix(), "{lang}");
        let convention = CultureRouteConvention::new(PrefixMode::Optional, "lang", Some(""));
        assert_eq!(convention.culture_prefix(), "{lang}");
    }

    // ==================== Controller Tests ====================

    #[test]
    fn test_controller_mandatory_rewrites_in_place() {
        let mut controller = ControllerModel::new(
            "Products",
            vec![Selector::from_route(AttributeRoute::new("products").with_order(3))],
        );
        mandatory().apply_controller(&mut controller);

        assert_eq!(controller.selectors.len(), 1);
        let route = controller.selectors[0].attribute_route.as_ref().unwrap();
        assert_eq!(route.template.as_deref(), Some("{culture:cultureCheck}/products"));
        assert_eq!(route.order, Some(3));
    }

    #[test]
    fn test_controller_optional_forks_at_front() {
        let mut controller = ControllerModel::new(
            "Products",
            vec![Selector::attribute("products"), Selector::attribute("items")],
        );
        optional().apply_controller(&mut controller);

        assert_eq!(
            templates(&controller.selectors),
            vec![
                Some("{culture:cultureCheck}/products"),
                Some("{culture:cultureCheck}/items"),
                Some("products"),
                Some("items"),
            ]
        );
        let fork = controller.selectors[0].attribute_route.as_ref().unwrap();
        assert_eq!(fork.order, Some(CULTURE_ROUTE_ORDER));
    }

    #[test]
    fn test_controller_empty_template() {
        let mut controller = ControllerModel::new("Home", vec![Selector::attribute("")]);
        mandatory().apply_controller(&mut controller);
        assert_eq!(
            templates(&controller.selectors),
            vec![Some("{culture:cultureCheck}")]
        );
    }

    #[test]
    fn test_conventional_controller_selectors_untouched() {
        let mut controller = ControllerModel::new("Home", vec![Selector::conventional()]);
        optional().apply_controller(&mut controller);
        assert_eq!(controller.selectors, vec![Selector::conventional()]);
    }

    #[test]
    fn test_fork_keeps_http_methods() {
        let mut controller = ControllerModel::new(
            "Home",
            vec![Selector::attribute("set").with_methods([Method::POST])],
        );
        optional().apply_controller(&mut controller);
        assert_eq!(controller.selectors[0].http_methods, vec![Method::POST]);
    }

    // ==================== Action Tests ====================

    #[test]
    fn test_action_app_root_absolute() {
        let mut action = ActionModel::new("About", vec![Selector::attribute("~/about")]);
        mandatory().apply_action(&mut action, false);
        assert_eq!(
            templates(&action.selectors),
            vec![Some("~/{culture:cultureCheck}/about")]
        );
    }

    #[test]
    fn test_action_app_root_only_marker() {
        let mut action = ActionModel::new("Index", vec![Selector::attribute("~/")]);
        mandatory().apply_action(&mut action, false);
        assert_eq!(templates(&action.selectors), vec![Some("~/{culture:cultureCheck}")]);
    }

    #[test]
    fn test_action_root_absolute() {
        let mut action = ActionModel::new("About", vec![Selector::attribute("/about/{id}")]);
        mandatory().apply_action(&mut action, false);
        assert_eq!(
            templates(&action.selectors),
            vec![Some("/{culture:cultureCheck}/about/{id}")]
        );

        let mut action = ActionModel::new("Index", vec![Selector::attribute("/")]);
        mandatory().apply_action(&mut action, false);
        assert_eq!(templates(&action.selectors), vec![Some("/{culture:cultureCheck}")]);
    }

    #[test]
    fn test_action_relative_under_attribute_controller_untouched() {
        let mut action = ActionModel::new("Privacy", vec![Selector::attribute("privacy")]);
        optional().apply_action(&mut action, false);
        assert_eq!(templates(&action.selectors), vec![Some("privacy")]);
    }

    #[test]
    fn test_action_relative_under_conventional_controller() {
        let mut action = ActionModel::new("Privacy", vec![Selector::attribute("privacy")]);
        optional().apply_action(&mut action, true);
        assert_eq!(
            templates(&action.selectors),
            vec![Some("{culture:cultureCheck}/privacy"), Some("privacy")]
        );
    }

    #[test]
    fn test_action_without_attribute_route_untouched() {
        let mut action = ActionModel::new("Index", vec![Selector::conventional()]);
        mandatory().apply_action(&mut action, true);
        assert_eq!(action.selectors, vec![Selector::conventional()]);
    }

    // ==================== Application Tests ====================

    #[test]
    fn test_apply_reaches_actions() {
        let mut application = ApplicationModel::new(vec![
            ControllerModel::new("Home", vec![Selector::attribute("")])
                .with_action(ActionModel::new("About", vec![Selector::attribute("/about")])),
            ControllerModel::new("Legacy", vec![Selector::conventional()])
                .with_action(ActionModel::new("Old", vec![Selector::attribute("old")])),
        ]);
        mandatory().apply(&mut application);

        let home = &application.controllers[0];
        assert_eq!(templates(&home.selectors), vec![Some("{culture:cultureCheck}")]);
        assert_eq!(
            templates(&home.actions[0].selectors),
            vec![Some("/{culture:cultureCheck}/about")]
        );
        let legacy = &application.controllers[1];
        assert_eq!(
            templates(&legacy.actions[0].selectors),
            vec![Some("{culture:cultureCheck}/old")]
        );
    }
}
