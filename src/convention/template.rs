/// Shape of an action route template, decided by its leading marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTemplate<'a> {
    /// `~/rest`: absolute from the application root
    AppRootAbsolute(&'a str),
    /// `/rest`: absolute, ignores the controller prefix
    RootAbsolute(&'a str),
    /// Anything else, combined with the controller prefix
    Relative(Option<&'a str>),
}

impl<'a> RouteTemplate<'a> {
    pub fn parse(template: Option<&'a str>) -> Self {
        match template {
            Some(t) => {
                if let Some(rest) = t.strip_prefix("~/") {
                    RouteTemplate::AppRootAbsolute(rest)
                } else if let Some(rest) = t.strip_prefix('/') {
                    RouteTemplate::RootAbsolute(rest)
                } else {
                    RouteTemplate::Relative(Some(t))
                }
            }
            None => RouteTemplate::Relative(None),
        }
    }

    /// Absolute templates override the controller prefix.
    pub fn is_override(&self) -> bool {
        !matches!(self, RouteTemplate::Relative(_))
    }
}

fn is_empty_left(template: &str) -> bool {
    matches!(template, "" | "~/" | "/")
}

/// Combine a prefix template with a template below it.
///
/// An absolute right side replaces the prefix. The result has no leading
/// `~/` or `/` and no trailing `/`.
///
/// # Example
/// ```
/// use url_localization::convention::combine_templates;
///
/// assert_eq!(combine_templates(Some("{culture}"), Some("privacy")).as_deref(), Some("{culture}/privacy"));
/// assert_eq!(combine_templates(Some("{culture}"), Some("")).as_deref(), Some("{culture}"));
/// assert_eq!(combine_templates(Some("home"), Some("~/about")).as_deref(), Some("about"));
/// ```
pub fn combine_templates(left: Option<&str>, right: Option<&str>) -> Option<String> {
    let combined = match (left, right) {
        (None, None) => return None,
        (Some(left), None) => left.to_string(),
        (None, Some(right)) => right.to_string(),
        (Some(left), Some(right)) => {
            if is_empty_left(left) || RouteTemplate::parse(Some(right)).is_override() {
                right.to_string()
            } else if left.ends_with('/') {
                format!("{}{}", left, right)
            } else {
                format!("{}/{}", left, right)
            }
        }
    };
    Some(clean_template(&combined))
}

fn clean_template(template: &str) -> String {
    // "//" is an invalid combination, leave it for route validation to reject
    if template == "//" {
        return template.to_string();
    }

    let trimmed = template
        .strip_prefix('/')
        .or_else(|| template.strip_prefix("~/"))
        .unwrap_or(template);
    trimmed.strip_suffix('/').unwrap_or(trimmed).to_string()
}
