//! Culture tag shape validation.
//!
//! Accepts `language(-script)?(-region)?` tags such as `en`, `en-US` or
//! `zh-Hans-CN`. The check is purely syntactic: whether a culture is actually
//! supported is decided by the [`CultureResolver`](super::CultureResolver).

use crate::routing::RouteConstraint;
use regex::Regex;
use std::sync::OnceLock;

static CULTURE_REGEX: OnceLock<Regex> = OnceLock::new();

fn culture_regex() -> &'static Regex {
    CULTURE_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z]{2,3}(-[a-zA-Z]{4})?(-[a-zA-Z0-9]{2,3})?$")
            .expect("culture pattern is valid")
    })
}

/// Route constraint matching language-tag shaped values.
#[derive(Debug, Clone, Copy, Default)]
pub struct CultureConstraint;

impl CultureConstraint {
    /// Check whether the whole `candidate` is a culture tag.
    pub fn matches(candidate: &str) -> bool {
        culture_regex().is_match(candidate)
    }
}

impl RouteConstraint for CultureConstraint {
    fn matches(&self, value: &str) -> bool {
        CultureConstraint::matches(value)
    }
}
