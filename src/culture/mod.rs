//! Culture tags: shape validation and per-request culture resolution.

mod constraint;
mod provider;

pub use constraint::CultureConstraint;
pub use provider::{
    CultureResolver, ProviderCultureResult, RequestCulture, RequestCultureProvider, RequestView,
    UrlCultureProvider,
};

/// Parent of a culture name, dropping the last subtag.
///
/// `zh-Hans-CN` → `zh-Hans` → `zh` → `None`.
pub fn parent_culture(culture: &str) -> Option<&str> {
    culture.rfind('-').map(|index| &culture[..index])
}
