//! Path segment localization.
//!
//! # Architecture
//!
//! - `lookup`: the key → string source ([`StringLookup`]) and JSON resource bundles
//! - `reverse`: per-culture reverse indexes and their cache
//! - `codec`: [`UrlLocalizer`], which localizes and unlocalizes whole paths
//! - `text`: title-casing used for the case-insensitive fallback lookups
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use url_localization::localizer::{ResourceSet, ReverseLookupCache, UrlLocalizer};
//!
//! let resources = ResourceSet::new("Url").with_bundle("es", [("About", "Acerca")]);
//! let localizer = UrlLocalizer::new(Arc::new(resources), Arc::new(ReverseLookupCache::new()))
//!     .with_lowercase_urls(true);
//!
//! assert_eq!(localizer.localize("/es/about", "es"), "/es/acerca");
//! assert_eq!(localizer.unlocalize("/es/acerca", "es"), "/es/about");
//! ```

mod codec;
mod lookup;
mod reverse;
mod text;

pub use codec::UrlLocalizer;
pub use lookup::{ResourceSet, StringLookup};
pub use reverse::{ReverseIndex, ReverseLookupCache};
pub use text::title_case;
