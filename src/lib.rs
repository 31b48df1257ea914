//! Culture-prefixed URLs for axum applications.
//!
//! - [`convention`] rewrites route templates so every route gains a
//!   `{culture}` segment.
//! - [`localizer`] translates path segments into a culture and back.
//! - [`redirect`] corrects the culture segment of a request URL.
//! - [`ambient`] carries route values such as the culture into generated links.
//! - [`middleware`] wires the above into an HTTP pipeline.

pub mod ambient;
pub mod app;
pub mod config;
pub mod convention;
pub mod culture;
pub mod error;
pub mod links;
pub mod localizer;
pub mod metrics;
pub mod middleware;
pub mod redirect;
pub mod routing;
