//! Route values, the attribute route table and link generation.
//!
//! This is the host-side routing the engine plugs into: the table is built
//! once from the rewritten [`ApplicationModel`](crate::convention::ApplicationModel),
//! matched per request, and used to generate outbound links.

mod link;
mod table;
mod values;

pub use link::{query_pairs, LinkContext, LinkGenerator, RouteLinkGenerator};
pub use table::{ConstraintMap, RouteConstraint, RouteEndpoint, RouteMatch, RouteTable};
pub use values::RouteValues;
