//! # attendo-routes
//!
//! Navigation surface of the attendance gateway: the static [`ROUTES`]
//! table, path resolution with parameter capture, breadcrumb trails and
//! path building.
//!
//! The attendance sheet is the only lazily resolved view; it is loaded on
//! the first navigation that needs it and memoized.

#![deny(unsafe_code)]

pub mod errors;
pub mod router;
pub mod table;

pub use errors::RouteError;
pub use router::{Crumb, RouteMatch, Router};
pub use table::{LazyView, ROUTES, RouteDef, View, ViewId};
