//! Navigation errors.

/// Failures building a path from a route name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// No route carries this name.
    #[error("unknown route: {0}")]
    UnknownRoute(String),

    /// A `:param` of the pattern was not supplied.
    #[error("route {route} needs parameter {param}")]
    MissingParam {
        /// Route name.
        route: &'static str,
        /// Parameter name, without the leading `:`.
        param: &'static str,
    },

    /// A supplied value would change the shape of the path.
    #[error("invalid value for {param}: {value:?}")]
    InvalidParam {
        /// Parameter name.
        param: &'static str,
        /// Offending value.
        value: String,
    },
}
