//! Unified error types for the service shell.

use axum::http::Method;
use thiserror::Error;

/// Unified error type for the service.
///
/// Every variant is a startup-time failure: once the router is built,
/// request handling has no error path of its own.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The same (method, path) pair was registered twice.
    #[error("route {method} {path} is already registered")]
    DuplicateRoute {
        /// HTTP method of the conflicting route.
        method: Method,
        /// Full path of the conflicting route.
        path: String,
    },

    /// Route path that the router cannot accept.
    #[error("invalid route path {path:?}: {reason}")]
    InvalidRoutePath {
        /// The rejected path.
        path: String,
        /// Why the router refused it.
        reason: String,
    },

    /// HTTP method the router has no dispatch slot for.
    #[error("unsupported route method: {0}")]
    UnsupportedMethod(Method),

    /// Malformed cross-origin policy options.
    #[error("cors policy error: {0}")]
    Cors(#[from] CorsError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Cross-origin policy errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorsError {
    /// No origin was listed.
    #[error("at least one allowed origin is required")]
    NoOrigins,

    /// Wildcard origin cannot be combined with credentials.
    #[error("wildcard origin '*' cannot be combined with allow_credentials")]
    WildcardOriginWithCredentials,

    /// Origin is not a valid header value.
    #[error("invalid origin {0:?}")]
    InvalidOrigin(String),

    /// Method is not a valid HTTP method token.
    #[error("invalid method {0:?}")]
    InvalidMethod(String),

    /// Header is not a valid header name.
    #[error("invalid header name {0:?}")]
    InvalidHeader(String),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ServiceError>;
