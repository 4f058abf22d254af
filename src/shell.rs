//! Service shell: owns the route table and the middleware stack.
//!
//! The shell is assembled once at startup and consumed into an
//! [`axum::Router`], which is then handed to the listener. Nothing about it
//! changes after [`ServiceShell::into_router`].

use std::collections::{BTreeMap, HashSet};

use axum::{
    handler::Handler,
    http::Method,
    middleware,
    routing::{self, MethodFilter, MethodRouter},
    Router,
};
use matchit::InsertError;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::debug;

use crate::api::cors::{strip_rejected_origin, CorsPolicy};
use crate::api::docs;
use crate::api::handlers::not_found;
use crate::api::middleware::track_metrics;
use crate::error::{Result, ServiceError};

/// Prefix the API route provider is mounted under.
pub const API_PREFIX: &str = "/api/v1";

/// Compiled-in service metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Human-readable name.
    pub title: &'static str,
    /// One-line summary.
    pub description: &'static str,
    /// Release version.
    pub version: &'static str,
}

impl ServiceInfo {
    /// Metadata of this build.
    pub const fn current() -> Self {
        Self {
            title: "AI Service",
            description: "AI-powered analysis and prediction service",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self::current()
    }
}

/// One (method, path, handler) triple.
pub struct RouteSpec {
    method: Method,
    path: String,
    handler: MethodRouter,
}

impl RouteSpec {
    /// Bind `handler` to `method` and `path`.
    pub fn new<H, T>(method: Method, path: impl Into<String>, handler: H) -> Result<Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let filter = MethodFilter::try_from(method.clone())
            .map_err(|_| ServiceError::UnsupportedMethod(method.clone()))?;

        Ok(Self {
            method,
            path: path.into(),
            handler: routing::on(filter, handler),
        })
    }

    /// `GET` route.
    pub fn get<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self {
            method: Method::GET,
            path: path.into(),
            handler: routing::get(handler),
        }
    }

    /// `POST` route.
    pub fn post<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self {
            method: Method::POST,
            path: path.into(),
            handler: routing::post(handler),
        }
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to wherever the route is mounted.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteSpec")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Capability to contribute routes to the shell.
pub trait RouteProvider {
    /// Routes to register, with paths relative to the mount prefix.
    fn routes(&self) -> Vec<RouteSpec>;
}

/// Provider with no routes. Stands in for the API router until it exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRoutes;

impl RouteProvider for NoRoutes {
    fn routes(&self) -> Vec<RouteSpec> {
        Vec::new()
    }
}

/// Application under construction.
pub struct ServiceShell {
    info: ServiceInfo,
    cors: Option<CorsLayer>,
    docs: bool,
    registered: HashSet<(Method, String)>,
    patterns: matchit::Router<()>,
    routes: BTreeMap<String, MethodRouter>,
}

impl ServiceShell {
    /// Start an empty shell carrying `info`.
    pub fn new(info: ServiceInfo) -> Self {
        Self {
            info,
            cors: None,
            docs: false,
            registered: HashSet::new(),
            patterns: matchit::Router::new(),
            routes: BTreeMap::new(),
        }
    }

    /// Metadata the shell was built with.
    pub fn info(&self) -> &ServiceInfo {
        &self.info
    }

    /// Apply `policy` to every response.
    pub fn cors(mut self, policy: &CorsPolicy) -> Result<Self> {
        self.cors = Some(policy.layer()?);
        Ok(self)
    }

    /// Serve the OpenAPI document and Swagger UI.
    pub fn with_docs(mut self) -> Self {
        self.docs = true;
        self
    }

    /// Register a single route.
    pub fn route<H, T>(self, method: Method, path: &str, handler: H) -> Result<Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let spec = RouteSpec::new(method, path, handler)?;
        self.register(spec)
    }

    /// Register every route `provider` exposes beneath `prefix`.
    pub fn mount(mut self, prefix: &str, provider: &dyn RouteProvider) -> Result<Self> {
        for spec in provider.routes() {
            let path = join_path(prefix, &spec.path)?;
            self = self.register(RouteSpec { path, ..spec })?;
        }
        Ok(self)
    }

    fn register(mut self, spec: RouteSpec) -> Result<Self> {
        let RouteSpec {
            method,
            path,
            handler,
        } = spec;

        if !path.starts_with('/') {
            return Err(invalid_path(&path, "paths must start with '/'"));
        }

        if self.registered.contains(&(method.clone(), path.clone())) {
            return Err(ServiceError::DuplicateRoute { method, path });
        }

        // A new path must not overlap an existing pattern, e.g. `/items/:id`
        // against `/items/:name`; a known path only gains another method.
        if !self.routes.contains_key(&path) {
            self.claim_pattern(&method, &path)?;
        }
        self.registered.insert((method.clone(), path.clone()));

        debug!(%method, %path, "registered route");

        let merged = match self.routes.remove(&path) {
            Some(existing) => existing.merge(handler),
            None => handler,
        };
        self.routes.insert(path, merged);

        Ok(self)
    }

    /// Freeze the route table and wrap it in the middleware stack.
    ///
    /// Unmatched paths and unmatched methods on known paths both fall
    /// through to an empty 404.
    pub fn into_router(mut self) -> Result<Router> {
        let docs_router = if self.docs {
            for path in docs::ROUTE_PATHS {
                self.claim_pattern(&Method::GET, path)?;
            }
            Some(docs::docs_router(self.info()))
        } else {
            None
        };

        let mut router = Router::new();
        for (path, handler) in self.routes {
            router = router.route(&path, handler.fallback(not_found));
        }

        if let Some(docs_router) = docs_router {
            router = router.merge(docs_router);
        }

        let router = router
            .fallback(not_found)
            .layer(middleware::from_fn(track_metrics))
            .layer(TraceLayer::new_for_http());

        Ok(match self.cors {
            Some(cors) => router
                .layer(cors)
                .layer(middleware::map_response(strip_rejected_origin)),
            None => router,
        })
    }

    /// Reserve `path` in the pattern table axum dispatches with.
    fn claim_pattern(&mut self, method: &Method, path: &str) -> Result<()> {
        self.patterns.insert(path, ()).map_err(|e| match e {
            InsertError::Conflict { .. } => ServiceError::DuplicateRoute {
                method: method.clone(),
                path: path.to_string(),
            },
            other => invalid_path(path, &other.to_string()),
        })
    }
}

fn invalid_path(path: &str, reason: &str) -> ServiceError {
    ServiceError::InvalidRoutePath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

fn join_path(prefix: &str, path: &str) -> Result<String> {
    if !path.starts_with('/') {
        return Err(invalid_path(path, "paths must start with '/'"));
    }

    let prefix = prefix.trim_end_matches('/');
    if path == "/" && !prefix.is_empty() {
        return Ok(prefix.to_string());
    }

    Ok(format!("{prefix}{path}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    struct EchoRoutes;

    impl RouteProvider for EchoRoutes {
        fn routes(&self) -> Vec<RouteSpec> {
            vec![
                RouteSpec::get("/echo", || async { "get" }),
                RouteSpec::post("/echo", || async { "post" }),
                RouteSpec::get("/", || async { "root" }),
            ]
        }
    }

    async fn status_of(router: &Router, method: Method, uri: &str) -> StatusCode {
        router
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[test]
    fn service_info_is_compiled_in() {
        let info = ServiceInfo::current();
        assert_eq!(info.title, "AI Service");
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(ServiceInfo::default(), info);
    }

    #[test]
    fn join_path_handles_slashes() {
        assert_eq!(join_path("/api/v1", "/echo").unwrap(), "/api/v1/echo");
        assert_eq!(join_path("/api/v1/", "/echo").unwrap(), "/api/v1/echo");
        assert_eq!(join_path("/api/v1", "/").unwrap(), "/api/v1");
        assert_eq!(join_path("", "/echo").unwrap(), "/echo");
        assert!(join_path("/api/v1", "echo").is_err());
    }

    #[test]
    fn duplicate_route_is_rejected() {
        let result = ServiceShell::new(ServiceInfo::current())
            .route(Method::GET, "/health", || async { "a" })
            .and_then(|shell| shell.route(Method::GET, "/health", || async { "b" }));

        match result {
            Err(ServiceError::DuplicateRoute { method, path }) => {
                assert_eq!(method, Method::GET);
                assert_eq!(path, "/health");
            }
            other => panic!("expected duplicate route error, got {:?}", other.err()),
        }
    }

    #[test]
    fn duplicate_detection_spans_providers() {
        let result = ServiceShell::new(ServiceInfo::current())
            .route(Method::GET, "/api/v1/echo", || async { "direct" })
            .and_then(|shell| shell.mount(API_PREFIX, &EchoRoutes));

        assert!(matches!(
            result,
            Err(ServiceError::DuplicateRoute { .. })
        ));
    }

    #[test]
    fn relative_path_is_rejected() {
        let result =
            ServiceShell::new(ServiceInfo::current()).route(Method::GET, "health", || async {});
        assert!(matches!(result, Err(ServiceError::InvalidRoutePath { .. })));
    }

    struct RenamedParamRoutes;

    impl RouteProvider for RenamedParamRoutes {
        fn routes(&self) -> Vec<RouteSpec> {
            vec![
                RouteSpec::get("/items/:id", || async { "get" }),
                RouteSpec::post("/items/:name", || async { "post" }),
            ]
        }
    }

    #[test]
    fn renamed_parameter_conflict_is_duplicate() {
        let result = ServiceShell::new(ServiceInfo::current()).mount(API_PREFIX, &RenamedParamRoutes);

        match result {
            Err(ServiceError::DuplicateRoute { method, path }) => {
                assert_eq!(method, Method::POST);
                assert_eq!(path, "/api/v1/items/:name");
            }
            other => panic!("expected duplicate route error, got {:?}", other.err()),
        }
    }

    #[test]
    fn misplaced_wildcard_is_invalid() {
        let result =
            ServiceShell::new(ServiceInfo::current()).route(Method::GET, "/a/*rest/b", || async {});

        match result {
            Err(ServiceError::InvalidRoutePath { path, reason }) => {
                assert_eq!(path, "/a/*rest/b");
                assert!(!reason.is_empty());
            }
            other => panic!("expected invalid path error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn same_pattern_accepts_more_methods() {
        let router = ServiceShell::new(ServiceInfo::current())
            .route(Method::GET, "/items/:id", || async { "get" })
            .and_then(|shell| shell.route(Method::DELETE, "/items/:id", || async { "delete" }))
            .unwrap()
            .into_router()
            .unwrap();

        assert_eq!(status_of(&router, Method::GET, "/items/7").await, StatusCode::OK);
        assert_eq!(status_of(&router, Method::DELETE, "/items/7").await, StatusCode::OK);
    }

    #[test]
    fn docs_paths_are_reserved() {
        let result = ServiceShell::new(ServiceInfo::current())
            .with_docs()
            .route(Method::GET, "/openapi.json", || async {})
            .and_then(ServiceShell::into_router);
        assert!(matches!(result, Err(ServiceError::DuplicateRoute { .. })));

        let result = ServiceShell::new(ServiceInfo::current())
            .route(Method::GET, "/docs", || async {})
            .and_then(|shell| shell.with_docs().into_router());
        assert!(matches!(result, Err(ServiceError::DuplicateRoute { .. })));

        let result = ServiceShell::new(ServiceInfo::current())
            .route(Method::POST, "/docs/", || async {})
            .and_then(|shell| shell.with_docs().into_router());
        assert!(matches!(result, Err(ServiceError::DuplicateRoute { .. })));
    }

    #[tokio::test]
    async fn mounted_provider_is_reachable_under_prefix() {
        let router = ServiceShell::new(ServiceInfo::current())
            .mount(API_PREFIX, &EchoRoutes)
            .unwrap()
            .into_router()
            .unwrap();

        assert_eq!(status_of(&router, Method::GET, "/api/v1/echo").await, StatusCode::OK);
        assert_eq!(status_of(&router, Method::POST, "/api/v1/echo").await, StatusCode::OK);
        assert_eq!(status_of(&router, Method::GET, "/api/v1").await, StatusCode::OK);
        assert_eq!(status_of(&router, Method::GET, "/echo").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unmatched_method_is_not_found() {
        let router = ServiceShell::new(ServiceInfo::current())
            .route(Method::GET, "/health", || async { "ok" })
            .unwrap()
            .into_router()
            .unwrap();

        assert_eq!(status_of(&router, Method::DELETE, "/health").await, StatusCode::NOT_FOUND);
        assert_eq!(status_of(&router, Method::POST, "/health").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_provider_mounts_nothing() {
        let router = ServiceShell::new(ServiceInfo::current())
            .mount(API_PREFIX, &NoRoutes)
            .unwrap()
            .into_router()
            .unwrap();

        assert_eq!(status_of(&router, Method::GET, "/api/v1").await, StatusCode::NOT_FOUND);
    }
}
