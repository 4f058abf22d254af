//! Request accounting middleware.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};

use crate::metrics::{self, UNMATCHED_PATH};

/// Record count and latency per (method, route, status).
///
/// The route template is used as the path label, so unmatched requests
/// collapse into a single series.
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_PATH.to_owned());

    let response = next.run(req).await;

    metrics::record_http_request(&method, &path, response.status(), start);

    response
}
