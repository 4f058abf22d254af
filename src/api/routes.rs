//! HTTP API route definitions.

use axum::{http::Method, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::warn;

use super::cors::CorsPolicy;
use super::handlers::health;
use crate::config::Settings;
use crate::error::Result;
use crate::shell::{RouteProvider, ServiceInfo, ServiceShell, API_PREFIX};

/// Path of the liveness probe.
pub const HEALTH_PATH: &str = "/health";
/// Path of the Prometheus scrape endpoint.
pub const METRICS_PATH: &str = "/metrics";

/// Build the application router.
///
/// `api` is mounted under `/api/v1`. `metrics` is only consulted when
/// `settings.expose_metrics` is set.
pub fn create_router(
    settings: &Settings,
    api: &dyn RouteProvider,
    metrics: Option<PrometheusHandle>,
) -> Result<Router> {
    let mut shell = ServiceShell::new(ServiceInfo::current())
        .cors(&CorsPolicy::from_settings(settings))?
        .route(Method::GET, HEALTH_PATH, health)?
        .mount(API_PREFIX, api)?;

    if settings.enable_docs {
        shell = shell.with_docs();
    }

    if settings.expose_metrics {
        match metrics {
            Some(handle) => {
                shell = shell.route(Method::GET, METRICS_PATH, move || {
                    let handle = handle.clone();
                    async move { handle.render() }
                })?;
            }
            None => warn!("metrics exposure enabled but no recorder is installed"),
        }
    }

    shell.into_router()
}
