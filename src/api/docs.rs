//! OpenAPI document and Swagger UI.

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{HealthState, HealthStatus};
use crate::shell::ServiceInfo;

/// Path the OpenAPI JSON is served from.
pub const OPENAPI_PATH: &str = "/openapi.json";
/// Mount point of the Swagger UI.
pub const DOCS_PATH: &str = "/docs";

#[derive(OpenApi)]
#[openapi(
    paths(super::handlers::health),
    components(schemas(HealthStatus, HealthState)),
    tags((name = "health", description = "Liveness probe"))
)]
struct ApiDoc;

/// OpenAPI document with the service metadata in its `info` block.
pub fn openapi_document(info: &ServiceInfo) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = info.title.to_string();
    doc.info.description = Some(info.description.to_string());
    doc.info.version = info.version.to_string();
    doc
}

/// Router serving the document and the UI.
pub fn docs_router(info: &ServiceInfo) -> Router {
    SwaggerUi::new(DOCS_PATH)
        .url(OPENAPI_PATH, openapi_document(info))
        .into()
}

/// Patterns the docs router registers.
pub(crate) const ROUTE_PATHS: [&str; 4] = [OPENAPI_PATH, DOCS_PATH, "/docs/", "/docs/*rest"];
