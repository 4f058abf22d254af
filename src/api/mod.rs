//! HTTP API module: liveness probe, CORS policy, docs and request metrics.

pub mod cors;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use cors::CorsPolicy;
pub use handlers::{HealthState, HealthStatus};
pub use routes::create_router;
