//! AI analysis and prediction service.
//!
//! Only the service shell exists so far: a liveness probe at `GET /health`,
//! a credentialed CORS policy for the web frontend, and an extension point
//! for the business API under `/api/v1`.
//!
//! ```text
//! request ─▶ CORS ─▶ trace ─▶ metrics ─▶ route table ─▶ handler
//!                                              └──────▶ 404
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`shell`]: Route table, route providers and middleware stack
//! - [`api`]: Handlers, CORS policy, OpenAPI docs
//! - [`metrics`]: Prometheus request metrics
//! - [`utils`]: Shutdown signal handling

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod shell;
pub mod utils;

pub use config::{ConfigSource, DefaultConfig, EnvConfig, Settings};
pub use error::{Result, ServiceError};
pub use shell::{NoRoutes, RouteProvider, RouteSpec, ServiceInfo, ServiceShell};
