//! # Axum Helpers
//!
//! Shared plumbing for the SmartChef HTTP services.
//!
//! - **[`errors`]**: `AppError` and the JSON error body with [`ErrorCode`]s
//! - **[`extractors`]**: `ValidatedJson`, whose rejections are `AppError`s
//! - **[`http`]**: CORS and security-header middleware
//! - **[`server`]**: router assembly, `/health`, readiness aggregation, graceful shutdown

pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use server::{
    CheckStatus, HealthCheckFuture, HealthResponse, ReadyResponse, ShutdownCoordinator,
    create_production_app, create_router, health_router, run_health_checks,
    shutdown_signal,
};

pub use http::{create_cors_layer, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::ValidatedJson;
