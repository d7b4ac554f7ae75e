//! API middleware components

pub mod activity;
pub mod auth;
pub mod logging;
pub mod metrics;
pub mod security;

pub use activity::activity_middleware;
pub use auth::{auth_middleware, RequireAdmin, RequireUser};
pub use logging::logging_middleware;
pub use metrics::metrics_middleware;
pub use security::{security_headers_middleware, MAX_BODY_SIZE};
