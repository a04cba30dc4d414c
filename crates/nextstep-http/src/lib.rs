//! nextstep-http - HTTP session client for the NextStep API.
//!
//! [`AuthClient`] runs login, register, logout and profile fetches against
//! the service and keeps a [`SessionState`](nextstep_core::SessionState) in
//! step with what the service says. Every request goes through the
//! [`Interceptor`], which attaches the bearer credential and ends the
//! session when the service answers 401.

pub mod api;
pub mod config;
pub mod interceptor;
pub mod session;

pub use api::ApiClient;
pub use api::endpoints::{HealthStatus, VersionInfo};
pub use config::ClientConfig;
pub use interceptor::Interceptor;
pub use session::AuthClient;
