//! Paths and payloads of the endpoints the session layer talks to.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use nextstep_core::{AccessToken, Credential, Identity, RefreshToken};

pub const LOGIN: &str = "/auth/login";
pub const REGISTER: &str = "/auth/register";
pub const PROFILE: &str = "/users/profile";
pub const HEALTH: &str = "/health";
pub const VERSION: &str = "/health/version";

/// Body of `POST /auth/login`. The identifier is sent as `email`.
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /auth/register`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

/// Payload returned by login and register.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: Identity,
}

impl AuthResponse {
    pub fn into_parts(self) -> (Identity, Credential) {
        let refresh = self
            .refresh_token
            .filter(|t| !t.is_empty())
            .map(RefreshToken::new);
        (
            self.user,
            Credential::new(AccessToken::new(self.token), refresh),
        )
    }
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Payload of `GET /health`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthStatus {
    pub fn is_up(&self) -> bool {
        self.status.eq_ignore_ascii_case("UP")
    }
}

/// Payload of `GET /health/version`. Fields beyond name and version are
/// kept as-is.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct VersionInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
