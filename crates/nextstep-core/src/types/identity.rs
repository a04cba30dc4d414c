//! User identity record.

use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Numeric user identifier assigned by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account role.
///
/// Ordered by authority: `Guest < User < Premium < Mentor < Admin < Operator`.
/// The session layer carries the role but never gates on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Guest,
    User,
    Premium,
    Mentor,
    Admin,
    Operator,
}

impl Role {
    /// Authority level, 0 for `Guest` through 5 for `Operator`.
    pub fn level(self) -> u8 {
        match self {
            Role::Guest => 0,
            Role::User => 1,
            Role::Premium => 2,
            Role::Mentor => 3,
            Role::Admin => 4,
            Role::Operator => 5,
        }
    }

    /// True if this role is at least as privileged as `other`.
    pub fn has_authority_of(self, other: Role) -> bool {
        self.level() >= other.level()
    }

    /// True if this role is strictly more privileged than `other`.
    pub fn has_higher_authority_than(self, other: Role) -> bool {
        self.level() > other.level()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Guest => "GUEST",
            Role::User => "USER",
            Role::Premium => "PREMIUM",
            Role::Mentor => "MENTOR",
            Role::Admin => "ADMIN",
            Role::Operator => "OPERATOR",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user record associated with an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub role: Role,
    #[serde(with = "timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(with = "timestamp")]
    pub updated_at: NaiveDateTime,
}

/// Service timestamps are local date-times without an offset; RFC 3339
/// values are accepted too and reduced to their UTC wall-clock time.
mod timestamp {
    use super::*;

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if let Ok(dt) = NaiveDateTime::parse_from_str(&s, FORMAT) {
            return Ok(dt);
        }
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.naive_utc())
            .map_err(serde::de::Error::custom)
    }
}
