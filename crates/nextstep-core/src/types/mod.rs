//! Core domain types.
//!
//! These types enforce invariants at construction time, so an invalid base
//! URL or an unknown role never reaches the session layer.

mod api_url;
mod identity;

pub use api_url::ApiUrl;
pub use identity::{Identity, Role, UserId};
