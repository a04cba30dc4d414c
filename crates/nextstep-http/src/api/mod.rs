//! Low-level access to the NextStep HTTP API.

mod client;
pub mod endpoints;

pub use client::ApiClient;
