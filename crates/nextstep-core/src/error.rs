//! Error types for the NextStep session layer.
//!
//! This module provides a unified error type with explicit variants for
//! transport, credential rejection, input validation, service, local session
//! and storage errors.

use std::fmt;
use thiserror::Error;

/// The unified error type for session operations.
///
/// The first four variants mirror the remote failure taxonomy and are passed
/// through to callers unmodified. [`Error::AuthRejected`] is additionally
/// observed by the transport layer, which drives the session back to
/// anonymous before the error reaches the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure; no response was received.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// The remote service refused the credential (HTTP 401).
    #[error("credential rejected: {0}")]
    AuthRejected(ServiceFailure),

    /// The remote service rejected the submitted input.
    #[error("validation failed: {0}")]
    Validation(ServiceFailure),

    /// Any other non-success response.
    #[error("service error: {0}")]
    Service(ServiceFailure),

    /// A local session-state precondition did not hold.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// The credential store could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation errors (invalid base URL, malformed values).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns the service failure details for remote errors.
    pub fn service_failure(&self) -> Option<&ServiceFailure> {
        match self {
            Error::AuthRejected(f) | Error::Validation(f) | Error::Service(f) => Some(f),
            _ => None,
        }
    }

    /// Returns the remote error code, if the service supplied one.
    pub fn error_code(&self) -> Option<&str> {
        self.service_failure().and_then(|f| f.error_code.as_deref())
    }

    /// Check if this is a credential rejection.
    pub fn is_auth_rejected(&self) -> bool {
        matches!(self, Error::AuthRejected(_))
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error (body decoding, redirect loops, builder errors).
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// A failure reported by the remote service.
///
/// Message and error code are taken verbatim from the response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFailure {
    /// HTTP status code.
    pub status: u16,
    /// Envelope error code (e.g. `PASSWORD_MISMATCH`), if present.
    pub error_code: Option<String>,
    /// Envelope message, if present.
    pub message: Option<String>,
}

impl ServiceFailure {
    /// Create a new service failure.
    pub fn new(status: u16, error_code: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error_code,
            message,
        }
    }

    /// Classify this failure into the error taxonomy.
    ///
    /// `envelope_rejected` is true when the transport status was successful
    /// but the envelope carried `success: false`.
    pub fn classify(self, envelope_rejected: bool) -> Error {
        match self.status {
            401 => Error::AuthRejected(self),
            400 | 409 | 422 => Error::Validation(self),
            200..=299 if envelope_rejected => Error::Validation(self),
            _ => Error::Service(self),
        }
    }
}

impl fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref code) = self.error_code {
            write!(f, " [{}]", code)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

/// Local session-state errors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The operation needs an authenticated session.
    #[error("not authenticated")]
    NotAuthenticated,

    /// A login or register call is already outstanding.
    #[error("authentication already in progress")]
    AuthInProgress,

    /// A session is already established; log out first.
    #[error("already authenticated")]
    AlreadyAuthenticated,

    /// The session changed while the request was in flight and the
    /// response was discarded.
    #[error("session changed while the request was in flight")]
    Superseded,
}

/// Credential store errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be decoded.
    #[error("corrupt entry '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    /// Data could not be encoded for storage.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The backing store is unavailable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
