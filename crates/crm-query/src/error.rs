//! Error types for CRM access.

use thiserror::Error;

/// Errors from executing a query. Each one becomes a single assistant
/// message; none of them ends the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The session token was rejected
    #[error("Session expired or invalid, please log in again: {0}")]
    AuthExpired(String),

    /// The CRM rejected the statement
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    /// The request never got a response
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Any other non-success response
    #[error("CRM API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded
    #[error("Failed to decode CRM response: {0}")]
    Decode(String),
}

/// Errors from logging in.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username, password, token or app credentials were rejected
    #[error("Invalid login: {0}")]
    InvalidLogin(String),

    /// Required settings are absent
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Failed to decode token response: {0}")]
    Decode(String),
}
