//! Error types for client operations.

use thiserror::Error;

/// Errors surfaced by the client.
///
/// Failures are always reported upward with enough context to diagnose
/// without re-querying; nothing is swallowed or silently retried, and no
/// partial success is ever returned as success.
#[derive(Debug, Error)]
pub enum FahError {
    /// Missing, unreadable, or malformed key/certificate material. Fatal at
    /// client construction.
    #[error("credential error: {0}")]
    Credential(String),

    /// A remote call returned a non-200 status. The response body is
    /// preserved verbatim.
    #[error("request failed with {status}: {body}")]
    Remote { status: u16, body: String },

    /// Local filesystem failure, surfaced before any network attempt where
    /// detectable in advance.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed resource payload: invalid IP address, unknown enum value,
    /// or a field that fails format validation. The message names the
    /// offending field.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Transport-level failure (connection, TLS handshake, timeout).
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<validator::ValidationErrors> for FahError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let message = field_errors
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(message) => format!("field `{}`: {}", field, message),
                    None => format!("field `{}`: {}", field, e.code),
                })
            })
            .collect::<Vec<_>>()
            .join("; ");
        FahError::Validation { message }
    }
}
