//! Error taxonomy and the wire envelope.
//!
//! Handlers return `Result<Response, Error>`. Every `Error` variant maps to
//! exactly one status code and one public envelope message; the mapping lives
//! in [`respond::error`](crate::respond::error), the only place envelopes are
//! written. Variant payloads (the offending filter parameter, the sqlx error,
//! the panic payload) are for server-side logs and never reach the wire.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use crate::filter::FilterError;
use crate::store::StoreError;

// ── Error ─────────────────────────────────────────────────────────────────────

/// The error type returned by handlers and the fallible plumbing under them.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The requested entity does not exist.
    #[error("entity not found")]
    NotFound,

    /// The id path parameter is not a UUID.
    #[error("id is not a valid uuid")]
    InvalidId,

    /// The request body failed validation. Field order follows the input
    /// struct's declaration order.
    #[error("field validation failure")]
    Validation(Vec<FieldError>),

    /// The query string is not a valid filter expression.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// The store rejected or could not execute an operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Socket or filesystem failure.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// A panic caught at the middleware boundary. Carries the panic payload
    /// rendered as text.
    #[error("unhandled: {0}")]
    Unhandled(String),
}

impl Error {
    /// The response status this error classifies to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidId | Self::Validation(_) | Self::Filter(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) | Self::Io(_) | Self::Unhandled(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// ── Wire envelope ─────────────────────────────────────────────────────────────

/// One failed field check: which field, and the short reason symbol
/// (`required`, `min`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field_name: String,
    pub error: String,
}

impl FieldError {
    pub fn new(field_name: &str, error: &str) -> Self {
        Self { field_name: field_name.to_owned(), error: error.to_owned() }
    }
}

/// The one JSON shape every failed request carries.
///
/// `fields` is present only for validation failures; it serializes away
/// entirely otherwise, so clients checking `{"error": "..."}` never see a
/// `"fields": null` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

impl ErrorEnvelope {
    pub fn new(error: &str) -> Self {
        Self { error: error.to_owned(), fields: None }
    }

    pub fn with_fields(error: &str, fields: Vec<FieldError>) -> Self {
        Self { error: error.to_owned(), fields: Some(fields) }
    }
}

// ── Validate ──────────────────────────────────────────────────────────────────

/// Input types that can vet themselves before reaching the store.
///
/// Implementations collect every failed check into one
/// [`Error::Validation`] so the client sees the full list at once.
pub trait Validate {
    fn validate(&self) -> Result<(), Error>;
}
