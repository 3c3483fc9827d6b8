//! Outgoing response type and the single place responses are written.
//!
//! Every handler and middleware produces its [`Response`] through the
//! constructors here, which record the status in the [`Context`] as a side
//! effect. That recording is what the request logger reads, and it is
//! write-once: the first writer wins and later attempts are logged and
//! ignored, so a double-responding bug is visible instead of silent.
//!
//! [`error`] is the classifier: one [`Error`](crate::Error) in, one status
//! and one [`ErrorEnvelope`] out. Nothing else in the crate builds envelopes.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;
use tracing::{error, warn};

use crate::context::Context;
use crate::error::{Error, ErrorEnvelope};

const INTERNAL_ERROR: &str = "An internal error has occurred";

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// Constructed via [`json`], [`empty`], [`bytes`] or [`error`]; fields are
/// private so every response passes through the status-recording path.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Response {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        for (name, value) in &self.headers {
            // Names and values originate in this crate and always parse.
            if let (Ok(name), Ok(value)) =
                (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str()))
            {
                res.headers_mut().insert(name, value);
            }
        }
        res
    }
}

// ── Constructors ─────────────────────────────────────────────────────────────

/// JSON response. A value that fails to serialize degrades to the generic
/// 500 envelope after logging; the client never sees a half-written body.
pub fn json<T: Serialize>(ctx: &Context, status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => finish(ctx, status, content_type_json(), Bytes::from(body)),
        Err(err) => {
            error!(trace_id = %ctx.trace_id(), error = %err, "response serialization failed");
            envelope(ctx, StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
        }
    }
}

/// Response with no body.
pub fn empty(ctx: &Context, status: StatusCode) -> Response {
    record(ctx, status);
    Response { status, headers: Vec::new(), body: Bytes::new() }
}

/// Response with an explicit content type, for non-JSON payloads.
pub fn bytes(
    ctx: &Context,
    status: StatusCode,
    content_type: &str,
    body: impl Into<Bytes>,
) -> Response {
    finish(
        ctx,
        status,
        vec![("content-type".to_owned(), content_type.to_owned())],
        body.into(),
    )
}

/// Classifies an [`Error`] into its status and public envelope.
///
/// Variant payloads stay server-side; the wire carries only the fixed
/// message for the class, plus the field list for validation failures.
pub fn error(ctx: &Context, err: &Error) -> Response {
    let env = match err {
        Error::NotFound => ErrorEnvelope::new("Entity not found"),
        Error::InvalidId => ErrorEnvelope::new("ID is not in its proper form"),
        Error::Validation(fields) => {
            ErrorEnvelope::with_fields("field validation failure", fields.clone())
        }
        Error::Filter(_) => ErrorEnvelope::new("Query filter is not in its proper form"),
        Error::Store(_) | Error::Io(_) | Error::Unhandled(_) => {
            ErrorEnvelope::new(INTERNAL_ERROR)
        }
    };
    write_envelope(ctx, err.status(), &env)
}

/// Bare envelope with a fixed message, for responses that have no [`Error`]
/// behind them (405, the dispatch leak guard).
pub(crate) fn envelope(ctx: &Context, status: StatusCode, message: &str) -> Response {
    write_envelope(ctx, status, &ErrorEnvelope::new(message))
}

// ── Internals ────────────────────────────────────────────────────────────────

fn write_envelope(ctx: &Context, status: StatusCode, env: &ErrorEnvelope) -> Response {
    // Strings and vectors of strings; this serialization cannot fail.
    let body = serde_json::to_vec(env).unwrap_or_default();
    finish(ctx, status, content_type_json(), Bytes::from(body))
}

fn finish(
    ctx: &Context,
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Bytes,
) -> Response {
    record(ctx, status);
    Response { status, headers, body }
}

fn content_type_json() -> Vec<(String, String)> {
    vec![("content-type".to_owned(), "application/json".to_owned())]
}

fn record(ctx: &Context, status: StatusCode) {
    if !ctx.record_status(status) {
        warn!(
            trace_id = %ctx.trace_id(),
            recorded = ?ctx.status().map(|s| s.as_u16()),
            attempted = status.as_u16(),
            "response status already recorded, keeping the first",
        );
    }
}
