//! Incoming HTTP request type.

use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;

use crate::error::{Error, FieldError};

/// An incoming request with its body already read.
///
/// Built by the server loop from the hyper request, or directly by tests
/// driving [`App::dispatch`](crate::App::dispatch) without a socket.
pub struct Request {
    method: Method,
    path: String,
    raw_query: String,
    headers: HeaderMap,
    body: Bytes,
    params: HashMap<String, String>,
    remote_addr: SocketAddr,
}

impl Request {
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        remote_addr: SocketAddr,
    ) -> Self {
        Self {
            method,
            path: uri.path().to_owned(),
            raw_query: uri.query().unwrap_or("").to_owned(),
            headers,
            body,
            params: HashMap::new(),
            remote_addr,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The query string without the leading `?`, empty if absent.
    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header lookup; `None` for absent or non-UTF-8 values.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/v1/images/{id}`, `req.param("id")` on `/v1/images/42`
    /// returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    /// Decodes the body as JSON. A body that does not decode is a client
    /// fault and maps to a validation failure on the pseudo-field `body`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body)
            .map_err(|_| Error::Validation(vec![FieldError::new("body", "malformed")]))
    }
}
