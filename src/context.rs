//! Per-request context.
//!
//! One [`Context`] is created by [`App::dispatch`](crate::App::dispatch) for
//! each request and shared down the middleware chain behind an `Arc`. It is
//! never reused across requests. Everything in it is strongly typed; there is
//! no bag of values to downcast out of.

use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use http::StatusCode;
use tracing::{Span, info_span};
use uuid::Uuid;

/// State shared by every layer handling one request.
pub struct Context {
    trace_id: Uuid,
    started_at: Instant,
    remote_addr: SocketAddr,
    // Write-once. The first respond::* call claims it; the request logger
    // reads it after the chain completes.
    status: OnceLock<StatusCode>,
    span: Span,
}

impl Context {
    pub(crate) fn new(remote_addr: SocketAddr) -> Self {
        let trace_id = Uuid::new_v4();
        let span = info_span!("request", trace_id = %trace_id);
        Self {
            trace_id,
            started_at: Instant::now(),
            remote_addr,
            status: OnceLock::new(),
            span,
        }
    }

    /// The id correlating every log line this request emits.
    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Time since dispatch started.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Records the response status. Returns `false` if one was already
    /// recorded, in which case the stored value is unchanged.
    pub fn record_status(&self, status: StatusCode) -> bool {
        self.status.set(status).is_ok()
    }

    /// The recorded response status, if any layer has responded yet.
    pub fn status(&self) -> Option<StatusCode> {
        self.status.get().copied()
    }

    /// The span the whole pipeline runs under. Log lines emitted inside it
    /// carry the trace id without threading it by hand.
    pub(crate) fn span(&self) -> &Span {
        &self.span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Context {
        Context::new(([127, 0, 0, 1], 4000).into())
    }

    #[test]
    fn status_is_write_once() {
        let ctx = ctx();
        assert_eq!(ctx.status(), None);
        assert!(ctx.record_status(StatusCode::OK));
        assert!(!ctx.record_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(ctx.status(), Some(StatusCode::OK));
    }

    #[test]
    fn each_context_gets_its_own_trace_id() {
        assert_ne!(ctx().trace_id(), ctx().trace_id());
    }
}
