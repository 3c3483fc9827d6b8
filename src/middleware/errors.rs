//! Error-handling middleware: the panic boundary and envelope conversion.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt as _;
use tracing::{error, warn};

use crate::context::Context;
use crate::error::Error;
use crate::handler::{BoxedHandler, Handler as _};
use crate::request::Request;
use crate::respond;

/// Wraps the rest of the chain so that no failure escapes it.
///
/// An `Err` from below is logged once (`warn` for client faults, `error`
/// for server faults, with the full variant detail) and converted into its
/// envelope response. A panic is caught, logged with the trace id, and
/// converted into the generic 500 envelope; the connection task and the
/// server keep running. Either way the layer above sees `Ok`.
///
/// Must be the innermost layer, directly around the handler.
pub fn error_handler(next: BoxedHandler) -> BoxedHandler {
    let f = move |ctx: Arc<Context>, req: Request| {
        let next = Arc::clone(&next);
        let fut = {
            let ctx = Arc::clone(&ctx);
            AssertUnwindSafe(async move { next.call(ctx, req).await }).catch_unwind()
        };
        async move {
            match fut.await {
                Ok(Ok(res)) => Ok(res),
                Ok(Err(err)) => {
                    if err.status().is_server_error() {
                        error!(trace_id = %ctx.trace_id(), error = ?err, "request failed");
                    } else {
                        warn!(trace_id = %ctx.trace_id(), error = ?err, "request rejected");
                    }
                    Ok(respond::error(&ctx, &err))
                }
                Err(panic) => {
                    let detail = panic_message(panic.as_ref());
                    error!(trace_id = %ctx.trace_id(), panic = %detail, "handler panicked");
                    Ok(respond::error(&ctx, &Error::Unhandled(detail)))
                }
            }
        }
    };
    f.into_boxed_handler()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
