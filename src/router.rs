//! Radix-tree request router and dispatcher.
//!
//! One tree per HTTP method, O(path-length) lookup. [`App`] owns the route
//! tables, the middleware chain, and the two built-in outcomes: the fallback
//! for unmatched paths (replaceable, the static file server in production)
//! and the `405` responder for paths registered under a different method.
//!
//! Middleware is composed at registration time. The first element of the
//! chain passed to [`App::new`] is the outermost layer; every route, the
//! fallback, and the `405` responder run through the full chain, so a layer
//! like the request logger observes every request exactly once.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use tracing::{Instrument as _, error};

use crate::context::Context;
use crate::error::Error;
use crate::handler::{BoxedHandler, Handler, Middleware};
use crate::request::Request;
use crate::respond::{self, Response};

/// The application: routes, middleware, and dispatch.
///
/// Build it once at startup; registrations chain:
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use catalogd::{App, Context, Error, Request, Response, middleware, respond};
/// # use http::{Method, StatusCode};
/// # async fn list(ctx: Arc<Context>, _req: Request) -> Result<Response, Error> {
/// #     Ok(respond::empty(&ctx, StatusCode::OK))
/// # }
/// let app = App::new(vec![middleware::request_logger, middleware::error_handler])
///     .handle(Method::GET, "/v1/images", list);
/// ```
pub struct App {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    fallback: BoxedHandler,
    method_not_allowed: BoxedHandler,
    middleware: Vec<Middleware>,
}

impl App {
    /// Creates an app running every request through `middleware`, first
    /// element outermost.
    pub fn new(middleware: Vec<Middleware>) -> Self {
        let fallback = wrap(&middleware, default_fallback.into_boxed_handler());
        let method_not_allowed = wrap(&middleware, method_not_allowed.into_boxed_handler());
        Self { routes: HashMap::new(), fallback, method_not_allowed, middleware }
    }

    /// Registers a handler for a method + path pair. Returns `self` for
    /// chaining. Path parameters use `{name}` syntax and are retrieved with
    /// [`Request::param`].
    ///
    /// # Panics
    ///
    /// Panics if `path` is invalid or conflicts with an existing
    /// registration for the same method. Overlaps are rejected at startup
    /// rather than resolved by some precedence rule at request time.
    pub fn handle(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        let wrapped = wrap(&self.middleware, handler.into_boxed_handler());
        self.routes
            .entry(method)
            .or_default()
            .insert(path, wrapped)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Replaces the fallback run when no pattern matches the path under any
    /// method. The default responds `404` with an empty body.
    pub fn not_found(mut self, handler: impl Handler) -> Self {
        self.fallback = wrap(&self.middleware, handler.into_boxed_handler());
        self
    }

    /// Routes one request and produces one response.
    ///
    /// This is the whole per-request pipeline: a fresh [`Context`], route
    /// lookup, parameter binding, and the middleware chain, all inside the
    /// request span. It never fails: the error middleware converts `Err`s
    /// and panics into envelopes, and anything that still leaks past it is
    /// converted here.
    ///
    /// Tests drive this directly, no socket required.
    pub async fn dispatch(&self, mut req: Request) -> Response {
        let ctx = Arc::new(Context::new(req.remote_addr()));
        let span = ctx.span().clone();

        let (handler, params) = match self.lookup(req.method(), req.path()) {
            Some(hit) => hit,
            None if self.other_method_matches(req.method(), req.path()) => {
                (Arc::clone(&self.method_not_allowed), HashMap::new())
            }
            None => (Arc::clone(&self.fallback), HashMap::new()),
        };
        req.set_params(params);

        match handler.call(Arc::clone(&ctx), req).instrument(span).await {
            Ok(res) => res,
            Err(err) => {
                // Reachable only when the chain was built without the error
                // middleware.
                error!(trace_id = %ctx.trace_id(), error = ?err, "error escaped the middleware chain");
                respond::error(&ctx, &err)
            }
        }
    }

    fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    fn other_method_matches(&self, method: &Method, path: &str) -> bool {
        self.routes
            .iter()
            .any(|(m, tree)| m != method && tree.at(path).is_ok())
    }
}

fn wrap(middleware: &[Middleware], handler: BoxedHandler) -> BoxedHandler {
    middleware.iter().rev().fold(handler, |h, mw| mw(h))
}

// ── Built-in outcomes ─────────────────────────────────────────────────────────

async fn default_fallback(ctx: Arc<Context>, _req: Request) -> Result<Response, Error> {
    Ok(respond::empty(&ctx, StatusCode::NOT_FOUND))
}

async fn method_not_allowed(ctx: Arc<Context>, _req: Request) -> Result<Response, Error> {
    Ok(respond::envelope(&ctx, StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"))
}
