//! HTTP server and graceful shutdown.
//!
//! # Shutdown sequence
//!
//! When the process receives SIGTERM (what the orchestrator sends) or
//! Ctrl-C:
//!
//! 1. `listener.accept()` stops immediately; no new connections are made.
//! 2. In-flight connection tasks get [`Server::grace`] to finish
//!    (default 5 s).
//! 3. Whatever is still running after the grace period is aborted, and
//!    [`Server::serve`] returns.
//!
//! Pick a grace period longer than your slowest request; the orchestrator's
//! own kill timeout should in turn be longer than the grace period.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt as _, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::request::Request;
use crate::router::App;

const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    grace: Duration,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr, grace: DEFAULT_GRACE }
    }

    /// Sets how long in-flight connections may run after a shutdown signal.
    pub fn grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Starts accepting connections and dispatching them through `app`.
    ///
    /// Returns after a full shutdown: signal received, accept loop stopped,
    /// in-flight connections drained or aborted at the grace deadline.
    pub async fn serve(self, app: App) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // Arc so the routing table is shared across connection tasks
        // without copying it.
        let app = Arc::new(app);

        info!(addr = %self.addr, "catalogd listening");

        // JoinSet tracks every spawned connection task so shutdown can wait
        // for them.
        let mut tasks = tokio::task::JoinSet::new();

        // Pin the shutdown future so the loop can poll it repeatedly.
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // `biased` checks arms top-to-bottom, so a signal stops the
                // accept loop even when more connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = Arc::clone(&app);
                    // TokioIo adapts tokio's AsyncRead/AsyncWrite to the
                    // hyper IO traits.
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // `service_fn` is called once per request on the
                        // connection, not once per connection.
                        let svc = service_fn(move |req| {
                            let app = Arc::clone(&app);
                            async move { handle(app, req, remote_addr).await }
                        });

                        // `auto::Builder` speaks both HTTP/1.1 and HTTP/2,
                        // whatever the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not
                // grow without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Drain until the grace deadline, then kill whatever remains.
        let drained = tokio::time::timeout(self.grace, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(remaining = tasks.len(), "grace period expired, aborting connections");
            tasks.shutdown().await;
        }

        info!("catalogd stopped");
        Ok(())
    }
}

// ── Request handling ──────────────────────────────────────────────────────────

/// Per-request glue between hyper and [`App::dispatch`].
///
/// The error type is [`Infallible`]: every failure is turned into a response
/// here or below, so hyper never sees an error.
async fn handle(
    app: Arc<App>,
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    // The body is read up front; handlers see bytes, not a stream. A body
    // that cannot be read is answered before dispatch, without a Context.
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(peer = %remote_addr, "failed to read request body: {e}");
            let mut res = http::Response::new(Full::new(Bytes::new()));
            *res.status_mut() = StatusCode::BAD_REQUEST;
            return Ok(res);
        }
    };

    let request = Request::new(parts.method, parts.uri, parts.headers, body, remote_addr);
    Ok(app.dispatch(request).await.into_http())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both SIGTERM (what orchestrators send) and
/// SIGINT (Ctrl-C, for local dev). On Windows only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // `pending()` never resolves, so on non-Unix platforms the SIGTERM arm
    // is effectively disabled.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
