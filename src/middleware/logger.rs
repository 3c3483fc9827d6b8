//! Request logging middleware.

use std::sync::Arc;

use http::StatusCode;
use tracing::info;

use crate::context::Context;
use crate::handler::{BoxedHandler, Handler as _};
use crate::request::Request;

/// Emits one line per request once the rest of the chain has finished:
/// trace id, status, method, path, peer address, elapsed time.
///
/// Must be the outermost layer so the elapsed time covers the whole chain
/// and the status read from the [`Context`] is final. The status falls back
/// to the returned response for handlers that bypassed the recording path,
/// and to 500 for an `Err` that no inner layer converted.
pub fn request_logger(next: BoxedHandler) -> BoxedHandler {
    let f = move |ctx: Arc<Context>, req: Request| {
        let next = Arc::clone(&next);
        async move {
            // Snapshot before the request is consumed by the chain.
            let method = req.method().clone();
            let path = req.path().to_owned();

            let result = next.call(Arc::clone(&ctx), req).await;

            let status = ctx
                .status()
                .or_else(|| result.as_ref().ok().map(|res| res.status()))
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            info!(
                trace_id = %ctx.trace_id(),
                status = status.as_u16(),
                method = %method,
                path = %path,
                remote = %ctx.remote_addr(),
                elapsed = ?ctx.elapsed(),
                "request completed",
            );
            result
        }
    };
    f.into_boxed_handler()
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;

    use bytes::Bytes;
    use http::{HeaderMap, Method};
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::error::Error;
    use crate::respond::{self, Response};
    use crate::router::App;

    #[derive(Clone, Default)]
    struct Sink(Arc<Mutex<Vec<u8>>>);

    impl Sink {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Sink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Sink {
        type Writer = Sink;

        fn make_writer(&'a self) -> Sink {
            self.clone()
        }
    }

    fn req(method: Method, uri: &str) -> Request {
        Request::new(
            method,
            uri.parse().unwrap(),
            HeaderMap::new(),
            Bytes::new(),
            ([127, 0, 0, 1], 4000).into(),
        )
    }

    async fn created(ctx: Arc<Context>, _req: Request) -> Result<Response, Error> {
        Ok(respond::empty(&ctx, StatusCode::CREATED))
    }

    #[tokio::test]
    async fn one_line_per_request_with_the_recorded_status() {
        let sink = Sink::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(sink.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let app = App::new(vec![request_logger, crate::middleware::error_handler])
            .handle(Method::POST, "/v1/images", created);

        app.dispatch(req(Method::POST, "/v1/images")).await;

        let logged = sink.contents();
        assert_eq!(
            logged.matches("request completed").count(),
            1,
            "expected exactly one completion line, got:\n{logged}"
        );
        assert!(logged.contains("status=201"), "line carries the real status:\n{logged}");
        assert!(logged.contains("path=/v1/images"), "line carries the path:\n{logged}");
    }

    #[tokio::test]
    async fn unrouted_requests_are_logged_too() {
        let sink = Sink::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(sink.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let app = App::new(vec![request_logger, crate::middleware::error_handler]);
        app.dispatch(req(Method::GET, "/nothing/here")).await;

        let logged = sink.contents();
        assert_eq!(logged.matches("request completed").count(), 1);
        assert!(logged.contains("status=404"), "fallback status is logged:\n{logged}");
    }
}
