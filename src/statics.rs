//! Static file serving, wired in as the router's not-found fallback.
//!
//! Any request no route claims lands here: `GET /` serves `index.html`,
//! anything else is resolved relative to the configured statics directory.
//! Only `GET` and `HEAD` are served; path segments are checked before the
//! filesystem is touched, so `..` never escapes the directory. Missing
//! files answer 404 with an empty body, matching the router's own
//! not-found shape.

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};

use crate::context::Context;
use crate::error::Error;
use crate::handler::Handler;
use crate::request::Request;
use crate::respond::{self, Response};

/// A fallback handler serving files under `dir`.
pub fn serve(dir: PathBuf) -> impl Handler {
    move |ctx: Arc<Context>, req: Request| {
        let dir = dir.clone();
        async move { serve_file(dir, ctx, req).await }
    }
}

async fn serve_file(dir: PathBuf, ctx: Arc<Context>, req: Request) -> Result<Response, Error> {
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return Ok(respond::empty(&ctx, StatusCode::NOT_FOUND));
    }

    let trimmed = req.path().trim_start_matches('/');
    let rel = if trimmed.is_empty() { "index.html" } else { trimmed };

    // Plain names and subdirectories only; dot-segments never reach the
    // filesystem.
    if rel.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return Ok(respond::empty(&ctx, StatusCode::NOT_FOUND));
    }

    let path = dir.join(rel);
    match tokio::fs::read(&path).await {
        Ok(body) => {
            let content_type = content_type(&path);
            let body = if req.method() == Method::HEAD { Bytes::new() } else { body.into() };
            Ok(respond::bytes(&ctx, StatusCode::OK, content_type, body))
        }
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::IsADirectory) => {
            Ok(respond::empty(&ctx, StatusCode::NOT_FOUND))
        }
        Err(e) => Err(e.into()),
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(OsStr::to_str) {
        Some("css") => "text/css; charset=utf-8",
        Some("html") => "text/html; charset=utf-8",
        Some("ico") => "image/x-icon",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("yaml") | Some("yml") => "application/yaml",
        _ => "application/octet-stream",
    }
}
