//! Serves the API document.

use std::path::PathBuf;
use std::sync::Arc;

use http::StatusCode;

use crate::context::Context;
use crate::error::Error;
use crate::request::Request;
use crate::respond::{self, Response};

/// Serves the swagger document with its `{{url}}` placeholder replaced by
/// the address clients should actually call.
pub struct DocsApi {
    path: PathBuf,
    public_url: String,
}

impl DocsApi {
    pub fn new(path: PathBuf, public_url: String) -> Self {
        Self { path, public_url }
    }

    /// The document is read per request, so edits show up without a
    /// restart. An unreadable file is a server fault.
    pub async fn retrieve(
        self: Arc<Self>,
        ctx: Arc<Context>,
        _req: Request,
    ) -> Result<Response, Error> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let body = raw.replace("{{url}}", &self.public_url);
        Ok(respond::bytes(&ctx, StatusCode::OK, "application/yaml", body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write as _;

    use bytes::Bytes;
    use http::{HeaderMap, Method};

    fn ctx() -> Arc<Context> {
        Arc::new(Context::new(([127, 0, 0, 1], 3000).into()))
    }

    fn get() -> Request {
        Request::new(
            Method::GET,
            "/v1/swagger/swagger.yaml".parse().unwrap(),
            HeaderMap::new(),
            Bytes::new(),
            ([127, 0, 0, 1], 3000).into(),
        )
    }

    #[tokio::test]
    async fn url_placeholder_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swagger.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "swagger: \"2.0\"\nhost: {{{{url}}}}").unwrap();

        let api = Arc::new(DocsApi::new(path, "api.example.com:3000".to_owned()));
        let res = api.retrieve(ctx(), get()).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.header("content-type"), Some("application/yaml"));
        let body = std::str::from_utf8(res.body()).unwrap();
        assert!(body.contains("host: api.example.com:3000"));
        assert!(!body.contains("{{url}}"));
    }

    #[tokio::test]
    async fn a_missing_document_is_a_server_fault() {
        let api = Arc::new(DocsApi::new(PathBuf::from("/nonexistent/swagger.yaml"), String::new()));
        let err = api.retrieve(ctx(), get()).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
