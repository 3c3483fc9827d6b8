//! Health-check handler set.
//!
//! Two probes, two questions:
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | Liveness | `/v1/healthz` | Is the process alive? |
//! | Readiness | `/v1/readiness` | Can it reach its store? |
//!
//! Both answer with the same report shape, so probes and dashboards parse
//! one thing. A failed readiness check is a report, not an error envelope:
//! the caller asked "are you ready" and the answer is "no, because".

use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;

use crate::context::Context;
use crate::error::Error;
use crate::request::Request;
use crate::respond::{self, Response};
use crate::store::Store;

#[derive(Debug, Serialize)]
struct HealthReport {
    result: bool,
    errors: Vec<String>,
    version: String,
}

impl HealthReport {
    fn ok() -> Self {
        Self { result: true, errors: Vec::new(), version: version() }
    }

    fn failing(error: String) -> Self {
        Self { result: false, errors: vec![error], version: version() }
    }
}

fn version() -> String {
    env!("CARGO_PKG_VERSION").to_owned()
}

pub struct HealthApi {
    store: Arc<dyn Store>,
}

impl HealthApi {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Liveness: if this handler runs at all, the process is alive.
    /// Always 200, no dependencies consulted.
    pub async fn healthz(
        self: Arc<Self>,
        ctx: Arc<Context>,
        _req: Request,
    ) -> Result<Response, Error> {
        Ok(respond::json(&ctx, StatusCode::OK, &HealthReport::ok()))
    }

    /// Readiness: pings the store. 200 when it answers, 500 with the ping
    /// error in the report when it does not.
    pub async fn readiness(
        self: Arc<Self>,
        ctx: Arc<Context>,
        _req: Request,
    ) -> Result<Response, Error> {
        match self.store.ping().await {
            Ok(()) => Ok(respond::json(&ctx, StatusCode::OK, &HealthReport::ok())),
            Err(err) => Ok(respond::json(
                &ctx,
                StatusCode::INTERNAL_SERVER_ERROR,
                &HealthReport::failing(err.to_string()),
            )),
        }
    }
}
