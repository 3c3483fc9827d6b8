//! Catalog demo against the in-memory store: no Postgres, no broker.
//!
//! Run from the repository root (the statics dir is resolved relative to
//! the working directory):
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/v1/healthz
//!   curl http://localhost:3000/v1/images
//!   curl -X POST http://localhost:3000/v1/images \
//!        -H 'content-type: application/json' \
//!        -d '{"title":"Image Elijah Baley","url":"/images/1280/720/test-2260.jpeg","slug":"/images/1280/720/test-2260","publisher":"etf1"}'
//!   curl 'http://localhost:3000/v1/images?publisher=$eq.etf1'
//!   curl http://localhost:3000/v1/swagger/swagger.yaml

use std::sync::Arc;

use catalogd::config::Config;
use catalogd::events::NoopPublisher;
use catalogd::store::MemoryStore;
use catalogd::{Server, handlers};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::default();
    let app = handlers::api(Arc::new(MemoryStore::new()), Arc::new(NoopPublisher), &config);

    Server::bind(&config.addr())
        .grace(config.grace())
        .serve(app)
        .await
        .expect("server error");
}
