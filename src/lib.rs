//! # catalogd
//!
//! A resource-catalog HTTP service: CRUD over image and media records in
//! Postgres, URL query filters compiled to parameterized SQL, and a
//! platform event published for every stored image.
//!
//! ## The shape
//!
//! The HTTP core is deliberately small and lives right here: a radix-tree
//! router ([`App`]), function-pointer middleware composed once at
//! registration, a typed per-request [`Context`], and one error taxonomy
//! ([`Error`]) classified at a single point. TLS, rate limiting, slow
//! clients and body-size limits belong to the reverse proxy in front; the
//! service does service things.
//!
//! Collaborators sit behind ports: [`store::Store`] for rows,
//! [`events::EventPublisher`] for announcements. Production wires Postgres
//! and a broker; tests and demos wire the in-memory implementations and
//! drive [`App::dispatch`] without a socket.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use catalogd::config::Config;
//! use catalogd::events::NoopPublisher;
//! use catalogd::store::MemoryStore;
//! use catalogd::{Server, handlers};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::default();
//!     let app = handlers::api(Arc::new(MemoryStore::new()), Arc::new(NoopPublisher), &config);
//!
//!     Server::bind(&config.addr()).serve(app).await.unwrap();
//! }
//! ```

mod context;
mod handler;
mod request;
mod router;
mod server;

pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod model;
pub mod respond;
pub mod statics;
pub mod store;

pub use context::Context;
pub use error::Error;
pub use handler::{Handler, Middleware};
pub use request::Request;
pub use respond::Response;
pub use router::App;
pub use server::Server;
