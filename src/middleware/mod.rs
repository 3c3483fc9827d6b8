//! Built-in middleware.
//!
//! Two layers cover the cross-cutting concerns every route shares:
//!
//! - [`request_logger`] runs outermost and emits exactly one log line per
//!   request, after everything below it has finished.
//! - [`error_handler`] runs innermost, directly around the handler. It is
//!   the panic boundary and the place `Err` results become envelope
//!   responses; layers above it only ever see `Ok`.
//!
//! Pass them to [`App::new`](crate::App::new) in that order:
//!
//! ```rust
//! use catalogd::{App, middleware};
//!
//! let app = App::new(vec![middleware::request_logger, middleware::error_handler]);
//! ```

mod errors;
mod logger;

pub use errors::error_handler;
pub use logger::request_logger;
