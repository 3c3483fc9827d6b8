//! Handler trait, type erasure, and the middleware type.
//!
//! # Storing handlers of different types
//!
//! Every route handler is a distinct concrete type, yet the router keeps
//! them all in one `HashMap<Method, Tree>`. They are erased behind trait
//! objects (`dyn ErasedHandler`) so the map holds a single uniform type.
//!
//! From user code to vtable call:
//!
//! ```text
//! async fn list(ctx: Arc<Context>, req: Request) -> Result<Response, Error>
//!        ↓ app.handle(Method::GET, "/v1/images", list)
//! list.into_boxed_handler()                        ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(list))                        ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(ctx, req)  at request time          ← one vtable dispatch
//! ```
//!
//! The only runtime cost per request is one Arc clone plus one virtual call,
//! negligible next to network I/O.
//!
//! # Middleware
//!
//! A [`Middleware`] takes the next handler in the chain and returns a new
//! one wrapped around it. Chains are composed once at registration time, so
//! dispatch does no per-request wrapping.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Error;
use crate::request::Request;
use crate::respond::Response;

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future resolving to the handler result.
///
/// `Pin<Box<…>>` because the runtime polls the future in place; `Send +
/// 'static` so tokio can move it across threads.
pub(crate) type BoxFuture =
    Pin<Box<dyn Future<Output = Result<Response, Error>> + Send + 'static>>;

/// The dispatch interface the router stores.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)`: it shows up in the return
/// type of `Handler::into_boxed_handler`, so it must be nameable from the
/// outside even though nothing outside can use it.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, ctx: Arc<Context>, req: Request) -> BoxFuture;
}

/// A type-erased handler on the heap, shared by every request that hits its
/// route. One atomic increment per request, no copying.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// A middleware layer: wraps the next handler and returns the wrapped one.
///
/// Plain function pointers keep the chain inspectable and force layers to be
/// stateless; per-request state belongs in the [`Context`].
pub type Middleware = fn(BoxedHandler) -> BoxedHandler;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// The bound every route handler satisfies.
///
/// Never implemented by hand: any `async fn` or closure of the shape
///
/// ```text
/// async fn name(ctx: Arc<Context>, req: Request) -> Result<Response, Error>
/// ```
///
/// gets it through the blanket impl below, and the private `Sealed`
/// supertrait makes that blanket impl the only possible one.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

/// `Sealed` lives in a private module, so no other crate can name it, let
/// alone implement `Handler` on its own types.
mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut> private::Sealed for F
where
    F: Fn(Arc<Context>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
}

impl<F, Fut> Handler for F
where
    F: Fn(Arc<Context>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Newtype carrying a concrete handler `F` into the trait-object world via
/// its [`ErasedHandler`] impl.
struct FnHandler<F>(F);

impl<F, Fut> ErasedHandler for FnHandler<F>
where
    F: Fn(Arc<Context>, Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    fn call(&self, ctx: Arc<Context>, req: Request) -> BoxFuture {
        Box::pin((self.0)(ctx, req))
    }
}
