//! The catalog API: route table and handler sets.
//!
//! | Method | Path                       | Handler                  |
//! |--------|----------------------------|--------------------------|
//! | GET    | `/v1/healthz`              | [`HealthApi::healthz`]   |
//! | GET    | `/v1/readiness`            | [`HealthApi::readiness`] |
//! | GET    | `/v1/swagger/swagger.yaml` | [`DocsApi::retrieve`]    |
//! | GET    | `/v1/images`               | [`ImageApi::list`]       |
//! | POST   | `/v1/images`               | [`ImageApi::create`]     |
//! | GET    | `/v1/images/{id}`          | [`ImageApi::retrieve`]   |
//! | PUT    | `/v1/images/{id}`          | [`ImageApi::update`]     |
//! | GET    | `/v1/medias`               | [`MediaApi::list`]       |
//! | POST   | `/v1/medias`               | [`MediaApi::create`]     |
//! | GET    | `/v1/medias/{id}`          | [`MediaApi::retrieve`]   |
//! | PUT    | `/v1/medias/{id}`          | [`MediaApi::update`]     |
//!
//! Anything else falls through to the static file handler. Each handler set
//! is a struct holding its collaborators behind `Arc`, with one async method
//! per route.

mod docs;
mod health;
mod image;
mod media;

pub use docs::DocsApi;
pub use health::HealthApi;
pub use image::ImageApi;
pub use media::MediaApi;

use std::future::Future;
use std::sync::Arc;

use http::Method;
use uuid::Uuid;

use crate::config::Config;
use crate::context::Context;
use crate::error::Error;
use crate::events::EventPublisher;
use crate::handler::Handler;
use crate::middleware;
use crate::request::Request;
use crate::respond::Response;
use crate::router::App;
use crate::statics;
use crate::store::Store;

/// Builds the application with every route registered and the request
/// logger and error handler installed, in that order.
pub fn api(store: Arc<dyn Store>, events: Arc<dyn EventPublisher>, config: &Config) -> App {
    let images = Arc::new(ImageApi::new(Arc::clone(&store), events));
    let medias = Arc::new(MediaApi::new(Arc::clone(&store)));
    let health = Arc::new(HealthApi::new(store));
    let docs = Arc::new(DocsApi::new(
        config.statics.dir.join("swagger/swagger.yaml"),
        config.public_url(),
    ));

    App::new(vec![middleware::request_logger, middleware::error_handler])
        .handle(Method::GET, "/v1/healthz", route(Arc::clone(&health), HealthApi::healthz))
        .handle(Method::GET, "/v1/readiness", route(health, HealthApi::readiness))
        .handle(Method::GET, "/v1/swagger/swagger.yaml", route(docs, DocsApi::retrieve))
        .handle(Method::GET, "/v1/images", route(Arc::clone(&images), ImageApi::list))
        .handle(Method::POST, "/v1/images", route(Arc::clone(&images), ImageApi::create))
        .handle(Method::GET, "/v1/images/{id}", route(Arc::clone(&images), ImageApi::retrieve))
        .handle(Method::PUT, "/v1/images/{id}", route(images, ImageApi::update))
        .handle(Method::GET, "/v1/medias", route(Arc::clone(&medias), MediaApi::list))
        .handle(Method::POST, "/v1/medias", route(Arc::clone(&medias), MediaApi::create))
        .handle(Method::GET, "/v1/medias/{id}", route(Arc::clone(&medias), MediaApi::retrieve))
        .handle(Method::PUT, "/v1/medias/{id}", route(medias, MediaApi::update))
        .not_found(statics::serve(config.statics.dir.clone()))
}

/// Binds a handler-set method to its shared state, yielding the plain
/// `Fn(Arc<Context>, Request)` shape the router accepts.
fn route<S, Fut>(state: Arc<S>, method: fn(Arc<S>, Arc<Context>, Request) -> Fut) -> impl Handler
where
    S: Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    move |ctx, req| method(Arc::clone(&state), ctx, req)
}

/// The `{id}` path parameter as a UUID. Anything else is the client's
/// fault, not a missing entity.
fn parse_id(req: &Request) -> Result<Uuid, Error> {
    Uuid::parse_str(req.param("id").unwrap_or_default()).map_err(|_| Error::InvalidId)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use bytes::Bytes;
    use http::HeaderMap;

    fn req_with_id(id: &str) -> Request {
        let mut req = Request::new(
            Method::GET,
            "/v1/images/any".parse().unwrap(),
            HeaderMap::new(),
            Bytes::new(),
            ([127, 0, 0, 1], 3000).into(),
        );
        req.set_params(HashMap::from([("id".to_owned(), id.to_owned())]));
        req
    }

    #[test]
    fn well_formed_ids_parse() {
        let req = req_with_id("67e55044-10b1-426f-9247-bb680e5fe0c8");
        assert!(parse_id(&req).is_ok());
    }

    #[test]
    fn malformed_ids_are_the_clients_fault() {
        for id in ["42", "not-a-uuid", ""] {
            assert!(matches!(parse_id(&req_with_id(id)), Err(Error::InvalidId)), "id: {id:?}");
        }
    }
}
