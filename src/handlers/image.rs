//! `/v1/images` handler set.

use std::sync::Arc;

use http::StatusCode;
use tracing::warn;

use crate::context::Context;
use crate::error::{Error, Validate};
use crate::events::EventPublisher;
use crate::filter::Predicate;
use crate::model::{CreateImage, Image};
use crate::request::Request;
use crate::respond::{self, Response};
use crate::store::Store;

/// Image CRUD over the store, announcing creations on the event port.
pub struct ImageApi {
    store: Arc<dyn Store>,
    events: Arc<dyn EventPublisher>,
}

impl ImageApi {
    pub fn new(store: Arc<dyn Store>, events: Arc<dyn EventPublisher>) -> Self {
        Self { store, events }
    }

    /// Lists images matching the query filter. 200, 400 on a malformed
    /// filter, 500 on store failure.
    pub async fn list(
        self: Arc<Self>,
        ctx: Arc<Context>,
        req: Request,
    ) -> Result<Response, Error> {
        let filter = Predicate::parse(req.raw_query())?;
        let images = self.store.list_images(&filter).await?;
        Ok(respond::json(&ctx, StatusCode::OK, &images))
    }

    /// Returns one image by id. 200, 400 on a malformed id, 404 when absent.
    pub async fn retrieve(
        self: Arc<Self>,
        ctx: Arc<Context>,
        req: Request,
    ) -> Result<Response, Error> {
        let id = super::parse_id(&req)?;
        match self.store.retrieve_image(id).await? {
            Some(image) => Ok(respond::json(&ctx, StatusCode::OK, &image)),
            None => Err(Error::NotFound),
        }
    }

    /// Inserts a new image. 201 with the stored record, 400 on validation
    /// failure. The created record is also published to `image_created`.
    pub async fn create(
        self: Arc<Self>,
        ctx: Arc<Context>,
        req: Request,
    ) -> Result<Response, Error> {
        let input: CreateImage = req.json()?;
        input.validate()?;
        let image = self.store.create_image(&input).await?;
        self.announce(&image).await;
        Ok(respond::json(&ctx, StatusCode::CREATED, &image))
    }

    /// Replaces the image's client-settable fields. 204, 400 on a malformed
    /// id or validation failure, 404 when absent.
    pub async fn update(
        self: Arc<Self>,
        ctx: Arc<Context>,
        req: Request,
    ) -> Result<Response, Error> {
        let id = super::parse_id(&req)?;
        let input: CreateImage = req.json()?;
        input.validate()?;
        if !self.store.update_image(id, &input).await? {
            return Err(Error::NotFound);
        }
        Ok(respond::empty(&ctx, StatusCode::NO_CONTENT))
    }

    /// Best-effort publish of the created record. The row is already
    /// committed, so a broker failure downgrades to a warning rather than
    /// failing the request.
    async fn announce(&self, image: &Image) {
        let payload = match serde_json::to_vec(image) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(image_id = %image.id, error = %err, "image_created payload not serializable");
                return;
            }
        };
        if let Err(err) = self.events.publish("image_created", &payload).await {
            warn!(image_id = %image.id, error = %err, "image_created publish failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use bytes::Bytes;
    use http::{HeaderMap, Method};

    use crate::events::{BufferPublisher, PublishError};
    use crate::store::MemoryStore;

    fn ctx() -> Arc<Context> {
        Arc::new(Context::new(([127, 0, 0, 1], 3000).into()))
    }

    fn post(body: &str) -> Request {
        Request::new(
            Method::POST,
            "/v1/images".parse().unwrap(),
            HeaderMap::new(),
            Bytes::copy_from_slice(body.as_bytes()),
            ([127, 0, 0, 1], 3000).into(),
        )
    }

    const VALID: &str = r#"{
        "title": "Image Elijah Baley",
        "url": "/images/1280/720/test-2260.jpeg",
        "slug": "/images/1280/720/test-2260",
        "publisher": "etf1"
    }"#;

    #[tokio::test]
    async fn create_publishes_the_stored_record() {
        let events = Arc::new(BufferPublisher::new());
        let api = Arc::new(ImageApi::new(
            Arc::new(MemoryStore::new()),
            Arc::clone(&events) as Arc<dyn EventPublisher>,
        ));

        let res = api.create(ctx(), post(VALID)).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let published = events.events();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "image_created");
        // The payload is the same record the client got back.
        let event: Image = serde_json::from_slice(&published[0].1).unwrap();
        let returned: Image = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(event, returned);
    }

    #[tokio::test]
    async fn a_broker_failure_does_not_fail_the_create() {
        struct DownBroker;

        #[async_trait]
        impl EventPublisher for DownBroker {
            async fn publish(&self, topic: &str, _payload: &[u8]) -> Result<(), PublishError> {
                Err(PublishError { topic: topic.to_owned(), reason: "broker down".to_owned() })
            }
        }

        let api = Arc::new(ImageApi::new(Arc::new(MemoryStore::new()), Arc::new(DownBroker)));
        let res = api.create(ctx(), post(VALID)).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn a_rejected_create_publishes_nothing() {
        let events = Arc::new(BufferPublisher::new());
        let api = Arc::new(ImageApi::new(
            Arc::new(MemoryStore::new()),
            Arc::clone(&events) as Arc<dyn EventPublisher>,
        ));

        let err = api.create(ctx(), post(r#"{"title":"only"}"#)).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(events.events().is_empty());
    }
}
