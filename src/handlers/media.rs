//! `/v1/medias` handler set. Mirrors the image set, minus the creation
//! event: only images are announced to the platform.

use std::sync::Arc;

use http::StatusCode;

use crate::context::Context;
use crate::error::{Error, Validate};
use crate::filter::Predicate;
use crate::model::CreateMedia;
use crate::request::Request;
use crate::respond::{self, Response};
use crate::store::Store;

pub struct MediaApi {
    store: Arc<dyn Store>,
}

impl MediaApi {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(
        self: Arc<Self>,
        ctx: Arc<Context>,
        req: Request,
    ) -> Result<Response, Error> {
        let filter = Predicate::parse(req.raw_query())?;
        let medias = self.store.list_medias(&filter).await?;
        Ok(respond::json(&ctx, StatusCode::OK, &medias))
    }

    pub async fn retrieve(
        self: Arc<Self>,
        ctx: Arc<Context>,
        req: Request,
    ) -> Result<Response, Error> {
        let id = super::parse_id(&req)?;
        match self.store.retrieve_media(id).await? {
            Some(media) => Ok(respond::json(&ctx, StatusCode::OK, &media)),
            None => Err(Error::NotFound),
        }
    }

    pub async fn create(
        self: Arc<Self>,
        ctx: Arc<Context>,
        req: Request,
    ) -> Result<Response, Error> {
        let input: CreateMedia = req.json()?;
        input.validate()?;
        let media = self.store.create_media(&input).await?;
        Ok(respond::json(&ctx, StatusCode::CREATED, &media))
    }

    pub async fn update(
        self: Arc<Self>,
        ctx: Arc<Context>,
        req: Request,
    ) -> Result<Response, Error> {
        let id = super::parse_id(&req)?;
        let input: CreateMedia = req.json()?;
        input.validate()?;
        if !self.store.update_media(id, &input).await? {
            return Err(Error::NotFound);
        }
        Ok(respond::empty(&ctx, StatusCode::NO_CONTENT))
    }
}
