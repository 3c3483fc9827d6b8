//! In-memory [`Store`], used by the test suites and the runnable demo.
//!
//! Rows live in plain vectors behind an `RwLock`; nothing awaits while a
//! lock is held. Filters run through [`Predicate::matches`] with the same
//! outcomes the Postgres store produces, including rejecting filters that
//! name a column neither table has.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::filter::Predicate;
use crate::model::{CreateImage, CreateMedia, Image, Media};

use super::{Store, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    images: RwLock<Vec<Image>>,
    medias: RwLock<Vec<Media>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

const COLUMNS: &[&str] = &[
    "id",
    "title",
    "url",
    "slug",
    "publisher",
    "published_at",
    "expired_at",
    "created_at",
    "updated_at",
];

fn check_columns(filter: &Predicate) -> Result<(), StoreError> {
    for clause in filter.clauses() {
        if !COLUMNS.contains(&clause.field.as_str()) {
            return Err(StoreError::Query(format!("column `{}` does not exist", clause.field)));
        }
    }
    Ok(())
}

/// A column's value as text, `None` meaning NULL. Timestamps render as
/// RFC 3339 so range filters order the same way they do in Postgres.
fn image_field(image: &Image, field: &str) -> Option<String> {
    match field {
        "id" => Some(image.id.to_string()),
        "title" => Some(image.title.clone()),
        "url" => Some(image.url.clone()),
        "slug" => Some(image.slug.clone()),
        "publisher" => Some(image.publisher.clone()),
        "published_at" => image.published_at.map(|t| t.to_rfc3339()),
        "expired_at" => image.expired_at.map(|t| t.to_rfc3339()),
        "created_at" => Some(image.created_at.to_rfc3339()),
        "updated_at" => image.updated_at.map(|t| t.to_rfc3339()),
        _ => None,
    }
}

fn media_field(media: &Media, field: &str) -> Option<String> {
    match field {
        "id" => Some(media.id.to_string()),
        "title" => Some(media.title.clone()),
        "url" => Some(media.url.clone()),
        "slug" => Some(media.slug.clone()),
        "publisher" => Some(media.publisher.clone()),
        "published_at" => media.published_at.map(|t| t.to_rfc3339()),
        "expired_at" => media.expired_at.map(|t| t.to_rfc3339()),
        "created_at" => Some(media.created_at.to_rfc3339()),
        "updated_at" => media.updated_at.map(|t| t.to_rfc3339()),
        _ => None,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list_images(&self, filter: &Predicate) -> Result<Vec<Image>, StoreError> {
        check_columns(filter)?;
        let images = self.images.read().expect("store lock poisoned");
        Ok(images.iter().filter(|i| filter.matches(|f| image_field(i, f))).cloned().collect())
    }

    async fn retrieve_image(&self, id: Uuid) -> Result<Option<Image>, StoreError> {
        let images = self.images.read().expect("store lock poisoned");
        Ok(images.iter().find(|i| i.id == id).cloned())
    }

    async fn create_image(&self, input: &CreateImage) -> Result<Image, StoreError> {
        let image = Image::new(input);
        self.images.write().expect("store lock poisoned").push(image.clone());
        Ok(image)
    }

    async fn update_image(&self, id: Uuid, input: &CreateImage) -> Result<bool, StoreError> {
        let mut images = self.images.write().expect("store lock poisoned");
        let Some(image) = images.iter_mut().find(|i| i.id == id) else {
            return Ok(false);
        };
        image.title = input.title.clone();
        image.url = input.url.clone();
        image.slug = input.slug.clone();
        image.publisher = input.publisher.clone();
        image.published_at = input.published_at;
        image.expired_at = input.expired_at;
        image.updated_at = Some(Utc::now());
        Ok(true)
    }

    async fn list_medias(&self, filter: &Predicate) -> Result<Vec<Media>, StoreError> {
        check_columns(filter)?;
        let medias = self.medias.read().expect("store lock poisoned");
        Ok(medias.iter().filter(|m| filter.matches(|f| media_field(m, f))).cloned().collect())
    }

    async fn retrieve_media(&self, id: Uuid) -> Result<Option<Media>, StoreError> {
        let medias = self.medias.read().expect("store lock poisoned");
        Ok(medias.iter().find(|m| m.id == id).cloned())
    }

    async fn create_media(&self, input: &CreateMedia) -> Result<Media, StoreError> {
        let media = Media::new(input);
        self.medias.write().expect("store lock poisoned").push(media.clone());
        Ok(media)
    }

    async fn update_media(&self, id: Uuid, input: &CreateMedia) -> Result<bool, StoreError> {
        let mut medias = self.medias.write().expect("store lock poisoned");
        let Some(media) = medias.iter_mut().find(|m| m.id == id) else {
            return Ok(false);
        };
        media.title = input.title.clone();
        media.url = input.url.clone();
        media.slug = input.slug.clone();
        media.publisher = input.publisher.clone();
        media.published_at = input.published_at;
        media.expired_at = input.expired_at;
        media.updated_at = Some(Utc::now());
        Ok(true)
    }
}
