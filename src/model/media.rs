//! Media catalog records. Same shape and checks as images, stored in the
//! `medias` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{Error, Validate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Media {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub slug: String,
    pub publisher: String,
    pub published_at: Option<DateTime<Utc>>,
    pub expired_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMedia {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expired_at: Option<DateTime<Utc>>,
}

impl Media {
    pub fn new(input: &CreateMedia) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title.clone(),
            url: input.url.clone(),
            slug: input.slug.clone(),
            publisher: input.publisher.clone(),
            published_at: input.published_at,
            expired_at: input.expired_at,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

impl Validate for CreateMedia {
    fn validate(&self) -> Result<(), Error> {
        super::check_required_min(&[
            ("title", &self.title),
            ("url", &self.url),
            ("slug", &self.slug),
            ("publisher", &self.publisher),
        ])
    }
}
