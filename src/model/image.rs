//! Image catalog records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{Error, Validate};

/// A stored image record, as it appears on the wire and in the `images`
/// table. Absent timestamps serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Image {
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

/// Client input for creating or replacing an image. The id and the
/// bookkeeping timestamps are server-assigned and not accepted from the
/// client.
///
/// Every field defaults so that an absent field fails validation as
/// `required` rather than failing deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateImage {
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

impl Image {
    /// The stored record for a validated input: server-assigned id and
    /// creation timestamp, input timestamps carried over.
    pub fn new(input: &CreateImage) -> Self {
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

impl Validate for CreateImage {
    fn validate(&self) -> Result<(), Error> {
        super::check_required_min(&[
            ("title", &self.title),
            ("url", &self.url),
            ("slug", &self.slug),
            ("publisher", &self.publisher),
        ])
    }
}
