//! Persistence port and its implementations.
//!
//! Handlers talk to [`Store`]; the trait hides whether rows live in
//! Postgres ([`PostgresStore`]) or in memory ([`MemoryStore`], used by the
//! test suites and the runnable demo). List operations take a compiled
//! [`Predicate`]; implementations evaluate it without ever splicing values
//! into SQL text.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use thiserror::Error as ThisError;
use uuid::Uuid;

use crate::filter::Predicate;
use crate::model::{CreateImage, CreateMedia, Image, Media};

#[derive(Debug, ThisError)]
pub enum StoreError {
    /// The store cannot be reached at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected the operation, for example a filter naming a
    /// column that does not exist.
    #[error("query failed: {0}")]
    Query(String),

    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

/// CRUD over the two catalog tables plus a liveness probe.
///
/// `retrieve_*` distinguish absence (`Ok(None)`) from failure; `update_*`
/// report whether the row existed, leaving the not-found classification to
/// the caller.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    async fn list_images(&self, filter: &Predicate) -> Result<Vec<Image>, StoreError>;
    async fn retrieve_image(&self, id: Uuid) -> Result<Option<Image>, StoreError>;
    async fn create_image(&self, input: &CreateImage) -> Result<Image, StoreError>;
    async fn update_image(&self, id: Uuid, input: &CreateImage) -> Result<bool, StoreError>;

    async fn list_medias(&self, filter: &Predicate) -> Result<Vec<Media>, StoreError>;
    async fn retrieve_media(&self, id: Uuid) -> Result<Option<Media>, StoreError>;
    async fn create_media(&self, input: &CreateMedia) -> Result<Media, StoreError>;
    async fn update_media(&self, id: Uuid, input: &CreateMedia) -> Result<bool, StoreError>;
}
