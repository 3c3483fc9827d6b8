//! Postgres implementation of the [`Store`] port.
//!
//! List queries are built from a compiled [`Predicate`]: the SQL text only
//! ever contains column names, operators and numbered placeholders, and the
//! values travel separately through the bind list. Bound filter values reach
//! Postgres as text, so typed columns carry an explicit cast in the rendered
//! fragment (`published_at >= $1::timestamptz`).

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use crate::filter::Predicate;
use crate::model::{CreateImage, CreateMedia, Image, Media};

use super::{Store, StoreError};

/// Both catalog tables share this column set, in `FromRow` order.
const COLUMNS: &str =
    "id, title, url, slug, publisher, published_at, expired_at, created_at, updated_at";

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Opens a pool against `url` with at most `max_connections` connections.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self { pool })
    }
}

/// SQL type each filterable column must be cast to when compared against a
/// text parameter. Text columns need none.
fn column_cast(field: &str) -> Option<&'static str> {
    match field {
        "id" => Some("uuid"),
        "published_at" | "expired_at" | "created_at" | "updated_at" => Some("timestamptz"),
        _ => None,
    }
}

fn list_sql(table: &str, filter: &Predicate) -> String {
    format!("SELECT {COLUMNS} FROM {table}{}", filter.where_sql_cast(1, column_cast))
}

#[async_trait]
impl Store for PostgresStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_images(&self, filter: &Predicate) -> Result<Vec<Image>, StoreError> {
        let sql = list_sql("images", filter);
        let mut query = sqlx::query_as::<_, Image>(&sql);
        for value in filter.binds() {
            query = query.bind(value);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn retrieve_image(&self, id: Uuid) -> Result<Option<Image>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM images WHERE id = $1");
        Ok(sqlx::query_as::<_, Image>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn create_image(&self, input: &CreateImage) -> Result<Image, StoreError> {
        let image = Image::new(input);
        let sql =
            format!("INSERT INTO images ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)");
        sqlx::query(&sql)
            .bind(image.id)
            .bind(&image.title)
            .bind(&image.url)
            .bind(&image.slug)
            .bind(&image.publisher)
            .bind(image.published_at)
            .bind(image.expired_at)
            .bind(image.created_at)
            .bind(image.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(image)
    }

    async fn update_image(&self, id: Uuid, input: &CreateImage) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE images SET title = $1, url = $2, slug = $3, publisher = $4, \
             published_at = $5, expired_at = $6, updated_at = $7 WHERE id = $8",
        )
        .bind(&input.title)
        .bind(&input.url)
        .bind(&input.slug)
        .bind(&input.publisher)
        .bind(input.published_at)
        .bind(input.expired_at)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_medias(&self, filter: &Predicate) -> Result<Vec<Media>, StoreError> {
        let sql = list_sql("medias", filter);
        let mut query = sqlx::query_as::<_, Media>(&sql);
        for value in filter.binds() {
            query = query.bind(value);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn retrieve_media(&self, id: Uuid) -> Result<Option<Media>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM medias WHERE id = $1");
        Ok(sqlx::query_as::<_, Media>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn create_media(&self, input: &CreateMedia) -> Result<Media, StoreError> {
        let media = Media::new(input);
        let sql =
            format!("INSERT INTO medias ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)");
        sqlx::query(&sql)
            .bind(media.id)
            .bind(&media.title)
            .bind(&media.url)
            .bind(&media.slug)
            .bind(&media.publisher)
            .bind(media.published_at)
            .bind(media.expired_at)
            .bind(media.created_at)
            .bind(media.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(media)
    }

    async fn update_media(&self, id: Uuid, input: &CreateMedia) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE medias SET title = $1, url = $2, slug = $3, publisher = $4, \
             published_at = $5, expired_at = $6, updated_at = $7 WHERE id = $8",
        )
        .bind(&input.title)
        .bind(&input.url)
        .bind(&input.slug)
        .bind(&input.publisher)
        .bind(input.published_at)
        .bind(input.expired_at)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_list_has_no_where_clause() {
        let filter = Predicate::parse("").unwrap();
        assert_eq!(
            list_sql("images", &filter),
            format!("SELECT {COLUMNS} FROM images")
        );
    }

    #[test]
    fn filtered_list_appends_placeholders_only() {
        let filter = Predicate::parse("publisher=$eq.etf1&slug=$in.a,b").unwrap();
        assert_eq!(
            list_sql("images", &filter),
            format!("SELECT {COLUMNS} FROM images WHERE publisher = $1 AND slug IN ($2, $3)")
        );
        // The values stay out of the SQL text entirely.
        assert_eq!(filter.binds().collect::<Vec<_>>(), vec!["etf1", "a", "b"]);
    }

    #[test]
    fn typed_columns_are_cast_from_text() {
        let filter = Predicate::parse("published_at=$gte.2020-01-01&id=$ne.abc").unwrap();
        assert_eq!(
            list_sql("medias", &filter),
            format!(
                "SELECT {COLUMNS} FROM medias WHERE published_at >= $1::timestamptz \
                 AND id != $2::uuid"
            )
        );
    }
}
