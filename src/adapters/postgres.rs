//! PostgreSQL video repository over the `videos` table.

use crate::domain::video::{Video, VideoId};
use crate::error::{CommitError, SelectionError};
use crate::ports::repository::VideoRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Columns of `Video`. Timestamps are cast so both `timestamp` and
/// `timestamptz` columns decode; sqlx runs its sessions in UTC, so plain
/// `timestamp` values are read as UTC.
macro_rules! video_columns {
    () => {
        r#"
        SELECT id::text AS id, name, processed,
               uploaded_at::timestamptz AS uploaded_at,
               created_at::timestamptz AS created_at,
               updated_at::timestamptz AS updated_at
        FROM videos
        "#
    };
}

/// Oldest confirmed upload first; the id breaks ties so the pick is stable.
const NEXT_ELIGIBLE: &str = concat!(
    video_columns!(),
    r#"
    WHERE processed = false AND uploaded_at IS NOT NULL
    ORDER BY uploaded_at ASC, id ASC
    LIMIT 1
    "#
);

const FIND: &str = concat!(video_columns!(), "WHERE id = $1::uuid");

#[derive(Clone, Debug)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: &VideoId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM videos WHERE id = $1::uuid)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
    }
}

fn database_error(id: &VideoId, err: sqlx::Error) -> CommitError {
    CommitError::Database {
        id: id.clone(),
        source: Box::new(err),
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    async fn next_eligible(&self) -> Result<Option<Video>, SelectionError> {
        let video = sqlx::query_as::<_, Video>(NEXT_ELIGIBLE)
            .fetch_optional(&self.pool)
            .await?;
        Ok(video)
    }

    async fn find(&self, id: &VideoId) -> Result<Option<Video>, SelectionError> {
        let video = sqlx::query_as::<_, Video>(FIND)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(video)
    }

    async fn mark_processed(&self, id: &VideoId) -> Result<(), CommitError> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET processed = true, updated_at = NOW()
            WHERE id = $1::uuid
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| database_error(id, e))?;

        if result.rows_affected() == 0 {
            return Err(CommitError::NotFound(id.clone()));
        }
        Ok(())
    }

    async fn mark_uploaded(&self, id: &VideoId, at: DateTime<Utc>) -> Result<(), CommitError> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET uploaded_at = $2, updated_at = NOW()
            WHERE id = $1::uuid AND uploaded_at IS NULL
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| database_error(id, e))?;

        if result.rows_affected() == 0 {
            return match self.exists(id).await {
                Ok(true) => Err(CommitError::AlreadyUploaded(id.clone())),
                Ok(false) => Err(CommitError::NotFound(id.clone())),
                Err(e) => Err(database_error(id, e)),
            };
        }
        Ok(())
    }
}
