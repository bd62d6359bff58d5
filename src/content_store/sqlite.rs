//! SQLite-backed content store

use anyhow::Context;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use super::{AuthorRow, ContentRow, ContentStore};
use crate::crawl_engine::CrawlResult;

/// SQL schema for the content database
const SCHEMA_SQL: &str = r#"
-- Content awaiting a crawl; processed_at stays NULL until a run handles it
CREATE TABLE IF NOT EXISTS content (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    platform TEXT NOT NULL,
    platform_ref TEXT NOT NULL,
    author TEXT NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s', 'now') AS INTEGER)),
    processed_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_content_pending ON content(processed_at, created_at);

-- Channels already known for a piece of content
CREATE TABLE IF NOT EXISTS authors (
    content_id INTEGER PRIMARY KEY REFERENCES content(id),
    channel_ref TEXT
);
"#;

#[derive(Debug, Clone)]
pub struct SqliteContentStore {
    pool: SqlitePool,
}

impl SqliteContentStore {
    /// Connect to `database_url` and make sure the schema exists
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {database_url}"))?
            .create_if_missing(true)
            .busy_timeout(std::time::Duration::from_secs(30));

        // every connection to :memory: would see its own empty database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to open SQLite database")?;

        sqlx::query(SCHEMA_SQL)
            .execute(&pool)
            .await
            .context("Failed to initialize database schema")?;

        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Queue a piece of content; returns its row id
    pub async fn insert_content(
        &self,
        platform: &str,
        platform_ref: &str,
        author: &str,
    ) -> CrawlResult<i64> {
        let result =
            sqlx::query("INSERT INTO content (platform, platform_ref, author) VALUES (?, ?, ?)")
                .bind(platform)
                .bind(platform_ref)
                .bind(author)
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    /// Record the channel a piece of content belongs to
    pub async fn insert_author(&self, content_id: i64, channel_ref: &str) -> CrawlResult<()> {
        sqlx::query(
            "INSERT INTO authors (content_id, channel_ref) VALUES (?, ?)
             ON CONFLICT(content_id) DO UPDATE SET channel_ref = excluded.channel_ref",
        )
        .bind(content_id)
        .bind(channel_ref)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl ContentStore for SqliteContentStore {
    async fn recent_content(&self, window: chrono::Duration) -> CrawlResult<Vec<ContentRow>> {
        let cutoff = (Utc::now() - window).timestamp();
        let rows = sqlx::query_as::<_, ContentRow>(
            r#"
            SELECT id, platform, platform_ref, author
            FROM content
            WHERE processed_at IS NULL AND created_at >= ?
            ORDER BY created_at, id
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn authors_for_content(&self, rows: &[ContentRow]) -> CrawlResult<Vec<AuthorRow>> {
        let mut authors = Vec::new();
        for row in rows {
            let author = sqlx::query_as::<_, AuthorRow>(
                "SELECT content_id, channel_ref FROM authors WHERE content_id = ?",
            )
            .bind(row.id)
            .fetch_optional(&self.pool)
            .await?;
            authors.extend(author);
        }
        Ok(authors)
    }

    async fn mark_processed(&self, ids: &[i64]) -> CrawlResult<u64> {
        let now = Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;
        let mut changed = 0;
        for id in ids {
            changed += sqlx::query(
                "UPDATE content SET processed_at = ? WHERE id = ? AND processed_at IS NULL",
            )
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }
        tx.commit().await?;
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pending_rows_round_trip() {
        let store = SqliteContentStore::connect("sqlite::memory:").await.unwrap();
        let first = store.insert_content("youtube", "abc123", "Alice").await.unwrap();
        let second = store.insert_content("youtube", "def456", "Bob").await.unwrap();
        store.insert_author(second, "UCbob").await.unwrap();

        let rows = store.recent_content(chrono::Duration::days(14)).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].platform_ref, "abc123");

        let authors = store.authors_for_content(&rows).await.unwrap();
        assert_eq!(
            authors,
            vec![AuthorRow {
                content_id: second,
                channel_ref: Some("UCbob".into())
            }]
        );

        assert_eq!(store.mark_processed(&[first]).await.unwrap(), 1);
        // already processed rows are not touched twice
        assert_eq!(store.mark_processed(&[first]).await.unwrap(), 0);

        let rows = store.recent_content(chrono::Duration::days(14)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, second);
    }

    #[tokio::test]
    async fn test_lookback_window_excludes_old_rows() {
        let store = SqliteContentStore::connect("sqlite::memory:").await.unwrap();
        let id = store.insert_content("youtube", "old", "Carol").await.unwrap();
        let long_ago = (Utc::now() - chrono::Duration::days(30)).timestamp();
        sqlx::query("UPDATE content SET created_at = ? WHERE id = ?")
            .bind(long_ago)
            .bind(id)
            .execute(store.pool())
            .await
            .unwrap();

        let rows = store.recent_content(chrono::Duration::days(14)).await.unwrap();
        assert!(rows.is_empty());
    }
}
