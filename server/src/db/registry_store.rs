use sqlx::SqlitePool;

/// Fixed key addressing the singleton registry document.
pub const REGISTRY_KEY: &str = "pools";

/// Read the whole registry document, if one has been written.
pub async fn get_document(pool: &SqlitePool) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT data FROM registry WHERE id = ?")
        .bind(REGISTRY_KEY)
        .fetch_optional(pool)
        .await
}

/// Replace the whole registry document atomically.
pub async fn put_document(pool: &SqlitePool, data: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO registry (id, data, updated_at) VALUES (?, ?, datetime('now')) \
         ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
    )
    .bind(REGISTRY_KEY)
    .bind(data)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::{create_pool, run_migrations};

    async fn setup_db() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_absent_document_reads_none() {
        let pool = setup_db().await;
        assert!(get_document(&pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let pool = setup_db().await;
        put_document(&pool, r#"{"a":1}"#).await.unwrap();
        assert_eq!(
            get_document(&pool).await.unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );
    }

    #[tokio::test]
    async fn test_put_replaces_whole_document() {
        let pool = setup_db().await;
        put_document(&pool, "first").await.unwrap();
        put_document(&pool, "second").await.unwrap();
        assert_eq!(get_document(&pool).await.unwrap().as_deref(), Some("second"));

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM registry")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }
}
