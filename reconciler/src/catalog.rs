use sqlx::{Row, SqlitePool};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("record {0} no longer exists")]
    MissingRecord(i64),
}

/// One tracked video row. `drive_file_id` is the last-known remote id and may
/// be stale; `drive_file_name` usually survives re-uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecord {
    pub id: i64,
    pub drive_file_id: Option<String>,
    pub drive_file_name: Option<String>,
    pub playback_order: Option<i64>,
    pub playback_asset_id: Option<String>,
}

impl CatalogRecord {
    pub fn has_playback_asset(&self) -> bool {
        self.playback_asset_id
            .as_deref()
            .is_some_and(|id| !id.is_empty())
    }
}

pub struct CatalogStore {
    pool: SqlitePool,
}

impl CatalogStore {
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, CatalogError> {
        Ok(Self {
            pool: SqlitePool::connect(database_url).await?,
        })
    }

    /// All non-deleted records, in primary-key order. Name-duplicate
    /// tie-breaking downstream depends on this order being stable.
    pub async fn load_active_records(&self) -> Result<Vec<CatalogRecord>, CatalogError> {
        let rows = sqlx::query(
            "SELECT id, drive_file_id, drive_file_name, playback_order, playback_asset_id
             FROM videos
             WHERE status != 'deleted'
             ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(CatalogRecord {
                id: row.try_get("id")?,
                drive_file_id: row.try_get("drive_file_id")?,
                drive_file_name: row.try_get("drive_file_name")?,
                playback_order: row.try_get("playback_order")?,
                playback_asset_id: row.try_get("playback_asset_id")?,
            });
        }
        Ok(out)
    }

    pub async fn update_file_id_and_order(
        &self,
        id: i64,
        file_id: &str,
        order: i64,
    ) -> Result<(), CatalogError> {
        let result =
            sqlx::query("UPDATE videos SET drive_file_id = ?1, playback_order = ?2 WHERE id = ?3")
                .bind(file_id)
                .bind(order)
                .bind(id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::MissingRecord(id));
        }
        Ok(())
    }

    pub async fn update_order(&self, id: i64, order: i64) -> Result<(), CatalogError> {
        let result = sqlx::query("UPDATE videos SET playback_order = ?1 WHERE id = ?2")
            .bind(order)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::MissingRecord(id));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::query(
        "CREATE TABLE videos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT,
            drive_file_id TEXT,
            drive_file_name TEXT,
            playback_order INTEGER,
            playback_asset_id TEXT,
            status TEXT NOT NULL DEFAULT 'ready'
        );",
    )
    .execute(&pool)
    .await
    .unwrap();
    pool
}

#[cfg(test)]
pub(crate) async fn insert_video(
    pool: &SqlitePool,
    drive_file_id: Option<&str>,
    drive_file_name: Option<&str>,
    playback_order: Option<i64>,
    playback_asset_id: Option<&str>,
    status: &str,
) -> i64 {
    let result = sqlx::query(
        "INSERT INTO videos (drive_file_id, drive_file_name, playback_order, playback_asset_id, status)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(drive_file_id)
    .bind(drive_file_name)
    .bind(playback_order)
    .bind(playback_asset_id)
    .bind(status)
    .execute(pool)
    .await
    .unwrap();
    result.last_insert_rowid()
}
