use std::str::FromStr;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};

use crate::config::{DB_ACQUIRE_TIMEOUT_SECS, DB_MAX_CONNECTIONS};
use crate::db::models::DrawRow;
use crate::error::Result;
use crate::types::DrawRecord;

const CREATE_DRAWS: &str = r#"
    CREATE TABLE IF NOT EXISTS draws (
        period          INTEGER PRIMARY KEY,
        draw_time       TIMESTAMP NOT NULL,
        winning_number  INTEGER NOT NULL,
        result_color    TEXT NOT NULL,
        result_size     TEXT NOT NULL,
        raw_payload     TEXT NOT NULL
    )
"#;

/// Process-lifetime handle to the draw table. Cheap to clone; every clone
/// shares one pool.
#[derive(Clone)]
pub struct DrawStore {
    pool: SqlitePool,
}

impl DrawStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the SQLite file at `db_path`.
    pub async fn connect(db_path: &str) -> Result<Self> {
        let options =
            SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(DB_MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(DB_ACQUIRE_TIMEOUT_SECS))
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(CREATE_DRAWS).execute(&self.pool).await?;
        Ok(())
    }

    /// Checks out one connection for the duration of a tick. The connection
    /// goes back to the pool when the session is dropped, on any path.
    pub async fn session(&self) -> Result<StoreSession> {
        let conn = self.pool.acquire().await?;
        Ok(StoreSession { conn })
    }

    /// Most recent draws, highest period first.
    pub async fn recent_draws(&self, limit: i64) -> Result<Vec<DrawRow>> {
        let rows = sqlx::query_as::<_, DrawRow>(
            r#"
            SELECT period, draw_time, winning_number, result_color, result_size, raw_payload
            FROM draws
            ORDER BY period DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    #[cfg(test)]
    pub(crate) async fn in_memory() -> Self {
        // A single connection, so every query sees the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(1))
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        Self::new(pool)
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub struct StoreSession {
    conn: PoolConnection<Sqlite>,
}

impl StoreSession {
    pub async fn ensure_schema(&mut self) -> Result<()> {
        sqlx::query(CREATE_DRAWS).execute(&mut *self.conn).await?;
        Ok(())
    }

    /// Inserts the draw unless its period is already stored. Returns true only
    /// when a new row was written; an existing row is never touched.
    pub async fn insert_draw(&mut self, draw: &DrawRecord) -> Result<bool> {
        let raw_payload = serde_json::to_string(&draw.raw_payload)?;
        let result = sqlx::query(
            r#"
            INSERT INTO draws (period, draw_time, winning_number, result_color, result_size, raw_payload)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(period) DO NOTHING
            "#,
        )
        .bind(draw.period)
        .bind(draw.draw_time)
        .bind(draw.winning_number)
        .bind(draw.result_color.to_string())
        .bind(draw.result_size.to_string())
        .bind(raw_payload)
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
