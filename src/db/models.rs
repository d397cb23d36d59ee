/// Row types for the `draws` table, used by sqlx for typed queries.
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DrawRow {
    pub period: i64,
    pub draw_time: DateTime<Utc>,
    pub winning_number: i64,
    pub result_color: String,
    pub result_size: String,
    /// JSON text of the upstream item as received.
    pub raw_payload: String,
}
