use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use sea_orm::ConnectOptions;

use crate::database::Database;

pub async fn test_db() -> Arc<Database> {
    // A single connection, every pooled connection would get its own memory db
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt)
        .await
        .unwrap_or_else(|e| panic!("Failed to open test database: {e:?}"));

    Arc::new(db)
}

pub fn utc(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .unwrap()
        .and_utc()
}
