use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Append-only price ledger: one row per (key, run_date). A past run's
    // price is never mutated; re-running the same day overwrites only that
    // day's own row.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS price_history (
            key TEXT NOT NULL,
            run_date TEXT NOT NULL,
            price REAL NOT NULL,
            recorded_at INTEGER NOT NULL,
            PRIMARY KEY (key, run_date)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Completed runs, for the refresh policy.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS runs (
            run_date TEXT PRIMARY KEY,
            completed_at INTEGER NOT NULL,
            queries INTEGER NOT NULL DEFAULT 0,
            fetch_failures INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_price_history_key_date ON price_history(key, run_date DESC)",
    )
    .execute(&pool)
    .await?;

    pool.close().await;
    Ok(())
}
