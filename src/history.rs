//! Durable price history.
//!
//! A key-value ledger keyed by a composite identity string plus the run
//! date. Append-only by `(key, run_date)`: past runs are never rewritten,
//! and a run that observed no price leaves the ledger untouched — absence
//! of evidence is not evidence of absence.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::models::{Itinerary, Pattern};

/// Composite history key: `provider:origin:destination:date:identity`.
///
/// Identity is the itinerary's outbound flight number when known, else the
/// pattern name, so price continuity tracks a concrete flight where the data
/// allows and degrades to the trip shape where it doesn't.
pub fn make_key(
    provider: &str,
    origin: &str,
    destination: &str,
    date: NaiveDate,
    pattern: Pattern,
    best: Option<&Itinerary>,
) -> String {
    let identity = best
        .and_then(|it| it.outbound.flight_number.as_deref())
        .unwrap_or(pattern.name());
    format!("{provider}:{origin}:{destination}:{date}:{identity}")
}

/// Store contract for price continuity across runs.
///
/// The core depends on this trait, not on a storage technology; the bundled
/// implementation is SQLite.
#[async_trait]
pub trait PriceHistory: Send + Sync {
    /// Latest recorded price for `key` from a run strictly before `before`.
    async fn previous_price(&self, key: &str, before: NaiveDate) -> Result<Option<f64>>;

    /// Record a price observation for this run. `None` is a deliberate
    /// no-op: fetch failures and empty buckets never erase prior history.
    /// Re-running the same day overwrites only that day's own row.
    async fn record_price(&self, key: &str, price: Option<f64>, run_date: NaiveDate)
        -> Result<()>;
}

/// SQLite-backed [`PriceHistory`] plus run bookkeeping for the refresh policy.
pub struct SqliteHistory {
    pool: SqlitePool,
}

impl SqliteHistory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Date of the most recent completed run, if any.
    pub async fn last_completed_run(&self) -> Result<Option<NaiveDate>> {
        let row: Option<String> =
            sqlx::query_scalar("SELECT run_date FROM runs ORDER BY run_date DESC LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.and_then(|s| s.parse().ok()))
    }

    pub async fn mark_completed(
        &self,
        run_date: NaiveDate,
        queries: i64,
        fetch_failures: i64,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO runs (run_date, completed_at, queries, fetch_failures)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(run_date) DO UPDATE SET
                completed_at = excluded.completed_at,
                queries = excluded.queries,
                fetch_failures = excluded.fetch_failures
            "#,
        )
        .bind(run_date.to_string())
        .bind(now)
        .bind(queries)
        .bind(fetch_failures)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PriceHistory for SqliteHistory {
    async fn previous_price(&self, key: &str, before: NaiveDate) -> Result<Option<f64>> {
        let price: Option<f64> = sqlx::query_scalar(
            "SELECT price FROM price_history WHERE key = ? AND run_date < ? ORDER BY run_date DESC LIMIT 1",
        )
        .bind(key)
        .bind(before.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(price)
    }

    async fn record_price(
        &self,
        key: &str,
        price: Option<f64>,
        run_date: NaiveDate,
    ) -> Result<()> {
        let Some(price) = price else {
            return Ok(());
        };
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO price_history (key, run_date, price, recorded_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key, run_date) DO UPDATE SET
                price = excluded.price,
                recorded_at = excluded.recorded_at
            "#,
        )
        .bind(key)
        .bind(run_date.to_string())
        .bind(price)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Run the `history` command: print the ledger for one key, or the most
/// recently recorded entries when no key is given.
pub async fn run_history(config: &Config, key: Option<&str>, limit: i64) -> Result<()> {
    let pool = db::connect(config).await?;

    let rows = match key {
        Some(key) => {
            sqlx::query(
                "SELECT key, run_date, price FROM price_history WHERE key = ? ORDER BY run_date DESC LIMIT ?",
            )
            .bind(key)
            .bind(limit)
            .fetch_all(&pool)
            .await?
        }
        None => {
            sqlx::query(
                "SELECT key, run_date, price FROM price_history ORDER BY recorded_at DESC LIMIT ?",
            )
            .bind(limit)
            .fetch_all(&pool)
            .await?
        }
    };

    if rows.is_empty() {
        println!("no history records");
    }
    for row in rows {
        let key: String = row.get("key");
        let run_date: String = row.get("run_date");
        let price: f64 = row.get("price");
        println!("{run_date}  {price:>8.2}  {key}");
    }

    pool.close().await;
    Ok(())
}
