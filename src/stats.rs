//! Database statistics and health overview.
//!
//! Quick summary of what the ledger holds: tracked keys, record counts,
//! and recent runs. Used by `farewatch stats` to give confidence that runs
//! are landing and history is accumulating.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;

pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total_records: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM price_history")
        .fetch_one(&pool)
        .await?;

    let tracked_keys: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT key) FROM price_history")
        .fetch_one(&pool)
        .await?;

    let total_runs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM runs")
        .fetch_one(&pool)
        .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("farewatch — Database Stats");
    println!("==========================");
    println!();
    println!("  Database:     {}", config.db.path.display());
    println!("  Size:         {}", format_bytes(db_size));
    println!();
    println!("  Tracked keys: {}", tracked_keys);
    println!("  Price records: {}", total_records);
    println!("  Completed runs: {}", total_runs);

    let recent_runs = sqlx::query(
        "SELECT run_date, completed_at, queries, fetch_failures FROM runs ORDER BY run_date DESC LIMIT 5",
    )
    .fetch_all(&pool)
    .await?;

    if !recent_runs.is_empty() {
        println!();
        println!("  Recent runs:");
        println!(
            "  {:<12} {:>8} {:>10}   {}",
            "DATE", "QUERIES", "FAILURES", "COMPLETED"
        );
        println!("  {}", "-".repeat(52));
        for row in &recent_runs {
            let run_date: String = row.get("run_date");
            let completed_at: i64 = row.get("completed_at");
            let queries: i64 = row.get("queries");
            let failures: i64 = row.get("fetch_failures");
            println!(
                "  {:<12} {:>8} {:>10}   {}",
                run_date,
                queries,
                failures,
                format_ts_relative(completed_at)
            );
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
