//! Price-history store behavior against a real SQLite database.

use chrono::NaiveDate;
use std::fs;
use tempfile::TempDir;

use farewatch::config::{self, Config};
use farewatch::db;
use farewatch::history::{PriceHistory, SqliteHistory};
use farewatch::migrate;

fn test_config(tmp: &TempDir) -> Config {
    let config_content = format!(
        r#"[db]
path = "{}/data/farewatch.sqlite"

[search]
origins = ["AMS"]
destination = "BCN"

[fetch]
base_url = "https://flights.example.test"
host = "flights.example.test"
"#,
        tmp.path().display()
    );
    let config_path = tmp.path().join("farewatch.toml");
    fs::write(&config_path, config_content).unwrap();
    config::load_config(&config_path).unwrap()
}

async fn setup() -> (TempDir, SqliteHistory) {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);
    migrate::run_migrations(&cfg).await.unwrap();
    let pool = db::connect(&cfg).await.unwrap();
    (tmp, SqliteHistory::new(pool))
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

const KEY: &str = "rapidapi:AMS:BCN:2024-01-04:HV5131";

#[tokio::test]
async fn previous_price_empty_store_is_none() {
    let (_tmp, store) = setup().await;
    assert_eq!(
        store.previous_price(KEY, date("2024-01-02")).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn previous_price_sees_only_strictly_earlier_runs() {
    let (_tmp, store) = setup().await;
    store
        .record_price(KEY, Some(110.0), date("2024-01-01"))
        .await
        .unwrap();

    // Same-day lookup must not see today's own record.
    assert_eq!(
        store.previous_price(KEY, date("2024-01-01")).await.unwrap(),
        None
    );
    assert_eq!(
        store.previous_price(KEY, date("2024-01-02")).await.unwrap(),
        Some(110.0)
    );
}

#[tokio::test]
async fn history_is_monotonic_and_absence_does_not_erase() {
    let (_tmp, store) = setup().await;

    store
        .record_price(KEY, Some(110.0), date("2024-01-01"))
        .await
        .unwrap();
    store
        .record_price(KEY, Some(95.5), date("2024-01-02"))
        .await
        .unwrap();

    // From the second run's perspective, the previous price is P1.
    assert_eq!(
        store.previous_price(KEY, date("2024-01-02")).await.unwrap(),
        Some(110.0)
    );

    // A later failed fetch records nothing; P2 remains visible.
    store
        .record_price(KEY, None, date("2024-01-03"))
        .await
        .unwrap();
    assert_eq!(
        store.previous_price(KEY, date("2024-01-04")).await.unwrap(),
        Some(95.5)
    );
}

#[tokio::test]
async fn same_day_rerun_overwrites_only_that_day() {
    let (_tmp, store) = setup().await;

    store
        .record_price(KEY, Some(110.0), date("2024-01-01"))
        .await
        .unwrap();
    store
        .record_price(KEY, Some(100.0), date("2024-01-02"))
        .await
        .unwrap();
    // Re-run the second day with a new observation.
    store
        .record_price(KEY, Some(90.0), date("2024-01-02"))
        .await
        .unwrap();

    // Day one's record is untouched.
    assert_eq!(
        store.previous_price(KEY, date("2024-01-02")).await.unwrap(),
        Some(110.0)
    );
    // Day two now holds the overwritten value.
    assert_eq!(
        store.previous_price(KEY, date("2024-01-03")).await.unwrap(),
        Some(90.0)
    );
}

#[tokio::test]
async fn keys_are_independent() {
    let (_tmp, store) = setup().await;
    let other = "rapidapi:RTM:BCN:2024-01-04:THU_SUN";

    store
        .record_price(KEY, Some(110.0), date("2024-01-01"))
        .await
        .unwrap();
    store
        .record_price(other, Some(60.0), date("2024-01-01"))
        .await
        .unwrap();

    assert_eq!(
        store.previous_price(KEY, date("2024-01-02")).await.unwrap(),
        Some(110.0)
    );
    assert_eq!(
        store
            .previous_price(other, date("2024-01-02"))
            .await
            .unwrap(),
        Some(60.0)
    );
}

#[tokio::test]
async fn run_bookkeeping_tracks_latest_completed_run() {
    let (_tmp, store) = setup().await;
    assert_eq!(store.last_completed_run().await.unwrap(), None);

    store
        .mark_completed(date("2024-01-01"), 16, 0)
        .await
        .unwrap();
    store
        .mark_completed(date("2024-01-03"), 16, 2)
        .await
        .unwrap();

    assert_eq!(
        store.last_completed_run().await.unwrap(),
        Some(date("2024-01-03"))
    );
}
