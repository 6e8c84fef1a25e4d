//! Pipeline orchestration.
//!
//! Coordinates one full run: plan → fetch per query → normalize → rank →
//! record history → aggregate → render → deliver. Single-threaded batch
//! semantics: queries run sequentially and the run either completes or
//! aborts; partial results are never emitted.

use anyhow::Result;
use chrono::Duration;

use crate::config::Config;
use crate::db;
use crate::email;
use crate::fetch::FlightsClient;
use crate::history::{make_key, PriceHistory, SqliteHistory};
use crate::models::QueryKey;
use crate::normalize;
use crate::planner;
use crate::rank::{self, Constraints};
use crate::report::{self, RouteBuckets};

pub async fn run_pipeline(cfg: &Config, dry_run: bool, force: bool, no_email: bool) -> Result<()> {
    // The history store is load-bearing: best prices without delta tracking
    // defeat the point, so an unavailable store aborts the run.
    let pool = db::connect(cfg).await?;
    let history = SqliteHistory::new(pool.clone());

    let today = chrono::Local::now().date_naive();

    // Refresh policy: skip the run when the last one is recent enough.
    if !force && !dry_run {
        if let Some(last) = history.last_completed_run().await? {
            let age = (today - last).num_days();
            if age < cfg.refresh.every_days as i64 {
                println!(
                    "last run was {} ({} day(s) ago); refresh interval is {} day(s). Use --force to run anyway.",
                    last, age, cfg.refresh.every_days
                );
                pool.close().await;
                return Ok(());
            }
        }
    }

    let queries = planner::generate_queries(
        today,
        cfg.search.horizon_weeks,
        &cfg.search.origins,
        &cfg.search.destination,
    );

    // Resolving the API key late would waste queries; missing credentials
    // abort before anything is fetched.
    let client = FlightsClient::new(&cfg.fetch)?;

    let constraints = Constraints {
        today,
        horizon_weeks: cfg.search.horizon_weeks,
        top_n: cfg.search.top_n,
        window_out: (
            cfg.window.outbound_from.clone(),
            cfg.window.outbound_to.clone(),
        ),
        window_in: (
            cfg.window.inbound_from.clone(),
            cfg.window.inbound_to.clone(),
        ),
        match_out: cfg.window.outbound_match,
        match_in: cfg.window.inbound_match,
    };

    let mut raw_total = 0usize;
    let mut malformed = 0usize;
    let mut fetched_ok = 0usize;
    let mut fetch_failures = 0usize;

    let mut routes: Vec<RouteBuckets> = Vec::new();
    for origin in &cfg.search.origins {
        let route_queries: Vec<QueryKey> = queries
            .iter()
            .filter(|q| &q.origin == origin)
            .cloned()
            .collect();

        let mut itineraries = Vec::new();
        for query in &route_queries {
            match client.search_round_trip(query, &cfg.search.currency).await {
                Ok(payload) => {
                    fetched_ok += 1;
                    let raw = normalize::raw_count(&payload);
                    let normalized: Vec<_> =
                        normalize::normalize(&payload, &cfg.search.currency).collect();
                    raw_total += raw;
                    malformed += raw - normalized.len();
                    itineraries.extend(normalized);
                }
                Err(e) => {
                    // Non-fatal: the bucket stays an explicit empty and
                    // history for its keys is left untouched.
                    fetch_failures += 1;
                    eprintln!("[fetch-error] {e:#}");
                }
            }
        }

        let mut buckets = rank::Buckets::new();
        rank::seed_buckets(&mut buckets, &route_queries);
        rank::rank_into(&mut buckets, itineraries, &constraints);

        routes.push(RouteBuckets {
            origin: origin.clone(),
            destination: cfg.search.destination.clone(),
            buckets,
        });
    }

    // Record this run's best prices before aggregation; lookups compare
    // strictly earlier run dates, so today's writes never feed today's deltas.
    if !dry_run {
        for route in &routes {
            for ((week_start, pattern), bucket) in &route.buckets {
                let out_date = *week_start + Duration::days(pattern.day_offsets().0);
                let best = bucket.first();
                let key = make_key(
                    &cfg.fetch.provider,
                    &route.origin,
                    &route.destination,
                    out_date,
                    *pattern,
                    best,
                );
                history
                    .record_price(&key, best.map(|b| b.price), today)
                    .await?;
            }
        }
    }

    let window_label = format!(
        "out {}-{} / in {}-{}",
        cfg.window.outbound_from,
        cfg.window.outbound_to,
        cfg.window.inbound_from,
        cfg.window.inbound_to
    );
    let report = report::aggregate(
        &routes,
        &history,
        &cfg.fetch.provider,
        today,
        &cfg.search.currency,
        &window_label,
    )
    .await?;

    print!("{}", report::render_text(&report));

    if !dry_run && !no_email {
        match &cfg.email {
            Some(email_cfg) => {
                let html = email::render_html(&report);
                email::send(email_cfg, html)?;
                println!("email sent to {}", email_cfg.to);
            }
            None => println!("email not configured; skipping delivery"),
        }
    }

    if !dry_run {
        history
            .mark_completed(today, queries.len() as i64, fetch_failures as i64)
            .await?;
    }

    println!();
    println!("run {}{}", today, if dry_run { " (dry-run)" } else { "" });
    println!("  queries planned: {}", queries.len());
    println!("  fetched: {} ok, {} failed", fetched_ok, fetch_failures);
    println!("  raw itineraries: {}", raw_total);
    println!("  dropped malformed: {}", malformed);
    println!("ok");

    pool.close().await;
    Ok(())
}
