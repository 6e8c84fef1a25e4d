//! Weekend query planner.
//!
//! Generates the round-trip date pairs to search over a rolling horizon of
//! weeks: one [`QueryKey`] per (origin, pattern, week). Pure date arithmetic,
//! no I/O.

use chrono::{Datelike, Duration, NaiveDate};
use std::collections::HashSet;

use crate::models::{Pattern, QueryKey};

/// First Thursday worth planning for.
///
/// On Monday or Tuesday the current week's Thursday is still useful to warn
/// about; from Wednesday on, a same-week departure is too close and planning
/// starts at next week's Thursday.
fn first_thursday(today: NaiveDate) -> NaiveDate {
    // Anchor on the current calendar week's Thursday, which may already be
    // in the past on Fri-Sun.
    let week_monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    let this_thu = week_monday + Duration::days(3);
    if today.weekday().num_days_from_monday() <= 1 {
        this_thu
    } else {
        this_thu + Duration::days(7)
    }
}

/// Generate the queries for the next `horizon_weeks` weeks, one per
/// (origin, pattern, week), weeks ascending then patterns in canonical order.
///
/// Output is deduplicated by the full (origin, destination, pattern,
/// outbound, inbound) tuple; overlapping week alignments must not produce
/// the same search twice. Order is stable for reproducibility.
pub fn generate_queries(
    today: NaiveDate,
    horizon_weeks: u32,
    origins: &[String],
    destination: &str,
) -> Vec<QueryKey> {
    let start = first_thursday(today);
    let mut seen: HashSet<(String, Pattern, NaiveDate, NaiveDate)> = HashSet::new();
    let mut out = Vec::new();

    for week in 0..horizon_weeks {
        let week_thu = start + Duration::days(7 * week as i64);
        for pattern in Pattern::ALL {
            let (out_off, in_off) = pattern.day_offsets();
            let outbound = week_thu + Duration::days(out_off);
            let inbound = week_thu + Duration::days(in_off);
            for origin in origins {
                if !seen.insert((origin.clone(), pattern, outbound, inbound)) {
                    continue;
                }
                out.push(QueryKey {
                    origin: origin.clone(),
                    destination: destination.to_string(),
                    pattern,
                    outbound_date: outbound,
                    inbound_date: inbound,
                    week_start: week_thu,
                });
            }
        }
    }
    out
}

/// Run the `plan` command: print the queries the next run would execute.
/// `today` is overridable for reproducible output.
pub fn run_plan(cfg: &crate::config::Config, today: Option<NaiveDate>) {
    let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());
    let queries = generate_queries(
        today,
        cfg.search.horizon_weeks,
        &cfg.search.origins,
        &cfg.search.destination,
    );

    println!(
        "plan for {} ({} week(s), {} origin(s))",
        today,
        cfg.search.horizon_weeks,
        cfg.search.origins.len()
    );
    for q in &queries {
        println!(
            "  {} -> {}  {}  {} -> {}  (week of {})",
            q.origin, q.destination, q.pattern.name(), q.outbound_date, q.inbound_date, q.week_start
        );
    }
    println!("  {} queries", queries.len());
}
