//! Itinerary filtering and ranking.
//!
//! Applies weekday-pattern matching and local-time-window constraints, then
//! ranks survivors by price into per-(week start, pattern) buckets truncated
//! to the configured top N. Deterministic: stable sort, ties keep
//! first-encountered order.

use chrono::{Datelike, Duration, NaiveDate};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::TimeMatchMode;
use crate::models::{Itinerary, Leg, Pattern, QueryKey};

/// Bucket identity: the anchor Thursday plus the trip shape.
pub type BucketKey = (NaiveDate, Pattern);

/// Ranked buckets. An empty vec means "computed, nothing qualified" —
/// distinct from an absent key, which means "never computed".
pub type Buckets = BTreeMap<BucketKey, Vec<Itinerary>>;

/// Filtering constraints for one run.
#[derive(Debug, Clone)]
pub struct Constraints {
    pub today: NaiveDate,
    pub horizon_weeks: u32,
    pub top_n: usize,
    /// Inclusive `HH:MM` bounds per leg; lexicographic comparison holds for
    /// zero-padded 24h strings.
    pub window_out: (String, String),
    pub window_in: (String, String),
    pub match_out: TimeMatchMode,
    pub match_in: TimeMatchMode,
}

impl Constraints {
    fn horizon_end(&self) -> NaiveDate {
        self.today + Duration::days(7 * self.horizon_weeks as i64)
    }
}

fn hhmm(leg_time: chrono::NaiveDateTime) -> String {
    leg_time.format("%H:%M").to_string()
}

fn in_window(t: &str, window: &(String, String)) -> bool {
    window.0.as_str() <= t && t <= window.1.as_str()
}

/// Whether a leg satisfies its window under the configured match mode.
/// `ArriveOnly` with no arrival time on record fails the constraint.
fn leg_qualifies(leg: &Leg, window: &(String, String), mode: TimeMatchMode) -> bool {
    let dep_ok = in_window(&hhmm(leg.departure_local), window);
    let arr_ok = leg
        .arrival_local
        .map(|a| in_window(&hhmm(a), window))
        .unwrap_or(false);
    match mode {
        TimeMatchMode::DepartOnly => dep_ok,
        TimeMatchMode::ArriveOnly => arr_ok,
        TimeMatchMode::Either => dep_ok || arr_ok,
    }
}

/// Bucket key for an itinerary that passes every constraint, `None` otherwise.
fn accepts(it: &Itinerary, c: &Constraints) -> Option<BucketKey> {
    let pattern = Pattern::from_weekdays(
        it.outbound.departure_local.weekday(),
        it.inbound.departure_local.weekday(),
    )?;
    if !leg_qualifies(&it.outbound, &c.window_out, c.match_out) {
        return None;
    }
    if !leg_qualifies(&it.inbound, &c.window_in, c.match_in) {
        return None;
    }
    let week_start = it.week_start();
    if week_start < c.today || week_start > c.horizon_end() {
        return None;
    }
    Some((week_start, pattern))
}

/// Filter `itineraries` into `buckets`, then sort every bucket ascending by
/// price (stable) and truncate to top N. Pre-seeded empty buckets survive as
/// explicit empties.
pub fn rank_into<I>(buckets: &mut Buckets, itineraries: I, c: &Constraints)
where
    I: IntoIterator<Item = Itinerary>,
{
    for it in itineraries {
        if let Some(key) = accepts(&it, c) {
            buckets.entry(key).or_default().push(it);
        }
    }
    for entries in buckets.values_mut() {
        entries.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal));
        entries.truncate(c.top_n);
    }
}

/// Rank into a fresh map. See [`rank_into`].
pub fn rank<I>(itineraries: I, c: &Constraints) -> Buckets
where
    I: IntoIterator<Item = Itinerary>,
{
    let mut buckets = Buckets::new();
    rank_into(&mut buckets, itineraries, c);
    buckets
}

/// Seed one explicit empty bucket per planned query, so weekends with no
/// qualifying fare render as "none found" instead of disappearing.
pub fn seed_buckets(buckets: &mut Buckets, queries: &[QueryKey]) {
    for q in queries {
        buckets.entry((q.week_start, q.pattern)).or_default();
    }
}
