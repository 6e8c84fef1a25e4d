//! Report aggregation.
//!
//! Merges per-route ranked buckets into one ordered report: weekends
//! ascending, routes in configured order, patterns in canonical order. Each
//! pattern carries its top-N itineraries and the price delta against the
//! history ledger; each weekend carries a headline best across all routes
//! and patterns.

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;

use crate::history::{make_key, PriceHistory};
use crate::models::{Itinerary, Pattern};
use crate::rank::Buckets;

/// Ranked buckets for one route, as produced by the filter & ranker.
#[derive(Debug, Clone)]
pub struct RouteBuckets {
    pub origin: String,
    pub destination: String,
    pub buckets: Buckets,
}

/// One (pattern) cell of the report. An empty `itineraries` vec means the
/// pattern was searched and nothing qualified; patterns that were never
/// computed for a weekend are absent from [`RouteReport::patterns`].
#[derive(Debug, Clone)]
pub struct PatternReport {
    pub pattern: Pattern,
    pub itineraries: Vec<Itinerary>,
    pub previous_price: Option<f64>,
    /// `best - previous`, only when both are present. Never defaulted to
    /// zero; an absent delta is not a zero-change delta.
    pub delta: Option<f64>,
}

impl PatternReport {
    pub fn best(&self) -> Option<&Itinerary> {
        self.itineraries.first()
    }
}

#[derive(Debug, Clone)]
pub struct RouteReport {
    pub origin: String,
    pub destination: String,
    pub patterns: Vec<PatternReport>,
}

#[derive(Debug, Clone)]
pub struct WeekendReport {
    pub week_start: NaiveDate,
    /// Cheapest fare across every route and pattern this weekend; absent
    /// when nothing survived anywhere.
    pub best_price: Option<f64>,
    pub routes: Vec<RouteReport>,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub generated_on: NaiveDate,
    pub currency: String,
    /// Human-readable description of the configured time windows.
    pub window_label: String,
    pub weekends: Vec<WeekendReport>,
}

/// Merge per-route buckets into the ordered report structure, consulting the
/// history store for previous prices. Read-only on the store.
pub async fn aggregate(
    routes: &[RouteBuckets],
    history: &dyn PriceHistory,
    provider: &str,
    today: NaiveDate,
    currency: &str,
    window_label: &str,
) -> Result<Report> {
    let week_starts: BTreeSet<NaiveDate> = routes
        .iter()
        .flat_map(|r| r.buckets.keys().map(|(ws, _)| *ws))
        .collect();

    let mut weekends = Vec::new();
    for week_start in week_starts {
        let mut best_price: Option<f64> = None;
        let mut route_reports = Vec::new();

        for route in routes {
            let mut patterns = Vec::new();
            for pattern in Pattern::ALL {
                let Some(bucket) = route.buckets.get(&(week_start, pattern)) else {
                    continue;
                };

                let best = bucket.first();
                let out_date = week_start + Duration::days(pattern.day_offsets().0);
                let key = make_key(
                    provider,
                    &route.origin,
                    &route.destination,
                    out_date,
                    pattern,
                    best,
                );
                let previous_price = history.previous_price(&key, today).await?;
                let delta = match (best, previous_price) {
                    (Some(b), Some(prev)) => Some(b.price - prev),
                    _ => None,
                };

                if let Some(b) = best {
                    if best_price.map(|p| b.price < p).unwrap_or(true) {
                        best_price = Some(b.price);
                    }
                }

                patterns.push(PatternReport {
                    pattern,
                    itineraries: bucket.clone(),
                    previous_price,
                    delta,
                });
            }
            if !patterns.is_empty() {
                route_reports.push(RouteReport {
                    origin: route.origin.clone(),
                    destination: route.destination.clone(),
                    patterns,
                });
            }
        }

        weekends.push(WeekendReport {
            week_start,
            best_price,
            routes: route_reports,
        });
    }

    Ok(Report {
        generated_on: today,
        currency: currency.to_string(),
        window_label: window_label.to_string(),
        weekends,
    })
}

/// Plain-text rendering for CLI output.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Weekend flights monitor — {} (windows {})\n",
        report.generated_on, report.window_label
    ));

    for weekend in &report.weekends {
        out.push_str(&format!("\nWeekend starting {}\n", weekend.week_start));
        match weekend.best_price {
            Some(p) => out.push_str(&format!("  best: {:.2} {}\n", p, report.currency)),
            None => out.push_str("  best: none (no qualifying fare found)\n"),
        }

        for route in &weekend.routes {
            out.push_str(&format!("  {} -> {}\n", route.origin, route.destination));
            for pr in &route.patterns {
                match pr.best() {
                    Some(best) => {
                        let delta = match pr.delta {
                            Some(d) => format!(" ({:+.2} vs last run)", d),
                            None => String::new(),
                        };
                        out.push_str(&format!(
                            "    {:<11} {:.2} {}{}\n",
                            pr.pattern.label(),
                            best.price,
                            report.currency,
                            delta
                        ));
                        for (idx, it) in pr.itineraries.iter().enumerate() {
                            out.push_str(&format!(
                                "      {}) {:.2} {} {} out {} in {}\n",
                                idx + 1,
                                it.price,
                                it.currency,
                                it.outbound.flight_number.as_deref().unwrap_or("-"),
                                it.outbound.departure_local.format("%a %H:%M"),
                                it.inbound.departure_local.format("%a %H:%M"),
                            ));
                        }
                    }
                    None => {
                        out.push_str(&format!(
                            "    {:<11} no qualifying fare found\n",
                            pr.pattern.label()
                        ));
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Leg;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FixedHistory {
        prices: HashMap<String, f64>,
    }

    #[async_trait]
    impl PriceHistory for FixedHistory {
        async fn previous_price(&self, key: &str, _before: NaiveDate) -> Result<Option<f64>> {
            Ok(self.prices.get(key).copied())
        }

        async fn record_price(
            &self,
            _key: &str,
            _price: Option<f64>,
            _run_date: NaiveDate,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn itinerary(price: f64, flight: &str) -> Itinerary {
        Itinerary {
            price,
            currency: "EUR".to_string(),
            outbound: Leg {
                departure_local: "2024-01-04T18:00:00".parse().unwrap(),
                arrival_local: None,
                carrier_code: Some("HV".to_string()),
                flight_number: Some(flight.to_string()),
            },
            inbound: Leg {
                departure_local: "2024-01-07T18:00:00".parse().unwrap(),
                arrival_local: None,
                carrier_code: Some("HV".to_string()),
                flight_number: Some("HV5136".to_string()),
            },
        }
    }

    fn thursday() -> NaiveDate {
        "2024-01-04".parse().unwrap()
    }

    #[tokio::test]
    async fn computes_delta_against_previous_price() {
        let mut buckets = Buckets::new();
        buckets.insert(
            (thursday(), Pattern::ThuSun),
            vec![itinerary(95.50, "HV5131"), itinerary(120.00, "HV5133")],
        );
        let routes = vec![RouteBuckets {
            origin: "AMS".to_string(),
            destination: "BCN".to_string(),
            buckets,
        }];

        let mut prices = HashMap::new();
        prices.insert("rapidapi:AMS:BCN:2024-01-04:HV5131".to_string(), 110.00);
        let history = FixedHistory { prices };

        let report = aggregate(
            &routes,
            &history,
            "rapidapi",
            "2024-01-01".parse().unwrap(),
            "EUR",
            "17:00-23:59",
        )
        .await
        .unwrap();

        assert_eq!(report.weekends.len(), 1);
        let weekend = &report.weekends[0];
        assert_eq!(weekend.best_price, Some(95.50));
        let pr = &weekend.routes[0].patterns[0];
        assert_eq!(pr.pattern, Pattern::ThuSun);
        assert_eq!(pr.best().unwrap().price, 95.50);
        assert_eq!(pr.previous_price, Some(110.00));
        assert!((pr.delta.unwrap() - (-14.50)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn delta_absent_without_previous_price() {
        let mut buckets = Buckets::new();
        buckets.insert((thursday(), Pattern::ThuSun), vec![itinerary(95.50, "HV5131")]);
        let routes = vec![RouteBuckets {
            origin: "AMS".to_string(),
            destination: "BCN".to_string(),
            buckets,
        }];
        let history = FixedHistory {
            prices: HashMap::new(),
        };

        let report = aggregate(
            &routes,
            &history,
            "rapidapi",
            "2024-01-01".parse().unwrap(),
            "EUR",
            "17:00-23:59",
        )
        .await
        .unwrap();

        let pr = &report.weekends[0].routes[0].patterns[0];
        assert_eq!(pr.delta, None);
        assert_eq!(pr.previous_price, None);
    }

    #[tokio::test]
    async fn empty_bucket_rendered_distinct_from_absent() {
        let mut buckets = Buckets::new();
        buckets.insert((thursday(), Pattern::ThuSun), vec![]);
        // FriSun never computed: no key at all.
        let routes = vec![RouteBuckets {
            origin: "AMS".to_string(),
            destination: "BCN".to_string(),
            buckets,
        }];
        let history = FixedHistory {
            prices: HashMap::new(),
        };

        let report = aggregate(
            &routes,
            &history,
            "rapidapi",
            "2024-01-01".parse().unwrap(),
            "EUR",
            "17:00-23:59",
        )
        .await
        .unwrap();

        let weekend = &report.weekends[0];
        assert_eq!(weekend.best_price, None);
        let patterns: Vec<Pattern> = weekend.routes[0]
            .patterns
            .iter()
            .map(|p| p.pattern)
            .collect();
        assert_eq!(patterns, vec![Pattern::ThuSun]);
        assert!(weekend.routes[0].patterns[0].itineraries.is_empty());

        let text = render_text(&report);
        assert!(text.contains("no qualifying fare found"));
    }

    #[tokio::test]
    async fn weekends_ascend_and_patterns_follow_canonical_order() {
        let later: NaiveDate = "2024-01-11".parse().unwrap();
        let mut buckets = Buckets::new();
        buckets.insert((later, Pattern::FriMon), vec![itinerary(70.0, "HV1")]);
        buckets.insert((later, Pattern::ThuSun), vec![itinerary(90.0, "HV2")]);
        buckets.insert((thursday(), Pattern::FriSun), vec![itinerary(80.0, "HV3")]);
        let routes = vec![RouteBuckets {
            origin: "AMS".to_string(),
            destination: "BCN".to_string(),
            buckets,
        }];
        let history = FixedHistory {
            prices: HashMap::new(),
        };

        let report = aggregate(
            &routes,
            &history,
            "rapidapi",
            "2024-01-01".parse().unwrap(),
            "EUR",
            "17:00-23:59",
        )
        .await
        .unwrap();

        let starts: Vec<NaiveDate> = report.weekends.iter().map(|w| w.week_start).collect();
        assert_eq!(starts, vec![thursday(), later]);

        let second: Vec<Pattern> = report.weekends[1].routes[0]
            .patterns
            .iter()
            .map(|p| p.pattern)
            .collect();
        assert_eq!(second, vec![Pattern::ThuSun, Pattern::FriMon]);
    }
}
