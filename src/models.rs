//! Core data models used throughout farewatch.
//!
//! These types represent the planned queries, normalized itineraries, and
//! ranked buckets that flow through the fetch → normalize → rank → report
//! pipeline.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};

/// A qualifying weekend trip shape: (outbound weekday, inbound weekday).
///
/// Declaration order is the canonical report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Pattern {
    ThuSun,
    ThuMon,
    FriSun,
    FriMon,
}

impl Pattern {
    /// All patterns, in canonical order.
    pub const ALL: [Pattern; 4] = [
        Pattern::ThuSun,
        Pattern::ThuMon,
        Pattern::FriSun,
        Pattern::FriMon,
    ];

    /// Stable identifier used in history keys and machine-readable output.
    pub fn name(&self) -> &'static str {
        match self {
            Pattern::ThuSun => "THU_SUN",
            Pattern::ThuMon => "THU_MON",
            Pattern::FriSun => "FRI_SUN",
            Pattern::FriMon => "FRI_MON",
        }
    }

    /// Human-readable label used in report output.
    pub fn label(&self) -> &'static str {
        match self {
            Pattern::ThuSun => "Thu -> Sun",
            Pattern::ThuMon => "Thu -> Mon",
            Pattern::FriSun => "Fri -> Sun",
            Pattern::FriMon => "Fri -> Mon",
        }
    }

    /// Day offsets from the week's anchor Thursday: (outbound, inbound).
    /// Thu=+0, Fri=+1, Sun=+3, Mon=+4.
    pub fn day_offsets(&self) -> (i64, i64) {
        match self {
            Pattern::ThuSun => (0, 3),
            Pattern::ThuMon => (0, 4),
            Pattern::FriSun => (1, 3),
            Pattern::FriMon => (1, 4),
        }
    }

    /// Derive the pattern from the two legs' departure weekdays.
    /// Returns `None` when the pair is not a defined weekend shape.
    pub fn from_weekdays(outbound: Weekday, inbound: Weekday) -> Option<Pattern> {
        match (outbound, inbound) {
            (Weekday::Thu, Weekday::Sun) => Some(Pattern::ThuSun),
            (Weekday::Thu, Weekday::Mon) => Some(Pattern::ThuMon),
            (Weekday::Fri, Weekday::Sun) => Some(Pattern::FriSun),
            (Weekday::Fri, Weekday::Mon) => Some(Pattern::FriMon),
            _ => None,
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One planned round-trip search.
///
/// Invariants: `inbound_date > outbound_date`; `week_start` is the Thursday
/// on or before `outbound_date`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub origin: String,
    pub destination: String,
    pub pattern: Pattern,
    pub outbound_date: NaiveDate,
    pub inbound_date: NaiveDate,
    pub week_start: NaiveDate,
}

/// One direction of a normalized itinerary.
///
/// Timestamps are timezone-naive airport-local wall-clock values; the source
/// already encodes local time and all window checks compare local HH:MM.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    pub departure_local: NaiveDateTime,
    pub arrival_local: Option<NaiveDateTime>,
    pub carrier_code: Option<String>,
    pub flight_number: Option<String>,
}

/// A normalized round-trip itinerary.
///
/// Both legs carry a departure time; records that cannot satisfy that are
/// dropped during normalization and never reach the ranked set.
#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    pub price: f64,
    pub currency: String,
    pub outbound: Leg,
    pub inbound: Leg,
}

impl Itinerary {
    /// The Thursday anchoring this itinerary's weekend: Friday departures
    /// group with the preceding Thursday, Thursday departures anchor
    /// their own week.
    pub fn week_start(&self) -> NaiveDate {
        let dep = self.outbound.departure_local.date();
        if dep.weekday() == Weekday::Fri {
            dep - chrono::Duration::days(1)
        } else {
            dep
        }
    }
}
