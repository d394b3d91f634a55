//! Time-window normalization for lead queries.
//!
//! The dashboard hands over a loose bag of optional strings (`period`, `type`,
//! `date_from`, `date_to`). [`LeadFilter::from_params`] closes that into one of
//! three shapes, and [`LeadFilter::resolve`] turns it into a concrete
//! `[from, to]` range in epoch seconds. Malformed dates never error; they are
//! treated as absent.

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use kommo_client::CreatedAtFilter;
use serde::{Deserialize, Serialize};

/// Raw filter input as it arrives from the dashboard URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParams {
    pub period: Option<String>,
    #[serde(rename = "type")]
    pub lead_type: Option<String>,
    #[serde(alias = "dateFrom")]
    pub date_from: Option<String>,
    #[serde(alias = "dateTo")]
    pub date_to: Option<String>,
}

impl FilterParams {
    /// Collect known keys from URL query pairs. Empty values count as absent.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = FilterParams::default();
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "period" => &mut params.period,
                "type" => &mut params.lead_type,
                "date_from" | "dateFrom" => &mut params.date_from,
                "date_to" | "dateTo" => &mut params.date_to,
                _ => continue,
            };
            *slot = Some(value.to_string());
        }
        params
    }

    pub fn is_empty(&self) -> bool {
        self.period.is_none()
            && self.lead_type.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }
}

/// Named relative window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Yesterday,
    Week,
    Month,
}

impl Period {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "day" => Some(Period::Day),
            "yesterday" => Some(Period::Yesterday),
            "week" => Some(Period::Week),
            "month" => Some(Period::Month),
            _ => None,
        }
    }

    /// Window ending at `now` (or at the start of today for `Yesterday`).
    pub fn window(self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        match self {
            Period::Day => (start_of_day(now), now),
            Period::Yesterday => {
                let today = start_of_day(now);
                (today - Duration::days(1), today)
            }
            Period::Week => (now - Duration::days(7), now),
            Period::Month => {
                let from = now
                    .checked_sub_months(Months::new(1))
                    .unwrap_or(now - Duration::days(30));
                (from, now)
            }
        }
    }
}

/// Closed form of [`FilterParams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadFilter {
    NoFilter,
    ExplicitRange {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    NamedPeriod(Period),
}

impl LeadFilter {
    /// Explicit dates win over `period` when both parse. `custom` and any
    /// unknown period without usable dates fall back to no filter.
    pub fn from_params(params: &FilterParams) -> Self {
        let from = params.date_from.as_deref().and_then(parse_date);
        let to = params.date_to.as_deref().and_then(parse_date);
        if let (Some(from), Some(to)) = (from, to) {
            return LeadFilter::ExplicitRange {
                from: from.min(to),
                to: from.max(to),
            };
        }

        match params.period.as_deref().and_then(Period::parse) {
            Some(period) => LeadFilter::NamedPeriod(period),
            None => LeadFilter::NoFilter,
        }
    }

    /// Range to send upstream. `None` means "don't filter at all".
    pub fn range(&self, now: DateTime<Utc>) -> Option<FilterRange> {
        match *self {
            LeadFilter::NoFilter => None,
            LeadFilter::ExplicitRange { from, to } => Some(FilterRange::between(from, to)),
            LeadFilter::NamedPeriod(period) => {
                let (from, to) = period.window(now);
                Some(FilterRange::between(from, to))
            }
        }
    }

    pub fn resolve(&self, now: DateTime<Utc>) -> FilterRange {
        self.range(now).unwrap_or_else(|| FilterRange::all_time(now))
    }
}

/// Canonical creation-time window in epoch seconds. `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRange {
    pub from_epoch_seconds: i64,
    pub to_epoch_seconds: i64,
}

impl FilterRange {
    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        let (from, to) = (from.timestamp(), to.timestamp());
        Self {
            from_epoch_seconds: from.min(to),
            to_epoch_seconds: from.max(to),
        }
    }

    pub fn all_time(now: DateTime<Utc>) -> Self {
        Self {
            from_epoch_seconds: 0,
            to_epoch_seconds: now.timestamp().max(0),
        }
    }
}

impl From<FilterRange> for CreatedAtFilter {
    fn from(range: FilterRange) -> Self {
        CreatedAtFilter {
            from: range.from_epoch_seconds,
            to: range.to_epoch_seconds,
        }
    }
}

const MIN_EPOCH_DIGITS: usize = 9;

/// Best-effort date parsing. Returns `None` for anything unusable.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "false" {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN).and_utc());
    }
    if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
        let year = raw.parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1).map(|d| d.and_time(NaiveTime::MIN).and_utc());
    }
    // Shorter integers are more likely years or typos than epoch seconds.
    if raw.len() >= MIN_EPOCH_DIGITS {
        if let Ok(secs) = raw.parse::<i64>() {
            return DateTime::from_timestamp(secs, 0);
        }
    }
    None
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}
