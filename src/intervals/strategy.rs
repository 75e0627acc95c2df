//! Interval generation strategies.
//!
//! Every strategy emits half-open `[start, end)` windows. A season `[site.start, site.end]`
//! is therefore closed by `site.end + 1 day`, and lookback windows end on `site.start`.
//!
//! Label `A` belongs to the lookback window. With a lookback of zero days the window is
//! not emitted at all and the season phases keep their labels from `B` on.

use crate::types::interval::Interval;
use crate::types::period::{Month, Year};
use crate::types::site::Site;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const LOOKBACK_NAME: &str = "lookback";
const SEASON_START_NAME: &str = "start";

/// How a site's timeline is cut into intervals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntervalStrategy {
    /// One interval spanning the whole season.
    FullSeason,
    /// An optional lookback interval followed by `count` near-equal partitions of the season.
    Even { count: usize },
    /// An optional lookback interval, then one interval per season phase delimited by the
    /// site's milestones.
    Milestones,
    /// One interval per calendar year present in the daily records.
    CalendarYear,
    /// One interval per (year, month) present in the daily records.
    CalendarMonth,
}

impl IntervalStrategy {
    /// Builds the intervals of `site`.
    ///
    /// `dates` are the dates of the site's daily records; only the calendar
    /// strategies look at them.
    pub fn generate(&self, site: &Site, lookback_days: u32, dates: &[NaiveDate]) -> Vec<Interval> {
        match self {
            IntervalStrategy::FullSeason => vec![full_season(site)],
            IntervalStrategy::Even { count } => even(site, *count, lookback_days),
            IntervalStrategy::Milestones => milestones(site, lookback_days),
            IntervalStrategy::CalendarYear => calendar(site.id(), dates, Year::of),
            IntervalStrategy::CalendarMonth => calendar(site.id(), dates, Month::of),
        }
    }

    /// Whether [`IntervalStrategy::generate`] needs the record dates.
    pub fn needs_dates(&self) -> bool {
        matches!(
            self,
            IntervalStrategy::CalendarYear | IntervalStrategy::CalendarMonth
        )
    }
}

/// Spreadsheet-style ordinal labels: `A..Z`, `AA..AZ`, `BA..`.
pub fn ordinal_label(index: usize) -> String {
    let mut n = index + 1;
    let mut label = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        label.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    label.reverse();
    String::from_utf8_lossy(&label).into_owned()
}

fn full_season(site: &Site) -> Interval {
    Interval::new(
        site.id(),
        "season",
        None,
        site.start(),
        site.season_end_exclusive(),
    )
}

fn lookback(site: &Site, lookback_days: u32) -> Option<Interval> {
    (lookback_days > 0).then(|| {
        Interval::new(
            site.id(),
            ordinal_label(0),
            Some(LOOKBACK_NAME.to_string()),
            site.lookback_start(lookback_days),
            site.start(),
        )
    })
}

fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_days(Days::new(days.max(0) as u64))
        .unwrap_or(date)
}

/// `count + 1` breakpoints interpolated over `[start, end]`, both ends included.
pub fn even_breakpoints(start: NaiveDate, end: NaiveDate, count: usize) -> Vec<NaiveDate> {
    if count == 0 {
        return vec![start];
    }
    let span = (end - start).num_days();
    (0..=count)
        .map(|i| add_days(start, span * i as i64 / count as i64))
        .collect()
}

fn even(site: &Site, count: usize, lookback_days: u32) -> Vec<Interval> {
    let mut intervals: Vec<Interval> = lookback(site, lookback_days).into_iter().collect();
    let breaks = even_breakpoints(site.start(), site.end(), count);
    for i in 0..count {
        let end = if i + 1 == count {
            site.season_end_exclusive()
        } else {
            breaks[i + 1]
        };
        intervals.push(Interval::new(
            site.id(),
            ordinal_label(i + 1),
            None,
            breaks[i],
            end,
        ));
    }
    intervals
}

fn milestones(site: &Site, lookback_days: u32) -> Vec<Interval> {
    let mut intervals: Vec<Interval> = lookback(site, lookback_days).into_iter().collect();

    let mut opens: Vec<(&str, NaiveDate)> = vec![(SEASON_START_NAME, site.start())];
    opens.extend(site.milestones().iter().map(|m| (m.name.as_str(), m.date)));

    for (i, (name, start)) in opens.iter().enumerate() {
        let end = opens
            .get(i + 1)
            .map(|(_, next)| *next)
            .unwrap_or_else(|| site.season_end_exclusive());
        intervals.push(Interval::new(
            site.id(),
            ordinal_label(i + 1),
            Some(name.to_string()),
            *start,
            end,
        ));
    }
    intervals
}

fn calendar<K, F>(site_id: &str, dates: &[NaiveDate], key: F) -> Vec<Interval>
where
    K: Ord + ToString,
    F: Fn(NaiveDate) -> K,
{
    let mut buckets: BTreeMap<K, (NaiveDate, NaiveDate)> = BTreeMap::new();
    for &date in dates {
        buckets
            .entry(key(date))
            .and_modify(|(min, max)| {
                *min = (*min).min(date);
                *max = (*max).max(date);
            })
            .or_insert((date, date));
    }
    buckets
        .into_iter()
        .map(|(k, (min, max))| Interval::new(site_id, k.to_string(), None, min, add_days(max, 1)))
        .collect()
}
