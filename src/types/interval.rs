use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// A named half-open date window `[start, end)` for one site.
///
/// `end <= start` is a valid, empty interval. It aggregates to zero days and is
/// never rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub site_id: String,
    pub label: String,
    pub name: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Interval {
    pub fn new(
        site_id: &str,
        label: impl Into<String>,
        name: Option<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            site_id: site_id.to_string(),
            label: label.into(),
            name,
            start,
            end,
        }
    }

    /// `start <= date < end`.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Number of calendar days covered; zero for empty or inverted intervals.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days().max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// The inclusive view of the upper bound (`end - 1 day`).
    pub fn last_day(&self) -> NaiveDate {
        self.end.checked_sub_days(Days::new(1)).unwrap_or(self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn half_open_membership() {
        let interval = Interval::new("S", "A", None, date(2018, 5, 1), date(2018, 5, 12));
        assert!(interval.contains(date(2018, 5, 1)));
        assert!(interval.contains(date(2018, 5, 11)));
        assert!(!interval.contains(date(2018, 5, 12)));
        assert_eq!(interval.span_days(), 11);
        assert_eq!(interval.last_day(), date(2018, 5, 11));
    }

    #[test]
    fn degenerate_interval_is_empty() {
        let interval = Interval::new("S", "A", None, date(2018, 5, 1), date(2018, 5, 1));
        assert!(interval.is_empty());
        assert_eq!(interval.span_days(), 0);
        assert!(!interval.contains(date(2018, 5, 1)));

        let inverted = Interval::new("S", "B", None, date(2018, 5, 3), date(2018, 5, 1));
        assert!(inverted.is_empty());
        assert_eq!(inverted.span_days(), 0);
    }
}
