//! Calendar bucket keys used by the calendar interval strategies.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::fmt::{Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Year(pub i32);
impl Year {
    pub fn get(self) -> i32 {
        self.0
    }

    pub fn of(date: NaiveDate) -> Self {
        Self(date.year())
    }
}

impl Display for Year {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Month(pub i32, pub u32);
impl Month {
    pub fn year(self) -> i32 {
        self.0
    }
    pub fn month(self) -> u32 {
        self.1
    }
    pub fn new(month: u32, year: i32) -> Self {
        Self(year, month)
    }

    pub fn of(date: NaiveDate) -> Self {
        Self(date.year(), date.month())
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.0, self.1)
    }
}

/// First and last calendar day of every year touched by `[start, end]`.
///
/// Some providers only serve whole years, so requests are widened to this span
/// and trimmed again after normalization. `None` when `start > end`.
pub fn year_span(start: NaiveDate, end: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    if start > end {
        return None;
    }
    Some((
        NaiveDate::from_ymd_opt(start.year(), 1, 1)?,
        NaiveDate::from_ymd_opt(end.year(), 12, 31)?,
    ))
}
