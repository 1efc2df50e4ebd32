//! Date ranges and the whole-year partition shared by every export product.

use std::ops::Range;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Cmip5Error, Cmip5Result};

/// Parse a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(s: &str) -> Cmip5Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| Cmip5Error::InvalidDate(s.to_string()))
}

/// A half-open date range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

/// One whole-year slice of a [`DateRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearWindow {
    pub year: i32,
    /// Inclusive.
    pub start: NaiveDate,
    /// Exclusive.
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range; `start` must strictly precede `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Cmip5Result<Self> {
        if start >= end {
            return Err(Cmip5Error::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Calendar years covered, with the end year excluded.
    ///
    /// `2000-01-01..2003-01-01` yields 2000, 2001, 2002. A range that starts
    /// and ends within the same year yields nothing.
    pub fn years(&self) -> Range<i32> {
        self.start.year()..self.end.year()
    }

    /// One window per year of [`DateRange::years`], running from the year's
    /// first day to the next year's first day.
    ///
    /// Windows always cover whole calendar years: a range starting mid-year
    /// still gets a window from January 1 of its first year.
    pub fn year_windows(&self) -> Vec<YearWindow> {
        self.years()
            .filter_map(|year| {
                Some(YearWindow {
                    year,
                    start: NaiveDate::from_ymd_opt(year, 1, 1)?,
                    end: NaiveDate::from_ymd_opt(year + 1, 1, 1)?,
                })
            })
            .collect()
    }
}

impl YearWindow {
    /// The window start as used in artifact names, e.g. `2000-01-01`.
    pub fn label(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_years_exclude_end_year() {
        let range = DateRange::new(d("2000-01-01"), d("2003-01-01")).unwrap();
        assert_eq!(range.years().collect::<Vec<_>>(), vec![2000, 2001, 2002]);
    }

    #[test]
    fn test_years_exclude_end_year_even_when_end_is_late() {
        let range = DateRange::new(d("2006-01-01"), d("2100-12-31")).unwrap();
        let years: Vec<_> = range.years().collect();
        assert_eq!(years.first(), Some(&2006));
        assert_eq!(years.last(), Some(&2099));
        assert_eq!(years.len(), 94);
    }

    #[test]
    fn test_start_must_precede_end() {
        assert!(matches!(
            DateRange::new(d("2000-01-01"), d("2000-01-01")),
            Err(Cmip5Error::InvalidDateRange { .. })
        ));
        assert!(DateRange::new(d("2001-01-01"), d("2000-01-01")).is_err());
    }

    #[test]
    fn test_year_windows_are_year_start_to_next_year_start() {
        let range = DateRange::new(d("1950-01-01"), d("1952-01-01")).unwrap();
        let windows = range.year_windows();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].start, d("1950-01-01"));
        assert_eq!(windows[0].end, d("1951-01-01"));
        assert_eq!(windows[1].start, d("1951-01-01"));
        assert_eq!(windows[1].end, d("1952-01-01"));
        assert_eq!(windows[1].label(), "1951-01-01");
    }

    #[test]
    fn test_year_windows_start_on_january_first() {
        let range = DateRange::new(d("2000-06-15"), d("2002-03-01")).unwrap();
        let windows = range.year_windows();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].start, d("2000-01-01"));
        assert_eq!(windows[0].end, d("2001-01-01"));
        assert_eq!(windows[0].label(), "2000-01-01");
        assert_eq!(windows[1].start, d("2001-01-01"));
        assert_eq!(windows[1].end, d("2002-01-01"));
    }

    #[test]
    fn test_parse_date_rejects_other_formats() {
        assert!(parse_date("01/01/2000").is_err());
        assert!(parse_date("2000-13-01").is_err());
        assert_eq!(parse_date(" 2000-02-29 ").unwrap(), d("2000-02-29"));
    }
}
