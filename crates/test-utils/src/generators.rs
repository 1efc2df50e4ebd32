//! Generators of synthetic daily values in the collection's native units.
//!
//! Values are per day and spatially constant, which is all the fake service
//! needs: a region mean of a constant image is the constant itself.

use chrono::{Datelike, NaiveDate};

/// Daily maximum temperature in Kelvin: `base` plus a day-of-year ramp of
/// 0.01 K per day.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use test_utils::ramp_temperature;
///
/// let jan2 = NaiveDate::from_ymd_opt(2000, 1, 2).unwrap();
/// assert!((ramp_temperature(290.0)(jan2) - 290.01).abs() < 1e-9);
/// ```
pub fn ramp_temperature(base: f64) -> impl Fn(NaiveDate) -> f64 {
    move |date| base + (date.ordinal0() as f64) * 0.01
}

/// Constant precipitation flux in kg m-2 s-1.
pub fn constant_flux(flux: f64) -> impl Fn(NaiveDate) -> f64 {
    move |_| flux
}

/// Value that encodes the date, `year * 1000 + day_of_year`, for order checks.
///
/// ```
/// use chrono::NaiveDate;
/// use test_utils::date_stamp;
///
/// let d = NaiveDate::from_ymd_opt(1950, 2, 1).unwrap();
/// assert_eq!(date_stamp(d), 1950032.0);
/// ```
pub fn date_stamp(date: NaiveDate) -> f64 {
    (date.year() * 1000 + date.ordinal() as i32) as f64
}

/// Every day in `[start, end)`.
pub fn days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d < end).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_days_half_open() {
        assert_eq!(days(d(2000, 1, 1), d(2001, 1, 1)).len(), 366);
        assert_eq!(days(d(2001, 1, 1), d(2002, 1, 1)).len(), 365);
        assert!(days(d(2001, 1, 1), d(2001, 1, 1)).is_empty());
    }

    #[test]
    fn test_ramp_starts_at_base() {
        assert_eq!(ramp_temperature(300.0)(d(1999, 1, 1)), 300.0);
    }
}
