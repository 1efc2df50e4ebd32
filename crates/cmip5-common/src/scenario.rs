//! Climate forcing scenarios and their default date windows.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Cmip5Error;

/// A named forcing pathway in the NEX-GDDP collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// Retrospective runs, 1950-2005.
    Historical,
    /// Moderate-emission projection.
    Rcp45,
    /// High-emission projection.
    Rcp85,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Historical, Scenario::Rcp45, Scenario::Rcp85];

    /// Value of the `scenario` property in the remote collection.
    pub fn label(&self) -> &'static str {
        match self {
            Scenario::Historical => "historical",
            Scenario::Rcp45 => "rcp45",
            Scenario::Rcp85 => "rcp85",
        }
    }

    /// Default (start, end) window used when the caller gives no dates.
    pub fn default_window(&self) -> (NaiveDate, NaiveDate) {
        match self {
            Scenario::Historical => (ymd(1950, 1, 1), ymd(2006, 1, 1)),
            Scenario::Rcp45 | Scenario::Rcp85 => (ymd(2006, 1, 1), ymd(2100, 12, 31)),
        }
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("literal calendar date")
}

impl FromStr for Scenario {
    type Err = Cmip5Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "historical" => Ok(Scenario::Historical),
            "rcp45" => Ok(Scenario::Rcp45),
            "rcp85" => Ok(Scenario::Rcp85),
            other => Err(Cmip5Error::UnsupportedScenario(other.to_string())),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_windows() {
        assert_eq!(
            Scenario::Historical.default_window(),
            (ymd(1950, 1, 1), ymd(2006, 1, 1))
        );
        for scenario in [Scenario::Rcp45, Scenario::Rcp85] {
            assert_eq!(
                scenario.default_window(),
                (ymd(2006, 1, 1), ymd(2100, 12, 31))
            );
        }
    }

    #[test]
    fn test_parse_labels() {
        for scenario in Scenario::ALL {
            assert_eq!(scenario.label().parse::<Scenario>().unwrap(), scenario);
        }
        assert!("rcp26".parse::<Scenario>().is_err());
    }
}
