//! Common test fixtures for export pipeline tests.

/// Bounding boxes as (xMin, yMin, xMax, yMax).
pub mod region {
    /// Central Chile and western Argentina
    pub const CENTRAL_ANDES: [f64; 4] = [-70.0, -35.0, -60.0, -25.0];

    /// Inverted (min > max); passed through for the service to reject
    pub const INVERTED: [f64; 4] = [10.0, 10.0, 5.0, 5.0];
}

/// Model identifiers present in NEX-GDDP.
pub mod model {
    pub const ACCESS1_0: &str = "ACCESS1-0";
    pub const CCSM4: &str = "CCSM4";
    pub const MIROC5: &str = "MIROC5";
}

/// Date helpers.
pub mod dates {
    use chrono::NaiveDate;

    /// Build a date from literal parts.
    pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    /// First day of `year`.
    pub fn jan1(year: i32) -> NaiveDate {
        ymd(year, 1, 1)
    }
}
