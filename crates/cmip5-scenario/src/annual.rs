//! Annual series: one regional mean per whole year.

use chrono::Local;
use tracing::{info, instrument};

use cmip5_common::{Cmip5Error, Cmip5Result};
use ee_client::{Reducer, RegionReduction, RemoteService, TableExpr};

use crate::config::ScenarioConfig;
use crate::dispatch::{dispatch_table, table_description, DispatchOutcome};
use crate::session::Session;

/// Pixel scale of the regional mean, in meters.
pub const REGION_SCALE: f64 = 500.0;

impl ScenarioConfig {
    /// The `(year, mean)` table for every whole year of the date range.
    ///
    /// Each row reduces that year's daily images (sum for precipitation, mean
    /// for temperature), converts units, and averages the result over the
    /// region. Rows are in ascending year order.
    pub fn annual_series_table(&self) -> TableExpr {
        let dates = self.dates();
        let daily = self.collection(dates.start(), dates.end());
        let temporal = Reducer::from(self.variable().temporal_reducer());

        let rows = dates
            .years()
            .map(|year| RegionReduction {
                image: daily
                    .clone()
                    .filter_year(year)
                    .reduce(temporal)
                    .apply_units(self.transform()),
                region: self.region(),
                reducer: Reducer::Mean,
                scale: REGION_SCALE,
                year,
            })
            .collect();
        TableExpr::new(rows)
    }

    /// Build the annual table and dispatch it.
    ///
    /// The export mode is checked before anything is sent. A range without a
    /// whole year fails with [`Cmip5Error::EmptyRange`].
    #[instrument(skip(self, session), fields(
        scenario = %self.scenario(),
        variable = %self.variable(),
        model = %self.model(),
    ))]
    pub async fn compute_annual_series<S: RemoteService>(
        &self,
        session: &Session<S>,
    ) -> Cmip5Result<DispatchOutcome> {
        let mode = self.export_mode()?;
        let table = self.annual_series_table();
        if table.is_empty() {
            return Err(Cmip5Error::EmptyRange {
                start: self.dates().start(),
                end: self.dates().end(),
            });
        }

        info!(years = table.len(), mode = %mode, "Dispatching annual series");
        let description = table_description(
            self.variable(),
            self.scenario(),
            self.model(),
            Local::now().naive_local(),
        );
        dispatch_table(session, mode, self.folder(), &description, &table).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cmip5_common::{Geometry, Scenario};
    use ee_client::ImageExpr;

    fn config(variable: &str, start: (i32, u32, u32), end: (i32, u32, u32)) -> ScenarioConfig {
        ScenarioConfig::builder(
            Scenario::Historical,
            variable,
            "ACCESS1-0",
            Geometry::Coords([-70.0, -35.0, -60.0, -25.0]),
        )
        .start(NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap())
        .end(NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap())
        .build()
        .unwrap()
    }

    fn temporal_reducer(row: &RegionReduction) -> Reducer {
        let mut image = &row.image;
        loop {
            match image {
                ImageExpr::Reduce { reducer, .. } => return *reducer,
                ImageExpr::Multiply { image: inner, .. }
                | ImageExpr::AddScalar { image: inner, .. } => image = inner,
                other => panic!("unexpected node {:?}", other),
            }
        }
    }

    #[test]
    fn test_one_row_per_whole_year() {
        let table = config("pr", (2000, 1, 1), (2003, 1, 1)).annual_series_table();
        assert_eq!(table.years(), vec![2000, 2001, 2002]);
        assert!(table.rows.iter().all(|r| r.reducer == Reducer::Mean));
        assert!(table.rows.iter().all(|r| r.scale == 500.0));
    }

    #[test]
    fn test_reducer_follows_variable() {
        let pr = config("pr", (2000, 1, 1), (2001, 1, 1)).annual_series_table();
        assert_eq!(temporal_reducer(&pr.rows[0]), Reducer::Sum);
        let tasmin = config("tasmin", (2000, 1, 1), (2001, 1, 1)).annual_series_table();
        assert_eq!(temporal_reducer(&tasmin.rows[0]), Reducer::Mean);
    }

    #[test]
    fn test_units_multiply_then_add() {
        let table = config("tasmax", (2000, 1, 1), (2001, 1, 1)).annual_series_table();
        match &table.rows[0].image {
            ImageExpr::AddScalar { image, value } => {
                assert_eq!(*value, -273.15);
                assert!(matches!(**image, ImageExpr::Multiply { factor, .. } if factor == 1.0));
            }
            other => panic!("expected AddScalar on top, got {:?}", other),
        }
    }

    #[test]
    fn test_range_within_one_year_has_no_rows() {
        let table = config("pr", (2000, 3, 1), (2000, 9, 1)).annual_series_table();
        assert!(table.is_empty());
    }
}
