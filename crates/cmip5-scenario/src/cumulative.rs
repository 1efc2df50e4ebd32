//! Cumulative images: every daily image of a year stacked as bands.

use tracing::{debug, info, instrument};

use cmip5_common::{Cmip5Error, Cmip5Result, UnitTransform, YearWindow, DATASET_ID};
use ee_client::{ImageExpr, ImageInfo, RemoteService};

use crate::config::ScenarioConfig;
use crate::dispatch::{dispatch_image, image_artifact_name, DispatchOutcome};
use crate::session::Session;

/// The product of one year window.
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeImage {
    pub year: i32,
    pub window: YearWindow,
    /// One band per daily image found in the window.
    pub band_count: usize,
    pub outcome: DispatchOutcome,
}

/// Stack daily images into one image, in the order given.
///
/// The first image seeds the stack and every further image is appended as a
/// new band. Each band is converted with `transform` and renamed to its
/// image's `system:index`.
pub fn fold_daily_images(
    window: &YearWindow,
    images: &[ImageInfo],
    band: &str,
    transform: UnitTransform,
) -> Cmip5Result<ImageExpr> {
    let daily = |info: &ImageInfo| {
        ImageExpr::load(format!("{}/{}", DATASET_ID, info.index), Some(band))
            .apply_units(transform)
            .rename(info.index.as_str())
    };

    let (first, rest) = images.split_first().ok_or(Cmip5Error::EmptyRange {
        start: window.start,
        end: window.end,
    })?;
    Ok(rest
        .iter()
        .fold(daily(first), |stack, info| stack.add_bands(daily(info))))
}

impl ScenarioConfig {
    /// Build and dispatch one cumulative image per year window.
    ///
    /// Windows run from January 1 to the next January 1 for every year of
    /// the date range, even when the range starts mid-year. A window without
    /// daily images fails the whole operation with [`Cmip5Error::EmptyRange`];
    /// windows already dispatched stay dispatched.
    #[instrument(skip(self, session), fields(
        scenario = %self.scenario(),
        variable = %self.variable(),
        model = %self.model(),
    ))]
    pub async fn compute_cumulative_images<S: RemoteService>(
        &self,
        session: &Session<S>,
    ) -> Cmip5Result<Vec<CumulativeImage>> {
        let mode = self.export_mode()?;
        let windows = self.dates().year_windows();
        let mut products = Vec::with_capacity(windows.len());

        for window in windows {
            let collection = self.collection(window.start, window.end);
            let images = session.service().list_images(&collection).await?;
            debug!(year = window.year, count = images.len(), "Listed daily images");

            let stacked =
                fold_daily_images(&window, &images, self.variable().id(), self.transform())?
                    .clip(self.region());

            let date = window.label();
            info!(date = %date, "Downloading data for the date");
            let artifact =
                image_artifact_name(self.model(), self.variable(), self.scenario(), &date);
            let outcome =
                dispatch_image(session, mode, self.folder(), &artifact, &stacked).await?;

            products.push(CumulativeImage {
                year: window.year,
                window,
                band_count: images.len(),
                outcome,
            });
        }
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn window() -> YearWindow {
        YearWindow {
            year: 1950,
            start: NaiveDate::from_ymd_opt(1950, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(1951, 1, 1).unwrap(),
        }
    }

    fn info(index: &str) -> ImageInfo {
        ImageInfo {
            index: index.to_string(),
            time_start: None,
        }
    }

    #[test]
    fn test_fold_keeps_service_order() {
        let images = [info("d3"), info("d1"), info("d2")];
        let transform = UnitTransform::resolve("pr").unwrap();
        let stacked = fold_daily_images(&window(), &images, "pr", transform).unwrap();
        assert_eq!(stacked.band_names(), vec!["d3", "d1", "d2"]);
    }

    #[test]
    fn test_fold_single_image_is_renamed_seed() {
        let transform = UnitTransform::resolve("tasmin").unwrap();
        let stacked = fold_daily_images(&window(), &[info("d1")], "tasmin", transform).unwrap();
        match stacked {
            ImageExpr::Rename { image, name } => {
                assert_eq!(name, "d1");
                assert!(matches!(*image, ImageExpr::AddScalar { value, .. } if value == -273.15));
            }
            other => panic!("expected Rename, got {:?}", other),
        }
    }

    #[test]
    fn test_fold_of_nothing_is_empty_range() {
        let transform = UnitTransform::resolve("pr").unwrap();
        let err = fold_daily_images(&window(), &[], "pr", transform).unwrap_err();
        match err {
            Cmip5Error::EmptyRange { start, end } => {
                assert_eq!(start, window().start);
                assert_eq!(end, window().end);
            }
            other => panic!("expected EmptyRange, got {:?}", other),
        }
    }
}
