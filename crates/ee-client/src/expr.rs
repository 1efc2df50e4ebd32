//! Typed descriptions of remote computations.
//!
//! Nothing here talks to the network. The builders accumulate a description
//! that a [`crate::RemoteService`] evaluates when it is submitted.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use ee_client::{CollectionExpr, Reducer};
//!
//! let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2003, 1, 1).unwrap();
//!
//! let yearly_total = CollectionExpr::load("NASA/NEX-GDDP")
//!     .filter_date(start, end)
//!     .select("pr")
//!     .filter_eq("scenario", "historical")
//!     .filter_year(2001)
//!     .reduce(Reducer::Sum)
//!     .multiply(86400.0);
//! assert_eq!(yearly_total.band_names(), vec!["pr".to_string()]);
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use cmip5_common::{Region, TemporalReducer, UnitTransform};

/// Aggregation applied across images (temporal) or pixels (spatial).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reducer {
    Sum,
    Mean,
}

impl Reducer {
    /// Name of the matching `Reducer.*` constructor and of the output column
    /// a region reduction produces.
    pub fn name(&self) -> &'static str {
        match self {
            Reducer::Sum => "sum",
            Reducer::Mean => "mean",
        }
    }
}

impl From<TemporalReducer> for Reducer {
    fn from(r: TemporalReducer) -> Self {
        match r {
            TemporalReducer::Sum => Reducer::Sum,
            TemporalReducer::Mean => Reducer::Mean,
        }
    }
}

/// A filter on collection members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// `system:time_start` within `[start, end)`.
    Date { start: NaiveDate, end: NaiveDate },
    /// A metadata property equal to a string value.
    Equals { property: String, value: String },
    /// `system:time_start` falls in the given calendar year.
    CalendarYear(i32),
}

/// An image collection with filters and an optional band selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionExpr {
    pub dataset: String,
    pub band: Option<String>,
    pub filters: Vec<Filter>,
}

impl CollectionExpr {
    pub fn load(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            band: None,
            filters: Vec::new(),
        }
    }

    pub fn filter_date(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.filters.push(Filter::Date { start, end });
        self
    }

    pub fn filter_eq(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Equals {
            property: property.into(),
            value: value.into(),
        });
        self
    }

    pub fn filter_year(mut self, year: i32) -> Self {
        self.filters.push(Filter::CalendarYear(year));
        self
    }

    /// Keep only one band of every member image.
    pub fn select(mut self, band: impl Into<String>) -> Self {
        self.band = Some(band.into());
        self
    }

    /// Collapse the collection into one image, band by band.
    pub fn reduce(self, reducer: Reducer) -> ImageExpr {
        ImageExpr::Reduce {
            collection: self,
            reducer,
        }
    }
}

/// A single (possibly multi-band) image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImageExpr {
    /// An image asset, optionally narrowed to one band.
    Load {
        asset_id: String,
        band: Option<String>,
    },
    Reduce {
        collection: CollectionExpr,
        reducer: Reducer,
    },
    Multiply {
        image: Box<ImageExpr>,
        factor: f64,
    },
    AddScalar {
        image: Box<ImageExpr>,
        value: f64,
    },
    /// Select the first band under a new name.
    Rename {
        image: Box<ImageExpr>,
        name: String,
    },
    /// Append the bands of `band` after those of `base`.
    AddBands {
        base: Box<ImageExpr>,
        band: Box<ImageExpr>,
    },
    Clip {
        image: Box<ImageExpr>,
        region: Region,
    },
    /// Resample at `scale`; keeps the image's own projection when `crs` is `None`.
    Reproject {
        image: Box<ImageExpr>,
        crs: Option<String>,
        scale: f64,
    },
}

impl ImageExpr {
    pub fn load(asset_id: impl Into<String>, band: Option<&str>) -> Self {
        ImageExpr::Load {
            asset_id: asset_id.into(),
            band: band.map(str::to_string),
        }
    }

    pub fn multiply(self, factor: f64) -> Self {
        ImageExpr::Multiply {
            image: Box::new(self),
            factor,
        }
    }

    pub fn add_scalar(self, value: f64) -> Self {
        ImageExpr::AddScalar {
            image: Box::new(self),
            value,
        }
    }

    /// Multiply by the transform's multiplier, then add its offset.
    pub fn apply_units(self, transform: UnitTransform) -> Self {
        self.multiply(transform.multiplier)
            .add_scalar(transform.offset)
    }

    pub fn rename(self, name: impl Into<String>) -> Self {
        ImageExpr::Rename {
            image: Box::new(self),
            name: name.into(),
        }
    }

    pub fn add_bands(self, band: ImageExpr) -> Self {
        ImageExpr::AddBands {
            base: Box::new(self),
            band: Box::new(band),
        }
    }

    pub fn clip(self, region: Region) -> Self {
        ImageExpr::Clip {
            image: Box::new(self),
            region,
        }
    }

    pub fn reproject(self, crs: Option<&str>, scale: f64) -> Self {
        ImageExpr::Reproject {
            image: Box::new(self),
            crs: crs.map(str::to_string),
            scale,
        }
    }

    /// Band names the image will carry once evaluated.
    ///
    /// Unselected loads and reductions of unselected collections report `"*"`.
    pub fn band_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_band_names(&mut names);
        names
    }

    // Iterates down the `base` side so long band stacks do not recurse per band.
    fn collect_band_names(&self, out: &mut Vec<String>) {
        let mut appended = Vec::new();
        let mut current = self;
        loop {
            match current {
                ImageExpr::AddBands { base, band } => {
                    appended.push(band.as_ref());
                    current = base;
                }
                ImageExpr::Load { band, .. } => {
                    out.push(band.clone().unwrap_or_else(|| "*".to_string()));
                    break;
                }
                ImageExpr::Reduce { collection, .. } => {
                    out.push(collection.band.clone().unwrap_or_else(|| "*".to_string()));
                    break;
                }
                ImageExpr::Rename { name, .. } => {
                    out.push(name.clone());
                    break;
                }
                ImageExpr::Multiply { image, .. }
                | ImageExpr::AddScalar { image, .. }
                | ImageExpr::Clip { image, .. }
                | ImageExpr::Reproject { image, .. } => current = image,
            }
        }
        for band in appended.into_iter().rev() {
            band.collect_band_names(out);
        }
    }
}

/// One row of a region-reduction table: `image` reduced over `region`,
/// tagged with `year`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionReduction {
    pub image: ImageExpr,
    pub region: Region,
    pub reducer: Reducer,
    pub scale: f64,
    pub year: i32,
}

/// A feature collection built from region reductions, in row order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableExpr {
    pub rows: Vec<RegionReduction>,
}

impl TableExpr {
    pub fn new(rows: Vec<RegionReduction>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn years(&self) -> Vec<i32> {
        self.rows.iter().map(|r| r.year).collect()
    }
}
