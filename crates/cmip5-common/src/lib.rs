//! Common types and utilities shared across the NEX-GDDP export crates.

pub mod error;
pub mod export;
pub mod region;
pub mod scenario;
pub mod time;
pub mod units;
pub mod variable;

pub use error::{Cmip5Error, Cmip5Result};
pub use export::ExportMode;
pub use region::{Geometry, Region};
pub use scenario::Scenario;
pub use time::{DateRange, YearWindow};
pub use units::UnitTransform;
pub use variable::{TemporalReducer, Variable};

/// Remote dataset holding the NEX-GDDP daily downscaled projections.
pub const DATASET_ID: &str = "NASA/NEX-GDDP";
