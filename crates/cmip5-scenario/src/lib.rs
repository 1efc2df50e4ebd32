//! Scenario-level exports of the NEX-GDDP daily projections.
//!
//! A [`ScenarioConfig`] names one variable, model, region and date range of
//! one [`Scenario`](cmip5_common::Scenario). Given a connected [`Session`] it
//! produces either
//!
//! - an annual series: one regional mean per whole year, as a CSV table
//!   ([`ScenarioConfig::compute_annual_series`]), or
//! - cumulative images: one multi-band image per year, one band per day
//!   ([`ScenarioConfig::compute_cumulative_images`]).
//!
//! Every product goes through the dispatcher, which either asks the service
//! for a download link or submits a Drive export task.

pub mod annual;
pub mod config;
pub mod cumulative;
pub mod dispatch;
pub mod session;

pub use config::{ScenarioConfig, ScenarioConfigBuilder};
pub use cumulative::CumulativeImage;
pub use dispatch::DispatchOutcome;
pub use session::Session;
