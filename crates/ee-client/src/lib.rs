//! Earth Engine client for the NEX-GDDP export pipeline.
//!
//! Computations are described locally as typed expressions
//! ([`CollectionExpr`], [`ImageExpr`], [`TableExpr`]) and nothing is evaluated
//! until one of the [`RemoteService`] methods submits them. The HTTP
//! implementation in [`http`] encodes the expressions into the service's
//! value-node graph format (see [`encode`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use ee_client::{CollectionExpr, EarthEngineClient, EeConfig, RemoteService};
//!
//! let client = EarthEngineClient::new(EeConfig::from_env()?)?;
//! client.initialize().await?;
//!
//! let daily = CollectionExpr::load("NASA/NEX-GDDP")
//!     .filter_date(start, end)
//!     .select("tasmax")
//!     .filter_eq("scenario", "rcp45");
//! let images = client.list_images(&daily).await?;
//! ```

pub mod config;
pub mod encode;
pub mod expr;
pub mod http;
pub mod service;

pub use config::EeConfig;
pub use encode::Expression;
pub use expr::{CollectionExpr, Filter, ImageExpr, Reducer, RegionReduction, TableExpr};
pub use http::EarthEngineClient;
pub use service::{
    ImageDownloadParams, ImageExportTask, ImageInfo, RemoteService, TableDownloadParams,
    TableExportTask, TaskHandle,
};
