//! The remote compute service seam.
//!
//! Everything that crosses the network goes through [`RemoteService`], so the
//! export pipeline can run against [`crate::EarthEngineClient`] in production
//! and against an in-memory fake in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cmip5_common::Cmip5Result;

use crate::expr::{CollectionExpr, ImageExpr, TableExpr};

/// Identity of one member of a collection, in service order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// `system:index`, unique within the collection
    pub index: String,
    /// `system:time_start`
    pub time_start: Option<DateTime<Utc>>,
}

/// Parameters of a synchronous table download link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDownloadParams {
    /// File format, e.g. `CSV`
    pub file_format: String,
    /// Columns to keep, in order
    pub selectors: Vec<String>,
}

/// Parameters of a synchronous image download link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDownloadParams {
    pub scale: f64,
    pub crs: String,
}

/// A table export into a Drive folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableExportTask {
    pub description: String,
    pub folder: String,
    pub file_format: String,
    pub selectors: Vec<String>,
}

/// An image export into a Drive folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageExportTask {
    pub description: String,
    pub folder: String,
    pub file_name_prefix: String,
    pub scale: f64,
}

/// Handle of a submitted export job. The job is never polled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHandle {
    /// Operation resource name, e.g. `projects/p/operations/ABC`
    pub name: String,
    pub description: String,
}

/// Operations the export pipeline needs from the remote compute service.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Verify that the service is reachable and the credentials are accepted.
    async fn initialize(&self) -> Cmip5Result<()>;

    /// List the members of a collection, in the order the service returns them.
    async fn list_images(&self, collection: &CollectionExpr) -> Cmip5Result<Vec<ImageInfo>>;

    /// Create a direct download link for a table.
    async fn table_download_url(
        &self,
        table: &TableExpr,
        params: &TableDownloadParams,
    ) -> Cmip5Result<String>;

    /// Create a direct download link for an image.
    async fn image_download_url(
        &self,
        image: &ImageExpr,
        params: &ImageDownloadParams,
    ) -> Cmip5Result<String>;

    /// Start an asynchronous table export and return without waiting.
    async fn export_table(
        &self,
        table: &TableExpr,
        task: &TableExportTask,
    ) -> Cmip5Result<TaskHandle>;

    /// Start an asynchronous image export and return without waiting.
    async fn export_image(
        &self,
        image: &ImageExpr,
        task: &ImageExportTask,
    ) -> Cmip5Result<TaskHandle>;
}
