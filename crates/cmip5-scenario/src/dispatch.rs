//! Hands finished products to the service as a download link or a Drive export.

use chrono::NaiveDateTime;
use metrics::counter;
use tracing::info;

use cmip5_common::{Cmip5Result, ExportMode, Scenario, Variable};
use ee_client::{
    ImageDownloadParams, ImageExportTask, ImageExpr, RemoteService, TableDownloadParams,
    TableExportTask, TableExpr, TaskHandle,
};

use crate::session::Session;

/// Columns of every exported table, in order.
pub const TABLE_SELECTORS: [&str; 2] = ["year", "mean"];

/// Table file format for links and exports.
pub const TABLE_FORMAT: &str = "CSV";

/// Output resolution of image downloads and exports, in meters.
pub const IMAGE_SCALE: f64 = 25000.0;

/// Projection of image download links.
pub const DOWNLOAD_CRS: &str = "EPSG:4326";

/// What a dispatched product turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A link the caller can fetch right away.
    DownloadUrl(String),
    /// A submitted export; nothing waits for it to finish.
    ExportTask(TaskHandle),
}

impl DispatchOutcome {
    pub fn download_url(&self) -> Option<&str> {
        match self {
            DispatchOutcome::DownloadUrl(url) => Some(url),
            DispatchOutcome::ExportTask(_) => None,
        }
    }

    pub fn task(&self) -> Option<&TaskHandle> {
        match self {
            DispatchOutcome::DownloadUrl(_) => None,
            DispatchOutcome::ExportTask(task) => Some(task),
        }
    }
}

/// Export description of an annual table: `{variable}{scenario}{model}{YYYYmmddHHMMSS}`.
pub fn table_description(
    variable: Variable,
    scenario: Scenario,
    model: &str,
    submitted_at: NaiveDateTime,
) -> String {
    format!(
        "{}{}{}{}",
        variable.id(),
        scenario.label(),
        model,
        submitted_at.format("%Y%m%d%H%M%S")
    )
}

/// File prefix of a cumulative image: `{model}{variable}{scenario}{date}`.
pub fn image_artifact_name(
    model: &str,
    variable: Variable,
    scenario: Scenario,
    date_label: &str,
) -> String {
    format!("{}{}{}{}", model, variable.id(), scenario.label(), date_label)
}

fn selectors() -> Vec<String> {
    TABLE_SELECTORS.iter().map(|s| s.to_string()).collect()
}

/// Submit a `(year, mean)` table.
pub async fn dispatch_table<S: RemoteService>(
    session: &Session<S>,
    mode: ExportMode,
    folder: &str,
    description: &str,
    table: &TableExpr,
) -> Cmip5Result<DispatchOutcome> {
    match mode {
        ExportMode::Url => {
            let params = TableDownloadParams {
                file_format: TABLE_FORMAT.to_string(),
                selectors: selectors(),
            };
            let url = session.service().table_download_url(table, &params).await?;
            counter!("cmip5_download_links_total", "product" => "table").increment(1);
            info!(url = %url, "Table download link ready");
            Ok(DispatchOutcome::DownloadUrl(url))
        }
        ExportMode::Drive => {
            let task = TableExportTask {
                description: description.to_string(),
                folder: folder.to_string(),
                file_format: TABLE_FORMAT.to_string(),
                selectors: selectors(),
            };
            let handle = session.service().export_table(table, &task).await?;
            counter!("cmip5_export_tasks_submitted_total", "product" => "table").increment(1);
            info!(task = %handle.name, folder = %folder, "Table export started");
            Ok(DispatchOutcome::ExportTask(handle))
        }
    }
}

/// Submit one image, named `artifact` in Drive.
pub async fn dispatch_image<S: RemoteService>(
    session: &Session<S>,
    mode: ExportMode,
    folder: &str,
    artifact: &str,
    image: &ImageExpr,
) -> Cmip5Result<DispatchOutcome> {
    match mode {
        ExportMode::Url => {
            let params = ImageDownloadParams {
                scale: IMAGE_SCALE,
                crs: DOWNLOAD_CRS.to_string(),
            };
            let url = session.service().image_download_url(image, &params).await?;
            counter!("cmip5_download_links_total", "product" => "image").increment(1);
            info!(url = %url, "Image download link ready");
            Ok(DispatchOutcome::DownloadUrl(url))
        }
        ExportMode::Drive => {
            let task = ImageExportTask {
                description: artifact.to_string(),
                folder: folder.to_string(),
                file_name_prefix: artifact.to_string(),
                scale: IMAGE_SCALE,
            };
            let handle = session.service().export_image(image, &task).await?;
            counter!("cmip5_export_tasks_submitted_total", "product" => "image").increment(1);
            info!(task = %handle.name, artifact = %artifact, "Image export started");
            Ok(DispatchOutcome::ExportTask(handle))
        }
    }
}
