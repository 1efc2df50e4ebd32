//! HTTP implementation of [`RemoteService`] over the Earth Engine REST API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use cmip5_common::{Cmip5Error, Cmip5Result};

use crate::config::EeConfig;
use crate::encode::{encode_collection, encode_image, encode_table};
use crate::expr::{CollectionExpr, ImageExpr, TableExpr};
use crate::service::{
    ImageDownloadParams, ImageExportTask, ImageInfo, RemoteService, TableDownloadParams,
    TableExportTask, TaskHandle,
};

/// Page size requested when listing collection members.
const LIST_PAGE_SIZE: u32 = 1000;

/// Earth Engine REST client.
pub struct EarthEngineClient {
    client: Client,
    config: EeConfig,
}

impl EarthEngineClient {
    /// Create a new client with the given configuration.
    pub fn new(config: EeConfig) -> Cmip5Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| Cmip5Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &EeConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// POST a JSON body to a project-scoped method and decode the response.
    async fn post<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Cmip5Result<T> {
        let url = self.config.project_url(method);
        debug!(url = %url, "POST");

        let response = self
            .authorize(self.client.post(&url))
            .json(body)
            .send()
            .await
            .map_err(|e| Cmip5Error::Connection(e.to_string()))?;

        check_status(response)
            .await?
            .json::<T>()
            .await
            .map_err(|e| Cmip5Error::Decode(format!("{}: {}", method, e)))
    }
}

/// Turn a non-2xx response into `Cmip5Error::Remote`.
async fn check_status(response: Response) -> Cmip5Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Cmip5Error::Remote {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Extract `error.message` from a Google API error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[derive(Debug, Deserialize)]
struct ResourceName {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComputeImagesResponse {
    #[serde(default)]
    images: Vec<RemoteImage>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteImage {
    id: Option<String>,
    name: Option<String>,
    start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    properties: Map<String, Value>,
}

impl RemoteImage {
    fn into_info(self) -> Cmip5Result<ImageInfo> {
        let index = self
            .properties
            .get("system:index")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| last_segment(self.id.as_deref()))
            .or_else(|| last_segment(self.name.as_deref()))
            .ok_or_else(|| Cmip5Error::Decode("image without id or system:index".to_string()))?;

        Ok(ImageInfo {
            index,
            time_start: self.start_time,
        })
    }
}

fn last_segment(path: Option<&str>) -> Option<String> {
    path?.rsplit('/').next().filter(|s| !s.is_empty()).map(str::to_string)
}

fn table_download_body(table: &TableExpr, params: &TableDownloadParams) -> Value {
    json!({
        "expression": encode_table(table),
        "fileFormat": params.file_format,
        "selectors": params.selectors,
    })
}

fn image_download_body(image: &ImageExpr, params: &ImageDownloadParams) -> Value {
    let image = image.clone().reproject(Some(&params.crs), params.scale);
    json!({
        "expression": encode_image(&image),
        "fileFormat": "ZIPPED_GEO_TIFF",
    })
}

fn table_export_body(table: &TableExpr, task: &TableExportTask, request_id: Uuid) -> Value {
    json!({
        "expression": encode_table(table),
        "description": task.description,
        "requestId": request_id.to_string(),
        "selectors": task.selectors,
        "fileExportOptions": {
            "fileFormat": task.file_format,
            "driveDestination": {
                "folder": task.folder,
                "filenamePrefix": task.description,
            },
        },
    })
}

fn image_export_body(image: &ImageExpr, task: &ImageExportTask, request_id: Uuid) -> Value {
    let image = image.clone().reproject(None, task.scale);
    json!({
        "expression": encode_image(&image),
        "description": task.description,
        "requestId": request_id.to_string(),
        "fileExportOptions": {
            "fileFormat": "GEO_TIFF",
            "driveDestination": {
                "folder": task.folder,
                "filenamePrefix": task.file_name_prefix,
            },
        },
    })
}

#[async_trait]
impl RemoteService for EarthEngineClient {
    #[instrument(skip(self), fields(project = %self.config.project))]
    async fn initialize(&self) -> Cmip5Result<()> {
        let url = self.config.project_url("algorithms");
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| Cmip5Error::Connection(e.to_string()))?;

        check_status(response)
            .await
            .map_err(|e| Cmip5Error::Connection(e.to_string()))?;
        Ok(())
    }

    #[instrument(skip(self, collection), fields(dataset = %collection.dataset))]
    async fn list_images(&self, collection: &CollectionExpr) -> Cmip5Result<Vec<ImageInfo>> {
        let expression = encode_collection(collection);
        let mut images = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut body = json!({
                "expression": expression,
                "pageSize": LIST_PAGE_SIZE,
            });
            if let Some(token) = &page_token {
                body["pageToken"] = json!(token);
            }

            let page: ComputeImagesResponse =
                self.post("imageCollection:computeImages", &body).await?;
            for image in page.images {
                images.push(image.into_info()?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = images.len(), "Listed collection members");
        Ok(images)
    }

    #[instrument(skip(self, table, params), fields(rows = table.len()))]
    async fn table_download_url(
        &self,
        table: &TableExpr,
        params: &TableDownloadParams,
    ) -> Cmip5Result<String> {
        let created: ResourceName = self
            .post("tables", &table_download_body(table, params))
            .await?;
        Ok(self
            .config
            .resource_url(&format!("{}:getFeatures", created.name)))
    }

    #[instrument(skip(self, image, params))]
    async fn image_download_url(
        &self,
        image: &ImageExpr,
        params: &ImageDownloadParams,
    ) -> Cmip5Result<String> {
        let created: ResourceName = self
            .post("thumbnails", &image_download_body(image, params))
            .await?;
        Ok(self
            .config
            .resource_url(&format!("{}:getPixels", created.name)))
    }

    #[instrument(skip(self, table, task), fields(description = %task.description))]
    async fn export_table(
        &self,
        table: &TableExpr,
        task: &TableExportTask,
    ) -> Cmip5Result<TaskHandle> {
        let operation: ResourceName = self
            .post("table:export", &table_export_body(table, task, Uuid::new_v4()))
            .await?;
        info!(operation = %operation.name, "Table export submitted");
        Ok(TaskHandle {
            name: operation.name,
            description: task.description.clone(),
        })
    }

    #[instrument(skip(self, image, task), fields(description = %task.description))]
    async fn export_image(
        &self,
        image: &ImageExpr,
        task: &ImageExportTask,
    ) -> Cmip5Result<TaskHandle> {
        let operation: ResourceName = self
            .post("image:export", &image_export_body(image, task, Uuid::new_v4()))
            .await?;
        info!(operation = %operation.name, "Image export submitted");
        Ok(TaskHandle {
            name: operation.name,
            description: task.description.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Reducer, RegionReduction};
    use cmip5_common::Region;

    fn one_row_table() -> TableExpr {
        TableExpr::new(vec![RegionReduction {
            image: CollectionExpr::load("NASA/NEX-GDDP")
                .select("pr")
                .filter_year(2000)
                .reduce(Reducer::Sum),
            region: Region::new(-70.0, -35.0, -60.0, -25.0),
            reducer: Reducer::Mean,
            scale: 500.0,
            year: 2000,
        }])
    }

    #[test]
    fn test_error_message_from_google_error_body() {
        let body = r#"{"error": {"code": 400, "message": "Geometry is invalid.", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "Geometry is invalid.");
        assert_eq!(error_message("  upstream timeout \n"), "upstream timeout");
    }

    #[test]
    fn test_compute_images_page_parsing() {
        let json = r#"{
            "images": [
                {
                    "id": "NASA/NEX-GDDP/historical_ACCESS1-0_19500101",
                    "startTime": "1950-01-01T00:00:00Z",
                    "properties": {"scenario": "historical"}
                },
                {
                    "name": "projects/earthengine-public/assets/NASA/NEX-GDDP/historical_ACCESS1-0_19500102",
                    "properties": {"system:index": "historical_ACCESS1-0_19500102"}
                }
            ],
            "nextPageToken": "abc"
        }"#;
        let page: ComputeImagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));

        let infos: Vec<ImageInfo> = page
            .images
            .into_iter()
            .map(|i| i.into_info().unwrap())
            .collect();
        assert_eq!(infos[0].index, "historical_ACCESS1-0_19500101");
        assert!(infos[0].time_start.is_some());
        assert_eq!(infos[1].index, "historical_ACCESS1-0_19500102");
        assert!(infos[1].time_start.is_none());
    }

    #[test]
    fn test_empty_page_parses() {
        let page: ComputeImagesResponse = serde_json::from_str("{}").unwrap();
        assert!(page.images.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_image_without_identity_is_a_decode_error() {
        let image: RemoteImage =
            serde_json::from_str(r#"{"startTime": "1950-01-01T00:00:00Z"}"#).unwrap();
        assert!(matches!(image.into_info(), Err(Cmip5Error::Decode(_))));
    }

    #[test]
    fn test_table_download_body() {
        let params = TableDownloadParams {
            file_format: "CSV".into(),
            selectors: vec!["year".into(), "mean".into()],
        };
        let body = table_download_body(&one_row_table(), &params);
        assert_eq!(body["fileFormat"], "CSV");
        assert_eq!(body["selectors"], json!(["year", "mean"]));
        assert!(body["expression"]["values"].is_object());
    }

    #[test]
    fn test_table_export_body_targets_drive_folder() {
        let task = TableExportTask {
            description: "tasmaxhistoricalACCESS1-020240101120000".into(),
            folder: "CMIP5".into(),
            file_format: "CSV".into(),
            selectors: vec!["year".into(), "mean".into()],
        };
        let id = Uuid::nil();
        let body = table_export_body(&one_row_table(), &task, id);
        assert_eq!(body["description"], task.description);
        assert_eq!(body["requestId"], id.to_string());
        assert_eq!(body["fileExportOptions"]["driveDestination"]["folder"], "CMIP5");
        assert_eq!(body["fileExportOptions"]["fileFormat"], "CSV");
    }

    #[test]
    fn test_image_download_body_reprojects_to_requested_crs() {
        let params = ImageDownloadParams {
            scale: 25000.0,
            crs: "EPSG:4326".into(),
        };
        let image = ImageExpr::load("NASA/NEX-GDDP/a", Some("pr")).rename("a");
        let body = image_download_body(&image, &params);
        let expression: crate::Expression =
            serde_json::from_value(body["expression"].clone()).unwrap();
        assert_eq!(expression.function_name(&expression.result), Some("Image.reproject"));
        assert_eq!(expression.count_invocations("Projection"), 1);
        assert_eq!(expression.count_invocations("Image.projection"), 0);
    }

    #[test]
    fn test_image_export_body_keeps_native_projection() {
        let task = ImageExportTask {
            description: "ACCESS1-0prrcp452006-01-01".into(),
            folder: "CMIP5".into(),
            file_name_prefix: "ACCESS1-0prrcp452006-01-01".into(),
            scale: 25000.0,
        };
        let image = ImageExpr::load("NASA/NEX-GDDP/a", Some("pr")).rename("a");
        let body = image_export_body(&image, &task, Uuid::nil());
        let expression: crate::Expression =
            serde_json::from_value(body["expression"].clone()).unwrap();
        assert_eq!(expression.count_invocations("Image.projection"), 1);
        assert_eq!(
            body["fileExportOptions"]["driveDestination"]["filenamePrefix"],
            "ACCESS1-0prrcp452006-01-01"
        );
    }

    #[test]
    fn test_client_builds_from_config() {
        let client = EarthEngineClient::new(EeConfig::new("p")).unwrap();
        assert_eq!(client.config().project, "p");
    }
}
