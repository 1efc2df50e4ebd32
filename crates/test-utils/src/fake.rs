//! In-memory stand-in for the remote compute service.
//!
//! The fake holds a catalog of daily images whose bands are spatially
//! constant, answers collection listings by applying the expression filters,
//! and records every call so tests can assert on what would have been sent.
//! It can also evaluate submitted expressions, which lets tests check the
//! numbers an export would contain.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};

use cmip5_common::{Cmip5Error, Cmip5Result, DATASET_ID};
use ee_client::{
    CollectionExpr, Filter, ImageDownloadParams, ImageExportTask, ImageExpr, ImageInfo, Reducer,
    RemoteService, TableDownloadParams, TableExportTask, TableExpr, TaskHandle,
};

use crate::generators::days;

/// One daily image of the synthetic catalog.
#[derive(Debug, Clone)]
pub struct FakeImage {
    /// `system:index`, e.g. `historical_ACCESS1-0_19500101`
    pub index: String,
    pub scenario: String,
    pub model: String,
    pub date: NaiveDate,
    /// Band name to spatially constant value
    pub values: HashMap<String, f64>,
}

/// A call received by the fake, in arrival order.
#[derive(Debug, Clone)]
pub enum RecordedCall {
    Initialize,
    ListImages(CollectionExpr),
    TableDownload {
        table: TableExpr,
        params: TableDownloadParams,
    },
    ImageDownload {
        image: ImageExpr,
        params: ImageDownloadParams,
    },
    TableExport {
        table: TableExpr,
        task: TableExportTask,
    },
    ImageExport {
        image: ImageExpr,
        task: ImageExportTask,
    },
}

impl RecordedCall {
    pub fn is_export(&self) -> bool {
        matches!(
            self,
            RecordedCall::TableExport { .. } | RecordedCall::ImageExport { .. }
        )
    }

    pub fn is_download(&self) -> bool {
        matches!(
            self,
            RecordedCall::TableDownload { .. } | RecordedCall::ImageDownload { .. }
        )
    }
}

/// In-memory [`RemoteService`].
#[derive(Debug)]
pub struct FakeRemoteService {
    dataset: String,
    catalog: Vec<FakeImage>,
    connect_error: Option<String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl Default for FakeRemoteService {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRemoteService {
    /// An empty catalog for the NEX-GDDP dataset.
    pub fn new() -> Self {
        Self {
            dataset: DATASET_ID.to_string(),
            catalog: Vec::new(),
            connect_error: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A service whose `initialize` always fails with `message`.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            connect_error: Some(message.into()),
            ..Self::new()
        }
    }

    /// Add one image per day in `[start, end)` carrying a single band.
    pub fn with_daily_series(
        mut self,
        scenario: &str,
        model: &str,
        band: &str,
        start: NaiveDate,
        end: NaiveDate,
        value: impl Fn(NaiveDate) -> f64,
    ) -> Self {
        for date in days(start, end) {
            self.catalog.push(FakeImage {
                index: format!("{}_{}_{}", scenario, model, date.format("%Y%m%d")),
                scenario: scenario.to_string(),
                model: model.to_string(),
                date,
                values: HashMap::from([(band.to_string(), value(date))]),
            });
        }
        self
    }

    pub fn with_image(mut self, image: FakeImage) -> Self {
        self.catalog.push(image);
        self
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn export_count(&self) -> usize {
        self.calls().iter().filter(|c| c.is_export()).count()
    }

    pub fn download_count(&self) -> usize {
        self.calls().iter().filter(|c| c.is_download()).count()
    }

    fn record(&self, call: RecordedCall) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        calls.len()
    }

    /// Catalog members selected by a collection expression, in catalog order.
    pub fn matching(&self, collection: &CollectionExpr) -> Vec<&FakeImage> {
        if collection.dataset != self.dataset {
            return Vec::new();
        }
        self.catalog
            .iter()
            .filter(|image| {
                collection
                    .filters
                    .iter()
                    .all(|filter| Self::accepts(filter, image))
            })
            .filter(|image| match &collection.band {
                Some(band) => image.values.contains_key(band),
                None => true,
            })
            .collect()
    }

    fn accepts(filter: &Filter, image: &FakeImage) -> bool {
        match filter {
            Filter::Date { start, end } => image.date >= *start && image.date < *end,
            Filter::Equals { property, value } => match property.as_str() {
                "scenario" => image.scenario == *value,
                "model" => image.model == *value,
                _ => false,
            },
            Filter::CalendarYear(year) => image.date.year() == *year,
        }
    }

    /// Value of a single-band expression; `None` where the service would
    /// produce a fully masked image (an empty reduction, a missing asset).
    pub fn evaluate_scalar(&self, image: &ImageExpr) -> Option<f64> {
        match image {
            ImageExpr::Load { asset_id, band } => {
                let index = asset_id.strip_prefix(&format!("{}/", self.dataset))?;
                let found = self.catalog.iter().find(|i| i.index == index)?;
                found.values.get(band.as_deref()?).copied()
            }
            ImageExpr::Reduce {
                collection,
                reducer,
            } => {
                let band = collection.band.as_deref()?;
                let values: Vec<f64> = self
                    .matching(collection)
                    .iter()
                    .filter_map(|i| i.values.get(band).copied())
                    .collect();
                if values.is_empty() {
                    return None;
                }
                let sum: f64 = values.iter().sum();
                Some(match reducer {
                    Reducer::Sum => sum,
                    Reducer::Mean => sum / values.len() as f64,
                })
            }
            ImageExpr::Multiply { image, factor } => Some(self.evaluate_scalar(image)? * factor),
            ImageExpr::AddScalar { image, value } => Some(self.evaluate_scalar(image)? + value),
            ImageExpr::Rename { image, .. }
            | ImageExpr::Clip { image, .. }
            | ImageExpr::Reproject { image, .. } => self.evaluate_scalar(image),
            ImageExpr::AddBands { base, .. } => self.evaluate_scalar(base),
        }
    }

    /// Name and value of every band of a (possibly stacked) image.
    pub fn evaluate_bands(&self, image: &ImageExpr) -> Vec<(String, Option<f64>)> {
        let mut out = Vec::new();
        self.collect_bands(image, &mut out);
        out
    }

    fn collect_bands(&self, image: &ImageExpr, out: &mut Vec<(String, Option<f64>)>) {
        match image {
            ImageExpr::AddBands { base, band } => {
                self.collect_bands(base, out);
                self.collect_bands(band, out);
            }
            ImageExpr::Rename { image: inner, name } => {
                out.push((name.clone(), self.evaluate_scalar(inner)));
            }
            ImageExpr::Clip { image: inner, .. } | ImageExpr::Reproject { image: inner, .. } => {
                self.collect_bands(inner, out)
            }
            other => {
                let name = other.band_names().into_iter().next().unwrap_or_default();
                out.push((name, self.evaluate_scalar(other)));
            }
        }
    }

    /// The `(year, mean)` rows a table export would contain.
    pub fn evaluate_table(&self, table: &TableExpr) -> Vec<(i32, Option<f64>)> {
        table
            .rows
            .iter()
            .map(|row| (row.year, self.evaluate_scalar(&row.image)))
            .collect()
    }
}

#[async_trait]
impl RemoteService for FakeRemoteService {
    async fn initialize(&self) -> Cmip5Result<()> {
        self.record(RecordedCall::Initialize);
        match &self.connect_error {
            Some(message) => Err(Cmip5Error::Connection(message.clone())),
            None => Ok(()),
        }
    }

    async fn list_images(&self, collection: &CollectionExpr) -> Cmip5Result<Vec<ImageInfo>> {
        self.record(RecordedCall::ListImages(collection.clone()));
        Ok(self
            .matching(collection)
            .into_iter()
            .map(|image| ImageInfo {
                index: image.index.clone(),
                time_start: image
                    .date
                    .and_hms_opt(0, 0, 0)
                    .map(|dt| dt.and_utc()),
            })
            .collect())
    }

    async fn table_download_url(
        &self,
        table: &TableExpr,
        params: &TableDownloadParams,
    ) -> Cmip5Result<String> {
        let n = self.record(RecordedCall::TableDownload {
            table: table.clone(),
            params: params.clone(),
        });
        Ok(format!(
            "https://fake-earthengine.test/v1/projects/fake/tables/t{}:getFeatures",
            n
        ))
    }

    async fn image_download_url(
        &self,
        image: &ImageExpr,
        params: &ImageDownloadParams,
    ) -> Cmip5Result<String> {
        let n = self.record(RecordedCall::ImageDownload {
            image: image.clone(),
            params: params.clone(),
        });
        Ok(format!(
            "https://fake-earthengine.test/v1/projects/fake/thumbnails/i{}:getPixels",
            n
        ))
    }

    async fn export_table(
        &self,
        table: &TableExpr,
        task: &TableExportTask,
    ) -> Cmip5Result<TaskHandle> {
        let n = self.record(RecordedCall::TableExport {
            table: table.clone(),
            task: task.clone(),
        });
        Ok(TaskHandle {
            name: format!("projects/fake/operations/OP{}", n),
            description: task.description.clone(),
        })
    }

    async fn export_image(
        &self,
        image: &ImageExpr,
        task: &ImageExportTask,
    ) -> Cmip5Result<TaskHandle> {
        let n = self.record(RecordedCall::ImageExport {
            image: image.clone(),
            task: task.clone(),
        });
        Ok(TaskHandle {
            name: format!("projects/fake/operations/OP{}", n),
            description: task.description.clone(),
        })
    }
}
