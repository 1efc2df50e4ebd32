//! Scenario configuration: what to export, where, and how.

use chrono::NaiveDate;

use cmip5_common::export::{DEFAULT_DOWNLOAD, DEFAULT_FOLDER};
use cmip5_common::{
    Cmip5Result, DateRange, ExportMode, Geometry, Region, Scenario, UnitTransform, Variable,
    DATASET_ID,
};
use ee_client::CollectionExpr;

/// One variable and model of one scenario, over a region and date range.
///
/// Read-only once built. The export mode is kept as given and only checked
/// when an operation starts, so a config with an unknown mode can be built
/// but every operation on it fails before anything is submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    scenario: Scenario,
    variable: Variable,
    model: String,
    region: Region,
    dates: DateRange,
    download: String,
    folder: String,
    transform: UnitTransform,
}

impl ScenarioConfig {
    pub fn builder(
        scenario: Scenario,
        variable: impl Into<String>,
        model: impl Into<String>,
        geometry: Geometry,
    ) -> ScenarioConfigBuilder {
        let (start, end) = scenario.default_window();
        ScenarioConfigBuilder {
            scenario,
            variable: variable.into(),
            model: model.into(),
            geometry,
            download: DEFAULT_DOWNLOAD.to_string(),
            folder: DEFAULT_FOLDER.to_string(),
            start,
            end,
        }
    }

    /// Historical run with default window, Drive export and folder.
    pub fn historical(variable: &str, model: &str, geometry: Geometry) -> Cmip5Result<Self> {
        Self::builder(Scenario::Historical, variable, model, geometry).build()
    }

    /// RCP 4.5 run with default window, Drive export and folder.
    pub fn rcp45(variable: &str, model: &str, geometry: Geometry) -> Cmip5Result<Self> {
        Self::builder(Scenario::Rcp45, variable, model, geometry).build()
    }

    /// RCP 8.5 run with default window, Drive export and folder.
    pub fn rcp85(variable: &str, model: &str, geometry: Geometry) -> Cmip5Result<Self> {
        Self::builder(Scenario::Rcp85, variable, model, geometry).build()
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    pub fn variable(&self) -> Variable {
        self.variable
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn dates(&self) -> DateRange {
        self.dates
    }

    /// Export mode exactly as configured.
    pub fn download(&self) -> &str {
        &self.download
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn transform(&self) -> UnitTransform {
        self.transform
    }

    /// Parse the configured export mode.
    pub fn export_mode(&self) -> Cmip5Result<ExportMode> {
        self.download.parse()
    }

    /// Daily images of this variable, scenario and model in `[start, end)`.
    pub fn collection(&self, start: NaiveDate, end: NaiveDate) -> CollectionExpr {
        CollectionExpr::load(DATASET_ID)
            .filter_date(start, end)
            .select(self.variable.id())
            .filter_eq("scenario", self.scenario.label())
            .filter_eq("model", self.model.as_str())
    }
}

/// Builder for [`ScenarioConfig`], seeded with the scenario's defaults.
#[derive(Debug, Clone)]
pub struct ScenarioConfigBuilder {
    scenario: Scenario,
    variable: String,
    model: String,
    geometry: Geometry,
    download: String,
    folder: String,
    start: NaiveDate,
    end: NaiveDate,
}

impl ScenarioConfigBuilder {
    /// `"URL"` or `"drive"`; checked when an operation runs.
    pub fn download(mut self, download: impl Into<String>) -> Self {
        self.download = download.into();
        self
    }

    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    pub fn start(mut self, start: NaiveDate) -> Self {
        self.start = start;
        self
    }

    pub fn end(mut self, end: NaiveDate) -> Self {
        self.end = end;
        self
    }

    /// Resolve the variable and its unit transform and check the date range.
    pub fn build(self) -> Cmip5Result<ScenarioConfig> {
        let variable: Variable = self.variable.parse()?;
        let dates = DateRange::new(self.start, self.end)?;
        Ok(ScenarioConfig {
            scenario: self.scenario,
            variable,
            model: self.model,
            region: Region::build(&self.geometry),
            dates,
            download: self.download,
            folder: self.folder,
            transform: UnitTransform::for_variable(variable),
        })
    }
}
