//! Earth Engine client configuration.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use cmip5_common::{Cmip5Error, Cmip5Result};

/// Public REST endpoint.
pub const DEFAULT_API_URL: &str = "https://earthengine.googleapis.com";

/// Connection settings for the Earth Engine REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EeConfig {
    /// Base URL, without the `/v1` suffix
    pub api_url: String,

    /// Cloud project that owns the requests and export tasks
    pub project: String,

    /// OAuth2 bearer token; obtaining it is left to the caller
    pub access_token: Option<String>,

    /// HTTP request timeout
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
}

impl EeConfig {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            project: project.into(),
            access_token: None,
            request_timeout: Duration::from_secs(300),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// `EE_PROJECT` is required; `EE_API_URL`, `EE_ACCESS_TOKEN` and
    /// `EE_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Cmip5Result<Self> {
        let project = env::var("EE_PROJECT")
            .map_err(|_| Cmip5Error::Config("EE_PROJECT is not set".to_string()))?;

        let request_timeout = match env::var("EE_TIMEOUT_SECS") {
            Ok(v) => Duration::from_secs(v.parse().map_err(|_| {
                Cmip5Error::Config(format!("EE_TIMEOUT_SECS is not a number: {v}"))
            })?),
            Err(_) => Duration::from_secs(300),
        };

        Ok(Self {
            api_url: env::var("EE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            project,
            access_token: env::var("EE_ACCESS_TOKEN").ok().filter(|t| !t.is_empty()),
            request_timeout,
        })
    }

    /// URL of a project-scoped REST method, e.g. `table:export`.
    pub fn project_url(&self, method: &str) -> String {
        format!(
            "{}/v1/projects/{}/{}",
            self.api_url.trim_end_matches('/'),
            self.project,
            method
        )
    }

    /// URL of a resource returned by the API, e.g. `projects/p/tables/abc:getFeatures`.
    pub fn resource_url(&self, resource: &str) -> String {
        format!("{}/v1/{}", self.api_url.trim_end_matches('/'), resource)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
