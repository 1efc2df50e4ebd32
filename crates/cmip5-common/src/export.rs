//! Export destinations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Cmip5Error;

/// Default Drive folder for exports.
pub const DEFAULT_FOLDER: &str = "CMIP5";

/// Default download mode string.
pub const DEFAULT_DOWNLOAD: &str = "drive";

/// Where a finished product goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportMode {
    /// Synchronous direct-download link.
    #[serde(rename = "URL")]
    Url,
    /// Fire-and-forget export job into a Drive folder.
    #[serde(rename = "drive")]
    Drive,
}

impl ExportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportMode::Url => "URL",
            ExportMode::Drive => "drive",
        }
    }
}

impl Default for ExportMode {
    fn default() -> Self {
        ExportMode::Drive
    }
}

impl FromStr for ExportMode {
    type Err = Cmip5Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "URL" => Ok(ExportMode::Url),
            "drive" => Ok(ExportMode::Drive),
            other => Err(Cmip5Error::UnsupportedExportMode(other.to_string())),
        }
    }
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modes() {
        assert_eq!("URL".parse::<ExportMode>().unwrap(), ExportMode::Url);
        assert_eq!("drive".parse::<ExportMode>().unwrap(), ExportMode::Drive);
        assert_eq!(DEFAULT_DOWNLOAD.parse::<ExportMode>().unwrap(), ExportMode::default());
    }

    #[test]
    fn test_unknown_modes_rejected() {
        for mode in ["url", "Drive", "gcs", ""] {
            assert!(matches!(
                mode.parse::<ExportMode>(),
                Err(Cmip5Error::UnsupportedExportMode(m)) if m == mode
            ));
        }
    }
}
