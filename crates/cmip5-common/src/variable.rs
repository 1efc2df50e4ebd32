//! Climate variables available in the NEX-GDDP collection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Cmip5Error;

/// A daily NEX-GDDP variable (one band of each daily image).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variable {
    /// Precipitation flux, kg m-2 s-1.
    #[serde(rename = "pr")]
    Precipitation,
    /// Daily minimum near-surface air temperature, K.
    #[serde(rename = "tasmin")]
    MinTemperature,
    /// Daily maximum near-surface air temperature, K.
    #[serde(rename = "tasmax")]
    MaxTemperature,
}

/// How daily rasters are combined into one raster per year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemporalReducer {
    Sum,
    Mean,
}

impl Variable {
    pub const ALL: [Variable; 3] = [
        Variable::Precipitation,
        Variable::MinTemperature,
        Variable::MaxTemperature,
    ];

    /// Band name in the remote collection.
    pub fn id(&self) -> &'static str {
        match self {
            Variable::Precipitation => "pr",
            Variable::MinTemperature => "tasmin",
            Variable::MaxTemperature => "tasmax",
        }
    }

    /// Precipitation accumulates over a year; temperatures are averaged.
    pub fn temporal_reducer(&self) -> TemporalReducer {
        match self {
            Variable::Precipitation => TemporalReducer::Sum,
            Variable::MinTemperature | Variable::MaxTemperature => TemporalReducer::Mean,
        }
    }
}

impl FromStr for Variable {
    type Err = Cmip5Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pr" => Ok(Variable::Precipitation),
            "tasmin" => Ok(Variable::MinTemperature),
            "tasmax" => Ok(Variable::MaxTemperature),
            other => Err(Cmip5Error::UnsupportedVariable(other.to_string())),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
