//! Conversion from the collection's native units to human-usable units.

use serde::{Deserialize, Serialize};

use crate::error::Cmip5Result;
use crate::variable::Variable;

/// Seconds per day; turns a kg m-2 s-1 flux into mm/day.
pub const SECONDS_PER_DAY: f64 = 86400.0;

/// Offset from Kelvin to degrees Celsius.
pub const KELVIN_TO_CELSIUS: f64 = -273.15;

/// Linear transform applied as `value * multiplier + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitTransform {
    pub multiplier: f64,
    pub offset: f64,
}

impl UnitTransform {
    /// Resolve the transform for a variable identifier.
    ///
    /// Fails with `UnsupportedVariable` for anything other than `pr`, `tasmin`
    /// or `tasmax`.
    pub fn resolve(variable: &str) -> Cmip5Result<Self> {
        Ok(Self::for_variable(variable.parse()?))
    }

    pub fn for_variable(variable: Variable) -> Self {
        match variable {
            Variable::Precipitation => Self {
                multiplier: SECONDS_PER_DAY,
                offset: 0.0,
            },
            Variable::MinTemperature | Variable::MaxTemperature => Self {
                multiplier: 1.0,
                offset: KELVIN_TO_CELSIUS,
            },
        }
    }

    /// Apply the transform to a single value: multiply first, then add.
    pub fn apply(&self, value: f64) -> f64 {
        value * self.multiplier + self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Cmip5Error;

    #[test]
    fn test_resolve_precipitation() {
        let t = UnitTransform::resolve("pr").unwrap();
        assert_eq!(t.multiplier, 86400.0);
        assert_eq!(t.offset, 0.0);
    }

    #[test]
    fn test_resolve_temperatures() {
        for id in ["tasmin", "tasmax"] {
            let t = UnitTransform::resolve(id).unwrap();
            assert_eq!(t.multiplier, 1.0);
            assert_eq!(t.offset, -273.15);
        }
    }

    #[test]
    fn test_resolve_unsupported() {
        for id in ["tas", "huss", "Pr", "pr "] {
            assert!(matches!(
                UnitTransform::resolve(id),
                Err(Cmip5Error::UnsupportedVariable(_))
            ));
        }
    }

    #[test]
    fn test_apply_multiplies_before_adding() {
        let t = UnitTransform {
            multiplier: 2.0,
            offset: 10.0,
        };
        // (5 + 10) * 2 would be 30
        assert_eq!(t.apply(5.0), 20.0);
    }

    #[test]
    fn test_kelvin_to_celsius() {
        let t = UnitTransform::for_variable(Variable::MaxTemperature);
        assert!((t.apply(300.0) - 26.85).abs() < 1e-9);
    }

    #[test]
    fn test_flux_to_daily_accumulation() {
        let t = UnitTransform::for_variable(Variable::Precipitation);
        assert!((t.apply(1.0e-5) - 0.864).abs() < 1e-12);
    }
}
