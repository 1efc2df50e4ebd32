//! Region of interest for spatial reductions and clipping.

use serde::{Deserialize, Serialize};

use crate::error::{Cmip5Error, Cmip5Result};

/// Caller-supplied rectangle description.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Geometry {
    /// Four numbers in the order xMin, yMin, xMax, yMax.
    Coords([f64; 4]),
    /// Two corner points, each `[x, y]`: the minimum corner then the maximum corner.
    Corners([[f64; 2]; 2]),
}

impl Geometry {
    /// Parse a bounding box string: "xmin,ymin,xmax,ymax"
    pub fn from_bbox_string(s: &str) -> Cmip5Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(Cmip5Error::InvalidGeometry(format!(
                "{s}: expected 'xmin,ymin,xmax,ymax'"
            )));
        }

        let mut coords = [0.0; 4];
        for (slot, part) in coords.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| Cmip5Error::InvalidGeometry(format!("invalid number: {part}")))?;
        }
        Ok(Geometry::Coords(coords))
    }
}

/// An axis-aligned rectangle in geographic coordinates (EPSG:4326, degrees).
///
/// The corners are kept exactly as given. A rectangle with `min_x > max_x` is
/// passed through untouched and left for the remote service to reject.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Region {
    /// Create a new region from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Build the rectangle from either geometry form.
    pub fn build(geometry: &Geometry) -> Self {
        match *geometry {
            Geometry::Coords([min_x, min_y, max_x, max_y]) => {
                Self::new(min_x, min_y, max_x, max_y)
            }
            Geometry::Corners([[min_x, min_y], [max_x, max_y]]) => {
                Self::new(min_x, min_y, max_x, max_y)
            }
        }
    }

    /// Build from a slice that must hold exactly four numbers.
    pub fn from_coords(coords: &[f64]) -> Cmip5Result<Self> {
        match coords {
            [min_x, min_y, max_x, max_y] => Ok(Self::new(*min_x, *min_y, *max_x, *max_y)),
            _ => Err(Cmip5Error::InvalidGeometry(format!(
                "expected 4 coordinates, got {}",
                coords.len()
            ))),
        }
    }

    /// Closed linear ring of the rectangle, counter-clockwise from the minimum corner.
    pub fn ring(&self) -> [[f64; 2]; 5] {
        [
            [self.min_x, self.min_y],
            [self.max_x, self.min_y],
            [self.max_x, self.max_y],
            [self.min_x, self.max_y],
            [self.min_x, self.min_y],
        ]
    }

    /// GeoJSON Polygon geometry for this rectangle.
    pub fn to_geojson(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "Polygon",
            "coordinates": [self.ring()],
        })
    }
}

impl From<Geometry> for Region {
    fn from(geometry: Geometry) -> Self {
        Region::build(&geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_from_coords_keeps_order() {
        let region = Region::build(&Geometry::Coords([-70.0, -35.0, -60.0, -25.0]));
        assert_eq!(region.min_x, -70.0);
        assert_eq!(region.min_y, -35.0);
        assert_eq!(region.max_x, -60.0);
        assert_eq!(region.max_y, -25.0);
    }

    #[test]
    fn test_build_from_corners() {
        let region = Region::build(&Geometry::Corners([[-70.0, -35.0], [-60.0, -25.0]]));
        assert_eq!(region, Region::new(-70.0, -35.0, -60.0, -25.0));
    }

    #[test]
    fn test_parse_bbox_string() {
        let geometry = Geometry::from_bbox_string("-70,-35,-60,-25").unwrap();
        assert_eq!(geometry, Geometry::Coords([-70.0, -35.0, -60.0, -25.0]));
        assert_eq!(Region::from(geometry), Region::new(-70.0, -35.0, -60.0, -25.0));
    }
}
