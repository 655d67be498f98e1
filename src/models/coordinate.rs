use crate::error::{AdvisorError, Result};
use serde::{Deserialize, Serialize};

/// WGS84 position of the farm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(AdvisorError::InvalidInput(
                "Coordinate must be finite decimal degrees".into(),
            ));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(AdvisorError::InvalidInput(format!(
                "Latitude {} out of range [-90, 90]",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(AdvisorError::InvalidInput(format!(
                "Longitude {} out of range [-180, 180]",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Cache-key fragment with positions rounded to 4 decimal places (~11m),
    /// so nearby requests share cache entries.
    pub fn cache_fragment(&self) -> String {
        format!("{:.4}:{:.4}", self.latitude, self.longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_coordinates() {
        let c = Coordinate::new(30.9, 75.8).unwrap();
        assert_eq!(c.latitude, 30.9);
        assert_eq!(c.longitude, 75.8);
    }

    #[test]
    fn rejects_nan_and_out_of_range() {
        assert!(Coordinate::new(f64::NAN, 75.8).is_err());
        assert!(Coordinate::new(30.9, f64::INFINITY).is_err());
        assert!(Coordinate::new(91.0, 0.0).is_err());
        assert!(Coordinate::new(-91.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, 181.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
    }

    #[test]
    fn accepts_boundary_values() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn cache_fragment_rounds_to_four_places() {
        let c = Coordinate::new(30.90001, 75.79999).unwrap();
        assert_eq!(c.cache_fragment(), "30.9000:75.8000");
    }
}
