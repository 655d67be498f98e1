use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Where a reading came from. Synthetic readings are fixed fallback values
/// substituted when both the upstream call and the cache fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    Live,
    Cached,
    Synthetic,
}

impl DataOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataOrigin::Live => "Live",
            DataOrigin::Cached => "Cached",
            DataOrigin::Synthetic => "Synthetic",
        }
    }
}

impl std::fmt::Display for DataOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// USDA-style soil texture classes used by the crop knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilTexture {
    Clay,
    Sandy,
    Silt,
    Loamy,
    ClayLoam,
    SandyClayLoam,
    SandyLoam,
    SiltLoam,
}

impl SoilTexture {
    /// Derive the texture class from sand/clay percentages.
    ///
    /// Fixed rule table evaluated in order; the first matching rule wins.
    /// Silt is the remainder after sand and clay.
    pub fn classify(sand_percent: f64, clay_percent: f64) -> Self {
        let silt = 100.0 - sand_percent - clay_percent;

        if clay_percent >= 40.0 {
            SoilTexture::Clay
        } else if sand_percent >= 85.0 {
            SoilTexture::Sandy
        } else if silt >= 80.0 {
            SoilTexture::Silt
        } else if (27.0..40.0).contains(&clay_percent) && sand_percent <= 45.0 {
            SoilTexture::ClayLoam
        } else if (20.0..35.0).contains(&clay_percent) && silt < 28.0 && sand_percent > 45.0 {
            SoilTexture::SandyClayLoam
        } else if clay_percent < 20.0 && sand_percent > 52.0 {
            SoilTexture::SandyLoam
        } else if silt >= 50.0 && (12.0..27.0).contains(&clay_percent) {
            SoilTexture::SiltLoam
        } else if silt >= 50.0 && clay_percent < 12.0 {
            SoilTexture::Silt
        } else {
            SoilTexture::Loamy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SoilTexture::Clay => "clay",
            SoilTexture::Sandy => "sandy",
            SoilTexture::Silt => "silt",
            SoilTexture::Loamy => "loamy",
            SoilTexture::ClayLoam => "clay_loam",
            SoilTexture::SandyClayLoam => "sandy_clay_loam",
            SoilTexture::SandyLoam => "sandy_loam",
            SoilTexture::SiltLoam => "silt_loam",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace([' ', '-'], "_").as_str() {
            "clay" => Some(SoilTexture::Clay),
            "sandy" => Some(SoilTexture::Sandy),
            "silt" => Some(SoilTexture::Silt),
            "loamy" | "loam" => Some(SoilTexture::Loamy),
            "clay_loam" => Some(SoilTexture::ClayLoam),
            "sandy_clay_loam" => Some(SoilTexture::SandyClayLoam),
            "sandy_loam" => Some(SoilTexture::SandyLoam),
            "silt_loam" => Some(SoilTexture::SiltLoam),
            _ => None,
        }
    }
}

impl std::fmt::Display for SoilTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One forecast day from the weather provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: String,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub humidity_percent: f64,
    pub precipitation_mm: f64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub wind_speed_ms: f64,
    pub description: String,
    pub forecast: Vec<ForecastDay>,
    pub fetched_at: DateTime<Utc>,
    pub origin: DataOrigin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilProperties {
    pub ph: f64,
    pub organic_matter_percent: f64,
    pub nitrogen_percent: f64,
    pub phosphorus_ppm: f64,
    pub potassium_ppm: f64,
    pub sand_percent: f64,
    pub clay_percent: f64,
    pub texture: SoilTexture,
    pub fetched_at: DateTime<Utc>,
    pub origin: DataOrigin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatelliteReading {
    pub ndvi: f64,
    pub evi: f64,
    pub soil_moisture_percent: f64,
    pub captured_on: Option<NaiveDate>,
    pub fetched_at: DateTime<Utc>,
    pub origin: DataOrigin,
}

/// Immutable per-request view of the environment at a coordinate.
///
/// Built fresh for each scoring request (or served from cache within TTL)
/// and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentalSnapshot {
    pub weather: WeatherObservation,
    pub soil: SoilProperties,
    pub satellite: Option<SatelliteReading>,
}

impl EnvironmentalSnapshot {
    /// True when every constituent reading came from a live or cached
    /// provider response rather than a synthetic fallback.
    pub fn is_measured(&self) -> bool {
        self.weather.origin != DataOrigin::Synthetic
            && self.soil.origin != DataOrigin::Synthetic
            && self
                .satellite
                .as_ref()
                .map_or(true, |s| s.origin != DataOrigin::Synthetic)
    }
}
