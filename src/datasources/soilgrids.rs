use crate::error::{AdvisorError, Result};
use crate::models::{Coordinate, DataOrigin, SoilProperties, SoilTexture};
use chrono::Utc;
use serde::Deserialize;

const API_BASE_URL: &str = "https://rest.soilgrids.org/soilgrids/v2.0";

/// No live provider exists for these in the SoilGrids feed; fixed mid-range
/// defaults keep the output deterministic.
pub const DEFAULT_PHOSPHORUS_PPM: f64 = 35.0;
pub const DEFAULT_POTASSIUM_PPM: f64 = 125.0;

pub struct SoilGridsClient {
    client: reqwest::Client,
}

// SoilGrids API response structures
#[derive(Debug, Deserialize)]
struct SoilGridsResponse {
    properties: SoilGridsProperties,
}

#[derive(Debug, Deserialize)]
struct SoilGridsProperties {
    phh2o: SoilGridsProperty,
    soc: SoilGridsProperty,
    nitrogen: SoilGridsProperty,
    sand: SoilGridsProperty,
    clay: SoilGridsProperty,
}

#[derive(Debug, Deserialize)]
struct SoilGridsProperty {
    depths: Vec<SoilGridsDepth>,
}

#[derive(Debug, Deserialize)]
struct SoilGridsDepth {
    values: SoilGridsValues,
}

#[derive(Debug, Deserialize)]
struct SoilGridsValues {
    mean: f64,
}

impl SoilGridsClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Query topsoil (0-5cm) mean properties and derive the texture class.
    pub async fn fetch_properties(&self, coordinate: Coordinate) -> Result<SoilProperties> {
        let url = format!(
            "{}/properties/query?lon={}&lat={}\
             &property=phh2o&property=soc&property=nitrogen&property=sand&property=clay\
             &depth=0-5cm&value=mean",
            API_BASE_URL, coordinate.longitude, coordinate.latitude
        );

        let response = super::send_with_retry(self.client.get(&url), "SoilGrids").await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::UpstreamUnavailable(format!(
                "SoilGrids returned {}: {}",
                status, body
            )));
        }

        let sg_response: SoilGridsResponse = response.json().await.map_err(|e| {
            AdvisorError::UpstreamUnavailable(format!("Failed to parse SoilGrids response: {}", e))
        })?;

        Self::convert_response(sg_response)
    }

    pub async fn test_connection(&self, coordinate: Coordinate) -> Result<bool> {
        let url = format!(
            "{}/properties/query?lon={}&lat={}&property=phh2o&depth=0-5cm&value=mean",
            API_BASE_URL, coordinate.longitude, coordinate.latitude
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AdvisorError::UpstreamUnavailable(format!("SoilGrids: {}", e)))?;

        Ok(response.status().is_success())
    }

    fn convert_response(response: SoilGridsResponse) -> Result<SoilProperties> {
        let p = &response.properties;

        let ph = topsoil_mean(&p.phh2o, "phh2o")? / 10.0; // pH*10 -> pH
        let organic_matter = topsoil_mean(&p.soc, "soc")? / 10.0; // g/kg -> %
        let nitrogen = topsoil_mean(&p.nitrogen, "nitrogen")? / 100.0; // cg/kg -> %
        let sand = topsoil_mean(&p.sand, "sand")? / 10.0; // g/kg -> %
        let clay = topsoil_mean(&p.clay, "clay")? / 10.0; // g/kg -> %

        Ok(SoilProperties {
            ph,
            organic_matter_percent: organic_matter,
            nitrogen_percent: nitrogen,
            phosphorus_ppm: DEFAULT_PHOSPHORUS_PPM,
            potassium_ppm: DEFAULT_POTASSIUM_PPM,
            sand_percent: sand,
            clay_percent: clay,
            texture: SoilTexture::classify(sand, clay),
            fetched_at: Utc::now(),
            origin: DataOrigin::Live,
        })
    }
}

impl Default for SoilGridsClient {
    fn default() -> Self {
        Self::new()
    }
}

fn topsoil_mean(property: &SoilGridsProperty, name: &str) -> Result<f64> {
    property
        .depths
        .first()
        .map(|d| d.values.mean)
        .ok_or_else(|| {
            AdvisorError::UpstreamUnavailable(format!("SoilGrids response missing {} depths", name))
        })
}
