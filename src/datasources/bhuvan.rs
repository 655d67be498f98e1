use crate::config::BhuvanConfig;
use crate::error::{AdvisorError, Result};
use crate::models::{Coordinate, DataOrigin, SatelliteReading};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

const API_BASE_URL: &str = "https://bhuvan-app1.nrsc.gov.in/api/satellite";

// Fixed substitutes for fields the provider frequently omits.
const DEFAULT_NDVI: f64 = 0.6;
const DEFAULT_EVI: f64 = 0.4;
const DEFAULT_MOISTURE_PERCENT: f64 = 50.0;

pub struct BhuvanClient {
    client: reqwest::Client,
    config: BhuvanConfig,
}

// Bhuvan API response; every field may be absent depending on coverage.
#[derive(Debug, Deserialize)]
struct BhuvanResponse {
    #[serde(default)]
    ndvi: Option<f64>,
    #[serde(default)]
    evi: Option<f64>,
    #[serde(default)]
    moisture: Option<f64>,
    #[serde(default)]
    date: Option<String>,
}

impl BhuvanClient {
    pub fn new(config: BhuvanConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub async fn fetch_reading(
        &self,
        coordinate: Coordinate,
        date_range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<SatelliteReading> {
        let mut url = format!(
            "{}/data?lat={}&lon={}&key={}",
            API_BASE_URL, coordinate.latitude, coordinate.longitude, self.config.api_key
        );
        if let Some((start, end)) = date_range {
            url.push_str(&format!("&start={}&end={}", start, end));
        }

        let response = super::send_with_retry(self.client.get(&url), "Bhuvan").await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::UpstreamUnavailable(format!(
                "Bhuvan returned {}: {}",
                status, body
            )));
        }

        let bhuvan_response: BhuvanResponse = response.json().await.map_err(|e| {
            AdvisorError::UpstreamUnavailable(format!("Failed to parse Bhuvan response: {}", e))
        })?;

        Ok(Self::convert_response(bhuvan_response))
    }

    pub async fn test_connection(&self, coordinate: Coordinate) -> Result<bool> {
        let url = format!(
            "{}/data?lat={}&lon={}&key={}",
            API_BASE_URL, coordinate.latitude, coordinate.longitude, self.config.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AdvisorError::UpstreamUnavailable(format!("Bhuvan: {}", e)))?;

        Ok(response.status().is_success())
    }

    fn convert_response(response: BhuvanResponse) -> SatelliteReading {
        SatelliteReading {
            ndvi: response.ndvi.unwrap_or(DEFAULT_NDVI),
            evi: response.evi.unwrap_or(DEFAULT_EVI),
            soil_moisture_percent: response.moisture.unwrap_or(DEFAULT_MOISTURE_PERCENT),
            captured_on: response
                .date
                .as_deref()
                // Keep the YYYY-MM-DD prefix; get() avoids panicking when
                // byte 10 is not a char boundary
                .and_then(|d| NaiveDate::parse_from_str(d.get(..10).unwrap_or(d), "%Y-%m-%d").ok()),
            fetched_at: Utc::now(),
            origin: DataOrigin::Live,
        }
    }
}
