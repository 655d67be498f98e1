use crate::config::OpenWeatherMapConfig;
use crate::error::{AdvisorError, Result};
use crate::models::{Coordinate, DataOrigin, ForecastDay, WeatherObservation};
use chrono::Utc;
use serde::Deserialize;

const API_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Number of 3-hour forecast slots surfaced after the current conditions.
const FORECAST_ENTRIES: usize = 7;

pub struct OpenWeatherMapClient {
    client: reqwest::Client,
    config: OpenWeatherMapConfig,
}

// OpenWeatherMap API response structures
#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Vec<OwmForecastItem>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    #[serde(default)]
    dt_txt: String,
    main: OwmMain,
    weather: Vec<OwmWeather>,
    wind: OwmWind,
    #[serde(default)]
    rain: Option<OwmPrecipitation>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwmPrecipitation {
    #[serde(rename = "3h", default)]
    three_hour: f64,
}

impl OpenWeatherMapClient {
    pub fn new(config: OpenWeatherMapConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Fetch current conditions plus a short forecast. The first list entry
    /// of the 5-day/3-hour feed is treated as "now".
    pub async fn fetch_current(&self, coordinate: Coordinate) -> Result<WeatherObservation> {
        let url = format!(
            "{}/forecast?lat={}&lon={}&appid={}&units=metric",
            API_BASE_URL, coordinate.latitude, coordinate.longitude, self.config.api_key
        );

        let response = super::send_with_retry(self.client.get(&url), "OpenWeatherMap").await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::UpstreamUnavailable(format!(
                "OpenWeatherMap returned {}: {}",
                status, body
            )));
        }

        let owm_response: OwmForecastResponse = response.json().await.map_err(|e| {
            AdvisorError::UpstreamUnavailable(format!(
                "Failed to parse OpenWeatherMap response: {}",
                e
            ))
        })?;

        Self::convert_response(owm_response)
    }

    pub async fn test_connection(&self, coordinate: Coordinate) -> Result<bool> {
        let url = format!(
            "{}/weather?lat={}&lon={}&appid={}&units=metric",
            API_BASE_URL, coordinate.latitude, coordinate.longitude, self.config.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AdvisorError::UpstreamUnavailable(format!("OpenWeatherMap: {}", e)))?;

        Ok(response.status().is_success())
    }

    fn convert_response(response: OwmForecastResponse) -> Result<WeatherObservation> {
        let current = response.list.first().ok_or_else(|| {
            AdvisorError::UpstreamUnavailable("OpenWeatherMap returned an empty forecast".into())
        })?;

        let description = current
            .weather
            .first()
            .map(|w| w.description.clone())
            .unwrap_or_default();

        let forecast = response
            .list
            .iter()
            .skip(1)
            .take(FORECAST_ENTRIES)
            .map(|item| ForecastDay {
                date: item.dt_txt.clone(),
                temp_min_c: item.main.temp_min,
                temp_max_c: item.main.temp_max,
                humidity_percent: item.main.humidity,
                precipitation_mm: item.rain.as_ref().map(|r| r.three_hour).unwrap_or(0.0),
                description: item
                    .weather
                    .first()
                    .map(|w| w.description.clone())
                    .unwrap_or_default(),
            })
            .collect();

        Ok(WeatherObservation {
            temperature_c: current.main.temp,
            humidity_percent: current.main.humidity,
            wind_speed_ms: current.wind.speed,
            description,
            forecast,
            fetched_at: Utc::now(),
            origin: DataOrigin::Live,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response(entries: usize) -> OwmForecastResponse {
        let list = (0..entries)
            .map(|i| OwmForecastItem {
                dt_txt: format!("2026-01-0{} 12:00:00", i + 1),
                main: OwmMain {
                    temp: 20.0 + i as f64,
                    temp_min: 18.0,
                    temp_max: 24.0,
                    humidity: 65.0,
                },
                weather: vec![OwmWeather {
                    description: "clear sky".into(),
                }],
                wind: OwmWind { speed: 3.2 },
                rain: None,
            })
            .collect();
        OwmForecastResponse { list }
    }

    #[test]
    fn first_entry_becomes_current_conditions() {
        let obs = OpenWeatherMapClient::convert_response(sample_response(9)).unwrap();
        assert!((obs.temperature_c - 20.0).abs() < f64::EPSILON);
        assert!((obs.humidity_percent - 65.0).abs() < f64::EPSILON);
        assert!((obs.wind_speed_ms - 3.2).abs() < f64::EPSILON);
        assert_eq!(obs.description, "clear sky");
        assert_eq!(obs.origin, DataOrigin::Live);
        assert_eq!(obs.forecast.len(), 7);
        assert_eq!(obs.forecast[0].date, "2026-01-02 12:00:00");
    }

    #[test]
    fn short_feed_yields_short_forecast() {
        let obs = OpenWeatherMapClient::convert_response(sample_response(3)).unwrap();
        assert_eq!(obs.forecast.len(), 2);
    }

    #[test]
    fn empty_feed_is_an_error() {
        assert!(OpenWeatherMapClient::convert_response(sample_response(0)).is_err());
    }
}
