use crate::config::Config;
use crate::datasources::{BhuvanClient, OpenWeatherMapClient, SoilGridsClient};
use crate::db::Database;
use crate::error::{AdvisorError, Result};
use crate::models::{
    Coordinate, DataOrigin, EnvironmentalSnapshot, SatelliteReading, SoilProperties, SoilTexture,
    WeatherObservation,
};
use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

// Cache TTLs per data kind
const WEATHER_TTL_SECONDS: i64 = 3_600;
const SOIL_TTL_SECONDS: i64 = 86_400;
const SATELLITE_TTL_SECONDS: i64 = 43_200;

/// Fetches and normalizes weather, soil, and satellite readings for a
/// coordinate, with a read-through result cache and fixed synthetic
/// fallbacks when an upstream is unreachable.
pub struct EnvironmentalDataService {
    db: Database,
    weather_client: Option<OpenWeatherMapClient>,
    soil_client: SoilGridsClient,
    satellite_client: Option<BhuvanClient>,
    allow_synthetic: bool,
}

impl EnvironmentalDataService {
    pub fn new(config: &Config, db: Database) -> Self {
        let weather_client = config
            .openweathermap
            .as_ref()
            .filter(|c| c.enabled && !c.api_key.is_empty())
            .map(|c| OpenWeatherMapClient::new(c.clone()));

        if weather_client.is_none() {
            warn!("OpenWeatherMap not configured - weather will fall back to defaults");
        }

        let satellite_client = config
            .bhuvan
            .as_ref()
            .filter(|c| c.enabled && !c.api_key.is_empty())
            .map(|c| BhuvanClient::new(c.clone()));

        if satellite_client.is_none() {
            debug!("Bhuvan not configured - satellite data will be unavailable");
        }

        // Housekeeping; a failure here never blocks startup
        match db.cache_evict_expired() {
            Ok(0) => {}
            Ok(n) => debug!("Evicted {} expired cache entries", n),
            Err(e) => warn!("Cache eviction failed: {}", e),
        }

        Self {
            db,
            weather_client,
            soil_client: SoilGridsClient::new(),
            satellite_client,
            allow_synthetic: true,
        }
    }

    /// When disabled, an unreachable upstream surfaces as
    /// `InsufficientData` instead of a synthetic reading.
    pub fn with_fallback(mut self, allow: bool) -> Self {
        self.allow_synthetic = allow;
        self
    }

    /// Build the full snapshot. The three kinds are independent and fetched
    /// concurrently; a failure in one never blocks the others.
    pub async fn fetch_snapshot(
        &self,
        coordinate: Coordinate,
        date_range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<EnvironmentalSnapshot> {
        let (weather_res, soil_res, satellite) = tokio::join!(
            self.fetch_weather(coordinate),
            self.fetch_soil(coordinate),
            self.fetch_satellite_optional(coordinate, date_range),
        );

        let weather = match weather_res {
            Ok(weather) => weather,
            Err(e) if self.allow_synthetic => {
                warn!("Weather unavailable, using synthetic defaults: {}", e);
                synthetic_weather()
            }
            Err(e) => {
                return Err(AdvisorError::InsufficientData(format!(
                    "Weather data unavailable: {}",
                    e
                )))
            }
        };

        let soil = match soil_res {
            Ok(soil) => soil,
            Err(e) if self.allow_synthetic => {
                warn!("Soil data unavailable, using synthetic defaults: {}", e);
                synthetic_soil()
            }
            Err(e) => {
                return Err(AdvisorError::InsufficientData(format!(
                    "Soil data unavailable: {}",
                    e
                )))
            }
        };

        Ok(EnvironmentalSnapshot {
            weather,
            soil,
            satellite,
        })
    }

    pub async fn fetch_weather(&self, coordinate: Coordinate) -> Result<WeatherObservation> {
        let key = format!("weather:{}", coordinate.cache_fragment());

        if let Some(mut cached) = self.cache_lookup::<WeatherObservation>(&key) {
            debug!(%key, "Weather served from cache");
            cached.origin = DataOrigin::Cached;
            return Ok(cached);
        }

        let client = self.weather_client.as_ref().ok_or_else(|| {
            AdvisorError::UpstreamUnavailable("OpenWeatherMap is not configured".into())
        })?;

        let observation = client.fetch_current(coordinate).await?;
        self.cache_store(&key, &observation, WEATHER_TTL_SECONDS);
        Ok(observation)
    }

    pub async fn fetch_soil(&self, coordinate: Coordinate) -> Result<SoilProperties> {
        let key = format!("soil:{}", coordinate.cache_fragment());

        if let Some(mut cached) = self.cache_lookup::<SoilProperties>(&key) {
            debug!(%key, "Soil properties served from cache");
            cached.origin = DataOrigin::Cached;
            return Ok(cached);
        }

        let properties = self.soil_client.fetch_properties(coordinate).await?;
        self.cache_store(&key, &properties, SOIL_TTL_SECONDS);
        Ok(properties)
    }

    pub async fn fetch_satellite(
        &self,
        coordinate: Coordinate,
        date_range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<SatelliteReading> {
        let key = match date_range {
            Some((start, end)) => format!(
                "satellite:{}:{}:{}",
                coordinate.cache_fragment(),
                start,
                end
            ),
            None => format!("satellite:{}", coordinate.cache_fragment()),
        };

        if let Some(mut cached) = self.cache_lookup::<SatelliteReading>(&key) {
            debug!(%key, "Satellite reading served from cache");
            cached.origin = DataOrigin::Cached;
            return Ok(cached);
        }

        let client = self.satellite_client.as_ref().ok_or_else(|| {
            AdvisorError::UpstreamUnavailable("Bhuvan is not configured".into())
        })?;

        let reading = client.fetch_reading(coordinate, date_range).await?;
        self.cache_store(&key, &reading, SATELLITE_TTL_SECONDS);
        Ok(reading)
    }

    async fn fetch_satellite_optional(
        &self,
        coordinate: Coordinate,
        date_range: Option<(NaiveDate, NaiveDate)>,
    ) -> Option<SatelliteReading> {
        self.satellite_client.as_ref()?;

        match self.fetch_satellite(coordinate, date_range).await {
            Ok(reading) => Some(reading),
            Err(e) if self.allow_synthetic => {
                warn!("Satellite data unavailable, using synthetic defaults: {}", e);
                Some(synthetic_satellite())
            }
            Err(e) => {
                warn!("Satellite data unavailable: {}", e);
                None
            }
        }
    }

    pub async fn check_connections(&self, coordinate: Coordinate) -> ConnectionStatus {
        let mut status = ConnectionStatus::default();

        if let Some(ref client) = self.weather_client {
            status.weather = client.test_connection(coordinate).await.unwrap_or(false);
        }

        status.soil = self
            .soil_client
            .test_connection(coordinate)
            .await
            .unwrap_or(false);

        if let Some(ref client) = self.satellite_client {
            status.satellite = client.test_connection(coordinate).await.unwrap_or(false);
        }

        status
    }

    // Cache failures are never fatal: any error degrades to a miss.

    fn cache_lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.db.cache_get(key) {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(%key, "Discarding unparseable cache entry: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(%key, "Cache read failed, treating as miss: {}", e);
                None
            }
        }
    }

    fn cache_store<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: i64) {
        let payload = match serde_json::to_string(value) {
            Ok(p) => p,
            Err(e) => {
                warn!(%key, "Failed to serialize cache payload: {}", e);
                return;
            }
        };
        if let Err(e) = self.db.cache_set(key, &payload, ttl_seconds) {
            warn!(%key, "Cache write failed: {}", e);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionStatus {
    pub weather: bool,
    pub soil: bool,
    pub satellite: bool,
}

impl ConnectionStatus {
    pub fn all_connected(&self) -> bool {
        self.weather && self.soil && self.satellite
    }

    pub fn any_connected(&self) -> bool {
        self.weather || self.soil || self.satellite
    }
}

// Fixed synthetic defaults, flagged so output built on them is
// distinguishable from measured data.

fn synthetic_weather() -> WeatherObservation {
    WeatherObservation {
        temperature_c: 25.0,
        humidity_percent: 60.0,
        wind_speed_ms: 3.0,
        description: "synthetic default".into(),
        forecast: Vec::new(),
        fetched_at: Utc::now(),
        origin: DataOrigin::Synthetic,
    }
}

fn synthetic_soil() -> SoilProperties {
    SoilProperties {
        ph: 6.5,
        organic_matter_percent: 2.5,
        nitrogen_percent: 0.15,
        phosphorus_ppm: 35.0,
        potassium_ppm: 125.0,
        sand_percent: 40.0,
        clay_percent: 20.0,
        texture: SoilTexture::Loamy,
        fetched_at: Utc::now(),
        origin: DataOrigin::Synthetic,
    }
}

fn synthetic_satellite() -> SatelliteReading {
    SatelliteReading {
        ndvi: 0.6,
        evi: 0.4,
        soil_moisture_percent: 50.0,
        captured_on: None,
        fetched_at: Utc::now(),
        origin: DataOrigin::Synthetic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FarmConfig;

    fn unconfigured_service() -> EnvironmentalDataService {
        let config = Config {
            farm: FarmConfig {
                name: "Test Farm".into(),
                latitude: 30.9,
                longitude: 75.8,
                farm_size_hectares: 2.0,
                soil_type: None,
            },
            openweathermap: None,
            bhuvan: None,
        };
        EnvironmentalDataService::new(&config, Database::open_in_memory().unwrap())
    }

    #[tokio::test]
    async fn weather_cache_hit_skips_the_client() {
        let service = unconfigured_service();
        let coordinate = Coordinate::new(30.9, 75.8).unwrap();

        // No client configured, so a hit can only come from the cache
        let observation = synthetic_weather();
        service.cache_store(
            "weather:30.9000:75.8000",
            &observation,
            WEATHER_TTL_SECONDS,
        );

        let fetched = service.fetch_weather(coordinate).await.unwrap();
        assert_eq!(fetched.origin, DataOrigin::Cached);
        assert!((fetched.temperature_c - 25.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn unconfigured_weather_is_upstream_unavailable() {
        let service = unconfigured_service();
        let coordinate = Coordinate::new(30.9, 75.8).unwrap();

        let err = service.fetch_weather(coordinate).await.unwrap_err();
        assert!(matches!(err, AdvisorError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn unparseable_cache_entry_is_a_miss() {
        let service = unconfigured_service();
        let coordinate = Coordinate::new(30.9, 75.8).unwrap();

        service
            .db
            .cache_set("weather:30.9000:75.8000", "not json", WEATHER_TTL_SECONDS)
            .unwrap();

        let err = service.fetch_weather(coordinate).await.unwrap_err();
        assert!(matches!(err, AdvisorError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn unconfigured_satellite_is_skipped_silently() {
        let service = unconfigured_service();
        let coordinate = Coordinate::new(30.9, 75.8).unwrap();

        let reading = service.fetch_satellite_optional(coordinate, None).await;
        assert!(reading.is_none());
    }

    #[test]
    fn synthetic_defaults_are_flagged() {
        assert_eq!(synthetic_weather().origin, DataOrigin::Synthetic);
        assert_eq!(synthetic_soil().origin, DataOrigin::Synthetic);
        assert_eq!(synthetic_satellite().origin, DataOrigin::Synthetic);
        assert_eq!(synthetic_soil().texture, SoilTexture::Loamy);
    }
}
