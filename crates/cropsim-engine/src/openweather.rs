//! OpenWeather HTTP collaborator: geocoding and current conditions.
//!
//! Endpoints, relative to the configured base URL:
//!
//! | Lookup            | Path                 | Notes               |
//! |-------------------|----------------------|---------------------|
//! | Reverse geocoding | `/geo/1.0/reverse`   | `limit=1`           |
//! | Place search      | `/geo/1.0/direct`    | `limit=5`           |
//! | Current weather   | `/data/2.5/weather`  | `units=metric`      |

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use cropsim_core::config::GeocodingConfig;
use cropsim_core::location::{GeocodeError, Geocoder, Place};
use cropsim_types::WeatherKind;

use crate::error::EngineError;

/// Search results requested per query.
const SEARCH_LIMIT: u8 = 5;

/// One entry of a geocoding response.
#[derive(Debug, Deserialize)]
struct GeoEntry {
    name: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    state: Option<String>,
    lat: f64,
    lon: f64,
}

impl From<GeoEntry> for Place {
    fn from(entry: GeoEntry) -> Self {
        Self {
            name: entry.name,
            country: entry.country,
            state: entry.state,
            latitude: entry.lat,
            longitude: entry.lon,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: MainReading,
    weather: Vec<ConditionReading>,
    #[serde(default)]
    wind: Option<WindReading>,
}

#[derive(Debug, Deserialize)]
struct MainReading {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionReading {
    id: u16,
}

#[derive(Debug, Deserialize)]
struct WindReading {
    speed: f64,
}

/// Live conditions at a coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Mapped sky condition.
    pub weather_kind: WeatherKind,
    /// Air temperature in degrees Celsius.
    pub temperature_c: f64,
    /// Relative humidity in percent.
    pub humidity_pct: f64,
    /// Wind speed in m/s, when reported.
    pub wind_speed: Option<f64>,
}

/// HTTP client for the OpenWeather API.
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Create a client from the geocoding configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Http`] if the underlying client cannot be built.
    pub fn new(config: &GeocodingConfig) -> Result<Self, EngineError> {
        Self::with_key(config, config.api_key.clone())
    }

    /// Create a client using `api_key` instead of the configured key.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Http`] if the underlying client cannot be built.
    pub fn with_key(config: &GeocodingConfig, api_key: String) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| EngineError::Http {
                message: format!("{e}"),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key,
        })
    }

    /// Build the client used for lookups, if any key is available.
    ///
    /// A non-blank `override_key` (from the scenario's weather settings)
    /// wins over the configured key. Returns `None` when neither is set.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Http`] if the underlying client cannot be built.
    pub fn for_lookups(config: &GeocodingConfig, override_key: Option<&str>) -> Result<Option<Self>, EngineError> {
        match override_key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => Self::with_key(config, key.to_owned()).map(Some),
            None if config.is_enabled() => Self::new(config).map(Some),
            None => Ok(None),
        }
    }

    /// Fetch the current conditions at a coordinate.
    ///
    /// # Errors
    ///
    /// Returns a [`GeocodeError`] for network, status, or decoding failures.
    pub async fn current_weather(&self, latitude: f64, longitude: f64) -> Result<CurrentConditions, GeocodeError> {
        let body = self
            .get(
                "/data/2.5/weather",
                &[
                    ("lat", latitude.to_string()),
                    ("lon", longitude.to_string()),
                    ("units", "metric".to_owned()),
                ],
            )
            .await?;
        parse_current_weather(&body)
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, GeocodeError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "OpenWeather request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| GeocodeError::Network(format!("{e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| GeocodeError::Network(format!("{e}")))
    }
}

impl Geocoder for OpenWeatherClient {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Place, GeocodeError> {
        let body = self
            .get(
                "/geo/1.0/reverse",
                &[
                    ("lat", latitude.to_string()),
                    ("lon", longitude.to_string()),
                    ("limit", "1".to_owned()),
                ],
            )
            .await?;
        parse_places(&body)?
            .into_iter()
            .next()
            .ok_or(GeocodeError::NotFound)
    }

    async fn search(&self, query: &str) -> Result<Vec<Place>, GeocodeError> {
        let body = self
            .get(
                "/geo/1.0/direct",
                &[("q", query.to_owned()), ("limit", SEARCH_LIMIT.to_string())],
            )
            .await?;
        let places = parse_places(&body)?;
        if places.is_empty() {
            return Err(GeocodeError::NotFound);
        }
        Ok(places)
    }
}

fn parse_places(body: &str) -> Result<Vec<Place>, GeocodeError> {
    let entries: Vec<GeoEntry> =
        serde_json::from_str(body).map_err(|e| GeocodeError::Decode(format!("{e}")))?;
    Ok(entries.into_iter().map(Place::from).collect())
}

fn parse_current_weather(body: &str) -> Result<CurrentConditions, GeocodeError> {
    let response: WeatherResponse =
        serde_json::from_str(body).map_err(|e| GeocodeError::Decode(format!("{e}")))?;
    let code = response
        .weather
        .first()
        .map(|c| c.id)
        .ok_or_else(|| GeocodeError::Decode("response has no weather conditions".to_owned()))?;
    Ok(CurrentConditions {
        weather_kind: WeatherKind::from_condition_code(code),
        temperature_c: response.main.temp,
        humidity_pct: response.main.humidity,
        wind_speed: response.wind.map(|w| w.speed),
    })
}
