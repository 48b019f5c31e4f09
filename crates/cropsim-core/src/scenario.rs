//! The persisted scenario format.
//!
//! A scenario is a single flat JSON object:
//!
//! ```json
//! {
//!   "type": "corn",
//!   "hectares": 2.5,
//!   "density": 70,
//!   "polygon": [[-50, 0, -50], [-50, 0, 50], [50, 0, 50], [50, 0, -50]],
//!   "location": { "latitude": 41.6, "longitude": -93.6, "name": "Des Moines, US" },
//!   "weatherSettings": { "useRealWeather": true }
//! }
//! ```
//!
//! `type`, `hectares`, `density`, and `polygon` are required. Loading never
//! panics: every malformed input maps to a [`ScenarioError`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use cropsim_types::{CropType, GeoLocation};
use cropsim_world::{FieldError, FieldPolygon};

use crate::location::fallback_name;

/// Built-in scenario used when no file is given: a soybean field in
/// Mato Grosso, Brazil.
const DEMO_SCENARIO: &str = r#"{
  "type": "soybean",
  "hectares": 1.5,
  "density": 100,
  "polygon": [[-30, 0, -30], [-30, 0, 30], [30, 0, 30], [30, 0, -30]],
  "location": { "latitude": -12.915559, "longitude": -55.314216, "name": "Mato Grosso (Brazil)" },
  "weatherSettings": { "useRealWeather": true }
}"#;

/// Errors that can occur when loading a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The input is not valid JSON.
    #[error("invalid scenario JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent or null.
    #[error("missing required field: '{0}'")]
    MissingField(&'static str),

    /// A field is present but has the wrong type or an out-of-range value.
    #[error("invalid field '{field}': {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The crop type is not in the catalogue.
    #[error("unknown crop type: '{0}'")]
    UnknownCrop(String),

    /// The field outline is malformed.
    #[error(transparent)]
    InvalidPolygon(#[from] FieldError),
}

impl ScenarioError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Weather source preferences stored with a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSettings {
    /// Whether live conditions should be fetched for the location.
    #[serde(default = "default_true")]
    pub use_real_weather: bool,

    /// Per-scenario API key for the weather service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            use_real_weather: true,
            api_key: None,
        }
    }
}

const fn default_true() -> bool {
    true
}

/// A validated simulation scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// What is planted.
    pub crop_type: CropType,
    /// Field size in hectares, positive and finite.
    pub hectares: f64,
    /// Planting density in percent, `0..=100`.
    pub density: u8,
    /// Field outline.
    pub polygon: FieldPolygon,
    /// Where the field is, if known.
    pub location: Option<GeoLocation>,
    /// Weather source preferences.
    pub weather_settings: WeatherSettings,
}

/// Serialized shape of a scenario.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioRecord<'a> {
    #[serde(rename = "type")]
    crop_type: CropType,
    hectares: f64,
    density: u8,
    polygon: Vec<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a GeoLocation>,
    weather_settings: &'a WeatherSettings,
}

impl Scenario {
    /// Parse and validate a scenario document.
    ///
    /// # Errors
    ///
    /// - [`ScenarioError::Json`] for malformed JSON.
    /// - [`ScenarioError::MissingField`] when `type`, `hectares`, `density`,
    ///   or `polygon` is absent.
    /// - [`ScenarioError::UnknownCrop`] for a crop outside the catalogue.
    /// - [`ScenarioError::InvalidField`] for wrong types or out-of-range
    ///   values.
    /// - [`ScenarioError::InvalidPolygon`] for a malformed outline.
    pub fn from_json(input: &str) -> Result<Self, ScenarioError> {
        let value: Value = serde_json::from_str(input)?;
        let Value::Object(map) = value else {
            return Err(ScenarioError::invalid("scenario", "expected a JSON object"));
        };

        let crop_name = required(&map, "type")?
            .as_str()
            .ok_or_else(|| ScenarioError::invalid("type", "expected a string"))?;
        let crop_type = CropType::from_name(crop_name)
            .ok_or_else(|| ScenarioError::UnknownCrop(crop_name.to_owned()))?;

        let hectares = required(&map, "hectares")?
            .as_f64()
            .filter(|h| h.is_finite() && *h > 0.0)
            .ok_or_else(|| ScenarioError::invalid("hectares", "expected a positive number"))?;

        let density = required(&map, "density")?
            .as_u64()
            .and_then(|d| u8::try_from(d).ok())
            .filter(|d| *d <= 100)
            .ok_or_else(|| ScenarioError::invalid("density", "expected an integer between 0 and 100"))?;

        let polygon = parse_polygon(required(&map, "polygon")?)?;

        let location = match map.get("location") {
            None | Some(Value::Null) => None,
            Some(value) => Some(parse_location(value)?),
        };

        let weather_settings = match map.get("weatherSettings") {
            None | Some(Value::Null) => WeatherSettings::default(),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| ScenarioError::invalid("weatherSettings", e.to_string()))?,
        };

        Ok(Self {
            crop_type,
            hectares,
            density,
            polygon,
            location,
            weather_settings,
        })
    }

    /// Serialize back to the persisted format.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ScenarioError> {
        let record = ScenarioRecord {
            crop_type: self.crop_type,
            hectares: self.hectares,
            density: self.density,
            polygon: self
                .polygon
                .vertices()
                .iter()
                .map(|v| [v.x(), v.y(), v.z()])
                .collect(),
            location: self.location.as_ref(),
            weather_settings: &self.weather_settings,
        };
        Ok(serde_json::to_string_pretty(&record)?)
    }

    /// The built-in demonstration scenario.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the document is validated like any other.
    pub fn demo() -> Result<Self, ScenarioError> {
        Self::from_json(DEMO_SCENARIO)
    }
}

fn required<'a>(map: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, ScenarioError> {
    match map.get(field) {
        None | Some(Value::Null) => Err(ScenarioError::MissingField(field)),
        Some(value) => Ok(value),
    }
}

fn parse_polygon(value: &Value) -> Result<FieldPolygon, ScenarioError> {
    let points = value
        .as_array()
        .ok_or_else(|| FieldError::invalid("polygon must be an array of vertices"))?;

    let mut coordinates: Vec<Vec<f64>> = Vec::with_capacity(points.len());
    for (index, point) in points.iter().enumerate() {
        let components = point
            .as_array()
            .ok_or_else(|| FieldError::invalid(format!("vertex {index} must be an array [x, y, z]")))?;
        let coords = components
            .iter()
            .map(Value::as_f64)
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| FieldError::invalid(format!("vertex {index} has a non-numeric coordinate")))?;
        coordinates.push(coords);
    }
    Ok(FieldPolygon::from_coordinates(&coordinates)?)
}

fn parse_location(value: &Value) -> Result<GeoLocation, ScenarioError> {
    let coordinate = |key: &'static str| {
        value
            .get(key)
            .and_then(Value::as_f64)
            .filter(|c| c.is_finite())
            .ok_or_else(|| ScenarioError::invalid("location", format!("'{key}' must be a number")))
    };
    let latitude = coordinate("latitude")?;
    let longitude = coordinate("longitude")?;
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .map_or_else(|| fallback_name(latitude, longitude), str::to_owned);
    Ok(GeoLocation {
        latitude,
        longitude,
        name,
    })
}
