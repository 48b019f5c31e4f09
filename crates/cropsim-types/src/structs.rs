//! Core data structs for the crop growth simulation.
//!
//! Weather records, the growth timeline, field vertices, and the payloads the
//! renderer consumes (weather visuals, plant placements, camera framing).
//! Field names serialize in `camelCase` to match the renderer and the
//! persisted scenario format.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{CropType, GrowthStage, WeatherKind};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A point in scene space, serialized as `[x, y, z]`.
///
/// Field outlines lie on the ground plane, so their vertices keep `y == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Vertex(pub f64, pub f64, pub f64);

impl Vertex {
    /// Create a vertex from its three coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self(x, y, z)
    }

    /// Create a vertex on the ground plane.
    pub const fn ground(x: f64, z: f64) -> Self {
        Self(x, 0.0, z)
    }

    /// The x coordinate.
    pub const fn x(&self) -> f64 {
        self.0
    }

    /// The y (height) coordinate.
    pub const fn y(&self) -> f64 {
        self.1
    }

    /// The z coordinate.
    pub const fn z(&self) -> f64 {
        self.2
    }
}

/// Where to put the camera so the whole field is in view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CameraFraming {
    /// Camera position.
    pub position: Vertex,
    /// Point the orbit controls look at.
    pub target: Vertex,
}

/// A single plant to be created by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PlantPlacement {
    /// Ground-plane x coordinate.
    pub x: f64,
    /// Ground-plane z coordinate.
    pub z: f64,
    /// Rotation about the vertical axis in radians.
    pub yaw: f64,
    /// Mature height in scene units.
    pub height: f64,
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

/// A named geographic location that drives location-aware weather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GeoLocation {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Display name.
    pub name: String,
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// Scene styling for one day's weather.
///
/// Colors are `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct WeatherVisuals {
    /// Background sky color.
    pub sky_color: u32,
    /// Exponential fog color.
    pub fog_color: u32,
    /// Exponential fog density.
    pub fog_density: f64,
    /// Directional (sun) light intensity.
    pub light_intensity: f64,
    /// Ambient light intensity.
    pub ambient_intensity: f64,
    /// Number of rain particles to simulate.
    pub rain_particle_count: u32,
    /// Opacity applied to every cloud.
    pub cloud_opacity: f64,
    /// Number of clouds left visible.
    pub cloud_count: u32,
}

/// Synthesized weather for one day. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct WeatherDay {
    /// 1-based position in the sequence.
    pub day_index: u32,
    /// Calendar date.
    pub date: NaiveDate,
    /// Sky condition.
    pub weather_kind: WeatherKind,
    /// Air temperature in degrees Celsius, one decimal.
    pub temperature_c: f64,
    /// Relative humidity in percent.
    pub humidity_pct: u8,
    /// Wind speed in m/s. Only location-aware synthesis produces it.
    pub wind_speed: Option<f64>,
    /// How favorable the day is for growth, in `[0, 1]`.
    pub growth_factor: f64,
}

impl WeatherDay {
    /// Scene styling for this day.
    pub const fn visuals(&self) -> WeatherVisuals {
        self.weather_kind.visuals()
    }
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// A weather day annotated with the crop's development on that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TimelineDay {
    /// The underlying weather record.
    #[serde(flatten)]
    pub weather: WeatherDay,
    /// Cumulative visual development in `[0, 1]`.
    pub growth_percent: f64,
    /// Bucket derived from `growth_percent`.
    pub growth_stage: GrowthStage,
}

/// The full day-by-day simulation for one field.
///
/// `days[i].weather.day_index == i + 1` and dates advance by exactly one
/// calendar day per entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Timeline {
    /// What is planted.
    pub crop_type: CropType,
    /// Field size in hectares.
    pub hectares: f64,
    /// Planting density in percent.
    pub density: u8,
    /// Location that drove the weather, if any.
    pub location: Option<GeoLocation>,
    /// Ordered days.
    pub days: Vec<TimelineDay>,
}

impl Timeline {
    /// Number of days in the timeline.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Whether the timeline has no days.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// The day at a 0-based index.
    pub fn day(&self, index: usize) -> Option<&TimelineDay> {
        self.days.get(index)
    }

    /// 0-based index of the final day, or `None` when empty.
    pub fn last_index(&self) -> Option<usize> {
        self.days.len().checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_day(day_index: u32) -> TimelineDay {
        TimelineDay {
            weather: WeatherDay {
                day_index,
                date: NaiveDate::from_ymd_opt(2025, 3, 20).unwrap_or_default(),
                weather_kind: WeatherKind::Rainy,
                temperature_c: 12.5,
                humidity_pct: 81,
                wind_speed: None,
                growth_factor: 0.55,
            },
            growth_percent: 0.21,
            growth_stage: GrowthStage::Vegetative,
        }
    }

    #[test]
    fn vertex_serializes_as_triple() {
        let json = serde_json::to_string(&Vertex::ground(-50.0, 50.0)).unwrap_or_default();
        assert_eq!(json, "[-50.0,0.0,50.0]");
        let parsed: Vertex = serde_json::from_str("[1, 0, 2]").unwrap_or(Vertex::ground(0.0, 0.0));
        assert!((parsed.x() - 1.0).abs() < f64::EPSILON);
        assert!((parsed.z() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn timeline_day_flattens_weather_fields() {
        let value = serde_json::to_value(sample_day(1)).unwrap_or_default();
        assert_eq!(value["dayIndex"], 1);
        assert_eq!(value["date"], "2025-03-20");
        assert_eq!(value["weatherKind"], "rainy");
        assert_eq!(value["growthStage"], "VEGETATIVE");
        assert!(value["windSpeed"].is_null());
    }

    #[test]
    fn timeline_indexing() {
        let timeline = Timeline {
            crop_type: CropType::Corn,
            hectares: 2.5,
            density: 70,
            location: None,
            days: vec![sample_day(1), sample_day(2)],
        };
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.last_index(), Some(1));
        assert!(timeline.day(2).is_none());

        let empty = Timeline {
            days: Vec::new(),
            ..timeline
        };
        assert!(empty.is_empty());
        assert_eq!(empty.last_index(), None);
    }

    #[test]
    fn day_visuals_follow_kind() {
        let day = sample_day(1);
        assert_eq!(day.weather.visuals(), WeatherKind::Rainy.visuals());
    }
}
