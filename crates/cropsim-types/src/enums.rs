//! Enumeration types for the crop growth simulation.
//!
//! Every closed categorical variable in the data model lives here: weather
//! kinds, seasons, hemispheres, growth stages, and the crop catalogue. Lookup
//! tables keyed by these enums are written as exhaustive `match` expressions
//! so that adding a variant is a compile error at every lookup site.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::structs::WeatherVisuals;

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// The sky condition for one simulated day.
///
/// Variants are declared in their ordinal ranking from fairest to foulest.
/// Day-to-day persistence moves at most one step along this ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum WeatherKind {
    /// Clear sky, strongest light.
    Sunny,
    /// Scattered clouds.
    PartlyCloudy,
    /// Overcast.
    Cloudy,
    /// Steady rain.
    Rainy,
    /// Thunderstorm with heavy rain and wind.
    Stormy,
}

impl WeatherKind {
    /// All weather kinds in ordinal order.
    pub const ALL: [Self; 5] = [
        Self::Sunny,
        Self::PartlyCloudy,
        Self::Cloudy,
        Self::Rainy,
        Self::Stormy,
    ];

    /// The four kinds a persisting weather pattern may drift into.
    pub const NON_STORMY: [Self; 4] = [Self::Sunny, Self::PartlyCloudy, Self::Cloudy, Self::Rainy];

    /// Position of this kind in the fair-to-foul ranking.
    pub const fn ordinal(self) -> usize {
        match self {
            Self::Sunny => 0,
            Self::PartlyCloudy => 1,
            Self::Cloudy => 2,
            Self::Rainy => 3,
            Self::Stormy => 4,
        }
    }

    /// Inverse of [`ordinal`](Self::ordinal).
    pub const fn from_ordinal(ordinal: usize) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Sunny),
            1 => Some(Self::PartlyCloudy),
            2 => Some(Self::Cloudy),
            3 => Some(Self::Rainy),
            4 => Some(Self::Stormy),
            _ => None,
        }
    }

    /// Sunlight contribution to the daily growth factor.
    pub const fn sun_factor(self) -> f64 {
        match self {
            Self::Sunny => 1.0,
            Self::PartlyCloudy => 0.8,
            Self::Cloudy => 0.6,
            Self::Rainy => 0.4,
            Self::Stormy => 0.3,
        }
    }

    /// Scene styling pushed to the renderer for a day of this kind.
    pub const fn visuals(self) -> WeatherVisuals {
        match self {
            Self::Sunny => WeatherVisuals {
                sky_color: 0x0087_ceeb,
                fog_color: 0x00d7_f0ff,
                fog_density: 0.0025,
                light_intensity: 1.0,
                ambient_intensity: 0.6,
                rain_particle_count: 0,
                cloud_opacity: 0.8,
                cloud_count: 10,
            },
            Self::PartlyCloudy => WeatherVisuals {
                sky_color: 0x0087_ceeb,
                fog_color: 0x00d7_f0ff,
                fog_density: 0.003,
                light_intensity: 0.8,
                ambient_intensity: 0.5,
                rain_particle_count: 0,
                cloud_opacity: 0.9,
                cloud_count: 20,
            },
            Self::Cloudy => WeatherVisuals {
                sky_color: 0x00a3_b5c7,
                fog_color: 0x00c7_c7c7,
                fog_density: 0.004,
                light_intensity: 0.6,
                ambient_intensity: 0.4,
                rain_particle_count: 0,
                cloud_opacity: 1.0,
                cloud_count: 30,
            },
            Self::Rainy => WeatherVisuals {
                sky_color: 0x0070_8090,
                fog_color: 0x00a3_a3a3,
                fog_density: 0.006,
                light_intensity: 0.5,
                ambient_intensity: 0.3,
                rain_particle_count: 1000,
                cloud_opacity: 1.0,
                cloud_count: 35,
            },
            Self::Stormy => WeatherVisuals {
                sky_color: 0x004a_5259,
                fog_color: 0x007a_7a7a,
                fog_density: 0.008,
                light_intensity: 0.4,
                ambient_intensity: 0.2,
                rain_particle_count: 2000,
                cloud_opacity: 1.0,
                cloud_count: 40,
            },
        }
    }

    /// Map an `OpenWeatherMap` condition code to a weather kind.
    ///
    /// Snow (6xx) has no kind of its own and is reported as rain.
    pub const fn from_condition_code(code: u16) -> Self {
        match code {
            200..=299 => Self::Stormy,
            300..=699 => Self::Rainy,
            700..=799 | 803..=899 => Self::Cloudy,
            800 => Self::Sunny,
            _ => Self::PartlyCloudy,
        }
    }
}

// ---------------------------------------------------------------------------
// Seasons
// ---------------------------------------------------------------------------

/// Which side of the equator a location lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Hemisphere {
    /// Strictly positive latitude.
    Northern,
    /// Zero or negative latitude.
    Southern,
}

impl Hemisphere {
    /// Classify a latitude. The equator counts as southern.
    pub fn from_latitude(latitude: f64) -> Self {
        if latitude > 0.0 {
            Self::Northern
        } else {
            Self::Southern
        }
    }
}

/// A meteorological season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Season {
    /// March to May in the northern hemisphere.
    Spring,
    /// June to August in the northern hemisphere.
    Summer,
    /// September to November in the northern hemisphere.
    Fall,
    /// December to February in the northern hemisphere.
    Winter,
}

impl Season {
    /// Season for a 1-based calendar month using the northern mapping.
    pub const fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            9..=11 => Self::Fall,
            _ => Self::Winter,
        }
    }

    /// Season for a 1-based calendar month on the given hemisphere.
    ///
    /// The southern hemisphere is shifted by six months.
    pub const fn for_hemisphere(month: u32, hemisphere: Hemisphere) -> Self {
        let northern = Self::from_month(month);
        match hemisphere {
            Hemisphere::Northern => northern,
            Hemisphere::Southern => northern.opposite(),
        }
    }

    /// The season six months away.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Spring => Self::Fall,
            Self::Summer => Self::Winter,
            Self::Fall => Self::Spring,
            Self::Winter => Self::Summer,
        }
    }
}

// ---------------------------------------------------------------------------
// Growth stages
// ---------------------------------------------------------------------------

/// Coarse development bucket derived from a growth percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum GrowthStage {
    /// Below 20% growth.
    Seedling,
    /// 20% up to 60% growth.
    Vegetative,
    /// 60% up to 90% growth.
    Reproductive,
    /// 90% growth and above.
    Mature,
}

impl GrowthStage {
    /// Upper bound (exclusive) of the seedling stage.
    pub const SEEDLING_LIMIT: f64 = 0.2;
    /// Upper bound (exclusive) of the vegetative stage.
    pub const VEGETATIVE_LIMIT: f64 = 0.6;
    /// Upper bound (exclusive) of the reproductive stage.
    pub const REPRODUCTIVE_LIMIT: f64 = 0.9;

    /// Classify a growth percentage in `[0, 1]`.
    pub fn from_percent(growth_percent: f64) -> Self {
        if growth_percent < Self::SEEDLING_LIMIT {
            Self::Seedling
        } else if growth_percent < Self::VEGETATIVE_LIMIT {
            Self::Vegetative
        } else if growth_percent < Self::REPRODUCTIVE_LIMIT {
            Self::Reproductive
        } else {
            Self::Mature
        }
    }

    /// Upper-case label used by the UI.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Seedling => "SEEDLING",
            Self::Vegetative => "VEGETATIVE",
            Self::Reproductive => "REPRODUCTIVE",
            Self::Mature => "MATURE",
        }
    }
}

// ---------------------------------------------------------------------------
// Crops
// ---------------------------------------------------------------------------

/// A child mesh of a plant that only appears past a growth threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReproductivePart {
    /// Index of the part among the plant model's children.
    pub part_index: usize,
    /// Growth percentage at which the part becomes visible.
    pub min_growth: f64,
}

const CORN_PARTS: [ReproductivePart; 2] = [
    // primary cob
    ReproductivePart {
        part_index: 2,
        min_growth: 0.6,
    },
    // secondary cob
    ReproductivePart {
        part_index: 3,
        min_growth: 0.85,
    },
];

/// A crop the simulation can plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum CropType {
    /// Maize.
    Corn,
    /// Wheat.
    Wheat,
    /// Soybean.
    Soybean,
    /// Cotton.
    Cotton,
    /// Paddy rice.
    Rice,
}

impl CropType {
    /// All crops in the catalogue.
    pub const ALL: [Self; 5] = [Self::Corn, Self::Wheat, Self::Soybean, Self::Cotton, Self::Rice];

    /// Parse the lower-case crop name used in scenario files.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|crop| crop.name() == name)
    }

    /// Lower-case crop name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Corn => "corn",
            Self::Wheat => "wheat",
            Self::Soybean => "soybean",
            Self::Cotton => "cotton",
            Self::Rice => "rice",
        }
    }

    /// Plants per hectare before the density percentage is applied.
    ///
    /// These are a tenth of agronomic densities.
    pub const fn plants_per_hectare(self) -> f64 {
        match self {
            Self::Corn | Self::Cotton => 7_000.0,
            Self::Wheat => 22_000.0,
            Self::Soybean => 36_000.0,
            Self::Rice => 20_000.0,
        }
    }

    /// Height of a mature plant in metres.
    pub const fn mature_height_m(self) -> f64 {
        match self {
            Self::Corn => 10.0,
            Self::Wheat | Self::Rice => 1.0,
            Self::Soybean => 0.9,
            Self::Cotton => 1.2,
        }
    }

    /// Parts that are hidden until the plant reaches a growth threshold.
    pub fn reproductive_parts(self) -> &'static [ReproductivePart] {
        match self {
            Self::Corn => &CORN_PARTS,
            Self::Wheat | Self::Soybean | Self::Cotton | Self::Rice => &[],
        }
    }
}

impl core::fmt::Display for CropType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_round_trips() {
        for kind in WeatherKind::ALL {
            assert_eq!(WeatherKind::from_ordinal(kind.ordinal()), Some(kind));
        }
        assert_eq!(WeatherKind::from_ordinal(5), None);
    }

    #[test]
    fn sun_factor_decreases_with_ordinal() {
        let factors: Vec<f64> = WeatherKind::ALL.iter().map(|k| k.sun_factor()).collect();
        assert!(factors.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn only_wet_kinds_have_rain() {
        assert_eq!(WeatherKind::Sunny.visuals().rain_particle_count, 0);
        assert_eq!(WeatherKind::Cloudy.visuals().rain_particle_count, 0);
        assert_eq!(WeatherKind::Rainy.visuals().rain_particle_count, 1000);
        assert_eq!(WeatherKind::Stormy.visuals().rain_particle_count, 2000);
    }

    #[test]
    fn condition_codes_map_to_kinds() {
        assert_eq!(WeatherKind::from_condition_code(211), WeatherKind::Stormy);
        assert_eq!(WeatherKind::from_condition_code(501), WeatherKind::Rainy);
        assert_eq!(WeatherKind::from_condition_code(601), WeatherKind::Rainy);
        assert_eq!(WeatherKind::from_condition_code(741), WeatherKind::Cloudy);
        assert_eq!(WeatherKind::from_condition_code(800), WeatherKind::Sunny);
        assert_eq!(WeatherKind::from_condition_code(802), WeatherKind::PartlyCloudy);
        assert_eq!(WeatherKind::from_condition_code(804), WeatherKind::Cloudy);
        assert_eq!(WeatherKind::from_condition_code(42), WeatherKind::PartlyCloudy);
    }

    #[test]
    fn northern_seasons_follow_months() {
        assert_eq!(Season::from_month(1), Season::Winter);
        assert_eq!(Season::from_month(3), Season::Spring);
        assert_eq!(Season::from_month(7), Season::Summer);
        assert_eq!(Season::from_month(10), Season::Fall);
        assert_eq!(Season::from_month(12), Season::Winter);
    }

    #[test]
    fn southern_seasons_are_shifted() {
        assert_eq!(Season::for_hemisphere(7, Hemisphere::Southern), Season::Winter);
        assert_eq!(Season::for_hemisphere(1, Hemisphere::Southern), Season::Summer);
        assert_eq!(Season::for_hemisphere(4, Hemisphere::Southern), Season::Fall);
        assert_eq!(Season::for_hemisphere(4, Hemisphere::Northern), Season::Spring);
    }

    #[test]
    fn equator_is_southern() {
        assert_eq!(Hemisphere::from_latitude(0.0), Hemisphere::Southern);
        assert_eq!(Hemisphere::from_latitude(0.1), Hemisphere::Northern);
        assert_eq!(Hemisphere::from_latitude(-12.9), Hemisphere::Southern);
    }

    #[test]
    fn growth_stage_boundaries() {
        assert_eq!(GrowthStage::from_percent(0.0), GrowthStage::Seedling);
        assert_eq!(GrowthStage::from_percent(0.199), GrowthStage::Seedling);
        assert_eq!(GrowthStage::from_percent(0.2), GrowthStage::Vegetative);
        assert_eq!(GrowthStage::from_percent(0.599), GrowthStage::Vegetative);
        assert_eq!(GrowthStage::from_percent(0.6), GrowthStage::Reproductive);
        assert_eq!(GrowthStage::from_percent(0.899), GrowthStage::Reproductive);
        assert_eq!(GrowthStage::from_percent(0.9), GrowthStage::Mature);
        assert_eq!(GrowthStage::from_percent(1.0), GrowthStage::Mature);
    }

    #[test]
    fn growth_stage_is_monotonic() {
        let mut previous = GrowthStage::Seedling;
        for step in 0_u32..=1000 {
            let stage = GrowthStage::from_percent(f64::from(step) / 1000.0);
            assert!(stage >= previous, "stage went backwards at step {step}");
            previous = stage;
        }
    }

    #[test]
    fn crop_names_round_trip() {
        for crop in CropType::ALL {
            assert_eq!(CropType::from_name(crop.name()), Some(crop));
        }
        assert_eq!(CropType::from_name("barley"), None);
    }

    #[test]
    fn only_corn_has_hidden_parts() {
        assert_eq!(CropType::Corn.reproductive_parts().len(), 2);
        assert!(CropType::Wheat.reproductive_parts().is_empty());
    }

    #[test]
    fn serde_names_match_scenario_format() {
        let json = serde_json::to_string(&WeatherKind::PartlyCloudy).unwrap_or_default();
        assert_eq!(json, "\"partly_cloudy\"");
        let json = serde_json::to_string(&GrowthStage::Reproductive).unwrap_or_default();
        assert_eq!(json, "\"REPRODUCTIVE\"");
        let json = serde_json::to_string(&CropType::Soybean).unwrap_or_default();
        assert_eq!(json, "\"soybean\"");
    }
}
