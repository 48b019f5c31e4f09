//! Crop development over a weather sequence.
//!
//! Growth follows a three-segment S-curve over the season ratio
//! `r = day_index / total_days`, modulated by the day's growth factor:
//!
//! | Segment        | Base term                  |
//! |----------------|----------------------------|
//! | `r < 0.2`      | `0.2 + r·0.5`              |
//! | `0.2 ≤ r < 0.7`| `0.3 + (r - 0.2)·1.2`      |
//! | `r ≥ 0.7`      | `0.7 + (r - 0.7)·0.6`      |
//!
//! `growth_percent = clamp(base · (0.8 + growth_factor·0.4), 0, 1)`.
//! Each segment rises on its own, but the third restarts at 0.7, so the
//! base term steps down from 0.9 to 0.7 at `r = 0.7`. The baseline keeps
//! plants visible from day one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use cropsim_types::{CropType, GrowthStage, TimelineDay, WeatherDay};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Smallest rendered plant scale, so seedlings never disappear.
pub const MIN_PLANT_SCALE: f64 = 0.2;

// ---------------------------------------------------------------------------
// Curve
// ---------------------------------------------------------------------------

/// The piecewise S-curve base term for season ratio `r`.
pub fn base_growth(ratio: f64) -> f64 {
    if ratio < 0.2 {
        0.2 + ratio * 0.5
    } else if ratio < 0.7 {
        0.3 + (ratio - 0.2) * 1.2
    } else {
        0.7 + (ratio - 0.7) * 0.6
    }
}

/// Growth percent for one day, in `[0, 1]`.
pub fn growth_percent(day_index: u32, total_days: usize, growth_factor: f64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let ratio = if total_days == 0 {
        0.0
    } else {
        f64::from(day_index) / total_days as f64
    };
    (base_growth(ratio) * (0.8 + growth_factor * 0.4)).clamp(0.0, 1.0)
}

/// Annotate each weather day with the crop's growth percent and stage.
///
/// The output has the same length and order as `weather`.
pub fn build_growth_timeline(weather: Vec<WeatherDay>, crop: CropType) -> Vec<TimelineDay> {
    let total = weather.len();
    let days: Vec<TimelineDay> = weather
        .into_iter()
        .map(|day| {
            let percent = growth_percent(day.day_index, total, day.growth_factor);
            TimelineDay {
                weather: day,
                growth_percent: percent,
                growth_stage: GrowthStage::from_percent(percent),
            }
        })
        .collect();

    debug!(
        crop = %crop,
        days = total,
        final_growth = days.last().map_or(0.0, |d| d.growth_percent),
        "Growth timeline built"
    );
    days
}

// ---------------------------------------------------------------------------
// Plant visuals
// ---------------------------------------------------------------------------

/// How a single plant should be drawn for a given growth percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantVisual {
    /// Uniform scale, never below the configured floor.
    pub scale: f64,
    /// Visibility of crop-specific reproductive parts keyed by child index.
    pub part_visibility: BTreeMap<usize, bool>,
}

/// Compute the plant visual for `crop` at `growth_percent`.
pub fn plant_visual(crop: CropType, growth_percent: f64, min_scale: f64) -> PlantVisual {
    let part_visibility = crop
        .reproductive_parts()
        .iter()
        .map(|part| (part.part_index, growth_percent >= part.min_growth))
        .collect();

    PlantVisual {
        scale: growth_percent.max(min_scale),
        part_visibility,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::float_cmp, clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use cropsim_types::WeatherKind;

    fn weather(count: u32, factor: f64) -> Vec<WeatherDay> {
        let start = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        (1..=count)
            .map(|i| WeatherDay {
                day_index: i,
                date: start + chrono::Days::new(u64::from(i - 1)),
                weather_kind: WeatherKind::Cloudy,
                temperature_c: 18.0,
                humidity_pct: 60,
                wind_speed: None,
                growth_factor: factor,
            })
            .collect()
    }

    #[test]
    fn base_term_rises_within_each_segment() {
        for (start, end) in [(0_u32, 199_u32), (200, 699), (700, 1000)] {
            let mut previous = base_growth(f64::from(start) / 1000.0);
            for step in start + 1..=end {
                let r = f64::from(step) / 1000.0;
                let current = base_growth(r);
                assert!(current >= previous, "base dipped at r={r}");
                previous = current;
            }
        }
    }

    #[test]
    fn segment_boundaries() {
        assert!((base_growth(0.0) - 0.2).abs() < 1e-12);
        assert!((base_growth(0.2) - 0.3).abs() < 1e-12);
        assert!((base_growth(0.699_999) - 0.9).abs() < 1e-5);
        assert!((base_growth(0.7) - 0.7).abs() < 1e-12);
        assert!((base_growth(0.8) - 0.76).abs() < 1e-12);
        assert!((base_growth(1.0) - 0.88).abs() < 1e-12);
    }

    #[test]
    fn constant_weather_steps_down_once_late_in_season() {
        let days = build_growth_timeline(weather(30, 0.5), CropType::Wheat);
        assert_eq!(days.len(), 30);
        // Day 21 is the first with r >= 0.7.
        for (i, pair) in days.windows(2).enumerate() {
            if i == 19 {
                assert!(pair[1].growth_percent < pair[0].growth_percent);
            } else {
                assert!(pair[1].growth_percent >= pair[0].growth_percent - 0.0001);
            }
        }
    }

    #[test]
    fn first_day_is_visible_and_bounded() {
        let days = build_growth_timeline(weather(90, 0.0), CropType::Corn);
        assert!(days[0].growth_percent >= 0.16);
        for day in &days {
            assert!((0.0..=1.0).contains(&day.growth_percent));
            assert_eq!(day.growth_stage, GrowthStage::from_percent(day.growth_percent));
        }
    }

    #[test]
    fn ideal_weather_saturates() {
        let days = build_growth_timeline(weather(10, 1.0), CropType::Rice);
        assert_eq!(days[9].growth_percent, 1.0);
        assert_eq!(days[9].growth_stage, GrowthStage::Mature);
    }

    #[test]
    fn empty_weather_yields_empty_timeline() {
        assert!(build_growth_timeline(Vec::new(), CropType::Soybean).is_empty());
    }

    #[test]
    fn scale_has_floor() {
        assert_eq!(plant_visual(CropType::Wheat, 0.05, MIN_PLANT_SCALE).scale, 0.2);
        assert_eq!(plant_visual(CropType::Wheat, 0.75, MIN_PLANT_SCALE).scale, 0.75);
    }

    #[test]
    fn corn_parts_appear_by_growth() {
        let early = plant_visual(CropType::Corn, 0.5, MIN_PLANT_SCALE);
        assert_eq!(early.part_visibility.get(&2), Some(&false));
        assert_eq!(early.part_visibility.get(&3), Some(&false));

        let mid = plant_visual(CropType::Corn, 0.6, MIN_PLANT_SCALE);
        assert_eq!(mid.part_visibility.get(&2), Some(&true));
        assert_eq!(mid.part_visibility.get(&3), Some(&false));

        let late = plant_visual(CropType::Corn, 0.9, MIN_PLANT_SCALE);
        assert_eq!(late.part_visibility.get(&3), Some(&true));
    }

    #[test]
    fn other_crops_have_no_parts() {
        assert!(plant_visual(CropType::Cotton, 0.95, MIN_PLANT_SCALE).part_visibility.is_empty());
    }
}
