//! Procedural weather synthesis.
//!
//! Produces an ordered sequence of [`WeatherDay`] records starting at a given
//! date, one calendar day apart. Two interchangeable modes share the output
//! shape:
//!
//! - **Seasonal** -- no location. The season comes from the calendar month
//!   (northern mapping). Weather persists from the previous day 70% of the
//!   time, drifting at most one step along the fair-to-foul ranking;
//!   otherwise it is drawn from the season's weight table.
//! - **Historical** -- latitude aware. Seasons flip in the southern
//!   hemisphere and the base temperature falls off with `|latitude|`. A fresh
//!   pattern is drawn on the first day and with 30% probability afterwards;
//!   a persisting pattern changes to a random non-stormy kind 20% of the time.
//!   Only this mode reports wind speed and clamps humidity to `[10, 100]`.
//!
//! # Seasonal weights
//!
//! | Kind         | Spring | Summer | Fall | Winter | Historical |
//! |--------------|--------|--------|------|--------|------------|
//! | Sunny        | 30     | 50     | 40   | 20     | 40         |
//! | PartlyCloudy | 30     | 30     | 30   | 30     | 30         |
//! | Cloudy       | 15     | 15     | 25   | 30     | 15         |
//! | Rainy        | 20     | 10     | 15   | 10     | 10         |
//! | Stormy       | 5      | 5      | 5    | 5      | 5          |
//!
//! Weights are sampled proportionally to their total. All randomness comes
//! from the caller's RNG, so a seeded RNG reproduces a timeline exactly.

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use tracing::debug;

use cropsim_types::{GeoLocation, Hemisphere, Season, WeatherDay, WeatherKind};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Chance that seasonal weather drifts from the previous day instead of
/// being redrawn.
const SEASONAL_PERSISTENCE: f64 = 0.7;

/// Chance that location-aware weather starts a fresh pattern.
const HISTORICAL_FRESH_PATTERN: f64 = 0.3;

/// Chance that a persisting location-aware pattern changes anyway.
const HISTORICAL_DRIFT: f64 = 0.2;

/// Optimal growing temperature for seasonal synthesis.
pub const SEASONAL_OPTIMUM_C: f64 = 22.0;

/// Optimal growing temperature for location-aware synthesis.
pub const HISTORICAL_OPTIMUM_C: f64 = 20.0;

/// Humidity at which moisture stops limiting growth.
const SATURATION_HUMIDITY: f64 = 70.0;

/// Half-width of the uniform temperature noise in degrees Celsius.
const TEMPERATURE_NOISE: f64 = 2.0;

/// Half-width of the uniform humidity noise in percent.
const HUMIDITY_NOISE: f64 = 5.0;

/// Most days reserved up front; longer runs grow the buffer as they go.
const MAX_PREALLOCATED_DAYS: usize = 3660;

// ---------------------------------------------------------------------------
// Weight tables
// ---------------------------------------------------------------------------

/// A weighted distribution over weather kinds.
#[derive(Debug, Clone)]
pub struct SeasonWeights {
    /// `(kind, weight)` entries in ordinal order.
    entries: [(WeatherKind, u32); 5],
}

impl SeasonWeights {
    /// Weights for seasonal synthesis.
    pub const fn for_season(season: Season) -> Self {
        let [sunny, partly, cloudy, rainy, stormy] = match season {
            Season::Spring => [30, 30, 15, 20, 5],
            Season::Summer => [50, 30, 15, 10, 5],
            Season::Fall => [40, 30, 25, 15, 5],
            Season::Winter => [20, 30, 30, 10, 5],
        };
        Self::from_weights(sunny, partly, cloudy, rainy, stormy)
    }

    /// Season-independent weights used when a location-aware pattern starts.
    pub const fn unconditional() -> Self {
        Self::from_weights(40, 30, 15, 10, 5)
    }

    const fn from_weights(sunny: u32, partly: u32, cloudy: u32, rainy: u32, stormy: u32) -> Self {
        Self {
            entries: [
                (WeatherKind::Sunny, sunny),
                (WeatherKind::PartlyCloudy, partly),
                (WeatherKind::Cloudy, cloudy),
                (WeatherKind::Rainy, rainy),
                (WeatherKind::Stormy, stormy),
            ],
        }
    }

    /// Select the kind whose cumulative weight first exceeds `roll`.
    fn select(&self, roll: u32) -> WeatherKind {
        let mut cumulative: u32 = 0;
        for &(kind, weight) in &self.entries {
            cumulative = cumulative.saturating_add(weight);
            if roll < cumulative {
                return kind;
            }
        }
        WeatherKind::Sunny
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> u32 {
        self.entries
            .iter()
            .fold(0_u32, |total, &(_, weight)| total.saturating_add(weight))
    }

    /// Draw a kind proportionally to the weights.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> WeatherKind {
        let total = self.total_weight();
        if total == 0 {
            return WeatherKind::Sunny;
        }
        self.select(rng.random_range(0..total))
    }
}

// ---------------------------------------------------------------------------
// Per-kind and per-season lookups
// ---------------------------------------------------------------------------

const fn seasonal_base_temperature(season: Season) -> f64 {
    match season {
        Season::Spring => 15.0,
        Season::Summer => 25.0,
        Season::Fall => 18.0,
        Season::Winter => 5.0,
    }
}

const fn seasonal_temperature_modifier(kind: WeatherKind) -> f64 {
    match kind {
        WeatherKind::Sunny => 5.0,
        WeatherKind::PartlyCloudy => 2.0,
        WeatherKind::Cloudy => 0.0,
        WeatherKind::Rainy => -3.0,
        WeatherKind::Stormy => -5.0,
    }
}

const fn seasonal_humidity_base(kind: WeatherKind) -> f64 {
    match kind {
        WeatherKind::Sunny => 30.0,
        WeatherKind::PartlyCloudy => 45.0,
        WeatherKind::Cloudy => 60.0,
        WeatherKind::Rainy => 80.0,
        WeatherKind::Stormy => 90.0,
    }
}

const fn historical_season_delta(season: Season) -> f64 {
    match season {
        Season::Spring => 5.0,
        Season::Summer => 10.0,
        Season::Fall => 2.0,
        Season::Winter => -5.0,
    }
}

const fn historical_temperature_modifier(kind: WeatherKind) -> f64 {
    match kind {
        WeatherKind::Sunny => 3.0,
        WeatherKind::PartlyCloudy => 1.0,
        WeatherKind::Cloudy => -1.0,
        WeatherKind::Rainy => -3.0,
        WeatherKind::Stormy => -5.0,
    }
}

const fn historical_humidity_base(kind: WeatherKind) -> f64 {
    match kind {
        WeatherKind::Sunny => 40.0,
        WeatherKind::PartlyCloudy => 50.0,
        WeatherKind::Cloudy => 65.0,
        WeatherKind::Rainy => 80.0,
        WeatherKind::Stormy => 90.0,
    }
}

const fn wind_multiplier(kind: WeatherKind) -> f64 {
    match kind {
        WeatherKind::Sunny => 0.8,
        WeatherKind::PartlyCloudy => 1.0,
        WeatherKind::Cloudy => 1.2,
        WeatherKind::Rainy => 1.5,
        WeatherKind::Stormy => 2.5,
    }
}

// ---------------------------------------------------------------------------
// Growth factor
// ---------------------------------------------------------------------------

/// How favorable a day is for growth, in `[0, 1]`.
///
/// `0.4·temp + 0.3·sun + 0.3·moisture` where
/// `temp = 1 - |optimum - temperature| / optimum`,
/// `sun` is [`WeatherKind::sun_factor`], and
/// `moisture = min(1, humidity / 70)`.
pub fn growth_factor(temperature_c: f64, kind: WeatherKind, humidity_pct: u8, optimum_c: f64) -> f64 {
    let temp_factor = 1.0 - (optimum_c - temperature_c).abs() / optimum_c;
    let moisture_factor = (f64::from(humidity_pct) / SATURATION_HUMIDITY).min(1.0);
    (0.4 * temp_factor + 0.3 * kind.sun_factor() + 0.3 * moisture_factor).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Which synthesis strategy to use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeatherMode {
    /// Location-agnostic, northern-hemisphere seasons.
    Seasonal,
    /// Latitude-aware synthesis.
    Historical {
        /// Latitude in decimal degrees.
        latitude: f64,
        /// Longitude in decimal degrees.
        longitude: f64,
    },
}

/// Weather sequence generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherGenerator {
    mode: WeatherMode,
}

impl WeatherGenerator {
    /// Generator for location-agnostic seasonal weather.
    pub const fn seasonal() -> Self {
        Self {
            mode: WeatherMode::Seasonal,
        }
    }

    /// Generator for weather at a coordinate.
    pub const fn historical(latitude: f64, longitude: f64) -> Self {
        Self {
            mode: WeatherMode::Historical {
                latitude,
                longitude,
            },
        }
    }

    /// Historical mode when a location is known, seasonal otherwise.
    pub const fn for_location(location: Option<&GeoLocation>) -> Self {
        match location {
            Some(loc) => Self::historical(loc.latitude, loc.longitude),
            None => Self::seasonal(),
        }
    }

    /// The active strategy.
    pub const fn mode(&self) -> WeatherMode {
        self.mode
    }

    /// Generate `days` consecutive days starting at `start`.
    ///
    /// Returns an empty sequence when `days <= 0`.
    pub fn generate<R: Rng + ?Sized>(&self, start: NaiveDate, days: i64, rng: &mut R) -> Vec<WeatherDay> {
        let count = u32::try_from(days.max(0)).unwrap_or(u32::MAX);
        let mut out: Vec<WeatherDay> = Vec::with_capacity(preallocation(count));
        let mut date = start;
        let mut previous: Option<WeatherKind> = None;

        for day_index in 1..=count {
            let day = match self.mode {
                WeatherMode::Seasonal => seasonal_day(day_index, date, previous, rng),
                WeatherMode::Historical { latitude, .. } => {
                    historical_day(day_index, date, latitude, previous, rng)
                }
            };
            previous = Some(day.weather_kind);
            out.push(day);

            let Some(next) = date.succ_opt() else {
                break;
            };
            date = next;
        }

        debug!(
            mode = ?self.mode,
            %start,
            days = out.len(),
            rainy_days = out
                .iter()
                .filter(|d| matches!(d.weather_kind, WeatherKind::Rainy | WeatherKind::Stormy))
                .count(),
            "Weather generated"
        );
        out
    }
}

/// Move at most one step along the ordinal ranking, uniformly among the
/// reachable kinds (including staying put).
fn drift_one_step<R: Rng + ?Sized>(previous: WeatherKind, rng: &mut R) -> WeatherKind {
    let ordinal = previous.ordinal();
    let low = ordinal.saturating_sub(1);
    let high = ordinal.saturating_add(1).min(WeatherKind::Stormy.ordinal());
    WeatherKind::from_ordinal(rng.random_range(low..=high)).unwrap_or(previous)
}

fn seasonal_day<R: Rng + ?Sized>(
    day_index: u32,
    date: NaiveDate,
    previous: Option<WeatherKind>,
    rng: &mut R,
) -> WeatherDay {
    let season = Season::from_month(date.month());

    let kind = match previous {
        Some(prev) if rng.random_bool(SEASONAL_PERSISTENCE) => drift_one_step(prev, rng),
        _ => SeasonWeights::for_season(season).sample(rng),
    };

    let temperature = round_tenth(
        seasonal_base_temperature(season)
            + seasonal_temperature_modifier(kind)
            + rng.random_range(-TEMPERATURE_NOISE..=TEMPERATURE_NOISE),
    );
    let humidity = to_percent(
        seasonal_humidity_base(kind) + rng.random_range(-HUMIDITY_NOISE..=HUMIDITY_NOISE),
        0.0,
    );

    WeatherDay {
        day_index,
        date,
        weather_kind: kind,
        temperature_c: temperature,
        humidity_pct: humidity,
        wind_speed: None,
        growth_factor: growth_factor(temperature, kind, humidity, SEASONAL_OPTIMUM_C),
    }
}

/// Capacity to reserve for `count` days.
fn preallocation(count: u32) -> usize {
    usize::try_from(count).map_or(MAX_PREALLOCATED_DAYS, |c| c.min(MAX_PREALLOCATED_DAYS))
}

/// Light seasonal skew applied to a freshly drawn location-aware pattern.
///
/// The summer rule (`PartlyCloudy` to `Sunny` at 25 %) is a deliberate
/// addition so that summer favours clear skies; the other two rules carry
/// over the established winter and spring behaviour.
fn seasonal_skew<R: Rng + ?Sized>(kind: WeatherKind, season: Season, rng: &mut R) -> WeatherKind {
    match (season, kind) {
        (Season::Summer, WeatherKind::PartlyCloudy) if rng.random_bool(0.25) => WeatherKind::Sunny,
        (Season::Spring, WeatherKind::PartlyCloudy) if rng.random_bool(0.4) => WeatherKind::Rainy,
        (Season::Winter, WeatherKind::Sunny) if rng.random_bool(0.5) => WeatherKind::Cloudy,
        _ => kind,
    }
}

fn historical_day<R: Rng + ?Sized>(
    day_index: u32,
    date: NaiveDate,
    latitude: f64,
    previous: Option<WeatherKind>,
    rng: &mut R,
) -> WeatherDay {
    let season = Season::for_hemisphere(date.month(), Hemisphere::from_latitude(latitude));
    let base_temperature = 20.0 - latitude.abs() * 0.4 + historical_season_delta(season);

    let kind = match previous {
        Some(prev) if !rng.random_bool(HISTORICAL_FRESH_PATTERN) => {
            if rng.random_bool(HISTORICAL_DRIFT) {
                let pick = rng.random_range(0..WeatherKind::NON_STORMY.len());
                WeatherKind::NON_STORMY.get(pick).copied().unwrap_or(prev)
            } else {
                prev
            }
        }
        _ => seasonal_skew(SeasonWeights::unconditional().sample(rng), season, rng),
    };

    let temperature = round_tenth(
        base_temperature
            + historical_temperature_modifier(kind)
            + rng.random_range(-TEMPERATURE_NOISE..=TEMPERATURE_NOISE),
    );
    let humidity = to_percent(
        historical_humidity_base(kind) + rng.random_range(-HUMIDITY_NOISE..=HUMIDITY_NOISE),
        10.0,
    );
    let wind = round_tenth((2.0 + rng.random_range(0.0..3.0)) * wind_multiplier(kind));

    WeatherDay {
        day_index,
        date,
        weather_kind: kind,
        temperature_c: temperature,
        humidity_pct: humidity,
        wind_speed: Some(wind),
        growth_factor: growth_factor(temperature, kind, humidity, HISTORICAL_OPTIMUM_C),
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to a whole percent clamped to `[floor, 100]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_percent(value: f64, floor: f64) -> u8 {
    value.round().clamp(floor, 100.0) as u8
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
