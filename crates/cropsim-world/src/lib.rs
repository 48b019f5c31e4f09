//! Field geometry, weather synthesis, and growth curves for the crop growth
//! simulation.
//!
//! Everything in this crate is synchronous and side-effect free apart from
//! `debug!` events. Randomness always comes from a caller-supplied RNG, so a
//! seeded RNG reproduces fields and timelines exactly.
//!
//! # Modules
//!
//! - [`error`] -- Validation errors for field outlines.
//! - [`field`] -- Polygon area, hectare scaling with view clamps, fan
//!   triangulation, and uniform sampling inside triangles.
//! - [`weather`] -- Seasonal and location-aware weather sequences with the
//!   shared growth-factor formula.
//! - [`growth`] -- The S-curve growth timeline and per-plant visuals.
//! - [`placement`] -- Plant counts, plant scattering, and camera framing.

pub mod error;
pub mod field;
pub mod growth;
pub mod placement;
pub mod weather;

// Re-export primary types at crate root.
pub use error::FieldError;
pub use field::{
    Bounds, FieldLimits, FieldPolygon, MAX_FIELD_DIMENSION, MIN_FIELD_DIMENSION, SCALE_FACTOR,
    ScaleCorrection, ScaledPolygon, Triangle, polygon_area, sample_point_in_triangle,
    scale_to_hectares, scale_to_hectares_with, triangulate,
};
pub use growth::{
    MIN_PLANT_SCALE, PlantVisual, base_growth, build_growth_timeline, growth_percent, plant_visual,
};
pub use placement::{PLANT_COUNT_SCALE, frame_camera, place_plants, plant_count};
pub use weather::{SeasonWeights, WeatherGenerator, WeatherMode, growth_factor};
