//! Configuration, scenarios, simulation construction, and timeline playback
//! for the crop growth simulation.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `cropsim-config.yaml` into
//!   strongly-typed structs.
//! - [`scenario`] -- The persisted JSON scenario format and its validation.
//! - [`location`] -- [`Geocoder`] trait and location naming with a
//!   coordinate fallback.
//! - [`simulation`] -- Scene construction through [`SceneBuilder`] and
//!   timeline creation.
//! - [`controller`] -- The [`TimelineController`] playback state machine.
//! - [`runner`] -- The async playback driver.
//!
//! [`Geocoder`]: location::Geocoder
//! [`SceneBuilder`]: simulation::SceneBuilder
//! [`TimelineController`]: controller::TimelineController

pub mod config;
pub mod controller;
pub mod location;
pub mod runner;
pub mod scenario;
pub mod simulation;

pub use config::{ConfigError, CropSimConfig};
pub use controller::{
    ControllerError, ControllerSettings, DaySnapshot, PlaybackState, SceneCollaborator,
    TimelineController,
};
pub use location::{GeocodeError, Geocoder, Place, resolve_location};
pub use runner::{PlaybackCommand, PlaybackOptions, PlaybackOutcome, run_playback};
pub use scenario::{Scenario, ScenarioError, WeatherSettings};
pub use simulation::{
    BuiltSimulation, ConstructionError, SceneBuilder, ViewportComponent, construct_simulation,
    create_crop_timeline,
};
