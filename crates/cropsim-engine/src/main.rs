//! Headless engine for the crop growth simulation.
//!
//! Loads configuration and a scenario, builds the field against a logging
//! scene, generates the day-by-day timeline, and plays it back until the last
//! day (or until interrupted).
//!
//! # Usage
//!
//! ```text
//! cropsim-engine [scenario.json]
//! ```
//!
//! Without a scenario path the built-in demo scenario is used. The config
//! file is `cropsim-config.yaml` in the working directory, or the path in
//! `CROPSIM_CONFIG`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration
//! 2. Initialize structured logging (tracing)
//! 3. Load the scenario
//! 4. Name the location through reverse geocoding, if enabled
//! 5. Log live conditions, if requested
//! 6. Build the scene
//! 7. Generate the timeline
//! 8. Play the timeline back

mod error;
mod log_scene;
mod openweather;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cropsim_core::config::CropSimConfig;
use cropsim_core::location::{Geocoder, fallback_name, resolve_location};
use cropsim_core::runner::{PlaybackCommand, PlaybackOptions, run_playback};
use cropsim_core::{
    ControllerSettings, Scenario, TimelineController, construct_simulation, create_crop_timeline,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::log_scene::LogScene;
use crate::openweather::OpenWeatherClient;

/// Default configuration file name.
const CONFIG_FILE: &str = "cropsim-config.yaml";

/// Environment variable overriding the configuration path.
const CONFIG_ENV: &str = "CROPSIM_CONFIG";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, the scenario, or scene construction
/// fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = std::env::var(CONFIG_ENV).map_or_else(|_| PathBuf::from(CONFIG_FILE), PathBuf::from);
    let config = load_config(&config_path)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.logging.level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!(
        config = %config_path.display(),
        seed = config.simulation.seed,
        total_days = config.simulation.total_days,
        start_date = %config.simulation.start_date,
        base_interval_ms = config.playback.base_interval_ms,
        "cropsim-engine starting"
    );

    // 3. Load the scenario.
    let mut scenario = match std::env::args().nth(1) {
        Some(path) => load_scenario(&path)?,
        None => {
            info!("No scenario given, using the demo scenario");
            Scenario::demo()?
        }
    };
    info!(
        crop = %scenario.crop_type,
        hectares = scenario.hectares,
        density = scenario.density,
        vertices = scenario.polygon.len(),
        location = scenario.location.as_ref().map(|l| l.name.as_str()),
        "Scenario loaded"
    );

    // 4-5. Location naming and live conditions.
    let client = OpenWeatherClient::for_lookups(
        &config.geocoding,
        scenario.weather_settings.api_key.as_deref(),
    )?;
    if let Some(client) = client {
        enrich_location(&client, &mut scenario).await;
        if scenario.weather_settings.use_real_weather {
            log_current_conditions(&client, &scenario).await;
        }
    } else {
        info!("No weather API key configured, skipping lookups");
    }

    let mut rng = config
        .simulation
        .seed
        .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

    // 6. Build the scene.
    let mut scene = LogScene::new();
    let built = construct_simulation(&scenario, &config.field, &mut scene, &mut rng)
        .map_err(EngineError::from)?;

    // 7. Generate the timeline.
    let timeline = create_crop_timeline(
        &scenario,
        config.simulation.start_date,
        i64::from(config.simulation.total_days),
        &mut rng,
    );

    // 8. Play it back.
    let settings = ControllerSettings::from_config(&config.playback, &config.field);
    let mut controller = TimelineController::new(Arc::new(timeline), built.plants, scene, &settings)
        .map_err(EngineError::from)?;

    let (commands_tx, mut commands_rx) = mpsc::channel(16);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping playback");
            request_dispose(&commands_tx).await;
        }
    });

    if config.playback.autoplay {
        controller.play();
    } else {
        info!("Autoplay disabled, showing day 1 until interrupted");
    }

    let outcome = run_playback(
        &mut controller,
        &mut commands_rx,
        PlaybackOptions {
            exit_when_finished: config.playback.autoplay,
        },
    )
    .await;
    interrupt.abort();
    controller.dispose();

    let final_day = controller.current_day();
    info!(
        outcome = ?outcome,
        days_shown = controller.scene().days_shown(),
        plant_updates = controller.scene().plant_updates(),
        final_growth = final_day.map(|d| d.growth_percent),
        final_stage = final_day.map(|d| d.growth_stage.label()),
        "cropsim-engine shutdown complete"
    );

    Ok(())
}

/// Ask the playback driver to dispose. Returns whether the request was
/// delivered; a driver that already returned has dropped its receiver.
async fn request_dispose(commands: &mpsc::Sender<PlaybackCommand>) -> bool {
    match commands.send(PlaybackCommand::Dispose).await {
        Ok(()) => true,
        Err(err) => {
            debug!(command = ?err.0, "Playback driver already stopped, dispose not delivered");
            false
        }
    }
}

/// Load configuration, falling back to defaults when the file is absent.
fn load_config(path: &Path) -> Result<CropSimConfig, EngineError> {
    if path.exists() {
        Ok(CropSimConfig::from_file(path)?)
    } else {
        let mut config = CropSimConfig::default();
        config.geocoding.apply_env_overrides();
        Ok(config)
    }
}

/// Read and validate a scenario file.
fn load_scenario(path: &str) -> Result<Scenario, EngineError> {
    let contents = std::fs::read_to_string(path).map_err(|source| EngineError::ScenarioIo {
        path: path.to_owned(),
        source,
    })?;
    Ok(Scenario::from_json(&contents)?)
}

/// Replace a coordinate-only location name with a geocoded one.
async fn enrich_location<G: Geocoder>(geocoder: &G, scenario: &mut Scenario) {
    let Some(location) = scenario.location.as_mut() else {
        return;
    };
    if location.name != fallback_name(location.latitude, location.longitude) {
        return;
    }
    *location = resolve_location(geocoder, location.latitude, location.longitude).await;
    info!(name = %location.name, "Location named");
}

/// Log live conditions at the scenario location for comparison.
async fn log_current_conditions(client: &OpenWeatherClient, scenario: &Scenario) {
    let Some(location) = scenario.location.as_ref() else {
        return;
    };
    match client.current_weather(location.latitude, location.longitude).await {
        Ok(conditions) => info!(
            location = %location.name,
            weather = ?conditions.weather_kind,
            temperature_c = conditions.temperature_c,
            humidity_pct = conditions.humidity_pct,
            wind_speed = conditions.wind_speed,
            "Current conditions"
        ),
        Err(err) => warn!(location = %location.name, error = %err, "Current weather unavailable"),
    }
}
