//! Headless scene that renders by logging.
//!
//! Stands in for the 3D renderer: it accepts every object, counts what was
//! created, and reports each day snapshot through `tracing`.

use cropsim_core::controller::{DaySnapshot, SceneCollaborator};
use cropsim_core::simulation::{SceneBuilder, ViewportComponent};
use cropsim_types::{
    CameraFraming, CropType, PlantId, PlantPlacement, SceneObjectId, WeatherKind, WeatherVisuals,
};
use cropsim_world::{FieldPolygon, PlantVisual};
use tracing::{debug, info};

/// A scene collaborator backed by log output.
#[derive(Debug, Default)]
pub struct LogScene {
    objects: usize,
    plants: usize,
    plant_updates: u64,
    rain_particles: u32,
    days_shown: usize,
}

impl LogScene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of days shown so far.
    pub const fn days_shown(&self) -> usize {
        self.days_shown
    }

    /// Total per-plant growth updates applied.
    pub const fn plant_updates(&self) -> u64 {
        self.plant_updates
    }
}

impl SceneBuilder for LogScene {
    fn ensure_ready(&self) -> Result<(), ViewportComponent> {
        Ok(())
    }

    fn add_boundary(&mut self, polygon: &FieldPolygon) -> SceneObjectId {
        self.objects = self.objects.saturating_add(1);
        let bounds = polygon.bounds();
        info!(
            vertices = polygon.len(),
            width = bounds.width(),
            depth = bounds.depth(),
            "Field boundary created"
        );
        SceneObjectId::new()
    }

    fn add_soil(&mut self, polygon: &FieldPolygon) -> SceneObjectId {
        self.objects = self.objects.saturating_add(1);
        debug!(area = polygon.area(), "Field soil created");
        SceneObjectId::new()
    }

    fn add_plant(&mut self, plant: PlantId, crop: CropType, placement: &PlantPlacement) -> SceneObjectId {
        self.objects = self.objects.saturating_add(1);
        self.plants = self.plants.saturating_add(1);
        debug!(
            %plant,
            crop = %crop,
            x = placement.x,
            z = placement.z,
            height = placement.height,
            "Plant created"
        );
        SceneObjectId::new()
    }

    fn frame_camera(&mut self, framing: &CameraFraming) -> Result<(), ViewportComponent> {
        info!(
            position = ?framing.position,
            target = ?framing.target,
            objects = self.objects,
            plants = self.plants,
            "Camera framed"
        );
        Ok(())
    }
}

impl SceneCollaborator for LogScene {
    fn apply_day_visuals(&mut self, visuals: &WeatherVisuals) {
        self.rain_particles = visuals.rain_particle_count;
        debug!(
            sky = format_args!("#{:06x}", visuals.sky_color),
            fog_density = visuals.fog_density,
            light = visuals.light_intensity,
            rain_particles = visuals.rain_particle_count,
            clouds = visuals.cloud_count,
            "Scene restyled"
        );
    }

    fn set_plant_growth(&mut self, _plant: PlantId, _visual: &PlantVisual) {
        self.plant_updates = self.plant_updates.saturating_add(1);
    }

    fn on_day_changed(&mut self, snapshot: &DaySnapshot<'_>) {
        self.days_shown = self.days_shown.saturating_add(1);
        let weather = &snapshot.day.weather;
        let raining = matches!(weather.weather_kind, WeatherKind::Rainy | WeatherKind::Stormy);
        info!(
            day = weather.day_index,
            of = snapshot.total_days,
            date = %weather.date,
            weather = ?weather.weather_kind,
            temperature_c = weather.temperature_c,
            humidity_pct = weather.humidity_pct,
            wind_speed = weather.wind_speed,
            growth = format_args!("{:.0}%", snapshot.day.growth_percent * 100.0),
            stage = snapshot.day.growth_stage.label(),
            plant_scale = snapshot.plant_visual.scale,
            raining,
            "Day"
        );
    }

    fn release_weather_effects(&mut self) {
        debug!(rain_particles = self.rain_particles, "Weather effects released");
        self.rain_particles = 0;
    }
}
