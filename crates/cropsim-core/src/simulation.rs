//! Building a simulation: scene objects for the field and the day-by-day
//! timeline.
//!
//! Construction runs in a fixed order against a [`SceneBuilder`]:
//!
//! 1. Check that the scene is ready.
//! 2. Scale the outline to the requested hectares.
//! 3. Add the field boundary, then the soil.
//! 4. Scatter and add the plants.
//! 5. Frame the camera on the scaled field.
//!
//! Any failure aborts construction and hands back the objects created so far
//! so the caller can remove them.

use core::fmt;

use chrono::NaiveDate;
use rand::Rng;
use tracing::{debug, info};

use cropsim_types::{CameraFraming, CropType, PlantId, PlantPlacement, SceneObjectId, Timeline};
use cropsim_world::{
    FieldError, FieldPolygon, ScaledPolygon, WeatherGenerator, build_growth_timeline, frame_camera,
    place_plants, plant_count, scale_to_hectares_with,
};

use crate::config::FieldConfig;
use crate::scenario::Scenario;

// ---------------------------------------------------------------------------
// Scene collaborator
// ---------------------------------------------------------------------------

/// A renderer component that must exist before anything can be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportComponent {
    /// The scene graph.
    Scene,
    /// The camera.
    Camera,
    /// The orbit controls attached to the camera.
    Controls,
}

impl fmt::Display for ViewportComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Scene => "scene",
            Self::Camera => "camera",
            Self::Controls => "controls",
        })
    }
}

/// Renderer-side object creation used during construction.
pub trait SceneBuilder {
    /// `Err` with the first component that is not ready yet.
    ///
    /// # Errors
    ///
    /// Returns the missing [`ViewportComponent`].
    fn ensure_ready(&self) -> Result<(), ViewportComponent>;

    /// Draw the outline of the scaled field.
    fn add_boundary(&mut self, polygon: &FieldPolygon) -> SceneObjectId;

    /// Fill the scaled field with soil.
    fn add_soil(&mut self, polygon: &FieldPolygon) -> SceneObjectId;

    /// Create one plant.
    fn add_plant(&mut self, plant: PlantId, crop: CropType, placement: &PlantPlacement) -> SceneObjectId;

    /// Point the camera at the field.
    ///
    /// # Errors
    ///
    /// Returns the [`ViewportComponent`] that disappeared since
    /// [`ensure_ready`](Self::ensure_ready).
    fn frame_camera(&mut self, framing: &CameraFraming) -> Result<(), ViewportComponent>;
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that abort simulation construction.
#[derive(Debug, thiserror::Error)]
pub enum ConstructionError {
    /// A renderer component was not ready.
    #[error("viewport not initialized: missing {component}")]
    UninitializedViewport {
        /// The component that was missing.
        component: ViewportComponent,
        /// Scene objects created before the failure.
        created: Vec<SceneObjectId>,
    },

    /// The field outline could not be scaled.
    #[error("field geometry rejected: {source}")]
    Geometry {
        /// The underlying geometry error.
        source: FieldError,
        /// Scene objects created before the failure.
        created: Vec<SceneObjectId>,
    },
}

impl ConstructionError {
    /// Scene objects the caller should remove.
    pub fn created(&self) -> &[SceneObjectId] {
        match self {
            Self::UninitializedViewport { created, .. } | Self::Geometry { created, .. } => created,
        }
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Everything construction placed in the scene.
#[derive(Debug, Clone)]
pub struct BuiltSimulation {
    /// The outline after hectare scaling and clamping.
    pub scaled: ScaledPolygon,
    /// All created scene objects in creation order.
    pub objects: Vec<SceneObjectId>,
    /// Plant handles, for growth updates during playback.
    pub plants: Vec<PlantId>,
    /// Where the camera was pointed.
    pub camera: CameraFraming,
}

/// Build the field, its plants, and the camera framing for a scenario.
///
/// # Errors
///
/// - [`ConstructionError::UninitializedViewport`] if the renderer is not
///   ready, either up front or when framing the camera.
/// - [`ConstructionError::Geometry`] if the outline cannot be scaled.
pub fn construct_simulation<S, R>(
    scenario: &Scenario,
    field: &FieldConfig,
    scene: &mut S,
    rng: &mut R,
) -> Result<BuiltSimulation, ConstructionError>
where
    S: SceneBuilder + ?Sized,
    R: Rng + ?Sized,
{
    scene
        .ensure_ready()
        .map_err(|component| ConstructionError::UninitializedViewport {
            component,
            created: Vec::new(),
        })?;

    let scaled = scale_to_hectares_with(&scenario.polygon, scenario.hectares, &field.limits())
        .map_err(|source| ConstructionError::Geometry {
            source,
            created: Vec::new(),
        })?;
    debug!(
        hectares = scenario.hectares,
        correction = ?scaled.correction,
        "Field scaled"
    );

    let mut objects = vec![
        scene.add_boundary(&scaled.polygon),
        scene.add_soil(&scaled.polygon),
    ];

    let count = plant_count(
        scenario.crop_type,
        scenario.hectares,
        scenario.density,
        field.plant_count_scale,
    );
    let placements = place_plants(
        &scaled.polygon,
        scenario.crop_type,
        count,
        field.scale_factor,
        rng,
    );
    let mut plants = Vec::with_capacity(placements.len());
    for placement in &placements {
        let plant = PlantId::new();
        objects.push(scene.add_plant(plant, scenario.crop_type, placement));
        plants.push(plant);
    }

    let camera = frame_camera(&scaled.polygon);
    if let Err(component) = scene.frame_camera(&camera) {
        return Err(ConstructionError::UninitializedViewport {
            component,
            created: objects,
        });
    }

    info!(
        crop = %scenario.crop_type,
        hectares = scenario.hectares,
        density = scenario.density,
        plants = plants.len(),
        objects = objects.len(),
        "Simulation constructed"
    );

    Ok(BuiltSimulation {
        scaled,
        objects,
        plants,
        camera,
    })
}

/// Generate the weather and growth timeline for a scenario.
///
/// Uses location-aware weather when the scenario has a location and seasonal
/// weather otherwise. `days <= 0` yields an empty timeline.
pub fn create_crop_timeline<R: Rng + ?Sized>(
    scenario: &Scenario,
    start: NaiveDate,
    days: i64,
    rng: &mut R,
) -> Timeline {
    let generator = WeatherGenerator::for_location(scenario.location.as_ref());
    let weather = generator.generate(start, days, rng);
    let days = build_growth_timeline(weather, scenario.crop_type);

    info!(
        crop = %scenario.crop_type,
        mode = ?generator.mode(),
        %start,
        days = days.len(),
        "Timeline created"
    );

    Timeline {
        crop_type: scenario.crop_type,
        hectares: scenario.hectares,
        density: scenario.density,
        location: scenario.location.clone(),
        days,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use cropsim_types::GeoLocation;
    use cropsim_world::WeatherMode;

    #[derive(Default)]
    struct RecordingBuilder {
        missing: Option<ViewportComponent>,
        camera_missing: Option<ViewportComponent>,
        boundaries: usize,
        soils: usize,
        plants: Vec<(PlantId, PlantPlacement)>,
        framing: Option<CameraFraming>,
    }

    impl SceneBuilder for RecordingBuilder {
        fn ensure_ready(&self) -> Result<(), ViewportComponent> {
            self.missing.map_or(Ok(()), Err)
        }

        fn add_boundary(&mut self, _polygon: &FieldPolygon) -> SceneObjectId {
            self.boundaries += 1;
            SceneObjectId::new()
        }

        fn add_soil(&mut self, _polygon: &FieldPolygon) -> SceneObjectId {
            self.soils += 1;
            SceneObjectId::new()
        }

        fn add_plant(&mut self, plant: PlantId, _crop: CropType, placement: &PlantPlacement) -> SceneObjectId {
            self.plants.push((plant, *placement));
            SceneObjectId::new()
        }

        fn frame_camera(&mut self, framing: &CameraFraming) -> Result<(), ViewportComponent> {
            if let Some(component) = self.camera_missing {
                return Err(component);
            }
            self.framing = Some(*framing);
            Ok(())
        }
    }

    fn corn() -> Scenario {
        Scenario::from_json(
            r#"{"type":"corn","hectares":2.5,"density":70,
                "polygon":[[-50,0,-50],[-50,0,50],[50,0,50],[50,0,-50]]}"#,
        )
        .unwrap()
    }

    #[test]
    fn builds_field_plants_and_camera() {
        let mut scene = RecordingBuilder::default();
        let mut rng = StdRng::seed_from_u64(31);
        let built = construct_simulation(&corn(), &FieldConfig::default(), &mut scene, &mut rng).unwrap();

        // floor(0.7 * 7000 * 2.5 * 0.01) = 122
        assert_eq!(built.plants.len(), 122);
        assert_eq!(scene.plants.len(), 122);
        assert_eq!(built.objects.len(), 124);
        assert_eq!((scene.boundaries, scene.soils), (1, 1));
        assert_eq!(scene.framing, Some(built.camera));

        let bounds = built.scaled.polygon.bounds();
        assert!(bounds.width() >= 40.0 - 1e-9 && bounds.width() <= 150.0 + 1e-9);
        for (_, placement) in &scene.plants {
            assert!(placement.x >= bounds.min_x - 1e-9 && placement.x <= bounds.max_x + 1e-9);
            assert!(placement.z >= bounds.min_z - 1e-9 && placement.z <= bounds.max_z + 1e-9);
        }
    }

    #[test]
    fn missing_scene_aborts_before_creating_anything() {
        let mut scene = RecordingBuilder {
            missing: Some(ViewportComponent::Scene),
            ..RecordingBuilder::default()
        };
        let err = construct_simulation(
            &corn(),
            &FieldConfig::default(),
            &mut scene,
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConstructionError::UninitializedViewport {
                component: ViewportComponent::Scene,
                ..
            }
        ));
        assert!(err.created().is_empty());
        assert_eq!(scene.boundaries, 0);
    }

    #[test]
    fn missing_camera_reports_created_objects() {
        let mut scene = RecordingBuilder {
            camera_missing: Some(ViewportComponent::Camera),
            ..RecordingBuilder::default()
        };
        let err = construct_simulation(
            &corn(),
            &FieldConfig::default(),
            &mut scene,
            &mut StdRng::seed_from_u64(2),
        )
        .unwrap_err();
        assert_eq!(err.created().len(), 124);
        assert!(err.to_string().contains("camera"));
    }

    #[test]
    fn timeline_uses_seasonal_weather_without_location() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let timeline = create_crop_timeline(&corn(), start, 10, &mut StdRng::seed_from_u64(3));
        assert_eq!(timeline.len(), 10);
        assert_eq!(timeline.crop_type, CropType::Corn);
        assert!(timeline.location.is_none());
        assert!(timeline.days.iter().all(|d| d.weather.wind_speed.is_none()));
    }

    #[test]
    fn timeline_uses_location_weather_when_located() {
        let mut scenario = corn();
        scenario.location = Some(GeoLocation {
            latitude: -33.9,
            longitude: 18.4,
            name: "Cape Town, ZA".to_owned(),
        });
        assert!(matches!(
            WeatherGenerator::for_location(scenario.location.as_ref()).mode(),
            WeatherMode::Historical { .. }
        ));

        let start = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let timeline = create_crop_timeline(&scenario, start, 30, &mut StdRng::seed_from_u64(4));
        assert_eq!(timeline.len(), 30);
        assert_eq!(timeline.location, scenario.location);
        assert!(timeline.days.iter().all(|d| d.weather.wind_speed.is_some()));
    }

    #[test]
    fn non_positive_days_give_empty_timeline() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        assert!(create_crop_timeline(&corn(), start, 0, &mut StdRng::seed_from_u64(5)).is_empty());
    }
}
