//! Plant scattering and camera framing over a scaled field.

use std::f64::consts::TAU;

use rand::Rng;
use tracing::debug;

use cropsim_types::{CameraFraming, CropType, PlantPlacement, Vertex};

use crate::field::{FieldPolygon, Triangle, sample_point_in_triangle, triangulate};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Fraction of real-world plants that are actually rendered.
pub const PLANT_COUNT_SCALE: f64 = 0.01;

/// Relative spread of individual plant heights around the crop's nominal.
const HEIGHT_VARIATION: f64 = 0.15;

// ---------------------------------------------------------------------------
// Plant count
// ---------------------------------------------------------------------------

/// Number of plants to render for a field.
///
/// `floor(density/100 · plants_per_hectare · hectares · count_scale)`.
/// Non-finite or negative inputs yield zero.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn plant_count(crop: CropType, hectares: f64, density: u8, count_scale: f64) -> usize {
    let raw = f64::from(density) / 100.0 * crop.plants_per_hectare() * hectares * count_scale;
    if raw.is_finite() && raw > 0.0 {
        raw.floor().min(usize::MAX as f64) as usize
    } else {
        0
    }
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// Scatter `count` plants uniformly over the field.
///
/// Each plant lands in a fan triangle chosen proportionally to its area,
/// then at a uniform point inside it. Height is the crop's nominal height
/// times `scale_factor`, varied by ±15%; yaw is uniform over a full turn.
pub fn place_plants<R: Rng + ?Sized>(
    polygon: &FieldPolygon,
    crop: CropType,
    count: usize,
    scale_factor: f64,
    rng: &mut R,
) -> Vec<PlantPlacement> {
    let triangles = triangulate(polygon);
    let cumulative: Vec<f64> = triangles
        .iter()
        .scan(0.0, |total, triangle| {
            *total += triangle.area();
            Some(*total)
        })
        .collect();
    let total_area = cumulative.last().copied().unwrap_or(0.0);
    if total_area <= 0.0 {
        return Vec::new();
    }

    let nominal_height = crop.mature_height_m() * scale_factor;
    let placements: Vec<PlantPlacement> = (0..count)
        .filter_map(|_| {
            let triangle = pick_triangle(&triangles, &cumulative, rng.random::<f64>() * total_area)?;
            let (x, z) = sample_point_in_triangle(triangle, rng);
            Some(PlantPlacement {
                x,
                z,
                yaw: rng.random::<f64>() * TAU,
                height: nominal_height
                    * rng.random_range((1.0 - HEIGHT_VARIATION)..=(1.0 + HEIGHT_VARIATION)),
            })
        })
        .collect();

    debug!(crop = %crop, triangles = triangles.len(), plants = placements.len(), "Plants placed");
    placements
}

fn pick_triangle<'a>(triangles: &'a [Triangle], cumulative: &[f64], roll: f64) -> Option<&'a Triangle> {
    let index = cumulative.partition_point(|&c| c <= roll);
    triangles.get(index).or_else(|| triangles.last())
}

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

/// Camera placement that keeps the whole field in view.
///
/// With `size = max(width, depth)` of the bounding box, the camera sits at
/// `(cx + 20, 1.2·size, cz + 1.5·size)` looking at `(cx, 0, cz)`.
pub fn frame_camera(polygon: &FieldPolygon) -> CameraFraming {
    let bounds = polygon.bounds();
    let (cx, cz) = bounds.center();
    let size = bounds.width().max(bounds.depth());
    CameraFraming {
        position: Vertex::new(cx + 20.0, size * 1.2, cz + size * 1.5),
        target: Vertex::ground(cx, cz),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
