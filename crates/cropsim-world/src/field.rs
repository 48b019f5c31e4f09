//! Field outline geometry: area, hectare scaling, triangulation, sampling.
//!
//! All computations work on the `(x, z)` ground-plane projection. Field
//! outlines are validated once, on construction of a [`FieldPolygon`], so the
//! operations below can assume at least three finite vertices with `y == 0`.
//!
//! # Scaling
//!
//! A field is resized so that its area represents the requested hectares
//! under the visualization unit scale (`1 m = 0.25 units` by default). The
//! result is then clamped so the field stays in view and never becomes too
//! small to see:
//!
//! | Condition after scaling           | Corrective factor                     |
//! |-----------------------------------|---------------------------------------|
//! | width or depth above the maximum  | `min(max / width, max / depth)`       |
//! | else width or depth below minimum | `max(min / width, min / depth)`       |
//!
//! At most one corrective pass is applied.

use rand::Rng;
use serde::{Deserialize, Serialize};

use cropsim_types::Vertex;

use crate::error::FieldError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Square metres in one hectare.
pub const HECTARE_TO_SQUARE_METERS: f64 = 10_000.0;

/// Scene units per metre.
pub const SCALE_FACTOR: f64 = 0.25;

/// Smallest allowed field width or depth after scaling, in scene units.
pub const MIN_FIELD_DIMENSION: f64 = 40.0;

/// Largest allowed field width or depth after scaling, in scene units.
pub const MAX_FIELD_DIMENSION: f64 = 150.0;

/// Areas at or below this are treated as zero.
const MIN_AREA: f64 = 1e-9;

/// Unit scale and dimension clamps used when sizing a field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldLimits {
    /// Scene units per metre.
    pub scale_factor: f64,
    /// Smallest allowed width or depth.
    pub min_dimension: f64,
    /// Largest allowed width or depth.
    pub max_dimension: f64,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self {
            scale_factor: SCALE_FACTOR,
            min_dimension: MIN_FIELD_DIMENSION,
            max_dimension: MAX_FIELD_DIMENSION,
        }
    }
}

// ---------------------------------------------------------------------------
// FieldPolygon
// ---------------------------------------------------------------------------

/// A validated field outline: three or more finite vertices on the ground.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vertex>", into = "Vec<Vertex>")]
pub struct FieldPolygon {
    vertices: Vec<Vertex>,
}

impl FieldPolygon {
    /// Validate an outline.
    ///
    /// Vertices are projected onto the ground plane (`y` forced to 0).
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidPolygon`] with fewer than three vertices
    /// or a non-finite coordinate.
    pub fn new(vertices: Vec<Vertex>) -> Result<Self, FieldError> {
        if vertices.len() < 3 {
            return Err(FieldError::invalid(format!(
                "polygon must have at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if let Some(position) = vertices
            .iter()
            .position(|v| !(v.x().is_finite() && v.y().is_finite() && v.z().is_finite()))
        {
            return Err(FieldError::invalid(format!(
                "vertex {position} has a non-finite coordinate"
            )));
        }
        let vertices = vertices
            .into_iter()
            .map(|v| Vertex::ground(v.x(), v.z()))
            .collect();
        Ok(Self { vertices })
    }

    /// Validate an outline given as raw `[x, y, z]` coordinate lists.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidPolygon`] if any entry does not have
    /// exactly three coordinates, or for any reason [`new`](Self::new) fails.
    pub fn from_coordinates(points: &[Vec<f64>]) -> Result<Self, FieldError> {
        let mut vertices = Vec::with_capacity(points.len());
        for (index, point) in points.iter().enumerate() {
            match point.as_slice() {
                &[x, y, z] => vertices.push(Vertex::new(x, y, z)),
                other => {
                    return Err(FieldError::invalid(format!(
                        "vertex {index} must have 3 coordinates [x, y, z], got {}",
                        other.len()
                    )));
                }
            }
        }
        Self::new(vertices)
    }

    /// The outline's vertices in order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always `false`; a valid polygon has at least three vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Enclosed area of the ground-plane projection.
    pub fn area(&self) -> f64 {
        polygon_area(&self.vertices)
    }

    /// Vertex average `(x, z)`. Scaling is performed about this point.
    pub fn centroid(&self) -> (f64, f64) {
        let (sum_x, sum_z) = self
            .vertices
            .iter()
            .fold((0.0, 0.0), |(sx, sz), v| (sx + v.x(), sz + v.z()));
        let count = self.vertices.len() as f64;
        (sum_x / count, sum_z / count)
    }

    /// Axis-aligned bounding box of the ground-plane projection.
    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_z: f64::INFINITY,
            max_z: f64::NEG_INFINITY,
        };
        for v in &self.vertices {
            bounds.min_x = bounds.min_x.min(v.x());
            bounds.max_x = bounds.max_x.max(v.x());
            bounds.min_z = bounds.min_z.min(v.z());
            bounds.max_z = bounds.max_z.max(v.z());
        }
        bounds
    }

    /// Scale every vertex about `(cx, cz)` by `factor`.
    fn scaled_about(&self, (cx, cz): (f64, f64), factor: f64) -> Self {
        let vertices = self
            .vertices
            .iter()
            .map(|v| Vertex::ground(cx + (v.x() - cx) * factor, cz + (v.z() - cz) * factor))
            .collect();
        Self { vertices }
    }
}

impl TryFrom<Vec<Vertex>> for FieldPolygon {
    type Error = FieldError;

    fn try_from(vertices: Vec<Vertex>) -> Result<Self, Self::Error> {
        Self::new(vertices)
    }
}

impl From<FieldPolygon> for Vec<Vertex> {
    fn from(polygon: FieldPolygon) -> Self {
        polygon.vertices
    }
}

/// Ground-plane bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Smallest x.
    pub min_x: f64,
    /// Largest x.
    pub max_x: f64,
    /// Smallest z.
    pub min_z: f64,
    /// Largest z.
    pub max_z: f64,
}

impl Bounds {
    /// Extent along x.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Extent along z.
    pub fn depth(&self) -> f64 {
        self.max_z - self.min_z
    }

    /// Center `(x, z)` of the box.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_z + self.max_z) / 2.0,
        )
    }
}

// ---------------------------------------------------------------------------
// Area
// ---------------------------------------------------------------------------

/// Shoelace area of the `(x, z)` projection of an outline.
///
/// Returns 0 for fewer than three vertices or collinear points.
pub fn polygon_area(vertices: &[Vertex]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let twice_signed: f64 = vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(|(a, b)| a.x() * b.z() - b.x() * a.z())
        .sum();
    twice_signed.abs() / 2.0
}

// ---------------------------------------------------------------------------
// Scaling
// ---------------------------------------------------------------------------

/// The clamp applied after the hectare scaling, if any.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScaleCorrection {
    /// The scaled shape already fit within the limits.
    None,
    /// Shrunk by the given factor because a dimension exceeded the maximum.
    Shrunk(f64),
    /// Enlarged by the given factor because a dimension fell below the minimum.
    Enlarged(f64),
}

/// A field outline resized to a target hectare area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledPolygon {
    /// The resized outline.
    pub polygon: FieldPolygon,
    /// Uniform factor that maps the input area to the hectare target.
    pub area_scale: f64,
    /// Clamp applied after the area scaling.
    pub correction: ScaleCorrection,
}

impl ScaledPolygon {
    /// Area the field had before the clamp was applied.
    pub fn unclamped_area(&self) -> f64 {
        let factor = match self.correction {
            ScaleCorrection::None => 1.0,
            ScaleCorrection::Shrunk(f) | ScaleCorrection::Enlarged(f) => f,
        };
        self.polygon.area() / (factor * factor)
    }
}

/// Resize a field to `hectares` with the default limits.
///
/// # Errors
///
/// See [`scale_to_hectares_with`].
pub fn scale_to_hectares(polygon: &FieldPolygon, hectares: f64) -> Result<ScaledPolygon, FieldError> {
    scale_to_hectares_with(polygon, hectares, &FieldLimits::default())
}

/// Resize a field so its area represents `hectares`, then clamp its
/// bounding box to the limits.
///
/// # Errors
///
/// Returns [`FieldError::InvalidHectares`] if `hectares` is not a positive
/// finite number, and [`FieldError::DegenerateGeometry`] if the input
/// outline encloses no area.
pub fn scale_to_hectares_with(
    polygon: &FieldPolygon,
    hectares: f64,
    limits: &FieldLimits,
) -> Result<ScaledPolygon, FieldError> {
    if !(hectares.is_finite() && hectares > 0.0) {
        return Err(FieldError::InvalidHectares(hectares));
    }
    let current_area = polygon.area();
    if current_area <= MIN_AREA {
        return Err(FieldError::DegenerateGeometry);
    }

    let target_area =
        hectares * HECTARE_TO_SQUARE_METERS * limits.scale_factor * limits.scale_factor;
    let area_scale = (target_area / current_area).sqrt();
    let centroid = polygon.centroid();
    let scaled = polygon.scaled_about(centroid, area_scale);

    let bounds = scaled.bounds();
    let (width, depth) = (bounds.width(), bounds.depth());

    let (polygon, correction) = if width > limits.max_dimension || depth > limits.max_dimension {
        let factor = (limits.max_dimension / width).min(limits.max_dimension / depth);
        (scaled.scaled_about(centroid, factor), ScaleCorrection::Shrunk(factor))
    } else if width < limits.min_dimension || depth < limits.min_dimension {
        let factor = (limits.min_dimension / width).max(limits.min_dimension / depth);
        (scaled.scaled_about(centroid, factor), ScaleCorrection::Enlarged(factor))
    } else {
        (scaled, ScaleCorrection::None)
    };

    Ok(ScaledPolygon {
        polygon,
        area_scale,
        correction,
    })
}

// ---------------------------------------------------------------------------
// Triangulation and sampling
// ---------------------------------------------------------------------------

/// Three vertices of a fan triangulation, used as a sampling domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle(pub [Vertex; 3]);

impl Triangle {
    /// The three corners.
    pub const fn vertices(&self) -> &[Vertex; 3] {
        &self.0
    }

    /// Ground-plane area.
    pub fn area(&self) -> f64 {
        polygon_area(&self.0)
    }

    /// Barycentric coordinates of `(x, z)` relative to the corners, or `None`
    /// for a degenerate triangle.
    pub fn barycentric(&self, x: f64, z: f64) -> Option<[f64; 3]> {
        let [v0, v1, v2] = self.0;
        let det = (v1.z() - v2.z()) * (v0.x() - v2.x()) + (v2.x() - v1.x()) * (v0.z() - v2.z());
        if det.abs() <= MIN_AREA {
            return None;
        }
        let l0 = ((v1.z() - v2.z()) * (x - v2.x()) + (v2.x() - v1.x()) * (z - v2.z())) / det;
        let l1 = ((v2.z() - v0.z()) * (x - v2.x()) + (v0.x() - v2.x()) * (z - v2.z())) / det;
        Some([l0, l1, 1.0 - l0 - l1])
    }
}

/// Fan triangulation from vertex 0.
///
/// Only valid for convex outlines. Produces `n - 2` triangles in vertex order.
pub fn triangulate(polygon: &FieldPolygon) -> Vec<Triangle> {
    let vertices = polygon.vertices();
    let Some((&apex, rest)) = vertices.split_first() else {
        return Vec::new();
    };
    rest.windows(2)
        .filter_map(|pair| match pair {
            &[b, c] => Some(Triangle([apex, b, c])),
            _ => None,
        })
        .collect()
}

/// Uniformly sample a ground point `(x, z)` inside a triangle.
///
/// Draws `a, b ~ U(0, 1)`, reflects them when `a + b > 1`, and returns the
/// barycentric combination `a·v0 + b·v1 + c·v2` with `c = 1 - a - b`.
pub fn sample_point_in_triangle<R: Rng + ?Sized>(triangle: &Triangle, rng: &mut R) -> (f64, f64) {
    let mut a: f64 = rng.random();
    let mut b: f64 = rng.random();
    if a + b > 1.0 {
        a = 1.0 - a;
        b = 1.0 - b;
    }
    let c = 1.0 - a - b;
    let [v0, v1, v2] = triangle.0;
    (
        a * v0.x() + b * v1.x() + c * v2.x(),
        a * v0.z() + b * v1.z() + c * v2.z(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn square(half: f64) -> FieldPolygon {
        FieldPolygon::new(vec![
            Vertex::ground(-half, -half),
            Vertex::ground(-half, half),
            Vertex::ground(half, half),
            Vertex::ground(half, -half),
        ])
        .unwrap()
    }

    fn close(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() <= tolerance
    }

    #[test]
    fn square_area_is_exact() {
        assert!(close(square(50.0).area(), 10_000.0, 1e-9));
    }

    #[test]
    fn area_ignores_winding() {
        let clockwise = square(10.0);
        let mut reversed = clockwise.vertices().to_vec();
        reversed.reverse();
        assert!(close(polygon_area(&reversed), clockwise.area(), 1e-9));
    }

    #[test]
    fn collinear_points_have_no_area() {
        let line = [
            Vertex::ground(0.0, 0.0),
            Vertex::ground(1.0, 1.0),
            Vertex::ground(2.0, 2.0),
        ];
        assert!(close(polygon_area(&line), 0.0, 1e-12));
        assert!(close(polygon_area(&line[..2]), 0.0, 1e-12));
    }

    #[test]
    fn construction_rejects_short_outlines() {
        let err = FieldPolygon::new(vec![Vertex::ground(0.0, 0.0), Vertex::ground(1.0, 0.0)]);
        assert!(matches!(err, Err(FieldError::InvalidPolygon { .. })));
    }

    #[test]
    fn construction_rejects_non_finite_coordinates() {
        let err = FieldPolygon::new(vec![
            Vertex::ground(0.0, 0.0),
            Vertex::ground(f64::NAN, 0.0),
            Vertex::ground(1.0, 1.0),
        ]);
        assert!(matches!(err, Err(FieldError::InvalidPolygon { .. })));
    }

    #[test]
    fn construction_flattens_onto_ground() {
        let polygon = FieldPolygon::new(vec![
            Vertex::new(0.0, 3.0, 0.0),
            Vertex::new(1.0, -2.0, 0.0),
            Vertex::new(0.0, 7.5, 1.0),
        ])
        .unwrap();
        assert!(polygon.vertices().iter().all(|v| v.y() == 0.0));
    }

    #[test]
    fn coordinates_must_be_triples() {
        let err = FieldPolygon::from_coordinates(&[
            vec![0.0, 0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 0.0, 1.0],
        ]);
        assert!(matches!(err, Err(FieldError::InvalidPolygon { .. })));
    }

    #[test]
    fn small_field_is_enlarged_to_minimum() {
        let scaled = scale_to_hectares(&square(50.0), 2.5).unwrap();
        assert!(close(scaled.unclamped_area(), 1562.5, 1e-6));
        assert!(matches!(scaled.correction, ScaleCorrection::Enlarged(_)));
        let bounds = scaled.polygon.bounds();
        assert!(bounds.width() >= 40.0 - 1e-9 && bounds.width() <= 150.0);
        assert!(bounds.depth() >= 40.0 - 1e-9 && bounds.depth() <= 150.0);
    }

    #[test]
    fn mid_sized_field_is_not_clamped() {
        let scaled = scale_to_hectares(&square(50.0), 5.0).unwrap();
        assert_eq!(scaled.correction, ScaleCorrection::None);
        assert!(close(scaled.polygon.area(), 3125.0, 1e-6));
    }

    #[test]
    fn large_field_is_shrunk_to_maximum() {
        let scaled = scale_to_hectares(&square(50.0), 100.0).unwrap();
        assert!(matches!(scaled.correction, ScaleCorrection::Shrunk(_)));
        let bounds = scaled.polygon.bounds();
        assert!(close(bounds.width(), 150.0, 1e-9));
        assert!(close(bounds.depth(), 150.0, 1e-9));
    }

    #[test]
    fn shrunk_field_is_not_boosted_again() {
        // Long thin strip: shrinking the long side leaves the short side
        // below the minimum, which must be left alone.
        let strip = FieldPolygon::new(vec![
            Vertex::ground(0.0, 0.0),
            Vertex::ground(100.0, 0.0),
            Vertex::ground(100.0, 1.0),
            Vertex::ground(0.0, 1.0),
        ])
        .unwrap();
        let scaled = scale_to_hectares(&strip, 50.0).unwrap();
        assert!(matches!(scaled.correction, ScaleCorrection::Shrunk(_)));
        let bounds = scaled.polygon.bounds();
        assert!(close(bounds.width(), 150.0, 1e-9));
        assert!(bounds.depth() < 40.0);
    }

    #[test]
    fn scaling_keeps_centroid_and_ground() {
        let offset = FieldPolygon::new(vec![
            Vertex::ground(10.0, 10.0),
            Vertex::ground(10.0, 30.0),
            Vertex::ground(30.0, 30.0),
            Vertex::ground(30.0, 10.0),
        ])
        .unwrap();
        let scaled = scale_to_hectares(&offset, 5.0).unwrap();
        let (cx, cz) = scaled.polygon.centroid();
        assert!(close(cx, 20.0, 1e-9) && close(cz, 20.0, 1e-9));
        assert!(scaled.polygon.vertices().iter().all(|v| v.y() == 0.0));
    }

    #[test]
    fn degenerate_outline_cannot_be_scaled() {
        let line = FieldPolygon::new(vec![
            Vertex::ground(0.0, 0.0),
            Vertex::ground(1.0, 0.0),
            Vertex::ground(2.0, 0.0),
        ])
        .unwrap();
        assert_eq!(
            scale_to_hectares(&line, 1.0).unwrap_err(),
            FieldError::DegenerateGeometry
        );
    }

    #[test]
    fn non_positive_hectares_are_rejected() {
        assert!(matches!(
            scale_to_hectares(&square(10.0), 0.0),
            Err(FieldError::InvalidHectares(_))
        ));
        assert!(matches!(
            scale_to_hectares(&square(10.0), f64::NAN),
            Err(FieldError::InvalidHectares(_))
        ));
    }

    #[test]
    fn fan_triangulation_has_n_minus_two_triangles() {
        let hexagon: Vec<Vertex> = (0..6)
            .map(|i| {
                let angle = f64::from(i) * std::f64::consts::PI / 3.0;
                Vertex::ground(angle.cos() * 10.0, angle.sin() * 10.0)
            })
            .collect();
        let polygon = FieldPolygon::new(hexagon).unwrap();
        let triangles = triangulate(&polygon);
        assert_eq!(triangles.len(), 4);
        for (i, triangle) in triangles.iter().enumerate() {
            assert_eq!(triangle.0[0], polygon.vertices()[0]);
            assert_eq!(triangle.0[1], polygon.vertices()[i + 1]);
            assert_eq!(triangle.0[2], polygon.vertices()[i + 2]);
        }
        let total: f64 = triangles.iter().map(Triangle::area).sum();
        assert!(close(total, polygon.area(), 1e-9));
    }

    #[test]
    fn sampled_points_lie_inside_their_triangle() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut checked = 0_u32;
        for _ in 0..10_000 {
            let corners: [Vertex; 3] = core::array::from_fn(|_| {
                Vertex::ground(rng.random_range(-100.0..100.0), rng.random_range(-100.0..100.0))
            });
            let triangle = Triangle(corners);
            if triangle.area() < 1e-3 {
                continue;
            }
            let (x, z) = sample_point_in_triangle(&triangle, &mut rng);
            let weights = triangle.barycentric(x, z).unwrap();
            for w in weights {
                assert!((-1e-6..=1.0 + 1e-6).contains(&w), "weight {w} out of range");
            }
            assert!(close(weights.iter().sum::<f64>(), 1.0, 1e-9));
            checked += 1;
        }
        assert!(checked > 9_900);
    }

    #[test]
    fn polygon_deserialization_validates_vertices() {
        let polygon: FieldPolygon =
            serde_json::from_str("[[0, 0, 0], [10, 0, 0], [0, 0, 10]]").unwrap();
        assert_eq!(polygon.vertices().len(), 3);
        assert!(close(polygon.area(), 50.0, 1e-9));

        let err = serde_json::from_str::<FieldPolygon>("[[0, 0, 0], [10, 0, 0]]").unwrap_err();
        assert!(err.to_string().contains("invalid polygon"), "{err}");

        let json = serde_json::to_string(&polygon).unwrap();
        assert_eq!(json, "[[0.0,0.0,0.0],[10.0,0.0,0.0],[0.0,0.0,10.0]]");
    }
}
