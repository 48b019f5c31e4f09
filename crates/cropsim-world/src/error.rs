//! Error types for the `cropsim-world` crate.
//!
//! Geometry validation failures are raised to the caller immediately and
//! block simulation start. Weather and growth generation cannot fail.

/// Errors that can occur while validating or transforming a field outline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    /// The outline is malformed: too few vertices, a vertex without exactly
    /// three coordinates, or a non-finite coordinate.
    #[error("invalid polygon: {reason}")]
    InvalidPolygon {
        /// Explanation of what is wrong with the outline.
        reason: String,
    },

    /// The outline encloses no area (collinear or coincident vertices).
    #[error("degenerate geometry: polygon has zero area")]
    DegenerateGeometry,

    /// The requested field size is not a positive finite number.
    #[error("invalid hectares: {0}")]
    InvalidHectares(f64),
}

impl FieldError {
    /// Shorthand for [`FieldError::InvalidPolygon`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidPolygon {
            reason: reason.into(),
        }
    }
}
