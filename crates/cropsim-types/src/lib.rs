//! Shared type definitions for the crop growth simulation.
//!
//! This crate is the single source of truth for the data model shared by the
//! simulation engine and the renderer. Types flow to `TypeScript` via `ts-rs`
//! so the 3D front end consumes exactly what the engine produces.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for scene object handles
//! - [`enums`] -- Weather kinds, seasons, growth stages, and the crop catalogue
//! - [`structs`] -- Weather days, timelines, vertices, and renderer payloads

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{CropType, GrowthStage, Hemisphere, ReproductivePart, Season, WeatherKind};
pub use ids::{PlantId, SceneObjectId};
pub use structs::{
    CameraFraming, GeoLocation, PlantPlacement, Timeline, TimelineDay, Vertex, WeatherDay,
    WeatherVisuals,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the renderer.

    #[test]
    fn export_bindings() {
        // ts-rs writes the files under `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::PlantId::export_all();
        let _ = crate::ids::SceneObjectId::export_all();

        // Enums
        let _ = crate::enums::WeatherKind::export_all();
        let _ = crate::enums::Hemisphere::export_all();
        let _ = crate::enums::Season::export_all();
        let _ = crate::enums::GrowthStage::export_all();
        let _ = crate::enums::CropType::export_all();

        // Structs
        let _ = crate::structs::Vertex::export_all();
        let _ = crate::structs::CameraFraming::export_all();
        let _ = crate::structs::PlantPlacement::export_all();
        let _ = crate::structs::GeoLocation::export_all();
        let _ = crate::structs::WeatherVisuals::export_all();
        let _ = crate::structs::WeatherDay::export_all();
        let _ = crate::structs::TimelineDay::export_all();
        let _ = crate::structs::Timeline::export_all();
    }
}
