//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Scene objects handed to the renderer are addressed through these IDs so
//! that a plant handle can never be confused with a boundary or soil mesh.
//! IDs use UUID v7 (time-ordered), which keeps creation order visible in logs.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Handle for a single plant placed in the scene.
    PlantId
}

define_id! {
    /// Handle for a non-plant scene object (field boundary, soil).
    SceneObjectId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(PlantId::new(), PlantId::new());
    }

    #[test]
    fn id_round_trips_through_uuid() {
        let id = SceneObjectId::new();
        let raw: Uuid = id.into();
        assert_eq!(SceneObjectId::from(raw), id);
        assert_eq!(id.to_string(), raw.to_string());
    }
}
