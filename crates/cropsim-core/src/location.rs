//! Resolving a human-readable name for a field location.
//!
//! Lookups go through a [`Geocoder`] supplied by the caller (the engine binary
//! provides an HTTP implementation). Any lookup failure degrades to a
//! coordinate string instead of failing the simulation.

use std::future::Future;

use tracing::{debug, warn};

use cropsim_types::GeoLocation;

/// Latitude of the default location (geographic centre of the contiguous US).
pub const DEFAULT_LATITUDE: f64 = 39.8283;

/// Longitude of the default location.
pub const DEFAULT_LONGITUDE: f64 = -98.5795;

/// Display name of the default location.
pub const DEFAULT_LOCATION_NAME: &str = "United States (default)";

/// Errors returned by a geocoding backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeocodeError {
    /// The request could not be sent or timed out.
    #[error("network failure: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("geocoding service returned status {0}")]
    Status(u16),

    /// The response body could not be decoded.
    #[error("failed to decode geocoding response: {0}")]
    Decode(String),

    /// The service returned no matching places.
    #[error("no matching place found")]
    NotFound,
}

/// A place returned by a geocoding lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    /// Place name.
    pub name: String,
    /// ISO country code or name.
    pub country: String,
    /// State or region, when the service provides one.
    pub state: Option<String>,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

impl Place {
    /// `"name, state, country"`, or `"name, country"` without a state.
    pub fn display_name(&self) -> String {
        match &self.state {
            Some(state) => format!("{}, {state}, {}", self.name, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }

    /// Convert into a location using [`Place::display_name`].
    pub fn into_location(self) -> GeoLocation {
        let name = self.display_name();
        GeoLocation {
            latitude: self.latitude,
            longitude: self.longitude,
            name,
        }
    }
}

/// Forward and reverse place lookups.
pub trait Geocoder {
    /// The nearest named place to a coordinate.
    fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Result<Place, GeocodeError>> + Send;

    /// Places matching a free-text query, best match first.
    fn search(&self, query: &str) -> impl Future<Output = Result<Vec<Place>, GeocodeError>> + Send;
}

/// The location used when none is supplied.
pub fn default_location() -> GeoLocation {
    GeoLocation {
        latitude: DEFAULT_LATITUDE,
        longitude: DEFAULT_LONGITUDE,
        name: DEFAULT_LOCATION_NAME.to_owned(),
    }
}

/// Coordinate string used when no place name is available.
pub fn fallback_name(latitude: f64, longitude: f64) -> String {
    format!("{latitude:.4}, {longitude:.4}")
}

/// Name a coordinate via reverse geocoding.
///
/// Produces `"{name}, {country}"` on success and the coordinate string from
/// [`fallback_name`] on any failure.
pub async fn resolve_location<G: Geocoder>(
    geocoder: &G,
    latitude: f64,
    longitude: f64,
) -> GeoLocation {
    let name = match geocoder.reverse_geocode(latitude, longitude).await {
        Ok(place) => {
            debug!(latitude, longitude, name = %place.name, "Location resolved");
            format!("{}, {}", place.name, place.country)
        }
        Err(err) => {
            warn!(latitude, longitude, error = %err, "Reverse geocoding failed, using coordinates");
            fallback_name(latitude, longitude)
        }
    };
    GeoLocation {
        latitude,
        longitude,
        name,
    }
}

/// Resolve a free-text query to its best match.
///
/// Returns `None` when the lookup fails or nothing matches.
pub async fn search_location<G: Geocoder>(geocoder: &G, query: &str) -> Option<GeoLocation> {
    match geocoder.search(query).await {
        Ok(places) => places.into_iter().next().map(Place::into_location),
        Err(err) => {
            warn!(query, error = %err, "Location search failed");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    struct FixedGeocoder {
        reply: Result<Place, GeocodeError>,
    }

    impl Geocoder for FixedGeocoder {
        async fn reverse_geocode(&self, _latitude: f64, _longitude: f64) -> Result<Place, GeocodeError> {
            self.reply.clone()
        }

        async fn search(&self, _query: &str) -> Result<Vec<Place>, GeocodeError> {
            self.reply.clone().map(|place| vec![place])
        }
    }

    fn sorriso() -> Place {
        Place {
            name: "Sorriso".to_owned(),
            country: "BR".to_owned(),
            state: Some("Mato Grosso".to_owned()),
            latitude: -12.5425,
            longitude: -55.7211,
        }
    }

    #[tokio::test]
    async fn successful_lookup_uses_name_and_country() {
        let geocoder = FixedGeocoder { reply: Ok(sorriso()) };
        let location = resolve_location(&geocoder, -12.9, -55.3).await;
        assert_eq!(location.name, "Sorriso, BR");
        assert_eq!(location.latitude, -12.9);
    }

    #[tokio::test]
    async fn failure_falls_back_to_coordinates() {
        let geocoder = FixedGeocoder {
            reply: Err(GeocodeError::Network("connection refused".to_owned())),
        };
        let location = resolve_location(&geocoder, -12.915_559, -55.314_216).await;
        assert_eq!(location.name, "-12.9156, -55.3142");
        assert_eq!(location.longitude, -55.314_216);
    }

    #[tokio::test]
    async fn search_takes_first_match() {
        let geocoder = FixedGeocoder { reply: Ok(sorriso()) };
        let location = search_location(&geocoder, "Sorriso").await.unwrap();
        assert_eq!(location.name, "Sorriso, Mato Grosso, BR");
        assert_eq!(location.latitude, -12.5425);

        let failing = FixedGeocoder {
            reply: Err(GeocodeError::NotFound),
        };
        assert!(search_location(&failing, "Atlantis").await.is_none());
    }

    #[test]
    fn display_name_without_state() {
        let place = Place {
            state: None,
            ..sorriso()
        };
        assert_eq!(place.display_name(), "Sorriso, BR");
    }

    #[test]
    fn default_location_is_central_us() {
        let location = default_location();
        assert_eq!(location.name, DEFAULT_LOCATION_NAME);
        assert_eq!(fallback_name(location.latitude, location.longitude), "39.8283, -98.5795");
    }
}
