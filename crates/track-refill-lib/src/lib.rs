//! Track Refill Library - Drinking-Water Discovery Along GPX Routes
//!
//! This library takes a parsed GPX route, queries the OpenStreetMap
//! Overpass API for drinking-water features around it, and filters the
//! results down to the points actually close to the track. Overpass load
//! shedding is absorbed by an adaptive resolver that splits the bounding
//! box into quadrants and retries with exponential backoff.
//!
//! # Architecture
//!
//! - **[`Route`]**: Immutable storage for parsed GPX data plus derived geometry
//! - **[`overpass`]**: Query building, HTTP transport, XML parsing and the adaptive resolver
//! - **[`WaterFeature`]**: A single drinking-water point of interest from OSM
//! - **[`filter_near`]**: Web Mercator point-to-polyline proximity filter

mod bbox;
mod feature;
pub mod overpass;
mod proximity;
mod route;

// Public API exports
pub use bbox::BoundingBox;
pub use feature::{ElementKind, WATER_TAGS, WaterFeature};
pub use proximity::{EARTH_RADIUS_M, MAX_LATITUDE, filter_near, wgs84_to_mercator};
pub use route::Route;

/// Error types for route parsing and water discovery
#[derive(Debug, thiserror::Error)]
pub enum RefillError {
    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Empty route")]
    EmptyRoute,

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Overpass returned HTTP {status}: {excerpt}")]
    UpstreamStatus { status: u16, excerpt: String },

    #[error("Malformed Overpass response: {0}")]
    ResponseParse(#[from] quick_xml::Error),

    #[error("Bounding box reached minimum span and still failed: {0}")]
    NotSplittable(#[source] Box<RefillError>),
}

impl RefillError {
    /// HTTP status carried by this error, if any
    ///
    /// [`RefillError::NotSplittable`] reports the status of the failure
    /// it wraps, so callers see why the last quadrant gave up.
    pub fn status(&self) -> Option<u16> {
        match self {
            RefillError::UpstreamStatus { status, .. } => Some(*status),
            RefillError::NotSplittable(inner) => inner.status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RefillError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_surfaces_through_not_splittable() {
        let inner = RefillError::UpstreamStatus {
            status: 429,
            excerpt: "rate limited".to_string(),
        };
        let wrapped = RefillError::NotSplittable(Box::new(inner));

        assert_eq!(wrapped.status(), Some(429));
    }

    #[test]
    fn test_status_is_none_for_local_errors() {
        assert_eq!(RefillError::EmptyRoute.status(), None);
        assert_eq!(
            RefillError::Timeout(std::time::Duration::from_secs(25)).status(),
            None
        );
    }

    #[test]
    fn test_upstream_message_names_the_status() {
        let error = RefillError::UpstreamStatus {
            status: 504,
            excerpt: "gateway timeout".to_string(),
        };
        assert!(error.to_string().contains("504"));
    }
}
