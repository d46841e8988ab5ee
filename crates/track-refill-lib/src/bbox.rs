//! Geographic bounding boxes in WGS84 degrees
//!
//! This module provides the `BoundingBox` value type used for whole-route
//! extents and for the quadrants produced by recursive splitting.

/// An axis-aligned rectangle in latitude/longitude degrees
///
/// Invariant: `min_lat <= max_lat` and `min_lon <= max_lon`. Boxes are
/// immutable values; new ones are created from route geometry or by
/// [`BoundingBox::split`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Southern edge in degrees
    pub min_lat: f64,
    /// Western edge in degrees
    pub min_lon: f64,
    /// Northern edge in degrees
    pub max_lat: f64,
    /// Eastern edge in degrees
    pub max_lon: f64,
}

impl BoundingBox {
    /// Create a bounding box from corner coordinates
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        debug_assert!(min_lat <= max_lat && min_lon <= max_lon);
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Latitude extent in degrees
    #[inline]
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Longitude extent in degrees
    #[inline]
    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Whether either axis still exceeds `min_span` degrees
    ///
    /// Once a box stops being splittable, a recurring retryable upstream
    /// failure terminates the recursive fetch for good.
    #[inline]
    pub fn is_splittable(&self, min_span: f64) -> bool {
        self.lat_span() > min_span || self.lon_span() > min_span
    }

    /// Split into four equal quadrants by bisecting both axes at their midpoints
    ///
    /// Returned in fetch order: SW, SE, NW, NE. The quadrants share the
    /// midpoint edges exactly, so their union covers `self` with no gaps
    /// or overlaps beyond those shared edges.
    pub fn split(&self) -> [BoundingBox; 4] {
        let mid_lat = (self.min_lat + self.max_lat) / 2.0;
        let mid_lon = (self.min_lon + self.max_lon) / 2.0;

        let sw = BoundingBox::new(self.min_lat, self.min_lon, mid_lat, mid_lon);
        let se = BoundingBox::new(self.min_lat, mid_lon, mid_lat, self.max_lon);
        let nw = BoundingBox::new(mid_lat, self.min_lon, self.max_lat, mid_lon);
        let ne = BoundingBox::new(mid_lat, mid_lon, self.max_lat, self.max_lon);

        [sw, se, nw, ne]
    }
}
