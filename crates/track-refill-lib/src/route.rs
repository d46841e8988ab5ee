//! Route storage and parsing module
//!
//! This module provides the `Route` struct for storing parsed GPX data
//! with precomputed metadata: the geographic bounding box handed to the
//! Overpass query and the polylines handed to the proximity filter.

use crate::{BoundingBox, RefillError, Result, WaterFeature};
use geo::{Coord, LineString};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A parsed GPX route with raw data and precomputed metadata
#[derive(Clone, Debug)]
pub struct Route {
    /// The original GPX data
    gpx_data: gpx::Gpx,
    /// Bounding box of all finite points, in degrees
    bounding_box: BoundingBox,
    /// One polyline per track segment or GPX route, in (lon, lat) degrees
    polylines: Vec<LineString<f64>>,
    /// Cached total number of points (computed once during construction)
    cached_total_points: usize,
}

impl Route {
    /// Create a new Route from GPX data
    ///
    /// # Arguments
    /// * `gpx_data` - Parsed GPX data containing tracks and/or routes
    ///
    /// # Returns
    /// A `Route` on success, or an error if the data holds no points or
    /// no finite points
    pub fn new(gpx_data: gpx::Gpx) -> Result<Self> {
        let (bounding_box, polylines, total_points) = Self::compute_metadata(&gpx_data)?;

        Ok(Route {
            gpx_data,
            bounding_box,
            polylines,
            cached_total_points: total_points,
        })
    }

    /// Read and parse a GPX file from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Self::new(gpx::read(reader)?)
    }

    /// Compute all metadata in a single pass over the data
    ///
    /// Returns (bounding_box, polylines, total_points)
    fn compute_metadata(gpx: &gpx::Gpx) -> Result<(BoundingBox, Vec<LineString<f64>>, usize)> {
        let mut min_lat = f64::INFINITY;
        let mut min_lon = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut max_lon = f64::NEG_INFINITY;

        let mut polylines = Vec::new();
        let mut total_points: usize = 0;

        let point_runs = gpx
            .tracks
            .iter()
            .flat_map(|track| track.segments.iter().map(|segment| &segment.points))
            .chain(gpx.routes.iter().map(|route| &route.points));

        for points in point_runs {
            total_points += points.len();
            let mut coords = Vec::with_capacity(points.len());

            for waypoint in points {
                let point = waypoint.point();
                let (lon, lat) = (point.x(), point.y());

                if !lon.is_finite() || !lat.is_finite() {
                    tracing::warn!("Skipping non-finite route point: ({}, {})", lat, lon);
                    continue;
                }

                min_lat = min_lat.min(lat);
                min_lon = min_lon.min(lon);
                max_lat = max_lat.max(lat);
                max_lon = max_lon.max(lon);

                coords.push(Coord { x: lon, y: lat });
            }

            if !coords.is_empty() {
                polylines.push(LineString(coords));
            }
        }

        if total_points == 0 {
            return Err(RefillError::EmptyRoute);
        }
        if polylines.is_empty() {
            return Err(RefillError::InvalidGeometry(
                "no finite points in route".to_string(),
            ));
        }

        let bounding_box = BoundingBox::new(min_lat, min_lon, max_lat, max_lon);
        Ok((bounding_box, polylines, total_points))
    }

    /// Get the bounding box of the route in degrees
    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    /// Get the route geometry as (lon, lat) polylines
    #[inline]
    pub fn polylines(&self) -> &[LineString<f64>] {
        &self.polylines
    }

    /// Access the raw GPX data
    #[inline]
    pub fn gpx_data(&self) -> &gpx::Gpx {
        &self.gpx_data
    }

    /// Get total number of points across all tracks, segments and routes
    ///
    /// This is O(1) as the value is cached during construction.
    #[inline]
    pub fn total_points(&self) -> usize {
        self.cached_total_points
    }

    /// Build a copy of the GPX data with one waypoint per water feature
    ///
    /// The original tracks and routes are untouched; features without a
    /// position are skipped.
    pub fn with_water_waypoints(&self, features: &[WaterFeature]) -> gpx::Gpx {
        let mut enriched = self.gpx_data.clone();

        for feature in features {
            let Some(position) = feature.position else {
                continue;
            };

            let mut waypoint = gpx::Waypoint::new(position);
            waypoint.name = Some(feature.label().to_string());
            waypoint.source = Some("OpenStreetMap".to_string());
            waypoint.symbol = Some("Drinking Water".to_string());
            waypoint.comment = Some(format!("{} {}", feature.kind, feature.id));
            enriched.waypoints.push(waypoint);
        }

        enriched
    }
}
