//! Proximity filtering of water features against route geometry
//!
//! Distances are computed on a spherical Web Mercator plane. At route
//! scale (tens of kilometers) the planar approximation stays well within
//! the tolerance a "nearby water" search needs; the error grows with
//! latitude and with the extent of the box.

use crate::feature::WaterFeature;
use geo::{LineString, Point};

/// Spherical Earth radius in meters used by the Web Mercator projection
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Convert WGS84 (lat, lon) in degrees to Web Mercator (x, y) in meters
///
/// # Arguments
/// * `lat` - Latitude in degrees (-85.05 to 85.05)
/// * `lon` - Longitude in degrees (-180 to 180)
#[inline(always)]
pub fn wgs84_to_mercator(lat: f64, lon: f64) -> Point<f64> {
    // Clamp latitude to the valid Web Mercator range
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);

    let x = lon.to_radians() * EARTH_RADIUS_M;
    let y = (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0)
        .tan()
        .ln()
        * EARTH_RADIUS_M;

    Point::new(x, y)
}

/// Squared distance from `point` to the segment `a`-`b`, in meters squared
///
/// The projection parameter is clamped to `[0, 1]`, so positions beyond
/// either endpoint measure against that endpoint. A zero-length segment
/// degrades to plain point distance.
#[inline]
fn point_to_segment_sq(point: Point<f64>, a: Point<f64>, b: Point<f64>) -> f64 {
    let dx = b.x() - a.x();
    let dy = b.y() - a.y();
    let length_sq = dx * dx + dy * dy;

    let t = if length_sq == 0.0 {
        0.0
    } else {
        (((point.x() - a.x()) * dx + (point.y() - a.y()) * dy) / length_sq).clamp(0.0, 1.0)
    };

    let ex = point.x() - (a.x() + t * dx);
    let ey = point.y() - (a.y() + t * dy);
    ex * ex + ey * ey
}

/// Project route polylines to Mercator once, ahead of the feature scan
fn project_lines(lines: &[LineString<f64>]) -> Vec<Vec<Point<f64>>> {
    lines
        .iter()
        .map(|line| {
            line.points()
                .map(|point| wgs84_to_mercator(point.y(), point.x()))
                .collect()
        })
        .collect()
}

/// Whether `point` lies within `radius_sq` of any segment of `line`
fn near_polyline(point: Point<f64>, line: &[Point<f64>], radius_sq: f64) -> bool {
    match line {
        [] => false,
        [only] => point_to_segment_sq(point, *only, *only) <= radius_sq,
        _ => line
            .windows(2)
            .any(|pair| point_to_segment_sq(point, pair[0], pair[1]) <= radius_sq),
    }
}

/// Keep the features within `radius_m` meters of any route polyline
///
/// Features without a finite position are excluded. The segment scan for
/// each feature stops at the first distance within the radius.
pub fn filter_near(
    lines: &[LineString<f64>],
    features: Vec<WaterFeature>,
    radius_m: f64,
) -> Vec<WaterFeature> {
    let projected = project_lines(lines);
    let radius_sq = radius_m * radius_m;

    features
        .into_iter()
        .filter(|feature| {
            let Some(position) = feature.position else {
                return false;
            };
            if !position.x().is_finite() || !position.y().is_finite() {
                return false;
            }
            let point = wgs84_to_mercator(position.y(), position.x());
            projected
                .iter()
                .any(|line| near_polyline(point, line, radius_sq))
        })
        .collect()
}
