//! Overpass query construction
//!
//! The two upstream endpoints take their bounding box in *different*
//! coordinate orders: the QL interpreter wants `(south,west,north,east)`
//! while the raw map endpoint wants `bbox=west,south,east,north`. Each
//! builder keeps its own order; mixing them up silently returns features
//! for the wrong region, with no error to catch.

use crate::bbox::BoundingBox;
use crate::feature::WATER_TAGS;
use std::time::Duration;

/// Build the Overpass QL query for drinking-water elements inside `bbox`
///
/// Requests nodes, ways and relations for every water tag. The output
/// statement is `out body center;` so that ways and relations carry a
/// computed centroid, which is the only position they can have.
pub fn water_query(bbox: &BoundingBox, timeout: Duration) -> String {
    let bounds = format!(
        "{},{},{},{}",
        bbox.min_lat, bbox.min_lon, bbox.max_lat, bbox.max_lon
    );

    let mut query = format!("[out:xml][timeout:{}];\n(\n", timeout.as_secs().max(1));
    for (key, value) in WATER_TAGS {
        for kind in ["node", "way", "relation"] {
            query.push_str(&format!("  {kind}[\"{key}\"=\"{value}\"]({bounds});\n"));
        }
    }
    query.push_str(");\nout body center;\n");
    query
}

/// Build the raw map-data GET URL for `bbox`
pub fn map_request_url(base: &str, bbox: &BoundingBox) -> String {
    format!(
        "{}?bbox={},{},{},{}",
        base, bbox.min_lon, bbox.min_lat, bbox.max_lon, bbox.max_lat
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_bbox() -> BoundingBox {
        BoundingBox::new(37.0, -122.0, 37.1, -121.9)
    }

    #[test]
    fn test_query_bbox_is_lat_lon_ordered() {
        let query = water_query(&create_test_bbox(), Duration::from_secs(25));
        assert!(query.contains("(37,-122,37.1,-121.9)"));
    }

    #[test]
    fn test_query_requests_every_kind_for_every_tag() {
        let query = water_query(&create_test_bbox(), Duration::from_secs(25));
        for (key, value) in WATER_TAGS {
            for kind in ["node", "way", "relation"] {
                let selector = format!("{kind}[\"{key}\"=\"{value}\"]");
                assert!(query.contains(&selector), "missing selector {selector}");
            }
        }
    }

    #[test]
    fn test_query_header_and_output_statement() {
        let query = water_query(&create_test_bbox(), Duration::from_secs(25));
        assert!(query.starts_with("[out:xml][timeout:25];"));
        assert!(query.ends_with("out body center;\n"));
    }

    #[test]
    fn test_query_timeout_is_at_least_one_second() {
        let query = water_query(&create_test_bbox(), Duration::from_millis(100));
        assert!(query.starts_with("[out:xml][timeout:1];"));
    }

    #[test]
    fn test_map_url_is_lon_lat_ordered() {
        let url = map_request_url("https://overpass-api.de/api/map", &create_test_bbox());
        assert_eq!(
            url,
            "https://overpass-api.de/api/map?bbox=-122,37,-121.9,37.1"
        );
    }
}
