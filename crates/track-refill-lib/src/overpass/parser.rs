//! Overpass XML response parsing
//!
//! Streams through the document once, collecting `node`, `way` and
//! `relation` elements whose tags mark them as drinking-water sources.
//! Handles both interpreter output (`out body center;`) and raw map-data
//! output; the latter has no `<center>` elements, so its ways and
//! relations come back without a position.

use crate::Result;
use crate::feature::{ElementKind, WaterFeature};
use geo::Point;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::BTreeMap;

/// Parse an Overpass XML document into water features, in document order
///
/// Nodes require finite `lat`/`lon` attributes and are dropped otherwise.
/// Ways and relations take their position from a nested `<center>` when
/// one exists and are kept without one when it does not. Elements whose
/// tags do not match the water set are skipped. Malformed XML propagates
/// as [`crate::RefillError::ResponseParse`].
pub fn parse_features(xml: &str) -> Result<Vec<WaterFeature>> {
    let mut reader = Reader::from_str(xml);
    let mut features = Vec::new();
    let mut pending: Option<PendingElement> = None;

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                if let Some(kind) = element_kind(element.name().as_ref()) {
                    pending = Some(open_element(kind, &element)?);
                } else {
                    apply_child(pending.as_mut(), &element)?;
                }
            }
            Event::Empty(element) => {
                if let Some(kind) = element_kind(element.name().as_ref()) {
                    // Self-closing element, typically an untagged node
                    if let Some(feature) = open_element(kind, &element)?.finish() {
                        features.push(feature);
                    }
                } else {
                    apply_child(pending.as_mut(), &element)?;
                }
            }
            Event::End(element) => {
                if element_kind(element.name().as_ref()).is_some() {
                    if let Some(feature) = pending.take().and_then(PendingElement::finish) {
                        features.push(feature);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(features)
}

/// Element being accumulated while scanning its children
struct PendingElement {
    kind: ElementKind,
    id: Option<i64>,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<(f64, f64)>,
    tags: BTreeMap<String, String>,
}

impl PendingElement {
    fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            id: None,
            lat: None,
            lon: None,
            center: None,
            tags: BTreeMap::new(),
        }
    }

    /// Turn the accumulated element into a feature, if it qualifies
    fn finish(self) -> Option<WaterFeature> {
        if !WaterFeature::matches_water_tags(&self.tags) {
            return None;
        }

        let id = match self.id {
            Some(id) => id,
            None => {
                tracing::warn!("Skipping {} without a parseable id", self.kind);
                return None;
            }
        };

        let position = match self.kind {
            ElementKind::Node => match (self.lat, self.lon) {
                (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                    Some(Point::new(lon, lat))
                }
                _ => {
                    tracing::warn!("Skipping node {} without a finite position", id);
                    return None;
                }
            },
            // Ways and relations are kept even without a computed center
            ElementKind::Way | ElementKind::Relation => self
                .center
                .filter(|(lat, lon)| lat.is_finite() && lon.is_finite())
                .map(|(lat, lon)| Point::new(lon, lat)),
        };

        Some(WaterFeature {
            id,
            kind: self.kind,
            position,
            tags: self.tags,
        })
    }
}

fn element_kind(name: &[u8]) -> Option<ElementKind> {
    match name {
        b"node" => Some(ElementKind::Node),
        b"way" => Some(ElementKind::Way),
        b"relation" => Some(ElementKind::Relation),
        _ => None,
    }
}

/// Read the identifying attributes off a `node`/`way`/`relation` tag
fn open_element(kind: ElementKind, element: &BytesStart<'_>) -> Result<PendingElement> {
    let mut pending = PendingElement::new(kind);
    for attribute in element.attributes().with_checks(false) {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let value = attribute.unescape_value()?;
        match attribute.key.as_ref() {
            b"id" => pending.id = value.parse().ok(),
            b"lat" => pending.lat = value.parse().ok(),
            b"lon" => pending.lon = value.parse().ok(),
            _ => {}
        }
    }
    Ok(pending)
}

/// Fold a `tag` or `center` child into the surrounding element
///
/// Children arriving outside any element (or other child kinds such as
/// `nd` and `member`) are ignored.
fn apply_child(pending: Option<&mut PendingElement>, element: &BytesStart<'_>) -> Result<()> {
    let Some(pending) = pending else {
        return Ok(());
    };

    match element.name().as_ref() {
        b"tag" => {
            let mut key = None;
            let mut value = None;
            for attribute in element.attributes().with_checks(false) {
                let attribute = attribute.map_err(quick_xml::Error::from)?;
                match attribute.key.as_ref() {
                    b"k" => key = Some(attribute.unescape_value()?.into_owned()),
                    b"v" => value = Some(attribute.unescape_value()?.into_owned()),
                    _ => {}
                }
            }
            if let (Some(key), Some(value)) = (key, value) {
                pending.tags.insert(key, value);
            }
        }
        b"center" => {
            let mut lat = None;
            let mut lon = None;
            for attribute in element.attributes().with_checks(false) {
                let attribute = attribute.map_err(quick_xml::Error::from)?;
                match attribute.key.as_ref() {
                    b"lat" => lat = attribute.unescape_value()?.parse().ok(),
                    b"lon" => lon = attribute.unescape_value()?.parse().ok(),
                    _ => {}
                }
            }
            if let (Some(lat), Some(lon)) = (lat, lon) {
                pending.center = Some((lat, lon));
            }
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERPRETER_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="Overpass API">
  <node id="101" lat="51.5074" lon="-0.1278">
    <tag k="amenity" v="drinking_water"/>
    <tag k="name" v="Trafalgar Fountain"/>
  </node>
  <node id="102" lat="51.5080" lon="-0.1290"/>
  <way id="201">
    <center lat="51.5100" lon="-0.1300"/>
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="natural" v="spring"/>
  </way>
  <relation id="301">
    <member type="way" ref="201" role="outer"/>
    <tag k="man_made" v="water_tap"/>
  </relation>
  <node id="103" lat="51.5090" lon="-0.1280">
    <tag k="amenity" v="bench"/>
  </node>
</osm>"#;

    #[test]
    fn test_parses_matching_elements_in_document_order() {
        let features = parse_features(INTERPRETER_SAMPLE).unwrap();
        assert_eq!(features.len(), 3);

        assert_eq!(features[0].kind, ElementKind::Node);
        assert_eq!(features[0].id, 101);
        assert_eq!(features[1].kind, ElementKind::Way);
        assert_eq!(features[1].id, 201);
        assert_eq!(features[2].kind, ElementKind::Relation);
        assert_eq!(features[2].id, 301);
    }

    #[test]
    fn test_node_position_from_attributes() {
        let features = parse_features(INTERPRETER_SAMPLE).unwrap();
        let position = features[0].position.unwrap();
        assert!((position.x() - -0.1278).abs() < 1e-9);
        assert!((position.y() - 51.5074).abs() < 1e-9);
    }

    #[test]
    fn test_way_position_from_center() {
        let features = parse_features(INTERPRETER_SAMPLE).unwrap();
        let position = features[1].position.unwrap();
        assert!((position.x() - -0.1300).abs() < 1e-9);
        assert!((position.y() - 51.5100).abs() < 1e-9);
    }

    #[test]
    fn test_relation_without_center_is_kept_positionless() {
        let features = parse_features(INTERPRETER_SAMPLE).unwrap();
        assert_eq!(features[2].kind, ElementKind::Relation);
        assert!(features[2].position.is_none());
    }

    #[test]
    fn test_untagged_and_unrelated_elements_are_skipped() {
        // Node 102 has no tags, node 103 is a bench
        let features = parse_features(INTERPRETER_SAMPLE).unwrap();
        assert!(!features.iter().any(|f| f.id == 102 || f.id == 103));
    }

    #[test]
    fn test_tags_are_collected() {
        let features = parse_features(INTERPRETER_SAMPLE).unwrap();
        assert_eq!(
            features[0].tags.get("name").map(String::as_str),
            Some("Trafalgar Fountain")
        );
        assert_eq!(
            features[0].tags.get("amenity").map(String::as_str),
            Some("drinking_water")
        );
    }

    #[test]
    fn test_idempotent_parse() {
        let first = parse_features(INTERPRETER_SAMPLE).unwrap();
        let second = parse_features(INTERPRETER_SAMPLE).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_node_without_position_is_dropped() {
        let xml = r#"<osm>
  <node id="1">
    <tag k="amenity" v="drinking_water"/>
  </node>
  <node id="2" lat="nan" lon="0.5">
    <tag k="amenity" v="drinking_water"/>
  </node>
</osm>"#;
        let features = parse_features(xml).unwrap();
        assert!(features.is_empty());
    }

    #[test]
    fn test_escaped_attribute_values_are_unescaped() {
        let xml = r#"<osm>
  <node id="1" lat="48.85" lon="2.35">
    <tag k="amenity" v="drinking_water"/>
    <tag k="name" v="Fountain &amp; Tap"/>
  </node>
</osm>"#;
        let features = parse_features(xml).unwrap();
        assert_eq!(
            features[0].tags.get("name").map(String::as_str),
            Some("Fountain & Tap")
        );
    }

    #[test]
    fn test_element_without_id_is_dropped() {
        let xml = r#"<osm>
  <node lat="48.85" lon="2.35">
    <tag k="amenity" v="drinking_water"/>
  </node>
</osm>"#;
        let features = parse_features(xml).unwrap();
        assert!(features.is_empty());
    }

    #[test]
    fn test_map_data_way_without_center_is_kept() {
        // Raw map-data output lists member nodes but computes no center
        let xml = r#"<osm version="0.6">
  <way id="42">
    <nd ref="10"/>
    <nd ref="11"/>
    <tag k="man_made" v="water_tap"/>
  </way>
</osm>"#;
        let features = parse_features(xml).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].id, 42);
        assert!(features[0].position.is_none());
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let result = parse_features("<osm><node id=</osm>");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_document_yields_no_features() {
        let features = parse_features(r#"<osm version="0.6"></osm>"#).unwrap();
        assert!(features.is_empty());
    }
}
