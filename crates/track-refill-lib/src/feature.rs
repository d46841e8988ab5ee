//! Water feature records parsed from Overpass responses

use geo::Point;
use std::collections::BTreeMap;
use std::fmt;

/// OSM tag matches that identify a drinking-water source
///
/// Shared by the query builder (which requests exactly these) and the
/// response parser (which filters on them again, since the raw map-data
/// endpoint returns every element in the box).
pub const WATER_TAGS: [(&str, &str); 3] = [
    ("amenity", "drinking_water"),
    ("natural", "spring"),
    ("man_made", "water_tap"),
];

/// The OSM element kinds a feature can originate from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    /// Element name as it appears in OSM XML
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single drinking-water point of interest
///
/// Identity is `(kind, id)`: OSM ids repeat across element kinds, so the
/// id alone is not unique. `position` is `(lon, lat)` in degrees; ways and
/// relations may lack one when the upstream did not compute a center for
/// them.
#[derive(Clone, Debug, PartialEq)]
pub struct WaterFeature {
    pub id: i64,
    pub kind: ElementKind,
    pub position: Option<Point<f64>>,
    pub tags: BTreeMap<String, String>,
}

impl WaterFeature {
    /// Dedup key used when merging quadrant results
    #[inline]
    pub fn key(&self) -> (ElementKind, i64) {
        (self.kind, self.id)
    }

    /// Whether a tag map marks an element as a drinking-water source
    pub fn matches_water_tags(tags: &BTreeMap<String, String>) -> bool {
        WATER_TAGS
            .iter()
            .any(|(key, value)| tags.get(*key).is_some_and(|v| v == value))
    }

    /// Human-readable label for exported waypoints
    ///
    /// Prefers the mapped `name`, falling back to a label derived from
    /// whichever water tag matched.
    pub fn label(&self) -> &str {
        if let Some(name) = self.tags.get("name") {
            return name;
        }
        if self.tags.get("natural").is_some_and(|v| v == "spring") {
            "Spring"
        } else if self.tags.get("man_made").is_some_and(|v| v == "water_tap") {
            "Water tap"
        } else {
            "Drinking water"
        }
    }
}
