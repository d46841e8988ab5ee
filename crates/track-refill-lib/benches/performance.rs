//! Performance benchmarks for track-refill-lib
//!
//! Run with: cargo bench --package track-refill-lib

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use geo::Point;
use gpx::{Gpx, Track, TrackSegment, Waypoint};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Duration;
use track_refill_lib::overpass::{parse_features, water_query};
use track_refill_lib::{ElementKind, Route, WaterFeature, filter_near};

/// Generate a realistic GPX track with the specified number of points.
fn generate_gpx_track(num_points: usize, base_lat: f64, base_lon: f64) -> Gpx {
    let mut gpx = Gpx::default();
    let mut track = Track::default();
    let mut segment = TrackSegment::default();

    for i in 0..num_points {
        let t = i as f64 / num_points as f64;
        let lat = base_lat + t * 0.1 + (t * 50.0).sin() * 0.001;
        let lon = base_lon + t * 0.1 + (t * 30.0).cos() * 0.001;
        segment.points.push(Waypoint::new(Point::new(lon, lat)));
    }

    track.segments.push(segment);
    gpx.tracks.push(track);
    gpx
}

/// Generate candidate features scattered around the track corridor
fn generate_candidates(num: usize) -> Vec<WaterFeature> {
    (0..num)
        .map(|i| {
            let t = i as f64 / num as f64;
            WaterFeature {
                id: i as i64 + 1,
                kind: ElementKind::Node,
                position: Some(Point::new(
                    -0.1 + t * 0.1,
                    51.5 + t * 0.1 + ((i % 13) as f64) * 0.002,
                )),
                tags: BTreeMap::new(),
            }
        })
        .collect()
}

/// Generate an Overpass XML document with the given number of nodes
fn generate_overpass_xml(num_nodes: usize) -> String {
    let mut xml =
        String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<osm version=\"0.6\">\n");
    for i in 0..num_nodes {
        let lat = 51.5 + (i as f64) * 1e-5;
        let lon = -0.1 + (i as f64) * 1e-5;
        let _ = write!(
            xml,
            "  <node id=\"{}\" lat=\"{lat}\" lon=\"{lon}\">\n    \
             <tag k=\"amenity\" v=\"drinking_water\"/>\n  </node>\n",
            i + 1
        );
    }
    xml.push_str("</osm>\n");
    xml
}

// ============================================================================
// Core Benchmarks - Key performance indicators
// ============================================================================

fn bench_proximity_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("proximity");

    let route = Route::new(generate_gpx_track(50_000, 51.5, -0.1)).unwrap();
    let candidates = generate_candidates(2_000);

    group.throughput(Throughput::Elements(candidates.len() as u64));
    group.bench_function("filter_2k_against_50k_points", |b| {
        b.iter(|| filter_near(route.polylines(), candidates.clone(), 250.0));
    });

    group.finish();
}

fn bench_response_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");
    group.sample_size(20);

    for num_nodes in [1_000usize, 10_000] {
        let xml = generate_overpass_xml(num_nodes);
        group.throughput(Throughput::Elements(num_nodes as u64));
        group.bench_function(format!("parse_{num_nodes}_nodes"), |b| {
            b.iter(|| parse_features(&xml).unwrap());
        });
    }

    group.finish();
}

fn bench_route_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");
    group.sample_size(20);

    let gpx = generate_gpx_track(50_000, 51.5, -0.1);

    group.throughput(Throughput::Elements(50_000));
    group.bench_function("route_50k_points", |b| {
        b.iter(|| Route::new(gpx.clone()).unwrap());
    });

    group.finish();
}

fn bench_query_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");

    let route = Route::new(generate_gpx_track(1_000, 51.5, -0.1)).unwrap();
    let bbox = route.bounding_box();

    group.bench_function("water_query", |b| {
        b.iter(|| water_query(&bbox, Duration::from_secs(25)));
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_proximity_filter,
    bench_response_parsing,
    bench_route_construction,
    bench_query_building,
);

criterion_main!(benches);
