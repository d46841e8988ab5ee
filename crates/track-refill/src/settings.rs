use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use track_refill_lib::overpass::{FetchMode, ResolveOptions};

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Track Refill - Find drinking water along a GPX route
pub struct Settings {
    /// GPX file with the route to search along
    #[clap(value_name = "FILE")]
    pub gpx_file: PathBuf,

    /// Output GPX file (defaults to the input with a .water.gpx extension)
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Search radius around the route in meters
    #[clap(short, long, default_value = "250.0")]
    pub radius: f64,

    /// Bounding-box span in degrees below which quadrant splitting stops
    #[clap(long, default_value = "0.01", value_parser = positive_degrees)]
    pub min_span: f64,

    /// Per-request timeout in seconds, also sent to the Overpass server
    #[clap(long, default_value = "25")]
    pub timeout_secs: u64,

    /// Backoff before the first split retry, in milliseconds
    #[clap(long, default_value = "500")]
    pub initial_backoff_ms: u64,

    /// Upper bound for the exponential backoff, in milliseconds
    #[clap(long, default_value = "8000")]
    pub max_backoff_ms: u64,

    /// Overpass interpreter endpoint
    #[clap(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Overpass raw map endpoint, used with --use-map-api
    #[clap(long, value_name = "URL")]
    pub map_endpoint: Option<String>,

    /// Fetch raw map data instead of running a filtered water query
    #[clap(long, default_value = "false")]
    pub use_map_api: bool,
}

/// A zero or negative span would make quadrant splitting never terminate,
/// so refuse it at the flag level.
fn positive_degrees(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|error| format!("{error}"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(String::from("must be a positive number of degrees"))
    }
}

impl Settings {
    /// Resolver options derived from the CLI flags
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            min_span_deg: self.min_span,
            timeout: Duration::from_secs(self.timeout_secs),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            mode: if self.use_map_api {
                FetchMode::Map
            } else {
                FetchMode::Interpreter
            },
        }
    }

    /// Output path, derived from the input when not given explicitly
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.gpx_file.with_extension("water.gpx"))
    }
}
