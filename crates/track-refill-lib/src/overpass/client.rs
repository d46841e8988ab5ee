//! Overpass upstream client
//!
//! One network request per call, no retrying here. Splitting and retrying
//! on upstream pushback belongs to the resolver built on top.

use crate::bbox::BoundingBox;
use crate::feature::WaterFeature;
use crate::overpass::resolve::ResolveOptions;
use crate::overpass::transport::{HttpTransport, Transport};
use crate::overpass::{parser, query};
use crate::{RefillError, Result};
use std::time::Duration;

/// Default Overpass QL interpreter endpoint
pub const DEFAULT_INTERPRETER_URL: &str = "https://overpass-api.de/api/interpreter";

/// Default raw map-data endpoint
pub const DEFAULT_MAP_URL: &str = "https://overpass-api.de/api/map";

/// How many characters of an error body to keep for diagnostics
const EXCERPT_CHARS: usize = 200;

/// Which upstream endpoint a fetch targets
///
/// The interpreter runs an Overpass QL query that already filters to the
/// water tag set; the map endpoint dumps every element in the box and
/// relies on the parser to filter. Both yield the same feature shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FetchMode {
    /// POST an Overpass QL query to the interpreter endpoint
    #[default]
    Interpreter,
    /// GET everything in the box from the raw map-data endpoint
    Map,
}

/// Client for the Overpass API, generic over its HTTP transport
#[derive(Clone, Debug)]
pub struct OverpassClient<T: Transport = HttpTransport> {
    transport: T,
    interpreter_url: String,
    map_url: String,
}

impl OverpassClient<HttpTransport> {
    /// Create a client against the public Overpass instance
    pub fn new() -> Result<Self> {
        Ok(Self::with_transport(HttpTransport::new()?))
    }
}

impl<T: Transport> OverpassClient<T> {
    /// Create a client over a custom transport
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            interpreter_url: DEFAULT_INTERPRETER_URL.to_string(),
            map_url: DEFAULT_MAP_URL.to_string(),
        }
    }

    /// Override the QL interpreter endpoint
    pub fn set_interpreter_url(&mut self, url: impl Into<String>) {
        self.interpreter_url = url.into();
    }

    /// Override the raw map-data endpoint
    pub fn set_map_url(&mut self, url: impl Into<String>) {
        self.map_url = url.into();
    }

    /// Issue exactly one upstream request for `bbox` and return the raw body
    ///
    /// A non-2xx status becomes [`RefillError::UpstreamStatus`] carrying
    /// the code and a short excerpt of the body.
    pub async fn fetch_raw(
        &self,
        bbox: &BoundingBox,
        mode: FetchMode,
        timeout: Duration,
    ) -> Result<String> {
        let response = match mode {
            FetchMode::Interpreter => {
                let data = query::water_query(bbox, timeout);
                self.transport
                    .post_form(&self.interpreter_url, &[("data", data.as_str())], timeout)
                    .await?
            }
            FetchMode::Map => {
                let url = query::map_request_url(&self.map_url, bbox);
                self.transport.get(&url, timeout).await?
            }
        };

        if !(200..300).contains(&response.status) {
            return Err(RefillError::UpstreamStatus {
                status: response.status,
                excerpt: body_excerpt(&response.body),
            });
        }

        Ok(response.body)
    }

    /// Fetch and parse the water features inside `bbox`
    pub async fn fetch_water(
        &self,
        bbox: &BoundingBox,
        options: &ResolveOptions,
    ) -> Result<Vec<WaterFeature>> {
        let body = self.fetch_raw(bbox, options.mode, options.timeout).await?;
        parser::parse_features(&body)
    }
}

/// First [`EXCERPT_CHARS`] characters of an error body
fn body_excerpt(body: &str) -> String {
    body.chars().take(EXCERPT_CHARS).collect()
}
