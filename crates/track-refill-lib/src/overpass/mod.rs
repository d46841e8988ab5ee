//! Overpass API integration
//!
//! Layered bottom-up: `query` builds Overpass QL strings, `transport`
//! performs single HTTP requests behind a trait, `client` classifies
//! responses into results or structured errors, `parser` turns response
//! XML into [`crate::WaterFeature`] records, and `resolve` drives the
//! adaptive split-and-retry loop on top of them all.

mod client;
mod parser;
mod query;
mod resolve;
mod transport;

pub use client::{DEFAULT_INTERPRETER_URL, DEFAULT_MAP_URL, FetchMode, OverpassClient};
pub use parser::parse_features;
pub use query::{map_request_url, water_query};
pub use resolve::{DEFAULT_MIN_SPAN_DEG, ResolveOptions};
pub use transport::{HttpTransport, Transport, TransportResponse};
