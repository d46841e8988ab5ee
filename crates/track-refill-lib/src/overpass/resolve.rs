//! Adaptive bounding-box resolution
//!
//! The Overpass API pushes back on queries it considers too large, either
//! with an error status or by timing out. The resolver answers that
//! pushback by waiting out an exponential backoff and splitting the box
//! into four quadrants, recursively, until each leaf box is small enough
//! to fetch in one request.

use crate::bbox::BoundingBox;
use crate::feature::{ElementKind, WaterFeature};
use crate::overpass::client::{FetchMode, OverpassClient};
use crate::overpass::transport::Transport;
use crate::{RefillError, Result};
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Default minimum quadrant span in degrees, roughly 1 km of latitude
pub const DEFAULT_MIN_SPAN_DEG: f64 = 0.01;

/// Upstream statuses answered by splitting the box
///
/// 400 and 429 mean the query was too large for the box or rate limited,
/// 504 means the upstream gateway timed out. 5xx statuses other than 504
/// are not assumed fixable by a smaller box and fail fast.
const RETRYABLE_STATUSES: [u16; 3] = [400, 429, 504];

/// Shift cap keeps the exponential backoff factor inside u64 range
const BACKOFF_SHIFT_CAP: u32 = 16;

/// Tuning for the adaptive resolve loop
#[derive(Clone, Debug)]
pub struct ResolveOptions {
    /// Smallest box edge in degrees below which no further split happens
    pub min_span_deg: f64,
    /// Hard deadline per leaf fetch
    pub timeout: Duration,
    /// Backoff before the first split
    pub initial_backoff: Duration,
    /// Upper bound for the exponential backoff
    pub max_backoff: Duration,
    /// Which upstream endpoint to fetch from
    pub mode: FetchMode,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            min_span_deg: DEFAULT_MIN_SPAN_DEG,
            timeout: Duration::from_secs(25),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            mode: FetchMode::default(),
        }
    }
}

impl ResolveOptions {
    /// Backoff before splitting: `initial * 2^attempt`, capped at `max_backoff`
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(BACKOFF_SHIFT_CAP);
        let millis = (self.initial_backoff.as_millis() as u64)
            .saturating_mul(factor)
            .min(self.max_backoff.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

/// Whether a failure is expected to succeed on a smaller box after a wait
fn is_retryable(error: &RefillError) -> bool {
    match error {
        RefillError::Timeout(_) => true,
        RefillError::UpstreamStatus { status, .. } => RETRYABLE_STATUSES.contains(status),
        _ => false,
    }
}

/// Mutable state of one top-level resolve call
///
/// Features are merged in concatenation order with the first occurrence
/// of each `(kind, id)` winning; the tile counter feeds the progress
/// callback after every successful leaf fetch.
struct ResolveRun<'a> {
    features: Vec<WaterFeature>,
    seen: HashSet<(ElementKind, i64)>,
    tiles_fetched: usize,
    on_progress: &'a mut (dyn FnMut(usize) + Send),
}

impl<T: Transport> OverpassClient<T> {
    /// Resolve every drinking-water feature inside `bbox`
    ///
    /// Fetches the whole box in one request when the upstream allows it.
    /// On a retryable failure (HTTP 400, 429, 504 or a local timeout) the
    /// box is split into four quadrants fetched sequentially in order
    /// SW, SE, NW, NE after an exponential backoff, recursively.
    /// `on_progress` receives the running count of completed leaf fetches.
    ///
    /// The result carries no duplicate `(kind, id)` pairs. A non-retryable
    /// failure, or a retryable one on a box already at minimum span,
    /// aborts the entire call; there is no partial success.
    pub async fn resolve_water(
        &self,
        bbox: BoundingBox,
        options: &ResolveOptions,
        mut on_progress: impl FnMut(usize) + Send,
    ) -> Result<Vec<WaterFeature>> {
        let mut run = ResolveRun {
            features: Vec::new(),
            seen: HashSet::new(),
            tiles_fetched: 0,
            on_progress: &mut on_progress,
        };
        self.resolve_quadrant(bbox, 0, options, &mut run).await?;
        Ok(run.features)
    }

    /// One recursion step: fetch the box, or back off and split on pushback
    ///
    /// Recursive async functions need an explicitly boxed future; `attempt`
    /// is the recursion depth and only feeds the backoff computation.
    fn resolve_quadrant<'a>(
        &'a self,
        bbox: BoundingBox,
        attempt: u32,
        options: &'a ResolveOptions,
        run: &'a mut ResolveRun<'_>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            tracing::debug!(
                "Fetching ({}, {}, {}, {}) at attempt {}",
                bbox.min_lat,
                bbox.min_lon,
                bbox.max_lat,
                bbox.max_lon,
                attempt
            );

            match self.fetch_water(&bbox, options).await {
                Ok(parsed) => {
                    run.tiles_fetched += 1;
                    (run.on_progress)(run.tiles_fetched);
                    for feature in parsed {
                        if run.seen.insert(feature.key()) {
                            run.features.push(feature);
                        }
                    }
                    Ok(())
                }
                Err(error) if is_retryable(&error) => {
                    if !bbox.is_splittable(options.min_span_deg) {
                        return Err(RefillError::NotSplittable(Box::new(error)));
                    }

                    let delay = options.backoff_delay(attempt);
                    tracing::warn!(
                        "Upstream rejected the box ({}); waiting {:?}, then splitting",
                        error,
                        delay
                    );
                    tokio::time::sleep(delay).await;

                    for quadrant in bbox.split() {
                        self.resolve_quadrant(quadrant, attempt + 1, options, run)
                            .await?;
                    }
                    Ok(())
                }
                Err(error) => Err(error),
            }
        })
    }
}
