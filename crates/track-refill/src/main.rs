mod settings;

use clap::Parser;
use settings::Settings;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::process::ExitCode;
use track_refill_lib::overpass::OverpassClient;
use track_refill_lib::{Route, filter_near};

/// Install the fmt subscriber, defaulting RUST_LOG when unset.
fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    if std::env::var("RUST_LOG").is_err() {
        // Safety: single-threaded at startup
        unsafe {
            std::env::set_var("RUST_LOG", "info,hyper_util=warn,reqwest::connect=warn");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

fn main() -> ExitCode {
    setup_logging();
    let settings = Settings::parse();

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(error) => {
            tracing::error!("Failed to start async runtime: {}", error);
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(&settings)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            match error.status() {
                Some(status) => tracing::error!("{} (upstream HTTP {})", error, status),
                None => tracing::error!("{}", error),
            }
            ExitCode::FAILURE
        }
    }
}

/// Parse the route, resolve water features around it and write the
/// enriched GPX.
async fn run(settings: &Settings) -> track_refill_lib::Result<()> {
    let route = Route::from_path(&settings.gpx_file)?;
    tracing::info!(
        "Loaded {} points in {} polylines from {}",
        route.total_points(),
        route.polylines().len(),
        settings.gpx_file.display()
    );

    let mut client = OverpassClient::new()?;
    if let Some(endpoint) = &settings.endpoint {
        client.set_interpreter_url(endpoint.clone());
    }
    if let Some(endpoint) = &settings.map_endpoint {
        client.set_map_url(endpoint.clone());
    }

    let options = settings.resolve_options();
    let features = client
        .resolve_water(route.bounding_box(), &options, |tiles| {
            tracing::info!("Fetched Overpass tile {}", tiles);
        })
        .await?;
    tracing::info!(
        "Resolved {} water features in the bounding box",
        features.len()
    );

    let nearby = filter_near(route.polylines(), features, settings.radius);
    tracing::info!(
        "{} features within {} m of the route",
        nearby.len(),
        settings.radius
    );

    let output_path = settings.output_path();
    let mut writer = BufWriter::new(File::create(&output_path)?);
    gpx::write(&route.with_water_waypoints(&nearby), &mut writer)?;
    writer.flush()?;
    tracing::info!("Wrote {}", output_path.display());

    Ok(())
}
