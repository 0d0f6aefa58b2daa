//! Forecast viewer HTTP server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use dataset_gateway::{NomadsConfig, DEFAULT_BASE_URL};
use forecast_common::Region;
use forecast_viewer::config::{parse_image_size, ViewerConfig};
use forecast_viewer::router;
use forecast_viewer::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "forecast-viewer")]
#[command(about = "GFS regional forecast map viewer")]
struct Args {
    /// Listen address
    #[arg(short, long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    listen: String,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// NOMADS GrADS-DODS base URL for the hourly 0.25° GFS product
    #[arg(long, env = "NOMADS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    nomads_url: String,

    /// HTTP timeout for NOMADS requests, in seconds
    #[arg(long, env = "NOMADS_TIMEOUT_SECS", default_value_t = 120)]
    timeout_secs: u64,

    /// Preselect the run date this many days before today (UTC)
    #[arg(long, env = "DATE_OFFSET_DAYS", default_value_t = 0)]
    date_offset_days: i64,

    /// Region preselected in the form
    #[arg(long, env = "DEFAULT_REGION", default_value = "sabu-raijua")]
    default_region: String,

    /// Output image size, WIDTHxHEIGHT
    #[arg(long, env = "IMAGE_SIZE", default_value = "800x600", value_parser = parse_image_size)]
    image_size: (u32, u32),

    /// TrueType font for titles and labels [default: embedded DejaVu Sans]
    #[arg(long, env = "FONT_PATH")]
    font: Option<PathBuf>,

    /// GeoJSON file with land polygons and border lines [default: bundled regional map]
    #[arg(long, env = "BASEMAP_PATH")]
    basemap: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<ViewerConfig> {
        Region::builtin(&self.default_region)?;
        Ok(ViewerConfig {
            nomads: NomadsConfig {
                base_url: self.nomads_url,
                request_timeout: Duration::from_secs(self.timeout_secs),
            },
            date_offset_days: self.date_offset_days,
            default_region: self.default_region,
            image_size: self.image_size,
            font_path: self.font,
            basemap_path: self.basemap,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()?;

    info!("Prometheus metrics exporter initialized");

    let addr: SocketAddr = args.listen.parse()?;
    let config = args.into_config()?;
    info!(
        nomads = %config.nomads.base_url,
        region = %config.default_region,
        width = config.image_size.0,
        height = config.image_size.1,
        "Starting forecast viewer"
    );

    let state = Arc::new(AppState::new(config)?);
    let app = router(state, prometheus_handle);

    info!(address = %addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
