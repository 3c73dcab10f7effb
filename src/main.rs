//! Face Telemetry CLI
//!
//! Acquires the shared tracker, prints every paced snapshot as a JSON
//! line and releases the tracker on Ctrl-C or after `--count` snapshots.

use clap::Parser;
use face_telemetry::{
    capture::FileConfig,
    landmarks::FaceProfile,
    worker::{StopSignal, SyntheticBackend, TelemetryService},
};
use rand_core::{OsRng, RngCore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "face-telemetry", version, about = "Facial-landmark stress telemetry")]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Worker frame rate.
    #[arg(long)]
    fps: Option<u32>,

    /// Camera device index.
    #[arg(long)]
    device: Option<u32>,

    /// Landmark model asset to check before starting.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Rate at which snapshots are printed.
    #[arg(long)]
    stream_fps: Option<u32>,

    /// Stop after this many snapshots (0 = until Ctrl-C).
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Metrics server port (0 disables; needs the `metrics` feature).
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Seed for the synthetic face.
    #[arg(long)]
    seed: Option<u64>,

    /// Read frames from the real camera (needs the `camera` feature).
    #[arg(long)]
    native_camera: bool,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    info!("Face Telemetry v{}", face_telemetry::VERSION);

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let seed = args.seed.unwrap_or_else(|| OsRng.next_u64());
    let mut backend = SyntheticBackend::new(FaceProfile::default(), seed);
    if args.native_camera {
        backend = backend.with_native_camera();
    }
    info!(seed, native_camera = args.native_camera, "Using synthetic landmark detector");

    let service = TelemetryService::new(config.tracker.clone(), Arc::new(backend));

    spawn_metrics_server(config.output.metrics_port, service.clone());

    let cancel = StopSignal::new();
    let handler_cancel = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_cancel.raise()) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    let session = service.session();
    let limit = match config.output.snapshot_count {
        0 => u64::MAX,
        n => n,
    };
    let mut printed = 0u64;

    for snapshot in session.stream(config.output.stream_fps, cancel.clone()) {
        let Some(snapshot) = snapshot else {
            continue;
        };

        match serde_json::to_string(snapshot.as_ref()) {
            Ok(line) => println!("{}", line),
            Err(e) => {
                error!(error = %e, "Failed to serialize snapshot");
                continue;
            }
        }

        printed += 1;
        if printed >= limit {
            break;
        }
    }

    drop(session);
    let stats = service.stats();
    info!(
        printed,
        starts = stats.starts,
        stops = stats.stops,
        published = service.publisher().published_count(),
        "Done"
    );
}

fn load_config(args: &Args) -> Result<FileConfig, face_telemetry::capture::ConfigError> {
    let mut config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    config.apply_env()?;

    if let Some(fps) = args.fps {
        config.tracker.capture.fps = fps;
    }
    if let Some(device) = args.device {
        config.tracker.capture.device_id = device;
    }
    if let Some(model) = &args.model {
        config.tracker.model_path = Some(model.clone());
    }
    if let Some(stream_fps) = args.stream_fps {
        config.output.stream_fps = stream_fps;
    }
    if let Some(count) = args.count {
        config.output.snapshot_count = count;
    }
    if let Some(port) = args.metrics_port {
        config.output.metrics_port = port;
    }

    config.tracker.validate()?;
    Ok(config)
}

#[cfg(feature = "metrics")]
fn spawn_metrics_server(port: u16, service: TelemetryService) {
    use face_telemetry::metrics::{MetricsRegistry, MetricsServer, MetricsServerConfig};

    if port == 0 {
        return;
    }
    let registry = match MetricsRegistry::new() {
        Ok(registry) => registry,
        Err(e) => {
            warn!(error = %e, "Metrics server disabled");
            return;
        }
    };
    let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry, service);

    let spawned = std::thread::Builder::new()
        .name("metrics-server".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!(error = %e, "Failed to start metrics runtime");
                    return;
                }
            };
            if let Err(e) = runtime.block_on(server.run()) {
                warn!(error = %e, "Metrics server stopped");
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, "Failed to spawn metrics server thread");
    }
}

#[cfg(not(feature = "metrics"))]
fn spawn_metrics_server(port: u16, _service: TelemetryService) {
    if port != 0 {
        tracing::debug!(port, "Built without the `metrics` feature, HTTP exporter disabled");
    }
}
