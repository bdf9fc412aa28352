use artbox_api::{ApiConfig, AppState, RestApi, UploadLimits};
use artbox_core::defaults::{DEFAULT_THICKNESS_METERS, DEFAULT_TOP_N, DEFAULT_WIDTH_METERS};
use artbox_mesh::{MeshBuilder, MeshConfig};
use artbox_similarity::SimilarityRanker;
use artbox_storage::ArtworkStore;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Artwork marketplace backend with AR-ready canvas models
#[derive(Parser, Debug)]
#[command(name = "artbox")]
#[command(about = "Turns artwork images into AR canvas models and recommends similar pieces", long_about = None)]
struct Args {
    /// Path to the data directory
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// HTTP API port
    #[arg(long, env = "PORT", default_value_t = 5000)]
    http_port: u16,

    /// Folder scanned by /admin/populate
    #[arg(long, default_value = "./data/images")]
    import_dir: PathBuf,

    /// Width of generated canvas models in meters
    #[arg(long, default_value_t = DEFAULT_WIDTH_METERS)]
    width_meters: f32,

    /// Depth of generated canvas models in meters
    #[arg(long, default_value_t = DEFAULT_THICKNESS_METERS)]
    thickness_meters: f32,

    /// Recommendations returned when a request does not ask for a count
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    top_n: usize,

    /// Largest accepted image upload in MiB
    #[arg(long, default_value_t = 32)]
    max_upload_mb: usize,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mesh_config = MeshConfig {
        width_meters: args.width_meters,
        thickness_meters: args.thickness_meters,
    };
    mesh_config.validate()?;

    info!("Starting artbox v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", args.data_dir);
    info!("Import directory: {:?}", args.import_dir);
    info!("HTTP API port: {}", args.http_port);

    let store = Arc::new(ArtworkStore::new(&args.data_dir)?);
    info!("Storage initialized with {} artworks", store.count());

    let state = Arc::new(AppState::new(
        store,
        MeshBuilder::new(mesh_config),
        SimilarityRanker::default(),
        ApiConfig {
            import_dir: args.import_dir,
            default_top_n: args.top_n,
            upload_limits: UploadLimits::for_file_size(args.max_upload_mb.saturating_mul(1024 * 1024)),
        },
    ));

    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(state, http_port).await {
                error!("HTTP server error: {}", e);
            }
        })
    });

    info!("HTTP API: http://localhost:{}/", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
