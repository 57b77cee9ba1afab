//! sdir-web - Student directory web service
//!
//! Zero-config startup: without external credentials the service runs
//! entirely on in-memory backends; with Firestore, identity, and vision
//! credentials it delegates to the managed services.

use anyhow::Result;
use clap::Parser;
use sdir_common::config::{AppConfig, IdentityConfig, StoreConfig};
use sdir_web::services::face::FaceClient;
use sdir_web::services::identity::{GoogleIdentity, IdentityProvider, MemoryIdentity};
use sdir_web::services::record_store::{FirestoreStore, MemoryStore, RecordStore};
use sdir_web::{build_router, AppState};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "sdir-web", version, about = "Student directory web service")]
struct Cli {
    /// Listen port (overrides config file and environment)
    #[arg(long, env = "SDIR_PORT")]
    port: Option<u16>,

    /// Path to the TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting sdir-web v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(cli.config.as_deref(), cli.port)?;

    let store = match &config.record_store {
        StoreConfig::Firestore {
            project_id,
            api_key,
            base_url,
        } => {
            info!("Record store: Firestore project {}", project_id);
            RecordStore::Firestore(FirestoreStore::new(
                base_url.clone(),
                project_id.clone(),
                api_key.clone(),
            )?)
        }
        StoreConfig::Memory => {
            info!("Record store: in-memory (no credentials configured)");
            RecordStore::Memory(MemoryStore::new())
        }
    };

    let identity = match &config.identity {
        IdentityConfig::Google { api_key, base_url } => {
            info!("Identity provider: managed toolkit");
            IdentityProvider::Google(
                GoogleIdentity::new(base_url.clone(), api_key.clone())
                    .map_err(|e| anyhow::anyhow!("identity client init failed: {e}"))?,
            )
        }
        IdentityConfig::Memory => {
            info!("Identity provider: in-memory (no credentials configured)");
            IdentityProvider::Memory(MemoryIdentity::new())
        }
    };

    let face = match &config.vision {
        Some(vision) => {
            info!("Photo search: enabled against {}", vision.endpoint);
            Some(
                FaceClient::new(vision)
                    .map_err(|e| anyhow::anyhow!("vision client init failed: {e}"))?,
            )
        }
        None => {
            warn!("Photo search: unavailable (vision credentials not configured)");
            None
        }
    };

    let state = AppState::new(store, identity, face);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port)).await?;
    info!("sdir-web listening on http://127.0.0.1:{}", config.port);
    info!("Health check: http://127.0.0.1:{}/health", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
