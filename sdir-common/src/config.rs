//! Configuration resolution
//!
//! Settings resolve with ENV → TOML priority: every environment variable
//! overrides the corresponding TOML key, and the TOML file itself is
//! optional. With nothing configured the service starts zero-config
//! against in-memory collaborators.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 5780;

const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Record store backend selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// In-memory store (zero-config default and test double)
    Memory,
    /// Managed document database via its REST surface
    Firestore {
        project_id: String,
        api_key: String,
        base_url: String,
    },
}

/// Identity provider backend selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityConfig {
    /// In-memory credential table (zero-config default and test double)
    Memory,
    /// Managed identity toolkit via its REST surface
    Google { api_key: String, base_url: String },
}

/// Vision matcher endpoint; absent entirely when unconfigured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionConfig {
    pub endpoint: String,
    pub api_key: String,
}

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub record_store: StoreConfig,
    pub identity: IdentityConfig,
    /// `None` degrades photo search only; text search is unaffected
    pub vision: Option<VisionConfig>,
}

/// On-disk configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub firestore_project_id: Option<String>,
    pub firestore_api_key: Option<String>,
    pub firestore_base_url: Option<String>,
    pub identity_api_key: Option<String>,
    pub identity_base_url: Option<String>,
    pub face_endpoint: Option<String>,
    pub face_api_key: Option<String>,
}

impl TomlConfig {
    /// Read the file, returning defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read config failed: {e}")))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Parse config failed: {e}")))
    }
}

/// Default configuration file path for the platform
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("sdir").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("sdir.toml"))
}

/// Validate a key or endpoint value (non-empty, non-whitespace)
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}

impl AppConfig {
    /// Resolve configuration from environment variables over an optional
    /// TOML file. `cli_port` (from the command line) wins over both.
    pub fn load(config_path: Option<&Path>, cli_port: Option<u16>) -> Result<Self> {
        let default_path = default_config_path();
        let path = config_path.unwrap_or(&default_path);
        let toml = TomlConfig::load(path)?;
        Ok(Self::resolve(&toml, cli_port))
    }

    fn resolve(toml: &TomlConfig, cli_port: Option<u16>) -> Self {
        let port = cli_port
            .or_else(|| env_var("SDIR_PORT").and_then(|v| v.parse().ok()))
            .or(toml.port)
            .unwrap_or(DEFAULT_PORT);

        let record_store = resolve_store(toml);
        let identity = resolve_identity(toml);
        let vision = resolve_vision(toml);

        AppConfig {
            port,
            record_store,
            identity,
            vision,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| is_valid_value(v))
}

fn resolve_store(toml: &TomlConfig) -> StoreConfig {
    let project_id = env_var("SDIR_FIRESTORE_PROJECT_ID").or_else(|| toml.firestore_project_id.clone());
    let api_key = env_var("SDIR_FIRESTORE_API_KEY").or_else(|| toml.firestore_api_key.clone());

    match (project_id, api_key) {
        (Some(project_id), Some(api_key)) => {
            let base_url = env_var("SDIR_FIRESTORE_BASE_URL")
                .or_else(|| toml.firestore_base_url.clone())
                .unwrap_or_else(|| DEFAULT_FIRESTORE_BASE_URL.to_string());
            info!("Record store: firestore project {}", project_id);
            StoreConfig::Firestore {
                project_id,
                api_key,
                base_url,
            }
        }
        (None, None) => {
            info!("Record store: in-memory (no firestore credentials configured)");
            StoreConfig::Memory
        }
        _ => {
            warn!(
                "Incomplete firestore configuration (need both project id and \
                 API key); falling back to in-memory record store"
            );
            StoreConfig::Memory
        }
    }
}

fn resolve_identity(toml: &TomlConfig) -> IdentityConfig {
    match env_var("SDIR_IDENTITY_API_KEY").or_else(|| toml.identity_api_key.clone()) {
        Some(api_key) => {
            let base_url = env_var("SDIR_IDENTITY_BASE_URL")
                .or_else(|| toml.identity_base_url.clone())
                .unwrap_or_else(|| DEFAULT_IDENTITY_BASE_URL.to_string());
            info!("Identity provider: identity toolkit");
            IdentityConfig::Google { api_key, base_url }
        }
        None => {
            info!("Identity provider: in-memory (no API key configured)");
            IdentityConfig::Memory
        }
    }
}

fn resolve_vision(toml: &TomlConfig) -> Option<VisionConfig> {
    let endpoint = env_var("SDIR_FACE_ENDPOINT").or_else(|| toml.face_endpoint.clone());
    let api_key = env_var("SDIR_FACE_KEY").or_else(|| toml.face_api_key.clone());

    match (endpoint, api_key) {
        (Some(endpoint), Some(api_key)) => Some(VisionConfig { endpoint, api_key }),
        (None, None) => {
            warn!("Vision matcher not configured; photo search unavailable");
            None
        }
        _ => {
            warn!(
                "Incomplete vision matcher configuration (need both endpoint \
                 and key); photo search unavailable"
            );
            None
        }
    }
}
