//! Configuration loading and root folder resolution
//!
//! The TOML file holds credentials for the metadata service, so it is kept out
//! of version control and written with owner-only permissions.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "CINECRUD_ROOT_FOLDER";

/// Application directory name under the platform config/data directories
const APP_DIR: &str = "cinecrud";

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (`error`, `warn`, `info`, `debug`, `trace`)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Catalog section of the TOML config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Collection name the presenter manages
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Search query used to seed the collection
    #[serde(default = "default_query")]
    pub default_query: String,

    /// Rows per table page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Prefix of persisted storage keys
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_collection() -> String {
    "tmdb_movies".to_string()
}

fn default_query() -> String {
    "marvel".to_string()
}

fn default_page_size() -> usize {
    10
}

fn default_key_prefix() -> String {
    crate::snapshot::DEFAULT_KEY_PREFIX.to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            default_query: default_query(),
            page_size: default_page_size(),
            key_prefix: default_key_prefix(),
        }
    }
}

/// Contents of `cinecrud-ui.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,

    /// TMDb v4 read access token (sent as a bearer credential)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_access_token: Option<String>,

    /// TMDb v3 API key (sent as the `api_key` query parameter)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_api_key: Option<String>,

    // Tables must follow plain values in the serialized document
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Default path of a module's TOML config: `<config_dir>/cinecrud/<module>.toml`
pub fn config_file_path(module_name: &str) -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR).join(format!("{}.toml", module_name)))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Load TOML config; a missing file yields defaults
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        debug!("No config file at {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

    warn_if_permissions_loose(path);
    Ok(config)
}

#[cfg(unix)]
fn warn_if_permissions_loose(path: &Path) {
    if let Ok(true) = check_toml_permissions_loose(path) {
        warn!(
            "Config file {} is readable by other users; it may contain credentials (chmod 600)",
            path.display()
        );
    }
}

#[cfg(not(unix))]
fn warn_if_permissions_loose(_path: &Path) {}

/// Write TOML config atomically (temp file + rename), owner-only on Unix
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("toml.tmp");
    {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))?;
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::Io(e));
    }

    Ok(())
}

/// True when group or others can read the file
#[cfg(unix)]
pub fn check_toml_permissions_loose(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    let mode = fs::metadata(path)?.permissions().mode();
    Ok(mode & 0o077 != 0)
}

/// Root folder resolution, in priority order:
/// 1. Command-line argument
/// 2. `CINECRUD_ROOT_FOLDER` environment variable
/// 3. `root_folder` in the TOML config
/// 4. OS-dependent default
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>, config: &TomlConfig) -> Self {
        Self {
            cli_arg,
            toml_value: config.root_folder.clone(),
        }
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_value {
            return path.clone();
        }

        default_root_folder()
    }
}

/// OS-dependent default root folder (`<data_local_dir>/cinecrud`)
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./cinecrud_data"))
}

/// Creates the root folder layout on first start
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        fs::create_dir_all(self.storage_path())?;
        Ok(())
    }

    /// Directory holding the persisted collections
    pub fn storage_path(&self) -> PathBuf {
        self.root.join("storage")
    }
}
