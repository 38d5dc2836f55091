//! Credential resolution for the TMDb client
//!
//! Priority: ENV → TOML. Either credential may be absent; with neither, the
//! client sends unauthenticated requests, which the service rejects.

use cinecrud_common::config::TomlConfig;
use tracing::{info, warn};

/// Environment variable holding the TMDb read access token
pub const ACCESS_TOKEN_ENV: &str = "CINECRUD_TMDB_ACCESS_TOKEN";

/// Environment variable holding the TMDb API key
pub const API_KEY_ENV: &str = "CINECRUD_TMDB_API_KEY";

/// Resolved TMDb credentials
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub api_key: Option<String>,
}

impl Credentials {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.api_key.is_none()
    }
}

/// Validate a credential value (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve one credential from ENV, then TOML
fn resolve_one(name: &str, env_var: &str, toml_value: Option<&String>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|k| is_valid_key(k));
    let toml_value = toml_value.filter(|k| is_valid_key(k)).cloned();

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in both environment and TOML config. Using environment.",
            name
        );
    }

    if let Some(value) = env_value {
        info!("{} loaded from environment variable", name);
        return Some(value.trim().to_string());
    }

    if let Some(value) = toml_value {
        info!("{} loaded from TOML config", name);
        return Some(value.trim().to_string());
    }

    None
}

/// Resolve TMDb credentials from ENV and TOML
pub fn resolve_credentials(toml_config: &TomlConfig) -> Credentials {
    let credentials = Credentials {
        access_token: resolve_one(
            "TMDb access token",
            ACCESS_TOKEN_ENV,
            toml_config.tmdb_access_token.as_ref(),
        ),
        api_key: resolve_one("TMDb API key", API_KEY_ENV, toml_config.tmdb_api_key.as_ref()),
    };

    if credentials.is_empty() {
        warn!(
            "No TMDb credentials configured; remote requests will be rejected. Configure using one of:\n\
             1. Environment: {}=<token> or {}=<key>\n\
             2. TOML config: cinecrud-ui.toml (tmdb_access_token = \"...\" or tmdb_api_key = \"...\")",
            ACCESS_TOKEN_ENV, API_KEY_ENV
        );
    }

    credentials
}
