//! Runtime configuration.
//!
//! Everything the process needs is read once in `main` and passed down as
//! an explicit `AppConfig` — there is no process-wide mutable default and
//! no hidden client singleton. Values come from the environment (with a
//! `.env` file honored in development); the alias table ships as data and
//! is swapped by constructing the config with a different table.

use serde::{Deserialize, Serialize};

use crate::fields::AliasTable;

/// Application-level constants.
pub const APP_NAME: &str = "Wardline";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing directive when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    "wardline=info,tower_http=warn".to_string()
}

// ═══════════════════════════════════════════
// Config types
// ═══════════════════════════════════════════

/// Full runtime configuration, constructed once in `main`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub directory: DirectoryConfig,
    pub session: SessionConfig,
    pub aliases: AliasTable,
}

/// Bind address for the chat API server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Where and how to reach the upstream patient directory.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Base URL without trailing slash, e.g. `http://localhost:5010/api`.
    pub base_url: String,
    /// Path of the patient list endpoint, e.g. `/Patient`.
    pub patients_path: String,
    /// Request timeout in seconds; a timed-out call is abandoned, not
    /// retried.
    pub timeout_secs: u64,
    pub auth: AuthMode,
    /// Query parameter name the upstream uses for name filtering.
    pub name_param: String,
    /// Row limit sent when the caller didn't ask for one.
    pub default_limit: u32,
}

/// Upstream authentication mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum AuthMode {
    None,
    Bearer { token: String },
    ApiKey { header: String, token: String },
}

/// Conversation history bounds.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Turns kept per session; the oldest is evicted first.
    pub max_turns: usize,
}

// ═══════════════════════════════════════════
// Defaults + environment loading
// ═══════════════════════════════════════════

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5010/api".to_string(),
            patients_path: "/Patient".to_string(),
            timeout_secs: 30,
            auth: AuthMode::None,
            name_param: "name".to_string(),
            default_limit: 10,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_turns: 10 }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            directory: DirectoryConfig::default(),
            session: SessionConfig::default(),
            aliases: AliasTable::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment, falling back to defaults
    /// for anything unset. Unparseable numeric values fall back too — a
    /// bad `WARDLINE_PORT` should not take the service down with a panic.
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();

        let auth = match env_str("WARDLINE_AUTH_TYPE").as_deref() {
            Some("bearer") => match env_str("WARDLINE_AUTH_TOKEN") {
                Some(token) => AuthMode::Bearer { token },
                None => {
                    tracing::warn!("WARDLINE_AUTH_TYPE=bearer but no WARDLINE_AUTH_TOKEN set");
                    AuthMode::None
                }
            },
            Some("api_key") => match env_str("WARDLINE_AUTH_TOKEN") {
                Some(token) => AuthMode::ApiKey {
                    header: env_str("WARDLINE_AUTH_HEADER")
                        .unwrap_or_else(|| "X-API-Key".to_string()),
                    token,
                },
                None => {
                    tracing::warn!("WARDLINE_AUTH_TYPE=api_key but no WARDLINE_AUTH_TOKEN set");
                    AuthMode::None
                }
            },
            Some("none") | None => AuthMode::None,
            Some(other) => {
                tracing::warn!(auth_type = other, "unknown WARDLINE_AUTH_TYPE, using none");
                AuthMode::None
            }
        };

        Self {
            server: ServerConfig {
                host: env_str("WARDLINE_HOST").unwrap_or(defaults.server.host),
                port: env_parse("WARDLINE_PORT").unwrap_or(defaults.server.port),
            },
            directory: DirectoryConfig {
                base_url: env_str("WARDLINE_DIRECTORY_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.directory.base_url),
                patients_path: env_str("WARDLINE_PATIENTS_PATH")
                    .unwrap_or(defaults.directory.patients_path),
                timeout_secs: env_parse("WARDLINE_TIMEOUT_SECS")
                    .unwrap_or(defaults.directory.timeout_secs),
                auth,
                name_param: env_str("WARDLINE_NAME_PARAM").unwrap_or(defaults.directory.name_param),
                default_limit: env_parse("WARDLINE_DEFAULT_LIMIT")
                    .unwrap_or(defaults.directory.default_limit),
            },
            session: SessionConfig::default(),
            aliases: AliasTable::default(),
        }
    }
}

fn env_str(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_str(key).and_then(|v| v.parse().ok())
}
