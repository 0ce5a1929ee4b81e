//! Application configuration.

use serde::Deserialize;
use std::path::Path;
use url::Url;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Web Push configuration. Push endpoints report unavailable without it.
    #[serde(default)]
    pub push: Option<PushConfig>,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
    /// Origins allowed to make credentialed (cookie) requests.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// VAPID (Voluntary Application Server Identification) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    /// Public key handed to browsers as the application server key
    /// (base64url, uncompressed P-256 point).
    pub vapid_public_key: String,
}

/// Configuration for the push subscription client.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the campus API.
    pub api_url: Url,
    /// Well-known path of the service worker script.
    #[serde(default = "default_worker_script")]
    pub worker_script: String,
    /// Scope the service worker is registered for.
    #[serde(default = "default_worker_scope")]
    pub worker_scope: String,
    /// Topics a user is subscribed to when enabling push.
    #[serde(default = "default_topics")]
    pub default_topics: Vec<String>,
}

impl ClientConfig {
    /// Client configuration pointing at `api_url` with default worker
    /// settings.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            worker_script: default_worker_script(),
            worker_scope: default_worker_scope(),
            default_topics: default_topics(),
        }
    }

    /// Load the `client` section of the config files in `dir`, overridden
    /// by `CAMPUS__CLIENT__*` environment variables.
    pub fn load_from(dir: &Path) -> Result<Self, config::ConfigError> {
        layered(dir)?.get::<Self>("client")
    }
}

/// `default`, then `{CAMPUS_ENV}`, from `dir`, then `CAMPUS`-prefixed
/// environment variables.
fn layered(dir: &Path) -> Result<config::Config, config::ConfigError> {
    let env = std::env::var("CAMPUS_ENV").unwrap_or_else(|_| "development".to_string());
    let file = |name: &str| {
        config::File::with_name(&dir.join(name).to_string_lossy()).required(false)
    };

    config::Config::builder()
        .add_source(file("default"))
        .add_source(file(&env))
        .add_source(
            config::Environment::with_prefix("CAMPUS")
                .separator("__")
                .try_parsing(true),
        )
        .build()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_worker_script() -> String {
    "/sw.js".to_string()
}

fn default_worker_scope() -> String {
    "/".to_string()
}

fn default_topics() -> Vec<String> {
    vec!["announcements".to_string()]
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `CAMPUS_ENV`)
    /// 3. Environment variables with `CAMPUS_` prefix (a `.env` file is
    ///    read into the environment first)
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        Self::load_from(Path::new("config"))
    }

    /// Load configuration from the files in `dir` and the environment.
    pub fn load_from(dir: &Path) -> Result<Self, config::ConfigError> {
        layered(dir)?.try_deserialize()
    }
}
