use crate::models::SimilarityWeights;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub ranking: RankingSettings,
    pub data: DataSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: None,
        }
    }
}

/// Without a `url` the service runs on the static catalogue and an
/// in-memory reaction store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
    pub run_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: None,
            min_connections: None,
            acquire_timeout_secs: None,
            idle_timeout_secs: None,
            run_migrations: true,
        }
    }
}

/// How bearer tokens are turned into user ids
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Verify HS256 tokens locally with `jwt_secret`
    #[default]
    Jwt,
    /// Ask the auth server at `url`
    Remote,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub mode: AuthMode,
    pub jwt_secret: Option<String>,
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingSettings {
    pub weights: WeightsConfig,
    pub default_limit: u16,
    pub max_limit: u16,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            weights: WeightsConfig::default(),
            default_limit: default_related_limit(),
            max_limit: default_max_related_limit(),
        }
    }
}

impl RankingSettings {
    pub fn similarity_weights(&self) -> SimilarityWeights {
        SimilarityWeights {
            region: self.weights.region,
            characteristic: self.weights.characteristic,
            environment: self.weights.environment,
            living_cost: self.weights.living_cost,
            living_cost_tolerance: self.weights.living_cost_tolerance,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_region_weight")]
    pub region: u32,
    #[serde(default = "default_characteristic_weight")]
    pub characteristic: u32,
    #[serde(default = "default_environment_weight")]
    pub environment: u32,
    #[serde(default = "default_living_cost_weight")]
    pub living_cost: u32,
    #[serde(default = "default_living_cost_tolerance")]
    pub living_cost_tolerance: u32,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            region: default_region_weight(),
            characteristic: default_characteristic_weight(),
            environment: default_environment_weight(),
            living_cost: default_living_cost_weight(),
            living_cost_tolerance: default_living_cost_tolerance(),
        }
    }
}

fn default_region_weight() -> u32 { 10 }
fn default_characteristic_weight() -> u32 { 5 }
fn default_environment_weight() -> u32 { 3 }
fn default_living_cost_weight() -> u32 { 2 }
fn default_living_cost_tolerance() -> u32 { 200_000 }

fn default_related_limit() -> u16 { 4 }
fn default_max_related_limit() -> u16 { 12 }

/// Static catalogue override; the embedded data set is used when unset
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub static_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration files (config/default.toml, config/local.toml)
    /// 3. Environment variables (prefixed with NOMAD__)
    /// 4. Well-known variables (DATABASE_URL, SUPABASE_*)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Development overrides
            .add_source(File::with_name("config/local").required(false))
            // e.g., NOMAD__SERVER__PORT -> server.port
            .add_source(nomad_env())
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(nomad_env())
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }

    /// Parse a TOML document without consulting the environment
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

fn nomad_env() -> Environment {
    Environment::with_prefix("NOMAD")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Apply the well-known variables shared with the rest of the stack
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let overrides = [
        ("DATABASE_URL", "database.url"),
        ("SUPABASE_URL", "auth.url"),
        ("SUPABASE_ANON_KEY", "auth.anon_key"),
        ("SUPABASE_JWT_SECRET", "auth.jwt_secret"),
    ];

    let mut builder = Config::builder().add_source(settings);

    for (var, key) in overrides {
        if let Ok(value) = env::var(var) {
            if !value.trim().is_empty() {
                builder = builder.set_override(key, value)?;
            }
        }
    }

    builder.build()
}
