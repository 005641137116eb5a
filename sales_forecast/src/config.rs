//! Settings resolved from the process environment
//!
//! Every resolver has a `from_lookup` form that takes a variable lookup
//! function, so callers and tests never need to mutate the real environment.

use crate::error::{PipelineError, Result};
use crate::models::{ArimaOrder, SeasonalOrder};
use std::fmt;
use std::time::Duration;

pub const ENV_SERVER: &str = "DB_SERVER";
pub const ENV_DATABASE: &str = "DB_DATABASE";
pub const ENV_USERNAME: &str = "DB_USERNAME";
pub const ENV_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_DRIVER: &str = "DB_DRIVER";
pub const ENV_PORT: &str = "DB_PORT";
pub const ENV_TRUST_CERTIFICATE: &str = "TRUST_SERVER_CERTIFICATE";
pub const ENV_EXTRA_PARAMS: &str = "DB_EXTRA_PARAMS";
pub const ENV_QUERY_TIMEOUT: &str = "DB_QUERY_TIMEOUT_SECS";
pub const ENV_MAX_CONNECTIONS: &str = "DB_MAX_CONNECTIONS";
pub const ENV_ORDER: &str = "FORECAST_ORDER";
pub const ENV_SEASONAL_ORDER: &str = "FORECAST_SEASONAL_ORDER";
pub const ENV_FIT_TIMEOUT: &str = "FORECAST_FIT_TIMEOUT_SECS";

const REQUIRED: [&str; 5] = [ENV_SERVER, ENV_DATABASE, ENV_USERNAME, ENV_PASSWORD, ENV_DRIVER];

/// Database driver selected by `DB_DRIVER`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Postgres,
    Sqlite,
}

impl Driver {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Driver::Postgres),
            "sqlite" => Ok(Driver::Sqlite),
            other => Err(PipelineError::Configuration(format!(
                "Unsupported database driver '{}'. Supported drivers: postgres, sqlite",
                other
            ))),
        }
    }

    /// Query returning the server version string
    pub fn version_query(self) -> &'static str {
        match self {
            Driver::Postgres => "SELECT version()",
            Driver::Sqlite => "SELECT sqlite_version()",
        }
    }

    /// Driver implied by a connection URL
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url.split(':').next().unwrap_or_default();
        Driver::parse(scheme)
    }
}

/// Connection parameters for the sales database
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub server: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub driver: Driver,
    pub trust_server_certificate: bool,
    pub port: Option<u16>,
    pub extra_params: Vec<(String, String)>,
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("server", &self.server)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("driver", &self.driver)
            .field("trust_server_certificate", &self.trust_server_certificate)
            .field("port", &self.port)
            .field("extra_params", &self.extra_params)
            .finish()
    }
}

impl DatabaseSettings {
    /// Resolve settings from the environment, loading `.env` first if present.
    pub fn resolve() -> Result<Self> {
        load_dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve settings through an arbitrary variable lookup.
    ///
    /// Every missing required variable is reported in a single error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut missing: Vec<&str> = REQUIRED
            .iter()
            .copied()
            .filter(|name| get(name).is_none())
            .collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(PipelineError::Configuration(format!(
                "Missing required environment variables: {}. Update your .env file or export the values.",
                missing.join(", ")
            )));
        }

        let required = |name: &str| get(name).unwrap_or_default();

        let port = match get(ENV_PORT) {
            Some(raw) => Some(raw.trim().parse::<u16>().map_err(|_| {
                PipelineError::Configuration(format!("{} must be a port number, got '{}'", ENV_PORT, raw))
            })?),
            None => None,
        };

        Ok(Self {
            server: required(ENV_SERVER),
            database: required(ENV_DATABASE),
            username: required(ENV_USERNAME),
            password: required(ENV_PASSWORD),
            driver: Driver::parse(&required(ENV_DRIVER))?,
            trust_server_certificate: get(ENV_TRUST_CERTIFICATE)
                .map(|raw| parse_flag(&raw))
                .unwrap_or(false),
            port,
            extra_params: get(ENV_EXTRA_PARAMS)
                .map(|raw| parse_extra_params(&raw))
                .unwrap_or_default(),
        })
    }

    /// Connection URL understood by sqlx
    pub fn connection_url(&self) -> String {
        let mut params: Vec<(String, String)> = Vec::new();

        let mut url = match self.driver {
            Driver::Postgres => {
                let host = match self.port {
                    Some(port) => format!("{}:{}", self.server, port),
                    None => self.server.clone(),
                };
                let sslmode = if self.trust_server_certificate {
                    "require"
                } else {
                    "prefer"
                };
                params.push(("sslmode".to_string(), sslmode.to_string()));
                format!(
                    "postgres://{}:{}@{}/{}",
                    urlencoding::encode(&self.username),
                    urlencoding::encode(&self.password),
                    host,
                    urlencoding::encode(&self.database)
                )
            }
            Driver::Sqlite => format!("sqlite://{}", self.database),
        };

        params.extend(self.extra_params.iter().cloned());
        if !params.is_empty() {
            let query = params
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&query);
        }

        url
    }
}

/// Pool sizing and deadlines for the data store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorOptions {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub query_timeout: Duration,
}

impl Default for ConnectorOptions {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
            query_timeout: Duration::from_secs(30),
        }
    }
}

impl ConnectorOptions {
    pub fn resolve() -> Result<Self> {
        load_dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            max_connections: parse_number(&lookup, ENV_MAX_CONNECTIONS)?
                .unwrap_or(defaults.max_connections),
            acquire_timeout: defaults.acquire_timeout,
            query_timeout: parse_number(&lookup, ENV_QUERY_TIMEOUT)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.query_timeout),
        })
    }
}

/// Model orders and fitting deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastConfig {
    pub order: ArimaOrder,
    pub seasonal_order: SeasonalOrder,
    pub fit_timeout: Duration,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            order: ArimaOrder::default(),
            seasonal_order: SeasonalOrder::default(),
            fit_timeout: Duration::from_secs(10),
        }
    }
}

impl ForecastConfig {
    pub fn resolve() -> Result<Self> {
        load_dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let order = match lookup(ENV_ORDER).filter(|v| !v.trim().is_empty()) {
            Some(raw) => {
                let parts = parse_orders(ENV_ORDER, &raw, 3)?;
                ArimaOrder::new(parts[0], parts[1], parts[2])
            }
            None => defaults.order,
        };

        let seasonal_order = match lookup(ENV_SEASONAL_ORDER).filter(|v| !v.trim().is_empty()) {
            Some(raw) => {
                let parts = parse_orders(ENV_SEASONAL_ORDER, &raw, 4)?;
                SeasonalOrder::new(parts[0], parts[1], parts[2], parts[3])
            }
            None => defaults.seasonal_order,
        };

        let fit_timeout = parse_number(&lookup, ENV_FIT_TIMEOUT)?
            .map(Duration::from_secs)
            .unwrap_or(defaults.fit_timeout);

        Ok(Self {
            order,
            seasonal_order,
            fit_timeout,
        })
    }
}

fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

fn parse_extra_params(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| {
            segment
                .split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        })
        .collect()
}

fn parse_number<F, T>(lookup: &F, name: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            PipelineError::Configuration(format!("{} must be a number, got '{}'", name, raw))
        }),
        None => Ok(None),
    }
}

fn parse_orders(name: &str, raw: &str, expected: usize) -> Result<Vec<usize>> {
    let parts = raw
        .split(',')
        .map(|part| part.trim().parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| {
            PipelineError::Configuration(format!(
                "{} must be {} comma-separated integers, got '{}'",
                name, expected, raw
            ))
        })?;

    if parts.len() != expected {
        return Err(PipelineError::Configuration(format!(
            "{} must be {} comma-separated integers, got '{}'",
            name, expected, raw
        )));
    }

    Ok(parts)
}
