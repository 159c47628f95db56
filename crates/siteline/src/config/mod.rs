use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use url::Url;

use crate::availability::{ScheduleError, WeeklySchedule};

/// Distinguishes runtime behavior for different stages of the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the site backend.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub leads: LeadConfig,
    pub availability: AvailabilityConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let endpoint = env::var("LEAD_ENDPOINT").unwrap_or_else(|_| DEFAULT_LEAD_ENDPOINT.to_string());
        let endpoint = parse_endpoint(&endpoint)?;
        let timeout_secs = parse_number("LEAD_TIMEOUT_SECS", 15)?;
        let reset_delay_ms = parse_number("LEAD_RESET_DELAY_MS", 5_000)?;

        let poll_secs = parse_number("AVAILABILITY_POLL_SECS", 60)?;
        if poll_secs == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "AVAILABILITY_POLL_SECS",
            });
        }
        let schedule = match env::var("BUSINESS_HOURS") {
            Ok(raw) => raw
                .parse::<WeeklySchedule>()
                .map_err(|source| ConfigError::InvalidSchedule { source })?,
            Err(_) => WeeklySchedule::standard(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            leads: LeadConfig {
                endpoint,
                timeout: Duration::from_secs(timeout_secs),
                reset_delay: Duration::from_millis(reset_delay_ms),
            },
            availability: AvailabilityConfig {
                poll_interval: Duration::from_secs(poll_secs),
                schedule,
            },
        })
    }
}

const DEFAULT_LEAD_ENDPOINT: &str = "http://127.0.0.1:8787/api/leads";

fn parse_number(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidEndpoint {
        value: raw.to_string(),
        reason: source.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::InvalidEndpoint {
            value: raw.to_string(),
            reason: format!("unsupported scheme '{scheme}'"),
        }),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where and how leads are delivered.
#[derive(Debug, Clone)]
pub struct LeadConfig {
    pub endpoint: Url,
    pub timeout: Duration,
    pub reset_delay: Duration,
}

/// Business hours and the cadence the status is refreshed at.
#[derive(Debug, Clone)]
pub struct AvailabilityConfig {
    pub poll_interval: Duration,
    pub schedule: WeeklySchedule,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    InvalidEndpoint { value: String, reason: String },
    InvalidSchedule { source: ScheduleError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a positive whole number")
            }
            ConfigError::InvalidEndpoint { value, reason } => {
                write!(f, "LEAD_ENDPOINT '{value}' is not usable: {reason}")
            }
            ConfigError::InvalidSchedule { source } => {
                write!(f, "BUSINESS_HOURS is invalid: {source}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidSchedule { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidEndpoint { .. } => None,
        }
    }
}
