use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::assessment::{GatePolicy, Stage};

/// Distinguishes runtime behavior for different stages of the service.
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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub storage: StorageConfig,
    pub assessment: AssessmentConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("SDGX_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("SDGX_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("SDGX_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("SDGX_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let data_dir = non_empty_var("SDGX_DATA_DIR").map(PathBuf::from);
        let catalog_path = non_empty_var("SDGX_CATALOG").map(PathBuf::from);

        let entry_stage = match non_empty_var("SDGX_ENTRY_STAGE") {
            Some(raw) => Stage::parse(&raw).ok_or(ConfigError::InvalidEntryStage(raw))?,
            None => Stage::Welcome,
        };
        if entry_stage.requires_identity() {
            return Err(ConfigError::GatedEntryStage(entry_stage));
        }
        let results_require_answers = match non_empty_var("SDGX_RESULTS_REQUIRE_ANSWERS") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                name: "SDGX_RESULTS_REQUIRE_ANSWERS",
                value: raw,
            })?,
            None => false,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            storage: StorageConfig { data_dir },
            assessment: AssessmentConfig {
                catalog_path,
                entry_stage,
                results_require_answers,
            },
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
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

/// Where session state lives. No directory means process memory only.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AssessmentConfig {
    /// JSON catalog replacing the built-in questionnaire.
    pub catalog_path: Option<PathBuf>,
    pub entry_stage: Stage,
    pub results_require_answers: bool,
}

impl AssessmentConfig {
    pub fn gate_policy(&self) -> GatePolicy {
        GatePolicy {
            entry_stage: self.entry_stage,
            results_require_answers: self.results_require_answers,
        }
    }
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            entry_stage: Stage::Welcome,
            results_require_answers: false,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidEntryStage(String),
    GatedEntryStage(Stage),
    InvalidFlag { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "SDGX_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "SDGX_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidEntryStage(value) => {
                write!(f, "SDGX_ENTRY_STAGE '{}' does not name a stage", value)
            }
            ConfigError::GatedEntryStage(stage) => write!(
                f,
                "SDGX_ENTRY_STAGE '{}' needs a completed identity and cannot be the entry stage",
                stage.label()
            ),
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{} must be true or false, got '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidEntryStage(_)
            | ConfigError::GatedEntryStage(_)
            | ConfigError::InvalidFlag { .. } => None,
        }
    }
}
