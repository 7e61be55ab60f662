use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::disputes::DeadlineRules;

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
    pub deadlines: DeadlineConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            deadlines: DeadlineConfig::load()?,
        })
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

/// Statutory response windows in days, overridable per election cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineConfig {
    pub defense_days: i64,
    pub evidence_days: i64,
    pub final_allegations_days: i64,
    pub appeal_days: i64,
    pub allegations_days: i64,
    pub recourse_days: i64,
    pub counter_allegations_days: i64,
}

impl DeadlineConfig {
    fn load() -> Result<Self, ConfigError> {
        let statutory = DeadlineRules::statutory();
        Ok(Self {
            defense_days: parse_days("DEADLINE_DEFENSE_DAYS", statutory.defense_days)?,
            evidence_days: parse_days("DEADLINE_EVIDENCE_DAYS", statutory.evidence_days)?,
            final_allegations_days: parse_days(
                "DEADLINE_FINAL_ALLEGATIONS_DAYS",
                statutory.final_allegations_days,
            )?,
            appeal_days: parse_days("DEADLINE_APPEAL_DAYS", statutory.appeal_days)?,
            allegations_days: parse_days("DEADLINE_ALLEGATIONS_DAYS", statutory.allegations_days)?,
            recourse_days: parse_days("DEADLINE_RECOURSE_DAYS", statutory.recourse_days)?,
            counter_allegations_days: parse_days(
                "DEADLINE_COUNTER_ALLEGATIONS_DAYS",
                statutory.counter_allegations_days,
            )?,
        })
    }

    pub fn rules(&self) -> DeadlineRules {
        DeadlineRules {
            defense_days: self.defense_days,
            evidence_days: self.evidence_days,
            final_allegations_days: self.final_allegations_days,
            appeal_days: self.appeal_days,
            allegations_days: self.allegations_days,
            recourse_days: self.recourse_days,
            counter_allegations_days: self.counter_allegations_days,
        }
    }
}

fn parse_days(var: &'static str, default: i64) -> Result<i64, ConfigError> {
    let raw = match env::var(var) {
        Ok(raw) => raw,
        Err(_) => return Ok(default),
    };

    let days = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| ConfigError::InvalidDeadline { var })?;
    if days <= 0 {
        return Err(ConfigError::InvalidDeadline { var });
    }
    Ok(days)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDeadline { var: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDeadline { var } => {
                write!(f, "{var} must be a positive number of days")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidDeadline { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("DEADLINE_DEFENSE_DAYS");
        env::remove_var("DEADLINE_APPEAL_DAYS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.deadlines.rules(), DeadlineRules::statutory());
    }

    #[test]
    fn deadline_overrides_apply() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DEADLINE_DEFENSE_DAYS", "20");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.deadlines.defense_days, 20);
        assert_eq!(
            config.deadlines.appeal_days,
            DeadlineRules::statutory().appeal_days
        );
        reset_env();
    }

    #[test]
    fn rejects_non_positive_deadline() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DEADLINE_APPEAL_DAYS", "0");
        match AppConfig::load() {
            Err(ConfigError::InvalidDeadline { var }) => {
                assert_eq!(var, "DEADLINE_APPEAL_DAYS");
            }
            other => panic!("expected invalid deadline error, got {other:?}"),
        }
        reset_env();
    }
}
