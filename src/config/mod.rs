use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::workflows::pip::{ImprovementPolicy, PolicyConfig, ThresholdPolicy};

/// Distinguishes runtime behavior for different stages of the deployment.
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
    pub pip: PipConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = PolicyConfig::default();
        let policy = PolicyConfig {
            threshold: ThresholdPolicy {
                threshold: parse_var("PIP_THRESHOLD", defaults.threshold.threshold)?,
                consecutive_low: parse_var(
                    "PIP_CONSECUTIVE_LOW",
                    defaults.threshold.consecutive_low,
                )?,
            },
            improvement: ImprovementPolicy {
                grace_days: parse_var("PIP_GRACE_DAYS", defaults.improvement.grace_days)?,
                min_improvement_pct: parse_var(
                    "PIP_MIN_IMPROVEMENT",
                    defaults.improvement.min_improvement_pct,
                )?,
            },
            kill_switch: parse_flag("PIP_KILL_SWITCH")?,
        };
        let audit_dir = env::var("PIP_AUDIT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("audit"));

        Ok(Self {
            environment,
            pip: PipConfig { policy, audit_dir },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Decision policy plus where the audit trail is written.
#[derive(Debug, Clone)]
pub struct PipConfig {
    pub policy: PolicyConfig,
    pub audit_dir: PathBuf,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidNumber { var: name, value: raw })
        }
        _ => Ok(default),
    }
}

fn parse_flag(name: &'static str) -> Result<bool, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        _ => Err(ConfigError::InvalidFlag { var: name, value: raw }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { var: &'static str, value: String },
    InvalidFlag { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { var, value } => {
                write!(f, "{var} must be a valid number (got '{value}')")
            }
            ConfigError::InvalidFlag { var, value } => {
                write!(f, "{var} must be true/false (got '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
