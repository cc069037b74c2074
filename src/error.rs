use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::pip::PipError;
use crate::workflows::scores::ScoreImportError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Import(ScoreImportError),
    Workflow(PipError),
    Output(serde_json::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Import(err) => write!(f, "import error: {}", err),
            AppError::Workflow(err) => write!(f, "workflow error: {}", err),
            AppError::Output(err) => write!(f, "output error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Workflow(err) => Some(err),
            AppError::Output(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ScoreImportError> for AppError {
    fn from(value: ScoreImportError) -> Self {
        Self::Import(value)
    }
}

impl From<PipError> for AppError {
    fn from(value: PipError) -> Self {
        Self::Workflow(value)
    }
}

impl From<crate::workflows::pip::PolicyError> for AppError {
    fn from(value: crate::workflows::pip::PolicyError) -> Self {
        Self::Workflow(PipError::Policy(value))
    }
}

impl From<crate::workflows::pip::AuditError> for AppError {
    fn from(value: crate::workflows::pip::AuditError) -> Self {
        Self::Workflow(PipError::Audit(value))
    }
}

impl From<crate::workflows::pip::LifecycleError> for AppError {
    fn from(value: crate::workflows::pip::LifecycleError) -> Self {
        Self::Workflow(PipError::Lifecycle(value))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}
