use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_THRESHOLD: f64 = 70.0;
pub const DEFAULT_CONSECUTIVE_LOW: u32 = 3;
pub const DEFAULT_GRACE_DAYS: u32 = 21;
pub const DEFAULT_MIN_IMPROVEMENT_PCT: f64 = 10.0;

/// Cutoff and window length used by the threshold detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    pub threshold: f64,
    pub consecutive_low: u32,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            consecutive_low: DEFAULT_CONSECUTIVE_LOW,
        }
    }
}

impl ThresholdPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.consecutive_low == 0 {
            return Err(PolicyError::InvalidConfiguration(
                "consecutive_low must be at least 1".to_string(),
            ));
        }
        if !self.threshold.is_finite() {
            return Err(PolicyError::InvalidConfiguration(
                "threshold must be a finite number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Grace period and improvement bar applied once a PIP is running.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImprovementPolicy {
    pub grace_days: u32,
    pub min_improvement_pct: f64,
}

impl Default for ImprovementPolicy {
    fn default() -> Self {
        Self {
            grace_days: DEFAULT_GRACE_DAYS,
            min_improvement_pct: DEFAULT_MIN_IMPROVEMENT_PCT,
        }
    }
}

impl ImprovementPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        validate_grace_days(self.grace_days)?;
        if !self.min_improvement_pct.is_finite() || self.min_improvement_pct < 0.0 {
            return Err(PolicyError::InvalidConfiguration(
                "min_improvement_pct must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_grace_days(grace_days: u32) -> Result<(), PolicyError> {
    if grace_days == 0 {
        return Err(PolicyError::InvalidConfiguration(
            "grace_days must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Date on which a grace period starting on `start` ends.
pub(crate) fn grace_period_end(start: NaiveDate, grace_days: u32) -> Result<NaiveDate, PolicyError> {
    validate_grace_days(grace_days)?;
    start
        .checked_add_days(Days::new(u64::from(grace_days)))
        .ok_or_else(|| {
            PolicyError::InvalidConfiguration(format!(
                "grace_days {grace_days} runs past the last representable date from {start}"
            ))
        })
}

/// Full decision policy plus the external kill switch.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub threshold: ThresholdPolicy,
    pub improvement: ImprovementPolicy,
    #[serde(default)]
    pub kill_switch: bool,
}

impl PolicyConfig {
    pub fn validate(&self) -> Result<(), PolicyError> {
        self.threshold.validate()?;
        self.improvement.validate()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
