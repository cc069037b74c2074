use serde::Serialize;

use super::domain::{EmployeeId, Observation};
use super::policy::ThresholdPolicy;
use super::series::ScoreSeries;

const TREND_BAND_PCT: f64 = 5.0;
const TREND_LOOKBACK: usize = 2;
const RISK_AVERAGE_WINDOW: usize = 5;
const RISK_HIGH_LOW_STREAK: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

impl TrendDirection {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
            Self::Stable => "stable",
        }
    }
}

/// Latest score compared with the mean of the two scores before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trend {
    pub direction: TrendDirection,
    pub change_pct: f64,
}

impl Trend {
    const STABLE: Self = Self {
        direction: TrendDirection::Stable,
        change_pct: 0.0,
    };

    pub fn of(history: &[Observation]) -> Self {
        let Some((latest, earlier)) = history.split_last() else {
            return Self::STABLE;
        };
        if earlier.is_empty() {
            return Self::STABLE;
        }

        let previous = &earlier[earlier.len().saturating_sub(TREND_LOOKBACK)..];
        let previous_avg =
            previous.iter().map(|observation| observation.score).sum::<f64>() / previous.len() as f64;
        if previous_avg <= 0.0 {
            return Self::STABLE;
        }

        let change_pct = (latest.score - previous_avg) / previous_avg * 100.0;
        let direction = if change_pct > TREND_BAND_PCT {
            TrendDirection::Improving
        } else if change_pct < -TREND_BAND_PCT {
            TrendDirection::Declining
        } else {
            TrendDirection::Stable
        };

        Self {
            direction,
            change_pct,
        }
    }
}

/// How close an employee is to being flagged for a PIP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Critical once the low streak fills the detection window, high from two
    /// consecutive low scores, medium when the mean of the last five is below the
    /// threshold.
    pub fn assess(history: &[Observation], policy: &ThresholdPolicy) -> Self {
        let window = policy.consecutive_low as usize;
        let low_streak = history
            .iter()
            .rev()
            .take(window)
            .take_while(|observation| observation.score < policy.threshold)
            .count();

        let recent = &history[history.len().saturating_sub(RISK_AVERAGE_WINDOW)..];
        let recent_avg = if recent.is_empty() {
            0.0
        } else {
            recent.iter().map(|observation| observation.score).sum::<f64>() / recent.len() as f64
        };

        if window > 0 && low_streak >= window {
            Self::Critical
        } else if low_streak >= RISK_HIGH_LOW_STREAK {
            Self::High
        } else if !recent.is_empty() && recent_avg < policy.threshold {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Aggregate view of one employee's score history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeSummary {
    pub employee_id: EmployeeId,
    pub observations: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub latest: f64,
    pub trend: Trend,
    pub risk: RiskLevel,
}

impl EmployeeSummary {
    fn from_history(
        employee_id: &EmployeeId,
        history: &[Observation],
        policy: &ThresholdPolicy,
    ) -> Option<Self> {
        let latest = history.last()?.score;
        let scores = history.iter().map(|observation| observation.score);
        let min = scores.clone().fold(f64::INFINITY, f64::min);
        let max = scores.clone().fold(f64::NEG_INFINITY, f64::max);
        let mean = scores.sum::<f64>() / history.len() as f64;

        Some(Self {
            employee_id: employee_id.clone(),
            observations: history.len(),
            mean,
            min,
            max,
            latest,
            trend: Trend::of(history),
            risk: RiskLevel::assess(history, policy),
        })
    }
}

/// One summary per employee, ordered by employee id.
pub fn summarize(series: &ScoreSeries, policy: &ThresholdPolicy) -> Vec<EmployeeSummary> {
    series
        .histories()
        .filter_map(|(employee_id, history)| {
            EmployeeSummary::from_history(employee_id, history, policy)
        })
        .collect()
}
