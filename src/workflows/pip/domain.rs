use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for employees tracked by the score series.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub String);

impl EmployeeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EmployeeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single periodic performance score. Scores are expected in 0-100 but not clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub employee_id: EmployeeId,
    pub score: f64,
    pub timestamp: NaiveDateTime,
}

pub const PIP_GOALS: [&str; 2] = ["Achieve average score > 80%", "Complete all assigned tasks"];

pub const PIP_COACHING: &str = "Weekly automated feedback on performance metrics";

/// Performance improvement plan as written to the PIP audit log.
///
/// Field order is part of the audit record contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pip {
    pub employee_id: EmployeeId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub goals: Vec<String>,
    pub coaching: String,
}

impl Pip {
    /// PIP over the given window with the fixed goals and coaching plan.
    pub fn new(employee_id: EmployeeId, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            employee_id,
            start_date,
            end_date,
            goals: PIP_GOALS.iter().map(|goal| goal.to_string()).collect(),
            coaching: PIP_COACHING.to_string(),
        }
    }
}

/// Termination decision as written to the termination audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Termination {
    pub employee_id: EmployeeId,
    pub reason: String,
    pub date: NaiveDate,
}

/// Why an evaluation did not terminate the employee.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Retention {
    /// No observations after the PIP start yet; the decision is deferred.
    AwaitingData,
    Improved { improvement_pct: f64 },
}

/// Outcome of a progress evaluation. Retention leaves no audit record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Retained(Retention),
    Terminated(Termination),
}

impl Decision {
    pub fn is_terminated(&self) -> bool {
        matches!(self, Decision::Terminated(_))
    }

    pub fn summary(&self) -> String {
        match self {
            Decision::Retained(Retention::AwaitingData) => {
                "retained: no post-PIP observations yet".to_string()
            }
            Decision::Retained(Retention::Improved { improvement_pct }) => {
                format!("retained: improvement {improvement_pct:.2}%")
            }
            Decision::Terminated(termination) => {
                format!("terminated: {}", termination.reason)
            }
        }
    }
}
