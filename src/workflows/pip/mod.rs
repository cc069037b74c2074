//! Performance improvement plan decision engine.
//!
//! Score series flow through threshold detection, PIP issuance with coaching, and
//! post-PIP progress evaluation. Every component reads the series by reference;
//! only the caller appends to it.

pub mod audit;
pub mod builder;
pub mod coaching;
pub mod detection;
pub mod domain;
pub mod lifecycle;
pub mod policy;
pub mod progress;
pub mod series;
pub mod service;
pub mod summary;

#[cfg(test)]
mod tests;

pub use audit::{
    AuditError, AuditHistory, AuditRecord, AuditSink, JsonlAuditSink, MemoryAuditSink,
};
pub use builder::PipBuilder;
pub use coaching::advise;
pub use detection::detect;
pub use domain::{Decision, EmployeeId, Observation, Pip, Retention, Termination};
pub use lifecycle::{LifecycleError, PipCase, PipRegistry, PipStatus};
pub use policy::{ImprovementPolicy, PolicyConfig, PolicyError, ThresholdPolicy};
pub use progress::{measure_improvement, ImprovementMeasure, ProgressEvaluator};
pub use series::ScoreSeries;
pub use service::{CaseOutcome, CycleReport, IssuedPip, PipWorkflowService};
pub use summary::{summarize, EmployeeSummary, RiskLevel, Trend, TrendDirection};

/// Error raised by the PIP engine.
#[derive(Debug, thiserror::Error)]
pub enum PipError {
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Audit(#[from] AuditError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}
