use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::audit::AuditSink;
use super::builder::PipBuilder;
use super::coaching::advise;
use super::detection::detect;
use super::domain::{Decision, EmployeeId, Pip};
use super::lifecycle::{LifecycleError, PipCase, PipRegistry, PipStatus};
use super::policy::PolicyConfig;
use super::progress::ProgressEvaluator;
use super::series::ScoreSeries;
use super::PipError;

/// Service composing detection, PIP issuance, coaching, and progress evaluation
/// over an explicit per-employee lifecycle.
pub struct PipWorkflowService<S> {
    config: PolicyConfig,
    sink: Arc<S>,
    builder: PipBuilder,
    evaluator: ProgressEvaluator,
    registry: PipRegistry,
}

/// PIP issued during a cycle together with the coaching text for the latest score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssuedPip {
    pub pip: Pip,
    pub latest_score: Option<f64>,
    pub coaching_feedback: Option<String>,
}

/// Result of one detection-and-issuance cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleReport {
    pub paused: bool,
    pub flagged: Vec<EmployeeId>,
    pub issued: Vec<IssuedPip>,
    /// Flagged employees that already had a case in the registry.
    pub skipped: Vec<EmployeeId>,
}

impl CycleReport {
    pub fn paused() -> Self {
        Self {
            paused: true,
            ..Self::default()
        }
    }
}

/// Outcome of evaluating one open case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseOutcome {
    pub employee_id: EmployeeId,
    pub decision: Decision,
    pub status: PipStatus,
}

impl<S> PipWorkflowService<S>
where
    S: AuditSink + 'static,
{
    pub fn new(config: PolicyConfig, sink: Arc<S>) -> Result<Self, PipError> {
        config.validate()?;

        Ok(Self {
            builder: PipBuilder::new(config.improvement.grace_days),
            evaluator: ProgressEvaluator::new(config.improvement),
            registry: PipRegistry::new(),
            config,
            sink,
        })
    }

    /// Resume from an existing registry, e.g. cases restored by the caller.
    pub fn with_registry(mut self, registry: PipRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &PipRegistry {
        &self.registry
    }

    pub fn into_registry(self) -> PipRegistry {
        self.registry
    }

    /// Detect low performers and open a PIP for each one without an existing case.
    pub fn run_cycle(
        &mut self,
        series: &ScoreSeries,
        now: NaiveDateTime,
    ) -> Result<CycleReport, PipError> {
        if self.config.kill_switch {
            warn!("kill switch active; skipping PIP cycle");
            return Ok(CycleReport::paused());
        }

        let flagged = detect(series, &self.config.threshold)?;
        let mut report = CycleReport {
            flagged: flagged.iter().cloned().collect(),
            ..CycleReport::default()
        };

        for employee_id in flagged {
            if self.registry.status(&employee_id) != PipStatus::Normal {
                debug!(employee = %employee_id, "employee already has a PIP case");
                report.skipped.push(employee_id);
                continue;
            }

            let pip = self.builder.build(&employee_id, now, self.sink.as_ref())?;
            let latest_score = series.latest(&employee_id).map(|observation| observation.score);
            let coaching_feedback = latest_score.map(|score| advise(score).to_string());

            let mut case = PipCase::open(pip.clone(), now);
            case.coaching_feedback = coaching_feedback.clone();
            self.registry.open(case)?;

            info!(
                employee = %employee_id,
                start = %pip.start_date,
                end = %pip.end_date,
                "PIP issued"
            );

            report.issued.push(IssuedPip {
                pip,
                latest_score,
                coaching_feedback,
            });
        }

        Ok(report)
    }

    /// Evaluate one employee's open case and apply the outcome to its lifecycle.
    /// Returns `None` without touching the case while the kill switch is active.
    pub fn evaluate_case(
        &mut self,
        series: &ScoreSeries,
        employee_id: &EmployeeId,
        now: NaiveDateTime,
    ) -> Result<Option<CaseOutcome>, PipError> {
        if self.config.kill_switch {
            warn!(employee = %employee_id, "kill switch active; skipping PIP evaluation");
            return Ok(None);
        }

        let case = self.registry.get_mut(employee_id)?;
        if case.status != PipStatus::OnPip {
            return Err(LifecycleError::AlreadyConcluded {
                employee_id: employee_id.clone(),
                status: case.status,
            }
            .into());
        }

        let decision =
            self.evaluator
                .evaluate(series, employee_id, case.started_at, now, self.sink.as_ref())?;
        let status = case.conclude(decision.clone())?;

        match &decision {
            Decision::Terminated(termination) => {
                info!(employee = %employee_id, reason = %termination.reason, "PIP ended in termination");
            }
            Decision::Retained(_) if status == PipStatus::OnPip => {
                debug!(employee = %employee_id, "no post-PIP observations yet; decision deferred");
            }
            Decision::Retained(_) => {
                info!(employee = %employee_id, "PIP completed; employee retained");
            }
        }

        Ok(Some(CaseOutcome {
            employee_id: employee_id.clone(),
            decision,
            status,
        }))
    }

    /// Evaluate every open case once. Concluded cases are never re-evaluated.
    pub fn evaluate_due(
        &mut self,
        series: &ScoreSeries,
        now: NaiveDateTime,
    ) -> Result<Vec<CaseOutcome>, PipError> {
        if self.config.kill_switch {
            warn!("kill switch active; skipping PIP evaluation");
            return Ok(Vec::new());
        }

        let open: Vec<EmployeeId> = self
            .registry
            .open_cases()
            .map(|case| case.employee_id().clone())
            .collect();

        let mut outcomes = Vec::with_capacity(open.len());
        for employee_id in &open {
            outcomes.extend(self.evaluate_case(series, employee_id, now)?);
        }
        Ok(outcomes)
    }
}
