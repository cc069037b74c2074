use std::collections::BTreeMap;
use std::fmt;

use chrono::{Days, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::audit::AuditHistory;
use super::domain::{Decision, EmployeeId, Pip, Retention, Termination};

/// Per-employee PIP state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipStatus {
    Normal,
    OnPip,
    Retained,
    Terminated,
}

impl PipStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::OnPip => "on_pip",
            Self::Retained => "retained",
            Self::Terminated => "terminated",
        }
    }

    pub const fn is_concluded(self) -> bool {
        matches!(self, Self::Retained | Self::Terminated)
    }

    fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Normal, Self::OnPip)
                | (Self::OnPip, Self::Retained)
                | (Self::OnPip, Self::Terminated)
        )
    }
}

impl fmt::Display for PipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("illegal transition {from} -> {to}")]
    IllegalTransition { from: PipStatus, to: PipStatus },
    #[error("no PIP case recorded for employee {0}")]
    UnknownCase(EmployeeId),
    #[error("PIP case for employee {employee_id} already concluded as {status}")]
    AlreadyConcluded {
        employee_id: EmployeeId,
        status: PipStatus,
    },
}

/// One employee's PIP together with the instant it started and its current status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipCase {
    pub pip: Pip,
    pub started_at: NaiveDateTime,
    pub status: PipStatus,
    pub coaching_feedback: Option<String>,
    pub decision: Option<Decision>,
}

impl PipCase {
    pub fn open(pip: Pip, started_at: NaiveDateTime) -> Self {
        Self {
            pip,
            started_at,
            status: PipStatus::OnPip,
            coaching_feedback: None,
            decision: None,
        }
    }

    pub fn employee_id(&self) -> &EmployeeId {
        &self.pip.employee_id
    }

    fn transition(&mut self, next: PipStatus) -> Result<(), LifecycleError> {
        if !self.status.can_transition_to(next) {
            return Err(LifecycleError::IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Apply an evaluation outcome. A deferral leaves the case open.
    pub fn conclude(&mut self, decision: Decision) -> Result<PipStatus, LifecycleError> {
        if self.status != PipStatus::OnPip {
            let to = match decision {
                Decision::Terminated(_) => PipStatus::Terminated,
                Decision::Retained(_) => PipStatus::Retained,
            };
            return Err(LifecycleError::IllegalTransition {
                from: self.status,
                to,
            });
        }

        match &decision {
            Decision::Retained(Retention::AwaitingData) => {}
            Decision::Retained(Retention::Improved { .. }) => {
                self.transition(PipStatus::Retained)?;
            }
            Decision::Terminated(_) => self.transition(PipStatus::Terminated)?,
        }
        self.decision = Some(decision);
        Ok(self.status)
    }
}

fn case_for_unrecorded_pip(termination: &Termination, grace_days: u32) -> PipCase {
    let start_date = termination
        .date
        .checked_sub_days(Days::new(u64::from(grace_days)))
        .unwrap_or(termination.date);
    PipCase::open(
        Pip::new(termination.employee_id.clone(), start_date, termination.date),
        start_date.and_time(NaiveTime::MIN),
    )
}

/// Current PIP cases keyed by employee. Employees without a case are `Normal`.
#[derive(Debug, Clone, Default)]
pub struct PipRegistry {
    cases: BTreeMap<EmployeeId, PipCase>,
}

impl PipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild cases from a previously written audit trail.
    ///
    /// The first PIP recorded for an employee opens a case starting at midnight of
    /// its start date and the first termination concludes it. A termination without
    /// a recorded PIP gets a case covering the `grace_days` before its date. Retention
    /// leaves no audit record, so retained employees come back as `OnPip`.
    pub fn restore(history: &AuditHistory, grace_days: u32) -> Result<Self, LifecycleError> {
        let mut registry = Self::new();

        for pip in &history.pips {
            if registry.status(&pip.employee_id) == PipStatus::Normal {
                let started_at = pip.start_date.and_time(NaiveTime::MIN);
                registry.open(PipCase::open(pip.clone(), started_at))?;
            }
        }

        for termination in &history.terminations {
            let case = registry
                .cases
                .entry(termination.employee_id.clone())
                .or_insert_with(|| case_for_unrecorded_pip(termination, grace_days));
            if case.status == PipStatus::OnPip {
                case.conclude(Decision::Terminated(termination.clone()))?;
            }
        }

        Ok(registry)
    }

    pub fn status(&self, employee_id: &EmployeeId) -> PipStatus {
        self.cases
            .get(employee_id)
            .map(|case| case.status)
            .unwrap_or(PipStatus::Normal)
    }

    /// Record a freshly issued PIP. Fails if the employee already has a case.
    pub fn open(&mut self, case: PipCase) -> Result<&PipCase, LifecycleError> {
        let current = self.status(case.employee_id());
        if !current.can_transition_to(PipStatus::OnPip) {
            return Err(LifecycleError::IllegalTransition {
                from: current,
                to: PipStatus::OnPip,
            });
        }
        let employee_id = case.employee_id().clone();
        Ok(self.cases.entry(employee_id).or_insert(case))
    }

    pub fn get(&self, employee_id: &EmployeeId) -> Option<&PipCase> {
        self.cases.get(employee_id)
    }

    pub fn get_mut(&mut self, employee_id: &EmployeeId) -> Result<&mut PipCase, LifecycleError> {
        self.cases
            .get_mut(employee_id)
            .ok_or_else(|| LifecycleError::UnknownCase(employee_id.clone()))
    }

    pub fn open_cases(&self) -> impl Iterator<Item = &PipCase> {
        self.cases
            .values()
            .filter(|case| case.status == PipStatus::OnPip)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}
