use chrono::NaiveDateTime;

use super::audit::{AuditRecord, AuditSink};
use super::domain::{EmployeeId, Pip};
use super::policy::{grace_period_end, PolicyError, DEFAULT_GRACE_DAYS};
use super::PipError;

/// Constructs PIP records for flagged employees.
#[derive(Debug, Clone, Copy)]
pub struct PipBuilder {
    grace_days: u32,
}

impl Default for PipBuilder {
    fn default() -> Self {
        Self {
            grace_days: DEFAULT_GRACE_DAYS,
        }
    }
}

impl PipBuilder {
    pub fn new(grace_days: u32) -> Self {
        Self { grace_days }
    }

    /// PIP record starting on the date of `now`, without auditing it.
    pub fn draft(&self, employee_id: &EmployeeId, now: NaiveDateTime) -> Result<Pip, PolicyError> {
        let start_date = now.date();
        let end_date = grace_period_end(start_date, self.grace_days)?;
        Ok(Pip::new(employee_id.clone(), start_date, end_date))
    }

    /// Build the PIP starting at `now` and append it to the audit sink.
    pub fn build<S>(
        &self,
        employee_id: &EmployeeId,
        now: NaiveDateTime,
        sink: &S,
    ) -> Result<Pip, PipError>
    where
        S: AuditSink + ?Sized,
    {
        let pip = self.draft(employee_id, now)?;
        sink.append(&AuditRecord::PipIssued(pip.clone()))?;
        Ok(pip)
    }
}
