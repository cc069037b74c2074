use chrono::NaiveDateTime;

use super::audit::{AuditRecord, AuditSink};
use super::domain::{Decision, EmployeeId, Observation, Retention, Termination};
use super::policy::{grace_period_end, ImprovementPolicy};
use super::series::ScoreSeries;
use super::PipError;

/// Stateless post-PIP evaluator.
///
/// The evaluator answers from whatever observations exist when it is called and
/// does not check `now` against the end of the grace period. Each terminating call
/// appends a termination record, so callers that need at-most-once auditing should
/// go through [`PipRegistry`](super::lifecycle::PipRegistry).
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressEvaluator {
    policy: ImprovementPolicy,
}

/// Pre/post split for one employee around a PIP start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImprovementMeasure {
    pub pre_count: usize,
    pub post_count: usize,
    pub pre_avg: Option<f64>,
    pub post_avg: Option<f64>,
    pub improvement_pct: f64,
}

impl ProgressEvaluator {
    pub fn new(policy: ImprovementPolicy) -> Self {
        Self { policy }
    }

    pub fn evaluate<S>(
        &self,
        series: &ScoreSeries,
        employee_id: &EmployeeId,
        pip_start: NaiveDateTime,
        _now: NaiveDateTime,
        sink: &S,
    ) -> Result<Decision, PipError>
    where
        S: AuditSink + ?Sized,
    {
        self.policy.validate()?;

        let pip_end = grace_period_end(pip_start.date(), self.policy.grace_days)?;
        let measure = measure_improvement(series.observations(employee_id), pip_start);

        if measure.post_count == 0 {
            return Ok(Decision::Retained(Retention::AwaitingData));
        }

        if measure.improvement_pct < self.policy.min_improvement_pct {
            let termination = Termination {
                employee_id: employee_id.clone(),
                reason: format!(
                    "Improvement {:.2}% < {}% threshold",
                    measure.improvement_pct, self.policy.min_improvement_pct
                ),
                date: pip_end,
            };
            sink.append(&AuditRecord::Terminated(termination.clone()))?;
            return Ok(Decision::Terminated(termination));
        }

        Ok(Decision::Retained(Retention::Improved {
            improvement_pct: measure.improvement_pct,
        }))
    }
}

/// Split the history at `pip_start` (inclusive on the pre side) and compute the
/// relative change of the post mean over the pre mean. An empty or non-positive
/// pre mean yields 0%.
pub fn measure_improvement(history: &[Observation], pip_start: NaiveDateTime) -> ImprovementMeasure {
    let (pre, post): (Vec<&Observation>, Vec<&Observation>) = history
        .iter()
        .partition(|observation| observation.timestamp <= pip_start);

    let pre_avg = mean(&pre);
    let post_avg = mean(&post);

    let improvement_pct = match (pre_avg, post_avg) {
        (Some(pre_avg), Some(post_avg)) if pre_avg > 0.0 => (post_avg - pre_avg) / pre_avg * 100.0,
        _ => 0.0,
    };

    ImprovementMeasure {
        pre_count: pre.len(),
        post_count: post.len(),
        pre_avg,
        post_avg,
        improvement_pct,
    }
}

fn mean(observations: &[&Observation]) -> Option<f64> {
    if observations.is_empty() {
        return None;
    }
    let total: f64 = observations.iter().map(|observation| observation.score).sum();
    Some(total / observations.len() as f64)
}
