use std::collections::BTreeSet;

use super::domain::{EmployeeId, Observation};
use super::policy::{PolicyError, ThresholdPolicy};
use super::series::ScoreSeries;

/// Flag every employee whose most recent `consecutive_low` scores are all strictly
/// below `threshold`. Employees with fewer observations than the window are never
/// flagged.
pub fn detect(
    series: &ScoreSeries,
    policy: &ThresholdPolicy,
) -> Result<BTreeSet<EmployeeId>, PolicyError> {
    policy.validate()?;

    Ok(series
        .histories()
        .filter(|(_, history)| is_low_tail(history, policy))
        .map(|(employee_id, _)| employee_id.clone())
        .collect())
}

pub(crate) fn is_low_tail(history: &[Observation], policy: &ThresholdPolicy) -> bool {
    let window = policy.consecutive_low as usize;
    if history.len() < window {
        return false;
    }

    history[history.len() - window..]
        .iter()
        .all(|observation| observation.score < policy.threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .expect("valid date")
            .and_hms_opt(0, 0, 0)
            .expect("valid time")
    }

    fn series_of(entries: &[(&str, &[f64])]) -> ScoreSeries {
        let mut series = ScoreSeries::new();
        for (employee, scores) in entries {
            for (offset, score) in scores.iter().enumerate() {
                series.push(*employee, *score, at(offset as u32 + 1));
            }
        }
        series
    }

    #[test]
    fn flags_only_sustained_low_performers() {
        let series = series_of(&[("E001", &[65.0, 60.0, 55.0]), ("E002", &[85.0, 88.0, 90.0])]);

        let flagged = detect(&series, &ThresholdPolicy::default()).expect("valid policy");

        assert_eq!(flagged.into_iter().collect::<Vec<_>>(), vec![EmployeeId::from("E001")]);
    }

    #[test]
    fn insufficient_history_is_never_flagged() {
        let series = series_of(&[("E003", &[10.0, 10.0])]);

        let flagged = detect(&series, &ThresholdPolicy::default()).expect("valid policy");

        assert!(flagged.is_empty());
    }

    #[test]
    fn scores_at_threshold_are_not_low() {
        let series = series_of(&[("E004", &[70.0, 70.0, 70.0])]);

        let flagged = detect(&series, &ThresholdPolicy::default()).expect("valid policy");

        assert!(flagged.is_empty());
    }

    #[test]
    fn only_the_most_recent_window_counts() {
        let series = series_of(&[
            ("E005", &[95.0, 50.0, 40.0, 30.0]),
            ("E006", &[50.0, 40.0, 30.0, 95.0]),
        ]);

        let flagged = detect(&series, &ThresholdPolicy::default()).expect("valid policy");

        assert!(flagged.contains(&EmployeeId::from("E005")));
        assert!(!flagged.contains(&EmployeeId::from("E006")));
    }

    #[test]
    fn repeated_detection_is_stable() {
        let series = series_of(&[("E001", &[65.0, 60.0, 55.0]), ("E007", &[20.0, 30.0, 40.0])]);
        let policy = ThresholdPolicy::default();

        let first = detect(&series, &policy).expect("valid policy");
        let second = detect(&series, &policy).expect("valid policy");

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn zero_window_is_rejected() {
        let series = series_of(&[("E001", &[10.0])]);
        let policy = ThresholdPolicy {
            threshold: 70.0,
            consecutive_low: 0,
        };

        assert!(matches!(
            detect(&series, &policy),
            Err(PolicyError::InvalidConfiguration(_))
        ));
    }
}
