use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use super::domain::{EmployeeId, Observation};

/// Per-employee score history, each history ordered by timestamp ascending.
///
/// The series is append-only. Observations that share a timestamp keep the
/// order in which they were recorded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreSeries {
    by_employee: BTreeMap<EmployeeId, Vec<Observation>>,
}

impl ScoreSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, observation: Observation) {
        let history = self
            .by_employee
            .entry(observation.employee_id.clone())
            .or_default();
        // Insert after every entry with timestamp <= the new one so ties stay in arrival order.
        let position = history.partition_point(|existing| existing.timestamp <= observation.timestamp);
        history.insert(position, observation);
    }

    pub fn push(
        &mut self,
        employee_id: impl Into<EmployeeId>,
        score: f64,
        timestamp: NaiveDateTime,
    ) {
        self.record(Observation {
            employee_id: employee_id.into(),
            score,
            timestamp,
        });
    }

    pub fn observations(&self, employee_id: &EmployeeId) -> &[Observation] {
        self.by_employee
            .get(employee_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn employees(&self) -> impl Iterator<Item = &EmployeeId> {
        self.by_employee.keys()
    }

    pub fn histories(&self) -> impl Iterator<Item = (&EmployeeId, &[Observation])> {
        self.by_employee
            .iter()
            .map(|(id, history)| (id, history.as_slice()))
    }

    pub fn latest(&self, employee_id: &EmployeeId) -> Option<&Observation> {
        self.observations(employee_id).last()
    }

    pub fn contains(&self, employee_id: &EmployeeId) -> bool {
        self.by_employee.contains_key(employee_id)
    }

    pub fn len(&self) -> usize {
        self.by_employee.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_employee.is_empty()
    }
}

impl FromIterator<Observation> for ScoreSeries {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        let mut series = Self::new();
        series.extend(iter);
        series
    }
}

impl Extend<Observation> for ScoreSeries {
    fn extend<I: IntoIterator<Item = Observation>>(&mut self, iter: I) {
        for observation in iter {
            self.record(observation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .expect("valid date")
            .and_hms_opt(9, 0, 0)
            .expect("valid time")
    }

    #[test]
    fn keeps_histories_sorted_by_timestamp() {
        let mut series = ScoreSeries::new();
        series.push("E001", 55.0, at(15));
        series.push("E001", 65.0, at(5));
        series.push("E001", 60.0, at(10));

        let scores: Vec<f64> = series
            .observations(&EmployeeId::from("E001"))
            .iter()
            .map(|obs| obs.score)
            .collect();
        assert_eq!(scores, vec![65.0, 60.0, 55.0]);
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn equal_timestamps_keep_insertion_order() {
        let mut series = ScoreSeries::new();
        series.push("E001", 40.0, at(3));
        series.push("E001", 90.0, at(3));
        series.push("E001", 10.0, at(1));

        let scores: Vec<f64> = series
            .observations(&EmployeeId::from("E001"))
            .iter()
            .map(|obs| obs.score)
            .collect();
        assert_eq!(scores, vec![10.0, 40.0, 90.0]);
        assert_eq!(
            series.latest(&EmployeeId::from("E001")).map(|obs| obs.score),
            Some(90.0)
        );
    }

    #[test]
    fn unknown_employee_has_empty_history() {
        let series = ScoreSeries::new();
        let missing = EmployeeId::from("E404");
        assert!(series.observations(&missing).is_empty());
        assert!(series.latest(&missing).is_none());
        assert!(!series.contains(&missing));
        assert!(series.is_empty());
    }
}
