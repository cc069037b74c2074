use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::workflows::pip::{
    EmployeeId, MemoryAuditSink, PipWorkflowService, PolicyConfig, ScoreSeries,
};

pub(super) fn pip_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .expect("valid date")
        .and_hms_opt(9, 0, 0)
        .expect("valid time")
}

pub(super) fn days_from_start(days: i64) -> NaiveDateTime {
    pip_start() + Duration::days(days)
}

pub(super) fn employee(id: &str) -> EmployeeId {
    EmployeeId::from(id)
}

/// Two employees scored every five days before the PIP start: E001 trending down
/// below 70, E002 comfortably above it.
pub(super) fn baseline_series() -> ScoreSeries {
    let mut series = ScoreSeries::new();
    for (offset, (low, high)) in [(65.0, 85.0), (60.0, 88.0), (55.0, 90.0)]
        .into_iter()
        .enumerate()
    {
        let timestamp = days_from_start(-15 + 5 * offset as i64);
        series.push("E001", low, timestamp);
        series.push("E002", high, timestamp);
    }
    series
}

pub(super) fn service(config: PolicyConfig) -> (PipWorkflowService<MemoryAuditSink>, Arc<MemoryAuditSink>) {
    let sink = Arc::new(MemoryAuditSink::new());
    let service = PipWorkflowService::new(config, sink.clone()).expect("valid policy");
    (service, sink)
}
