use super::common::*;
use crate::workflows::pip::{
    Decision, ImprovementPolicy, MemoryAuditSink, ProgressEvaluator, Retention, ScoreSeries,
};

#[test]
fn only_pre_pip_data_defers_without_auditing() {
    let series = baseline_series();
    let sink = MemoryAuditSink::new();

    let decision = ProgressEvaluator::default()
        .evaluate(&series, &employee("E001"), pip_start(), days_from_start(30), &sink)
        .expect("evaluation succeeds");

    assert_eq!(decision, Decision::Retained(Retention::AwaitingData));
    assert!(sink.is_empty());
}

#[test]
fn absent_employee_defers_instead_of_failing() {
    let series = ScoreSeries::new();
    let sink = MemoryAuditSink::new();

    let decision = ProgressEvaluator::default()
        .evaluate(&series, &employee("E404"), pip_start(), days_from_start(30), &sink)
        .expect("evaluation succeeds");

    assert_eq!(decision, Decision::Retained(Retention::AwaitingData));
    assert!(sink.is_empty());
}

#[test]
fn insufficient_improvement_terminates_with_formatted_reason() {
    let mut series = baseline_series();
    series.push("E001", 58.0, days_from_start(22));
    let sink = MemoryAuditSink::new();

    let decision = ProgressEvaluator::default()
        .evaluate(&series, &employee("E001"), pip_start(), days_from_start(22), &sink)
        .expect("evaluation succeeds");

    let Decision::Terminated(termination) = decision else {
        panic!("expected termination");
    };
    assert!(termination.reason.contains("-3.33%"), "{}", termination.reason);
    assert!(termination.reason.contains("10%"), "{}", termination.reason);
    assert_eq!(termination.reason, "Improvement -3.33% < 10% threshold");
    assert_eq!(termination.date.to_string(), "2024-01-22");
    assert_eq!(sink.terminations(), vec![termination]);
}

#[test]
fn strong_improvement_is_retained_without_record() {
    let mut series = baseline_series();
    series.push("E001", 90.0, days_from_start(10));
    let sink = MemoryAuditSink::new();

    let decision = ProgressEvaluator::default()
        .evaluate(&series, &employee("E001"), pip_start(), days_from_start(21), &sink)
        .expect("evaluation succeeds");

    match decision {
        Decision::Retained(Retention::Improved { improvement_pct }) => {
            assert!((improvement_pct - 50.0).abs() < 1e-9);
        }
        other => panic!("expected retention, got {other:?}"),
    }
    assert!(sink.terminations().is_empty());
}

#[test]
fn evaluation_does_not_wait_for_grace_period_end() {
    let mut series = baseline_series();
    series.push("E001", 40.0, days_from_start(2));
    let sink = MemoryAuditSink::new();

    let decision = ProgressEvaluator::default()
        .evaluate(&series, &employee("E001"), pip_start(), days_from_start(3), &sink)
        .expect("evaluation succeeds");

    assert!(decision.is_terminated());
}

#[test]
fn stateless_evaluator_audits_each_terminating_call() {
    let mut series = baseline_series();
    series.push("E001", 58.0, days_from_start(22));
    let sink = MemoryAuditSink::new();
    let evaluator = ProgressEvaluator::new(ImprovementPolicy::default());

    let first = evaluator
        .evaluate(&series, &employee("E001"), pip_start(), days_from_start(22), &sink)
        .expect("first evaluation");
    let second = evaluator
        .evaluate(&series, &employee("E001"), pip_start(), days_from_start(22), &sink)
        .expect("second evaluation");

    assert_eq!(first, second);
    assert_eq!(sink.terminations().len(), 2);
}

#[test]
fn custom_bar_and_grace_period_flow_into_reason_and_date() {
    let mut series = baseline_series();
    series.push("E001", 65.0, days_from_start(5));
    let sink = MemoryAuditSink::new();
    let evaluator = ProgressEvaluator::new(ImprovementPolicy {
        grace_days: 30,
        min_improvement_pct: 12.5,
    });

    let decision = evaluator
        .evaluate(&series, &employee("E001"), pip_start(), days_from_start(6), &sink)
        .expect("evaluation succeeds");

    let Decision::Terminated(termination) = decision else {
        panic!("expected termination");
    };
    assert_eq!(termination.reason, "Improvement 8.33% < 12.5% threshold");
    assert_eq!(termination.date.to_string(), "2024-01-31");
}
