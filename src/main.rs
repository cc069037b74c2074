use chrono::{Local, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use pip_autofire::config::AppConfig;
use pip_autofire::error::AppError;
use pip_autofire::telemetry;
use pip_autofire::workflows::pip::{
    advise, detect, summarize, CycleReport, Decision, EmployeeId, EmployeeSummary,
    JsonlAuditSink, PipBuilder, PipCase, PipRegistry, PipStatus, PipWorkflowService,
    PolicyConfig, Retention, ScoreSeries,
};
use pip_autofire::workflows::scores::{parse_timestamp, ScoreSeriesImporter};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "pip-autofire",
    about = "Detect sustained low performance, issue PIPs, and evaluate post-PIP improvement",
    version
)]
struct Cli {
    /// Pause all automated decisions for this run (overrides PIP_KILL_SWITCH)
    #[arg(long, global = true)]
    kill_switch: bool,
    /// Directory for pip_log.jsonl and termination_log.jsonl (overrides PIP_AUDIT_DIR)
    #[arg(long, global = true)]
    audit_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List employees whose most recent scores are all below the threshold
    Detect(DetectArgs),
    /// Detect low performers, issue PIPs, and print coaching feedback
    Cycle(CycleArgs),
    /// Evaluate one employee's post-PIP improvement once
    Evaluate(EvaluateArgs),
    /// Print per-employee score statistics, trend, and risk level
    Summary(SummaryArgs),
}

#[derive(Args, Debug)]
struct ScoreSource {
    /// CSV export with employee_id,score,date columns
    #[arg(long)]
    scores: PathBuf,
    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ThresholdArgs {
    /// Score cutoff; scores strictly below count as low (overrides PIP_THRESHOLD)
    #[arg(long)]
    threshold: Option<f64>,
    /// Number of most recent periods that must all be low (overrides PIP_CONSECUTIVE_LOW)
    #[arg(long)]
    consecutive_low: Option<u32>,
}

#[derive(Args, Debug)]
struct DetectArgs {
    #[command(flatten)]
    source: ScoreSource,
    #[command(flatten)]
    threshold: ThresholdArgs,
}

#[derive(Args, Debug)]
struct CycleArgs {
    #[command(flatten)]
    source: ScoreSource,
    #[command(flatten)]
    threshold: ThresholdArgs,
    /// Grace period in days (overrides PIP_GRACE_DAYS)
    #[arg(long)]
    grace_days: Option<u32>,
    /// Current time used as the PIP start (defaults to now)
    #[arg(long, value_parser = parse_instant)]
    now: Option<NaiveDateTime>,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    #[command(flatten)]
    source: ScoreSource,
    /// Employee whose PIP is being evaluated
    #[arg(long)]
    employee: String,
    /// When the PIP started (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
    #[arg(long, value_parser = parse_instant)]
    pip_start: NaiveDateTime,
    /// Grace period in days (overrides PIP_GRACE_DAYS)
    #[arg(long)]
    grace_days: Option<u32>,
    /// Minimum improvement percentage required (overrides PIP_MIN_IMPROVEMENT)
    #[arg(long)]
    min_improvement: Option<f64>,
    /// Current time of the evaluation (defaults to now)
    #[arg(long, value_parser = parse_instant)]
    now: Option<NaiveDateTime>,
}

#[derive(Args, Debug)]
struct SummaryArgs {
    #[command(flatten)]
    source: ScoreSource,
    #[command(flatten)]
    threshold: ThresholdArgs,
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    if cli.kill_switch {
        config.pip.policy.kill_switch = true;
    }
    if let Some(dir) = cli.audit_dir {
        config.pip.audit_dir = dir;
    }

    if config.pip.policy.kill_switch && !matches!(cli.command, Command::Summary(_)) {
        warn!("kill switch active; automated PIP decisions paused");
        println!("Kill-switch activated: workflow paused, no decisions made.");
        return Ok(());
    }

    match cli.command {
        Command::Detect(args) => run_detect(args, config),
        Command::Cycle(args) => run_cycle(args, config),
        Command::Evaluate(args) => run_evaluate(args, config),
        Command::Summary(args) => run_summary(args, config),
    }
}

fn parse_instant(raw: &str) -> Result<NaiveDateTime, String> {
    parse_timestamp(raw).ok_or_else(|| {
        format!("failed to parse '{raw}' as YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS")
    })
}

fn load_series(source: &ScoreSource) -> Result<ScoreSeries, AppError> {
    let series = ScoreSeriesImporter::from_path(&source.scores)?;
    info!(
        path = %source.scores.display(),
        observations = series.len(),
        "score series loaded"
    );
    Ok(series)
}

fn apply_threshold_overrides(policy: &mut PolicyConfig, args: &ThresholdArgs) {
    if let Some(threshold) = args.threshold {
        policy.threshold.threshold = threshold;
    }
    if let Some(consecutive_low) = args.consecutive_low {
        policy.threshold.consecutive_low = consecutive_low;
    }
}

/// Cases recorded by earlier runs, so repeated commands never re-issue or
/// re-decide a PIP.
fn restore_registry(
    sink: &JsonlAuditSink,
    policy: &PolicyConfig,
) -> Result<PipRegistry, AppError> {
    let history = sink.history()?;
    let registry = PipRegistry::restore(&history, policy.improvement.grace_days)?;
    info!(
        pips = history.pips.len(),
        terminations = history.terminations.len(),
        cases = registry.len(),
        "PIP cases restored from audit trail"
    );
    Ok(registry)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_detect(args: DetectArgs, config: AppConfig) -> Result<(), AppError> {
    let mut policy = config.pip.policy;
    apply_threshold_overrides(&mut policy, &args.threshold);

    let series = load_series(&args.source)?;
    let flagged = detect(&series, &policy.threshold)?;

    if args.source.json {
        let rows: Vec<_> = flagged
            .iter()
            .map(|employee_id| {
                let latest = series.latest(employee_id).map(|obs| obs.score);
                json!({
                    "employee_id": employee_id,
                    "latest_score": latest,
                    "coaching": latest.map(advise),
                })
            })
            .collect();
        return print_json(&rows);
    }

    if flagged.is_empty() {
        println!(
            "No employees below {} for {} consecutive periods",
            policy.threshold.threshold, policy.threshold.consecutive_low
        );
        return Ok(());
    }

    println!(
        "Employees below {} for {} consecutive periods",
        policy.threshold.threshold, policy.threshold.consecutive_low
    );
    for employee_id in &flagged {
        match series.latest(employee_id) {
            Some(latest) => println!(
                "- {} (latest {}): {}",
                employee_id,
                latest.score,
                advise(latest.score)
            ),
            None => println!("- {employee_id}"),
        }
    }
    Ok(())
}

fn run_cycle(args: CycleArgs, config: AppConfig) -> Result<(), AppError> {
    let mut policy = config.pip.policy;
    apply_threshold_overrides(&mut policy, &args.threshold);
    if let Some(grace_days) = args.grace_days {
        policy.improvement.grace_days = grace_days;
    }
    let now = args.now.unwrap_or_else(|| Local::now().naive_local());

    let series = load_series(&args.source)?;
    let sink = Arc::new(JsonlAuditSink::in_dir(&config.pip.audit_dir));
    let registry = restore_registry(&sink, &policy)?;
    let mut service = PipWorkflowService::new(policy, sink.clone())?.with_registry(registry);
    let report = service.run_cycle(&series, now)?;

    if args.source.json {
        return print_json(&report);
    }
    render_cycle(&report, &sink);
    Ok(())
}

fn render_cycle(report: &CycleReport, sink: &JsonlAuditSink) {
    for employee_id in &report.skipped {
        println!("{employee_id} already has a PIP case; not reissued");
    }
    if report.issued.is_empty() {
        println!("No PIPs issued");
        return;
    }

    for issued in &report.issued {
        let pip = &issued.pip;
        println!("PIP issued for {}", pip.employee_id);
        println!("  Window: {} -> {}", pip.start_date, pip.end_date);
        for goal in &pip.goals {
            println!("  Goal: {goal}");
        }
        println!("  Plan: {}", pip.coaching);
        if let Some(feedback) = &issued.coaching_feedback {
            println!("  Coaching feedback: {feedback}");
        }
    }
    println!("\nAudit log: {}", sink.pip_log().display());
}

fn run_evaluate(args: EvaluateArgs, config: AppConfig) -> Result<(), AppError> {
    let mut policy = config.pip.policy;
    if let Some(grace_days) = args.grace_days {
        policy.improvement.grace_days = grace_days;
    }
    if let Some(min_improvement) = args.min_improvement {
        policy.improvement.min_improvement_pct = min_improvement;
    }
    let now = args.now.unwrap_or_else(|| Local::now().naive_local());
    let employee_id = EmployeeId::new(args.employee.trim());

    let series = load_series(&args.source)?;
    let sink = Arc::new(JsonlAuditSink::in_dir(&config.pip.audit_dir));
    let mut registry = restore_registry(&sink, &policy)?;

    match registry.status(&employee_id) {
        PipStatus::Normal => {
            let pip = PipBuilder::new(policy.improvement.grace_days)
                .draft(&employee_id, args.pip_start)?;
            registry.open(PipCase::open(pip, args.pip_start))?;
        }
        PipStatus::OnPip => registry.get_mut(&employee_id)?.started_at = args.pip_start,
        PipStatus::Retained | PipStatus::Terminated => {
            return render_concluded(&registry, &employee_id, args.source.json);
        }
    }

    let mut service = PipWorkflowService::new(policy, sink.clone())?.with_registry(registry);
    let Some(outcome) = service.evaluate_case(&series, &employee_id, now)? else {
        println!("Kill-switch activated: workflow paused, no decisions made.");
        return Ok(());
    };

    if args.source.json {
        return print_json(&json!({
            "employee_id": employee_id,
            "pip_start": args.pip_start,
            "status": outcome.status,
            "decision": outcome.decision,
        }));
    }

    println!("{employee_id}: {}", outcome.decision.summary());
    match &outcome.decision {
        Decision::Terminated(termination) => {
            println!("Auto-firing triggered; effective date: {}", termination.date);
            println!("Audit log: {}", sink.termination_log().display());
        }
        Decision::Retained(Retention::Improved { .. }) => {
            println!("PIP successful; case closed as {}", outcome.status);
        }
        Decision::Retained(Retention::AwaitingData) => {
            println!("Decision deferred; case remains {}", outcome.status);
        }
    }
    Ok(())
}

fn render_concluded(
    registry: &PipRegistry,
    employee_id: &EmployeeId,
    json: bool,
) -> Result<(), AppError> {
    let Some(case) = registry.get(employee_id) else {
        return Ok(());
    };
    warn!(
        employee = %employee_id,
        status = %case.status,
        "PIP already concluded; nothing recorded"
    );

    if json {
        return print_json(&json!({
            "employee_id": employee_id,
            "status": case.status,
            "decision": case.decision,
        }));
    }

    match &case.decision {
        Some(decision) => println!(
            "PIP for {employee_id} already concluded ({}); no new decision recorded.",
            decision.summary()
        ),
        None => println!(
            "PIP for {employee_id} already concluded as {}; no new decision recorded.",
            case.status
        ),
    }
    Ok(())
}

fn run_summary(args: SummaryArgs, config: AppConfig) -> Result<(), AppError> {
    let mut policy = config.pip.policy;
    apply_threshold_overrides(&mut policy, &args.threshold);
    policy.threshold.validate()?;

    let series = load_series(&args.source)?;
    let summaries = summarize(&series, &policy.threshold);

    if args.source.json {
        return print_json(&summaries);
    }
    render_summary(&summaries);
    Ok(())
}

fn render_summary(summaries: &[EmployeeSummary]) {
    println!("Performance summary");
    for summary in summaries {
        println!(
            "- {}: {} scores, mean {:.2}, min {:.2}, max {:.2}, latest {:.2}, trend {} ({:+.2}%), risk {}",
            summary.employee_id,
            summary.observations,
            summary.mean,
            summary.min,
            summary.max,
            summary.latest,
            summary.trend.direction.label(),
            summary.trend.change_pct,
            summary.risk.label()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_dates_and_datetimes() {
        assert!(parse_instant("2024-01-01").is_ok());
        assert!(parse_instant("2024-01-01T09:30:00").is_ok());
        let err = parse_instant("01/02/2024").expect_err("unsupported format");
        assert!(err.contains("01/02/2024"));
    }

    #[test]
    fn threshold_flags_override_policy() {
        let mut policy = PolicyConfig::default();
        apply_threshold_overrides(
            &mut policy,
            &ThresholdArgs {
                threshold: Some(75.0),
                consecutive_low: None,
            },
        );
        assert_eq!(policy.threshold.threshold, 75.0);
        assert_eq!(policy.threshold.consecutive_low, 3);
    }
}
