//! Progress and report rendering.
//!
//! Every rendering here is a pure projection of [`RunStatus`] data to
//! text; the only exception is [`final_report`], which may ask the
//! generation backend for a richer summary but always falls back to the
//! deterministic rendering. Nothing in this module mutates the context,
//! and rendering never fails a run.

use std::time::Duration;

use tracing::warn;

use docflow_llm::LlmClient;

use crate::context::{RunState, RunStatus, StepStatus};
use crate::prompts;

/// Width of the bracketed progress bar, in characters.
pub const PROGRESS_BAR_WIDTH: usize = 40;

/// Tracked documents shown in the fallback report, as
/// `(step name, display label)` pairs. A document counts as updated when
/// its step appears in the run record with success status.
const TRACKED_DOCUMENTS: &[(&str, &str)] = &[
    ("devlog_update", "Dev log"),
    ("architecture_update", "Architecture"),
    ("structure_update", "Project structure"),
    ("tasks_update", "Tasks"),
    ("requirements_update", "Requirements"),
    ("git_push", "Git push"),
];

const RULE: &str = "+-------------------------------------------------------+";

// ---------------------------------------------------------------------------
// Progress projections
// ---------------------------------------------------------------------------

/// Start banner, printed once before the first step.
pub fn banner(name: &str, step_count: usize) -> String {
    format!(
        "{RULE}\n\
         | {name} - starting ({step_count} steps)\n\
         {RULE}"
    )
}

/// Deterministic progress view: bracketed bar, per-step markers, elapsed
/// time as `HH:MM:SS`.
pub fn progress_view(run: &RunStatus, step_names: &[String]) -> String {
    let current = run.current_step_index;
    let total = run.step_count;

    let filled = if total > 0 {
        (PROGRESS_BAR_WIDTH * current.saturating_sub(1) / total).min(PROGRESS_BAR_WIDTH)
    } else {
        0
    };
    let head = if current <= total && total > 0 { 1 } else { 0 };
    let remaining = PROGRESS_BAR_WIDTH.saturating_sub(filled + head);

    let mut bar = String::with_capacity(PROGRESS_BAR_WIDTH + 2);
    bar.push('[');
    bar.push_str(&"=".repeat(filled));
    if head == 1 {
        bar.push('>');
    }
    bar.push_str(&" ".repeat(remaining));
    bar.push(']');

    let mut lines = vec![
        RULE.to_string(),
        format!("| {} - progress", run.name),
        RULE.to_string(),
        format!("| {bar} {current}/{total}"),
        format!("| elapsed: {}", format_hms(run.elapsed)),
        RULE.to_string(),
    ];

    for (i, name) in step_names.iter().enumerate() {
        let marker = if i + 1 < current {
            "[x]"
        } else if i + 1 == current {
            "[>]"
        } else {
            "[ ]"
        };
        let suffix = if i + 1 == current { " (running)" } else { "" };
        lines.push(format!("| {marker} {name}{suffix}"));
    }
    lines.push(RULE.to_string());

    lines.join("\n")
}

/// Format a duration as `HH:MM:SS`.
pub fn format_hms(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Success rate over attempted steps, as a percentage. Zero when nothing
/// was attempted.
pub fn success_rate(run: &RunStatus) -> f64 {
    let attempted = run.completed_steps.len();
    if attempted == 0 {
        return 0.0;
    }
    run.success_count() as f64 / attempted as f64 * 100.0
}

// ---------------------------------------------------------------------------
// Final report
// ---------------------------------------------------------------------------

/// Deterministic fixed-layout summary of a finished run.
pub fn fallback_report(run: &RunStatus) -> String {
    let (mark, verdict) = match run.status {
        RunState::Completed => ("OK", "completed"),
        RunState::Error => ("FAILED", "error"),
        RunState::Running => ("...", "running"),
    };

    let attempted = run.completed_steps.len();
    let mut lines = vec![
        RULE.to_string(),
        format!("| {} - result: {mark} ({verdict})", run.name),
        RULE.to_string(),
        format!("| total time: {}", format_hms(run.elapsed)),
        format!(
            "| steps: {}/{attempted} succeeded ({:.1}%)",
            run.success_count(),
            success_rate(run)
        ),
        RULE.to_string(),
        "| document status:".to_string(),
    ];

    for (step_name, label) in TRACKED_DOCUMENTS {
        let mark = if run.step_succeeded(step_name) { "[x]" } else { "[ ]" };
        lines.push(format!("| {mark} {label}"));
    }
    lines.push(RULE.to_string());

    if run.error_count() > 0 {
        lines.push("| errors:".to_string());
        for record in &run.completed_steps {
            if record.status == StepStatus::Error {
                let message = record.error.as_deref().unwrap_or("unknown error");
                lines.push(format!("| - {}: {message}", record.name));
            }
        }
        lines.push(RULE.to_string());
    }

    lines.join("\n")
}

/// Render the final report. When a backend client is configured, ask it
/// for a richer rendering; any backend failure degrades to the
/// deterministic fallback without affecting the run's own status.
pub async fn final_report(llm: Option<&LlmClient>, run: &RunStatus) -> String {
    if let Some(client) = llm {
        let errors: Vec<String> = run
            .completed_steps
            .iter()
            .filter(|r| r.status == StepStatus::Error)
            .map(|r| {
                format!(
                    "{}: {}",
                    r.name,
                    r.error.as_deref().unwrap_or("unknown error")
                )
            })
            .collect();

        let step_names: Vec<&str> =
            run.completed_steps.iter().map(|r| r.name.as_str()).collect();

        let status = match run.status {
            RunState::Completed => "completed",
            RunState::Error => "error",
            RunState::Running => "running",
        };

        let errors_joined = if errors.is_empty() {
            "none".to_string()
        } else {
            errors.join("; ")
        };

        let prompt = prompts::report_prompt(
            &run.name,
            status,
            run.completed_steps.len(),
            run.step_count,
            &step_names.join(", "),
            &errors_joined,
            &format_hms(run.elapsed),
        );

        match client.generate(&prompt, None, 0.2).await {
            Ok(report) if !report.trim().is_empty() => return report,
            Ok(_) => warn!("backend returned an empty report, using fallback"),
            Err(e) => warn!(error = %e, "report generation failed, using fallback"),
        }
    }

    fallback_report(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StepRecord;

    fn run_with(records: Vec<StepRecord>, status: RunState) -> RunStatus {
        let mut run = RunStatus::new("Test Pipeline", 6);
        run.completed_steps = records;
        run.status = status;
        run
    }

    fn record(name: &str, status: StepStatus, error: Option<&str>) -> StepRecord {
        StepRecord {
            name: name.into(),
            status,
            elapsed: Duration::from_millis(10),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn hms_formatting() {
        assert_eq!(format_hms(Duration::ZERO), "00:00:00");
        assert_eq!(format_hms(Duration::from_secs(62)), "00:01:02");
        assert_eq!(format_hms(Duration::from_secs(3 * 3600 + 25 * 60 + 9)), "03:25:09");
    }

    #[test]
    fn success_rate_is_zero_with_no_attempts() {
        let run = run_with(vec![], RunState::Running);
        assert_eq!(success_rate(&run), 0.0);
    }

    #[test]
    fn success_rate_over_attempted_steps() {
        let run = run_with(
            vec![
                record("a", StepStatus::Success, None),
                record("b", StepStatus::Success, None),
                record("c", StepStatus::Error, Some("boom")),
            ],
            RunState::Error,
        );
        let rate = success_rate(&run);
        assert!((rate - 2.0 / 3.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn progress_bar_fill_is_floor_of_fraction() {
        let names: Vec<String> = (1..=4).map(|i| format!("step{i}")).collect();
        let mut run = RunStatus::new("Test Pipeline", 4);

        // First step: zero filled, head marker present.
        run.current_step_index = 1;
        let view = progress_view(&run, &names);
        assert!(view.contains(&format!("[>{}] 1/4", " ".repeat(PROGRESS_BAR_WIDTH - 1))));

        // Third step: floor(40 * 2/4) = 20 filled.
        run.current_step_index = 3;
        let view = progress_view(&run, &names);
        assert!(view.contains(&format!("[{}>{}] 3/4", "=".repeat(20), " ".repeat(19))));
    }

    #[test]
    fn progress_view_marks_steps() {
        let names: Vec<String> = vec!["alpha".into(), "beta".into(), "gamma".into()];
        let mut run = RunStatus::new("Test Pipeline", 3);
        run.current_step_index = 2;
        run.current_step_name = Some("beta".into());

        let view = progress_view(&run, &names);
        assert!(view.contains("[x] alpha"));
        assert!(view.contains("[>] beta (running)"));
        assert!(view.contains("[ ] gamma"));
    }

    #[test]
    fn progress_view_handles_zero_steps() {
        let run = RunStatus::new("Empty", 0);
        let view = progress_view(&run, &[]);
        assert!(view.contains("0/0"));
    }

    #[test]
    fn progress_view_tolerates_index_past_the_end() {
        let names: Vec<String> = vec!["alpha".into(), "beta".into()];
        let mut run = RunStatus::new("Test Pipeline", 2);
        run.current_step_index = 7;

        let view = progress_view(&run, &names);
        assert!(view.contains("7/2"));
        assert!(view.contains("[x] alpha"));
    }

    #[test]
    fn fallback_report_lists_errors() {
        let run = run_with(
            vec![
                record("git_commit", StepStatus::Success, None),
                record("devlog_draft", StepStatus::Error, Some("API returned HTTP 500")),
            ],
            RunState::Error,
        );

        let report = fallback_report(&run);
        assert!(report.contains("result: FAILED"));
        assert!(report.contains("steps: 1/2 succeeded (50.0%)"));
        assert!(report.contains("- devlog_draft: API returned HTTP 500"));
    }

    #[test]
    fn fallback_report_tracks_document_statuses() {
        let run = run_with(
            vec![
                record("devlog_update", StepStatus::Success, None),
                record("git_push", StepStatus::Success, None),
            ],
            RunState::Completed,
        );

        let report = fallback_report(&run);
        assert!(report.contains("[x] Dev log"));
        assert!(report.contains("[x] Git push"));
        assert!(report.contains("[ ] Architecture"));
        assert!(!report.contains("| errors:"));
    }

    #[tokio::test]
    async fn final_report_without_backend_is_deterministic() {
        let run = run_with(vec![record("a", StepStatus::Success, None)], RunState::Completed);
        let report = final_report(None, &run).await;
        assert_eq!(report, fallback_report(&run));
    }

    #[tokio::test]
    async fn final_report_uses_test_mode_backend() {
        use docflow_llm::{LlmClient, Provider, TEST_MODE_RESPONSE};

        let client = LlmClient::with_options(Provider::DeepSeek, None, true).expect("client");
        let run = run_with(vec![record("a", StepStatus::Success, None)], RunState::Completed);
        let report = final_report(Some(&client), &run).await;
        assert_eq!(report, TEST_MODE_RESPONSE);
    }

    #[tokio::test]
    async fn backend_failure_degrades_to_fallback() {
        use docflow_llm::{LlmClient, Provider};

        // Unreachable base URL: every generate call fails fast.
        let client = LlmClient::with_options(Provider::DeepSeek, Some("dummy-key".into()), false)
            .expect("client")
            .with_base_url("http://127.0.0.1:1");

        let run = run_with(vec![record("a", StepStatus::Success, None)], RunState::Completed);
        let report = final_report(Some(&client), &run).await;

        assert_eq!(report, fallback_report(&run));
        // Rendering failure must not leak into the run's own status.
        assert_eq!(run.status, RunState::Completed);
    }
}
