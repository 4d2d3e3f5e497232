//! Shared execution context and run bookkeeping.
//!
//! One [`ExecutionContext`] is created per run, passed `&mut` into each
//! step, and returned to the caller when the run ends. It is never shared
//! across runs, so no locking is involved anywhere.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use docflow_shared::{DocflowError, Result};

/// Context key under which document steps accumulate the files they wrote.
pub const MODIFIED_FILES_KEY: &str = "modified_files";

// ---------------------------------------------------------------------------
// ExecutionContext
// ---------------------------------------------------------------------------

/// Mutable key-value state threaded through all steps of one run, plus the
/// run-level bookkeeping in [`RunStatus`].
///
/// Keys written by one step are visible to all later steps in the same
/// run. A step must not assume a key exists unless an earlier step in its
/// pipeline guarantees it.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    values: HashMap<String, Value>,
    /// Run-level progress, timing, and outcome.
    pub run: RunStatus,
}

impl ExecutionContext {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context seeded with caller-supplied initial values.
    pub fn seeded(values: HashMap<String, Value>) -> Self {
        Self {
            values,
            run: RunStatus::default(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// String value under `key`, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// String value under `key`, failing with a validation error naming
    /// the missing key. Used by steps for their preconditions.
    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.get_str(key).ok_or_else(|| {
            DocflowError::validation(format!("missing context key '{key}'"))
        })
    }

    /// List of strings under `key`, if present. Non-string elements are
    /// skipped.
    pub fn get_string_list(&self, key: &str) -> Option<Vec<String>> {
        self.values.get(key).and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
    }

    /// Append a path to the `modified_files` list, creating it on first use.
    pub fn push_modified_file(&mut self, path: &str) {
        let entry = self
            .values
            .entry(MODIFIED_FILES_KEY.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = entry {
            items.push(Value::String(path.to_string()));
        }
    }

    /// All key-value state (read-only view).
    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }
}

// ---------------------------------------------------------------------------
// Run status
// ---------------------------------------------------------------------------

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Running,
    Completed,
    Error,
}

/// Outcome of a single attempted step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Error,
}

/// Immutable log entry for one attempted step. Steps never reached are
/// absent from the record, not marked as skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub status: StepStatus,
    pub elapsed: Duration,
    /// Human-readable failure message, present only on error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate run-level state: progress, timing, and outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatus {
    /// Pipeline name, for reporting.
    pub name: String,
    /// Total number of steps in the pipeline.
    pub step_count: usize,
    /// 1-based index of the step being (or last) executed; 0 before start.
    pub current_step_index: usize,
    /// Name of the step being (or last) executed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step_name: Option<String>,
    /// Ordered, append-only records of every attempted step.
    pub completed_steps: Vec<StepRecord>,
    pub status: RunState,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// Final rendered report, attached when the run ends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
}

impl Default for RunStatus {
    fn default() -> Self {
        Self {
            name: String::new(),
            step_count: 0,
            current_step_index: 0,
            current_step_name: None,
            completed_steps: Vec::new(),
            status: RunState::Running,
            started_at: Utc::now(),
            elapsed: Duration::ZERO,
            report: None,
        }
    }
}

impl RunStatus {
    /// Fresh status for a run that is starting now.
    pub fn new(name: impl Into<String>, step_count: usize) -> Self {
        Self {
            name: name.into(),
            step_count,
            ..Self::default()
        }
    }

    pub fn success_count(&self) -> usize {
        self.completed_steps
            .iter()
            .filter(|r| r.status == StepStatus::Success)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.completed_steps
            .iter()
            .filter(|r| r.status == StepStatus::Error)
            .count()
    }

    /// Whether a step with the given name was attempted and succeeded.
    pub fn step_succeeded(&self, name: &str) -> bool {
        self.completed_steps
            .iter()
            .any(|r| r.name == name && r.status == StepStatus::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn seeded_values_are_visible() {
        let mut initial = HashMap::new();
        initial.insert("task_results".to_string(), json!(["did a thing"]));
        let ctx = ExecutionContext::seeded(initial);

        assert!(ctx.contains("task_results"));
        assert_eq!(
            ctx.get_string_list("task_results"),
            Some(vec!["did a thing".to_string()])
        );
    }

    #[test]
    fn require_str_names_the_missing_key() {
        let ctx = ExecutionContext::new();
        let err = ctx.require_str("devlog_content").unwrap_err();
        assert!(err.to_string().contains("devlog_content"));
    }

    #[test]
    fn modified_files_accumulate_in_order() {
        let mut ctx = ExecutionContext::new();
        ctx.push_modified_file("docs/a.md");
        ctx.push_modified_file("docs/b.md");

        assert_eq!(
            ctx.get_string_list(MODIFIED_FILES_KEY),
            Some(vec!["docs/a.md".to_string(), "docs/b.md".to_string()])
        );
    }

    #[test]
    fn run_status_counts() {
        let mut run = RunStatus::new("test", 3);
        run.completed_steps.push(StepRecord {
            name: "a".into(),
            status: StepStatus::Success,
            elapsed: Duration::from_millis(5),
            error: None,
        });
        run.completed_steps.push(StepRecord {
            name: "b".into(),
            status: StepStatus::Error,
            elapsed: Duration::from_millis(2),
            error: Some("boom".into()),
        });

        assert_eq!(run.success_count(), 1);
        assert_eq!(run.error_count(), 1);
        assert!(run.step_succeeded("a"));
        assert!(!run.step_succeeded("b"));
        assert!(!run.step_succeeded("c"));
    }

    #[test]
    fn run_status_serializes() {
        let run = RunStatus::new("Docflow Full Update", 9);
        let json = serde_json::to_string(&run).expect("serialize");
        assert!(json.contains(r#""status":"running""#));
        assert!(json.contains(r#""step_count":9"#));
    }
}
