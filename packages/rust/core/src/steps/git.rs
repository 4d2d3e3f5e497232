//! Steps backed by the version-control capability.

use std::path::PathBuf;
use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use serde_json::{Value, json};
use tracing::debug;

use docflow_shared::Result;

use crate::context::ExecutionContext;
use crate::step::Step;

/// Task name is extracted from commit messages of the form `Task: <name>`.
static TASK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Task:\s*(.+)").expect("task pattern"));

/// Fallback file committed when a push step is configured with no files.
const DEFAULT_COMMIT_FILE: &str = "docs/dev-log.md";

// ---------------------------------------------------------------------------
// ReadCommitStep
// ---------------------------------------------------------------------------

/// Reads the last commit message and seeds the context with the task
/// name, today's date, and defaults for the result/next-step lists when
/// the caller supplied none.
pub struct ReadCommitStep {
    repo_dir: PathBuf,
}

impl ReadCommitStep {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }
}

#[async_trait]
impl Step for ReadCommitStep {
    fn name(&self) -> &str {
        "git_commit"
    }

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<Value> {
        let message = docflow_vcs::last_commit_message(&self.repo_dir)?;

        let task = TASK_RE
            .captures(&message)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_else(|| "unspecified task".to_string());

        debug!(task = %task, "extracted task from last commit");

        ctx.insert("task_name", json!(task));
        ctx.insert("today", json!(Utc::now().date_naive().to_string()));

        if !ctx.contains("task_results") {
            ctx.insert("task_results", json!(["Task completed successfully"]));
        }
        if !ctx.contains("next_steps") {
            ctx.insert("next_steps", json!(["To be defined"]));
        }

        Ok(json!(message))
    }
}

// ---------------------------------------------------------------------------
// GitPushStep
// ---------------------------------------------------------------------------

/// Stages, commits, and pushes the configured files. With an empty file
/// list it still commits the default devlog file; with no explicit
/// message it commits with a timestamped default.
pub struct GitPushStep {
    repo_dir: PathBuf,
    files: Vec<String>,
    message: Option<String>,
}

impl GitPushStep {
    pub fn new(repo_dir: impl Into<PathBuf>, files: Vec<String>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            files,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Files to stage: the configured list, or the default devlog file.
    fn effective_files(&self) -> Vec<String> {
        if self.files.is_empty() {
            vec![DEFAULT_COMMIT_FILE.to_string()]
        } else {
            self.files.clone()
        }
    }

    /// Commit message: the configured one, or a timestamped default.
    fn effective_message(&self, date: &str) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("docs: auto-update {date}"))
    }
}

#[async_trait]
impl Step for GitPushStep {
    fn name(&self) -> &str {
        "git_push"
    }

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<Value> {
        let files = self.effective_files();
        let date = ctx
            .get_str("today")
            .map(str::to_string)
            .unwrap_or_else(|| Utc::now().date_naive().to_string());
        let message = self.effective_message(&date);

        docflow_vcs::stage_commit_push(&self.repo_dir, &files, &message)?;
        Ok(json!(true))
    }
}
