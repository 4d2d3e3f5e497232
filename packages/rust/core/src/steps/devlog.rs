//! Steps for the development worklog: read, draft a new entry via the
//! generation backend, and write it back under the worklog section.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use docflow_llm::LlmClient;
use docflow_shared::{DocflowError, Result};

use crate::context::ExecutionContext;
use crate::prompts;
use crate::step::Step;

/// Section heading under which generated entries are inserted.
pub const WORKLOG_MARKER: &str = "## Worklog";

// ---------------------------------------------------------------------------
// ReadDevlogStep
// ---------------------------------------------------------------------------

/// Reads the devlog file into the context under `devlog_content`.
pub struct ReadDevlogStep {
    path: PathBuf,
}

impl ReadDevlogStep {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Step for ReadDevlogStep {
    fn name(&self) -> &str {
        "devlog_parser"
    }

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<Value> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| DocflowError::io(&self.path, e))?;

        ctx.insert("devlog_content", json!(content));
        Ok(json!(content))
    }
}

// ---------------------------------------------------------------------------
// DraftEntryStep
// ---------------------------------------------------------------------------

/// Drafts a new devlog entry from the task fields seeded earlier in the
/// run, storing it under `devlog_entry`.
pub struct DraftEntryStep {
    llm: LlmClient,
    model: Option<String>,
}

impl DraftEntryStep {
    pub fn new(llm: LlmClient, model: Option<String>) -> Self {
        Self { llm, model }
    }
}

#[async_trait]
impl Step for DraftEntryStep {
    fn name(&self) -> &str {
        "devlog_draft"
    }

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<Value> {
        let date = ctx.require_str("today")?.to_string();
        let task = ctx.require_str("task_name")?.to_string();
        let results = ctx.get_string_list("task_results").unwrap_or_default();
        let next_steps = ctx.get_string_list("next_steps").unwrap_or_default();

        let prompt = prompts::devlog_entry_prompt(&date, &task, &results, &next_steps);
        let entry = self.llm.generate(&prompt, self.model.as_deref(), 0.2).await?;

        debug!(entry_len = entry.len(), "drafted devlog entry");
        ctx.insert("devlog_entry", json!(entry));
        Ok(json!(entry))
    }
}

// ---------------------------------------------------------------------------
// WriteDevlogStep
// ---------------------------------------------------------------------------

/// Inserts the drafted entry directly under the worklog section heading
/// and writes the file back. A missing heading fails the step rather
/// than writing the entry at an arbitrary position.
pub struct WriteDevlogStep {
    path: PathBuf,
}

impl WriteDevlogStep {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Step for WriteDevlogStep {
    fn name(&self) -> &str {
        "devlog_update"
    }

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<Value> {
        let content = ctx.require_str("devlog_content")?.to_string();
        let entry = ctx.require_str("devlog_entry")?.to_string();

        let marker_start = content.find(WORKLOG_MARKER).ok_or_else(|| {
            DocflowError::validation(format!(
                "section marker '{WORKLOG_MARKER}' not found in {}",
                self.path.display()
            ))
        })?;
        let insert_at = marker_start + WORKLOG_MARKER.len();

        let mut updated = String::with_capacity(content.len() + entry.len() + 2);
        updated.push_str(&content[..insert_at]);
        updated.push_str("\n\n");
        updated.push_str(&entry);
        updated.push_str(&content[insert_at..]);

        std::fs::write(&self.path, &updated).map_err(|e| DocflowError::io(&self.path, e))?;

        let path_str = self.path.to_string_lossy().into_owned();
        ctx.push_modified_file(&path_str);
        Ok(json!(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MODIFIED_FILES_KEY;
    use docflow_llm::{Provider, TEST_MODE_RESPONSE};
    use std::path::Path;
    use uuid::Uuid;

    fn scratch_file(content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("docflow-devlog-{}.md", Uuid::now_v7()));
        std::fs::write(&path, content).expect("write scratch file");
        path
    }

    fn cleanup(path: &Path) {
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn read_step_loads_content() {
        let path = scratch_file("# Dev Log\n\n## Worklog\n\nolder entries\n");
        let step = ReadDevlogStep::new(&path);
        let mut ctx = ExecutionContext::new();

        step.execute(&mut ctx).await.expect("execute");
        assert!(ctx.get_str("devlog_content").unwrap().contains("older entries"));
        cleanup(&path);
    }

    #[tokio::test]
    async fn read_step_missing_file_fails() {
        let step = ReadDevlogStep::new("/definitely/not/here.md");
        let mut ctx = ExecutionContext::new();
        let err = step.execute(&mut ctx).await.unwrap_err();
        assert!(err.to_string().contains("not/here.md"));
    }

    #[tokio::test]
    async fn draft_step_uses_backend_and_stores_entry() {
        let llm = LlmClient::with_options(Provider::DeepSeek, None, true).expect("client");
        let step = DraftEntryStep::new(llm, None);

        let mut ctx = ExecutionContext::new();
        ctx.insert("today", json!("2026-08-23"));
        ctx.insert("task_name", json!("write tests"));
        ctx.insert("task_results", json!(["tests pass"]));
        ctx.insert("next_steps", json!(["ship it"]));

        step.execute(&mut ctx).await.expect("execute");
        assert_eq!(ctx.get_str("devlog_entry"), Some(TEST_MODE_RESPONSE));
    }

    #[tokio::test]
    async fn draft_step_requires_seeded_fields() {
        let llm = LlmClient::with_options(Provider::DeepSeek, None, true).expect("client");
        let step = DraftEntryStep::new(llm, None);

        let mut ctx = ExecutionContext::new();
        let err = step.execute(&mut ctx).await.unwrap_err();
        assert!(err.to_string().contains("today"));
    }

    #[tokio::test]
    async fn write_step_inserts_after_marker() {
        let path = scratch_file("# Dev Log\n\n## Worklog\n\n### old entry\n");
        let step = WriteDevlogStep::new(&path);

        let mut ctx = ExecutionContext::new();
        ctx.insert("devlog_content", json!(std::fs::read_to_string(&path).unwrap()));
        ctx.insert("devlog_entry", json!("### 2026-08-23 - new entry"));

        step.execute(&mut ctx).await.expect("execute");

        let written = std::fs::read_to_string(&path).expect("read back");
        let marker_pos = written.find(WORKLOG_MARKER).unwrap();
        let new_pos = written.find("### 2026-08-23 - new entry").unwrap();
        let old_pos = written.find("### old entry").unwrap();
        assert!(marker_pos < new_pos && new_pos < old_pos, "entry must follow marker, precede older entries");

        assert_eq!(
            ctx.get_string_list(MODIFIED_FILES_KEY).unwrap(),
            vec![path.to_string_lossy().into_owned()]
        );
        cleanup(&path);
    }

    #[tokio::test]
    async fn write_step_fails_without_marker() {
        let path = scratch_file("# Dev Log\n\nno worklog section here\n");
        let step = WriteDevlogStep::new(&path);

        let mut ctx = ExecutionContext::new();
        ctx.insert("devlog_content", json!("no worklog section here"));
        ctx.insert("devlog_entry", json!("entry"));

        let err = step.execute(&mut ctx).await.unwrap_err();
        assert!(err.to_string().contains(WORKLOG_MARKER));

        // File untouched on failure.
        assert!(std::fs::read_to_string(&path).unwrap().contains("no worklog section"));
        cleanup(&path);
    }
}
