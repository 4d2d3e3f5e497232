//! Whole-document rewrite step.
//!
//! One configurable step covers all four tracked documents; the
//! per-document differences (step name, default path, rewrite
//! instructions) are data on [`DocKind`].

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use docflow_llm::LlmClient;
use docflow_shared::{DocflowError, Result};

use crate::context::ExecutionContext;
use crate::prompts;
use crate::step::Step;

/// The tracked documents that are rewritten whole by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKind {
    Architecture,
    Structure,
    Tasks,
    Requirements,
}

impl DocKind {
    /// Step name used in run records and `result_<name>` keys.
    pub fn step_name(&self) -> &'static str {
        match self {
            Self::Architecture => "architecture_update",
            Self::Structure => "structure_update",
            Self::Tasks => "tasks_update",
            Self::Requirements => "requirements_update",
        }
    }

    /// Display label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Architecture => "Architecture",
            Self::Structure => "Project structure",
            Self::Tasks => "Tasks",
            Self::Requirements => "Requirements",
        }
    }

    /// Document-specific rewrite instructions.
    fn instructions(&self) -> &'static str {
        match self {
            Self::Architecture => prompts::ARCHITECTURE_INSTRUCTIONS,
            Self::Structure => prompts::STRUCTURE_INSTRUCTIONS,
            Self::Tasks => prompts::TASKS_INSTRUCTIONS,
            Self::Requirements => prompts::REQUIREMENTS_INSTRUCTIONS,
        }
    }
}

/// Reads a tracked document, asks the backend for an updated version,
/// and writes the result back in place.
pub struct RewriteDocStep {
    kind: DocKind,
    path: PathBuf,
    llm: LlmClient,
    model: Option<String>,
}

impl RewriteDocStep {
    pub fn new(kind: DocKind, path: impl Into<PathBuf>, llm: LlmClient, model: Option<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            llm,
            model,
        }
    }
}

#[async_trait]
impl Step for RewriteDocStep {
    fn name(&self) -> &str {
        self.kind.step_name()
    }

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<Value> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| DocflowError::io(&self.path, e))?;

        let prompt = prompts::rewrite_prompt(self.kind.instructions(), &content);
        let updated = self.llm.generate(&prompt, self.model.as_deref(), 0.2).await?;

        debug!(kind = ?self.kind, path = %self.path.display(), "rewrote document");
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
    use uuid::Uuid;

    fn test_llm() -> LlmClient {
        LlmClient::with_options(Provider::DeepSeek, None, true).expect("client")
    }

    #[test]
    fn step_names_are_stable() {
        assert_eq!(DocKind::Architecture.step_name(), "architecture_update");
        assert_eq!(DocKind::Structure.step_name(), "structure_update");
        assert_eq!(DocKind::Tasks.step_name(), "tasks_update");
        assert_eq!(DocKind::Requirements.step_name(), "requirements_update");
    }

    #[tokio::test]
    async fn rewrite_replaces_file_content() {
        let path = std::env::temp_dir().join(format!("docflow-rewrite-{}.md", Uuid::now_v7()));
        std::fs::write(&path, "# Tasks\n\n- [ ] original task\n").expect("seed file");

        let step = RewriteDocStep::new(DocKind::Tasks, &path, test_llm(), None);
        let mut ctx = ExecutionContext::new();
        step.execute(&mut ctx).await.expect("execute");

        let written = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(written, TEST_MODE_RESPONSE);
        assert_eq!(
            ctx.get_string_list(MODIFIED_FILES_KEY).unwrap(),
            vec![path.to_string_lossy().into_owned()]
        );

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn missing_document_fails_the_step() {
        let step = RewriteDocStep::new(
            DocKind::Requirements,
            "/nowhere/requirements.md",
            test_llm(),
            None,
        );
        let mut ctx = ExecutionContext::new();
        let err = step.execute(&mut ctx).await.unwrap_err();
        assert!(err.to_string().contains("requirements.md"));
    }
}
