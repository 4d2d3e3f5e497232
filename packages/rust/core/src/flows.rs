//! Pipeline factories: the fixed update flows offered by the CLI.
//!
//! Each step that talks to the backend builds its own client from the
//! same options; the pipeline gets one more client for the final report.
//! Whether those must share configuration is the caller's concern, and
//! here they always do.

use std::path::PathBuf;

use docflow_llm::{LlmClient, Provider};
use docflow_shared::{AppConfig, DocsConfig, Result};

use crate::pipeline::Pipeline;
use crate::steps::{
    DocKind, DraftEntryStep, GitPushStep, ReadCommitStep, ReadDevlogStep, RewriteDocStep,
    WriteDevlogStep,
};

/// Caller-supplied knobs shared by every pipeline factory.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub provider: Provider,
    pub api_key: Option<String>,
    /// Model override; falls back to the config default, then the
    /// provider default.
    pub model: Option<String>,
    pub test_mode: bool,
    /// When false, the trailing git push step is omitted (dry run).
    pub push: bool,
    /// Repository root; document paths from config resolve against it.
    pub repo_dir: PathBuf,
}

impl PipelineOptions {
    fn client(&self) -> Result<LlmClient> {
        LlmClient::with_options(self.provider, self.api_key.clone(), self.test_mode)
    }

    fn model(&self, config: &AppConfig) -> Option<String> {
        self.model.clone().or_else(|| config.llm.default_model.clone())
    }
}

fn doc_path(kind: DocKind, docs: &DocsConfig) -> &str {
    match kind {
        DocKind::Architecture => &docs.architecture,
        DocKind::Structure => &docs.structure,
        DocKind::Tasks => &docs.tasks,
        DocKind::Requirements => &docs.requirements,
    }
}

const ALL_DOC_KINDS: [DocKind; 4] = [
    DocKind::Architecture,
    DocKind::Structure,
    DocKind::Tasks,
    DocKind::Requirements,
];

/// Full update: devlog entry, all four tracked documents, then one push
/// covering every touched file.
pub fn full_update_pipeline(config: &AppConfig, opts: &PipelineOptions) -> Result<Pipeline> {
    let model = opts.model(config);
    let devlog = opts.repo_dir.join(&config.docs.devlog);

    let mut pipeline = Pipeline::new("Docflow Full Update")
        .with_report_llm(opts.client()?)
        .step(ReadCommitStep::new(&opts.repo_dir))
        .step(ReadDevlogStep::new(&devlog))
        .step(DraftEntryStep::new(opts.client()?, model.clone()))
        .step(WriteDevlogStep::new(&devlog));

    for kind in ALL_DOC_KINDS {
        let path = opts.repo_dir.join(doc_path(kind, &config.docs));
        pipeline = pipeline.step(RewriteDocStep::new(kind, path, opts.client()?, model.clone()));
    }

    if opts.push {
        pipeline = pipeline.step(GitPushStep::new(&opts.repo_dir, config.docs.all_paths()));
    }

    Ok(pipeline)
}

/// Devlog-only update: draft and insert one entry, then push it.
pub fn devlog_pipeline(config: &AppConfig, opts: &PipelineOptions) -> Result<Pipeline> {
    let model = opts.model(config);
    let devlog = opts.repo_dir.join(&config.docs.devlog);

    let mut pipeline = Pipeline::new("Docflow Devlog Update")
        .with_report_llm(opts.client()?)
        .step(ReadCommitStep::new(&opts.repo_dir))
        .step(ReadDevlogStep::new(&devlog))
        .step(DraftEntryStep::new(opts.client()?, model))
        .step(WriteDevlogStep::new(&devlog));

    if opts.push {
        pipeline = pipeline.step(GitPushStep::new(
            &opts.repo_dir,
            vec![config.docs.devlog.clone()],
        ));
    }

    Ok(pipeline)
}

/// Single-document update: rewrite one tracked document, then push it.
pub fn single_doc_pipeline(
    kind: DocKind,
    config: &AppConfig,
    opts: &PipelineOptions,
) -> Result<Pipeline> {
    let model = opts.model(config);
    let rel_path = doc_path(kind, &config.docs).to_string();
    let path = opts.repo_dir.join(&rel_path);

    let mut pipeline = Pipeline::new(format!("Docflow {} Update", kind.label()))
        .with_report_llm(opts.client()?)
        .step(RewriteDocStep::new(kind, path, opts.client()?, model));

    if opts.push {
        pipeline = pipeline.step(GitPushStep::new(&opts.repo_dir, vec![rel_path]));
    }

    Ok(pipeline)
}
