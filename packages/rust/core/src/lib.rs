//! Pipeline orchestrator for automated documentation updates.
//!
//! The core of Docflow: an ordered list of [`Step`]s executed one at a
//! time against a shared [`ExecutionContext`], stopping at the first
//! failure and ending with a rendered execution report. Everything else
//! (LLM backend, git, file I/O) is a thin step implementation consumed
//! through narrow interfaces.

pub mod context;
pub mod flows;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod step;
pub mod steps;

pub use context::{ExecutionContext, RunState, RunStatus, StepRecord, StepStatus};
pub use flows::{PipelineOptions, devlog_pipeline, full_update_pipeline, single_doc_pipeline};
pub use pipeline::{Pipeline, ProgressReporter, SilentProgress};
pub use step::Step;
pub use steps::{
    DocKind, DraftEntryStep, GitPushStep, ReadCommitStep, ReadDevlogStep, RewriteDocStep,
    WriteDevlogStep,
};
