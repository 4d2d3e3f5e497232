//! Concrete step implementations.
//!
//! Each step is a thin wrapper over one external collaborator (git, the
//! generation backend, or the document store); all control-flow and
//! failure handling lives in the orchestrator.

mod devlog;
mod git;
mod rewrite;

pub use devlog::{DraftEntryStep, ReadDevlogStep, WORKLOG_MARKER, WriteDevlogStep};
pub use git::{GitPushStep, ReadCommitStep};
pub use rewrite::{DocKind, RewriteDocStep};
