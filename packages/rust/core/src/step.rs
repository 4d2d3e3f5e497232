//! The step contract: one named unit of pipeline work.

use async_trait::async_trait;
use serde_json::Value;

use docflow_shared::Result;

use crate::context::ExecutionContext;

/// A named, stateless-between-runs unit of pipeline work.
///
/// A step reads and writes the shared context; its successful result is
/// stored by the orchestrator under `result_<name>`. Any internal fault
/// (I/O, backend, missing precondition) surfaces as an error carrying a
/// human-readable message; a step that cannot complete its contract must
/// fail rather than return a partial result.
#[async_trait]
pub trait Step: Send + Sync {
    /// Immutable step name, used for reporting and context-key derivation.
    fn name(&self) -> &str;

    /// Execute the step against the shared context.
    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<Value>;
}
