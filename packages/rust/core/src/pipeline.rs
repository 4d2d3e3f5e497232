//! The pipeline orchestrator.
//!
//! Owns the ordered step list, drives execution against one shared
//! [`ExecutionContext`], records per-step timing and status, halts at the
//! first failure, and renders the final report. One `Pipeline` instance
//! executes exactly one run.

use std::collections::HashMap;
use std::time::Instant;

use serde_json::Value;
use tracing::{info, instrument, warn};

use docflow_llm::LlmClient;
use docflow_shared::{DocflowError, Result};

use crate::context::{ExecutionContext, RunState, RunStatus, StepRecord, StepStatus};
use crate::report;
use crate::step::Step;

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Callback surface for live run progress. Implementations render to a
/// terminal (CLI) or drop everything (tests). Purely observational: a
/// reporter never influences control flow.
pub trait ProgressReporter: Send + Sync {
    /// Called once with the start banner before the first step.
    fn banner(&self, text: &str);
    /// Called before each step executes, with the rendered progress view.
    fn step_started(&self, current: usize, total: usize, name: &str, view: &str);
    /// Called after each step finishes, success or failure.
    fn step_finished(&self, record: &StepRecord);
    /// Called once with the final report after the run ends.
    fn done(&self, report: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn banner(&self, _text: &str) {}
    fn step_started(&self, _current: usize, _total: usize, _name: &str, _view: &str) {}
    fn step_finished(&self, _record: &StepRecord) {}
    fn done(&self, _report: &str) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    NotStarted,
    Running,
    Finished,
}

/// An ordered list of steps executed once against a shared context.
pub struct Pipeline {
    name: String,
    steps: Vec<Box<dyn Step>>,
    report_llm: Option<LlmClient>,
    state: PipelineState,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            report_llm: None,
            state: PipelineState::NotStarted,
        }
    }

    /// Attach a backend client used only for the final report rendering.
    pub fn with_report_llm(mut self, llm: LlmClient) -> Self {
        self.report_llm = Some(llm);
        self
    }

    /// Append a step to the end of the pipeline.
    pub fn step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step names in execution order.
    pub fn step_names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name().to_string()).collect()
    }

    /// Execute the run. Steps run strictly one at a time, in order; the
    /// first failing step stops the pipeline, and steps after it are
    /// never attempted. The returned context carries the full run record
    /// either way; `Err` is reserved for misuse (a second `run` call on
    /// the same instance).
    #[instrument(skip_all, fields(pipeline = %self.name, steps = self.steps.len()))]
    pub async fn run(
        &mut self,
        initial: HashMap<String, Value>,
        progress: &dyn ProgressReporter,
    ) -> Result<ExecutionContext> {
        if self.state != PipelineState::NotStarted {
            return Err(DocflowError::validation(
                "a pipeline instance executes exactly one run; build a new one to re-run",
            ));
        }
        self.state = PipelineState::Running;

        let started = Instant::now();
        let total = self.steps.len();
        let step_names = self.step_names();

        let mut ctx = ExecutionContext::seeded(initial);
        ctx.run = RunStatus::new(&self.name, total);

        info!("starting pipeline");
        progress.banner(&report::banner(&self.name, total));

        for (i, step) in self.steps.iter().enumerate() {
            let name = step.name().to_string();
            ctx.run.current_step_index = i + 1;
            ctx.run.current_step_name = Some(name.clone());
            ctx.run.elapsed = started.elapsed();

            progress.step_started(
                i + 1,
                total,
                &name,
                &report::progress_view(&ctx.run, &step_names),
            );

            let step_started = Instant::now();
            match step.execute(&mut ctx).await {
                Ok(result) => {
                    let elapsed = step_started.elapsed();
                    info!(step = %name, elapsed_ms = elapsed.as_millis(), "step succeeded");
                    ctx.insert(format!("result_{name}"), result);
                    ctx.run.completed_steps.push(StepRecord {
                        name,
                        status: StepStatus::Success,
                        elapsed,
                        error: None,
                    });
                }
                Err(e) => {
                    let elapsed = step_started.elapsed();
                    warn!(step = %name, error = %e, "step failed, halting pipeline");
                    ctx.run.completed_steps.push(StepRecord {
                        name,
                        status: StepStatus::Error,
                        elapsed,
                        error: Some(e.to_string()),
                    });
                    ctx.run.status = RunState::Error;
                }
            }

            if let Some(record) = ctx.run.completed_steps.last() {
                progress.step_finished(record);
            }

            if ctx.run.status == RunState::Error {
                break;
            }
        }

        if ctx.run.status != RunState::Error {
            ctx.run.status = RunState::Completed;
        }
        ctx.run.elapsed = started.elapsed();

        let final_report = report::final_report(self.report_llm.as_ref(), &ctx.run).await;
        progress.done(&final_report);
        ctx.run.report = Some(final_report);

        info!(
            status = ?ctx.run.status,
            attempted = ctx.run.completed_steps.len(),
            elapsed_ms = ctx.run.elapsed.as_millis(),
            "pipeline finished"
        );

        self.state = PipelineState::Finished;
        Ok(ctx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
