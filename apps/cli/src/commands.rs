//! CLI command definitions, routing, and tracing setup.

use std::collections::HashMap;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use tracing::info;

use docflow_core::{
    DocKind, Pipeline, PipelineOptions, ProgressReporter, RunState, StepRecord, StepStatus,
    devlog_pipeline, full_update_pipeline, single_doc_pipeline,
};
use docflow_llm::Provider;
use docflow_shared::{AppConfig, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Docflow: keep project documentation up to date automatically.
#[derive(Parser)]
#[command(
    name = "docflow",
    version,
    about = "Run automated update pipelines over the tracked documentation files.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Which update pipeline to run.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum UpdateKind {
    /// Devlog entry plus every tracked document.
    Full,
    /// Devlog entry only.
    Devlog,
    /// Architecture notes only.
    Architecture,
    /// Project structure document only.
    Structure,
    /// Task board only.
    Tasks,
    /// Requirements list only.
    Requirements,
}

impl UpdateKind {
    /// Parse the `[defaults] kind` config value.
    fn from_config(value: &str) -> Option<Self> {
        match value {
            "full" => Some(Self::Full),
            "devlog" => Some(Self::Devlog),
            "architecture" => Some(Self::Architecture),
            "structure" => Some(Self::Structure),
            "tasks" => Some(Self::Tasks),
            "requirements" => Some(Self::Requirements),
            _ => None,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run an update pipeline.
    Run {
        /// Update kind (defaults to the configured kind, then "full").
        #[arg(short, long)]
        kind: Option<UpdateKind>,

        /// Accomplished result lines for the devlog entry (repeatable).
        #[arg(long = "result")]
        results: Vec<String>,

        /// Next-step lines for the devlog entry (repeatable).
        #[arg(long = "next")]
        next_steps: Vec<String>,

        /// Backend provider: deepseek, openai, or gemini.
        #[arg(long)]
        provider: Option<String>,

        /// API key override (otherwise the provider's env var is used).
        #[arg(long)]
        api_key: Option<String>,

        /// Model override.
        #[arg(long)]
        model: Option<String>,

        /// Skip the backend entirely and use placeholder text.
        #[arg(long)]
        test_mode: bool,

        /// Skip the trailing git commit/push step.
        #[arg(long)]
        no_push: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docflow=info",
        1 => "docflow=debug",
        _ => "docflow=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            kind,
            results,
            next_steps,
            provider,
            api_key,
            model,
            test_mode,
            no_push,
        } => {
            cmd_run(
                kind, results, next_steps, provider, api_key, model, test_mode, no_push,
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

#[allow(clippy::too_many_arguments)]
async fn cmd_run(
    kind: Option<UpdateKind>,
    results: Vec<String>,
    next_steps: Vec<String>,
    provider: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    test_mode: bool,
    no_push: bool,
) -> Result<()> {
    let config = load_config()?;

    let kind = kind
        .or_else(|| UpdateKind::from_config(&config.defaults.kind))
        .unwrap_or(UpdateKind::Full);

    let provider_name = provider.as_deref().unwrap_or(&config.llm.provider);
    let provider = Provider::parse(provider_name)?;

    let repo_dir = std::env::current_dir()
        .map_err(|e| eyre!("cannot determine working directory: {e}"))?;

    let opts = PipelineOptions {
        provider,
        api_key,
        model,
        test_mode,
        push: !no_push,
        repo_dir,
    };

    let mut pipeline = build_pipeline(kind, &config, &opts)?;

    info!(
        kind = ?kind,
        provider = %provider,
        test_mode,
        push = opts.push,
        "running update pipeline"
    );

    let mut initial: HashMap<String, serde_json::Value> = HashMap::new();
    if !results.is_empty() {
        initial.insert("task_results".to_string(), json!(results));
    }
    if !next_steps.is_empty() {
        initial.insert("next_steps".to_string(), json!(next_steps));
    }

    let reporter = CliProgress::new();
    let ctx = pipeline.run(initial, &reporter).await?;

    // Print summary
    println!();
    println!("  Pipeline: {}", ctx.run.name);
    println!("  Status:   {:?}", ctx.run.status);
    println!("  Steps:    {}/{}", ctx.run.completed_steps.len(), ctx.run.step_count);
    println!("  Time:     {:.1}s", ctx.run.elapsed.as_secs_f64());
    println!();

    if ctx.run.status != RunState::Completed {
        let failed: Vec<String> = ctx
            .run
            .completed_steps
            .iter()
            .filter(|r| r.status == StepStatus::Error)
            .map(|r| {
                format!("{}: {}", r.name, r.error.as_deref().unwrap_or("unknown error"))
            })
            .collect();
        return Err(eyre!("pipeline failed: {}", failed.join("; ")));
    }

    Ok(())
}

fn build_pipeline(kind: UpdateKind, config: &AppConfig, opts: &PipelineOptions) -> Result<Pipeline> {
    let pipeline = match kind {
        UpdateKind::Full => full_update_pipeline(config, opts)?,
        UpdateKind::Devlog => devlog_pipeline(config, opts)?,
        UpdateKind::Architecture => single_doc_pipeline(DocKind::Architecture, config, opts)?,
        UpdateKind::Structure => single_doc_pipeline(DocKind::Structure, config, opts)?,
        UpdateKind::Tasks => single_doc_pipeline(DocKind::Tasks, config, opts)?,
        UpdateKind::Requirements => single_doc_pipeline(DocKind::Requirements, config, opts)?,
    };
    Ok(pipeline)
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner for step activity and
/// plain prints for the banner and final report.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn banner(&self, text: &str) {
        self.spinner.suspend(|| println!("{text}"));
    }

    fn step_started(&self, current: usize, total: usize, name: &str, _view: &str) {
        self.spinner.set_message(format!("[{current}/{total}] {name}"));
    }

    fn step_finished(&self, record: &StepRecord) {
        let mark = match record.status {
            StepStatus::Success => "ok",
            StepStatus::Error => "FAILED",
        };
        self.spinner.suspend(|| {
            println!("  {} ... {mark} ({:.2}s)", record.name, record.elapsed.as_secs_f64());
        });
    }

    fn done(&self, report: &str) {
        self.spinner.finish_and_clear();
        println!("{report}");
    }
}
