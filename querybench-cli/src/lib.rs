#![warn(missing_docs)]
//! QueryBench CLI Library
//!
//! Command-line infrastructure for running SQL variant benchmarks: the
//! rotation planner, the run executor and its psql-backed query runner, the
//! session driver, configuration and terminal output.
//!
//! # Example
//!
//! ```ignore
//! fn main() -> std::process::ExitCode {
//!     querybench_cli::main_entry()
//! }
//! ```

mod config;
mod executor;
mod planner;
mod variants;

pub use config::*;
pub use executor::{
    ExecutionConfig, ExplainArtifact, PsqlRunner, QueryRunner, RunExecutor, RunOutcome,
    SUMMARY_FILE, Session, SessionError, SessionOutcome, SessionPlan, block_header,
    build_report_meta, format_human_output, render_report, write_summary,
};
pub use planner::{SchedulingError, plan, plan_session};
pub use variants::{VariantError, load_variants};

use clap::{Args, Parser, Subcommand};
use querybench_core::{DirectoryCaseSource, ResultStore, SizeThresholds};
use querybench_explain::{BufferSelection, MetricExtractor};
use querybench_report::{OutputFormat, ReportConfig, build_session_report};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Exit code of a session stopped with Ctrl-C
pub const EXIT_INTERRUPTED: u8 = 130;

/// Results file name inside the output directory
pub const RESULTS_FILE: &str = "results.jsonl";

/// Raw plan artifact file name inside the output directory
pub const EXPLAINS_FILE: &str = "explains_all.txt";

/// QueryBench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "querybench")]
#[command(author, version, about = "QueryBench - fairness-rotated SQL variant benchmarks")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Optional subcommand (Run, Plan, Report, Init); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Arguments of the default run command
    #[command(flatten)]
    pub run: RunArgs,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a benchmark session (default)
    Run(RunArgs),
    /// Print the rotation plan without executing anything
    Plan(PlanArgs),
    /// Re-aggregate an existing (possibly partial) results file
    Report(ReportArgs),
    /// Write a default querybench.toml to the current directory
    Init,
}

/// Arguments of `querybench run`
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Case directory (per-iteration subdirectories named by seed are used when present)
    #[arg(long)]
    pub cases: Option<PathBuf>,

    /// SQL variant files or directories of `.sql` files
    #[arg(long, num_args = 1..)]
    pub sqls: Vec<PathBuf>,

    /// Number of iterations
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Seed of the first iteration
    #[arg(long)]
    pub seed: Option<u64>,

    /// Fairness rounds per iteration
    #[arg(long)]
    pub rounds_per_iteration: Option<u32>,

    /// Per-query timeout (e.g., "30s", "2m")
    #[arg(long)]
    pub timeout: Option<String>,

    /// Database connection string
    #[arg(long, env = "PG_CONNECTION_STRING", hide_env_values = true)]
    pub connection: Option<String>,

    /// psql executable
    #[arg(long)]
    pub psql: Option<String>,

    /// Buffer counters: "sum" or "top-level"
    #[arg(long)]
    pub buffers: Option<String>,

    /// Party count above which a case is categorized `hpc`
    #[arg(long)]
    pub party_hi: Option<usize>,

    /// Service count above which a case is categorized `hsc`
    #[arg(long)]
    pub service_hi: Option<usize>,

    /// Output directory (default: benchmark-YYYYMMDD-HHMM)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Terminal report format: human, json
    #[arg(long)]
    pub format: Option<String>,
}

/// Arguments of `querybench plan`
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// SQL variant files or directories of `.sql` files
    #[arg(long, num_args = 1.., required = true)]
    pub sqls: Vec<PathBuf>,

    /// Number of iterations
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Fairness rounds per iteration
    #[arg(long)]
    pub rounds_per_iteration: Option<u32>,

    /// Output format: human, json
    #[arg(long)]
    pub format: Option<String>,
}

/// Arguments of `querybench report`
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// results.jsonl written by a previous session
    pub results: PathBuf,

    /// Rounds per iteration of that session
    #[arg(long)]
    pub rounds_per_iteration: Option<u32>,

    /// Output format: human, json
    #[arg(long)]
    pub format: Option<String>,

    /// Also write summary.json into this directory
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

/// Run the QueryBench CLI with the given arguments.
///
/// # Returns
/// The process exit code: success, or 130 when a session was interrupted.
pub fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Binary entry point: runs the CLI and reports errors on stderr
pub fn main_entry() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run the QueryBench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<ExitCode> {
    // Initialize logging
    let filter = if cli.verbose {
        "querybench=debug"
    } else {
        "querybench=info"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    // Discover querybench.toml configuration (CLI flags override)
    let config = QueryBenchConfig::discover().unwrap_or_default();

    match cli.command {
        Some(Commands::Run(ref args)) => run_session(args, &config),
        Some(Commands::Plan(ref args)) => print_plan(args, &config),
        Some(Commands::Report(ref args)) => report_results(args, &config),
        Some(Commands::Init) => init_config(),
        None => run_session(&cli.run, &config),
    }
}

/// Run a full benchmark session
fn run_session(args: &RunArgs, config: &QueryBenchConfig) -> anyhow::Result<ExitCode> {
    let cases_root = args
        .cases
        .clone()
        .ok_or_else(|| anyhow::anyhow!("--cases <DIR> is required"))?;
    if args.sqls.is_empty() {
        anyhow::bail!("--sqls <PATH>... is required");
    }

    let format = parse_format(args.format.as_deref(), config)?;
    let variants = load_variants(&args.sqls)?;
    let names: Vec<String> = variants.iter().map(|v| v.name.clone()).collect();

    let session = SessionPlan {
        iterations: args.iterations.unwrap_or(config.session.iterations),
        base_seed: args.seed.unwrap_or(config.session.seed),
        rounds_per_iteration: args
            .rounds_per_iteration
            .unwrap_or(config.session.rounds_per_iteration),
        variants: names,
    };
    // Fail on bad scheduling input before touching the database
    plan(&session.variants, 0, session.rounds_per_iteration)?;

    let connection = args
        .connection
        .clone()
        .or_else(|| config.runner.connection.clone())
        .ok_or_else(|| anyhow::anyhow!("PG_CONNECTION_STRING not set (or pass --connection)"))?;
    let psql = args.psql.clone().unwrap_or_else(|| config.runner.psql.clone());
    let timeout_str = args.timeout.as_deref().unwrap_or(&config.runner.timeout);
    let timeout = Duration::from_nanos(QueryBenchConfig::parse_duration(timeout_str)?);
    let selection = match args.buffers.as_deref() {
        Some(s) => parse_buffer_selection(s)?,
        None => config.extract.buffers,
    };
    let thresholds = SizeThresholds {
        party_hi: args.party_hi.unwrap_or(config.session.party_hi),
        service_hi: args.service_hi.unwrap_or(config.session.service_hi),
    };

    let out_dir = resolve_out_dir(args.out_dir.as_deref(), config);
    std::fs::create_dir_all(&out_dir)?;

    let mut store = ResultStore::with_results_file(out_dir.join(RESULTS_FILE))?;
    let artifact = ExplainArtifact::create(out_dir.join(EXPLAINS_FILE))?;
    let exec_config = ExecutionConfig {
        timeout,
        extractor: MetricExtractor::new(selection),
        thresholds,
    };
    let mut executor =
        RunExecutor::new(PsqlRunner::new(psql, connection), &variants, exec_config)
            .with_artifact(artifact);
    let source = DirectoryCaseSource::new(&cases_root, config.session.padding);

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        if let Err(e) = ctrlc::set_handler(move || cancel.store(true, Ordering::SeqCst)) {
            tracing::warn!("Failed to install Ctrl-C handler: {}", e);
        }
    }

    println!(
        "Running {} SQL variants x {} iterations x {} rounds, timeout {:?}, output {}\n",
        variants.len(),
        session.iterations,
        session.rounds_per_iteration,
        timeout,
        out_dir.display()
    );

    let outcome = Session::new(&session, &source, &mut executor, &mut store, &cancel)
        .with_progress(true)
        .run()?;
    if outcome.interrupted {
        eprintln!("Interrupted by user; reporting collected results");
    }

    let meta = build_report_meta(ReportConfig {
        iterations: session.iterations,
        base_seed: session.base_seed,
        rounds_per_iteration: session.rounds_per_iteration,
        timeout_ms: timeout.as_millis() as u64,
        variants: session.variants.clone(),
        buffer_selection: buffer_selection_name(selection).to_string(),
        size_thresholds: thresholds,
        interrupted: outcome.interrupted,
    });
    let report = build_session_report(store.snapshot(), session.rounds_per_iteration, meta);
    let summary_path = write_summary(&out_dir, &report)?;

    print!("{}", render_report(&report, format)?);
    println!("\nResults: {}", out_dir.join(RESULTS_FILE).display());
    println!("Summary: {}", summary_path.display());

    if outcome.interrupted {
        Ok(ExitCode::from(EXIT_INTERRUPTED))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Print the rotation plan of a session without executing it
fn print_plan(args: &PlanArgs, config: &QueryBenchConfig) -> anyhow::Result<ExitCode> {
    let variants = load_variants(&args.sqls)?;
    let names: Vec<String> = variants.iter().map(|v| v.name.clone()).collect();
    let iterations = args.iterations.unwrap_or(config.session.iterations);
    let rounds = args
        .rounds_per_iteration
        .unwrap_or(config.session.rounds_per_iteration);
    let plans = plan_session(&names, iterations, rounds)?;

    match parse_format(args.format.as_deref(), config)? {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plans)?),
        OutputFormat::Human => {
            println!("Rotation plan: {} variants, {} iterations, {} rounds\n", names.len(), iterations, rounds);
            for p in &plans {
                println!(
                    "  i{} r{:02} {:<7} +{}  {}",
                    p.iteration,
                    p.round,
                    format!("{:?}", p.direction).to_lowercase(),
                    p.offset,
                    p.order.join(" -> ")
                );
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Re-aggregate an existing results file
fn report_results(args: &ReportArgs, config: &QueryBenchConfig) -> anyhow::Result<ExitCode> {
    let store = ResultStore::load(&args.results)?;
    let rounds = args
        .rounds_per_iteration
        .unwrap_or(config.session.rounds_per_iteration);
    let format = parse_format(args.format.as_deref(), config)?;

    let mut variants: Vec<String> = Vec::new();
    for record in store.snapshot() {
        if !variants.contains(&record.sql) {
            variants.push(record.sql.clone());
        }
    }
    let meta = build_report_meta(ReportConfig {
        iterations: store
            .snapshot()
            .iter()
            .map(|r| r.iteration + 1)
            .max()
            .unwrap_or(0),
        base_seed: store.snapshot().iter().map(|r| r.seed).min().unwrap_or(0),
        rounds_per_iteration: rounds,
        variants,
        size_thresholds: config.session.thresholds(),
        ..ReportConfig::default()
    });
    let report = build_session_report(store.snapshot(), rounds, meta);

    if let Some(dir) = args.out_dir.as_deref() {
        std::fs::create_dir_all(dir)?;
        let path = write_summary(dir, &report)?;
        eprintln!("Summary written to: {}", path.display());
    }
    print!("{}", render_report(&report, format)?);
    Ok(ExitCode::SUCCESS)
}

/// Write a default querybench.toml unless one already exists
fn init_config() -> anyhow::Result<ExitCode> {
    let path = Path::new("querybench.toml");
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    std::fs::write(path, QueryBenchConfig::default_toml())?;
    println!("Wrote {}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn parse_format(flag: Option<&str>, config: &QueryBenchConfig) -> anyhow::Result<OutputFormat> {
    flag.unwrap_or(&config.output.format)
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
}

fn parse_buffer_selection(s: &str) -> anyhow::Result<BufferSelection> {
    match s.to_lowercase().as_str() {
        "sum" => Ok(BufferSelection::Sum),
        "top-level" | "toplevel" | "root" => Ok(BufferSelection::TopLevel),
        other => Err(anyhow::anyhow!("Unknown buffer selection: {}", other)),
    }
}

fn buffer_selection_name(selection: BufferSelection) -> &'static str {
    match selection {
        BufferSelection::Sum => "sum",
        BufferSelection::TopLevel => "top-level",
    }
}

fn resolve_out_dir(flag: Option<&Path>, config: &QueryBenchConfig) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| config.output.directory.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| {
            PathBuf::from(
                chrono::Local::now()
                    .format("benchmark-%Y%m%d-%H%M")
                    .to_string(),
            )
        })
}
