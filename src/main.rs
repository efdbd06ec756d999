//! # Bulk Verify CLI
//!
//! Command-line interface for the `bulk_verify_core` library.
//! Parses arguments, builds configuration, then either runs a bulk job from an
//! input file or checks individual addresses, and writes the results out.

use bulk_verify_core::utils::input::load_batch_from_file;
use bulk_verify_core::{
    create_session, verify_individually, BulkUploadResult, Config, ConfigBuilder,
    EmailVerificationResult, PollState, VerificationSession,
};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Submits email lists to a verification service and exports the results.",
    long_about = "Bulk Verify submits a batch of addresses as a verification job, polls the job until it completes, and writes the per-address results as CSV or JSON. Single addresses can be checked directly with --email."
)]
struct AppArgs {
    /// File with addresses to verify as one bulk job (one per line or comma separated).
    #[arg(short, long, env = "BULK_VERIFY_INPUT", conflicts_with = "email")]
    input: Option<String>,

    /// Address to check through the single-email endpoint. Repeatable.
    #[arg(short, long = "email", env = "BULK_VERIFY_EMAIL", value_delimiter = ',')]
    email: Vec<String>,

    /// Output path. A `.json` extension writes JSON, anything else CSV.
    #[arg(
        short,
        long,
        default_value = "verification_results.csv",
        env = "BULK_VERIFY_OUTPUT"
    )]
    output: String,

    /// Print results to standard output instead of writing a file.
    #[arg(long, default_value = "false", env = "BULK_VERIFY_STDOUT")]
    stdout: bool,

    /// Path to a configuration file (TOML format). CLI args override file settings.
    #[arg(long, env = "BULK_VERIFY_CONFIG")]
    config_file: Option<String>,

    /// Base URL of the verification backend.
    #[arg(long, env = "BULK_VERIFY_API_URL")]
    api_url: Option<String>,

    /// Bearer token attached to every request.
    #[arg(long, env = "BULK_VERIFY_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// File containing the bearer token.
    #[arg(long, env = "BULK_VERIFY_TOKEN_FILE")]
    token_file: Option<String>,

    /// HTTP request timeout in seconds.
    #[arg(long, env = "BULK_VERIFY_REQUEST_TIMEOUT")]
    request_timeout: Option<u64>,

    /// Milliseconds between job status requests.
    #[arg(long, env = "BULK_VERIFY_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// Give up after this many status requests (0 = never).
    #[arg(long, env = "BULK_VERIFY_MAX_POLL_ATTEMPTS")]
    max_poll_attempts: Option<u32>,

    /// Give up after this many consecutive failed status requests (0 = never).
    #[arg(long, env = "BULK_VERIFY_MAX_POLL_ERRORS")]
    max_poll_errors: Option<u32>,

    /// Give up when the job has not completed within this many seconds.
    #[arg(long, env = "BULK_VERIFY_POLL_TIMEOUT")]
    poll_timeout: Option<u64>,

    /// Maximum concurrent single-email checks.
    #[arg(short, long, env = "BULK_VERIFY_CONCURRENCY")]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_thread_names(true)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Setting up tracing subscriber failed")?;

    tracing::info!("Bulk Verify CLI v{} starting...", env!("CARGO_PKG_VERSION"));

    let args = AppArgs::parse();
    tracing::debug!("Parsed CLI arguments: {:?}", args);

    let config = Arc::new(build_config(&args)?);
    tracing::debug!("Effective configuration loaded: {:?}", *config);

    let start_time = Instant::now();
    let execution_result = if let Some(ref input) = args.input {
        process_bulk_mode(config.clone(), input, &args).await
    } else if !args.email.is_empty() {
        process_single_mode(config.clone(), &args).await
    } else {
        Err(anyhow::anyhow!(
            "Nothing to do: pass --input <file> for a bulk job or --email <address>."
        ))
    };

    if let Err(e) = execution_result {
        tracing::error!("Execution failed: {:#}", e);
        return Err(e);
    }

    tracing::info!("Finished. Total duration: {:.2?}", start_time.elapsed());
    Ok(())
}

fn build_config(args: &AppArgs) -> Result<Config> {
    let mut config_builder = ConfigBuilder::new();

    if let Some(ref path) = args.config_file {
        config_builder = config_builder.config_file(path);
    }
    if let Some(ref url) = args.api_url {
        config_builder = config_builder.api_base_url(url);
    }
    if let Some(ref token) = args.token {
        config_builder = config_builder.api_token(token);
    }
    if let Some(ref path) = args.token_file {
        config_builder = config_builder.token_file(path);
    }
    if let Some(t) = args.request_timeout {
        config_builder = config_builder.request_timeout(Duration::from_secs(t));
    }
    if let Some(ms) = args.poll_interval_ms {
        config_builder = config_builder.poll_interval(Duration::from_millis(ms));
    }
    if let Some(n) = args.max_poll_attempts {
        config_builder = config_builder.max_poll_attempts(n);
    }
    if let Some(n) = args.max_poll_errors {
        config_builder = config_builder.max_consecutive_poll_errors(n);
    }
    if let Some(secs) = args.poll_timeout {
        config_builder =
            config_builder.poll_timeout((secs > 0).then(|| Duration::from_secs(secs)));
    }
    if let Some(c) = args.concurrency {
        config_builder = config_builder.max_concurrency(c);
    }

    config_builder.build().map_err(|e| {
        tracing::error!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to build configuration: {}", e)
    })
}

async fn process_bulk_mode(config: Arc<Config>, input: &str, args: &AppArgs) -> Result<()> {
    tracing::info!(
        "Running in Bulk mode. Input: '{}', Output: '{}'",
        input,
        if args.stdout { "<stdout>" } else { args.output.as_str() }
    );

    let emails = load_batch_from_file(input, config.max_batch_size)
        .with_context(|| format!("Failed to load email list from '{}'", input))?;
    if emails.is_empty() {
        return Err(anyhow::anyhow!(
            "Input file '{}' contains no valid email addresses.",
            input
        ));
    }
    tracing::info!("Loaded {} address(es) from input file.", emails.len());
    ensure_output_writable(args)?;

    let mut session = create_session(config.clone()).context("Failed to create session")?;
    let job = session
        .submit_bulk(emails)
        .await
        .context("Failed to submit verification job")?;
    tracing::info!("Verification job {} submitted for {} address(es).", job.id, job.total);

    session.start_polling().context("Failed to start polling")?;
    let spinner = poll_spinner(&session);
    let final_state = session.wait().await.context("Polling did not finish cleanly")?;
    spinner.finish_and_clear();

    match final_state {
        PollState::Completed { ref job_id, attempts } => {
            tracing::info!("Job {} completed after {} poll(s).", job_id, attempts);
        }
        PollState::Failed { ref job_id, ref reason } => {
            return Err(anyhow::anyhow!("Job {} failed: {}", job_id, reason));
        }
        other => {
            return Err(anyhow::anyhow!("Polling ended unexpectedly: {:?}", other));
        }
    }

    write_output(&session, args)?;
    log_summary(session.summary().as_ref(), &session.results());
    Ok(())
}

async fn process_single_mode(config: Arc<Config>, args: &AppArgs) -> Result<()> {
    tracing::info!(
        "Running in Single mode for {} address(es) (Concurrency: {})",
        args.email.len(),
        config.max_concurrency
    );
    ensure_output_writable(args)?;

    let session = Arc::new(create_session(config.clone()).context("Failed to create session")?);
    let outcomes =
        verify_individually(session.clone(), args.email.clone(), config.max_concurrency).await;

    let mut failures = 0usize;
    for (email, outcome) in &outcomes {
        if let Err(e) = outcome {
            failures += 1;
            tracing::warn!("Could not verify '{}': {}", email, e);
        }
    }

    write_output(&session, args)?;
    log_summary(None, &session.results());

    if failures == outcomes.len() {
        return Err(anyhow::anyhow!("None of the addresses could be verified."));
    }
    Ok(())
}

/// Spinner updated from the session's poll progress channel.
fn poll_spinner(session: &VerificationSession) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("Waiting for job...");

    let mut progress = session.subscribe();
    let bar = spinner.clone();
    tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let message = match &*progress.borrow() {
                PollState::Polling { job_id, attempts } => {
                    format!("Job {}: {} status check(s)", job_id, attempts)
                }
                state if state.is_terminal() => break,
                _ => continue,
            };
            bar.set_message(message);
        }
    });
    spinner
}

fn ensure_output_writable(args: &AppArgs) -> Result<()> {
    if args.stdout {
        return Ok(());
    }
    let output_path = Path::new(&args.output);
    if let Some(parent_dir) = output_path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            tracing::debug!("Creating output directory: {}", parent_dir.display());
            std::fs::create_dir_all(parent_dir).with_context(|| {
                format!(
                    "Failed to create output directory '{}'",
                    parent_dir.display()
                )
            })?;
        }
    }
    File::create(output_path).with_context(|| {
        format!(
            "Cannot write to output file '{}'. Check permissions.",
            args.output
        )
    })?;
    Ok(())
}

fn is_json_output(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn write_output(session: &VerificationSession, args: &AppArgs) -> Result<()> {
    let json = is_json_output(&args.output);
    if args.stdout {
        let stdout = io::stdout().lock();
        if json {
            session.export_json(stdout)?;
        } else {
            session.export_csv(stdout)?;
        }
        return Ok(());
    }

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create/truncate output file '{}'", args.output))?;
    let writer = BufWriter::new(file);
    if json {
        session
            .export_json(writer)
            .with_context(|| format!("Failed to write JSON to '{}'", args.output))?;
    } else {
        session
            .export_csv(writer)
            .with_context(|| format!("Failed to write CSV to '{}'", args.output))?;
    }
    tracing::info!("Results saved to '{}'.", args.output);
    Ok(())
}

/// Logs a summary of the results to the console using `tracing::info`.
fn log_summary(summary: Option<&BulkUploadResult>, results: &[EmailVerificationResult]) {
    tracing::info!("-------------------- Verification Summary --------------------");
    if let Some(s) = summary {
        tracing::info!("Submitted           : {}", s.total);
        tracing::info!("Processed           : {}", s.processed);
        tracing::info!("  - Valid           : {}", s.valid);
        tracing::info!("  - Invalid         : {}", s.invalid);
        tracing::info!("  - Unknown         : {}", s.unknown);
        tracing::info!("  - Disposable      : {}", s.disposable);
        tracing::info!("  - Catch-all       : {}", s.catch_all);
    }
    let risky = results.iter().filter(|r| r.is_bounce_risk).count();
    tracing::info!("Results held        : {}", results.len());
    tracing::info!("Bounce risk flagged : {}", risky);
    tracing::info!("--------------------------------------------------------------");
}
