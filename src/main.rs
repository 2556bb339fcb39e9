//! Apicheck CLI
//!
//! Run status code and JSON field assertions against REST endpoints.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use apicheck::checks::{
    ApiCheck, CheckOptions, CheckResult, DEFAULT_TIMEOUT, Expectation, FailureKind,
};
use apicheck::client::{ApiRequest, HttpTransport};
use apicheck::config::{BASE_URL_ENV, Config};

/// Apicheck - assert on REST API responses
#[derive(Debug, Parser)]
#[command(name = "apicheck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging (includes full responses)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the checks in a configuration file
    Check {
        /// Path to configuration file
        #[arg(short, long, default_value = "apicheck.yaml")]
        config: PathBuf,

        /// Specific checks to run (comma-separated)
        #[arg(short = 'C', long)]
        checks: Option<String>,

        /// Override the base URL of every path-addressed check
        #[arg(long, env = BASE_URL_ENV)]
        base_url: Option<String>,

        /// Write results as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Run a single check described on the command line
    Get {
        /// Absolute URL to request
        url: String,

        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "query", value_name = "KEY=VALUE")]
        query: Vec<String>,

        /// Expected status code
        #[arg(short, long, default_value_t = 200)]
        status: u16,

        /// Dotted path of a JSON field to compare
        #[arg(short, long, requires = "value")]
        field: Option<String>,

        /// Expected field value (parsed as JSON, otherwise taken as a string)
        #[arg(long, requires = "field")]
        value: Option<String>,

        /// Request timeout
        #[arg(short, long, default_value = "10s")]
        timeout: String,
    },

    /// Generate a default configuration file
    Init {
        /// Output file path
        #[arg(short, long, default_value = "apicheck.yaml")]
        output: PathBuf,
    },

    /// List configured checks
    List {
        /// Path to configuration file
        #[arg(short, long, default_value = "apicheck.yaml")]
        config: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "apicheck.yaml")]
        config: PathBuf,
    },
}

fn setup_logging(verbose: bool, json: bool) {
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.json);

    match cli.command {
        Commands::Check {
            config,
            checks,
            base_url,
            report,
        } => run_config(&config, checks.as_deref(), base_url, report.as_deref()).await,

        Commands::Get {
            url,
            query,
            status,
            field,
            value,
            timeout,
        } => run_adhoc(&url, &query, status, field.as_deref(), value, &timeout).await,

        Commands::Init { output } => init_config(&output),

        Commands::List { config } => list_checks(&config),

        Commands::Validate { config } => validate_config(&config),
    }
}

/// Run the checks in a configuration file
async fn run_config(
    config_path: &std::path::Path,
    check_filter: Option<&str>,
    base_url: Option<String>,
    report: Option<&std::path::Path>,
) -> Result<()> {
    tracing::info!(config = %config_path.display(), "Loading configuration");

    let mut config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if let Some(base_url) = base_url {
        tracing::info!(base_url = %base_url, "Overriding base URL");
        config = config.with_base_url_override(base_url);
    }

    let checks = match check_filter {
        Some(filter) => config.select_checks(filter),
        None => config.build_checks(),
    }
    .context("Invalid check configuration")?;

    let results = run_checks(checks).await?;

    if let Some(path) = report {
        write_report(path, &results)?;
    }

    finish(&results)
}

/// Run one check built from command line flags
async fn run_adhoc(
    url: &str,
    query: &[String],
    status: u16,
    field: Option<&str>,
    value: Option<String>,
    timeout: &str,
) -> Result<()> {
    let timeout = humantime::parse_duration(timeout)
        .with_context(|| format!("Invalid timeout '{timeout}'"))?;

    let mut request = ApiRequest::get(url).context("Invalid URL")?;
    for pair in query {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("Query parameter '{pair}' is not KEY=VALUE"))?;
        request = request.with_query(key, value);
    }

    let mut expectation = Expectation::status(status)?;
    if let (Some(field), Some(value)) = (field, value) {
        let value = serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value));
        expectation = expectation.with_field(field, value)?;
    }

    let check = ApiCheck::new(url, request, expectation);
    let results = run_checks(vec![(check, CheckOptions::with_timeout(timeout))]).await?;

    finish(&results)
}

/// Run checks one after another
///
/// Ctrl-C cancels the running check and skips the rest.
async fn run_checks(checks: Vec<(ApiCheck, CheckOptions)>) -> Result<Vec<CheckResult>> {
    if checks.is_empty() {
        tracing::warn!("No checks to run");
        return Ok(Vec::new());
    }

    let client_timeout = checks
        .iter()
        .map(|(_, opts)| opts.timeout_or(DEFAULT_TIMEOUT))
        .max()
        .unwrap_or(DEFAULT_TIMEOUT);
    let transport =
        HttpTransport::new(client_timeout).context("Failed to create HTTP transport")?;

    tracing::info!(
        count = checks.len(),
        checks = ?checks.iter().map(|(c, _)| c.name()).collect::<Vec<_>>(),
        "Running checks"
    );

    let mut results = Vec::with_capacity(checks.len());
    for (check, opts) in &checks {
        let result = check
            .run_until(&transport, opts, async {
                // If the handler can't be installed, never cancel
                if tokio::signal::ctrl_c().await.is_err() {
                    std::future::pending::<()>().await;
                }
            })
            .await;

        let cancelled = result.failure == Some(FailureKind::Cancelled);
        results.push(result);

        if cancelled {
            tracing::warn!("Interrupted, skipping remaining checks");
            break;
        }
    }

    Ok(results)
}

fn write_report(path: &std::path::Path, results: &[CheckResult]) -> Result<()> {
    let json = serde_json::to_string_pretty(results).context("Failed to serialize results")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    tracing::info!(path = %path.display(), "Report written");
    Ok(())
}

/// Print a summary and fail if any check failed
fn finish(results: &[CheckResult]) -> Result<()> {
    println!();
    for result in results {
        let status = if result.passed { "PASS" } else { "FAIL" };
        println!(
            "  {status}  {:30} {:>6}ms  {}",
            result.check_name,
            result.duration.as_millis(),
            result.message.as_deref().unwrap_or("")
        );
    }
    println!();

    let failed = results.iter().filter(|r| !r.passed).count();
    if failed == 0 {
        tracing::info!(checks = results.len(), "All checks PASSED");
        Ok(())
    } else {
        tracing::error!(failed, checks = results.len(), "Some checks FAILED");
        anyhow::bail!("{failed} of {} checks FAILED", results.len())
    }
}

/// Generate a default configuration file
fn init_config(output: &std::path::Path) -> Result<()> {
    let config = Config::default_config();
    let yaml = config.to_yaml().context("Failed to serialize config")?;

    std::fs::write(output, &yaml)
        .with_context(|| format!("Failed to write config to {}", output.display()))?;

    tracing::info!(path = %output.display(), "Configuration file created");
    println!("Created {}", output.display());
    println!();
    println!("Edit the file to configure your checks, then run:");
    println!("  apicheck check --config {}", output.display());

    Ok(())
}

/// List configured checks
fn list_checks(config_path: &std::path::Path) -> Result<()> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    println!("Configured checks:");
    println!();

    for (name, check) in &config.checks {
        let target = check
            .url
            .clone()
            .or_else(|| check.path.clone())
            .unwrap_or_else(|| "/".to_string());
        let state = if check.enabled { "" } else { " (disabled)" };
        println!("  {name:20} - GET {target}{state}");
    }

    Ok(())
}

/// Validate a configuration file
fn validate_config(config_path: &std::path::Path) -> Result<()> {
    tracing::info!(config = %config_path.display(), "Validating configuration");

    let config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let checks = config.build_checks().context("Invalid check configuration")?;

    println!("Configuration is valid!");
    println!();
    println!("Checks enabled: {}", checks.len());

    for (check, opts) in &checks {
        println!(
            "  - {}: {} expecting {} (timeout {})",
            check.name(),
            check.request(),
            check.expectation(),
            humantime::format_duration(opts.timeout_or(DEFAULT_TIMEOUT))
        );
    }

    let disabled = config.checks.len() - checks.len();
    if disabled > 0 {
        println!("Checks disabled: {disabled}");
    }

    Ok(())
}
